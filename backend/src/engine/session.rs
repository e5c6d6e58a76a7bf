//! One engine session: a state machine around one propagation service.

use super::analysis_driver::{self, AnalysisRequest};
use super::error::{EngineError, Result};
use super::events::{EngineEvent, EventSink, WorkerRole};
use super::state::{EngineState, SharedState, StateMachine};
use super::tick_driver::tick_once;
use crate::codec::TickBuffer;
use crate::config::AnalysisSettings;
use crate::models::{AnalysisResult, Observer};
use crate::propagation::{PropagationService, ServiceObserver};
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Serial request processor for one worker.
///
/// The service arrives once, after construction, through
/// [`Engine::attach_service`]. Until then every operation fails with
/// [`EngineError::NotLoaded`].
pub struct Engine<S> {
    machine: StateMachine,
    service: Option<S>,
    observer: Option<Observer>,
    settings: AnalysisSettings,
}

impl<S: PropagationService> Engine<S> {
    pub fn new(role: WorkerRole, events: EventSink, settings: AnalysisSettings) -> Self {
        Self {
            machine: StateMachine::new(role, events),
            service: None,
            observer: None,
            settings,
        }
    }

    /// Build a session whose service is already available.
    pub fn with_service(
        role: WorkerRole,
        events: EventSink,
        settings: AnalysisSettings,
        service: S,
    ) -> Self {
        let mut engine = Self::new(role, events, settings);
        engine.attach_service(service);
        engine
    }

    pub fn state(&self) -> EngineState {
        self.machine.state()
    }

    pub fn shared_state(&self) -> SharedState {
        self.machine.shared()
    }

    pub fn observer(&self) -> Option<&Observer> {
        self.observer.as_ref()
    }

    pub fn service(&self) -> Option<&S> {
        self.service.as_ref()
    }

    /// Readiness: the loader delivered the service.
    pub fn attach_service(&mut self, service: S) {
        self.service = Some(service);
        self.machine.transition(EngineState::Loaded);
    }

    /// Fails with `ERROR_NOT_LOADED` (and records it) until the service is
    /// attached. Touches nothing else.
    pub fn ensure_loaded(&mut self) -> Result<()> {
        self.machine.require_loaded()
    }

    fn loaded_service(&mut self) -> Result<&mut S> {
        self.machine.require_loaded()?;
        self.service.as_mut().ok_or(EngineError::NotLoaded)
    }

    /// Replace the catalog. The current observer, if any, is re-applied to
    /// the new catalog.
    pub fn initialize_catalog(&mut self, catalog_text: &str) -> Result<usize> {
        self.machine.require_loaded()?;
        self.machine.require_not_analyzing("initialize catalog")?;
        let observer = self.observer.as_ref().map(ServiceObserver::from);
        let service = self.service.as_mut().ok_or(EngineError::NotLoaded)?;

        let count = service
            .load(catalog_text)
            .map_err(|e| EngineError::CatalogLoad(e.to_string()))?;

        if let Some(observer) = observer {
            if !service.set_observer(&observer) {
                warn!("Stored observer was rejected after catalog reload");
            }
        }

        info!("Catalog initialized with {} objects", count);
        self.machine.transition(EngineState::Initiated);
        Ok(count)
    }

    pub fn set_observer(&mut self, observer: Observer) -> Result<()> {
        self.machine.require_loaded()?;
        self.machine.require_not_analyzing("set observer")?;
        let service = self.service.as_mut().ok_or(EngineError::NotLoaded)?;

        if !service.set_observer(&ServiceObserver::from(&observer)) {
            return Err(EngineError::ObserverRejected);
        }
        self.observer = Some(observer);
        Ok(())
    }

    pub fn tick(&mut self, instant: &DateTime<Utc>) -> Result<TickBuffer> {
        let service = self.loaded_service()?;
        Ok(tick_once(service, instant)?)
    }

    pub fn run_analysis(&mut self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.machine.require_loaded()?;
        self.machine.require_not_analyzing("run analysis")?;
        if self.machine.state() != EngineState::Initiated {
            return Err(EngineError::CatalogNotInitiated);
        }
        let step_ms = request.step_ms.unwrap_or(self.settings.default_step_ms);
        if step_ms <= 0 {
            return Err(EngineError::InvalidStep(step_ms));
        }

        self.machine.transition(EngineState::Analyzing);

        let events = self.machine.events().clone();
        let progress_every = self.settings.progress_every;
        let outcome = match self.service.as_mut() {
            Some(service) => analysis_driver::run(
                service,
                &request.observer,
                request.from,
                request.to,
                step_ms,
                |done, total| {
                    if progress_every > 0 && done % progress_every == 0 {
                        events.emit(EngineEvent::AnalysisProgress { done, total });
                    }
                },
            ),
            None => Err(EngineError::NotLoaded),
        };

        self.machine.transition(EngineState::Initiated);

        let result = outcome?;
        self.observer = Some(request.observer.clone());
        info!(
            "Analysis finished: {} transits, {} buckets",
            result.count,
            result.histogram.len()
        );
        events.emit(EngineEvent::AnalysisFinished {
            count: result.count,
            histogram_length: result.histogram.len(),
        });
        Ok(result)
    }
}
