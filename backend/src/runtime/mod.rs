//! # Worker runtime
//!
//! Real-time ticks and analysis runs execute on separate workers. Each worker
//! owns its own [`Engine`] session and its own propagation service, receives
//! that service through a one-shot [`ServiceLoader`], and serves commands one
//! at a time on tokio's blocking pool.
//!
//! [`EngineHandle`] is the async front door:
//!
//! - catalog loads are filtered once and fanned out to both workers
//! - observer changes are applied to both workers
//! - a fan-out is only sent once both workers report a loaded service
//! - ticks go to the real-time worker, runs to the analysis worker
//!
//! The analysis worker's single-flight flag is claimed at dispatch, so a
//! second run (or an observer or catalog change) during a run is rejected
//! immediately instead of queueing behind it.

mod loader;
mod worker;

pub use loader::ServiceLoader;

use crate::catalog;
use crate::codec::TickBuffer;
use crate::config::EngineConfig;
use crate::engine::{
    AnalysisRequest, Engine, EngineError, EngineEvent, EngineState, EventSink, Result,
    SharedState, WorkerRole,
};
use crate::models::{AnalysisResult, Observer};
use crate::propagation::PropagationService;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use worker::{BusyGuard, Command};

/// Current state of both workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStates {
    pub realtime: EngineState,
    pub analysis: EngineState,
}

#[derive(Clone)]
struct WorkerClient {
    role: WorkerRole,
    commands: mpsc::UnboundedSender<Command>,
    state: SharedState,
}

impl WorkerClient {
    fn spawn<S: PropagationService>(
        role: WorkerRole,
        config: &EngineConfig,
        events: &broadcast::Sender<EngineEvent>,
        loader: ServiceLoader<S>,
    ) -> Self {
        let engine = Engine::new(
            role,
            EventSink::new(events.clone()),
            config.analysis.clone(),
        );
        let state = engine.shared_state();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker::run_worker(engine, loader, rx, role));
        Self {
            role,
            commands: tx,
            state,
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::WorkerUnavailable(self.role))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await
            .map_err(|_| EngineError::WorkerUnavailable(self.role))?
    }
}

/// Reply of a dispatched analysis run.
pub struct PendingAnalysis {
    reply: oneshot::Receiver<Result<AnalysisResult>>,
}

impl PendingAnalysis {
    pub async fn wait(self) -> Result<AnalysisResult> {
        self.reply
            .await
            .map_err(|_| EngineError::WorkerUnavailable(WorkerRole::Analysis))?
    }
}

/// Async handle over the real-time and analysis workers.
#[derive(Clone)]
pub struct EngineHandle {
    realtime: WorkerClient,
    analysis: WorkerClient,
    analysis_busy: Arc<AtomicBool>,
    events: broadcast::Sender<EngineEvent>,
    name_prefixes: Arc<Vec<String>>,
}

impl EngineHandle {
    /// Spawn both workers. `make_loader` is called once per worker so each
    /// gets its own service instance. Must run inside a tokio runtime.
    pub fn spawn<S, F>(config: &EngineConfig, mut make_loader: F) -> Self
    where
        S: PropagationService,
        F: FnMut(WorkerRole) -> ServiceLoader<S>,
    {
        let (events, _) = broadcast::channel(config.server.event_capacity);
        let realtime = WorkerClient::spawn(
            WorkerRole::Realtime,
            config,
            &events,
            make_loader(WorkerRole::Realtime),
        );
        let analysis = WorkerClient::spawn(
            WorkerRole::Analysis,
            config,
            &events,
            make_loader(WorkerRole::Analysis),
        );
        info!("Engine workers spawned");

        Self {
            realtime,
            analysis,
            analysis_busy: Arc::new(AtomicBool::new(false)),
            events,
            name_prefixes: Arc::new(config.catalog.name_prefixes.clone()),
        }
    }

    pub fn state(&self) -> WorkerStates {
        WorkerStates {
            realtime: *self.realtime.state.read(),
            analysis: *self.analysis.state.read(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis_busy.load(Ordering::Acquire)
    }

    fn reject_during_analysis(&self, operation: &'static str) -> Result<()> {
        if self.is_analyzing() {
            return Err(EngineError::InAnalysis { operation });
        }
        Ok(())
    }

    /// Ask both workers for readiness before a fan-out, so neither commits
    /// a change the other cannot take. A worker never leaves the loaded
    /// states once it reached them.
    async fn require_both_loaded(&self) -> Result<()> {
        let (realtime, analysis) = tokio::join!(
            self.realtime.request(|reply| Command::EnsureLoaded { reply }),
            self.analysis.request(|reply| Command::EnsureLoaded { reply }),
        );
        realtime.and(analysis)
    }

    /// Filter `catalog_text` by the configured name prefixes and load the
    /// result into both workers. Returns the loaded object count.
    pub async fn initialize_catalog(&self, catalog_text: &str) -> Result<usize> {
        self.reject_during_analysis("initialize catalog")?;
        let filtered = catalog::filter_catalog(catalog_text, self.name_prefixes.as_slice())?;
        info!(
            "Catalog filtered to {} records ({} rejected, {} incomplete)",
            filtered.len(),
            filtered.rejected,
            filtered.skipped
        );
        let text: Arc<str> = Arc::from(filtered.to_two_line_text());
        self.require_both_loaded().await?;

        let (realtime, analysis) = tokio::join!(
            self.realtime.request(|reply| Command::InitializeCatalog {
                text: Arc::clone(&text),
                reply,
            }),
            self.analysis.request(|reply| Command::InitializeCatalog {
                text: Arc::clone(&text),
                reply,
            }),
        );
        realtime?;
        analysis
    }

    /// Apply `observer` to both workers.
    pub async fn set_observer(&self, observer: Observer) -> Result<()> {
        self.reject_during_analysis("set observer")?;
        self.require_both_loaded().await?;
        let (realtime, analysis) = tokio::join!(
            self.realtime.request(|reply| Command::SetObserver {
                observer: observer.clone(),
                reply,
            }),
            self.analysis.request(|reply| Command::SetObserver {
                observer: observer.clone(),
                reply,
            }),
        );
        realtime?;
        analysis
    }

    pub async fn tick(&self, instant: DateTime<Utc>) -> Result<TickBuffer> {
        self.realtime
            .request(|reply| Command::Tick { instant, reply })
            .await
    }

    /// Claim the analysis worker and queue `request`. Fails immediately with
    /// `ERROR_CANNOT_BECAUSE_IN_ANALYZING` while another run is in flight.
    pub fn dispatch_analysis(&self, request: AnalysisRequest) -> Result<PendingAnalysis> {
        let guard = BusyGuard::acquire(&self.analysis_busy).ok_or(EngineError::InAnalysis {
            operation: "run analysis",
        })?;
        let (reply, rx) = oneshot::channel();
        self.analysis.send(Command::RunAnalysis {
            request,
            reply,
            guard,
        })?;
        Ok(PendingAnalysis { reply: rx })
    }

    pub async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        self.dispatch_analysis(request)?.wait().await
    }
}
