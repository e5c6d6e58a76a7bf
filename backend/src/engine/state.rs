use super::error::{EngineError, Result};
use super::events::{EngineEvent, EventSink, WorkerRole};
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of an engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    /// Service still loading
    Unavailable,
    /// Service ready, no catalog yet
    Loaded,
    /// Catalog loaded
    Initiated,
    Analyzing,
    /// A request arrived before the service was ready
    ErrorNotLoaded,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Unavailable => "UNAVAILABLE",
            EngineState::Loaded => "LOADED",
            EngineState::Initiated => "INITIATED",
            EngineState::Analyzing => "ANALYZING",
            EngineState::ErrorNotLoaded => "ERROR_NOT_LOADED",
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, EngineState::Unavailable | EngineState::ErrorNotLoaded)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a session's state, shared with other threads.
pub type SharedState = Arc<RwLock<EngineState>>;

/// Per-session state holder. Every change is mirrored to the shared view
/// and emitted as [`EngineEvent::StateChange`].
#[derive(Debug)]
pub struct StateMachine {
    role: WorkerRole,
    state: SharedState,
    events: EventSink,
}

impl StateMachine {
    pub fn new(role: WorkerRole, events: EventSink) -> Self {
        Self {
            role,
            state: Arc::new(RwLock::new(EngineState::Unavailable)),
            events,
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    pub fn shared(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Move to `new`. Returns the previous state. Same-state transitions are silent.
    pub fn transition(&mut self, new: EngineState) -> EngineState {
        let old = {
            let mut guard = self.state.write();
            std::mem::replace(&mut *guard, new)
        };
        if old != new {
            debug!("[{}] state {} -> {}", self.role, old, new);
            self.events.emit(EngineEvent::StateChange {
                worker: self.role,
                old,
                new,
            });
        }
        old
    }

    /// Fail with [`EngineError::NotLoaded`] before the service is ready,
    /// recording the attempt as `ERROR_NOT_LOADED`.
    pub fn require_loaded(&mut self) -> Result<()> {
        if self.state().is_loaded() {
            return Ok(());
        }
        warn!("[{}] request rejected: service not loaded", self.role);
        self.transition(EngineState::ErrorNotLoaded);
        Err(EngineError::NotLoaded)
    }

    /// Fail without touching the state while an analysis runs.
    pub fn require_not_analyzing(&self, operation: &'static str) -> Result<()> {
        if self.state() == EngineState::Analyzing {
            return Err(EngineError::InAnalysis { operation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    #[test]
    fn test_starts_unavailable() {
        let machine = StateMachine::new(WorkerRole::Realtime, EventSink::disabled());
        assert_eq!(machine.state(), EngineState::Unavailable);
    }

    #[test]
    fn test_require_loaded_marks_error() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut machine = StateMachine::new(WorkerRole::Realtime, EventSink::new(tx));

        assert_eq!(machine.require_loaded(), Err(EngineError::NotLoaded));
        assert_eq!(machine.state(), EngineState::ErrorNotLoaded);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::StateChange {
                worker: WorkerRole::Realtime,
                old: EngineState::Unavailable,
                new: EngineState::ErrorNotLoaded,
            }
        );

        // second rejection is silent
        assert!(machine.require_loaded().is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_require_not_analyzing_leaves_state() {
        let mut machine = StateMachine::new(WorkerRole::Analysis, EventSink::disabled());
        machine.transition(EngineState::Loaded);
        machine.transition(EngineState::Initiated);
        machine.transition(EngineState::Analyzing);

        let err = machine.require_not_analyzing("run analysis").unwrap_err();
        assert_eq!(err, EngineError::InAnalysis { operation: "run analysis" });
        assert_eq!(machine.state(), EngineState::Analyzing);
    }

    #[test]
    fn test_shared_view_follows_transitions() {
        let mut machine = StateMachine::new(WorkerRole::Analysis, EventSink::disabled());
        let shared = machine.shared();
        machine.transition(EngineState::Loaded);
        assert_eq!(*shared.read(), EngineState::Loaded);
    }

    #[test]
    fn test_state_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&EngineState::ErrorNotLoaded).unwrap(),
            "\"ERROR_NOT_LOADED\""
        );
    }
}
