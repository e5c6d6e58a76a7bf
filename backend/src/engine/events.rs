//! Notifications emitted by engine sessions.

use super::state::EngineState;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Which worker a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerRole {
    Realtime,
    Analysis,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Realtime => write!(f, "realtime"),
            WorkerRole::Analysis => write!(f, "analysis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    StateChange {
        worker: WorkerRole,
        old: EngineState,
        new: EngineState,
    },
    AnalysisProgress {
        done: u64,
        total: u64,
    },
    #[serde(rename_all = "camelCase")]
    AnalysisFinished {
        count: usize,
        histogram_length: usize,
    },
}

/// Fan-out point for a session's events. Sending with no subscribers is not an error.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<broadcast::Sender<EngineEvent>>,
}

impl EventSink {
    pub fn new(sender: broadcast::Sender<EngineEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sink that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_json() {
        let event = EngineEvent::StateChange {
            worker: WorkerRole::Analysis,
            old: EngineState::Initiated,
            new: EngineState::Analyzing,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "stateChange");
        assert_eq!(value["worker"], "analysis");
        assert_eq!(value["old"], "INITIATED");
        assert_eq!(value["new"], "ANALYZING");
    }

    #[test]
    fn test_finished_json_uses_camel_case_fields() {
        let event = EngineEvent::AnalysisFinished {
            count: 4,
            histogram_length: 7,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "analysisFinished");
        assert_eq!(value["histogramLength"], 7);
    }

    #[test]
    fn test_sink_delivers_to_subscribers() {
        let (tx, mut rx) = broadcast::channel(4);
        let sink = EventSink::new(tx);
        sink.emit(EngineEvent::AnalysisProgress { done: 1, total: 2 });
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::AnalysisProgress { done: 1, total: 2 }
        );

        EventSink::disabled().emit(EngineEvent::AnalysisProgress { done: 0, total: 0 });
    }
}
