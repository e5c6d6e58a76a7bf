//! # Tick/analysis orchestration
//!
//! An [`Engine`] owns one [`PropagationService`](crate::propagation::PropagationService)
//! and serializes the four inbound operations against it:
//!
//! - `initialize_catalog` loads catalog text and moves the session to `INITIATED`
//! - `set_observer` replaces the ground observer
//! - `tick` evaluates one instant into a [`TickBuffer`](crate::codec::TickBuffer)
//! - `run_analysis` records a whole interval and returns owned rows and histogram
//!
//! Legality is decided by the session's [`StateMachine`]; every state change
//! is published on the session's [`EventSink`].

pub mod analysis_driver;
mod error;
mod events;
mod session;
mod state;
pub mod tick_driver;

pub use analysis_driver::AnalysisRequest;
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventSink, WorkerRole};
pub use session::Engine;
pub use state::{EngineState, SharedState, StateMachine};
