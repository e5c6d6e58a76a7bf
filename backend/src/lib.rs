//! # Orbitrack
//!
//! Satellite-pass computation engine for ground observers.
//!
//! The crate loads a two-line element catalog, propagates every object with
//! SGP4 and answers two questions for an observer:
//!
//! - where is everything *now*: a single tick encoded as a flat `f32` buffer
//! - what will pass *over an interval*: per-transit rows and a per-tick
//!   histogram of overflying, sunlit and visible objects
//!
//! ## Architecture
//!
//! - [`catalog`]: element-set parsing and name-prefix filtering
//! - [`propagation`]: the [`PropagationService`](propagation::PropagationService)
//!   seam and its SGP4 implementation
//! - [`codec`]: tick buffer layout and analysis reshaping
//! - [`engine`]: state machine, tick and analysis drivers
//! - [`runtime`]: real-time and analysis workers behind an async handle
//! - [`services`]: background analysis jobs for the HTTP layer
//! - [`http`]: Axum-based REST API and event stream
//! - [`config`]: TOML configuration

pub mod catalog;
pub mod codec;
pub mod config;
pub mod engine;
pub mod models;
pub mod propagation;
pub mod runtime;

#[cfg(feature = "http-server")]
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use config::EngineConfig;
pub use engine::{Engine, EngineError, EngineEvent, EngineState, WorkerRole};
pub use models::{AnalysisResult, Observer, TickSample, TimeFields, VisibilityStatus};
pub use runtime::{EngineHandle, ServiceLoader};
