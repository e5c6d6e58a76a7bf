//! Worker task: one engine session served serially on the blocking pool.

use super::loader::ServiceLoader;
use crate::codec::TickBuffer;
use crate::engine::{AnalysisRequest, Engine, Result};
use crate::models::{AnalysisResult, Observer};
use crate::propagation::PropagationService;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Clears the analysis single-flight flag when the run's command is dropped,
/// whether it was served or never delivered.
#[derive(Debug)]
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Claim the flag. `None` when a run already holds it.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) enum Command {
    EnsureLoaded {
        reply: oneshot::Sender<Result<()>>,
    },
    InitializeCatalog {
        text: Arc<str>,
        reply: oneshot::Sender<Result<usize>>,
    },
    SetObserver {
        observer: Observer,
        reply: oneshot::Sender<Result<()>>,
    },
    Tick {
        instant: DateTime<Utc>,
        reply: oneshot::Sender<Result<TickBuffer>>,
    },
    RunAnalysis {
        request: AnalysisRequest,
        reply: oneshot::Sender<Result<AnalysisResult>>,
        guard: BusyGuard,
    },
}

fn execute<S: PropagationService>(engine: &mut Engine<S>, command: Command) {
    // a dropped reply receiver means the caller stopped waiting
    match command {
        Command::EnsureLoaded { reply } => {
            let _ = reply.send(engine.ensure_loaded());
        }
        Command::InitializeCatalog { text, reply } => {
            let _ = reply.send(engine.initialize_catalog(&text));
        }
        Command::SetObserver { observer, reply } => {
            let _ = reply.send(engine.set_observer(observer));
        }
        Command::Tick { instant, reply } => {
            let _ = reply.send(engine.tick(&instant));
        }
        Command::RunAnalysis {
            request,
            reply,
            guard,
        } => {
            let _ = reply.send(engine.run_analysis(&request));
            drop(guard);
        }
    }
}

pub(crate) async fn run_worker<S: PropagationService>(
    mut engine: Engine<S>,
    loader: ServiceLoader<S>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    role: crate::engine::WorkerRole,
) {
    tokio::pin!(loader);
    let mut loading = true;

    loop {
        tokio::select! {
            biased;
            loaded = &mut loader, if loading => {
                loading = false;
                match loaded {
                    Ok(service) => {
                        info!("[{}] propagation service ready ({} objects)", role, service.object_count());
                        engine.attach_service(service);
                    }
                    Err(e) => error!("[{}] propagation service failed to load: {}", role, e),
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("[{}] command channel closed, worker stopping", role);
                    break;
                };
                let outcome = tokio::task::spawn_blocking(move || {
                    execute(&mut engine, command);
                    engine
                })
                .await;
                engine = match outcome {
                    Ok(engine) => engine,
                    Err(e) => {
                        error!("[{}] worker task failed: {}", role, e);
                        break;
                    }
                };
            }
        }
    }
}
