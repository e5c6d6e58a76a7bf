use crate::propagation::{Result as ServiceResult, ServiceError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One-shot future producing a worker's propagation service.
///
/// A worker awaits it exactly once; requests arriving before it resolves are
/// answered with `ERROR_NOT_LOADED`.
pub struct ServiceLoader<S> {
    inner: BoxFuture<'static, ServiceResult<S>>,
}

impl<S: Send + 'static> ServiceLoader<S> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = ServiceResult<S>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Build the service on the blocking pool.
    pub fn blocking<F>(build: F) -> Self
    where
        F: FnOnce() -> ServiceResult<S> + Send + 'static,
    {
        Self::new(async move {
            tokio::task::spawn_blocking(build)
                .await
                .map_err(|e| ServiceError::Failed(format!("service loader panicked: {}", e)))?
        })
    }

    /// A loader that is already resolved.
    pub fn ready(service: S) -> Self {
        Self::new(futures::future::ready(Ok(service)))
    }
}

impl<S> Future for ServiceLoader<S> {
    type Output = ServiceResult<S>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}
