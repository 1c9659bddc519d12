//! # Custom worker bodies.
//!
//! [`Work`] is the async, cancelable body of a [`WorkerKind::Custom`](crate::WorkerKind::Custom)
//! worker. [`WorkFn`] wraps a closure `Fn(CancellationToken) -> Fut`, producing a
//! fresh future per run.
//!
//! A body receives the worker's [`CancellationToken`] and should check it at its
//! safe points. Cancellation never aborts the body; a body that ignores it keeps
//! running past any grace period.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use workerctl::{WorkError, WorkFn, WorkRef};
//!
//! let body: WorkRef = WorkFn::arc(|ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, WorkError>(())
//! });
//! # let _ = body;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;

/// Shared reference to a worker body.
pub type WorkRef = Arc<dyn Work>;

/// # Asynchronous, cancelable worker body.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use workerctl::{Work, WorkError};
///
/// struct Flush;
///
/// #[async_trait]
/// impl Work for Flush {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError> {
///         if ctx.is_cancelled() {
///             return Err(WorkError::Canceled);
///         }
///         // flush buffers...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Executes the body until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError>;
}

/// Function-backed worker body.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkError> {
        (self.f)(ctx).await
    }
}
