//! # Worker abstractions.
//!
//! This module provides the worker-related types:
//! - [`WorkerSpec`] / [`WorkerKind`] - what to run under which name
//! - [`WorkerHandle`] - registry entry of one running or finishing worker
//! - [`CompletionState`] / [`WorkerInfo`] - observable state for listings
//! - [`Work`] / [`WorkFn`] / [`WorkRef`] - caller-supplied worker bodies

mod handle;
mod spec;
mod work;

pub use handle::{CompletionState, WorkerHandle, WorkerInfo};
pub use spec::{WorkerKind, WorkerSpec};
pub use work::{Work, WorkFn, WorkRef};
