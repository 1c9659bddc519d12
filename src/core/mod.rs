//! Runtime core: registry, worker execution and lifecycle control.
//!
//! The public API of this module is [`Controller`] (with its
//! [`ControllerBuilder`]), the injected [`WorkerRegistry`], and the run-once
//! [`ShutdownCoordinator`].
//!
//! Internal modules:
//! - [`runner`]: executes one worker body, records its terminal state and removes it;
//! - [`controller`]: create / stop / list / stop-all against the registry;
//! - [`registry`]: concurrent name → handle map;
//! - [`shutdown`]: signal handling and the run-once drain hook;
//! - [`report`]: command replies and drain outcomes.

mod builder;
mod controller;
mod registry;
mod report;
mod runner;
mod shutdown;

pub use builder::ControllerBuilder;
pub use controller::Controller;
pub use registry::WorkerRegistry;
pub use report::{DrainReport, Reply};
pub use shutdown::{ShutdownCoordinator, wait_for_shutdown_signal};
