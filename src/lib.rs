//! # workerctl
//!
//! **workerctl** is a runtime controller for named background workers.
//!
//! A long-lived process keeps a registry of independently running tokio
//! tasks, each identified by a unique name. Workers are created on demand,
//! run until their lifetime elapses or a stop request arrives, and are
//! cooperatively cancelled with a bounded grace period. Commands may arrive
//! concurrently from any number of callers; the controller processes them
//! without races against workers that finish on their own.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   CommandSource (stdin, script, ...)
//!          │ lines
//!          ▼
//!  ┌───────────────┐  first command   ┌──────────────────────┐
//!  │     Agent     │ ───register────► │ ShutdownCoordinator  │◄── SIGINT/SIGTERM/SIGQUIT
//!  │ parse Command │                  │   (drains once)      │
//!  └──────┬────────┘                  └──────────┬───────────┘
//!         │ execute(Command)                     │ stop_all()
//!         ▼                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller                                                       │
//! │  - create / stop / list / stop_all                                │
//! │  - WorkerRegistry (name → WorkerHandle, injected)                 │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        │ tokio::spawn     │                  │
//!        ▼                  ▼                  ▼
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐
//!   │  fixed   │      │ periodic │      │  custom  │   run_worker: execute, record
//!   │  sleep   │      │ heartbeat│      │   Work   │   state, remove self, mark finished
//!   └────┬─────┘      └────┬─────┘      └────┬─────┘
//!        └──── publish(Event) ───────────────┘
//!                          ▼
//!              Bus ──► fan-out listener ──► SubscriberSet ──► LogWriter, custom ...
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! Absent ──create──► Running ──stop / stop_all──► Stopping ──exit──► Absent
//!                       │                                     ▲
//!                       └── lifetime elapsed / body returns ──┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Control**       | Create, stop, list and drain named workers.                  | [`Controller`], [`WorkerRegistry`]         |
//! | **Workers**       | Fixed-duration, periodic and custom worker bodies.           | [`WorkerSpec`], [`Work`], [`WorkFn`]       |
//! | **Commands**      | Text protocol and command sources.                           | [`Command`], [`CommandSource`], [`Agent`]  |
//! | **Shutdown**      | Run-once drain on termination signal or natural exit.        | [`ShutdownCoordinator`]                    |
//! | **Subscriber API**| Observe lifecycle events (logging, metrics, tests).          | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed, recoverable command errors.                           | [`ControlError`], [`WorkError`]            |
//! | **Configuration** | Grace periods and command defaults.                          | [`ControllerConfig`]                       |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use workerctl::{Agent, Controller, ControllerConfig, Reply};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = ControllerConfig {
//!         stop_grace: Duration::from_secs(1),
//!         ..ControllerConfig::default()
//!     };
//!     let agent = Agent::new(Controller::builder(cfg).build());
//!
//!     agent.handle_line("add:ticker:true:100").await.unwrap();
//!     let reply = agent.handle_line("list").await.unwrap();
//!     assert!(matches!(reply, Reply::Workers(ref w) if w.len() == 1));
//!
//!     agent.handle_line("stop:ticker").await.unwrap();
//!     let report = agent.shutdown().run("example").await.unwrap();
//!     assert!(report.is_clean());
//! }
//! ```

mod agent;
mod command;
mod config;
mod core;
mod error;
mod events;
mod source;
mod subscribers;
mod workers;

// ---- Public re-exports ----

pub use agent::Agent;
pub use command::Command;
pub use config::ControllerConfig;
pub use crate::core::{
    Controller, ControllerBuilder, DrainReport, Reply, ShutdownCoordinator, WorkerRegistry,
    wait_for_shutdown_signal,
};
pub use error::{ControlError, WorkError};
pub use events::{Bus, Event, EventKind};
pub use source::{CommandSource, LineSource, ScriptSource};
pub use subscribers::{Subscribe, SubscriberSet};
pub use workers::{CompletionState, Work, WorkFn, WorkRef, WorkerHandle, WorkerInfo, WorkerKind, WorkerSpec};

// Built-in logger subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
