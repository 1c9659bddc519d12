//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the controller, the worker
//! runner, the shutdown coordinator and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller`, `core::runner`, `ShutdownCoordinator`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the controller's fan-out listener (feeds `SubscriberSet`)
//!   and anything holding a receiver from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
