//! # Event subscribers.
//!
//! Subscribers observe the [`Event`](crate::events::Event)s the controller and
//! its workers publish. They never influence worker lifecycle.
//!
//! ## Architecture
//! ```text
//! Worker/Controller ── publish(Event) ──► Bus ──► fan-out listener
//!                                                      │
//!                                               SubscriberSet::emit
//!                                                 ┌────┴────┬────────┐
//!                                                 ▼         ▼        ▼
//!                                             LogWriter   Metrics  Custom ...
//! ```
//!
//! ## Contents
//! - [`Subscribe`] extension trait
//! - [`SubscriberSet`] bounded, panic-isolated fan-out
//! - `LogWriter` (feature `logging`) forwards events to `tracing`

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
