//! # Controller configuration.
//!
//! Provides [`ControllerConfig`] centralized settings for the controller runtime.
//!
//! Config is used in two ways:
//! 1. **Controller creation**: `Controller::builder(config)`
//! 2. **Command defaults**: the command protocol fills omitted fields from it
//!    (`create` lifetime, `add` interval and daemon flag).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`ControllerConfig::bus_capacity_clamped`]
//! - `min_interval = 0s` → periodic workers may spin without suspending; keep it above zero

use std::time::Duration;

/// Global configuration for the controller runtime.
///
/// ## Field semantics
/// - `stop_grace`: how long a single `stop` waits for the worker to exit
/// - `drain_grace`: how long `stop_all` waits for **each** worker (waits run concurrently)
/// - `default_lifetime`: lifetime of `create` workers when the command omits it
/// - `default_interval`: period of `add` workers when the command omits it
/// - `default_daemon`: daemon flag of `add` workers when the command omits it
/// - `min_interval`: lower bound applied to periodic intervals
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Upper bound on the wait performed by `stop`.
    ///
    /// When exceeded, `stop` reports `TimedOut` and the entry stays registered
    /// until the worker exits on its own.
    pub stop_grace: Duration,

    /// Upper bound on the per-worker wait performed by `stop_all`.
    ///
    /// Drained entries are removed once every wait has either completed or
    /// hit this bound.
    pub drain_grace: Duration,

    /// Lifetime of fixed-duration workers created without an explicit duration.
    pub default_lifetime: Duration,

    /// Period of periodic workers created without an explicit interval.
    pub default_interval: Duration,

    /// Daemon flag of periodic workers created without an explicit flag.
    pub default_daemon: bool,

    /// Smallest interval a periodic worker sleeps between iterations.
    pub min_interval: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl ControllerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Raises `interval` to [`ControllerConfig::min_interval`].
    #[inline]
    pub fn clamp_interval(&self, interval: Duration) -> Duration {
        interval.max(self.min_interval)
    }
}

impl Default for ControllerConfig {
    /// Default configuration:
    ///
    /// - `stop_grace = 5s`
    /// - `drain_grace = 3s`
    /// - `default_lifetime = 30s`
    /// - `default_interval = 1000ms`
    /// - `default_daemon = true`
    /// - `min_interval = 1ms`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_secs(5),
            drain_grace: Duration::from_secs(3),
            default_lifetime: Duration::from_secs(30),
            default_interval: Duration::from_millis(1000),
            default_daemon: true,
            min_interval: Duration::from_millis(1),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_raised_to_minimum() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.clamp_interval(Duration::ZERO), Duration::from_millis(1));
        assert_eq!(
            cfg.clamp_interval(Duration::from_millis(250)),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn bus_capacity_never_zero() {
        let cfg = ControllerConfig {
            bus_capacity: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
