//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the dagvisor runtime.
//!
//! Config is used in two ways:
//! 1. **Runtime creation**: `Runtime::builder(config)` sizes the shared pools and the bus.
//! 2. **Application setup**: every [`ExecutorContext`](crate::ExecutorContext) copies
//!    the awaiting timeout, mailbox capacity and idle policy.
//!
//! ## Sentinel values
//! - `await_timeout = 0s` → wait for container start without a deadline
//! - `network_workers = 0` / `processing_workers = 0` → clamped to one worker
//! - `mailbox_capacity = 0` / `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::IdlePolicy;

/// Global configuration for the dagvisor runtime.
///
/// ## Field semantics
/// - `await_timeout`: Maximum wait for each container start request (`0s` = no deadline)
/// - `network_workers`: Worker count of the shared network pool
/// - `processing_workers`: Worker count of the shared processing pool
/// - `mailbox_capacity`: Pending requests per state machine before `request` is rejected
/// - `bus_capacity`: Event bus ring buffer size
/// - `idle`: How long workers sleep after a sweep without work
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for one container to accept its execute request.
    ///
    /// Exceeding it aborts the application startup.
    pub await_timeout: Duration,

    /// Number of workers in the shared network pool.
    pub network_workers: usize,

    /// Number of workers in the shared processing pool.
    pub processing_workers: usize,

    /// Capacity of every state machine mailbox.
    pub mailbox_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Idle policy applied by every worker between empty sweeps.
    pub idle: IdlePolicy,
}

impl Config {
    /// Returns the awaiting timeout as an `Option`.
    ///
    /// - `None` → wait without deadline
    /// - `Some(d)` → each container start is bounded by `d`
    #[inline]
    pub fn await_limit(&self) -> Option<Duration> {
        if self.await_timeout == Duration::ZERO {
            None
        } else {
            Some(self.await_timeout)
        }
    }

    /// Returns the network pool size clamped to a minimum of 1.
    #[inline]
    pub fn network_workers_clamped(&self) -> usize {
        self.network_workers.max(1)
    }

    /// Returns the processing pool size clamped to a minimum of 1.
    #[inline]
    pub fn processing_workers_clamped(&self) -> usize {
        self.processing_workers.max(1)
    }

    /// Returns a mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `await_timeout = 30s`
    /// - `network_workers = processing_workers = available parallelism`
    /// - `mailbox_capacity = 1024`
    /// - `bus_capacity = 1024`
    /// - `idle = IdlePolicy::default()`
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            await_timeout: Duration::from_secs(30),
            network_workers: cores,
            processing_workers: cores,
            mailbox_capacity: 1024,
            bus_capacity: 1024,
            idle: IdlePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_clamped() {
        let cfg = Config {
            await_timeout: Duration::ZERO,
            network_workers: 0,
            processing_workers: 0,
            mailbox_capacity: 0,
            bus_capacity: 0,
            idle: IdlePolicy::default(),
        };
        assert_eq!(cfg.await_limit(), None);
        assert_eq!(cfg.network_workers_clamped(), 1);
        assert_eq!(cfg.processing_workers_clamped(), 1);
        assert_eq!(cfg.mailbox_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn default_bounds_container_start() {
        let cfg = Config::default();
        assert_eq!(cfg.await_limit(), Some(Duration::from_secs(30)));
        assert!(cfg.network_workers >= 1);
    }
}
