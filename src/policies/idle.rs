//! # Idle policy for cooperative workers.
//!
//! [`IdlePolicy`] controls how long a worker sleeps after consecutive sweeps
//! in which none of its tasks did any work. It is parameterized by:
//! - [`IdlePolicy::first`] the delay after the first empty sweep;
//! - [`IdlePolicy::factor`] the multiplicative growth factor;
//! - [`IdlePolicy::max`] the delay cap.
//!
//! The delay after `n` consecutive empty sweeps is `first × factor^n`,
//! clamped to `max`, then jittered. The base delay is derived from `n` only,
//! so jitter never feeds back into later delays.
//!
//! A busy sweep resets `n`; so does an explicit wake-up of the worker.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use dagvisor::{IdlePolicy, JitterPolicy};
//!
//! let idle = IdlePolicy {
//!     first: Duration::from_millis(1),
//!     max: Duration::from_millis(50),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(idle.delay(0), Duration::from_millis(1));
//! assert_eq!(idle.delay(3), Duration::from_millis(8));
//! assert_eq!(idle.delay(20), Duration::from_millis(50));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Idle backoff between empty sweeps.
#[derive(Clone, Copy, Debug)]
pub struct IdlePolicy {
    /// Delay after the first empty sweep.
    pub first: Duration,
    /// Delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to every delay.
    pub jitter: JitterPolicy,
}

impl Default for IdlePolicy {
    /// Returns a policy with `first = 1ms`, `factor = 2.0`, `max = 50ms`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(1),
            max: Duration::from_millis(50),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl IdlePolicy {
    /// Computes the delay after `empty_sweeps` consecutive empty sweeps (0-indexed).
    pub fn delay(&self, empty_sweeps: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = empty_sweeps.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, factor: f64) -> IdlePolicy {
        IdlePolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_first_empty_sweep_uses_first() {
        assert_eq!(policy(2, 50, 2.0).delay(0), Duration::from_millis(2));
    }

    #[test]
    fn test_growth_is_exponential() {
        let p = policy(1, 1_000, 2.0);
        assert_eq!(p.delay(1), Duration::from_millis(2));
        assert_eq!(p.delay(2), Duration::from_millis(4));
        assert_eq!(p.delay(5), Duration::from_millis(32));
    }

    #[test]
    fn test_clamped_to_max() {
        let p = policy(1, 50, 2.0);
        assert_eq!(p.delay(10), Duration::from_millis(50));
        assert_eq!(p.delay(u32::MAX), Duration::from_millis(50));
    }

    #[test]
    fn test_first_exceeds_max() {
        assert_eq!(policy(100, 10, 1.0).delay(0), Duration::from_millis(10));
    }

    #[test]
    fn test_full_jitter_stays_below_base() {
        let p = IdlePolicy {
            jitter: JitterPolicy::Full,
            ..policy(10, 1_000, 1.0)
        };
        for n in 0..20 {
            assert!(p.delay(n) <= Duration::from_millis(10));
        }
    }
}
