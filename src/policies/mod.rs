//! Worker idling policies.
//!
//! Workers poll their tasks cooperatively. When a whole sweep reports no work
//! the worker sleeps before sweeping again; these knobs control how long.
//!
//! ## Contents
//! - [`IdlePolicy`] how idle delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy so idle workers don't wake in lockstep
//!
//! ## Quick wiring
//! ```text
//! Config { idle: IdlePolicy, .. }
//!      └─► executor::worker loop uses:
//!           - idle.delay(empty_sweeps) after a sweep without work
//!           - a wake signal resets `empty_sweeps` to zero
//! ```
//!
//! ## Defaults
//! - `IdlePolicy::default()` → first=1ms, factor=2.0, max=50ms, jitter=None.

mod idle;
mod jitter;

pub use idle::IdlePolicy;
pub use jitter::JitterPolicy;
