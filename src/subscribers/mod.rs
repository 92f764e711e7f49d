//! # Event subscribers for the dagvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and the built-in [`LogWriter`] for handling events broadcast
//! through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Mailbox / Worker / Startup ── publish(Event) ──► Bus ──► Runtime listener
//!                                                              │
//!                                                        SubscriberSet::emit
//!                                                     ┌─────────┼─────────┐
//!                                                     ▼         ▼         ▼
//!                                                 LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
