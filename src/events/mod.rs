//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by state machines, executor workers,
//! orchestration handlers and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `fsm` mailboxes, `executor` workers, startup and teardown
//!   handlers, `ProcessingContainer` cleanup, `SubscriberSet` workers.
//! - **Consumers**: the runtime's fan-out listener (feeds `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
