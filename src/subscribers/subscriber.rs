//! # Observers of runtime events.
//!
//! A [`Subscribe`] implementation sees every [`Event`] published on the
//! runtime bus after `RuntimeBuilder::build`: machine transitions, batch
//! submissions, container startup steps and teardown results.
//!
//! Delivery goes through a queue owned by the subscriber (sized by
//! [`Subscribe::queue_capacity`]) and a worker of its own, so a subscriber that
//! falls behind loses its own events (`SubscriberOverflow`) and never stalls
//! the machines or pools. A panic inside `on_event` is reported as
//! `SubscriberPanicked` and the worker keeps going.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use dagvisor::{Event, EventKind, Subscribe};
//!
//! struct StartupAudit;
//!
//! #[async_trait]
//! impl Subscribe for StartupAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::StartupFailed) {
//!             eprintln!("vertex {:?} did not start: {:?}", ev.source, ev.reason);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "startup-audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives runtime events in publication order.
///
/// `on_event` runs on a tokio worker: do not block in it.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name reported as the `source` of overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events buffered for this subscriber before new ones are dropped.
    /// Values below 1 are treated as 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
