//! Observer seam for stack, focus, dispatch and voice events.
//!
//! A subscriber owns a worker task and a queue of [`Subscribe::queue_capacity`]
//! events. When the queue is full the event is skipped for that subscriber and
//! `EventKind::SubscriberOverflow` is published; a panic in [`Subscribe::on_event`]
//! becomes `EventKind::SubscriberPanicked`. Order is preserved per subscriber.

use async_trait::async_trait;

use crate::events::Event;

/// Receives every event the runtime publishes.
///
/// `on_event` runs on the subscriber's worker, so blocking only delays this subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Pending events kept for this subscriber (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
