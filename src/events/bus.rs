//! # Broadcast of core state changes.
//!
//! Every component that changes the stack, the focus slots or the voice
//! session reports it as an [`Event`] on one shared [`Bus`].
//!
//! ## Wiring
//! ```text
//! Publishers (many):                 Subscribers (many):
//!   Lifetime   ──┐                    ┌──► subscriber_listener ──► SubscriberSet
//!   AudioFocus ──┼──────► Bus ────────┤     (in Runtime)
//!   Dispatcher ──┤  (broadcast chan)  └──► Runtime::subscribe() receivers
//!   Turen      ──┘
//! ```
//!
//! ## Rules
//! - Publishing happens while component locks may be held, so it must not wait.
//! - Receivers that fall `Config::bus_capacity` events behind get `Lagged(n)`.
//! - With no receiver attached the event is gone; nothing is replayed.

use tokio::sync::broadcast;

use super::event::Event;

/// Shared sender of runtime events. Clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// `capacity` below 1 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        // Err only means nobody listens.
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
