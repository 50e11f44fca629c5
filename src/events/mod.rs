//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the lifetime manager,
//! audio focus, dispatcher, voice session and the runtime façade.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Phase`] runtime boot phases carried by [`EventKind::PhaseChanged`]
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Lifetime`, `AudioFocus`, `Dispatcher`, `Turen`, `Runtime`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the runtime's subscriber listener (fans out to `SubscriberSet`)
//!   and anything holding a receiver from [`Runtime::subscribe`](crate::Runtime::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, FocusShift, Phase};
