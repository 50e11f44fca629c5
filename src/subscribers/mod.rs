//! # Event subscribers for the skill runtime.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`]
//! and (behind the `logging` feature) the [`LogWriter`] subscriber.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Lifetime/AudioFocus/... ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                              │
//!                                                              ▼
//!                                                        SubscriberSet
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter   Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use skillvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FocusAudit;
//!
//! #[async_trait]
//! impl Subscribe for FocusAudit {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::FocusShifted {
//!             // record the shift
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "focus-audit" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
