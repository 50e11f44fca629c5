//! # App-facing contracts.
//!
//! Everything the core needs to talk to skill app processes and to the
//! external process supervisor:
//!
//! - [`AppEvent`], [`Lifecycle`] typed messages sent to apps
//! - [`AppBridge`] delivery seam, with the channel-based [`ChannelBridge`]
//! - [`AppScheduler`], [`AppRecord`], [`AppStatus`] the process supervisor contract
//! - [`Manifest`], [`StaticManifest`] URL host and notification channel lookup
//!
//! ```text
//! Lifetime / AudioFocus / Dispatcher
//!        │ emit(app_id, AppEvent)
//!        ▼
//!   AppBridge ──► [mpsc per app] ──► app process (acks envelope)
//!
//! Lifetime / Dispatcher
//!        │ create_app / suspend_app
//!        ▼
//!   AppScheduler (external supervisor)
//! ```

mod bridge;
mod event;
mod manifest;
mod scheduler;

pub use bridge::{AppBridge, AppEnvelope, ChannelBridge};
pub use event::{AppEvent, Lifecycle};
pub use manifest::{Manifest, StaticManifest};
pub use scheduler::{AppRecord, AppScheduler, AppStatus, SchedulerError};
