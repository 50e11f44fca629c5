//! # skillvisor
//!
//! **Skillvisor** is the application runtime of a voice-driven device.
//!
//! It decides which of several independently running skill apps currently owns
//! the device's voice, audio and screen, and drives their life cycle
//! (create, resume, pause, background, destroy) in response to wake-word and
//! speech events and to explicit app requests.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   wake word / ASR / NLP            open_url / notifications
//!            │                                  │
//!            ▼                                  ▼
//! ┌──────────────────────┐  nlp   ┌───────────────────────────────┐
//! │ Turen                │ ─────► │ Runtime (VoiceHost)           │
//! │ - session state      │        │ - phases, hibernate, reset    │
//! │ - debounced timers   │        │ - app_did_exit reconciliation │
//! └──────────┬───────────┘        └───────────────┬───────────────┘
//!            │ awaken signal                      ▼
//!            │                    ┌───────────────────────────────┐
//!            └──────────────────► │ Dispatcher                    │
//!                                 │ - interception chain          │
//!                                 │ - monopoly redirect           │
//!                                 └───────────────┬───────────────┘
//!                                                 ▼
//! ┌──────────────────────┐        ┌───────────────────────────────┐
//! │ AudioFocus           │        │ Lifetime                      │
//! │ - transient slot     │        │ - activation stack            │
//! │ - lasting slot       │        │ - monopolist                  │
//! └──────────┬───────────┘        └───────┬───────────────┬───────┘
//!            │ gain / loss                │ life-cycle    │ create / suspend
//!            ▼                            ▼               ▼
//!      ┌──────────────────────────────────────┐   ┌──────────────┐
//!      │ AppBridge (one channel per app)      │   │ AppScheduler │
//!      └──────────────────────────────────────┘   └──────────────┘
//!
//! every component ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//! ```
//!
//! ### Voice command flow
//! ```text
//! voice_coming ──► awaken (pause playback, arm 9s timer)
//! asr_pending  ──► cancel 9s timer, arm 6s timer
//! asr_end      ──► cancel 6s timer, show loading
//! nlp          ──► Runtime::handle_voice_command
//!                    └─► Dispatcher::dispatch_app_event(app, "request", ..)
//!                          ├─► Lifetime::create_app
//!                          ├─► Lifetime::activate_app_by_id (paused → old top, resumed → app)
//!                          └─► AppBridge::emit(app, Custom { "request" })
//! app          ──► AudioFocus::request(app, id, gain) ──► loss → old holder, gain → app
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Lifetime**      | Activation stack, cut/scene preemption, monopoly.             | [`Lifetime`], [`ActivateParams`]          |
//! | **Audio focus**   | Transient/lasting focus with ducking and exclusivity.          | [`AudioFocus`], [`FocusRequest`]          |
//! | **Dispatch**      | Intent and URL routing with an interception chain.             | [`Dispatcher`], [`Interception`]          |
//! | **Voice session** | Wake/ASR/NLP state machine with debounced timers.              | [`Turen`], [`TurenEvent`]                 |
//! | **Runtime**       | Wiring, boot phases, hibernate, reset.                         | [`Runtime`], [`RuntimeBuilder`]           |
//! | **Subscriber API**| Observe every runtime event.                                   | [`Subscribe`], [`Event`], [`EventKind`]   |
//! | **Errors**        | Typed errors for life-cycle, delivery and configuration.       | [`RuntimeError`], [`BridgeError`], [`ConfigError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use skillvisor::{AppBridge, AppEvent, AudioFocus, BridgeError, Bus, FocusRequest, FocusResult};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl AppBridge for Printer {
//!     async fn emit(&self, app_id: &str, event: AppEvent) -> Result<(), BridgeError> {
//!         println!("{app_id} <- {}", event.name());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let focus = AudioFocus::new(Arc::new(Printer), Bus::new(16));
//!
//!     // music plays, a TTS prompt ducks it, music resumes
//!     assert_eq!(focus.request("music", 1, 0).await, FocusResult::Granted);
//!     let gain = FocusRequest::TRANSIENT | FocusRequest::MAY_DUCK;
//!     assert_eq!(focus.request("tts", 1, gain).await, FocusResult::Granted);
//!     assert!(focus.abandon("tts", 1).await);
//!
//!     assert_eq!(focus.current().await.map(|r| r.app_id), Some("music".to_string()));
//! }
//! ```
mod apps;
mod config;
mod dispatcher;
mod error;
mod events;
mod focus;
mod lifetime;
mod runtime;
mod services;
mod subscribers;
mod turen;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use apps::{
    AppBridge, AppEnvelope, AppEvent, AppRecord, AppScheduler, AppStatus, ChannelBridge,
    Lifecycle, Manifest, SchedulerError, StaticManifest,
};
pub use config::Config;
pub use dispatcher::{DispatchOptions, DispatchServices, Dispatcher, Handler, Interception, Interceptor};
pub use error::{BridgeError, ConfigError, RuntimeError};
pub use events::{Bus, Event, EventKind, FocusShift, Phase};
pub use focus::{AudioFocus, FocusRequest, FocusResult, FocusShiftKey};
pub use lifetime::{ActivateParams, ActivationStack, ContextOptions, DeactivateOptions, Form, Lifetime};
pub use runtime::{APP_URL_SCHEME, Runtime, RuntimeBuilder, VoiceCommand};
pub use services::{Announcement, Custodian, Feedback, Microphone, Playback, SkillStack, Speech};
pub use subscribers::{Subscribe, SubscriberSet};
pub use turen::{
    AsrState, AwakenSignal, DebouncedTimer, SessionSnapshot, Turen, TurenEvent, VoiceHost,
    VoiceServices,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
