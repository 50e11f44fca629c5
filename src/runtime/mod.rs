//! # Runtime: composes the core components.
//!
//! ```text
//! RuntimeBuilder::build()
//!   ├─► Bus + SubscriberSet (listener task forwards Bus → subscribers)
//!   ├─► Lifetime(scheduler, bridge)
//!   ├─► AudioFocus(bridge)
//!   ├─► Dispatcher(lifetime, manifest, interception)   ← ConfigError is fatal here
//!   └─► Turen(lifetime, Weak<Runtime> as VoiceHost)
//!
//! Turen ──nlp──► Runtime::handle_voice_command ──► Dispatcher ──► Lifetime ──► app
//! ```

mod builder;
mod runtime;
mod voice;

pub use builder::RuntimeBuilder;
pub use runtime::{APP_URL_SCHEME, Runtime};
pub use voice::VoiceCommand;
