//! # Turen: voice-session state machine.
//!
//! Turns raw wake-word and speech-service signals into awaken state, pickup
//! control, feedback and voice commands.
//!
//! ```text
//!  Idle ──voice_coming──► Awaken ──asr_pending/accept/extra──► AsrPending ──asr_end──► AsrEnd ──nlp──► Idle
//!   ▲                       │ solitary timer (9s)                 │ no-voice timer (6s)
//!   └───────────────────────┴────── reject / fake / error / timeout ┘
//!
//!  orthogonal: picking_up, picking_up_discard_next (written by pickup())
//! ```
//!
//! ## Rules
//! - Handlers are serialized by one session lock.
//! - Clearing the session always cancels its timers; a timer that fires late
//!   re-checks its generation under the lock and does nothing if it was superseded.
//! - Handlers decide under the lock and call the device services and the
//!   voice-command host only after releasing it.
//! - Ending the awaken phase cancels both timers.

mod event;
mod session;
mod timer;
mod turen;

pub use event::TurenEvent;
pub use session::{AsrState, AwakenSignal, SessionSnapshot};
pub use timer::DebouncedTimer;
pub use turen::{Turen, VoiceHost, VoiceServices};
