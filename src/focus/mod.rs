//! # Audio focus arbitration.
//!
//! Decides which app's audio/voice output may currently play. Two slots exist:
//!
//! - **transient**: the most recent interruption (TTS answer, alarm); always the
//!   current holder of device attention when present;
//! - **lasting**: the session-style holder (music, radio) that is paused-but-owed
//!   while a transient request is active and resumes via `gain` when it ends.
//!
//! ```text
//! request(app, id, gain) ──► decode bitmask ──► FocusState (sync, under lock)
//!                                                  │  loss/gain notifications
//!                                                  │  FocusShifted broadcast
//!                                                  ▼
//!                                 AppBridge::emit(loss) ──► AppBridge::emit(gain)
//! ```

mod audio_focus;
mod request;
mod state;

pub use audio_focus::AudioFocus;
pub use request::{FocusRequest, FocusResult, FocusShiftKey};
