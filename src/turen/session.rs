//! Voice-session state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::timer::DebouncedTimer;

/// Progress of speech recognition in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsrState {
    /// Recognition started (or is expected) and has not finished.
    Pending,
    /// The utterance was classified as a false wake.
    Fake,
    /// Recognition finished; an NLP result may follow.
    #[default]
    End,
    /// The speech service rejected the utterance.
    Reject,
}

/// Shared, lock-free view of whether a voice session is awaken.
///
/// Cloned into the dispatcher so it can hold back preemption while the user speaks.
#[derive(Debug, Clone, Default)]
pub struct AwakenSignal(Arc<AtomicBool>);

impl AwakenSignal {
    pub fn is_awaken(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, awaken: bool) {
        self.0.store(awaken, Ordering::Release);
    }
}

/// Point-in-time copy of the session, for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub muted: bool,
    pub awaken: bool,
    pub asr_state: AsrState,
    pub picking_up: bool,
    pub picking_up_discard_next: bool,
    /// App whose playback was paused when the session woke up.
    pub paused_on_awaken: Option<String>,
    pub solitary_voice_coming_armed: bool,
    pub no_voice_input_armed: bool,
}

#[derive(Debug)]
pub(super) struct Session {
    pub awaken: bool,
    pub asr_state: AsrState,
    pub picking_up: bool,
    pub picking_up_discard_next: bool,
    pub paused_on_awaken: Option<String>,
    /// Bumped on every awaken and every clear.
    pub wake_id: u64,
    /// `wake_id` of a playback pause still waiting for its answer.
    pub pending_pause: Option<u64>,
    /// Recovery was asked for while the pause was in flight.
    pub recover_on_pause: bool,
    pub solitary_voice_coming: DebouncedTimer,
    pub no_voice_input: DebouncedTimer,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            awaken: false,
            asr_state: AsrState::default(),
            picking_up: false,
            picking_up_discard_next: false,
            paused_on_awaken: None,
            wake_id: 0,
            pending_pause: None,
            recover_on_pause: false,
            solitary_voice_coming: DebouncedTimer::new("solitary_voice_coming"),
            no_voice_input: DebouncedTimer::new("no_voice_input"),
        }
    }
}

impl Session {
    pub fn snapshot(&self, muted: bool) -> SessionSnapshot {
        SessionSnapshot {
            muted,
            awaken: self.awaken,
            asr_state: self.asr_state,
            picking_up: self.picking_up,
            picking_up_discard_next: self.picking_up_discard_next,
            paused_on_awaken: self.paused_on_awaken.clone(),
            solitary_voice_coming_armed: self.solitary_voice_coming.is_armed(),
            no_voice_input_armed: self.no_voice_input.is_armed(),
        }
    }

    pub fn cancel_timers(&mut self) {
        self.solitary_voice_coming.cancel();
        self.no_voice_input.cancel();
    }

    /// Cancels both timers and returns to the idle state.
    pub fn clear(&mut self) {
        self.cancel_timers();
        self.wake_id += 1;
        self.pending_pause = None;
        self.recover_on_pause = false;
        self.awaken = false;
        self.asr_state = AsrState::default();
        self.picking_up = false;
        self.picking_up_discard_next = false;
        self.paused_on_awaken = None;
    }
}
