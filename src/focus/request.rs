//! # Focus request model.
//!
//! Apps describe what they want with an integer `gain` bitmask; the core decodes
//! it once into a [`FocusRequest`] and never looks at the raw bits again.
//! Unknown bits are ignored.

/// A decoded focus request.
///
/// # Example
/// ```
/// use skillvisor::FocusRequest;
///
/// let req = FocusRequest::decode("tts", 1, FocusRequest::TRANSIENT | FocusRequest::MAY_DUCK | 0b1000);
/// assert!(req.transient);
/// assert!(req.may_duck);
/// assert!(!req.exclusive);
/// assert_eq!(req.gain(), 0b101);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusRequest {
    pub id: i32,
    pub app_id: String,
    pub transient: bool,
    pub exclusive: bool,
    pub may_duck: bool,
}

impl FocusRequest {
    /// Short interruption; resumes the lasting holder when abandoned.
    pub const TRANSIENT: u32 = 0b001;
    /// While held, requests from other apps fail.
    pub const EXCLUSIVE: u32 = 0b010;
    /// Other holders may lower their volume instead of stopping.
    pub const MAY_DUCK: u32 = 0b100;

    /// Decodes a `gain` bitmask into a request.
    pub fn decode(app_id: impl Into<String>, id: i32, gain: u32) -> Self {
        Self {
            id,
            app_id: app_id.into(),
            transient: gain & Self::TRANSIENT != 0,
            exclusive: gain & Self::EXCLUSIVE != 0,
            may_duck: gain & Self::MAY_DUCK != 0,
        }
    }

    /// Re-encodes the request flags (only the three defined bits).
    pub fn gain(&self) -> u32 {
        let mut gain = 0;
        if self.transient {
            gain |= Self::TRANSIENT;
        }
        if self.exclusive {
            gain |= Self::EXCLUSIVE;
        }
        if self.may_duck {
            gain |= Self::MAY_DUCK;
        }
        gain
    }

    /// Returns true if this request is `(app_id, id)`.
    #[inline]
    pub fn is(&self, app_id: &str, id: i32) -> bool {
        self.id == id && self.app_id == app_id
    }

    pub(crate) fn shift_key(&self) -> FocusShiftKey {
        FocusShiftKey {
            app_id: self.app_id.clone(),
            transient: self.transient,
            exclusive: self.exclusive,
            may_duck: self.may_duck,
        }
    }
}

/// Outcome of [`AudioFocus::request`](crate::AudioFocus::request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusResult {
    /// The request holds a slot.
    Granted,
    /// Blocked by an exclusive holder of another app.
    Failed,
    /// `(app_id, id)` already holds a slot with different flags.
    RequestNotMatch,
}

/// Requester attributes the focus-shift counter is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusShiftKey {
    pub app_id: String,
    pub transient: bool,
    pub exclusive: bool,
    pub may_duck: bool,
}
