//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the skill runtime.
//!
//! Config is consumed in two places:
//! 1. **Runtime creation**: `Runtime::builder(config)`
//! 2. **Voice session timers**: [`Turen`](crate::Turen) reads its two timeouts from it
//!
//! ## Sentinel values
//! - `app_ack_timeout = 0s` → wait indefinitely for app acknowledgements
//! - `solitary_voice_coming_timeout = 0s` / `no_voice_input_timeout = 0s` → timer disabled
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use skillvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.no_voice_input_timeout = Duration::from_secs(3);
//!
//! assert_eq!(cfg.no_voice_input(), Some(Duration::from_secs(3)));
//! assert_eq!(cfg.solitary_voice_coming(), Some(Duration::from_millis(9000)));
//! ```

use std::time::Duration;

/// Global configuration for the skill runtime.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `solitary_voice_coming_timeout`: wake without following ASR (`0s` = disabled)
/// - `no_voice_input_timeout`: ASR started but never finished (`0s` = disabled)
/// - `app_ack_timeout`: how long [`ChannelBridge`](crate::ChannelBridge) waits for an ack (`0s` = forever)
/// - `network_error_threshold`: speech error codes at or above it are network-class
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Time allowed between `voice coming` and the first ASR event.
    pub solitary_voice_coming_timeout: Duration,

    /// Time allowed between an intermediate ASR event and `asr end`.
    pub no_voice_input_timeout: Duration,

    /// Acknowledgement window for life-cycle events delivered over app channels.
    pub app_ack_timeout: Duration,

    /// Speech error codes `>=` this value are treated as network failures.
    pub network_error_threshold: i32,
}

impl Config {
    /// Returns the solitary voice-coming timeout as an `Option`.
    #[inline]
    pub fn solitary_voice_coming(&self) -> Option<Duration> {
        non_zero(self.solitary_voice_coming_timeout)
    }

    /// Returns the no-voice-input timeout as an `Option`.
    #[inline]
    pub fn no_voice_input(&self) -> Option<Duration> {
        non_zero(self.no_voice_input_timeout)
    }

    /// Returns the app acknowledgement timeout as an `Option`.
    ///
    /// - `None` → wait until the app acknowledges or drops the envelope
    #[inline]
    pub fn app_ack(&self) -> Option<Duration> {
        non_zero(self.app_ack_timeout)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO { None } else { Some(d) }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `solitary_voice_coming_timeout = 9000ms`
    /// - `no_voice_input_timeout = 6000ms`
    /// - `app_ack_timeout = 5s`
    /// - `network_error_threshold = 100`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            solitary_voice_coming_timeout: Duration::from_millis(9000),
            no_voice_input_timeout: Duration::from_millis(6000),
            app_ack_timeout: Duration::from_secs(5),
            network_error_threshold: 100,
        }
    }
}
