//! # External services consumed by the voice pipeline.
//!
//! Light, sound, speech and media playback run outside the core. Each is an
//! injected trait object; the core never assumes it succeeded beyond what the
//! return type says.
//!
//! - [`Custodian`] network/login readiness gate
//! - [`Feedback`] announcements, awake light, loading indicator
//! - [`Speech`] microphone pickup control
//! - [`Playback`] per-app media pause/resume
//! - [`Microphone`] mute switch
//! - [`SkillStack`] cloud-side skill bookkeeping

use std::fmt;

use async_trait::async_trait;

/// Network and credential readiness gate.
pub trait Custodian: Send + Sync + 'static {
    /// Network is up and the device is logged in.
    fn is_prepared(&self) -> bool;

    /// At least one WiFi network was ever configured.
    fn has_wifi_history(&self) -> bool;
}

/// Spoken announcements played instead of (or after) a voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    /// No network was ever configured; guide the user to setup.
    GuideToSetup,
    /// A network is known but not connected yet.
    NetworkConnecting,
    /// The speech service did not answer in time.
    NetworkLag,
}

impl Announcement {
    pub fn as_str(self) -> &'static str {
        match self {
            Announcement::GuideToSetup => "guide_to_setup",
            Announcement::NetworkConnecting => "network_connecting",
            Announcement::NetworkLag => "network_lag",
        }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light and sound feedback.
#[async_trait]
pub trait Feedback: Send + Sync + 'static {
    async fn announce(&self, announcement: Announcement);

    /// Shows the wake-word light effect.
    async fn awake(&self);

    /// Shows the "processing your request" indicator.
    async fn show_loading(&self);
}

/// Speech service controls.
#[async_trait]
pub trait Speech: Send + Sync + 'static {
    /// Opens or force-closes microphone pickup.
    async fn set_pickup(&self, open: bool);
}

/// Media playback owned by skill apps.
#[async_trait]
pub trait Playback: Send + Sync + 'static {
    /// Pauses what `app_id` plays. Returns false if nothing was playing.
    async fn pause(&self, app_id: &str) -> bool;

    async fn resume(&self, app_id: &str);
}

/// Microphone mute switch.
#[async_trait]
pub trait Microphone: Send + Sync + 'static {
    fn is_muted(&self) -> bool;

    async fn set_muted(&self, muted: bool);
}

/// Cloud-side record of the skill currently in front.
#[async_trait]
pub trait SkillStack: Send + Sync + 'static {
    /// Records that `app_id` took the foreground, optionally for `skill_id`.
    async fn on_app_activated(&self, app_id: &str, skill_id: Option<&str>);
}
