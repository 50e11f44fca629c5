//! # Manifest lookup.
//!
//! Manifest loading is external; the core only reads two things out of it:
//! which app serves a `yoda-app://<host>` URL, and which apps subscribed to a
//! notification channel.

use std::collections::HashMap;

/// Read-only view of the loaded app manifests.
pub trait Manifest: Send + Sync + 'static {
    /// Resolves a URL host to the app id serving it.
    fn app_id_by_host(&self, host: &str) -> Option<String>;

    /// Returns the apps registered on a notification channel, in registration order.
    fn channel_subscribers(&self, channel: &str) -> Vec<String>;
}

/// In-memory [`Manifest`] built up front.
///
/// # Example
/// ```
/// use skillvisor::{Manifest, StaticManifest};
///
/// let manifest = StaticManifest::new()
///     .with_host("weather", "com.example.weather")
///     .with_channel("on-battery-low", "com.example.weather");
///
/// assert_eq!(manifest.app_id_by_host("weather").as_deref(), Some("com.example.weather"));
/// assert_eq!(manifest.channel_subscribers("on-battery-low"), vec!["com.example.weather"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticManifest {
    hosts: HashMap<String, String>,
    channels: HashMap<String, Vec<String>>,
}

impl StaticManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `host` to `app_id`.
    pub fn with_host(mut self, host: impl Into<String>, app_id: impl Into<String>) -> Self {
        self.hosts.insert(host.into(), app_id.into());
        self
    }

    /// Registers `app_id` on `channel` (ignored if already registered).
    pub fn with_channel(mut self, channel: impl Into<String>, app_id: impl Into<String>) -> Self {
        let app_id = app_id.into();
        let subs = self.channels.entry(channel.into()).or_default();
        if !subs.contains(&app_id) {
            subs.push(app_id);
        }
        self
    }
}

impl Manifest for StaticManifest {
    fn app_id_by_host(&self, host: &str) -> Option<String> {
        self.hosts.get(host).cloned()
    }

    fn channel_subscribers(&self, channel: &str) -> Vec<String> {
        self.channels.get(channel).cloned().unwrap_or_default()
    }
}
