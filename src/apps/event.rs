//! # Messages delivered to skill apps.
//!
//! The core never calls into an app directly; it sends an [`AppEvent`] and lets the
//! app process react. Life-cycle transitions, focus callbacks, suppressed events and
//! routed events all share this one type.

use std::fmt;

use serde_json::Value;

/// Life-cycle transitions an app can be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// App process was created.
    Create,
    /// App became the top of the activation stack.
    Resumed,
    /// App lost the top of the activation stack.
    Paused,
    /// App keeps running off-stack.
    Background,
    /// App is about to be torn down.
    Destroy,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Create => "create",
            Lifecycle::Resumed => "resumed",
            Lifecycle::Paused => "paused",
            Lifecycle::Background => "background",
            Lifecycle::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message sent to an app process.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Life-cycle transition with its argument array.
    Lifecycle(Lifecycle, Vec<Value>),

    /// The app's focus request `id` may play.
    FocusGain {
        id: i32,
    },

    /// The app's focus request `id` must stop (or duck).
    ///
    /// `transient` and `may_duck` describe the request that caused the loss.
    FocusLoss {
        id: i32,
        transient: bool,
        may_duck: bool,
    },

    /// The app is the monopolist and `event` was addressed to another app.
    Oppressing {
        event: String,
    },

    /// A routed app event (`url`, `request`, `notification`, ...).
    Custom {
        event: String,
        params: Vec<Value>,
    },
}

impl AppEvent {
    /// Shorthand for a life-cycle event without arguments.
    pub fn lifecycle(kind: Lifecycle) -> Self {
        AppEvent::Lifecycle(kind, Vec::new())
    }

    /// Returns the event name as apps see it.
    pub fn name(&self) -> &str {
        match self {
            AppEvent::Lifecycle(kind, _) => kind.as_str(),
            AppEvent::FocusGain { .. } => "gain",
            AppEvent::FocusLoss { .. } => "loss",
            AppEvent::Oppressing { .. } => "oppressing",
            AppEvent::Custom { event, .. } => event,
        }
    }
}
