//! Activation and deactivation parameters.

use std::fmt;
use std::str::FromStr;

/// Activation style of an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    /// Transient interruption; replaces the current top unless it is kept alive.
    #[default]
    Cut,
    /// Persistent session; the previous top stays below it.
    Scene,
}

impl Form {
    pub fn as_str(self) -> &'static str {
        match self {
            Form::Cut => "cut",
            Form::Scene => "scene",
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Form {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cut" => Ok(Form::Cut),
            "scene" => Ok(Form::Scene),
            other => Err(format!("unknown form {other:?}")),
        }
    }
}

/// Parameters of [`Lifetime::activate_app_by_id`](crate::Lifetime::activate_app_by_id).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivateParams {
    pub form: Form,
    /// Keep the process running when it leaves the stack.
    pub keep_alive: bool,
    /// Grant the app veto power over preemption while it stays on top.
    pub monopolist: bool,
}

impl ActivateParams {
    pub fn cut() -> Self {
        Self::default()
    }

    pub fn scene() -> Self {
        Self {
            form: Form::Scene,
            ..Self::default()
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_monopolist(mut self, monopolist: bool) -> Self {
        self.monopolist = monopolist;
        self
    }
}

/// Preemption hints stored per app while it is on the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextOptions {
    pub form: Form,
    pub keep_alive: bool,
}

/// Options of [`Lifetime::deactivate_app_by_id`](crate::Lifetime::deactivate_app_by_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeactivateOptions {
    /// Resume the new top if the deactivated app was on top.
    pub recover: bool,
    /// Suspend with force even if the app is not on the stack or kept alive.
    pub force: bool,
    /// Suspend even if the app asked to be kept alive.
    pub ignore_kept_alive: bool,
}

impl Default for DeactivateOptions {
    fn default() -> Self {
        Self {
            recover: true,
            force: false,
            ignore_kept_alive: false,
        }
    }
}

impl DeactivateOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn without_recover(mut self) -> Self {
        self.recover = false;
        self
    }
}
