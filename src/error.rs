//! Error types used by the skillvisor runtime.
//!
//! This module defines the error enums shared by the core components:
//!
//! - [`RuntimeError`]: failures of life-cycle operations (activation, creation, suspension).
//! - [`BridgeError`]: failures delivering an [`AppEvent`](crate::AppEvent) to an app process.
//! - [`ConfigError`]: invalid runtime wiring, only produced while the runtime is being built.
//!
//! All types provide `as_label` for logging; [`RuntimeError`] also has `as_message`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the life-cycle core.
///
/// Returned by [`Lifetime`](crate::Lifetime) operations. The dispatcher never
/// propagates these to its callers; it logs them and reports `false`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The app must be created before it can be activated.
    #[error("app {app_id} is not running")]
    NotRunning {
        /// The app that was asked to activate.
        app_id: String,
    },

    /// Preemption is vetoed by the current monopolist.
    #[error("app {app_id} is blocked by monopolist {monopolist}")]
    Monopolized {
        /// The app that was asked to activate.
        app_id: String,
        /// The app currently holding the monopoly.
        monopolist: String,
    },

    /// The supervisor refused to create the app.
    #[error("failed to launch app {app_id}: {error}")]
    AppLaunch {
        /// The app that failed to launch.
        app_id: String,
        /// The underlying supervisor message.
        error: String,
    },

    /// A supervisor call other than creation failed (suspend, query).
    #[error("supervisor failed on app {app_id}: {error}")]
    Supervisor {
        /// The app the call was issued for.
        app_id: String,
        /// The underlying supervisor message.
        error: String,
    },

    /// Delivering an event to the app failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use skillvisor::RuntimeError;
    ///
    /// let err = RuntimeError::NotRunning { app_id: "weather".into() };
    /// assert_eq!(err.as_label(), "app_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotRunning { .. } => "app_not_running",
            RuntimeError::Monopolized { .. } => "app_monopolized",
            RuntimeError::AppLaunch { .. } => "app_launch_failed",
            RuntimeError::Supervisor { .. } => "supervisor_failed",
            RuntimeError::Bridge(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NotRunning { app_id } => format!("not running: {app_id}"),
            RuntimeError::Monopolized { app_id, monopolist } => {
                format!("monopolized: {app_id} blocked by {monopolist}")
            }
            RuntimeError::AppLaunch { app_id, error } => format!("launch {app_id}: {error}"),
            RuntimeError::Supervisor { app_id, error } => format!("supervisor {app_id}: {error}"),
            RuntimeError::Bridge(e) => e.to_string(),
        }
    }
}

/// # Errors produced while delivering events to app processes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No channel is registered for the app.
    #[error("no channel registered for app {app_id}")]
    UnknownApp {
        /// Target app.
        app_id: String,
    },

    /// The app's channel is closed (process gone).
    #[error("channel to app {app_id} closed")]
    Closed {
        /// Target app.
        app_id: String,
    },

    /// The app did not acknowledge the event in time.
    #[error("app {app_id} did not acknowledge within {timeout:?}")]
    AckTimeout {
        /// Target app.
        app_id: String,
        /// The acknowledgement window that elapsed.
        timeout: Duration,
    },
}

impl BridgeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use skillvisor::BridgeError;
    ///
    /// let err = BridgeError::Closed { app_id: "music".into() };
    /// assert_eq!(err.as_label(), "bridge_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::UnknownApp { .. } => "bridge_unknown_app",
            BridgeError::Closed { .. } => "bridge_closed",
            BridgeError::AckTimeout { .. } => "bridge_ack_timeout",
        }
    }
}

/// # Errors building the runtime.
///
/// Fatal: the runtime refuses to start with a broken interception table.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid JSON of the expected shape.
    #[error("malformed interception config: {0}")]
    Json(#[from] serde_json::Error),

    /// A handler is not of the form `component.method`.
    #[error("handler {handler:?} for event {event} is not of the form component.method")]
    MalformedHandler { event: String, handler: String },

    /// A handler names a component that was never registered.
    #[error("handler {handler} for event {event} names unknown component {component}")]
    UnknownComponent {
        event: String,
        handler: String,
        component: String,
    },

    /// A required collaborator was not provided to the builder.
    #[error("runtime builder is missing {name}")]
    MissingCollaborator { name: &'static str },
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Json(_) => "config_json",
            ConfigError::MalformedHandler { .. } => "config_malformed_handler",
            ConfigError::UnknownComponent { .. } => "config_unknown_component",
            ConfigError::MissingCollaborator { .. } => "config_missing_collaborator",
        }
    }
}

