//! # Process supervisor contract.
//!
//! The supervisor that actually spawns and kills app processes lives outside the
//! core. [`AppScheduler`] is the narrow async interface the core consumes from it.
//! Errors from these calls are surfaced to the caller and never retried here;
//! timeouts are the supervisor's responsibility.

use async_trait::async_trait;
use thiserror::Error;

/// Process status of an app as reported by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    NotRunning,
    Creating,
    Running,
    Suspending,
}

/// Supervisor-owned record of an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub app_id: String,
    pub status: AppStatus,
    /// Never evicted by normal deactivation; only suspended by force.
    pub daemon: bool,
    /// Manifest-level hint: keep the process alive when it leaves the stack.
    pub keep_alive: bool,
}

impl AppRecord {
    pub fn is_running(&self) -> bool {
        self.status == AppStatus::Running
    }
}

/// Error returned by [`AppScheduler`] operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The supervisor refused to perform the operation.
    #[error("supervisor refused {app_id}: {reason}")]
    Refused { app_id: String, reason: String },

    /// The supervisor does not know the app.
    #[error("unknown app {app_id}")]
    UnknownApp { app_id: String },
}

/// Async interface to the external process supervisor.
#[async_trait]
pub trait AppScheduler: Send + Sync + 'static {
    /// Creates (spawns) the app process. Resolves once the app is running.
    async fn create_app(&self, app_id: &str) -> Result<(), SchedulerError>;

    /// Suspends the app; `force` bypasses daemon and keep-alive protection.
    async fn suspend_app(&self, app_id: &str, force: bool) -> Result<(), SchedulerError>;

    /// Suspends every app the supervisor knows about.
    async fn suspend_all_apps(&self, force: bool) -> Result<(), SchedulerError>;

    /// Returns whether the app process is currently running.
    fn is_app_running(&self, app_id: &str) -> bool;

    /// Returns the supervisor's record of the app, if any.
    fn app_record(&self, app_id: &str) -> Option<AppRecord>;
}
