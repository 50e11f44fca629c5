//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::apps::{AppBridge, AppEvent, AppRecord, AppScheduler, AppStatus, SchedulerError};
use crate::dispatcher::Interceptor;
use crate::error::BridgeError;
use crate::services::{Announcement, Custodian, Feedback, Microphone, Playback, SkillStack, Speech};
use crate::turen::VoiceHost;

/// Records every emitted event; selected apps fail delivery.
#[derive(Default)]
pub struct RecordingBridge {
    log: Mutex<Vec<(String, AppEvent)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingBridge {
    pub fn fail_for(&self, app_id: &str) {
        self.failing.lock().unwrap().insert(app_id.to_string());
    }

    pub fn log(&self) -> Vec<(String, AppEvent)> {
        self.log.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.log().into_iter().map(|(_, ev)| ev).collect()
    }

    pub fn events_for(&self, app_id: &str) -> Vec<AppEvent> {
        self.log()
            .into_iter()
            .filter(|(app, _)| app == app_id)
            .map(|(_, ev)| ev)
            .collect()
    }
}

#[async_trait]
impl AppBridge for RecordingBridge {
    async fn emit(&self, app_id: &str, event: AppEvent) -> Result<(), BridgeError> {
        self.log.lock().unwrap().push((app_id.to_string(), event));
        if self.failing.lock().unwrap().contains(app_id) {
            return Err(BridgeError::Closed {
                app_id: app_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Supervisor that starts apps instantly.
#[derive(Default)]
pub struct FakeScheduler {
    records: Mutex<HashMap<String, AppRecord>>,
    daemons: Mutex<HashSet<String>>,
    refused: Mutex<HashSet<String>>,
    suspended: Mutex<Vec<(String, bool)>>,
    suspend_all: Mutex<Vec<bool>>,
}

impl FakeScheduler {
    pub fn set_daemon(&self, app_id: &str) {
        self.daemons.lock().unwrap().insert(app_id.to_string());
    }

    pub fn refuse(&self, app_id: &str) {
        self.refused.lock().unwrap().insert(app_id.to_string());
    }

    /// Simulates a process crash.
    pub fn kill(&self, app_id: &str) {
        if let Some(r) = self.records.lock().unwrap().get_mut(app_id) {
            r.status = AppStatus::NotRunning;
        }
    }

    pub fn suspended(&self) -> Vec<(String, bool)> {
        self.suspended.lock().unwrap().clone()
    }

    pub fn suspend_all_calls(&self) -> Vec<bool> {
        self.suspend_all.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppScheduler for FakeScheduler {
    async fn create_app(&self, app_id: &str) -> Result<(), SchedulerError> {
        if self.refused.lock().unwrap().contains(app_id) {
            return Err(SchedulerError::Refused {
                app_id: app_id.to_string(),
                reason: "refused by test".into(),
            });
        }
        let daemon = self.daemons.lock().unwrap().contains(app_id);
        self.records.lock().unwrap().insert(
            app_id.to_string(),
            AppRecord {
                app_id: app_id.to_string(),
                status: AppStatus::Running,
                daemon,
                keep_alive: false,
            },
        );
        Ok(())
    }

    async fn suspend_app(&self, app_id: &str, force: bool) -> Result<(), SchedulerError> {
        self.suspended
            .lock()
            .unwrap()
            .push((app_id.to_string(), force));
        self.kill(app_id);
        Ok(())
    }

    async fn suspend_all_apps(&self, force: bool) -> Result<(), SchedulerError> {
        self.suspend_all.lock().unwrap().push(force);
        for r in self.records.lock().unwrap().values_mut() {
            r.status = AppStatus::NotRunning;
        }
        Ok(())
    }

    fn is_app_running(&self, app_id: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .get(app_id)
            .is_some_and(AppRecord::is_running)
    }

    fn app_record(&self, app_id: &str) -> Option<AppRecord> {
        self.records.lock().unwrap().get(app_id).cloned()
    }
}

pub struct FakeCustodian {
    prepared: AtomicBool,
    wifi_history: AtomicBool,
}

impl FakeCustodian {
    pub fn ready() -> Self {
        Self {
            prepared: AtomicBool::new(true),
            wifi_history: AtomicBool::new(true),
        }
    }

    pub fn set_prepared(&self, prepared: bool) {
        self.prepared.store(prepared, Ordering::SeqCst);
    }

    pub fn set_wifi_history(&self, history: bool) {
        self.wifi_history.store(history, Ordering::SeqCst);
    }
}

impl Custodian for FakeCustodian {
    fn is_prepared(&self) -> bool {
        self.prepared.load(Ordering::SeqCst)
    }

    fn has_wifi_history(&self) -> bool {
        self.wifi_history.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Announce(Announcement),
    Awake,
    Loading,
}

#[derive(Default)]
pub struct RecordingFeedback {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingFeedback {
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.signals()
            .into_iter()
            .filter_map(|s| match s {
                Signal::Announce(a) => Some(a),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Feedback for RecordingFeedback {
    async fn announce(&self, announcement: Announcement) {
        self.signals
            .lock()
            .unwrap()
            .push(Signal::Announce(announcement));
    }

    async fn awake(&self) {
        self.signals.lock().unwrap().push(Signal::Awake);
    }

    async fn show_loading(&self) {
        self.signals.lock().unwrap().push(Signal::Loading);
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pickups: Mutex<Vec<bool>>,
    stall: Mutex<Option<Duration>>,
}

impl FakeSpeech {
    pub fn pickups(&self) -> Vec<bool> {
        self.pickups.lock().unwrap().clone()
    }

    /// Every later `set_pickup` takes `stall` to return.
    pub fn set_stall(&self, stall: Duration) {
        *self.stall.lock().unwrap() = Some(stall);
    }
}

#[async_trait]
impl Speech for FakeSpeech {
    async fn set_pickup(&self, open: bool) {
        self.pickups.lock().unwrap().push(open);
        let stall = *self.stall.lock().unwrap();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
    }
}

#[derive(Default)]
pub struct FakePlayback {
    playing: Mutex<HashSet<String>>,
    resumed: Mutex<Vec<String>>,
    stall: Mutex<Option<Duration>>,
}

impl FakePlayback {
    pub fn start(&self, app_id: &str) {
        self.playing.lock().unwrap().insert(app_id.to_string());
    }

    /// Every later `pause` takes `stall` to answer.
    pub fn set_stall(&self, stall: Duration) {
        *self.stall.lock().unwrap() = Some(stall);
    }

    pub fn resumed(&self) -> Vec<String> {
        self.resumed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Playback for FakePlayback {
    async fn pause(&self, app_id: &str) -> bool {
        let was_playing = self.playing.lock().unwrap().remove(app_id);
        let stall = *self.stall.lock().unwrap();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        was_playing
    }

    async fn resume(&self, app_id: &str) {
        self.playing.lock().unwrap().insert(app_id.to_string());
        self.resumed.lock().unwrap().push(app_id.to_string());
    }
}

#[derive(Default)]
pub struct FakeMicrophone {
    muted: AtomicBool,
}

#[async_trait]
impl Microphone for FakeMicrophone {
    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    async fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeSkillStack {
    updates: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSkillStack {
    pub fn updates(&self) -> Vec<(String, Option<String>)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl SkillStack for FakeSkillStack {
    async fn on_app_activated(&self, app_id: &str, skill_id: Option<&str>) {
        self.updates
            .lock()
            .unwrap()
            .push((app_id.to_string(), skill_id.map(str::to_string)));
    }
}

/// Voice host answering every command with a fixed result.
pub struct FakeHost {
    handled: bool,
    commands: Mutex<Vec<(Value, Value)>>,
}

impl FakeHost {
    pub fn handling(handled: bool) -> Self {
        Self {
            handled,
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<(Value, Value)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceHost for FakeHost {
    async fn handle_voice_command(&self, nlp: Value, action: Value) -> bool {
        self.commands.lock().unwrap().push((nlp, action));
        self.handled
    }
}

/// Interceptor answering per method; unknown methods fail.
#[derive(Default)]
pub struct FakeInterceptor {
    answers: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeInterceptor {
    pub fn answer(self, method: &str, handled: bool) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(method.to_string(), handled);
        self
    }

    /// `(method, event)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interceptor for FakeInterceptor {
    async fn intercept(&self, method: &str, event: &str, _args: &[Value]) -> anyhow::Result<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), event.to_string()));
        let answer = self.answers.lock().unwrap().get(method).copied();
        answer.ok_or_else(|| anyhow::anyhow!("no such method {method}"))
    }
}
