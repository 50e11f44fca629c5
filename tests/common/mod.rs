use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use skillvisor::{
    Announcement, AppEnvelope, AppRecord, AppScheduler, AppStatus, ChannelBridge, Config, Custodian,
    Feedback, Microphone, Playback, Runtime, SchedulerError, SkillStack, Speech, StaticManifest,
};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct Processes {
    running: Mutex<HashSet<String>>,
    pub suspended: Mutex<Vec<String>>,
}

impl Processes {
    pub fn is_running_any(&self) -> bool {
        !self.running.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl AppScheduler for Processes {
    async fn create_app(&self, app_id: &str) -> Result<(), SchedulerError> {
        self.running.lock().unwrap().insert(app_id.to_string());
        Ok(())
    }

    async fn suspend_app(&self, app_id: &str, _force: bool) -> Result<(), SchedulerError> {
        self.running.lock().unwrap().remove(app_id);
        self.suspended.lock().unwrap().push(app_id.to_string());
        Ok(())
    }

    async fn suspend_all_apps(&self, _force: bool) -> Result<(), SchedulerError> {
        self.running.lock().unwrap().clear();
        Ok(())
    }

    fn is_app_running(&self, app_id: &str) -> bool {
        self.running.lock().unwrap().contains(app_id)
    }

    fn app_record(&self, app_id: &str) -> Option<AppRecord> {
        self.is_app_running(app_id).then(|| AppRecord {
            app_id: app_id.to_string(),
            status: AppStatus::Running,
            daemon: false,
            keep_alive: false,
        })
    }
}

/// Every voice-side service in one recorder.
#[derive(Default)]
pub struct Device {
    pub offline: Mutex<bool>,
    pub announcements: Mutex<Vec<Announcement>>,
    pub pickups: Mutex<Vec<bool>>,
    muted: Mutex<bool>,
}

impl Custodian for Device {
    fn is_prepared(&self) -> bool {
        !*self.offline.lock().unwrap()
    }

    fn has_wifi_history(&self) -> bool {
        true
    }
}

#[async_trait]
impl Feedback for Device {
    async fn announce(&self, announcement: Announcement) {
        self.announcements.lock().unwrap().push(announcement);
    }

    async fn awake(&self) {}

    async fn show_loading(&self) {}
}

#[async_trait]
impl Speech for Device {
    async fn set_pickup(&self, open: bool) {
        self.pickups.lock().unwrap().push(open);
    }
}

#[async_trait]
impl Playback for Device {
    async fn pause(&self, _app_id: &str) -> bool {
        false
    }

    async fn resume(&self, _app_id: &str) {}
}

#[async_trait]
impl Microphone for Device {
    fn is_muted(&self) -> bool {
        *self.muted.lock().unwrap()
    }

    async fn set_muted(&self, muted: bool) {
        *self.muted.lock().unwrap() = muted;
    }
}

#[async_trait]
impl SkillStack for Device {
    async fn on_app_activated(&self, _app_id: &str, _skill_id: Option<&str>) {}
}

/// Names of the events an app process received, in arrival order.
pub type Inbox = Arc<Mutex<Vec<String>>>;

fn acknowledge(mut rx: mpsc::Receiver<AppEnvelope>) -> Inbox {
    let inbox = Inbox::default();
    let seen = Arc::clone(&inbox);
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            seen.lock().unwrap().push(envelope.event.name().to_string());
            envelope.ack();
        }
    });
    inbox
}

pub struct Harness {
    pub runtime: Arc<Runtime>,
    pub processes: Arc<Processes>,
    pub device: Arc<Device>,
    pub music: Inbox,
    pub weather: Inbox,
}

pub async fn harness() -> Harness {
    let cfg = Config::default();
    let bridge = Arc::new(ChannelBridge::new(16, cfg.app_ack()));
    let music = acknowledge(bridge.register("com.music").await);
    let weather = acknowledge(bridge.register("com.weather").await);

    let processes = Arc::new(Processes::default());
    let device = Arc::new(Device::default());
    let manifest = StaticManifest::new()
        .with_host("music", "com.music")
        .with_host("weather", "com.weather")
        .with_channel("volume", "com.music");

    let runtime = Runtime::builder(cfg)
        .with_scheduler(processes.clone())
        .with_bridge(bridge)
        .with_manifest(Arc::new(manifest))
        .with_custodian(device.clone())
        .with_feedback(device.clone())
        .with_speech(device.clone())
        .with_playback(device.clone())
        .with_microphone(device.clone())
        .with_skill_stack(device.clone())
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    Harness {
        runtime,
        processes,
        device,
        music,
        weather,
    }
}

pub fn received(inbox: &Inbox) -> Vec<String> {
    inbox.lock().unwrap().clone()
}
