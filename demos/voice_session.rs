//! # Voice Session Example
//!
//! Walks one device through a short day:
//! - music starts from a `yoda-app://` URL and takes the audio focus
//! - the wake word pauses it, a weather command cuts it off the stack
//! - a battery notification reaches both apps without preemption
//!
//! Every runtime event is rendered by [`LogWriter`].
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example voice_session --features logging
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use skillvisor::{
    Announcement, AppRecord, AppScheduler, AppStatus, ChannelBridge, Config, Custodian,
    DispatchOptions, Feedback, LogWriter, Microphone, Playback, Runtime, SchedulerError,
    SkillStack, Speech, StaticManifest, Subscribe,
};
use tracing_subscriber::EnvFilter;

/// Pretends every app starts instantly.
#[derive(Default)]
struct InstantScheduler {
    running: Mutex<HashSet<String>>,
}

#[async_trait]
impl AppScheduler for InstantScheduler {
    async fn create_app(&self, app_id: &str) -> Result<(), SchedulerError> {
        self.running.lock().unwrap().insert(app_id.to_string());
        Ok(())
    }

    async fn suspend_app(&self, app_id: &str, force: bool) -> Result<(), SchedulerError> {
        println!(" ├─► suspend {app_id} (force={force})");
        self.running.lock().unwrap().remove(app_id);
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

struct Console {
    muted: Mutex<bool>,
    playing: Mutex<HashMap<String, bool>>,
}

impl Custodian for Console {
    fn is_prepared(&self) -> bool {
        true
    }

    fn has_wifi_history(&self) -> bool {
        true
    }
}

#[async_trait]
impl Feedback for Console {
    async fn announce(&self, announcement: Announcement) {
        println!(" ├─► announce {announcement}");
    }

    async fn awake(&self) {
        println!(" ├─► light: awake");
    }

    async fn show_loading(&self) {
        println!(" ├─► light: loading");
    }
}

#[async_trait]
impl Speech for Console {
    async fn set_pickup(&self, open: bool) {
        println!(" ├─► pickup open={open}");
    }
}

#[async_trait]
impl Playback for Console {
    async fn pause(&self, app_id: &str) -> bool {
        let mut playing = self.playing.lock().unwrap();
        playing.insert(app_id.to_string(), false).unwrap_or(false)
    }

    async fn resume(&self, app_id: &str) {
        self.playing.lock().unwrap().insert(app_id.to_string(), true);
    }
}

#[async_trait]
impl Microphone for Console {
    fn is_muted(&self) -> bool {
        *self.muted.lock().unwrap()
    }

    async fn set_muted(&self, muted: bool) {
        *self.muted.lock().unwrap() = muted;
    }
}

#[async_trait]
impl SkillStack for Console {
    async fn on_app_activated(&self, app_id: &str, skill_id: Option<&str>) {
        println!(" ├─► skill stack: {app_id} ({skill_id:?})");
    }
}

/// Spawns an app process that acknowledges everything it receives.
async fn spawn_app(bridge: &ChannelBridge, app_id: &'static str) {
    let mut rx = bridge.register(app_id).await;
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            println!(" │   {app_id} <- {}", envelope.event.name());
            envelope.ack();
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::default();
    let bridge = Arc::new(ChannelBridge::new(16, cfg.app_ack()));
    spawn_app(&bridge, "com.music").await;
    spawn_app(&bridge, "com.weather").await;

    let console = Arc::new(Console {
        muted: Mutex::new(false),
        playing: Mutex::new(HashMap::new()),
    });
    let manifest = StaticManifest::new()
        .with_host("music", "com.music")
        .with_channel("battery", "com.music")
        .with_channel("battery", "com.weather");

    let runtime = Runtime::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
        .with_scheduler(Arc::new(InstantScheduler::default()))
        .with_bridge(bridge)
        .with_manifest(Arc::new(manifest))
        .with_custodian(console.clone())
        .with_feedback(console.clone())
        .with_speech(console.clone())
        .with_playback(console.clone())
        .with_microphone(console.clone())
        .with_skill_stack(console.clone())
        .build()?;

    runtime.init().await;
    runtime.login().await;

    println!("music:");
    runtime
        .open_url("yoda-app://music/play?list=daily", DispatchOptions::default())
        .await;
    runtime.audio_focus().request("com.music", 1, 0).await;
    console.resume("com.music").await;

    println!("voice:");
    runtime
        .handle_turen_event("rokid.turen.voice_coming", &json!(null))
        .await;
    runtime
        .handle_turen_event("rokid.speech.inter_asr", &json!(null))
        .await;
    runtime
        .handle_turen_event("rokid.speech.final_asr", &json!(null))
        .await;
    runtime
        .handle_turen_event(
            "rokid.speech.nlp",
            &json!({ "nlp": { "appId": "com.weather", "intent": "forecast" }, "action": {} }),
        )
        .await;
    println!(" └─► stack: {:?}", runtime.lifetime().stack().await);

    println!("notification:");
    let delivered = runtime
        .dispatch_notification("battery", vec![json!({ "level": 15 })])
        .await;
    println!(" └─► delivered to {delivered} apps");

    runtime.hibernate().await;
    tokio::task::yield_now().await;
    Ok(())
}
