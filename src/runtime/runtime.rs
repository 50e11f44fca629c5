//! # Runtime: wiring and device phases.
//!
//! Owns every component and hosts voice commands for [`Turen`]. App exits are
//! reconciled with the activation stack and the audio focus here.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use url::Url;

use super::builder::RuntimeBuilder;
use super::voice::VoiceCommand;
use crate::apps::AppScheduler;
use crate::config::Config;
use crate::dispatcher::{DispatchOptions, Dispatcher};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind, Phase};
use crate::focus::AudioFocus;
use crate::lifetime::Lifetime;
use crate::subscribers::SubscriberSet;
use crate::turen::{AwakenSignal, Turen, TurenEvent, VoiceHost, VoiceServices};

/// The only URL scheme [`Runtime::open_url`] accepts.
pub const APP_URL_SCHEME: &str = "yoda-app";

pub(super) struct RuntimeParts {
    pub cfg: Config,
    pub bus: Bus,
    pub subs: Arc<SubscriberSet>,
    pub scheduler: Arc<dyn AppScheduler>,
    pub lifetime: Arc<Lifetime>,
    pub focus: Arc<AudioFocus>,
    pub dispatcher: Dispatcher,
    pub voice: VoiceServices,
    pub awaken: AwakenSignal,
}

/// Application runtime of the device.
pub struct Runtime {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    scheduler: Arc<dyn AppScheduler>,
    lifetime: Arc<Lifetime>,
    focus: Arc<AudioFocus>,
    dispatcher: Dispatcher,
    turen: Arc<Turen>,
    phase: RwLock<Phase>,
}

impl Runtime {
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    pub(super) fn new_internal(parts: RuntimeParts) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Runtime>| {
            let host: Weak<dyn VoiceHost> = me.clone();
            let turen = Turen::new(
                &parts.cfg,
                Arc::clone(&parts.lifetime),
                host,
                parts.voice,
                parts.awaken,
                parts.bus.clone(),
            );
            Self {
                cfg: parts.cfg,
                bus: parts.bus,
                subs: parts.subs,
                scheduler: parts.scheduler,
                lifetime: parts.lifetime,
                focus: parts.focus,
                dispatcher: parts.dispatcher,
                turen,
                phase: RwLock::new(Phase::Booting),
            }
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn lifetime(&self) -> &Arc<Lifetime> {
        &self.lifetime
    }

    pub fn audio_focus(&self) -> &Arc<AudioFocus> {
        &self.focus
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn turen(&self) -> &Arc<Turen> {
        &self.turen
    }

    /// Receiver observing every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// Boot: `Booting` → `runtimeDidInit` interceptors → `Setup`.
    pub async fn init(&self) {
        self.set_phase(Phase::Booting).await;
        self.dispatcher.delegate("runtimeDidInit", &[]).await;
        self.set_phase(Phase::Setup).await;
    }

    /// Credentials are ready: `runtimeDidLogin` interceptors → `Ready`.
    pub async fn login(&self) {
        self.dispatcher.delegate("runtimeDidLogin", &[]).await;
        self.set_phase(Phase::Ready).await;
    }

    /// Opens a `yoda-app://<host>/<path>` URL in the app serving `<host>`.
    ///
    /// Foreign schemes, unparsable URLs and unknown hosts return `false`.
    pub async fn open_url(&self, url: &str, opts: DispatchOptions) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                warn!(url, error = %e, "malformed url");
                return false;
            }
        };
        if parsed.scheme() != APP_URL_SCHEME {
            info!(url, scheme = parsed.scheme(), "unsupported url scheme");
            return false;
        }
        let Some(host) = parsed.host_str() else {
            info!(url, "url without host");
            return false;
        };
        let Some(app_id) = self.dispatcher.manifest().app_id_by_host(host) else {
            info!(url, host, "no app serves url host");
            return false;
        };

        debug!(url, app_id, "opening url");
        self.dispatcher
            .dispatch_app_event(&app_id, "url", vec![url_payload(&parsed)], opts)
            .await
    }

    /// Routes a decoded speech-service signal to the voice session.
    pub async fn handle_turen_event(&self, topic: &str, payload: &Value) -> bool {
        match TurenEvent::from_topic(topic, payload) {
            Some(event) => {
                self.turen.handle(event).await;
                true
            }
            None => {
                debug!(topic, "unknown speech topic");
                false
            }
        }
    }

    /// Fans a notification out to the apps registered on `channel`.
    pub async fn dispatch_notification(&self, channel: &str, args: Vec<Value>) -> usize {
        self.dispatcher.dispatch_notification(channel, args).await
    }

    /// Reconciles the core state after an app process terminated.
    pub async fn app_did_exit(&self, app_id: &str) {
        info!(app_id, "app exited");
        self.focus.app_did_exit(app_id).await;
        self.lifetime.app_did_exit(app_id).await;
        self.bus
            .publish(Event::new(EventKind::AppExited).with_app(app_id));
    }

    /// Ends the voice session and clears the stack and every focus.
    pub async fn hibernate(&self) {
        self.clear_foreground().await;
        info!("runtime hibernated");
        self.bus.publish(Event::new(EventKind::Hibernated));
    }

    /// Leaves hibernation: `runtimeDidResume` interceptors → `Ready`.
    pub async fn wake(&self) {
        self.dispatcher.delegate("runtimeDidResume", &[]).await;
        self.set_phase(Phase::Ready).await;
        self.bus.publish(Event::new(EventKind::Woken));
    }

    /// Like [`Runtime::hibernate`], then force-suspends every app process.
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.clear_foreground().await;
        self.scheduler
            .suspend_all_apps(true)
            .await
            .map_err(|e| RuntimeError::Supervisor {
                app_id: "*".to_string(),
                error: e.to_string(),
            })?;
        info!("runtime reset");
        self.bus.publish(Event::new(EventKind::RuntimeReset));
        Ok(())
    }

    pub async fn disable(&self, reason: impl Into<String>) {
        self.dispatcher.disable(reason).await;
    }

    pub async fn enable(&self, reason: &str) -> bool {
        self.dispatcher.enable(reason).await
    }

    pub async fn is_disabled(&self) -> bool {
        self.dispatcher.is_disabled().await
    }

    async fn clear_foreground(&self) {
        self.turen.reset().await;
        self.lifetime.deactivate_apps_in_stack(&[]).await;
        self.focus.abandon_all_focuses().await;
    }

    async fn set_phase(&self, phase: Phase) {
        *self.phase.write().await = phase;
        info!(%phase, "runtime phase");
        self.bus
            .publish(Event::new(EventKind::PhaseChanged).with_phase(phase));
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    pub(super) fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

#[async_trait]
impl VoiceHost for Runtime {
    async fn handle_voice_command(&self, nlp: Value, action: Value) -> bool {
        let args = [nlp, action];
        if self.dispatcher.delegate("voiceCommand", &args).await {
            return true;
        }
        let [nlp, action] = args;
        let command = match VoiceCommand::parse(&nlp, &action) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "unroutable voice command");
                return false;
            }
        };
        debug!(app_id = %command.app_id, intent = ?command.intent, "voice command");
        self.dispatcher
            .dispatch_app_event(
                &command.app_id,
                "request",
                vec![nlp, action],
                command.dispatch_options(),
            )
            .await
    }
}

/// `url` event payload: the href plus its parsed parts.
fn url_payload(url: &Url) -> Value {
    let query: Map<String, Value> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    json!({
        "href": url.as_str(),
        "host": url.host_str(),
        "pathname": url.path(),
        "query": query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{AppEvent, Lifecycle, StaticManifest};
    use crate::dispatcher::Interception;
    use crate::error::ConfigError;
    use crate::services::Announcement;
    use crate::testing::{
        FakeCustodian, FakeInterceptor, FakeMicrophone, FakePlayback, FakeScheduler,
        FakeSkillStack, FakeSpeech, RecordingBridge, RecordingFeedback,
    };

    struct Fixture {
        runtime: Arc<Runtime>,
        scheduler: Arc<FakeScheduler>,
        bridge: Arc<RecordingBridge>,
        custodian: Arc<FakeCustodian>,
        feedback: Arc<RecordingFeedback>,
        speech: Arc<FakeSpeech>,
        playback: Arc<FakePlayback>,
    }

    fn manifest() -> StaticManifest {
        StaticManifest::new()
            .with_host("music", "com.music")
            .with_host("weather", "com.weather")
            .with_channel("battery", "com.music")
            .with_channel("battery", "com.weather")
    }

    fn fixture_with(configure: impl FnOnce(RuntimeBuilder) -> RuntimeBuilder) -> Fixture {
        let scheduler = Arc::new(FakeScheduler::default());
        let bridge = Arc::new(RecordingBridge::default());
        let custodian = Arc::new(FakeCustodian::ready());
        let feedback = Arc::new(RecordingFeedback::default());
        let speech = Arc::new(FakeSpeech::default());
        let playback = Arc::new(FakePlayback::default());
        let b = Runtime::builder(Config::default())
            .with_scheduler(scheduler.clone())
            .with_bridge(bridge.clone())
            .with_manifest(Arc::new(manifest()))
            .with_custodian(custodian.clone())
            .with_feedback(feedback.clone())
            .with_speech(speech.clone())
            .with_playback(playback.clone())
            .with_microphone(Arc::new(FakeMicrophone::default()))
            .with_skill_stack(Arc::new(FakeSkillStack::default()));
        let runtime = match configure(b).build() {
            Ok(rt) => rt,
            Err(e) => panic!("runtime build failed: {e}"),
        };
        Fixture {
            runtime,
            scheduler,
            bridge,
            custodian,
            feedback,
            speech,
            playback,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(|b| b)
    }

    fn names(events: &[AppEvent]) -> Vec<&str> {
        events.iter().map(AppEvent::name).collect()
    }

    async fn speak(rt: &Runtime, app_id: &str) {
        assert!(rt.handle_turen_event("rokid.turen.voice_coming", &Value::Null).await);
        assert!(rt.handle_turen_event("rokid.speech.inter_asr", &Value::Null).await);
        assert!(rt.handle_turen_event("rokid.speech.final_asr", &Value::Null).await);
        let payload = json!({ "nlp": { "appId": app_id, "intent": "ask" }, "action": {} });
        assert!(rt.handle_turen_event("rokid.speech.nlp", &payload).await);
    }

    #[tokio::test]
    async fn voice_command_cuts_the_playing_app() {
        let fx = fixture();
        assert!(fx.runtime.open_url("yoda-app://music/play", DispatchOptions::default()).await);
        fx.playback.start("com.music");

        speak(&fx.runtime, "com.weather").await;

        assert_eq!(fx.runtime.lifetime().stack().await, vec!["com.weather"]);
        assert_eq!(
            names(&fx.bridge.events_for("com.weather")),
            vec!["create", "resumed", "request"]
        );
        assert_eq!(
            names(&fx.bridge.events_for("com.music")),
            vec!["create", "resumed", "url", "paused"]
        );
        assert_eq!(fx.scheduler.suspended(), vec![("com.music".to_string(), false)]);
        assert!(fx.playback.resumed().is_empty());
        assert!(!fx.runtime.turen().is_awaken());
    }

    #[tokio::test]
    async fn unprepared_wake_guides_to_setup() {
        let fx = fixture();
        fx.custodian.set_prepared(false);
        fx.custodian.set_wifi_history(false);

        assert!(fx.runtime.handle_turen_event("rokid.turen.voice_coming", &Value::Null).await);

        assert_eq!(fx.feedback.announcements(), vec![Announcement::GuideToSetup]);
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert!(!fx.runtime.turen().is_awaken());
    }

    #[tokio::test]
    async fn unknown_speech_topic_is_reported() {
        let fx = fixture();
        assert!(!fx.runtime.handle_turen_event("rokid.speech.unknown", &Value::Null).await);
    }

    #[tokio::test]
    async fn open_url_accepts_only_known_app_urls() {
        let fx = fixture();
        let opts = DispatchOptions::default;

        assert!(!fx.runtime.open_url("https://weather/today", opts()).await);
        assert!(!fx.runtime.open_url("not a url", opts()).await);
        assert!(!fx.runtime.open_url("yoda-app://radio/", opts()).await);
        assert!(fx.bridge.log().is_empty());

        assert!(fx.runtime.open_url("yoda-app://weather/today?city=hz", opts()).await);
        let url = fx
            .bridge
            .events_for("com.weather")
            .into_iter()
            .find_map(|ev| match ev {
                AppEvent::Custom { event, params } if event == "url" => Some(params),
                _ => None,
            });
        let params = url.unwrap_or_default();
        assert_eq!(params[0]["pathname"], "/today");
        assert_eq!(params[0]["query"]["city"], "hz");
    }

    #[tokio::test]
    async fn notification_reaches_every_channel_subscriber_in_background() {
        let fx = fixture();

        let delivered = fx
            .runtime
            .dispatch_notification("battery", vec![json!(15)])
            .await;

        assert_eq!(delivered, 2);
        assert!(fx.runtime.lifetime().stack().await.is_empty());
        for app in ["com.music", "com.weather"] {
            let params = fx.bridge.events_for(app).into_iter().find_map(|ev| match ev {
                AppEvent::Custom { params, .. } => Some(params),
                _ => None,
            });
            assert_eq!(params, Some(vec![json!("battery"), json!(15)]));
        }
        assert_eq!(fx.runtime.dispatch_notification("nobody", vec![]).await, 0);
    }

    #[tokio::test]
    async fn exited_app_loses_stack_and_focus() {
        let fx = fixture();
        assert!(fx.runtime.open_url("yoda-app://music/play", DispatchOptions::default()).await);
        fx.runtime.audio_focus().request("com.music", 1, 0).await;
        let mut rx = fx.runtime.subscribe();

        fx.scheduler.kill("com.music");
        fx.runtime.app_did_exit("com.music").await;

        assert!(fx.runtime.lifetime().stack().await.is_empty());
        assert!(fx.runtime.audio_focus().current().await.is_none());
        assert!(fx.scheduler.suspended().is_empty());
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::AppExited));
    }

    #[tokio::test]
    async fn hibernate_clears_foreground_and_reset_suspends_everything() {
        let fx = fixture();
        assert!(fx.runtime.open_url("yoda-app://music/play", DispatchOptions::default()).await);
        fx.runtime.audio_focus().request("com.music", 1, 0).await;

        fx.runtime.hibernate().await;
        assert!(fx.runtime.lifetime().stack().await.is_empty());
        assert!(fx.runtime.audio_focus().current().await.is_none());
        assert_eq!(fx.scheduler.suspended(), vec![("com.music".to_string(), false)]);

        assert!(fx.runtime.reset().await.is_ok());
        assert_eq!(fx.scheduler.suspend_all_calls(), vec![true]);
    }

    #[tokio::test]
    async fn boot_phases_follow_init_and_login() {
        let fx = fixture();
        assert_eq!(fx.runtime.phase().await, Phase::Booting);

        fx.runtime.init().await;
        assert_eq!(fx.runtime.phase().await, Phase::Setup);
        fx.runtime.login().await;
        assert_eq!(fx.runtime.phase().await, Phase::Ready);
        fx.runtime.hibernate().await;
        fx.runtime.wake().await;
        assert_eq!(fx.runtime.phase().await, Phase::Ready);
    }

    #[tokio::test]
    async fn intercepted_voice_command_is_not_dispatched() {
        let table = Interception::from_json(r#"{ "interception": { "voiceCommand": ["dnd.veto"] } }"#)
            .unwrap();
        let dnd = Arc::new(FakeInterceptor::default().answer("veto", true));
        let component = dnd.clone();
        let fx = fixture_with(move |b| b.with_interception(table).with_component("dnd", component));

        speak(&fx.runtime, "com.weather").await;

        assert_eq!(dnd.calls(), vec![("veto".to_string(), "voiceCommand".to_string())]);
        assert!(fx.bridge.events_for("com.weather").is_empty());
        assert!(fx.runtime.lifetime().stack().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_runtime_refuses_urls() {
        let fx = fixture();
        fx.runtime.disable("ota").await;
        assert!(fx.runtime.is_disabled().await);
        assert!(!fx.runtime.open_url("yoda-app://weather/", DispatchOptions::default()).await);

        assert!(fx.runtime.enable("ota").await);
        assert!(fx.runtime.open_url("yoda-app://weather/", DispatchOptions::default()).await);
        assert!(fx.bridge.events_for("com.weather").contains(&AppEvent::lifecycle(Lifecycle::Resumed)));
    }

    #[tokio::test]
    async fn build_requires_a_scheduler() {
        let result = Runtime::builder(Config::default())
            .with_custodian(Arc::new(FakeCustodian::ready()))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingCollaborator { name: "scheduler" })
        ));
    }

    #[tokio::test]
    async fn build_rejects_unregistered_interceptors() {
        let table = Interception::from_json(r#"{ "interception": { "runtimeDidLogin": ["dnd.recheck"] } }"#)
            .unwrap();
        let scheduler = Arc::new(FakeScheduler::default());
        let result = Runtime::builder(Config::default())
            .with_scheduler(scheduler)
            .with_custodian(Arc::new(FakeCustodian::ready()))
            .with_feedback(Arc::new(RecordingFeedback::default()))
            .with_speech(Arc::new(FakeSpeech::default()))
            .with_playback(Arc::new(FakePlayback::default()))
            .with_microphone(Arc::new(FakeMicrophone::default()))
            .with_skill_stack(Arc::new(FakeSkillStack::default()))
            .with_interception(table)
            .build();
        assert!(matches!(result, Err(ConfigError::UnknownComponent { .. })));
    }

    #[test]
    fn url_payload_carries_query() {
        let url = Url::parse("yoda-app://weather/today?city=hangzhou&unit=c").unwrap();
        let payload = url_payload(&url);
        assert_eq!(payload["host"], "weather");
        assert_eq!(payload["pathname"], "/today");
        assert_eq!(payload["query"]["city"], "hangzhou");
    }
}
