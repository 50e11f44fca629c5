//! # Voice session handlers
//!
//! Each handler decides under the session lock and collects the collaborator
//! calls it needs as [`Effect`]s. The effects run in order once the lock is
//! released, so a slow device service never blocks the next speech signal.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::event::TurenEvent;
use super::session::{AsrState, AwakenSignal, Session, SessionSnapshot};
use crate::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::lifetime::Lifetime;
use crate::services::{Announcement, Custodian, Feedback, Microphone, Playback, Speech};

/// Executes a recognized voice command.
#[async_trait]
pub trait VoiceHost: Send + Sync + 'static {
    /// Returns true if the command was handled by some app.
    async fn handle_voice_command(&self, nlp: Value, action: Value) -> bool;
}

/// Collaborators the voice session drives.
#[derive(Clone)]
pub struct VoiceServices {
    pub custodian: Arc<dyn Custodian>,
    pub feedback: Arc<dyn Feedback>,
    pub speech: Arc<dyn Speech>,
    pub playback: Arc<dyn Playback>,
    pub microphone: Arc<dyn Microphone>,
}

/// Voice-session state machine.
pub struct Turen {
    me: Weak<Turen>,
    session: Mutex<Session>,
    lifetime: Arc<Lifetime>,
    host: Weak<dyn VoiceHost>,
    services: VoiceServices,
    signal: AwakenSignal,
    bus: Bus,
    solitary_voice_coming: Option<Duration>,
    no_voice_input: Option<Duration>,
    network_error_threshold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Recover,
    Keep,
}

/// A collaborator call decided under the session lock.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    ClosePickup,
    Announce(Announcement),
    /// Pause whatever the foreground app plays, tagged with the wake it belongs to.
    Pause(u64),
    Awake,
    ShowLoading,
    Resume(String),
}

type Effects = Vec<Effect>;

impl Turen {
    pub fn new(
        config: &Config,
        lifetime: Arc<Lifetime>,
        host: Weak<dyn VoiceHost>,
        services: VoiceServices,
        signal: AwakenSignal,
        bus: Bus,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            session: Mutex::new(Session::default()),
            lifetime,
            host,
            services,
            signal,
            bus,
            solitary_voice_coming: config.solitary_voice_coming(),
            no_voice_input: config.no_voice_input(),
            network_error_threshold: config.network_error_threshold,
        })
    }

    /// Routes a decoded speech-service signal to its handler.
    pub async fn handle(&self, event: TurenEvent) {
        debug!(topic = event.topic(), "voice signal");
        match event {
            TurenEvent::VoiceComing => self.voice_coming().await,
            TurenEvent::AsrPending | TurenEvent::AsrAccept | TurenEvent::AsrExtra => {
                self.asr_pending().await
            }
            TurenEvent::AsrEnd => self.asr_end().await,
            TurenEvent::AsrReject => self.asr_reject().await,
            TurenEvent::AsrFake => self.asr_fake().await,
            TurenEvent::Nlp { nlp, action } => self.nlp(nlp, action).await,
            TurenEvent::MaliciousNlp => self.malicious_nlp().await,
            TurenEvent::SpeechError { code } => self.speech_error(code).await,
            TurenEvent::Pickup { is_pickup } => self.pickup(is_pickup).await,
            TurenEvent::Muted { muted } => self.set_muted(muted).await,
        }
    }

    /// Wake word detected.
    pub async fn voice_coming(&self) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            let custodian = &self.services.custodian;
            if !custodian.is_prepared() {
                let announcement = if custodian.has_wifi_history() {
                    Announcement::NetworkConnecting
                } else {
                    Announcement::GuideToSetup
                };
                info!(%announcement, "wake rejected, network not ready");
                fx.push(Effect::ClosePickup);
                fx.push(Effect::Announce(announcement));
                self.bus.publish(
                    Event::new(EventKind::VoiceRejected).with_reason(announcement.as_str()),
                );
                self.recover(&mut s, &mut fx);
            } else {
                s.no_voice_input.cancel();
                self.awaken(&mut s, &mut fx);
                s.asr_state = AsrState::Pending;
                if let Some(after) = self.solitary_voice_coming {
                    let me = self.me.clone();
                    s.solitary_voice_coming.arm(after, move |generation| async move {
                        if let Some(turen) = me.upgrade() {
                            turen.on_solitary_voice_coming(generation).await;
                        }
                    });
                }
            }
        }
        self.run(fx).await;
    }

    /// Intermediate recognition progress (`pending`, `accept`, `extra`).
    pub async fn asr_pending(&self) {
        let mut s = self.session.lock().await;
        s.solitary_voice_coming.cancel();
        s.asr_state = AsrState::Pending;
        if let Some(after) = self.no_voice_input {
            let me = self.me.clone();
            s.no_voice_input.arm(after, move |generation| async move {
                if let Some(turen) = me.upgrade() {
                    turen.on_no_voice_input(generation).await;
                }
            });
        }
    }

    pub async fn asr_end(&self) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            s.asr_state = AsrState::End;
            self.reset_awaken(&mut s, Recovery::Keep, &mut fx);
            if !s.picking_up_discard_next {
                fx.push(Effect::ShowLoading);
            }
        }
        self.run(fx).await;
    }

    pub async fn asr_reject(&self) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            s.asr_state = AsrState::Reject;
            self.reset_awaken(&mut s, Recovery::Recover, &mut fx);
        }
        self.run(fx).await;
    }

    pub async fn asr_fake(&self) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            s.asr_state = AsrState::Fake;
            self.reset_awaken(&mut s, Recovery::Recover, &mut fx);
        }
        self.run(fx).await;
    }

    /// Final recognition result.
    pub async fn nlp(&self, nlp: Value, action: Value) {
        {
            let mut s = self.session.lock().await;
            if s.picking_up_discard_next {
                s.picking_up_discard_next = false;
                info!("nlp dropped, session was discarded");
                self.bus.publish(Event::new(EventKind::NlpDiscarded));
                return;
            }
            // Keep never yields effects
            self.reset_awaken(&mut s, Recovery::Keep, &mut Effects::new());
        }

        let handled = match self.host.upgrade() {
            Some(host) => host.handle_voice_command(nlp, action).await,
            None => false,
        };

        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            if handled {
                s.paused_on_awaken = None;
                // a pause still in flight belongs to the app the command replaced
                s.pending_pause = None;
                s.recover_on_pause = false;
            } else {
                debug!("voice command not handled, recovering playback");
                self.recover(&mut s, &mut fx);
            }
        }
        self.run(fx).await;
    }

    pub async fn malicious_nlp(&self) {
        warn!("malicious nlp received");
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            self.abort_session(&mut s, None, &mut fx);
        }
        self.run(fx).await;
    }

    /// Speech service failure; codes at or above the network threshold announce lag.
    pub async fn speech_error(&self, code: i32) {
        warn!(code, "speech error");
        let lag = (code >= self.network_error_threshold).then_some(Announcement::NetworkLag);
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            self.abort_session(&mut s, lag, &mut fx);
        }
        self.run(fx).await;
    }

    /// Microphone pickup opened or closed.
    pub async fn pickup(&self, is_pickup: bool) {
        let mut s = self.session.lock().await;
        s.picking_up = is_pickup;
        if is_pickup {
            s.picking_up_discard_next = false;
            self.bus.publish(Event::new(EventKind::PickupOpened));
        } else {
            if s.asr_state != AsrState::End {
                debug!(
                    asr_state = ?s.asr_state,
                    "pickup closed before asr end, next nlp is discarded"
                );
                s.picking_up_discard_next = true;
            }
            self.bus.publish(Event::new(EventKind::PickupClosed));
        }
    }

    /// Mutes or un-mutes the microphone; muting ends any session in flight.
    pub async fn set_muted(&self, muted: bool) {
        self.services.microphone.set_muted(muted).await;
        if !muted {
            return;
        }
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            if s.picking_up {
                fx.push(Effect::ClosePickup);
            }
            self.reset_awaken(&mut s, Recovery::Recover, &mut fx);
        }
        self.run(fx).await;
    }

    /// Cancels every timer and clears the session.
    pub async fn reset(&self) {
        let mut s = self.session.lock().await;
        s.clear();
        self.signal.set(false);
        debug!("voice session reset");
    }

    pub async fn session(&self) -> SessionSnapshot {
        let muted = self.services.microphone.is_muted();
        self.session.lock().await.snapshot(muted)
    }

    pub fn is_awaken(&self) -> bool {
        self.signal.is_awaken()
    }

    async fn on_solitary_voice_coming(&self, generation: u64) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            if !s.solitary_voice_coming.is_current(generation) {
                return;
            }
            s.solitary_voice_coming.complete();
            warn!("no asr followed the wake word");
            self.bus.publish(
                Event::new(EventKind::VoiceTimeout).with_reason(s.solitary_voice_coming.name()),
            );
            self.abort_session(&mut s, Some(Announcement::NetworkLag), &mut fx);
        }
        self.run(fx).await;
    }

    async fn on_no_voice_input(&self, generation: u64) {
        let mut fx = Effects::new();
        {
            let mut s = self.session.lock().await;
            if !s.no_voice_input.is_current(generation) {
                return;
            }
            s.no_voice_input.complete();
            info!("asr never finished");
            self.bus
                .publish(Event::new(EventKind::VoiceTimeout).with_reason(s.no_voice_input.name()));
            fx.push(Effect::ClosePickup);
            self.reset_awaken(&mut s, Recovery::Recover, &mut fx);
        }
        self.run(fx).await;
    }

    /// Force-closes pickup, resets awaken, optionally announces, then recovers.
    fn abort_session(
        &self,
        s: &mut Session,
        announcement: Option<Announcement>,
        fx: &mut Effects,
    ) {
        fx.push(Effect::ClosePickup);
        self.reset_awaken(s, Recovery::Keep, fx);
        if let Some(announcement) = announcement {
            fx.push(Effect::Announce(announcement));
        }
        self.recover(s, fx);
    }

    fn awaken(&self, s: &mut Session, fx: &mut Effects) {
        if s.awaken {
            return;
        }
        s.awaken = true;
        self.signal.set(true);
        s.recover_on_pause = false;
        // a pause issued by an earlier wake still answers for this one
        if s.pending_pause.is_none() {
            s.wake_id += 1;
            s.pending_pause = Some(s.wake_id);
            fx.push(Effect::Pause(s.wake_id));
        }
        fx.push(Effect::Awake);
        self.bus.publish(Event::new(EventKind::VoiceAwaken));
    }

    /// Ends the awaken phase; both timers belong to it.
    fn reset_awaken(&self, s: &mut Session, recovery: Recovery, fx: &mut Effects) {
        s.cancel_timers();
        s.awaken = false;
        self.signal.set(false);
        if recovery == Recovery::Recover {
            self.recover(s, fx);
        }
    }

    fn recover(&self, s: &mut Session, fx: &mut Effects) {
        if s.pending_pause.is_some() {
            s.recover_on_pause = true;
        }
        if let Some(app_id) = s.paused_on_awaken.take() {
            fx.push(Effect::Resume(app_id));
        }
    }

    async fn run(&self, effects: Effects) {
        for effect in effects {
            match effect {
                Effect::ClosePickup => self.services.speech.set_pickup(false).await,
                Effect::Announce(announcement) => {
                    self.services.feedback.announce(announcement).await
                }
                Effect::Pause(wake_id) => self.pause_current(wake_id).await,
                Effect::Awake => self.services.feedback.awake().await,
                Effect::ShowLoading => self.services.feedback.show_loading().await,
                Effect::Resume(app_id) => {
                    debug!(%app_id, "recovering playback");
                    self.services.playback.resume(&app_id).await;
                }
            }
        }
    }

    /// Pauses the foreground app and files the answer with the wake that asked.
    async fn pause_current(&self, wake_id: u64) {
        let mut paused = None;
        if let Some(app_id) = self.lifetime.current_app_id().await {
            if self.services.playback.pause(&app_id).await {
                paused = Some(app_id);
            }
        }

        let resume = {
            let mut s = self.session.lock().await;
            if s.pending_pause != Some(wake_id) {
                debug!(wake_id, "pause answered after its session was dropped");
                return;
            }
            s.pending_pause = None;
            let recover = std::mem::take(&mut s.recover_on_pause);
            match paused {
                Some(app_id) if recover => Some(app_id),
                Some(app_id) => {
                    debug!(%app_id, "playback paused on awaken");
                    s.paused_on_awaken = Some(app_id);
                    None
                }
                None => None,
            }
        };
        if let Some(app_id) = resume {
            debug!(%app_id, "session ended while pausing, resuming");
            self.services.playback.resume(&app_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifetime::ActivateParams;
    use crate::testing::{
        FakeCustodian, FakeHost, FakeMicrophone, FakePlayback, FakeScheduler, FakeSpeech,
        RecordingBridge, RecordingFeedback, Signal,
    };

    struct Fixture {
        turen: Arc<Turen>,
        lifetime: Arc<Lifetime>,
        custodian: Arc<FakeCustodian>,
        feedback: Arc<RecordingFeedback>,
        speech: Arc<FakeSpeech>,
        playback: Arc<FakePlayback>,
        microphone: Arc<FakeMicrophone>,
        bus: Bus,
        _host: Arc<FakeHost>,
    }

    fn fixture_with(host: Arc<FakeHost>) -> Fixture {
        let bus = Bus::new(256);
        let lifetime = Arc::new(Lifetime::new(
            Arc::new(FakeScheduler::default()),
            Arc::new(RecordingBridge::default()),
            bus.clone(),
        ));
        let custodian = Arc::new(FakeCustodian::ready());
        let feedback = Arc::new(RecordingFeedback::default());
        let speech = Arc::new(FakeSpeech::default());
        let playback = Arc::new(FakePlayback::default());
        let microphone = Arc::new(FakeMicrophone::default());
        let services = VoiceServices {
            custodian: custodian.clone(),
            feedback: feedback.clone(),
            speech: speech.clone(),
            playback: playback.clone(),
            microphone: microphone.clone(),
        };
        let weak_host: Weak<dyn VoiceHost> = Arc::downgrade(&host) as Weak<dyn VoiceHost>;
        let turen = Turen::new(
            &Config::default(),
            lifetime.clone(),
            weak_host,
            services,
            AwakenSignal::default(),
            bus.clone(),
        );
        Fixture {
            turen,
            lifetime,
            custodian,
            feedback,
            speech,
            playback,
            microphone,
            bus,
            _host: host,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(FakeHost::handling(true)))
    }

    async fn play(fx: &Fixture, app_id: &str) {
        fx.lifetime.create_app(app_id).await.unwrap();
        fx.lifetime
            .activate_app_by_id(app_id, ActivateParams::scene())
            .await
            .unwrap();
        fx.playback.start(app_id);
    }

    #[tokio::test(start_paused = true)]
    async fn no_wifi_history_guides_to_setup() {
        let fx = fixture();
        fx.custodian.set_prepared(false);
        fx.custodian.set_wifi_history(false);

        fx.turen.voice_coming().await;

        let s = fx.turen.session().await;
        assert!(!s.awaken);
        assert!(!s.solitary_voice_coming_armed);
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert_eq!(
            fx.feedback.signals(),
            vec![Signal::Announce(Announcement::GuideToSetup)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn known_wifi_announces_connecting() {
        let fx = fixture();
        fx.custodian.set_prepared(false);
        fx.turen.voice_coming().await;
        assert_eq!(
            fx.feedback.signals(),
            vec![Signal::Announce(Announcement::NetworkConnecting)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn awaken_pauses_current_playback() {
        let fx = fixture();
        play(&fx, "music").await;

        fx.turen.voice_coming().await;

        let s = fx.turen.session().await;
        assert!(s.awaken && fx.turen.is_awaken());
        assert_eq!(s.asr_state, AsrState::Pending);
        assert_eq!(s.paused_on_awaken.as_deref(), Some("music"));
        assert!(s.solitary_voice_coming_armed);
        assert_eq!(fx.feedback.signals(), vec![Signal::Awake]);
    }

    #[tokio::test(start_paused = true)]
    async fn solitary_wake_times_out_with_lag_announcement() {
        let fx = fixture();
        play(&fx, "music").await;
        let mut rx = fx.bus.subscribe();

        fx.turen.voice_coming().await;
        tokio::time::sleep(Duration::from_millis(9001)).await;

        let s = fx.turen.session().await;
        assert!(!s.awaken);
        assert_eq!(s.paused_on_awaken, None);
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert!(
            fx.feedback
                .signals()
                .contains(&Signal::Announce(Announcement::NetworkLag))
        );

        let mut timed_out = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::VoiceTimeout {
                assert_eq!(ev.reason.as_deref(), Some("solitary_voice_coming"));
                timed_out = true;
            }
        }
        assert!(timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn asr_progress_swaps_timers() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        tokio::time::sleep(Duration::from_millis(5000)).await;
        fx.turen.asr_pending().await;

        let s = fx.turen.session().await;
        assert!(!s.solitary_voice_coming_armed);
        assert!(s.no_voice_input_armed);

        // past the original solitary deadline: nothing fires
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(fx.feedback.announcements().is_empty());
        assert!(fx.turen.session().await.no_voice_input_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_off_closes_pickup_and_recovers() {
        let fx = fixture();
        play(&fx, "music").await;
        fx.turen.voice_coming().await;
        fx.turen.asr_pending().await;

        tokio::time::sleep(Duration::from_millis(6001)).await;

        let s = fx.turen.session().await;
        assert!(!s.awaken && !s.no_voice_input_armed);
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
        assert!(fx.feedback.announcements().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn asr_end_without_voice_coming_is_harmless() {
        let fx = fixture();
        fx.turen.asr_end().await;
        let s = fx.turen.session().await;
        assert_eq!(s.asr_state, AsrState::End);
        assert!(!s.no_voice_input_armed);
        assert_eq!(fx.feedback.signals(), vec![Signal::Loading]);
    }

    #[tokio::test(start_paused = true)]
    async fn asr_end_keeps_playback_paused_for_nlp() {
        let fx = fixture();
        play(&fx, "music").await;
        fx.turen.voice_coming().await;
        fx.turen.asr_pending().await;
        fx.turen.asr_end().await;

        let s = fx.turen.session().await;
        assert!(!s.awaken);
        assert_eq!(s.paused_on_awaken.as_deref(), Some("music"));
        assert!(fx.playback.resumed().is_empty());
        assert_eq!(fx.feedback.signals().last(), Some(&Signal::Loading));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(fx.playback.resumed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn handled_nlp_clears_memo() {
        let host = Arc::new(FakeHost::handling(true));
        let fx = fixture_with(host.clone());
        play(&fx, "music").await;
        fx.turen.voice_coming().await;
        fx.turen.asr_end().await;

        fx.turen
            .nlp(serde_json::json!({ "appId": "weather" }), Value::Null)
            .await;

        assert_eq!(host.commands().len(), 1);
        assert_eq!(fx.turen.session().await.paused_on_awaken, None);
        assert!(fx.playback.resumed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unhandled_nlp_recovers_playback() {
        let fx = fixture_with(Arc::new(FakeHost::handling(false)));
        play(&fx, "music").await;
        fx.turen.voice_coming().await;
        fx.turen.asr_end().await;

        fx.turen.nlp(Value::Null, Value::Null).await;
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_pickup_discards_exactly_one_nlp() {
        let host = Arc::new(FakeHost::handling(true));
        let fx = fixture_with(host.clone());
        fx.turen.voice_coming().await;
        fx.turen.pickup(true).await;
        fx.turen.asr_pending().await;
        fx.turen.pickup(false).await;
        assert!(fx.turen.session().await.picking_up_discard_next);

        fx.turen.asr_end().await;
        assert!(!fx.feedback.signals().contains(&Signal::Loading));

        fx.turen.nlp(Value::Null, Value::Null).await;
        assert!(host.commands().is_empty());
        assert!(!fx.turen.session().await.picking_up_discard_next);

        fx.turen.nlp(Value::Null, Value::Null).await;
        assert_eq!(host.commands().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pickup_closed_after_asr_end_keeps_result() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.pickup(true).await;
        fx.turen.asr_end().await;
        fx.turen.pickup(false).await;
        assert!(!fx.turen.session().await.picking_up_discard_next);
    }

    #[tokio::test(start_paused = true)]
    async fn network_class_error_announces_lag() {
        let fx = fixture();
        play(&fx, "music").await;
        fx.turen.voice_coming().await;

        fx.turen.speech_error(101).await;

        assert_eq!(
            fx.feedback.announcements(),
            vec![Announcement::NetworkLag]
        );
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
        assert!(!fx.turen.session().await.solitary_voice_coming_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn local_error_recovers_silently() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.speech_error(3).await;
        assert!(fx.feedback.announcements().is_empty());
        assert_eq!(fx.speech.pickups(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn fake_asr_cancels_no_voice_timer() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.asr_pending().await;
        fx.turen.asr_fake().await;
        let s = fx.turen.session().await;
        assert_eq!(s.asr_state, AsrState::Fake);
        assert!(!s.no_voice_input_armed && !s.awaken);
    }

    #[tokio::test(start_paused = true)]
    async fn muting_ends_session() {
        let fx = fixture();
        play(&fx, "music").await;
        fx.turen.voice_coming().await;
        fx.turen.pickup(true).await;

        fx.turen.set_muted(true).await;

        let s = fx.turen.session().await;
        assert!(s.muted && !s.awaken);
        assert!(fx.microphone.is_muted());
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_silences_pending_timers() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.reset().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(fx.feedback.announcements().is_empty());
        assert!(!fx.turen.session().await.awaken);
    }

    #[tokio::test(start_paused = true)]
    async fn handle_routes_decoded_signals() {
        let fx = fixture();
        fx.turen
            .handle(TurenEvent::from_topic("rokid.turen.voice_coming", &Value::Null).unwrap())
            .await;
        assert!(fx.turen.is_awaken());
        fx.turen.handle(TurenEvent::AsrReject).await;
        assert_eq!(fx.turen.session().await.asr_state, AsrState::Reject);
        assert!(!fx.turen.is_awaken());
    }

    #[tokio::test(start_paused = true)]
    async fn speech_error_mid_asr_spares_the_next_wake() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.asr_pending().await;
        fx.turen.speech_error(3).await;

        fx.turen.voice_coming().await;
        tokio::time::sleep(Duration::from_millis(6001)).await;

        let s = fx.turen.session().await;
        assert!(s.awaken && fx.turen.is_awaken());
        assert!(s.solitary_voice_coming_armed);
        assert_eq!(fx.speech.pickups(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn ending_signals_disarm_no_voice_timer() {
        for end in ["speech_error", "malicious_nlp", "nlp"] {
            let fx = fixture();
            fx.turen.voice_coming().await;
            fx.turen.asr_pending().await;
            match end {
                "speech_error" => fx.turen.speech_error(101).await,
                "malicious_nlp" => fx.turen.malicious_nlp().await,
                _ => fx.turen.nlp(Value::Null, Value::Null).await,
            }
            assert!(!fx.turen.session().await.no_voice_input_armed, "{end}");

            let closed = fx.speech.pickups();
            tokio::time::sleep(Duration::from_millis(6001)).await;
            assert_eq!(fx.speech.pickups(), closed, "{end}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_wake_replaces_no_voice_timer() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.turen.asr_pending().await;
        fx.turen.voice_coming().await;

        let s = fx.turen.session().await;
        assert!(s.solitary_voice_coming_armed && !s.no_voice_input_armed);

        tokio::time::sleep(Duration::from_millis(9001)).await;
        assert_eq!(fx.speech.pickups(), vec![false]);
        assert_eq!(fx.feedback.announcements(), vec![Announcement::NetworkLag]);
    }

    #[tokio::test(start_paused = true)]
    async fn pickup_closed_after_reject_drops_result() {
        let host = Arc::new(FakeHost::handling(true));
        let fx = fixture_with(host.clone());
        fx.turen.voice_coming().await;
        fx.turen.pickup(true).await;
        fx.turen.asr_reject().await;
        fx.turen.pickup(false).await;
        assert!(fx.turen.session().await.picking_up_discard_next);

        fx.turen.nlp(Value::Null, Value::Null).await;
        assert!(host.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pickup_closed_after_fake_asr_drops_result() {
        let host = Arc::new(FakeHost::handling(true));
        let fx = fixture_with(host.clone());
        fx.turen.voice_coming().await;
        fx.turen.pickup(true).await;
        fx.turen.asr_pending().await;
        fx.turen.asr_fake().await;
        fx.turen.pickup(false).await;

        fx.turen.nlp(Value::Null, Value::Null).await;
        assert!(host.commands().is_empty());
        assert!(!fx.turen.session().await.picking_up_discard_next);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_pickup_close_leaves_session_readable() {
        let fx = fixture();
        fx.turen.voice_coming().await;
        fx.speech.set_stall(Duration::from_secs(1));

        let turen = fx.turen.clone();
        let aborting = tokio::spawn(async move { turen.speech_error(3).await });
        while fx.speech.pickups().is_empty() {
            tokio::task::yield_now().await;
        }

        let s = tokio::time::timeout(Duration::from_millis(10), fx.turen.session())
            .await
            .expect("session lock held across set_pickup");
        assert!(!s.awaken && !s.solitary_voice_coming_armed);
        aborting.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn abort_during_pause_resumes_once_paused() {
        let fx = fixture();
        play(&fx, "music").await;
        fx.playback.set_stall(Duration::from_secs(1));

        let turen = fx.turen.clone();
        let waking = tokio::spawn(async move { turen.voice_coming().await });
        while !fx.turen.is_awaken() {
            tokio::task::yield_now().await;
        }
        fx.turen.speech_error(3).await;
        assert!(fx.playback.resumed().is_empty());

        waking.await.unwrap();
        assert_eq!(fx.playback.resumed(), vec!["music".to_string()]);
        assert_eq!(fx.turen.session().await.paused_on_awaken, None);
    }
}
