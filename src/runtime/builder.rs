//! Assembles a [`Runtime`] from its collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use crate::apps::{AppBridge, AppScheduler, ChannelBridge, Manifest, StaticManifest};
use crate::config::Config;
use crate::dispatcher::{DispatchServices, Dispatcher, Interception, Interceptor};
use crate::error::ConfigError;
use crate::events::Bus;
use crate::focus::AudioFocus;
use crate::lifetime::Lifetime;
use crate::services::{Custodian, Feedback, Microphone, Playback, SkillStack, Speech};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::turen::{AwakenSignal, VoiceServices};

use super::runtime::{Runtime, RuntimeParts};

/// Per-app queue size of the default [`ChannelBridge`].
const DEFAULT_BRIDGE_CAPACITY: usize = 64;

/// Builder for a [`Runtime`].
///
/// The supervisor and the voice services are required; the bridge defaults to a
/// [`ChannelBridge`] and the manifest to an empty [`StaticManifest`].
pub struct RuntimeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    scheduler: Option<Arc<dyn AppScheduler>>,
    bridge: Option<Arc<dyn AppBridge>>,
    manifest: Option<Arc<dyn Manifest>>,
    custodian: Option<Arc<dyn Custodian>>,
    feedback: Option<Arc<dyn Feedback>>,
    speech: Option<Arc<dyn Speech>>,
    playback: Option<Arc<dyn Playback>>,
    microphone: Option<Arc<dyn Microphone>>,
    skill_stack: Option<Arc<dyn SkillStack>>,
    interception: Interception,
    components: HashMap<String, Arc<dyn Interceptor>>,
}

impl RuntimeBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            scheduler: None,
            bridge: None,
            manifest: None,
            custodian: None,
            feedback: None,
            speech: None,
            playback: None,
            microphone: None,
            skill_stack: None,
            interception: Interception::default(),
            components: HashMap::new(),
        }
    }

    /// Sets event subscribers, each fed through its own bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn AppScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn AppBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_manifest(mut self, manifest: Arc<dyn Manifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_custodian(mut self, custodian: Arc<dyn Custodian>) -> Self {
        self.custodian = Some(custodian);
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn Feedback>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn Speech>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_playback(mut self, playback: Arc<dyn Playback>) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn with_microphone(mut self, microphone: Arc<dyn Microphone>) -> Self {
        self.microphone = Some(microphone);
        self
    }

    pub fn with_skill_stack(mut self, skill_stack: Arc<dyn SkillStack>) -> Self {
        self.skill_stack = Some(skill_stack);
        self
    }

    pub fn with_interception(mut self, interception: Interception) -> Self {
        self.interception = interception;
        self
    }

    /// Registers an interceptor under the component name used in the interception table.
    pub fn with_component(mut self, name: impl Into<String>, component: Arc<dyn Interceptor>) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    /// Wires every component and starts the subscriber listener.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - [`ConfigError::MissingCollaborator`] a required collaborator was not set
    /// - [`ConfigError::UnknownComponent`] the interception table names an unregistered component
    pub fn build(self) -> Result<Arc<Runtime>, ConfigError> {
        let scheduler = required(self.scheduler, "scheduler")?;
        let custodian = required(self.custodian, "custodian")?;
        let feedback = required(self.feedback, "feedback")?;
        let speech = required(self.speech, "speech")?;
        let playback = required(self.playback, "playback")?;
        let microphone = required(self.microphone, "microphone")?;
        let skill_stack = required(self.skill_stack, "skill stack")?;
        let bridge = self.bridge.unwrap_or_else(|| {
            Arc::new(ChannelBridge::new(DEFAULT_BRIDGE_CAPACITY, self.cfg.app_ack()))
        });
        let manifest = self
            .manifest
            .unwrap_or_else(|| Arc::new(StaticManifest::new()));

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let awaken = AwakenSignal::default();

        let lifetime = Arc::new(Lifetime::new(
            Arc::clone(&scheduler),
            Arc::clone(&bridge),
            bus.clone(),
        ));
        let focus = Arc::new(AudioFocus::new(Arc::clone(&bridge), bus.clone()));
        let dispatcher = Dispatcher::new(
            Arc::clone(&lifetime),
            DispatchServices {
                bridge,
                manifest,
                microphone: Arc::clone(&microphone),
                skill_stack,
            },
            self.interception,
            self.components,
            awaken.clone(),
            bus.clone(),
        )?;

        let runtime = Runtime::new_internal(RuntimeParts {
            cfg: self.cfg,
            bus,
            subs,
            scheduler,
            lifetime,
            focus,
            dispatcher,
            voice: VoiceServices {
                custodian,
                feedback,
                speech,
                playback,
                microphone,
            },
            awaken,
        });
        runtime.subscriber_listener();
        Ok(runtime)
    }
}

fn required<T: ?Sized>(value: Option<Arc<T>>, name: &'static str) -> Result<Arc<T>, ConfigError> {
    value.ok_or(ConfigError::MissingCollaborator { name })
}
