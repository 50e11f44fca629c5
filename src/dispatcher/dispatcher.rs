//! # Dispatcher: intent and URL routing.
//!
//! An event reaches its app only after the interception chain lets it through.
//! While a monopolist is set, events for other apps are redirected to it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::interception::{Interception, Interceptor};
use crate::apps::{AppBridge, AppEvent, Manifest};
use crate::error::{ConfigError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::lifetime::{ActivateParams, DeactivateOptions, Form, Lifetime};
use crate::services::{Microphone, SkillStack};
use crate::turen::AwakenSignal;

/// Options of [`Dispatcher::dispatch_app_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Bring the app to the top of the stack before delivering the event.
    pub preemptive: bool,
    pub form: Form,
    /// Cloud skill the event belongs to (bookkeeping only).
    pub skill_id: Option<String>,
    /// App that launched this one (bookkeeping only).
    pub carrier_id: Option<String>,
    /// The dispatch comes from a recognized voice command.
    pub from_voice: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            preemptive: true,
            form: Form::Cut,
            skill_id: None,
            carrier_id: None,
            from_voice: false,
        }
    }
}

impl DispatchOptions {
    pub fn non_preemptive() -> Self {
        Self {
            preemptive: false,
            ..Self::default()
        }
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    pub fn with_skill_id(mut self, skill_id: impl Into<String>) -> Self {
        self.skill_id = Some(skill_id.into());
        self
    }

    pub fn with_carrier_id(mut self, carrier_id: impl Into<String>) -> Self {
        self.carrier_id = Some(carrier_id.into());
        self
    }

    pub fn from_voice(mut self) -> Self {
        self.from_voice = true;
        self
    }
}

/// Collaborators the dispatcher talks to.
#[derive(Clone)]
pub struct DispatchServices {
    pub bridge: Arc<dyn AppBridge>,
    pub manifest: Arc<dyn Manifest>,
    pub microphone: Arc<dyn Microphone>,
    pub skill_stack: Arc<dyn SkillStack>,
}

/// Event router.
pub struct Dispatcher {
    lifetime: Arc<Lifetime>,
    services: DispatchServices,
    interception: Interception,
    components: HashMap<String, Arc<dyn Interceptor>>,
    disabling: RwLock<HashSet<String>>,
    awaken: AwakenSignal,
    bus: Bus,
}

impl Dispatcher {
    /// Builds the dispatcher, validating `interception` against `components`.
    pub fn new(
        lifetime: Arc<Lifetime>,
        services: DispatchServices,
        interception: Interception,
        components: HashMap<String, Arc<dyn Interceptor>>,
        awaken: AwakenSignal,
        bus: Bus,
    ) -> Result<Self, ConfigError> {
        interception.validate(|c| components.contains_key(c))?;
        Ok(Self {
            lifetime,
            services,
            interception,
            components,
            disabling: RwLock::new(HashSet::new()),
            awaken,
            bus,
        })
    }

    pub fn manifest(&self) -> &Arc<dyn Manifest> {
        &self.services.manifest
    }

    /// Offers a runtime-level event to its interceptors in table order.
    ///
    /// Returns true once a handler reports it handled the event; a failing
    /// handler counts as not handled.
    pub async fn delegate(&self, event: &str, args: &[Value]) -> bool {
        for handler in self.interception.handlers(event) {
            let Some(component) = self.components.get(&handler.component) else {
                continue;
            };
            match component.intercept(&handler.method, event, args).await {
                Ok(true) => {
                    debug!(event, %handler, "event intercepted");
                    self.bus.publish(
                        Event::new(EventKind::EventIntercepted)
                            .with_event(event)
                            .with_reason(handler.to_string()),
                    );
                    return true;
                }
                Ok(false) => {}
                Err(e) => warn!(event, %handler, error = %e, "interceptor failed"),
            }
        }
        false
    }

    /// Routes `event` to `app_id`. Never fails; every error is logged and reported as `false`.
    pub async fn dispatch_app_event(
        &self,
        app_id: &str,
        event: &str,
        params: Vec<Value>,
        opts: DispatchOptions,
    ) -> bool {
        if let Some(reason) = self.disabling_reason().await {
            info!(app_id, event, reason = %reason, "dispatch refused, runtime disabled");
            self.failed(app_id, event, &format!("runtime disabled: {reason}"));
            return false;
        }

        let mut preemptive = opts.preemptive;
        if preemptive && !opts.from_voice && self.awaken.is_awaken() {
            debug!(app_id, event, "voice session awaken, dispatching without preemption");
            preemptive = false;
        }

        if self.lifetime.guard_monopolization(app_id, preemptive).await {
            if let Some(monopolist) = self.lifetime.monopolist().await {
                return self.oppress(&monopolist, app_id, event).await;
            }
        }

        match self.deliver(app_id, event, params, preemptive, &opts).await {
            Ok(()) => {
                debug!(app_id, event, preemptive, carrier = ?opts.carrier_id, "event dispatched");
                self.bus.publish(
                    Event::new(EventKind::EventDispatched)
                        .with_app(app_id)
                        .with_event(event),
                );
                true
            }
            Err(e) => {
                warn!(app_id, event, label = e.as_label(), error = %e, "dispatch failed");
                self.failed(app_id, event, &e.as_message());
                false
            }
        }
    }

    /// Sends `notification` to every app on `channel` without preemption.
    ///
    /// Returns how many apps received it.
    pub async fn dispatch_notification(&self, channel: &str, args: Vec<Value>) -> usize {
        let subscribers = self.services.manifest.channel_subscribers(channel);
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Value::String(channel.to_string()));
        params.extend(args);

        let mut delivered = 0;
        for app_id in subscribers {
            if self
                .dispatch_app_event(
                    &app_id,
                    "notification",
                    params.clone(),
                    DispatchOptions::non_preemptive(),
                )
                .await
            {
                delivered += 1;
            }
        }
        debug!(channel, delivered, "notification fanned out");
        delivered
    }

    /// Adds a disabling reason. Dispatch is refused while any reason is set.
    pub async fn disable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        info!(reason = %reason, "runtime disabled");
        self.disabling.write().await.insert(reason);
    }

    /// Removes a disabling reason; returns whether it was set.
    pub async fn enable(&self, reason: &str) -> bool {
        let removed = self.disabling.write().await.remove(reason);
        if removed {
            info!(reason, "disabling reason cleared");
        }
        removed
    }

    pub async fn is_disabled(&self) -> bool {
        !self.disabling.read().await.is_empty()
    }

    async fn disabling_reason(&self) -> Option<String> {
        let reasons = self.disabling.read().await;
        let mut sorted: Vec<&String> = reasons.iter().collect();
        sorted.sort();
        sorted.first().map(|r| r.to_string())
    }

    async fn deliver(
        &self,
        app_id: &str,
        event: &str,
        params: Vec<Value>,
        preemptive: bool,
        opts: &DispatchOptions,
    ) -> Result<(), RuntimeError> {
        if let Err(e) = self.lifetime.create_app(app_id).await {
            if let Err(se) = self
                .lifetime
                .deactivate_app_by_id(app_id, DeactivateOptions::forced())
                .await
            {
                warn!(app_id, error = %se, "force suspend after failed launch failed");
            }
            return Err(e);
        }

        if preemptive {
            let params = ActivateParams {
                form: opts.form,
                ..ActivateParams::default()
            };
            self.lifetime.activate_app_by_id(app_id, params).await?;
            self.services
                .skill_stack
                .on_app_activated(app_id, opts.skill_id.as_deref())
                .await;
            if self.services.microphone.is_muted() {
                debug!(app_id, "un-muting microphone for foreground app");
                self.services.microphone.set_muted(false).await;
            }
        }

        self.services
            .bridge
            .emit(
                app_id,
                AppEvent::Custom {
                    event: event.to_string(),
                    params,
                },
            )
            .await?;
        Ok(())
    }

    async fn oppress(&self, monopolist: &str, app_id: &str, event: &str) -> bool {
        info!(monopolist, app_id, event, "event redirected to monopolist");
        let oppressing = AppEvent::Oppressing {
            event: event.to_string(),
        };
        if let Err(e) = self.services.bridge.emit(monopolist, oppressing).await {
            warn!(monopolist, error = %e, "oppressing emission failed");
        }
        self.bus.publish(
            Event::new(EventKind::EventOppressed)
                .with_app(monopolist)
                .with_previous(app_id)
                .with_event(event),
        );
        true
    }

    fn failed(&self, app_id: &str, event: &str, reason: &str) {
        self.bus.publish(
            Event::new(EventKind::DispatchFailed)
                .with_app(app_id)
                .with_event(event)
                .with_reason(reason),
        );
    }
}
