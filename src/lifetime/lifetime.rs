//! Activation stack owner.
//!
//! State lives behind one `tokio::sync::Mutex` and is never held across a
//! supervisor or bridge call: each operation decides under the lock, then
//! performs the side effects it decided on.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::options::{ActivateParams, ContextOptions, DeactivateOptions, Form};
use super::stack::ActivationStack;
use crate::apps::{AppBridge, AppEvent, AppScheduler, Lifecycle};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};

#[derive(Debug, Default)]
struct LifetimeState {
    stack: ActivationStack,
    context_options: HashMap<String, ContextOptions>,
    monopolist: Option<String>,
    idle_check_pending: bool,
}

/// How a process leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    Background,
    Suspend { force: bool },
}

/// App activation and preemption manager.
pub struct Lifetime {
    state: Arc<Mutex<LifetimeState>>,
    scheduler: Arc<dyn AppScheduler>,
    bridge: Arc<dyn AppBridge>,
    bus: Bus,
}

impl Lifetime {
    pub fn new(scheduler: Arc<dyn AppScheduler>, bridge: Arc<dyn AppBridge>, bus: Bus) -> Self {
        Self {
            state: Arc::new(Mutex::new(LifetimeState::default())),
            scheduler,
            bridge,
            bus,
        }
    }

    /// Asks the supervisor to create `app_id`. The stack is not touched.
    ///
    /// A freshly started process receives `create`.
    pub async fn create_app(&self, app_id: &str) -> Result<(), RuntimeError> {
        let was_running = self.scheduler.is_app_running(app_id);
        self.scheduler
            .create_app(app_id)
            .await
            .map_err(|e| RuntimeError::AppLaunch {
                app_id: app_id.to_string(),
                error: e.to_string(),
            })?;
        if !was_running {
            debug!(app_id, "app created");
            self.notify(app_id, AppEvent::lifecycle(Lifecycle::Create)).await;
        }
        Ok(())
    }

    /// Moves `app_id` to the top of the stack.
    ///
    /// # Errors
    /// - [`RuntimeError::Monopolized`] a valid monopolist other than `app_id` exists
    /// - [`RuntimeError::NotRunning`] the app was not created first
    pub async fn activate_app_by_id(
        &self,
        app_id: &str,
        params: ActivateParams,
    ) -> Result<(), RuntimeError> {
        let (previous, evicted) = {
            let mut st = self.state.lock().await;
            if st.stack.top() == Some(app_id) {
                debug!(app_id, "already on top");
                return Ok(());
            }
            if let Some(monopolist) = self.valid_monopolist(&mut st) {
                return Err(RuntimeError::Monopolized {
                    app_id: app_id.to_string(),
                    monopolist,
                });
            }
            if !self.scheduler.is_app_running(app_id) {
                return Err(RuntimeError::NotRunning {
                    app_id: app_id.to_string(),
                });
            }

            let previous = st.stack.top().map(str::to_string);
            st.stack.push_top(app_id);
            st.context_options.insert(
                app_id.to_string(),
                ContextOptions {
                    form: params.form,
                    keep_alive: params.keep_alive,
                },
            );
            if params.monopolist {
                st.monopolist = Some(app_id.to_string());
                self.bus
                    .publish(Event::new(EventKind::MonopolyRaised).with_app(app_id));
            }

            let evicted = previous
                .clone()
                .filter(|p| params.form == Form::Cut && !self.is_kept_alive(&st, p));
            if let Some(p) = &evicted {
                st.stack.remove(p);
                st.context_options.remove(p);
                self.bus.publish(Event::new(EventKind::AppEvicted).with_app(p.as_str()));
            }

            let mut ev = Event::new(EventKind::AppActivated).with_app(app_id);
            if let Some(p) = &previous {
                ev = ev.with_previous(p.as_str());
            }
            self.bus.publish(ev);
            (previous, evicted)
        };

        info!(app_id, previous = ?previous, form = %params.form, "app activated");
        if let Some(p) = &previous {
            self.notify(p, AppEvent::lifecycle(Lifecycle::Paused)).await;
        }
        self.notify(app_id, AppEvent::lifecycle(Lifecycle::Resumed)).await;

        if let Some(p) = evicted {
            let release = self.release_for(&p, None, DeactivateOptions::default());
            if let Err(e) = self.release(&p, release).await {
                warn!(app_id = %p, error = %e, "releasing preempted app failed");
            }
        }
        Ok(())
    }

    /// Removes `app_id` from the stack and releases its process.
    ///
    /// Bookkeeping completes even when the life-cycle emission fails; only a
    /// supervisor failure is returned, after the new top was recovered.
    pub async fn deactivate_app_by_id(
        &self,
        app_id: &str,
        opts: DeactivateOptions,
    ) -> Result<(), RuntimeError> {
        let (context, new_top) = {
            let mut st = self.state.lock().await;
            if !st.stack.contains(app_id) && !opts.force {
                debug!(app_id, "deactivation ignored, app not in stack");
                return Ok(());
            }
            let was_top = st.stack.top() == Some(app_id);
            let context = st.context_options.remove(app_id);
            self.forget(&mut st, app_id);
            let new_top = if was_top {
                st.stack.top().map(str::to_string)
            } else {
                None
            };
            (context, new_top)
        };

        let release = self.release_for(app_id, context, opts);
        info!(app_id, ?release, "app deactivated");
        let res = self.release(app_id, release).await;

        if opts.recover {
            if let Some(top) = new_top {
                self.notify(&top, AppEvent::lifecycle(Lifecycle::Resumed)).await;
            }
        }
        res
    }

    /// Deactivates every stack entry not listed in `excepts`, without recovery.
    ///
    /// Failures are logged and do not stop the sweep.
    pub async fn deactivate_apps_in_stack(&self, excepts: &[&str]) {
        let targets: Vec<String> = {
            let st = self.state.lock().await;
            st.stack
                .as_slice()
                .iter()
                .rev()
                .filter(|a| !excepts.contains(&a.as_str()))
                .cloned()
                .collect()
        };
        for app_id in targets {
            let opts = DeactivateOptions::default().without_recover();
            if let Err(e) = self.deactivate_app_by_id(&app_id, opts).await {
                warn!(app_id = %app_id, error = %e, label = e.as_label(), "deactivation failed");
            }
        }
    }

    /// Moves `app_id` off the stack into background without suspending it.
    pub async fn set_background_by_id(&self, app_id: &str) {
        let new_top = {
            let mut st = self.state.lock().await;
            let was_top = st.stack.top() == Some(app_id);
            st.context_options.remove(app_id);
            self.forget(&mut st, app_id);
            if was_top {
                st.stack.top().map(str::to_string)
            } else {
                None
            }
        };
        if let Err(e) = self.release(app_id, Release::Background).await {
            warn!(app_id, error = %e, "background failed");
        }
        if let Some(top) = new_top {
            self.notify(&top, AppEvent::lifecycle(Lifecycle::Resumed)).await;
        }
    }

    /// Removes an exited app from all bookkeeping; the supervisor is not called.
    pub async fn app_did_exit(&self, app_id: &str) {
        let new_top = {
            let mut st = self.state.lock().await;
            let was_top = st.stack.top() == Some(app_id);
            st.context_options.remove(app_id);
            self.forget(&mut st, app_id);
            if was_top {
                st.stack.top().map(str::to_string)
            } else {
                None
            }
        };
        if let Some(top) = new_top {
            self.notify(&top, AppEvent::lifecycle(Lifecycle::Resumed)).await;
        }
    }

    /// Returns whether preemption is blocked by a valid monopolist.
    pub async fn is_monopolized(&self) -> bool {
        let mut st = self.state.lock().await;
        self.valid_monopolist(&mut st).is_some()
    }

    /// Returns the valid monopolist, clearing a stale one.
    pub async fn monopolist(&self) -> Option<String> {
        let mut st = self.state.lock().await;
        self.valid_monopolist(&mut st)
    }

    /// True iff `preemptive` and a valid monopolist other than `app_id` exists.
    pub async fn guard_monopolization(&self, app_id: &str, preemptive: bool) -> bool {
        if !preemptive {
            return false;
        }
        let mut st = self.state.lock().await;
        self.valid_monopolist(&mut st)
            .is_some_and(|m| m != app_id)
    }

    pub async fn current_app_id(&self) -> Option<String> {
        self.state.lock().await.stack.top().map(str::to_string)
    }

    pub async fn is_app_in_stack(&self, app_id: &str) -> bool {
        self.state.lock().await.stack.contains(app_id)
    }

    /// Bottom-to-top snapshot of the stack.
    pub async fn stack(&self) -> Vec<String> {
        self.state.lock().await.stack.as_slice().to_vec()
    }

    pub async fn context_options(&self, app_id: &str) -> Option<ContextOptions> {
        self.state.lock().await.context_options.get(app_id).copied()
    }

    fn valid_monopolist(&self, st: &mut LifetimeState) -> Option<String> {
        let m = st.monopolist.clone()?;
        if st.stack.top() == Some(m.as_str()) && self.scheduler.is_app_running(&m) {
            return Some(m);
        }
        debug!(app_id = %m, "stale monopolist cleared");
        st.monopolist = None;
        self.bus
            .publish(Event::new(EventKind::MonopolyCleared).with_app(m.as_str()));
        None
    }

    fn is_kept_alive(&self, st: &LifetimeState, app_id: &str) -> bool {
        let (daemon, keep_alive) = self.record_flags(app_id);
        daemon || keep_alive || st.context_options.get(app_id).is_some_and(|c| c.keep_alive)
    }

    /// `(daemon, keep_alive)` as recorded by the supervisor.
    fn record_flags(&self, app_id: &str) -> (bool, bool) {
        self.scheduler
            .app_record(app_id)
            .map_or((false, false), |r| (r.daemon, r.keep_alive))
    }

    fn release_for(
        &self,
        app_id: &str,
        context: Option<ContextOptions>,
        opts: DeactivateOptions,
    ) -> Release {
        if opts.force {
            return Release::Suspend { force: true };
        }
        let (daemon, keep_alive) = self.record_flags(app_id);
        let kept = !opts.ignore_kept_alive && (keep_alive || context.is_some_and(|c| c.keep_alive));
        if kept || daemon {
            Release::Background
        } else {
            Release::Suspend { force: false }
        }
    }

    async fn release(&self, app_id: &str, release: Release) -> Result<(), RuntimeError> {
        match release {
            Release::Background => {
                self.notify(app_id, AppEvent::lifecycle(Lifecycle::Background))
                    .await;
                self.bus
                    .publish(Event::new(EventKind::AppBackgrounded).with_app(app_id));
                Ok(())
            }
            Release::Suspend { force } => self
                .scheduler
                .suspend_app(app_id, force)
                .await
                .map_err(|e| RuntimeError::Supervisor {
                    app_id: app_id.to_string(),
                    error: e.to_string(),
                }),
        }
    }

    /// Drops `app_id` from the stack and monopoly, publishing the eviction.
    fn forget(&self, st: &mut LifetimeState, app_id: &str) {
        if st.monopolist.as_deref() == Some(app_id) {
            st.monopolist = None;
            self.bus
                .publish(Event::new(EventKind::MonopolyCleared).with_app(app_id));
        }
        if st.stack.remove(app_id) {
            self.bus
                .publish(Event::new(EventKind::AppEvicted).with_app(app_id));
            self.schedule_idle_check(st);
        }
    }

    /// Publishes `StackIdle` once per tick if the stack ended up empty.
    fn schedule_idle_check(&self, st: &mut LifetimeState) {
        if st.idle_check_pending {
            return;
        }
        st.idle_check_pending = true;
        let state = Arc::clone(&self.state);
        let bus = self.bus.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let mut st = state.lock().await;
            st.idle_check_pending = false;
            if st.stack.is_empty() {
                bus.publish(Event::new(EventKind::StackIdle));
            }
        });
    }

    async fn notify(&self, app_id: &str, event: AppEvent) {
        let name = event.name().to_string();
        if let Err(e) = self.bridge.emit(app_id, event).await {
            warn!(app_id, event = %name, error = %e, "life-cycle emission failed");
        }
    }
}
