//! # AudioFocus: focus arbitration service.
//!
//! Wraps [`FocusState`] with a lock, the event bus and the app bridge.
//!
//! ## Rules
//! - Slot mutation and the `FocusShifted` broadcast happen under the lock, so the
//!   broadcast order always matches the state order.
//! - Callbacks are delivered after the lock is released, in the order the state
//!   machine produced them: `loss` to the outgoing holder before `gain` to the incoming one.
//! - A failed callback is logged and never rolls back the slot change.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::request::{FocusRequest, FocusResult, FocusShiftKey};
use super::state::{FocusState, Notification, Outcome};
use crate::apps::AppBridge;
use crate::events::{Bus, Event, EventKind};

/// Focus arbitration engine shared by every app.
pub struct AudioFocus {
    state: Mutex<FocusState>,
    bridge: Arc<dyn AppBridge>,
    bus: Bus,
}

impl AudioFocus {
    pub fn new(bridge: Arc<dyn AppBridge>, bus: Bus) -> Self {
        Self {
            state: Mutex::new(FocusState::default()),
            bridge,
            bus,
        }
    }

    /// Requests focus for `(app_id, id)` with the given `gain` bitmask.
    pub async fn request(&self, app_id: &str, id: i32, gain: u32) -> FocusResult {
        let req = FocusRequest::decode(app_id, id, gain);
        debug!(app_id, id, gain, "focus requested");
        let notifications = {
            let mut st = self.state.lock().await;
            let Outcome {
                result,
                notifications,
                shifts,
            } = st.request(req);
            if result != FocusResult::Granted {
                debug!(app_id, id, ?result, "focus request rejected");
                return result;
            }
            self.broadcast(shifts);
            notifications
        };
        self.deliver(notifications).await;
        FocusResult::Granted
    }

    /// Abandons the request `(app_id, id)`. Returns false if it held no slot.
    pub async fn abandon(&self, app_id: &str, id: i32) -> bool {
        let notifications = {
            let mut st = self.state.lock().await;
            let Some(out) = st.abandon(app_id, id) else {
                debug!(app_id, id, "abandon ignored, no matching focus");
                return false;
            };
            self.broadcast(out.shifts);
            out.notifications
        };
        self.deliver(notifications).await;
        true
    }

    /// Clears both slots unconditionally.
    pub async fn abandon_all_focuses(&self) {
        let notifications = {
            let mut st = self.state.lock().await;
            let out = st.clear();
            self.broadcast(out.shifts);
            out.notifications
        };
        self.deliver(notifications).await;
    }

    /// Drops every request held by an app whose process terminated.
    pub async fn app_did_exit(&self, app_id: &str) {
        let notifications = {
            let mut st = self.state.lock().await;
            let out = st.remove_app(app_id);
            self.broadcast(out.shifts);
            out.notifications
        };
        self.deliver(notifications).await;
    }

    pub async fn transient_request(&self) -> Option<FocusRequest> {
        self.state.lock().await.transient.clone()
    }

    pub async fn lasting_request(&self) -> Option<FocusRequest> {
        self.state.lock().await.lasting.clone()
    }

    /// Returns the holder of device attention (transient first).
    pub async fn current(&self) -> Option<FocusRequest> {
        self.state.lock().await.current().cloned()
    }

    /// Returns how many focus shifts requests with these attributes caused.
    pub async fn shift_count(&self, key: &FocusShiftKey) -> u64 {
        self.state
            .lock()
            .await
            .shift_counts
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot of all focus-shift counters.
    pub async fn shift_counts(&self) -> HashMap<FocusShiftKey, u64> {
        self.state.lock().await.shift_counts.clone()
    }

    fn broadcast(&self, shifts: Vec<(Option<FocusRequest>, Option<FocusRequest>)>) {
        for (current, previous) in shifts {
            self.bus
                .publish(Event::new(EventKind::FocusShifted).with_focus(current, previous));
        }
    }

    async fn deliver(&self, notifications: Vec<Notification>) {
        for Notification { app_id, event } in notifications {
            let name = event.name().to_string();
            if let Err(e) = self.bridge.emit(&app_id, event).await {
                warn!(app_id = %app_id, event = %name, error = %e, "focus callback failed");
            }
        }
    }
}
