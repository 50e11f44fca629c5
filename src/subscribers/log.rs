//! # Tracing-backed event renderer.
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//!
//! ## Example output
//! ```text
//! INFO [phase] phase=ready
//! INFO [activated] app="weather" previous=Some("music")
//! INFO [focus] current=Some("weather#1") previous=None
//! WARN [dispatch-failed] app="weather" event="request" reason="app weather is not running"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::focus::FocusRequest;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn holder(req: &Option<FocusRequest>) -> Option<String> {
    req.as_ref().map(|r| format!("{}#{}", r.app_id, r.id))
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let app = e.app.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::PhaseChanged => {
                tracing::info!(phase = ?e.phase, "[phase]");
            }
            EventKind::Hibernated | EventKind::Woken | EventKind::RuntimeReset => {
                tracing::info!(kind = ?e.kind, "[runtime]");
            }
            EventKind::AppExited => tracing::warn!(app, "[app-exited]"),
            EventKind::AppActivated => {
                tracing::info!(app, previous = ?e.previous, "[activated]");
            }
            EventKind::AppEvicted => tracing::info!(app, "[evicted]"),
            EventKind::AppBackgrounded => tracing::info!(app, "[background]"),
            EventKind::StackIdle => tracing::info!("[idle]"),
            EventKind::MonopolyRaised => tracing::info!(app, "[monopoly-raised]"),
            EventKind::MonopolyCleared => tracing::info!(app, "[monopoly-cleared]"),
            EventKind::FocusShifted => {
                if let Some(shift) = &e.focus {
                    tracing::info!(
                        current = ?holder(&shift.current),
                        previous = ?holder(&shift.previous),
                        "[focus]"
                    );
                }
            }
            EventKind::EventDispatched => tracing::debug!(app, event = ?e.event, "[dispatched]"),
            EventKind::EventOppressed => {
                tracing::info!(monopolist = app, target = ?e.previous, event = ?e.event, "[oppressed]");
            }
            EventKind::EventIntercepted => {
                tracing::info!(event = ?e.event, by = ?e.reason, "[intercepted]");
            }
            EventKind::DispatchFailed => {
                tracing::warn!(app, event = ?e.event, reason = ?e.reason, "[dispatch-failed]");
            }
            EventKind::VoiceAwaken => tracing::info!("[awaken]"),
            EventKind::VoiceRejected => tracing::warn!(reason = ?e.reason, "[voice-rejected]"),
            EventKind::PickupOpened => tracing::debug!("[pickup-opened]"),
            EventKind::PickupClosed => tracing::debug!("[pickup-closed]"),
            EventKind::NlpDiscarded => tracing::info!("[nlp-discarded]"),
            EventKind::VoiceTimeout => tracing::warn!(timer = ?e.reason, "[voice-timeout]"),
            EventKind::SubscriberOverflow => tracing::warn!(reason = ?e.reason, "[subscriber-overflow]"),
            EventKind::SubscriberPanicked => tracing::error!(reason = ?e.reason, "[subscriber-panicked]"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
