//! # Runtime events emitted by the core components.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Runtime events**: boot phases, hibernate/wake, reset, app process exit
//! - **Lifetime events**: activation stack changes (activate, evict, idle, monopoly)
//! - **Focus events**: audio focus shifts between holders
//! - **Dispatch events**: routed, suppressed, intercepted and failed app events
//! - **Voice events**: wake, ASR progress, pickup, discarded results and timeouts
//!
//! The [`Event`] struct carries additional metadata such as timestamps, app ids,
//! event names, reasons and focus holders.
//!
//! ## Ordering
//! `seq` comes from one process-wide counter. Subscribers see events in
//! publish order, but across receivers only `seq` tells which came first.
//!
//! ## Example
//! ```rust
//! use skillvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::EventDispatched)
//!     .with_app("weather")
//!     .with_event("request");
//!
//! assert_eq!(ev.kind, EventKind::EventDispatched);
//! assert_eq!(ev.app.as_deref(), Some("weather"));
//! assert_eq!(ev.event.as_deref(), Some("request"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::focus::FocusRequest;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Runtime boot phase, broadcast on [`EventKind::PhaseChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Components are being wired; no app may be dispatched yet.
    Booting,
    /// Network/credential bootstrap is in progress.
    Setup,
    /// Logged in and serving voice commands.
    Ready,
}

impl Phase {
    /// Returns the wire name used on the runtime-phase channel.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Booting => "booting",
            Phase::Setup => "setup",
            Phase::Ready => "ready",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of [`EventKind::FocusShifted`]: `[new holder, previous holder]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusShift {
    /// Request now holding device attention (`None` when nothing holds focus).
    pub current: Option<FocusRequest>,
    /// Request that held device attention before this shift.
    pub previous: Option<FocusRequest>,
}

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// A subscriber's `on_event` panicked.
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name>` and panic message
    SubscriberPanicked,

    /// An event was skipped for one subscriber (`full` queue or `closed` worker).
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> reason=<full|closed>`
    SubscriberOverflow,

    // === Runtime events ===
    /// Runtime entered a new boot phase.
    ///
    /// Sets:
    /// - `phase`: the new phase
    PhaseChanged,

    /// Runtime hibernated: stack and focus cleared.
    Hibernated,

    /// Runtime woke up from hibernation.
    Woken,

    /// Runtime was fully reset.
    RuntimeReset,

    /// An app process terminated and was reconciled out of the core state.
    ///
    /// Sets:
    /// - `app`: the exited app
    AppExited,

    // === Lifetime events ===
    /// App became the top of the activation stack.
    ///
    /// Sets:
    /// - `app`: new top
    /// - `previous`: previous top, if any
    AppActivated,

    /// App was removed from the activation stack.
    ///
    /// Sets:
    /// - `app`: evicted app
    AppEvicted,

    /// App moved to background (kept running off-stack).
    ///
    /// Sets:
    /// - `app`: backgrounded app
    AppBackgrounded,

    /// Activation stack became empty after one or more evictions in the same tick.
    StackIdle,

    /// App was granted the monopoly over stack preemption.
    ///
    /// Sets:
    /// - `app`: the monopolist
    MonopolyRaised,

    /// The monopoly was released, either explicitly or because it went stale.
    ///
    /// Sets:
    /// - `app`: the former monopolist
    MonopolyCleared,

    // === Focus events ===
    /// Audio focus moved between holders (every grant and every abandon).
    ///
    /// Sets:
    /// - `focus`: `[current, previous]`
    FocusShifted,

    // === Dispatch events ===
    /// Event was routed to an app.
    ///
    /// Sets:
    /// - `app`: target app
    /// - `event`: event name
    EventDispatched,

    /// Event was redirected to the monopolist as `oppressing`.
    ///
    /// Sets:
    /// - `app`: the monopolist
    /// - `previous`: the app the event was meant for
    /// - `event`: event name
    EventOppressed,

    /// Runtime-level event was handled by an interceptor.
    ///
    /// Sets:
    /// - `event`: event name
    /// - `reason`: `<component>.<method>` that handled it
    EventIntercepted,

    /// Dispatch failed and was reported as `false`.
    ///
    /// Sets:
    /// - `app`: target app
    /// - `event`: event name
    /// - `reason`: failure message
    DispatchFailed,

    // === Voice events ===
    /// Wake word accepted; the voice session is awaken.
    VoiceAwaken,

    /// Wake word rejected because the network/login gate is not ready.
    ///
    /// Sets:
    /// - `reason`: announcement played instead
    VoiceRejected,

    /// Microphone pickup opened.
    PickupOpened,

    /// Microphone pickup closed.
    PickupClosed,

    /// A late NLP result was dropped because its session was discarded.
    NlpDiscarded,

    /// A voice-session timer fired.
    ///
    /// Sets:
    /// - `reason`: timer name
    VoiceTimeout,
}

/// One state change. Which optional fields are set is listed on each [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,

    /// App the event is about.
    pub app: Option<Arc<str>>,
    /// Related app (previous top, original dispatch target).
    pub previous: Option<Arc<str>>,
    /// Name of the dispatched app event.
    pub event: Option<Arc<str>>,
    /// Failure message, timer name, handler or subscriber details.
    pub reason: Option<Arc<str>>,
    /// Boot phase for [`EventKind::PhaseChanged`].
    pub phase: Option<Phase>,
    /// Focus holders for [`EventKind::FocusShifted`].
    pub focus: Option<FocusShift>,
}

impl Event {
    /// Stamps the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            app: None,
            previous: None,
            event: None,
            reason: None,
            phase: None,
            focus: None,
        }
    }

    /// Attaches the app id.
    #[inline]
    pub fn with_app(mut self, app: impl Into<Arc<str>>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Attaches the related app id.
    #[inline]
    pub fn with_previous(mut self, app: impl Into<Arc<str>>) -> Self {
        self.previous = Some(app.into());
        self
    }

    /// Attaches the dispatched event name.
    #[inline]
    pub fn with_event(mut self, event: impl Into<Arc<str>>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a boot phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a focus shift.
    #[inline]
    pub fn with_focus(mut self, current: Option<FocusRequest>, previous: Option<FocusRequest>) -> Self {
        self.focus = Some(FocusShift { current, previous });
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
