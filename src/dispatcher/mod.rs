//! # Dispatcher: routes events to apps.
//!
//! ```text
//! dispatch_app_event(app, event, params, opts)
//!   ├─► disabled?                     → false
//!   ├─► awaken and not from voice?    → downgrade to non-preemptive
//!   ├─► monopolized?                  → Oppressing → monopolist, true
//!   ├─► lifetime.create_app           → on error: force suspend, false
//!   ├─► preemptive: activate, skill stack, un-mute
//!   └─► emit Custom { event, params } → true
//!
//! delegate(event, args)
//!   └─► interception["event"] = [component.method, ...]  first `Ok(true)` wins
//! ```

mod dispatcher;
mod interception;

pub use dispatcher::{DispatchOptions, DispatchServices, Dispatcher};
pub use interception::{Handler, Interception, Interceptor};
