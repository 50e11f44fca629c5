//! # Lifetime: app activation stack and preemption.
//!
//! Single source of truth for "which app currently owns the screen/voice channel".
//!
//! ```text
//! activate_app_by_id(B)        stack: [A] ──► [B]   (form = cut, A not kept alive)
//!   ├─► guard: top? monopolist? running?
//!   ├─► mutate stack + context options (sync, under lock)
//!   ├─► emit Paused → A         (awaited, failure logged)
//!   ├─► emit Resumed → B
//!   └─► release A's process     (suspend, or Background if kept alive / daemon)
//!
//! deactivate_app_by_id(B)      stack: [A, B] ──► [A]
//!   ├─► clear monopolist, remove from stack, publish AppEvicted (idle coalesced per tick)
//!   ├─► suspend B (force bypasses keep-alive) or Background
//!   └─► recover: emit Resumed → A
//! ```

mod lifetime;
mod options;
mod stack;

pub use lifetime::Lifetime;
pub use options::{ActivateParams, ContextOptions, DeactivateOptions, Form};
pub use stack::ActivationStack;
