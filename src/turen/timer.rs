//! Cancel-and-restart single-shot timer.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Single-shot timer where arming always replaces the previous arm.
///
/// The owner keeps the timer inside its own state lock. Each arm hands the
/// callback a generation number; the callback must confirm with
/// [`DebouncedTimer::is_current`] under that lock before acting.
#[derive(Debug)]
pub struct DebouncedTimer {
    name: &'static str,
    generation: u64,
    token: Option<CancellationToken>,
}

impl DebouncedTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: 0,
            token: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancels any pending arm, then schedules `fire(generation)` after `after`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(&mut self, after: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let fut = fire(generation);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(after) => fut.await,
            }
        });
        self.token = Some(token);
        generation
    }

    /// Cancels the pending arm, if any.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// True while `generation` is the latest, not yet cancelled arm.
    pub fn is_current(&self, generation: u64) -> bool {
        self.token.is_some() && self.generation == generation
    }

    /// Marks the current arm as fired; call from the callback after `is_current`.
    pub fn complete(&mut self) {
        self.token = None;
        self.generation += 1;
    }

    pub fn is_armed(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for DebouncedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
