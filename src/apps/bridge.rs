//! # Event delivery to app processes.
//!
//! [`AppBridge`] is the seam through which the core sends [`AppEvent`]s. The
//! provided [`ChannelBridge`] keeps one bounded `tokio::sync::mpsc` channel per app
//! and waits for the app to acknowledge each [`AppEnvelope`].
//!
//! ## Rules
//! - `emit()` resolves once the app acknowledged (or dropped) the envelope.
//! - Dropping an envelope without calling [`AppEnvelope::ack`] counts as an acknowledgement.
//! - An app that never acknowledges fails with [`BridgeError::AckTimeout`] after
//!   the configured window; the caller decides whether that blocks progress.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc, oneshot};

use super::event::AppEvent;
use crate::error::BridgeError;

/// Delivery seam between the core and app processes.
#[async_trait]
pub trait AppBridge: Send + Sync + 'static {
    /// Delivers `event` to `app_id`.
    async fn emit(&self, app_id: &str, event: AppEvent) -> Result<(), BridgeError>;
}

/// Event as received by an app process.
#[derive(Debug)]
pub struct AppEnvelope {
    pub event: AppEvent,
    ack: Option<oneshot::Sender<()>>,
}

impl AppEnvelope {
    /// Acknowledges the event, releasing the emitter.
    pub fn ack(mut self) {
        if let Some(tx) = self.ack.take() {
            let _ = tx.send(());
        }
    }
}

/// Channel-per-app [`AppBridge`].
pub struct ChannelBridge {
    channels: RwLock<HashMap<String, mpsc::Sender<AppEnvelope>>>,
    capacity: usize,
    ack_timeout: Option<Duration>,
}

impl ChannelBridge {
    /// Creates a bridge whose per-app queues hold `capacity` envelopes.
    ///
    /// `ack_timeout = None` waits for acknowledgements indefinitely.
    pub fn new(capacity: usize, ack_timeout: Option<Duration>) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ack_timeout,
        }
    }

    /// Opens (or replaces) the channel for `app_id` and returns its receiving end.
    pub async fn register(&self, app_id: impl Into<String>) -> mpsc::Receiver<AppEnvelope> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.channels.write().await.insert(app_id.into(), tx);
        rx
    }

    /// Closes the channel for `app_id`.
    pub async fn unregister(&self, app_id: &str) {
        self.channels.write().await.remove(app_id);
    }
}

#[async_trait]
impl AppBridge for ChannelBridge {
    async fn emit(&self, app_id: &str, event: AppEvent) -> Result<(), BridgeError> {
        let sender = self
            .channels
            .read()
            .await
            .get(app_id)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownApp {
                app_id: app_id.to_string(),
            })?;

        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = AppEnvelope {
            event,
            ack: Some(ack_tx),
        };
        sender.send(envelope).await.map_err(|_| BridgeError::Closed {
            app_id: app_id.to_string(),
        })?;

        match self.ack_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, ack_rx).await {
                Ok(_) => Ok(()),
                Err(_) => Err(BridgeError::AckTimeout {
                    app_id: app_id.to_string(),
                    timeout,
                }),
            },
            None => {
                let _ = ack_rx.await;
                Ok(())
            }
        }
    }
}
