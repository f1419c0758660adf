use std::time::Duration;
use tokio::sync::mpsc;

use super::channel::SessionChannel;
use crate::core::config::ServiceConfig;
use crate::core::{ChannelEvent, Config, SessionController, SessionMessage, SessionState};

/// Owns the controller together with at most one open channel.
///
/// All controller transitions happen on the task that calls [`Self::apply`].
pub struct SessionDriver {
    service: ServiceConfig,
    idle_timeout: Option<Duration>,
    controller: SessionController,
    channel: Option<SessionChannel>,
    events_tx: mpsc::UnboundedSender<SessionMessage>,
    events_rx: mpsc::UnboundedReceiver<SessionMessage>,
}

impl SessionDriver {
    pub fn new(config: &Config) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service: config.service.clone(),
            idle_timeout: config.idle_timeout(),
            controller: SessionController::new(),
            channel: None,
            events_tx,
            events_rx,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn state(&self) -> &SessionState {
        self.controller.state()
    }

    /// Submit free-form input. Returns true when a new session started.
    pub fn submit(&mut self, raw: &str) -> bool {
        let Some(submission) = self.controller.submit(raw) else {
            return false;
        };

        // Superseded channels must be closed before the new one opens
        if let Some(previous) = self.channel.take() {
            tracing::debug!("Closing channel of superseded session {}", previous.session());
            drop(previous);
        }

        match self.service.channel_url(&submission.deck) {
            Ok(url) => {
                self.channel = Some(SessionChannel::open(
                    url,
                    submission.session,
                    self.idle_timeout,
                    self.events_tx.clone(),
                ));
            }
            Err(e) => {
                self.controller.apply(SessionMessage {
                    session: submission.session,
                    event: ChannelEvent::TransportFailed {
                        reason: format!("{:#}", e),
                    },
                });
            }
        }
        true
    }

    /// Next message from any channel this driver opened
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        self.events_rx.recv().await
    }

    /// Feed a channel message to the controller. Returns true when state changed.
    pub fn apply(&mut self, message: SessionMessage) -> bool {
        let changed = self.controller.apply(message);
        if changed && !self.controller.is_busy() {
            self.channel = None;
        }
        changed
    }

    /// Drive the current session until it settles or fails, reporting each
    /// status change
    pub async fn run_until_settled<F>(&mut self, mut on_status: F) -> &SessionState
    where
        F: FnMut(&str),
    {
        while self.controller.is_busy() {
            let Some(message) = self.recv().await else {
                break;
            };
            if self.apply(message) {
                if let Some(status) = self.controller.status() {
                    on_status(status);
                }
            }
        }
        self.controller.state()
    }

    /// Close any open channel and wait for it to finish
    pub async fn shutdown(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
    }
}
