use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::connect_async;
use url::Url;

use crate::core::event::{decode, DecodeError, SessionEvent};
use crate::core::session::{ChannelEvent, SessionId, SessionMessage};

/// Receive-only WebSocket to one validation job.
///
/// Every message the channel emits is tagged with the [`SessionId`] it was
/// opened for. Dropping the handle closes the socket.
pub struct SessionChannel {
    session: SessionId,
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SessionChannel {
    pub fn open(
        url: Url,
        session: SessionId,
        idle_timeout: Option<Duration>,
        events_tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        let (close_tx, close_rx) = oneshot::channel();
        tracing::info!("Opening validation channel {} for session {}", url, session);

        let task = tokio::spawn(run_channel(url, session, idle_timeout, events_tx, close_rx));

        Self {
            session,
            close_tx: Some(close_tx),
            task,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Close the socket and wait for the task to wind down
    pub async fn close(self) {
        let SessionChannel {
            session,
            close_tx,
            task,
        } = self;
        if let Some(close_tx) = close_tx {
            let _ = close_tx.send(());
        }
        if let Err(e) = task.await {
            tracing::warn!("Channel task for session {} failed: {}", session, e);
        }
    }
}

struct Emitter {
    session: SessionId,
    events_tx: mpsc::UnboundedSender<SessionMessage>,
}

impl Emitter {
    /// False once the owner has gone away
    fn emit(&self, event: ChannelEvent) -> bool {
        self.events_tx
            .send(SessionMessage {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

async fn run_channel(
    url: Url,
    session: SessionId,
    idle_timeout: Option<Duration>,
    events_tx: mpsc::UnboundedSender<SessionMessage>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let emitter = Emitter { session, events_tx };

    let mut ws = tokio::select! {
        _ = &mut close_rx => {
            tracing::debug!("Session {} closed before connecting", session);
            return;
        }
        connected = with_idle_timeout(idle_timeout, connect_async(url.as_str())) => match connected {
            Some(Ok((ws, _))) => ws,
            Some(Err(e)) => {
                emitter.emit(ChannelEvent::TransportFailed { reason: e.to_string() });
                return;
            }
            None => {
                emitter.emit(ChannelEvent::TimedOut);
                return;
            }
        }
    };

    tracing::info!("Validation channel connected for session {}", session);
    if !emitter.emit(ChannelEvent::Opened) {
        let _ = ws.close(None).await;
        return;
    }

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                tracing::debug!("Closing channel for session {} on request", session);
                let _ = ws.close(None).await;
                return;
            }

            frame = with_idle_timeout(idle_timeout, ws.next()) => {
                let Some(frame) = frame else {
                    tracing::warn!("No frame for session {} within {:?}", session, idle_timeout);
                    emitter.emit(ChannelEvent::TimedOut);
                    let _ = ws.close(None).await;
                    return;
                };

                match handle_frame(session, frame) {
                    FrameOutcome::Event(event) => {
                        let terminal = event.is_terminal();
                        let delivered = emitter.emit(ChannelEvent::Event(event));
                        if terminal || !delivered {
                            let _ = ws.close(None).await;
                            tracing::debug!("Channel for session {} closed after terminal event", session);
                            return;
                        }
                    }
                    FrameOutcome::Skip => {}
                    FrameOutcome::Failed(reason) => {
                        emitter.emit(ChannelEvent::TransportFailed { reason });
                        return;
                    }
                }
            }
        }
    }
}

enum FrameOutcome {
    Event(SessionEvent),
    Skip,
    Failed(String),
}

fn handle_frame(
    session: SessionId,
    frame: Option<Result<Message, tungstenite::Error>>,
) -> FrameOutcome {
    match frame {
        Some(Ok(Message::Text(text))) => {
            tracing::trace!("Session {} received {} chars", session, text.len());
            match decode(&text) {
                Ok(event) => FrameOutcome::Event(event),
                Err(DecodeError::Malformed(e)) => {
                    tracing::warn!("Dropping malformed message on session {}: {}", session, e);
                    FrameOutcome::Skip
                }
                Err(DecodeError::Unrecognized) => {
                    tracing::warn!("Dropping unrecognized message on session {}: {}", session, text);
                    FrameOutcome::Skip
                }
            }
        }
        Some(Ok(Message::Close(_))) | None => {
            tracing::warn!("Server closed channel for session {} before a result", session);
            FrameOutcome::Failed("connection closed before a result".to_string())
        }
        Some(Ok(Message::Binary(_)))
        | Some(Ok(Message::Ping(_)))
        | Some(Ok(Message::Pong(_)))
        | Some(Ok(Message::Frame(_))) => FrameOutcome::Skip,
        Some(Err(e)) => {
            tracing::error!("WebSocket error for session {}: {}", session, e);
            FrameOutcome::Failed(e.to_string())
        }
    }
}

/// `None` when the window elapsed first
async fn with_idle_timeout<F: std::future::Future>(
    window: Option<Duration>,
    fut: F,
) -> Option<F::Output> {
    match window {
        Some(window) => tokio::time::timeout(window, fut).await.ok(),
        None => Some(fut.await),
    }
}
