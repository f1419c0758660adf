use std::fmt;
use uuid::Uuid;

use super::deck::{self, DeckIdentifier};
use super::event::{ProgressUpdate, SessionEvent};
use super::report::ValidationReport;

pub const INITIAL_STATUS: &str = "Initializing...";
pub const CONNECTIVITY_FAILURE: &str = "Connection to validation server failed.";
pub const TIMEOUT_FAILURE: &str = "Validation server stopped responding.";

/// Tag minted per submission; every channel message carries the tag of the
/// session that opened the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Everything a session channel can report to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Event(SessionEvent),
    TransportFailed { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionMessage {
    pub session: SessionId,
    pub event: ChannelEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Connecting {
        session: SessionId,
        deck: DeckIdentifier,
    },
    Active {
        session: SessionId,
        deck: DeckIdentifier,
        status: String,
        progress: Option<(usize, usize)>,
    },
    Settled(Box<ValidationReport>),
    Failed(String),
}

impl SessionState {
    /// Session currently allowed to mutate state, if any
    fn live_session(&self) -> Option<SessionId> {
        match self {
            SessionState::Connecting { session, .. } | SessionState::Active { session, .. } => {
                Some(*session)
            }
            _ => None,
        }
    }
}

/// A submission the caller must open a channel for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub session: SessionId,
    pub deck: DeckIdentifier,
}

/// Single-owner validation state machine.
///
/// Holds no I/O; the owner opens the channel named by [`Submission`] and feeds
/// every [`SessionMessage`] back through [`SessionController::apply`].
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Connecting or Active; submit is inert while busy
    pub fn is_busy(&self) -> bool {
        self.state.live_session().is_some()
    }

    /// Start a session from free-form input.
    ///
    /// Returns `None` without touching state when the input holds no deck
    /// identifier or a session is already in flight.
    pub fn submit(&mut self, raw: &str) -> Option<Submission> {
        if self.is_busy() {
            tracing::debug!("Submit ignored, session already in flight");
            return None;
        }

        let deck = match deck::normalize(raw) {
            Ok(deck) => deck,
            Err(e) => {
                tracing::debug!("Submit ignored: {}", e);
                return None;
            }
        };

        let session = SessionId::new();
        tracing::info!("Starting session {} for deck {}", session, deck);
        self.state = SessionState::Connecting {
            session,
            deck: deck.clone(),
        };
        Some(Submission { session, deck })
    }

    /// Apply a channel message. Returns true when state changed.
    pub fn apply(&mut self, message: SessionMessage) -> bool {
        if self.state.live_session() != Some(message.session) {
            tracing::debug!(
                "Dropping {:?} from stale session {}",
                message.event,
                message.session
            );
            return false;
        }

        let current = std::mem::replace(&mut self.state, SessionState::Idle);
        let (next, changed) = transition(current, message.event);
        self.state = next;
        changed
    }

    /// Status line shown while busy
    pub fn status(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connecting { .. } => Some("Connecting to validation server..."),
            SessionState::Active { status, .. } => Some(status.as_str()),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match &self.state {
            SessionState::Settled(report) => Some(&**report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

fn transition(state: SessionState, event: ChannelEvent) -> (SessionState, bool) {
    match (state, event) {
        (SessionState::Connecting { session, deck }, ChannelEvent::Opened) => (
            SessionState::Active {
                session,
                deck,
                status: INITIAL_STATUS.to_string(),
                progress: None,
            },
            true,
        ),

        // Servers may start streaming before the open notification lands
        (
            SessionState::Connecting { session, deck },
            ChannelEvent::Event(SessionEvent::Progress(update)),
        ) => (progressed(session, deck, update), true),

        (
            SessionState::Active { session, deck, .. },
            ChannelEvent::Event(SessionEvent::Progress(update)),
        ) => (progressed(session, deck, update), true),

        (_, ChannelEvent::Event(SessionEvent::Result(report))) => {
            tracing::info!(
                "Session settled: {} by {} is {}",
                report.name,
                report.author,
                report.verdict()
            );
            (SessionState::Settled(report), true)
        }

        (_, ChannelEvent::Event(SessionEvent::Error { message })) => {
            tracing::warn!("Validation job reported error: {}", message);
            (SessionState::Failed(message), true)
        }

        (_, ChannelEvent::TransportFailed { reason }) => {
            tracing::error!("Validation channel failed: {}", reason);
            (SessionState::Failed(CONNECTIVITY_FAILURE.to_string()), true)
        }

        (_, ChannelEvent::TimedOut) => {
            tracing::warn!("Validation channel timed out");
            (SessionState::Failed(TIMEOUT_FAILURE.to_string()), true)
        }

        // Duplicate open notification on an already active session
        (state, _) => (state, false),
    }
}

fn progressed(session: SessionId, deck: DeckIdentifier, update: ProgressUpdate) -> SessionState {
    SessionState::Active {
        session,
        deck,
        progress: update.counter(),
        status: update.status,
    }
}
