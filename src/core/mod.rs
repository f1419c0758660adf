pub mod config;
pub mod deck;
pub mod event;
pub mod history;
pub mod report;
pub mod session;

pub use config::Config;
pub use deck::{normalize, DeckIdentifier, InvalidInput};
pub use event::{decode, DecodeError, ProgressUpdate, SessionEvent};
pub use history::{HistoryEntry, HistoryView};
pub use report::{DeckCard, ReportSection, ValidationReport, ViolationEntry};
pub use session::{
    ChannelEvent, SessionController, SessionId, SessionMessage, SessionState, Submission,
};
