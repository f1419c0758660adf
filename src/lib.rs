// deckcheck library
// Terminal client for a Commander deck validation service

pub mod cli;
pub mod client;
pub mod core;
pub mod utils;

// Re-export commonly used types
pub use core::{Config, SessionController, SessionState, ValidationReport};
pub use client::{HistoryClient, SessionDriver};

// Error handling
pub use anyhow::{Result, Error};
