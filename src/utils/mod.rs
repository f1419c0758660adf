pub mod log_capture;

pub use log_capture::{LogCapture, LogEntry, LogLevel};
