use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// `tracing_subscriber` writer that turns formatted lines into [`LogEntry`]
/// values for the terminal UI log panel, keeping the alternate screen clean
#[derive(Clone)]
pub struct LogCapture {
    sender: mpsc::UnboundedSender<LogEntry>,
}

impl LogCapture {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogEntry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (LogCapture { sender }, receiver)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            if let Some(entry) = parse_log_line(line) {
                let _ = self.sender.send(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Parse `<rfc3339> <LEVEL> <target>: <message>` as written by the fmt layer
/// with ANSI disabled. Lines in any other shape become Info entries.
fn parse_log_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let plain = || LogEntry {
        level: LogLevel::Info,
        message: line.to_string(),
        timestamp: chrono::Utc::now(),
    };

    let Some((timestamp_str, rest)) = line.split_once(char::is_whitespace) else {
        return Some(plain());
    };
    let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(timestamp_str) else {
        return Some(plain());
    };

    let rest = rest.trim_start();
    let (level, body) = match rest.split_once(char::is_whitespace) {
        Some((level_str, body)) => match LogLevel::parse(level_str) {
            Some(level) => (level, body.trim_start()),
            None => (LogLevel::Info, rest),
        },
        None => (LogLevel::parse(rest).unwrap_or(LogLevel::Info), ""),
    };

    // Drop the `module::path: ` target prefix
    let message = match body.split_once(": ") {
        Some((target, message)) if !target.contains(' ') => message,
        _ => body,
    };

    Some(LogEntry {
        level,
        message: message.to_string(),
        timestamp: timestamp.with_timezone(&chrono::Utc),
    })
}
