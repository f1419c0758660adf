use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::report::ValidationReport;

/// Inbound message from the validation job, decoded at the channel boundary
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Progress(ProgressUpdate),
    Result(Box<ValidationReport>),
    Error { message: String },
}

impl SessionEvent {
    /// Result and Error end a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Result(_) | SessionEvent::Error { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressUpdate {
    pub status: String,
    #[serde(default)]
    pub validator: Option<String>,
    #[serde(default)]
    pub completed: Option<usize>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl ProgressUpdate {
    /// Completed and total validators, when the server reports both
    pub fn counter(&self) -> Option<(usize, usize)> {
        match (self.completed, self.total) {
            (Some(done), Some(total)) if total > 0 => Some((done.min(total), total)),
            _ => None,
        }
    }
}

/// Shown when the job reports an error without saying what went wrong
pub const GENERIC_FAILURE: &str = "Validation failed.";

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default, deserialize_with = "message_or_empty")]
    message: String,
}

fn message_or_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unrecognized message shape")]
    Unrecognized,
}

/// Decode one text frame into a [`SessionEvent`].
///
/// Shapes are checked in order: `type == "progress"`, a present `is_valid`
/// field, then `type == "error"`. Anything else is [`DecodeError::Unrecognized`].
pub fn decode(text: &str) -> Result<SessionEvent, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value.get("type").and_then(Value::as_str);

    if kind == Some("progress") {
        let update: ProgressUpdate = serde_json::from_value(value)?;
        return Ok(SessionEvent::Progress(update));
    }

    if value.get("is_valid").is_some() {
        let report: ValidationReport = serde_json::from_value(value)?;
        return Ok(SessionEvent::Result(Box::new(report)));
    }

    if kind == Some("error") {
        let payload: ErrorPayload = serde_json::from_value(value)?;
        let message = if payload.message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            payload.message
        };
        return Ok(SessionEvent::Error { message });
    }

    Err(DecodeError::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_progress() {
        let event = decode(
            r#"{"type":"progress","validator":"Gamechangers","completed":2,"total":6,"status":"Completed Gamechangers"}"#,
        )
        .unwrap();

        match event {
            SessionEvent::Progress(update) => {
                assert_eq!(update.status, "Completed Gamechangers");
                assert_eq!(update.validator.as_deref(), Some("Gamechangers"));
                assert_eq!(update.counter(), Some((2, 6)));
            }
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bare_progress() {
        let event = decode(r#"{"type":"progress","status":"Fetching deck..."}"#).unwrap();
        let SessionEvent::Progress(update) = event else {
            panic!("expected progress");
        };
        assert_eq!(update.status, "Fetching deck...");
        assert_eq!(update.counter(), None);
        assert!(!SessionEvent::Progress(update).is_terminal());
    }

    #[test]
    fn test_decode_result() {
        let event = decode(
            r#"{"is_valid":true,"name":"My Deck","author":"alice","non_land_tutors":[]}"#,
        )
        .unwrap();

        assert!(event.is_terminal());
        let SessionEvent::Result(report) = event else {
            panic!("expected result");
        };
        assert!(report.is_valid);
        assert_eq!(report.name, "My Deck");
    }

    #[test]
    fn test_decode_error() {
        let event = decode(r#"{"type":"error","message":"Deck not found"}"#).unwrap();
        assert_eq!(
            event,
            SessionEvent::Error {
                message: "Deck not found".to_string()
            }
        );
        assert!(event.is_terminal());
    }

    #[test]
    fn test_error_without_message_gets_fallback() {
        for text in [
            r#"{"type":"error"}"#,
            r#"{"type":"error","message":null}"#,
            r#"{"type":"error","message":"  "}"#,
        ] {
            assert_eq!(
                decode(text).unwrap(),
                SessionEvent::Error {
                    message: GENERIC_FAILURE.to_string()
                },
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_result_with_non_boolean_verdict_settles_invalid() {
        for text in [
            r#"{"is_valid":null,"name":"Odd Deck","author":"carol"}"#,
            r#"{"is_valid":"yes","name":"Odd Deck","author":"carol"}"#,
        ] {
            let SessionEvent::Result(report) = decode(text).unwrap() else {
                panic!("expected result for {}", text);
            };
            assert!(!report.is_valid);
            assert_eq!(report.name, "Odd Deck");
        }
    }

    #[test]
    fn test_decode_unparseable_text() {
        assert!(matches!(decode("not json {"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_unknown_shape() {
        assert!(matches!(
            decode(r#"{"type":"complete","status":"{}"}"#),
            Err(DecodeError::Unrecognized)
        ));
        assert!(matches!(decode("[1,2,3]"), Err(DecodeError::Unrecognized)));
    }

    #[test]
    fn test_progress_missing_status_is_malformed() {
        assert!(matches!(
            decode(r#"{"type":"progress"}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_counter_clamps_overshoot() {
        let update = ProgressUpdate {
            status: String::new(),
            validator: None,
            completed: Some(9),
            total: Some(6),
        };
        assert_eq!(update.counter(), Some((6, 6)));
    }
}
