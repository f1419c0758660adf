use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Raised when the submitted text cannot yield a deck identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no deck identifier in input")]
pub struct InvalidInput;

/// Opaque token the validation service uses to locate a deck
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeckIdentifier(String);

impl DeckIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn deck_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"decks/([A-Za-z0-9_-]+)").expect("deck url pattern is valid"))
}

/// Extract a deck identifier from a raw token or a deck URL.
///
/// Text containing `decks/<token>` yields `<token>`; any other non-empty text
/// is taken verbatim after trimming.
pub fn normalize(raw: &str) -> Result<DeckIdentifier, InvalidInput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput);
    }

    if let Some(token) = deck_url_pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
    {
        return Ok(DeckIdentifier(token.as_str().to_string()));
    }

    Ok(DeckIdentifier(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_token_is_identity() {
        assert_eq!(normalize("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize("  \tabc123 \n").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_moxfield_url_extracts_token() {
        let id = normalize("https://moxfield.com/decks/XYZ-9").unwrap();
        assert_eq!(id.as_str(), "XYZ-9");
    }

    #[test]
    fn test_url_with_trailing_segments_and_query() {
        let id = normalize("https://www.moxfield.com/decks/a_B-c9/primer?tab=1").unwrap();
        assert_eq!(id.as_str(), "a_B-c9");
    }

    #[test]
    fn test_schemeless_url() {
        let id = normalize("moxfield.com/decks/Qz_1").unwrap();
        assert_eq!(id.as_str(), "Qz_1");
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert_eq!(normalize(""), Err(InvalidInput));
        assert_eq!(normalize("   \t\n"), Err(InvalidInput));
    }

    #[test]
    fn test_url_without_deck_segment_is_kept_verbatim() {
        let id = normalize(" https://moxfield.com/users/alice ").unwrap();
        assert_eq!(id.as_str(), "https://moxfield.com/users/alice");
    }

    #[test]
    fn test_display_matches_token() {
        let id = normalize("decks/tok").unwrap();
        assert_eq!(id.to_string(), "tok");
    }
}
