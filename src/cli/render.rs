use std::fmt::Write;

use crate::core::{HistoryEntry, ValidationReport};

/// Plain-text report card for stdout
pub fn render_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    let mark = if report.is_valid { "✅" } else { "❌" };

    let _ = writeln!(out, "{} {} by {} [{}]", mark, report.name, report.author, report.verdict());

    let sections = report.sections();
    if sections.iter().all(|s| s.informational) {
        let _ = writeln!(out, "\nNo violations found.");
    }

    for section in sections {
        let icon = if section.informational { "ℹ️ " } else { "⚠️ " };
        let _ = writeln!(out, "\n{} {} ({})", icon, section.title, section.entries.len());
        for entry in section.entries {
            match &entry.category {
                Some(category) => {
                    let _ = writeln!(out, "   • {} - {}", entry.subject, category);
                }
                None => {
                    let _ = writeln!(out, "   • {}", entry.subject);
                }
            }
        }
    }

    if let Some(cards) = &report.deck_list {
        let _ = writeln!(out, "\n📋 Deck List ({} cards)", report.card_count().unwrap_or(0));
        for card in cards {
            let _ = writeln!(out, "   {:>2}x {}", card.quantity, card.card);
        }
    }

    out
}

/// One numbered line per stored report
pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history found.\n".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let mark = if entry.is_valid() { "✅" } else { "❌" };
        let _ = writeln!(out, "{:>3}. {} {} by {}", i + 1, mark, entry.name(), entry.author());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> ValidationReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_render_clean_report() {
        let out = render_report(&report(json!({"is_valid": true, "name": "My Deck", "author": "alice"})));
        assert!(out.starts_with("✅ My Deck by alice [VALID]"));
        assert!(out.contains("No violations found."));
    }

    #[test]
    fn test_render_violations() {
        let out = render_report(&report(json!({
            "is_valid": false,
            "name": "Bad Deck",
            "author": "bob",
            "two_card_combos": [[["Dramatic Reversal", "Isochron Scepter"], "Infinite mana"]],
            "deck_list": [{"card": "Island", "quantity": 12}]
        })));

        assert!(out.contains("[INVALID]"));
        assert!(out.contains("Two Card Combos (1)"));
        assert!(out.contains("   • Dramatic Reversal + Isochron Scepter - Infinite mana"));
        assert!(out.contains("   12x Island"));
        assert!(!out.contains("No violations found."));
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "No history found.\n");
    }

    #[test]
    fn test_render_history_numbers_entries() {
        let entries = vec![
            HistoryEntry::from(report(json!({"is_valid": true, "name": "A", "author": "x"}))),
            HistoryEntry::from(report(json!({"is_valid": false, "name": "B", "author": "y"}))),
        ];
        let out = render_history(&entries);
        assert_eq!(out, "  1. ✅ A by x\n  2. ❌ B by y\n");
    }
}
