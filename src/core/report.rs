use serde::Deserialize;

/// A single rule infraction: the offending card(s) plus an optional label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationEntry {
    pub subject: String,
    pub category: Option<String>,
}

impl ViolationEntry {
    fn new(subject: impl Into<String>, category: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            subject: subject.into(),
            category: if category.is_empty() { None } else { Some(category) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeckCard {
    pub card: String,
    pub quantity: u32,
}

/// Completed validation verdict as produced by the remote rule engine.
///
/// Decoded from the snake-case wire payload and normalised so every violation
/// list holds [`ViolationEntry`] values regardless of its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ReportPayload")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub name: String,
    pub author: String,
    pub non_land_tutors: Vec<ViolationEntry>,
    pub mass_land_denial_cards: Vec<ViolationEntry>,
    pub commander_tutors: Vec<ViolationEntry>,
    pub two_card_combos: Vec<ViolationEntry>,
    pub gamechangers: Vec<ViolationEntry>,
    pub infinite_turns_combos: Vec<ViolationEntry>,
    /// Every combo the engine found, not only the banned ones
    pub combos: Vec<ViolationEntry>,
    pub deck_list: Option<Vec<DeckCard>>,
}

/// Wire shape of a report; field names must match the service exactly
#[derive(Debug, Deserialize)]
struct ReportPayload {
    #[serde(deserialize_with = "strict_true")]
    is_valid: bool,
    #[serde(default)]
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    non_land_tutors: Option<Vec<(String, String)>>,
    #[serde(default)]
    mass_land_denial_cards: Option<Vec<(String, String)>>,
    #[serde(default)]
    commander_tutors: Option<Vec<String>>,
    #[serde(default)]
    two_card_combos: Option<Vec<(Vec<String>, String)>>,
    #[serde(default)]
    gamechangers: Option<Vec<String>>,
    #[serde(default)]
    infinite_turns_combos: Option<Vec<Vec<String>>>,
    #[serde(default)]
    combos: Option<Vec<(Vec<String>, String)>>,
    #[serde(default)]
    deck_list: Option<Vec<DeckCard>>,
}

/// Any verdict other than `true` counts as invalid
fn strict_true<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value == serde_json::Value::Bool(true))
}

const CARD_JOINER: &str = " + ";

fn labelled(items: Option<Vec<(String, String)>>) -> Vec<ViolationEntry> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|(subject, category)| ViolationEntry::new(subject, category))
        .collect()
}

fn tagged(items: Option<Vec<String>>, category: &str) -> Vec<ViolationEntry> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|subject| ViolationEntry::new(subject, category))
        .collect()
}

fn joined_labelled(items: Option<Vec<(Vec<String>, String)>>) -> Vec<ViolationEntry> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|(cards, category)| ViolationEntry::new(cards.join(CARD_JOINER), category))
        .collect()
}

impl From<ReportPayload> for ValidationReport {
    fn from(payload: ReportPayload) -> Self {
        Self {
            is_valid: payload.is_valid,
            name: payload.name,
            author: payload.author,
            non_land_tutors: labelled(payload.non_land_tutors),
            mass_land_denial_cards: labelled(payload.mass_land_denial_cards),
            commander_tutors: tagged(payload.commander_tutors, "Commander Tutor"),
            two_card_combos: joined_labelled(payload.two_card_combos),
            gamechangers: tagged(payload.gamechangers, "Game Changer"),
            infinite_turns_combos: payload
                .infinite_turns_combos
                .unwrap_or_default()
                .into_iter()
                .map(|cards| ViolationEntry::new(cards.join(CARD_JOINER), "Infinite Turns"))
                .collect(),
            combos: joined_labelled(payload.combos),
            deck_list: payload.deck_list,
        }
    }
}

/// A titled, render-ready violation list
#[derive(Debug, Clone, Copy)]
pub struct ReportSection<'a> {
    pub title: &'static str,
    pub entries: &'a [ViolationEntry],
    /// Informational sections do not represent rule infractions
    pub informational: bool,
}

impl ValidationReport {
    /// Non-empty sections in display order. Empty lists are omitted.
    pub fn sections(&self) -> Vec<ReportSection<'_>> {
        let violations = [
            ("Non-Land Tutors", &self.non_land_tutors),
            ("Mass Land Denial", &self.mass_land_denial_cards),
            ("Commander Tutors", &self.commander_tutors),
            ("Two Card Combos", &self.two_card_combos),
            ("Game Changers", &self.gamechangers),
            ("Infinite Turns", &self.infinite_turns_combos),
        ];

        let mut sections: Vec<ReportSection<'_>> = violations
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(title, entries)| ReportSection {
                title,
                entries,
                informational: false,
            })
            .collect();

        if !self.combos.is_empty() {
            sections.push(ReportSection {
                title: "All Combos",
                entries: &self.combos,
                informational: true,
            });
        }

        sections
    }

    pub fn violation_count(&self) -> usize {
        self.sections()
            .iter()
            .filter(|s| !s.informational)
            .map(|s| s.entries.len())
            .sum()
    }

    pub fn verdict(&self) -> &'static str {
        if self.is_valid {
            "VALID"
        } else {
            "INVALID"
        }
    }

    /// Total number of cards in the deck list, if one was sent
    pub fn card_count(&self) -> Option<u32> {
        self.deck_list
            .as_ref()
            .map(|cards| cards.iter().map(|c| c.quantity).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> serde_json::Value {
        json!({
            "is_valid": false,
            "name": "Krenko Goblins",
            "author": "bob",
            "non_land_tutors": [["Demonic Tutor", "Search for any card"]],
            "mass_land_denial_cards": [["Armageddon", "Destroys all lands"]],
            "commander_tutors": ["Worldly Tutor"],
            "two_card_combos": [[["Thassa's Oracle", "Demonic Consultation"], "Win the game"]],
            "gamechangers": ["Rhystic Study"],
            "infinite_turns_combos": [["Time Sieve", "Thopter Assembly", "Sai"]],
            "combos": [[["Kiki-Jiki", "Zealous Conscripts"], "Infinite hasty tokens"]],
            "deck_list": [{"card": "Mountain", "quantity": 30}, {"card": "Sol Ring", "quantity": 1}]
        })
    }

    #[test]
    fn test_full_payload_maps_every_list() {
        let report: ValidationReport = serde_json::from_value(full_payload()).unwrap();

        assert!(!report.is_valid);
        assert_eq!(report.name, "Krenko Goblins");
        assert_eq!(report.author, "bob");
        assert_eq!(
            report.non_land_tutors,
            vec![ViolationEntry {
                subject: "Demonic Tutor".into(),
                category: Some("Search for any card".into())
            }]
        );
        assert_eq!(report.commander_tutors[0].category.as_deref(), Some("Commander Tutor"));
        assert_eq!(
            report.two_card_combos[0].subject,
            "Thassa's Oracle + Demonic Consultation"
        );
        assert_eq!(report.gamechangers[0].category.as_deref(), Some("Game Changer"));
        assert_eq!(report.infinite_turns_combos[0].subject, "Time Sieve + Thopter Assembly + Sai");
        assert_eq!(report.card_count(), Some(31));
    }

    #[test]
    fn test_missing_and_null_lists_are_empty() {
        let report: ValidationReport = serde_json::from_value(json!({
            "is_valid": true,
            "name": "My Deck",
            "author": "alice",
            "non_land_tutors": [],
            "gamechangers": null
        }))
        .unwrap();

        assert!(report.is_valid);
        assert!(report.sections().is_empty());
        assert_eq!(report.violation_count(), 0);
        assert_eq!(report.deck_list, None);
        assert_eq!(report.card_count(), None);
    }

    #[test]
    fn test_sections_keep_display_order_and_skip_empty() {
        let report: ValidationReport = serde_json::from_value(full_payload()).unwrap();
        let titles: Vec<_> = report.sections().iter().map(|s| s.title).collect();

        assert_eq!(
            titles,
            vec![
                "Non-Land Tutors",
                "Mass Land Denial",
                "Commander Tutors",
                "Two Card Combos",
                "Game Changers",
                "Infinite Turns",
                "All Combos",
            ]
        );
        assert_eq!(report.violation_count(), 6);
    }

    #[test]
    fn test_empty_label_becomes_none() {
        let report: ValidationReport = serde_json::from_value(json!({
            "is_valid": false,
            "name": "x",
            "author": "y",
            "non_land_tutors": [["Vampiric Tutor", ""]]
        }))
        .unwrap();

        assert_eq!(report.non_land_tutors[0].category, None);
    }

    #[test]
    fn test_missing_verdict_is_rejected() {
        let result = serde_json::from_value::<ValidationReport>(json!({"name": "x"}));
        assert!(result.is_err());
    }
}
