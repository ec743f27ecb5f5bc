use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an imported lorebook, as stored on the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LorebookId(pub u64);

impl fmt::Display for LorebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Character fields after alias resolution and defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCharacter {
    pub display_name: String,
    /// Persona text followed by the `[Scenario]` block.
    pub description: String,
    pub greeting: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lorebook_ref: Option<LorebookId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoreEntry {
    pub trigger_keys: Vec<String>,
    pub content: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLorebook {
    pub id: LorebookId,
    pub name: String,
    pub entries: Vec<LoreEntry>,
}

/// Result of one import: the character plus its embedded lorebook, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedCard {
    pub character: NormalizedCharacter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lorebook: Option<NormalizedLorebook>,
}

impl ImportedCard {
    /// Point the character at a lorebook id assigned by the store.
    pub fn relink_lorebook(&mut self, id: LorebookId) {
        if let Some(lorebook) = &mut self.lorebook {
            lorebook.id = id;
            self.character.lorebook_ref = Some(id);
        }
    }
}

// Loosely typed views of the card JSON. Every key any known card writer uses
// is captured separately; `null` and missing both land as `None`.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCard {
    pub name: Option<Value>,
    pub char_name: Option<Value>,
    pub description: Option<Value>,
    pub persona: Option<Value>,
    pub personality: Option<Value>,
    pub scenario: Option<Value>,
    pub first_mes: Option<Value>,
    pub greeting: Option<Value>,
    pub character_book: Option<Value>,
    pub lorebook: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLorebook {
    pub entries: Option<Value>,
    pub entries_list: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLoreEntry {
    pub keys: Option<Value>,
    pub key: Option<Value>,
    pub content: Option<Value>,
    pub enabled: Option<Value>,
}

/// Text value of a loose field. Empty strings count as missing.
pub(crate) fn loose_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// First candidate that yields text, in priority order.
pub(crate) fn first_text(candidates: &[&Option<Value>]) -> Option<String> {
    candidates.iter().find_map(|value| loose_text(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_card_treats_null_as_missing() {
        let raw: RawCard = serde_json::from_value(json!({
            "name": null,
            "char_name": "Alias",
            "unrelated": [1, 2, 3]
        }))
        .unwrap();
        assert!(raw.name.is_none());
        assert_eq!(first_text(&[&raw.name, &raw.char_name]).as_deref(), Some("Alias"));
    }

    #[test]
    fn loose_text_accepts_numbers_and_skips_empty() {
        assert_eq!(loose_text(&Some(json!(42))).as_deref(), Some("42"));
        assert_eq!(loose_text(&Some(json!(""))), None);
        assert_eq!(loose_text(&Some(json!({"a": 1}))), None);
        assert_eq!(loose_text(&None), None);
    }

    #[test]
    fn character_serializes_with_camel_case_keys() {
        let character = NormalizedCharacter {
            display_name: "Alice".into(),
            description: "d".into(),
            greeting: "hi".into(),
            lorebook_ref: None,
        };
        let value = serde_json::to_value(&character).unwrap();
        assert_eq!(value["displayName"], "Alice");
        assert!(value.get("lorebookRef").is_none());

        let linked = NormalizedCharacter {
            lorebook_ref: Some(LorebookId(7)),
            ..character
        };
        assert_eq!(serde_json::to_value(&linked).unwrap()["lorebookRef"], 7);
    }

    #[test]
    fn relink_updates_both_sides() {
        let mut card = ImportedCard {
            character: NormalizedCharacter {
                display_name: "A".into(),
                description: String::new(),
                greeting: "hi".into(),
                lorebook_ref: Some(LorebookId(1)),
            },
            lorebook: Some(NormalizedLorebook {
                id: LorebookId(1),
                name: "A的世界书 (导入)".into(),
                entries: Vec::new(),
            }),
        };
        card.relink_lorebook(LorebookId(9));
        assert_eq!(card.character.lorebook_ref, Some(LorebookId(9)));
        assert_eq!(card.lorebook.as_ref().map(|l| l.id), Some(LorebookId(9)));
    }

    #[test]
    fn relink_without_lorebook_is_a_no_op() {
        let mut card = ImportedCard {
            character: NormalizedCharacter {
                display_name: "A".into(),
                description: String::new(),
                greeting: "hi".into(),
                lorebook_ref: None,
            },
            lorebook: None,
        };
        card.relink_lorebook(LorebookId(9));
        assert_eq!(card.character.lorebook_ref, None);
    }
}
