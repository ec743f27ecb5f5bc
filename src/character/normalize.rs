//! Projection of loosely structured card JSON onto [`NormalizedCharacter`] and
//! [`NormalizedLorebook`].
//!
//! Card writers disagree on key names (`name` vs `char_name`, `first_mes` vs
//! `greeting`, `character_book` vs `lorebook`, ...). Each logical field has a
//! fixed alias order; the first alias holding a non-empty value wins and a
//! default fills the gap otherwise. Nothing here fails on a missing field.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::character::card::{
    first_text, loose_text, ImportedCard, LoreEntry, LorebookId, NormalizedCharacter,
    NormalizedLorebook, RawCard, RawLoreEntry, RawLorebook,
};

/// Display name used when the card carries none.
pub const DEFAULT_NAME: &str = "导入角色";
/// Greeting used when the card carries none.
pub const DEFAULT_GREETING: &str = "你好";
/// Separator between the persona text and the scenario.
pub const SCENARIO_SEPARATOR: &str = "\n\n[Scenario]: ";
/// Suffix appended to the character name to name an imported lorebook.
pub const LOREBOOK_NAME_SUFFIX: &str = "的世界书 (导入)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The parsed document is not a JSON object.
    MalformedInput(&'static str),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MalformedInput(kind) => {
                write!(f, "card must be a JSON object, found {}", kind)
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Turns parsed card documents into normalized records.
///
/// The normalizer keeps the last lorebook id it handed out so that ids from
/// one normalizer are strictly increasing even within the same millisecond.
#[derive(Debug, Default)]
pub struct CardNormalizer {
    last_id: Option<u64>,
}

impl CardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one parsed card. V2/V3 cards wrapped in a `data` envelope are
    /// read from the envelope.
    pub fn normalize(&mut self, parsed: &Value) -> Result<ImportedCard, NormalizeError> {
        let card = unwrap_card_envelope(parsed);
        if !card.is_object() {
            return Err(NormalizeError::MalformedInput(json_kind(card)));
        }
        let raw =
            RawCard::deserialize(card).map_err(|_| NormalizeError::MalformedInput("object"))?;

        let display_name =
            first_text(&[&raw.name, &raw.char_name]).unwrap_or_else(|| DEFAULT_NAME.to_string());
        let persona = first_text(&[&raw.description, &raw.persona, &raw.personality])
            .unwrap_or_default();
        let scenario = loose_text(&raw.scenario).unwrap_or_default();
        let greeting = first_text(&[&raw.first_mes, &raw.greeting])
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        let lorebook = self.extract_lorebook(&raw, &display_name);

        let character = NormalizedCharacter {
            description: format!("{persona}{SCENARIO_SEPARATOR}{scenario}"),
            display_name,
            greeting,
            lorebook_ref: lorebook.as_ref().map(|book| book.id),
        };

        Ok(ImportedCard {
            character,
            lorebook,
        })
    }

    fn extract_lorebook(&mut self, raw: &RawCard, display_name: &str) -> Option<NormalizedLorebook> {
        let container = [&raw.character_book, &raw.lorebook]
            .into_iter()
            .find_map(|value| value.as_ref())?;
        let Value::Object(_) = container else {
            debug!("lore container is not an object, skipping lore extraction");
            return None;
        };

        let book = RawLorebook::deserialize(container).ok()?;
        let entries = match book.entries.as_ref().or(book.entries_list.as_ref()) {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                debug!("lore container has no entries, skipping lore extraction");
                return None;
            }
        };

        let entries: Vec<LoreEntry> = entries.iter().map(normalize_entry).collect();
        let id = self.next_lorebook_id();
        debug!(%id, entries = entries.len(), "extracted embedded lorebook");

        Some(NormalizedLorebook {
            id,
            name: format!("{display_name}{LOREBOOK_NAME_SUFFIX}"),
            entries,
        })
    }

    fn next_lorebook_id(&mut self) -> LorebookId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let id = match self.last_id {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_id = Some(id);
        LorebookId(id)
    }
}

/// Normalize with a throwaway [`CardNormalizer`].
pub fn normalize(parsed: &Value) -> Result<ImportedCard, NormalizeError> {
    CardNormalizer::new().normalize(parsed)
}

/// The object card fields live in: `data` for enveloped cards, else the
/// document itself.
pub fn unwrap_card_envelope(parsed: &Value) -> &Value {
    match parsed.get("data") {
        Some(data @ Value::Object(_)) => {
            debug!(
                spec = parsed.get("spec").and_then(|spec| spec.as_str()).unwrap_or("unknown"),
                "reading card fields from data envelope"
            );
            data
        }
        _ => parsed,
    }
}

fn normalize_entry(item: &Value) -> LoreEntry {
    let raw = if item.is_object() {
        RawLoreEntry::deserialize(item).unwrap_or_default()
    } else {
        RawLoreEntry::default()
    };

    LoreEntry {
        trigger_keys: trigger_keys(&raw),
        content: loose_text(&raw.content).unwrap_or_default(),
        // Only an explicit `false` disables an entry.
        enabled: !matches!(raw.enabled, Some(Value::Bool(false))),
    }
}

fn trigger_keys(raw: &RawLoreEntry) -> Vec<String> {
    let resolved = [&raw.keys, &raw.key].into_iter().find_map(|value| match value {
        Some(Value::Array(_)) => value.as_ref(),
        Some(Value::String(s)) if !s.is_empty() => value.as_ref(),
        _ => None,
    });

    match resolved {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| loose_text(&Some(item.clone())))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
