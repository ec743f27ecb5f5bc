// Integration tests for character card workflows
// These tests verify end-to-end functionality across multiple modules

#[cfg(test)]
mod integration_tests {

    use crate::character::card::{LoreEntry, NormalizedCharacter};
    use crate::character::loader::{decode_source, CharacterCardSource, MediaType};
    use crate::character::normalize::CardNormalizer;
    use crate::character::png_text::extract_card_text;
    use crate::character::test_helpers::helpers::{card_png, detective_card, detective_card_v2};
    use crate::character::worldbook::WorldBookStore;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn import(media: MediaType, bytes: Vec<u8>) -> crate::character::card::ImportedCard {
        let source = CharacterCardSource::from_bytes(media, bytes).unwrap();
        decode_source(source, &mut CardNormalizer::new()).unwrap()
    }

    #[test]
    fn test_detective_card_from_json() {
        let imported = import(MediaType::Json, detective_card().to_string().into_bytes());

        let lorebook = imported.lorebook.expect("embedded lorebook");
        assert_eq!(
            imported.character,
            NormalizedCharacter {
                display_name: "沈墨".to_string(),
                description: "\n\n[Scenario]: ".to_string(),
                greeting: "你好".to_string(),
                lorebook_ref: Some(lorebook.id),
            }
        );
        assert_eq!(
            lorebook.entries,
            vec![LoreEntry {
                trigger_keys: vec!["书房".to_string()],
                content: "案情".to_string(),
                enabled: true,
            }]
        );
        assert_eq!(lorebook.name, "沈墨的世界书 (导入)");
        assert!(!lorebook.id.to_string().is_empty());
    }

    #[test]
    fn test_png_and_json_paths_agree() {
        let from_json = import(MediaType::Json, detective_card().to_string().into_bytes());
        let from_png = import(MediaType::Png, card_png(&detective_card()));
        let from_v2_png = import(MediaType::Png, card_png(&detective_card_v2()));

        assert_eq!(from_json.character.display_name, from_png.character.display_name);
        assert_eq!(from_json.character.description, from_png.character.description);
        assert_eq!(from_png.character.greeting, from_v2_png.character.greeting);
        assert_eq!(
            from_json.lorebook.map(|l| l.entries),
            from_v2_png.lorebook.map(|l| l.entries)
        );
    }

    #[test]
    fn test_png_round_trip_preserves_json() {
        let card = json!({
            "name": "Ada",
            "description": "多行\n描述",
            "tags": ["a", "b"],
            "nested": {"depth": [1, {"two": 2}]}
        });
        let text = extract_card_text(&card_png(&card)).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn test_import_without_lore_has_no_ref() {
        let imported = import(
            MediaType::Json,
            json!({"char_name": "Bob", "personality": "calm", "scenario": "dock"})
                .to_string()
                .into_bytes(),
        );
        assert!(imported.lorebook.is_none());
        assert!(imported.character.lorebook_ref.is_none());
        assert_eq!(imported.character.description, "calm\n\n[Scenario]: dock");
        assert_eq!(imported.character.greeting, "你好");
    }

    #[test]
    fn test_imports_accumulate_in_world_book() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorldBookStore::new(temp_dir.path().join("worldbook.json"));
        let mut normalizer = CardNormalizer::new();

        let mut ids = Vec::new();
        for card in [detective_card(), detective_card_v2()] {
            let source = CharacterCardSource::Png {
                bytes: card_png(&card),
            };
            let mut imported = decode_source(source, &mut normalizer).unwrap();
            let lorebook = imported.lorebook.clone().unwrap();
            let id = store.import_lorebook(&lorebook).unwrap();
            imported.relink_lorebook(id);
            assert_eq!(imported.character.lorebook_ref, Some(id));
            ids.push(id);
        }

        let book = store.load().unwrap();
        assert_eq!(book.categories.len(), 2);
        assert!(ids[0] < ids[1]);
        for id in ids {
            let category = book.category(id).unwrap();
            assert_eq!(category.entries.len(), 1);
            assert_eq!(category.entries[0].content, "案情");
        }
    }
}
