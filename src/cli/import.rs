use std::error::Error;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::character::card::ImportedCard;
use crate::character::loader::{load_card_file, MediaType};
use crate::character::normalize::CardNormalizer;
use crate::character::worldbook::WorldBookStore;
use crate::core::config::data::path_display;

/// Where an imported lorebook should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldBookTarget {
    Skip,
    File(PathBuf),
}

/// Decode `file`, merge its lorebook into the world book, and return the
/// record with `lorebookRef` pointing at the stored category.
pub fn import_card(
    file: &Path,
    mime: Option<&str>,
    target: &WorldBookTarget,
) -> Result<ImportedCard, Box<dyn Error>> {
    let media = match mime {
        Some(mime) => Some(
            MediaType::from_mime(mime).ok_or_else(|| format!("Unsupported MIME type: {mime}"))?,
        ),
        None => None,
    };

    let mut normalizer = CardNormalizer::new();
    let mut imported = load_card_file(file, media, &mut normalizer)?;

    let stored = match (&imported.lorebook, target) {
        (Some(lorebook), WorldBookTarget::File(path)) => {
            let store = WorldBookStore::new(path);
            let id = store.import_lorebook(lorebook)?;
            info!(%id, path = %path_display(store.path()), "lorebook merged into world book");
            eprintln!(
                "📖 Imported lorebook '{}' with {} entries into {}",
                lorebook.name,
                lorebook.entries.len(),
                path_display(store.path())
            );
            Some(id)
        }
        _ => None,
    };
    if let Some(id) = stored {
        imported.relink_lorebook(id);
    }

    Ok(imported)
}

/// Run the `import` subcommand and print the record as JSON on stdout.
pub fn run_import(
    file: &Path,
    mime: Option<&str>,
    target: &WorldBookTarget,
) -> Result<(), Box<dyn Error>> {
    let imported = import_card(file, mime, target)?;
    println!("{}", serde_json::to_string_pretty(&imported)?);
    eprintln!(
        "✅ Imported character '{}'",
        imported.character.display_name
    );
    Ok(())
}
