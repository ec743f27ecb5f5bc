//! Character card import: PNG metadata extraction, schema normalization, and
//! the world-book store imported lorebooks are merged into.

pub mod card;
pub mod loader;
pub mod normalize;
pub mod png_text;
pub mod worldbook;

#[cfg(test)]
pub(crate) mod test_helpers;
#[cfg(test)]
mod tests_integration;

// Re-exports for internal module use
pub use card::{ImportedCard, LoreEntry, LorebookId, NormalizedCharacter, NormalizedLorebook};
pub use loader::{decode_source, load_card_file, CardLoadError, CharacterCardSource, MediaType};
pub use normalize::{normalize, CardNormalizer, NormalizeError};
pub use png_text::extract_card_text;
