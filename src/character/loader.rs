use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::character::card::ImportedCard;
use crate::character::normalize::CardNormalizer;
use crate::character::png_text::{self, PngTextError, CHARA_KEYWORD};

/// Errors that can occur when loading character cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLoadError {
    /// File could not be found or read
    FileNotFound(String),
    /// Media type is neither PNG nor JSON
    UnsupportedType(String),
    /// JSON file is not valid UTF-8
    InvalidUtf8(String),
    /// JSON parsing failed
    InvalidJson(String),
    /// Bytes declared as PNG lack the PNG signature
    NotPng(String),
    /// PNG carries no card metadata
    MissingMetadata(String),
    /// Parsed document is not a card object
    Malformed(String),
}

impl CardLoadError {
    /// Prefix the message with the file it came from.
    fn in_file(self, path: &Path) -> Self {
        let at = |msg: String| format!("{}: {}", path.display(), msg);
        match self {
            CardLoadError::FileNotFound(msg) => CardLoadError::FileNotFound(at(msg)),
            CardLoadError::UnsupportedType(msg) => CardLoadError::UnsupportedType(at(msg)),
            CardLoadError::InvalidUtf8(msg) => CardLoadError::InvalidUtf8(at(msg)),
            CardLoadError::InvalidJson(msg) => CardLoadError::InvalidJson(at(msg)),
            CardLoadError::NotPng(msg) => CardLoadError::NotPng(at(msg)),
            CardLoadError::MissingMetadata(msg) => CardLoadError::MissingMetadata(at(msg)),
            CardLoadError::Malformed(msg) => CardLoadError::Malformed(at(msg)),
        }
    }
}

impl fmt::Display for CardLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardLoadError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            CardLoadError::UnsupportedType(msg) => write!(f, "Unsupported file type: {}", msg),
            CardLoadError::InvalidUtf8(msg) => write!(f, "Invalid UTF-8: {}", msg),
            CardLoadError::InvalidJson(msg) => write!(f, "Invalid JSON: {}", msg),
            CardLoadError::NotPng(msg) => write!(f, "Invalid PNG: {}", msg),
            CardLoadError::MissingMetadata(msg) => write!(f, "Missing metadata: {}", msg),
            CardLoadError::Malformed(msg) => write!(f, "Invalid card: {}", msg),
        }
    }
}

impl std::error::Error for CardLoadError {}

/// The two container formats a card arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Json,
}

impl MediaType {
    /// Match a declared MIME type, ignoring parameters such as `charset`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("image/png") {
            Some(MediaType::Png)
        } else if essence.eq_ignore_ascii_case("application/json") {
            Some(MediaType::Json)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());
        match extension.as_deref() {
            Some("png") => Some(MediaType::Png),
            Some("json") => Some(MediaType::Json),
            _ => None,
        }
    }
}

/// Card input, tagged once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterCardSource {
    Png { bytes: Vec<u8> },
    Json { text: String },
}

impl CharacterCardSource {
    pub fn from_bytes(media: MediaType, bytes: Vec<u8>) -> Result<Self, CardLoadError> {
        match media {
            MediaType::Png => Ok(CharacterCardSource::Png { bytes }),
            MediaType::Json => String::from_utf8(bytes)
                .map(|text| CharacterCardSource::Json { text })
                .map_err(|e| CardLoadError::InvalidUtf8(e.to_string())),
        }
    }
}

/// Decode a card source into a normalized import.
pub fn decode_source(
    source: CharacterCardSource,
    normalizer: &mut CardNormalizer,
) -> Result<ImportedCard, CardLoadError> {
    let text = match source {
        CharacterCardSource::Json { text } => text,
        CharacterCardSource::Png { bytes } => match png_text::extract_text(&bytes, CHARA_KEYWORD) {
            Ok(text) => text,
            Err(PngTextError::InvalidSignature) => {
                return Err(CardLoadError::NotPng("file is not a PNG".to_string()));
            }
            Err(PngTextError::MissingKeyword(keyword)) => {
                return Err(CardLoadError::MissingMetadata(format!(
                    "PNG does not contain '{}' metadata in tEXt chunk",
                    keyword
                )));
            }
        },
    };

    let parsed: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| CardLoadError::InvalidJson(e.to_string()))?;

    let imported = normalizer
        .normalize(&parsed)
        .map_err(|e| CardLoadError::Malformed(e.to_string()))?;
    debug!(
        name = %imported.character.display_name,
        lorebook = imported.lorebook.is_some(),
        "decoded character card"
    );
    Ok(imported)
}

/// Read a card file and decode it.
///
/// The media type comes from `media` when given, otherwise from the file
/// extension.
pub fn load_card_file<P: AsRef<Path>>(
    path: P,
    media: Option<MediaType>,
    normalizer: &mut CardNormalizer,
) -> Result<ImportedCard, CardLoadError> {
    let path = path.as_ref();

    let media = media.or_else(|| MediaType::from_path(path)).ok_or_else(|| {
        CardLoadError::UnsupportedType("File must be .json or .png".to_string()).in_file(path)
    })?;

    let bytes = fs::read(path)
        .map_err(|e| CardLoadError::FileNotFound(e.to_string()).in_file(path))?;

    CharacterCardSource::from_bytes(media, bytes)
        .and_then(|source| decode_source(source, normalizer))
        .map_err(|e| e.in_file(path))
}
