//! World-book document that imported lorebooks are merged into.
//!
//! The document is a JSON object holding `categories`, each a named list of
//! keyword-triggered entries. Imports are read-merge-write: load the whole
//! document, append one category, write the whole document back.

use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::character::card::{LorebookId, NormalizedLorebook};

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBookEntry {
    pub id: u64,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBookCategory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<WorldBookEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldBook {
    #[serde(default)]
    pub categories: Vec<WorldBookCategory>,
    /// Fields written by other tools, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorldBook {
    /// Append `lorebook` as a new category and return the id it was stored
    /// under.
    ///
    /// The category takes `id` and its entries `id + 1 ..= id + n`. When any
    /// of those collide with an id already in the document, the block moves
    /// to one past the largest id, or to the lowest free gap when that would
    /// overflow.
    pub fn append_lorebook(
        &mut self,
        lorebook: &NormalizedLorebook,
    ) -> Result<LorebookId, WorldBookError> {
        let span = lorebook.entries.len() as u64;
        let id = self
            .allocate_ids(lorebook.id.0, span)
            .ok_or(WorldBookError::IdsExhausted { requested: lorebook.id })?;
        if id != lorebook.id.0 {
            warn!(requested = %lorebook.id, assigned = id, "lorebook id already in use");
        }

        let entries = lorebook
            .entries
            .iter()
            .zip(1u64..)
            .map(|(entry, offset)| WorldBookEntry {
                id: id + offset,
                keys: entry.trigger_keys.clone(),
                content: entry.content.clone(),
                enabled: entry.enabled,
                extra: Map::new(),
            })
            .collect();

        self.categories.push(WorldBookCategory {
            id,
            name: lorebook.name.clone(),
            entries,
            extra: Map::new(),
        });
        Ok(LorebookId(id))
    }

    /// First start of a free block `start ..= start + span`, trying
    /// `requested`, then one past the largest id, then gaps from 1 upward.
    fn allocate_ids(&self, requested: u64, span: u64) -> Option<u64> {
        let used: BTreeSet<u64> = self
            .categories
            .iter()
            .flat_map(|category| {
                std::iter::once(category.id).chain(category.entries.iter().map(|e| e.id))
            })
            .collect();
        let is_free = |start: u64| {
            start
                .checked_add(span)
                .is_some_and(|end| used.range(start..=end).next().is_none())
        };

        if is_free(requested) {
            return Some(requested);
        }
        if let Some(next) = used.last().and_then(|max| max.checked_add(1)) {
            if is_free(next) {
                return Some(next);
            }
        }

        let mut start = 1u64;
        for &taken in &used {
            if taken > start && taken - start > span {
                return Some(start);
            }
            if taken >= start {
                start = taken.checked_add(1)?;
            }
        }
        is_free(start).then_some(start)
    }

    pub fn category(&self, id: LorebookId) -> Option<&WorldBookCategory> {
        self.categories.iter().find(|category| category.id == id.0)
    }
}

/// Errors raised while reading or writing the world-book file.
#[derive(Debug)]
pub enum WorldBookError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Write { path: PathBuf, source: std::io::Error },
    /// No free block of ids is left for the lorebook and its entries.
    IdsExhausted { requested: LorebookId },
}

impl fmt::Display for WorldBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldBookError::Read { path, source } => {
                write!(f, "Failed to read world book at {}: {}", path.display(), source)
            }
            WorldBookError::Parse { path, source } => {
                write!(f, "Failed to parse world book at {}: {}", path.display(), source)
            }
            WorldBookError::Write { path, source } => {
                write!(f, "Failed to write world book at {}: {}", path.display(), source)
            }
            WorldBookError::IdsExhausted { requested } => {
                write!(f, "No free world book id for lorebook {}", requested)
            }
        }
    }
}

impl StdError for WorldBookError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            WorldBookError::Read { source, .. } => Some(source),
            WorldBookError::Parse { source, .. } => Some(source),
            WorldBookError::Write { source, .. } => Some(source),
            WorldBookError::IdsExhausted { .. } => None,
        }
    }
}

/// World-book document persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct WorldBookStore {
    path: PathBuf,
}

impl WorldBookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file is an empty world book.
    pub fn load(&self) -> Result<WorldBook, WorldBookError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no world book yet, starting empty");
                return Ok(WorldBook::default());
            }
            Err(source) => {
                return Err(WorldBookError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| WorldBookError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file atomically with `book`.
    pub fn save(&self, book: &WorldBook) -> Result<(), WorldBookError> {
        self.write_atomically(book)
            .map_err(|source| WorldBookError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Merge `lorebook` into the stored document and return its stored id.
    pub fn import_lorebook(
        &self,
        lorebook: &NormalizedLorebook,
    ) -> Result<LorebookId, WorldBookError> {
        let mut book = self.load()?;
        let id = book.append_lorebook(lorebook)?;
        self.save(&book)?;
        debug!(
            %id,
            entries = lorebook.entries.len(),
            path = %self.path.display(),
            "stored imported lorebook"
        );
        Ok(id)
    }

    fn write_atomically(&self, book: &WorldBook) -> std::io::Result<()> {
        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        serde_json::to_writer_pretty(&mut temp_file, book)?;
        temp_file.write_all(b"\n")?;
        temp_file.as_file_mut().sync_all()?;
        temp_file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}
