use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the world book when no path is configured.
pub const DEFAULT_WORLDBOOK_FILE: &str = "worldbook.json";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where imported lorebooks are merged; defaults to the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worldbook_path: Option<PathBuf>,
}

impl Config {
    /// The configured world-book path, or `worldbook.json` beside the config
    /// file.
    pub fn worldbook_path_or_default(&self) -> Option<PathBuf> {
        self.worldbook_path
            .clone()
            .or_else(|| Self::config_dir().map(|dir| dir.join(DEFAULT_WORLDBOOK_FILE)))
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
