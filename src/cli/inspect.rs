use std::error::Error;
use std::fs;
use std::path::Path;

use crate::character::png_text::{extract_text, CHARA_KEYWORD};

/// The card text embedded in a PNG, pretty-printed when it is JSON.
pub fn card_text(path: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let text = extract_text(&bytes, CHARA_KEYWORD)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    Ok(match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(_) => text,
    })
}

pub fn run_inspect(path: &Path) -> Result<(), Box<dyn Error>> {
    println!("{}", card_text(path)?);
    Ok(())
}
