//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod import;
pub mod inspect;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::import::{run_import, WorldBookTarget};
use crate::cli::inspect::run_inspect;
use crate::core::config::Config;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "charcard", version)]
#[command(about = "Import roleplay character cards from PNG or JSON files")]
#[command(
    long_about = "charcard decodes character cards (PNG images with an embedded 'chara' \
text chunk, or plain JSON files), normalizes the field names used by different card \
editors, and merges any embedded lorebook into a world-book JSON file.\n\n\
Environment Variables:\n\
  RUST_LOG          Diagnostic log filter (overrides --log-level)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Diagnostic log level written to stderr
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a character card and print the normalized record as JSON
    Import {
        /// Card file (.png or .json)
        file: PathBuf,
        /// Declared media type, overriding the file extension
        #[arg(long, value_name = "MIME")]
        mime: Option<String>,
        /// World-book file to merge the lorebook into
        #[arg(long, value_name = "PATH", conflicts_with = "no_worldbook")]
        worldbook: Option<PathBuf>,
        /// Do not write the lorebook anywhere
        #[arg(long)]
        no_worldbook: bool,
    },
    /// Print the raw card data embedded in a PNG
    Inspect {
        /// PNG file to read
        file: PathBuf,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        value: String,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the current configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Commands::Import {
            file,
            mime,
            worldbook,
            no_worldbook,
        } => {
            let target = resolve_worldbook_target(worldbook, no_worldbook)?;
            run_import(&file, mime.as_deref(), &target)
        }
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "worldbook-path" => {
                    config.worldbook_path = Some(PathBuf::from(&value));
                    config.save()?;
                    println!("✅ Set worldbook-path to: {value}");
                }
                _ => return Err(format!("Unknown config key: {key}").into()),
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "worldbook-path" => {
                    config.worldbook_path = None;
                    config.save()?;
                    println!("✅ Unset worldbook-path");
                }
                _ => return Err(format!("Unknown config key: {key}").into()),
            }
            Ok(())
        }
        Commands::Config => {
            Config::load()?.print_all();
            Ok(())
        }
    }
}

fn resolve_worldbook_target(
    flag: Option<PathBuf>,
    skip: bool,
) -> Result<WorldBookTarget, Box<dyn Error>> {
    if skip {
        return Ok(WorldBookTarget::Skip);
    }
    if let Some(path) = flag {
        return Ok(WorldBookTarget::File(path));
    }
    Config::load()?
        .worldbook_path_or_default()
        .map(WorldBookTarget::File)
        .ok_or_else(|| "Could not determine a world-book path; pass --worldbook or --no-worldbook".into())
}
