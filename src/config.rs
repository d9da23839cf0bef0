//! Settings file
//!
//! Every field is optional; anything left out keeps its default. Command
//! line flags take precedence over values read here.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::similar::{DEFAULT_CUTOFF, DEFAULT_SUGGESTIONS};

/// Settings file looked up in the working directory
pub const CONFIG_FILE: &str = "craft.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Recipe files or directories loaded before any given on the command line
    pub recipe_files: Vec<PathBuf>,
    /// Station row name to the item that provides it
    pub station_aliases: BTreeMap<String, String>,
    /// Minimum closeness for did-you-mean suggestions (0.0 - 1.0)
    pub similarity_cutoff: f64,
    pub max_suggestions: usize,
    /// Separator width when not echoing an interactive line
    pub separator_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recipe_files: Vec::new(),
            station_aliases: default_station_aliases(),
            similarity_cutoff: DEFAULT_CUTOFF,
            max_suggestions: DEFAULT_SUGGESTIONS,
            separator_width: 72,
        }
    }
}

fn default_station_aliases() -> BTreeMap<String, String> {
    [
        ("machining_bench", "kit_machining_bench"),
        ("mortar_and_pestle", "kit_mortar_and_pestle"),
        ("rustic_decorations_bench", "rustic_decoration_bench"),
    ]
    .into_iter()
    .map(|(station, item)| (station.to_string(), item.to_string()))
    .collect()
}

impl Settings {
    /// Read settings from `path`, defaults when the file does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings = Self::parse(&contents)?;
        info!("loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
