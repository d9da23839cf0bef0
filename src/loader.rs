//! Recipe file loading
//!
//! Text files hold one assignment per line. JSON files hold game data rows
//! with `RecipeSets`, `Outputs` and `Inputs`; every recipe set of a row
//! becomes its own assignment line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::registry::Registry;
use crate::validator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecipeRow {
    recipe_sets: Vec<RowRef>,
    outputs: Vec<Item>,
    inputs: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RowRef {
    row_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    element: RowRef,
    count: u64,
}

impl Item {
    fn term(&self) -> String {
        format!("{} {}", self.count, self.element.row_name.to_lowercase())
    }
}

impl RecipeRow {
    /// One assignment line per recipe set, `None` when the row has no
    /// output or no input
    fn lines(&self) -> Option<Vec<String>> {
        let output = self.outputs.first()?;
        let (first, rest) = self.inputs.split_first()?;

        let mut ingredients = first.term();
        for input in rest {
            ingredients.push_str(" + ");
            ingredients.push_str(&input.term());
        }

        Some(
            self.recipe_sets
                .iter()
                .map(|set| {
                    format!(
                        "{} : {} = {}",
                        set.row_name.to_lowercase(),
                        output.term(),
                        ingredients
                    )
                })
                .collect(),
        )
    }
}

/// Assign every line of a text recipe file, skipping blanks and `#` comments.
///
/// Returns the number of lines assigned.
pub fn read_text(registry: &mut Registry, content: &str) -> Result<usize> {
    let mut count = 0;
    for line in content.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        registry.assign(line)?;
        count += 1;
    }
    Ok(count)
}

/// Assign every recipe row of a JSON document.
///
/// Rows missing a field, with no output or input, or that do not form valid
/// recipe lines are recorded in the registry's error list and skipped.
pub fn read_json(registry: &mut Registry, content: &str) -> Result<usize> {
    let document: Value = serde_json::from_str(content)?;
    let rows = match document {
        Value::Object(mut object) => match object.remove("Rows") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        Value::Array(rows) => rows,
        _ => Vec::new(),
    };

    let mut count = 0;
    for row in rows {
        let lines = serde_json::from_value::<RecipeRow>(row.clone())
            .ok()
            .and_then(|recipe| recipe.lines());

        let Some(lines) = lines else {
            warn!(row = %row, "skipping malformed recipe row");
            registry.record_error(row.to_string());
            continue;
        };

        // a row is loaded whole or not at all
        if let Err(err) = lines
            .iter()
            .try_for_each(|line| validator::validate_syntax_assignment(line))
        {
            warn!(row = %row, %err, "skipping recipe row");
            registry.record_error(err.to_string());
            continue;
        }

        for line in &lines {
            registry.assign(line)?;
        }
        count += lines.len();
    }

    Ok(count)
}

/// Load one recipe file, JSON by extension and text otherwise
pub fn load_file(registry: &mut Registry, path: &Path) -> Result<usize> {
    let content = fs::read_to_string(path)?;
    let count = if is_json(path) {
        read_json(registry, &content)?
    } else {
        read_text(registry, &content)?
    };
    debug!(path = %path.display(), recipes = count, "loaded recipe file");
    Ok(count)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// All `*.txt` and `*.json` files below `dir`, in file name order
pub fn find_recipe_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == "txt" || ext == "json")
        {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub recipes: usize,
    pub skipped: usize,
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Loaded {} recipes from {} files. Skipped rows: {}",
            self.recipes, self.files, self.skipped
        )
    }
}

/// Load a file, or every recipe file below a directory
pub fn load_path(registry: &mut Registry, path: &Path) -> Result<LoadStats> {
    let files = if path.is_dir() {
        find_recipe_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let before = registry.errors().len();
    let mut stats = LoadStats::default();
    for file in &files {
        stats.recipes += load_file(registry, file)?;
        stats.files += 1;
    }
    stats.skipped = registry.errors().len() - before;

    info!(path = %path.display(), %stats, "recipes loaded");
    Ok(stats)
}
