//! Catalog extraction from game data files
//!
//! Walks a directory for `*.json` files, each holding an `items` and/or
//! `recipes` array in the game data layout, and loads them into the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Ingredient, Item, Recipe};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    id: String,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default = "default_stack_size")]
    stack_size: u32,
    #[serde(default)]
    is_raw_resource: bool,
}

fn default_stack_size() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    item: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeRecord {
    id: String,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    unlock_tier: u32,
    machine_type: String,
    #[serde(default)]
    power_consumption: f64,
    crafting_speed: f64,
    #[serde(default)]
    alternate_recipe: bool,
    #[serde(default)]
    inputs: Vec<IngredientRecord>,
    outputs: Vec<IngredientRecord>,
}

/// Contents of one data file
#[derive(Debug, Default, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    items: Vec<ItemRecord>,
    #[serde(default)]
    recipes: Vec<RecipeRecord>,
}

impl DataFile {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.recipes.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.items.iter().map(|r| Item {
            id: r.id.clone(),
            name: r.name.clone(),
            category: r.category.clone(),
            is_raw_resource: r.is_raw_resource,
            stack_size: r.stack_size,
        })
    }

    pub fn recipes(&self) -> impl Iterator<Item = Recipe> + '_ {
        let ingredients = |list: &[IngredientRecord]| -> Vec<Ingredient> {
            list.iter()
                .map(|i| Ingredient::new(i.item.clone(), i.amount))
                .collect()
        };
        self.recipes.iter().map(move |r| Recipe {
            id: r.id.clone(),
            name: r.name.clone(),
            category: r.category.clone(),
            unlock_tier: r.unlock_tier,
            machine_type: r.machine_type.clone(),
            power_consumption: r.power_consumption,
            crafting_time: r.crafting_speed,
            is_alternate: r.alternate_recipe,
            inputs: ingredients(&r.inputs),
            outputs: ingredients(&r.outputs),
        })
    }
}

/// Find all JSON data files below a directory, sorted by path
pub fn find_data_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Parse a single data file
pub fn parse_data_file(filepath: &Path) -> Result<DataFile> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read {}", filepath.display()))?;
    let data = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", filepath.display()))?;
    Ok(data)
}

/// Extract all catalog data from a directory and populate the database
pub fn extract_to_database(conn: &Connection, data_dir: &Path) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();

    let files = find_data_files(data_dir)?;
    info!(dir = %data_dir.display(), files = files.len(), "scanning data files");

    for filepath in &files {
        match parse_data_file(filepath) {
            Ok(data) if data.is_empty() => {
                stats.skipped += 1;
            }
            Ok(data) => {
                for item in data.items() {
                    db::upsert_item(conn, &item)?;
                    stats.items += 1;
                }
                for recipe in data.recipes() {
                    db::upsert_recipe(conn, &recipe)?;
                    stats.recipes += 1;
                    if recipe.is_alternate {
                        stats.alternates += 1;
                    }
                }
                info!(
                    file = %filepath.display(),
                    items = data.items.len(),
                    recipes = data.recipes.len(),
                    "parsed data file"
                );
            }
            Err(e) => {
                warn!(file = %filepath.display(), "skipping unreadable data file: {e:#}");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub items: usize,
    pub recipes: usize,
    pub alternates: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} items and {} recipes ({} alternates). Skipped: {}, Errors: {}",
            self.items, self.recipes, self.alternates, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const IRON: &str = r#"{
        "items": [
            {"id": "iron_ore", "name": "Iron Ore", "category": "Raw Resource", "stackSize": 100, "isRawResource": true},
            {"id": "iron_ingot", "name": "Iron Ingot", "category": "Ingot", "stackSize": 100, "isRawResource": false}
        ],
        "recipes": [
            {"id": "iron_ingot", "name": "Iron Ingot", "category": "Smelting", "unlockTier": 0,
             "machineType": "Smelter", "powerConsumption": 4, "craftingSpeed": 2.0, "alternateRecipe": false,
             "inputs": [{"item": "iron_ore", "amount": 30}], "outputs": [{"item": "iron_ingot", "amount": 30}]}
        ]
    }"#;

    const PURE: &str = r#"{
        "recipes": [
            {"id": "pure_iron_ingot", "name": "Pure Iron Ingot (Alternate)", "unlockTier": 0,
             "machineType": "Refinery", "powerConsumption": 30, "craftingSpeed": 12.0, "alternateRecipe": true,
             "inputs": [{"item": "iron_ore", "amount": 35}, {"item": "water", "amount": 20}],
             "outputs": [{"item": "iron_ingot", "amount": 65}]}
        ]
    }"#;

    #[test]
    fn test_extract_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("iron.json"), IRON).unwrap();
        fs::create_dir(dir.path().join("alternates")).unwrap();
        fs::write(dir.path().join("alternates/pure.json"), PURE).unwrap();
        fs::write(dir.path().join("empty.json"), "{}").unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = extract_to_database(&conn, dir.path()).unwrap();

        assert_eq!(
            stats,
            ExtractStats {
                items: 2,
                recipes: 2,
                alternates: 1,
                skipped: 1,
                errors: 1,
            }
        );

        let catalog = db::load_catalog(&conn).unwrap();
        let producers = catalog.get_recipes_producing("iron_ingot");
        assert_eq!(producers.len(), 2);
        let pure = catalog.get_recipe("pure_iron_ingot").unwrap();
        assert_eq!(pure.inputs.len(), 2);
        assert_eq!(pure.crafting_time, 12.0);
        assert_eq!(pure.category, "");
        assert!(catalog.is_raw_resource("iron_ore"));
    }

    #[test]
    fn test_find_data_files_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        let files = find_data_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
