//! JSON export and import of calculation results and unlocked recipe sets

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{Local, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{
    CalculationStatus, Connection, MachineNode, OptimizationObjective, ProductionChainResult,
    RawResourceRequirement,
};

pub const FORMAT_VERSION: &str = "1.0";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("filename pattern is valid"));

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct TargetDocument {
    item_id: String,
    item_name: String,
    rate: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SummaryDocument {
    total_machines: u64,
    total_power: f64,
    total_raw_resources: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultDocument {
    version: String,
    #[serde(default)]
    timestamp: Option<String>,
    target: TargetDocument,
    status: CalculationStatus,
    optimization_objective: OptimizationObjective,
    unlocked_recipes: Vec<String>,
    nodes: Vec<MachineNode>,
    connections: Vec<Connection>,
    raw_resources: Vec<RawResourceRequirement>,
    #[serde(default)]
    summary: SummaryDocument,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    missing_recipes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UnlockDocument {
    #[serde(default)]
    version: String,
    #[serde(default)]
    timestamp: Option<String>,
    unlocked_recipes: Vec<String>,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub fn export_result_to_json(result: &ProductionChainResult) -> Result<String, ExchangeError> {
    let doc = ResultDocument {
        version: FORMAT_VERSION.to_string(),
        timestamp: Some(result.timestamp.clone().unwrap_or_else(now)),
        target: TargetDocument {
            item_id: result.target_item_id.clone(),
            item_name: result.target_item_name.clone(),
            rate: result.target_rate,
        },
        status: result.status,
        optimization_objective: result.optimization_objective,
        unlocked_recipes: result.unlocked_recipes.iter().cloned().collect(),
        nodes: result.nodes.clone(),
        connections: result.connections.clone(),
        raw_resources: result.raw_resources.clone(),
        summary: SummaryDocument {
            total_machines: result.total_machines,
            total_power: result.total_power,
            total_raw_resources: result.total_raw_resources,
        },
        messages: result.messages.clone(),
        warnings: result.warnings.clone(),
        missing_recipes: result.missing_recipes.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn import_result_from_json(json: &str) -> Result<ProductionChainResult, ExchangeError> {
    let doc: ResultDocument = serde_json::from_str(json)?;

    let mut result = ProductionChainResult::new(
        doc.status,
        doc.target.item_id,
        doc.target.item_name,
        doc.target.rate,
        doc.optimization_objective,
    );
    result.unlocked_recipes = doc.unlocked_recipes.into_iter().collect();
    result.timestamp = doc.timestamp;
    result.nodes = doc.nodes;
    result.connections = doc.connections;
    result.raw_resources = doc.raw_resources;
    result.messages = doc.messages;
    result.warnings = doc.warnings;
    result.missing_recipes = doc.missing_recipes;
    // summary is taken as stored, not recomputed
    result.total_machines = doc.summary.total_machines;
    result.total_power = doc.summary.total_power;
    result.total_raw_resources = doc.summary.total_raw_resources;

    Ok(result)
}

pub fn export_unlocked_recipes(unlocked: &BTreeSet<String>) -> Result<String, ExchangeError> {
    let doc = UnlockDocument {
        version: FORMAT_VERSION.to_string(),
        timestamp: Some(now()),
        unlocked_recipes: unlocked.iter().cloned().collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn import_unlocked_recipes(json: &str) -> Result<BTreeSet<String>, ExchangeError> {
    let doc: UnlockDocument = serde_json::from_str(json)?;
    Ok(doc.unlocked_recipes.into_iter().collect())
}

/// File name for saving a result, e.g. `satisfactory_Iron_Plate_20261018_101500.json`.
pub fn create_download_filename(result: &ProductionChainResult, extension: &str) -> String {
    let spaced = result.target_item_name.replace(' ', "_");
    let item_name = UNSAFE_FILENAME_CHARS.replace_all(&spaced, "");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("satisfactory_{item_name}_{timestamp}.{extension}")
}

pub fn export_to_file(result: &ProductionChainResult, path: &Path) -> Result<(), ExchangeError> {
    fs::write(path, export_result_to_json(result)?)?;
    info!(path = %path.display(), "exported production chain");
    Ok(())
}

pub fn import_from_file(path: &Path) -> Result<ProductionChainResult, ExchangeError> {
    let json = fs::read_to_string(path)?;
    let result = import_result_from_json(&json)?;
    info!(path = %path.display(), nodes = result.nodes.len(), "imported production chain");
    Ok(result)
}

pub fn read_unlocked_recipes(path: &Path) -> Result<BTreeSet<String>, ExchangeError> {
    import_unlocked_recipes(&fs::read_to_string(path)?)
}

pub fn write_unlocked_recipes(unlocked: &BTreeSet<String>, path: &Path) -> Result<(), ExchangeError> {
    fs::write(path, export_unlocked_recipes(unlocked)?)?;
    Ok(())
}
