//! Data models for Satisfactory items, recipes and production chains

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    pub is_raw_resource: bool,
    pub stack_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub item_id: String,
    pub amount: f64, // per crafting cycle
}

impl Ingredient {
    pub fn new(item_id: impl Into<String>, amount: f64) -> Self {
        Self {
            item_id: item_id.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unlock_tier: u32,
    pub machine_type: String,
    pub power_consumption: f64, // MW per machine
    pub crafting_time: f64,     // seconds per cycle
    pub is_alternate: bool,
    pub inputs: Vec<Ingredient>,
    pub outputs: Vec<Ingredient>,
}

impl Recipe {
    /// Items per minute for `amount` items per cycle on one machine at 100% clock.
    pub fn per_minute(&self, amount: f64) -> f64 {
        if self.crafting_time > 0.0 {
            amount / self.crafting_time * 60.0
        } else {
            0.0
        }
    }

    /// The output entry for `item_id`, falling back to the first output.
    pub fn output_for(&self, item_id: &str) -> Option<&Ingredient> {
        self.outputs
            .iter()
            .find(|o| o.item_id == item_id)
            .or_else(|| self.outputs.first())
    }
}

/// Recipe selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationObjective {
    MinimizeMachines,
    MinimizePower,
    MinimizeWaste,
    #[default]
    Balanced,
}

impl OptimizationObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinimizeMachines => "minimize_machines",
            Self::MinimizePower => "minimize_power",
            Self::MinimizeWaste => "minimize_waste",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for OptimizationObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Success,
    InsufficientRecipes,
    ImpossibleRate,
    ResourceWarning,
}

impl CalculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InsufficientRecipes => "insufficient_recipes",
            Self::ImpossibleRate => "impossible_rate",
            Self::ResourceWarning => "resource_warning",
        }
    }
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFlow {
    pub item_id: String,
    pub item_name: String,
    pub rate: f64, // items per minute
}

/// One production step of a chain, sized to the demand that created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineNode {
    pub node_id: String,
    pub recipe_id: String,
    pub recipe_name: String,
    pub machine_type: String,
    pub item_produced: String,
    pub item_produced_name: String,

    pub target_rate: f64,
    pub machine_count: f64, // fractional = partial utilization
    #[serde(default = "default_clock_speed")]
    pub clock_speed: f64, // percent

    pub power_per_machine: f64,
    pub total_power: f64,

    #[serde(default)]
    pub tier: u32,
    #[serde(default)]
    pub is_alternate: bool,

    pub inputs: Vec<ItemFlow>,
    pub outputs: Vec<ItemFlow>,
}

fn default_clock_speed() -> f64 {
    100.0
}

impl MachineNode {
    /// Build a node for `recipe` running `machine_count` machines at 100% clock.
    pub fn new(
        node_id: String,
        recipe: &Recipe,
        item: &Item,
        target_rate: f64,
        machine_count: f64,
    ) -> Self {
        let mut node = Self {
            node_id,
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            machine_type: recipe.machine_type.clone(),
            item_produced: item.id.clone(),
            item_produced_name: item.name.clone(),
            target_rate,
            machine_count,
            clock_speed: default_clock_speed(),
            power_per_machine: recipe.power_consumption,
            total_power: 0.0,
            tier: recipe.unlock_tier,
            is_alternate: recipe.is_alternate,
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        node.update_power();
        node
    }

    pub fn set_clock_speed(&mut self, clock_speed: f64) {
        self.clock_speed = clock_speed;
        self.update_power();
    }

    fn update_power(&mut self) {
        self.total_power = self.power_per_machine * self.machine_count * (self.clock_speed / 100.0);
    }

    /// Whole machines to build for this node.
    pub fn machines_to_build(&self) -> u64 {
        // rounds up unless less than 0.01 above a whole number
        (self.machine_count + 0.99).floor().max(0.0) as u64
    }

    /// Summed output rate of the produced item.
    pub fn produced_rate(&self) -> f64 {
        self.outputs
            .iter()
            .filter(|o| o.item_id == self.item_produced)
            .map(|o| o.rate)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub item_id: String,
    pub item_name: String,
    pub rate: f64,
    #[serde(default)]
    pub is_recycling_loop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResourceRequirement {
    pub item_id: String,
    pub item_name: String,
    pub rate: f64,
}

/// Result of a production chain calculation
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionChainResult {
    pub status: CalculationStatus,

    pub target_item_id: String,
    pub target_item_name: String,
    pub target_rate: f64,

    pub nodes: Vec<MachineNode>,
    pub connections: Vec<Connection>,
    pub raw_resources: Vec<RawResourceRequirement>,

    pub total_machines: u64,
    pub total_power: f64,
    pub total_raw_resources: usize,

    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_recipes: Vec<String>,

    pub unlocked_recipes: BTreeSet<String>,
    pub optimization_objective: OptimizationObjective,
    pub timestamp: Option<String>,
}

impl ProductionChainResult {
    pub fn new(
        status: CalculationStatus,
        target_item_id: impl Into<String>,
        target_item_name: impl Into<String>,
        target_rate: f64,
        optimization_objective: OptimizationObjective,
    ) -> Self {
        Self {
            status,
            target_item_id: target_item_id.into(),
            target_item_name: target_item_name.into(),
            target_rate,
            nodes: Vec::new(),
            connections: Vec::new(),
            raw_resources: Vec::new(),
            total_machines: 0,
            total_power: 0.0,
            total_raw_resources: 0,
            messages: Vec::new(),
            warnings: Vec::new(),
            missing_recipes: Vec::new(),
            unlocked_recipes: BTreeSet::new(),
            optimization_objective,
            timestamp: None,
        }
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_missing_recipe(&mut self, description: impl Into<String>) {
        let description = description.into();
        if !self.missing_recipes.contains(&description) {
            self.missing_recipes.push(description);
        }
    }

    pub fn calculate_summary(&mut self) {
        self.total_machines = self.nodes.iter().map(MachineNode::machines_to_build).sum();
        self.total_power = self.nodes.iter().map(|n| n.total_power).sum();
        self.total_raw_resources = self.raw_resources.len();
    }

    pub fn is_success(&self) -> bool {
        self.status == CalculationStatus::Success
    }

    pub fn node_for(&self, item_id: &str) -> Option<&MachineNode> {
        self.nodes.iter().find(|n| n.item_produced == item_id)
    }

    pub fn raw_rate(&self, item_id: &str) -> Option<f64> {
        self.raw_resources
            .iter()
            .find(|r| r.item_id == item_id)
            .map(|r| r.rate)
    }
}

/// Nodes sharing a machine type
#[derive(Debug, Clone)]
pub struct ProductionStage {
    pub stage_number: usize,
    pub stage_name: String,
    pub nodes: Vec<MachineNode>,
}

impl ProductionStage {
    pub fn total_machines(&self) -> u64 {
        self.nodes.iter().map(MachineNode::machines_to_build).sum()
    }

    pub fn total_power(&self) -> f64 {
        self.nodes.iter().map(|n| n.total_power).sum()
    }
}
