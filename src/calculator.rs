//! Production chain calculator logic
//!
//! Resolution walks from the target item back to raw resources, picking one
//! recipe per item with the scorer. It runs as a worklist over an explicit
//! frame stack, so deep recipe graphs cannot exhaust the thread stack. All
//! bookkeeping lives in a context created per call; nothing is shared between
//! two calculations.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::models::{
    CalculationStatus, Connection, Item, ItemFlow, MachineNode, OptimizationObjective,
    ProductionChainResult, RawResourceRequirement, Recipe,
};
use crate::scorer::{RecipeFilter, Selection, select_best_recipe};

/// Nested non-raw items allowed below the target before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub objective: OptimizationObjective,
    /// Treat every recipe as unlocked and keep going past unresolvable inputs.
    pub allow_locked_preview: bool,
    pub max_depth: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            objective: OptimizationObjective::default(),
            allow_locked_preview: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SolveOptions {
    pub fn with_objective(objective: OptimizationObjective) -> Self {
        Self {
            objective,
            ..Self::default()
        }
    }
}

/// Problems found while resolving a chain. They are recorded on the result
/// rather than returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Item '{0}' not found in database.")]
    UnknownItem(String),

    #[error("No recipes found for {item_name}")]
    NoRecipeForItem { item_id: String, item_name: String },

    #[error("{item_name} (options: {})", .options.join(", "))]
    NoUnlockedRecipe {
        item_id: String,
        item_name: String,
        options: Vec<String>,
    },

    #[error("Circular dependency detected for {item_name} - recycling loop")]
    CircularDependency { item_id: String, item_name: String },

    #[error("Dependency chain for {item_name} exceeds {limit} levels")]
    DepthLimitExceeded {
        item_id: String,
        item_name: String,
        limit: usize,
    },
}

impl ResolveError {
    /// Whether resolution can carry on past this problem.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CircularDependency { .. })
    }

    fn record(self, result: &mut ProductionChainResult) {
        let text = self.to_string();
        match self {
            Self::UnknownItem(_) | Self::NoRecipeForItem { .. } | Self::DepthLimitExceeded { .. } => {
                result.add_message(text)
            }
            Self::NoUnlockedRecipe { .. } => result.add_missing_recipe(text),
            Self::CircularDependency { .. } => result.add_warning(text),
        }
    }
}

/// Per-call bookkeeping.
#[derive(Debug, Default)]
struct SolveContext {
    nodes: Vec<MachineNode>,
    raw_requirements: Vec<RawResourceRequirement>,
    raw_index: HashMap<String, usize>,
    item_production: HashMap<String, Vec<String>>,
    visited: HashSet<String>,
    processing: Vec<String>,
}

impl SolveContext {
    fn add_raw(&mut self, item: &Item, rate: f64) {
        match self.raw_index.get(&item.id) {
            Some(&idx) => self.raw_requirements[idx].rate += rate,
            None => {
                self.raw_index.insert(item.id.clone(), self.raw_requirements.len());
                self.raw_requirements.push(RawResourceRequirement {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    rate,
                });
            }
        }
    }

    fn is_processing(&self, item_id: &str) -> bool {
        self.processing.iter().any(|id| id == item_id)
    }
}

/// A node whose inputs are still being resolved.
struct Frame<'c> {
    recipe: &'c Recipe,
    node: MachineNode,
    machines: f64,
    next_input: usize,
}

enum Visit<'c> {
    Done(bool),
    Descend(Frame<'c>),
}

struct Resolver<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    unlocked: &'a BTreeSet<String>,
    options: &'a SolveOptions,
    ctx: SolveContext,
}

impl<'a, C: Catalog + ?Sized> Resolver<'a, C> {
    fn new(catalog: &'a C, unlocked: &'a BTreeSet<String>, options: &'a SolveOptions) -> Self {
        Self {
            catalog,
            unlocked,
            options,
            ctx: SolveContext::default(),
        }
    }

    fn filter(&self) -> RecipeFilter<'a> {
        if self.options.allow_locked_preview {
            RecipeFilter::Any
        } else {
            RecipeFilter::Unlocked(self.unlocked)
        }
    }

    /// Resolve `item_id` and everything beneath it. Returns false on failure.
    fn run(&mut self, item_id: &str, rate: f64, result: &mut ProductionChainResult) -> bool {
        let mut frames: Vec<Frame<'a>> = Vec::new();
        // outcome of the most recently finished child
        let mut outcome = match self.enter(item_id, rate, result) {
            Visit::Done(ok) => return ok,
            Visit::Descend(frame) => {
                frames.push(frame);
                None
            }
        };

        while let Some(frame) = frames.last_mut() {
            if outcome.take() == Some(false) && !self.options.allow_locked_preview {
                frames.pop();
                self.ctx.processing.pop();
                outcome = Some(false);
                continue;
            }

            let recipe = frame.recipe;
            match recipe.inputs.get(frame.next_input) {
                Some(input) => {
                    frame.next_input += 1;
                    let input_rate = recipe.per_minute(input.amount) * frame.machines;
                    frame.node.inputs.push(ItemFlow {
                        item_id: input.item_id.clone(),
                        item_name: self.catalog.item_name(&input.item_id).to_string(),
                        rate: input_rate,
                    });

                    match self.enter(&input.item_id, input_rate, result) {
                        Visit::Done(ok) => outcome = Some(ok),
                        Visit::Descend(child) => frames.push(child),
                    }
                }
                None => {
                    if let Some(done) = frames.pop() {
                        self.finish(done);
                    }
                    outcome = Some(true);
                }
            }
        }

        outcome.unwrap_or(true)
    }

    fn enter(&mut self, item_id: &str, rate: f64, result: &mut ProductionChainResult) -> Visit<'a> {
        let catalog = self.catalog;
        let Some(item) = catalog.get_item(item_id) else {
            ResolveError::UnknownItem(item_id.to_string()).record(result);
            return Visit::Done(false);
        };

        if self.ctx.is_processing(item_id) {
            warn!(item = item_id, "recycling loop");
            ResolveError::CircularDependency {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
            }
            .record(result);
            return Visit::Done(true);
        }

        // first demand wins; later demand is treated as already covered
        if self.ctx.visited.contains(item_id) {
            return Visit::Done(true);
        }

        self.ctx.processing.push(item_id.to_string());

        if item.is_raw_resource {
            self.ctx.add_raw(item, rate);
            self.ctx.processing.pop();
            return Visit::Done(true);
        }

        // the target itself sits at depth 0
        let depth = self.ctx.processing.len() - 1;
        if depth > self.options.max_depth {
            ResolveError::DepthLimitExceeded {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                limit: self.options.max_depth,
            }
            .record(result);
            self.ctx.processing.pop();
            return Visit::Done(false);
        }

        let producing = catalog.get_recipes_producing(item_id);
        let recipe = match select_best_recipe(&producing, self.options.objective, rate, self.filter()) {
            Selection::Best(recipe) => recipe,
            Selection::NoCandidates => {
                ResolveError::NoRecipeForItem {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                }
                .record(result);
                self.ctx.processing.pop();
                return Visit::Done(false);
            }
            Selection::AllLocked => {
                ResolveError::NoUnlockedRecipe {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    options: producing.iter().map(|r| r.name.clone()).collect(),
                }
                .record(result);
                self.ctx.processing.pop();
                return Visit::Done(false);
            }
        };

        let per_machine = recipe
            .output_for(item_id)
            .map_or(0.0, |o| recipe.per_minute(o.amount));
        let machines = if per_machine > 0.0 { rate / per_machine } else { 0.0 };

        debug!(
            item = item_id,
            recipe = %recipe.id,
            rate,
            machines,
            "selected recipe"
        );

        let node_id = format!("node_{}_{}", self.ctx.nodes.len(), item_id);
        Visit::Descend(Frame {
            recipe,
            node: MachineNode::new(node_id, recipe, item, rate, machines),
            machines,
            next_input: 0,
        })
    }

    fn finish(&mut self, frame: Frame<'a>) {
        let Frame {
            recipe,
            mut node,
            machines,
            ..
        } = frame;

        for output in &recipe.outputs {
            node.outputs.push(ItemFlow {
                item_id: output.item_id.clone(),
                item_name: self.catalog.item_name(&output.item_id).to_string(),
                rate: recipe.per_minute(output.amount) * machines,
            });
        }

        self.ctx
            .item_production
            .entry(node.item_produced.clone())
            .or_default()
            .push(node.node_id.clone());
        self.ctx.visited.insert(node.item_produced.clone());
        self.ctx.processing.pop();
        self.ctx.nodes.push(node);
    }
}

/// Calculate the production chain for a target item at a rate in items/min.
///
/// Never fails outright: problems end up in the result's status, messages,
/// warnings and missing recipes.
pub fn calculate_production_chain<C: Catalog + ?Sized>(
    catalog: &C,
    target_item_id: &str,
    target_rate: f64,
    unlocked_recipes: &BTreeSet<String>,
    options: &SolveOptions,
) -> ProductionChainResult {
    let Some(target) = catalog.get_item(target_item_id) else {
        let mut result = ProductionChainResult::new(
            CalculationStatus::ImpossibleRate,
            target_item_id,
            "Unknown",
            target_rate,
            options.objective,
        );
        ResolveError::UnknownItem(target_item_id.to_string()).record(&mut result);
        return result;
    };

    let mut result = ProductionChainResult::new(
        CalculationStatus::Success,
        &target.id,
        &target.name,
        target_rate,
        options.objective,
    );
    result.unlocked_recipes = unlocked_recipes.clone();
    result.timestamp = Some(Utc::now().to_rfc3339());

    info!(
        target = target_item_id,
        rate = target_rate,
        objective = %options.objective,
        preview = options.allow_locked_preview,
        "calculating production chain"
    );

    if target.is_raw_resource {
        result.raw_resources.push(RawResourceRequirement {
            item_id: target.id.clone(),
            item_name: target.name.clone(),
            rate: target_rate,
        });
        result.add_message(format!(
            "{} is a raw resource. Required: {:.2}/min",
            target.name, target_rate
        ));
        result.calculate_summary();
        return result;
    }

    let mut resolver = Resolver::new(catalog, unlocked_recipes, options);
    let resolved = resolver.run(target_item_id, target_rate, &mut result);

    if !resolved {
        if result.missing_recipes.is_empty() {
            result.status = CalculationStatus::ImpossibleRate;
            result.add_message(format!(
                "Cannot produce {} at the requested rate.",
                target.name
            ));
        } else {
            result.status = CalculationStatus::InsufficientRecipes;
            let missing = result.missing_recipes.join(", ");
            result.add_message(format!(
                "Cannot produce {} - missing recipes. Unlock the following: {}",
                target.name, missing
            ));
        }
    }

    let ctx = resolver.ctx;
    result.connections = build_connections(&ctx.nodes, &ctx.item_production);
    result.nodes = ctx.nodes;
    result.raw_resources = ctx.raw_requirements;
    result.calculate_summary();

    info!(
        status = %result.status,
        nodes = result.nodes.len(),
        machines = result.total_machines,
        "production chain calculated"
    );

    result
}

/// Index of node ids by the item they produce, in node order.
pub fn production_index(nodes: &[MachineNode]) -> HashMap<String, Vec<String>> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for node in nodes {
        index
            .entry(node.item_produced.clone())
            .or_default()
            .push(node.node_id.clone());
    }
    index
}

/// Derive producer → consumer connections from node inputs.
///
/// Nodes are emitted after everything they consume, so an edge whose producer
/// comes at or after its consumer closes a recycling loop.
pub fn build_connections(
    nodes: &[MachineNode],
    item_production: &HashMap<String, Vec<String>>,
) -> Vec<Connection> {
    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.node_id.as_str(), i))
        .collect();

    let mut connections = Vec::new();
    for (consumer_pos, node) in nodes.iter().enumerate() {
        for flow in &node.inputs {
            let Some(producers) = item_production.get(&flow.item_id) else {
                continue;
            };
            for producer_id in producers {
                let is_recycling_loop = position
                    .get(producer_id.as_str())
                    .is_some_and(|&p| p >= consumer_pos);
                connections.push(Connection {
                    connection_id: format!("conn_{}", connections.len()),
                    from_node_id: producer_id.clone(),
                    to_node_id: node.node_id.clone(),
                    item_id: flow.item_id.clone(),
                    item_name: flow.item_name.clone(),
                    rate: flow.rate,
                    is_recycling_loop,
                });
            }
        }
    }
    connections
}
