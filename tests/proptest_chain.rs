//! Property-based tests for the chain resolver.
//!
//! Solves random targets from the built-in catalog and checks structural
//! invariants of the results.

use std::collections::BTreeSet;

use proptest::prelude::*;
use satisfactory_calculator::calculator::{SolveOptions, calculate_production_chain};
use satisfactory_calculator::catalog::{Catalog, MemoryCatalog};
use satisfactory_calculator::models::{CalculationStatus, OptimizationObjective, ProductionChainResult};
use satisfactory_calculator::sample;

// ===========================================================================
// Generators
// ===========================================================================

fn craftable_ids(catalog: &MemoryCatalog) -> Vec<String> {
    catalog.craftable_items().map(|i| i.id.clone()).collect()
}

/// Every standard recipe; each craftable sample item then has one producer.
fn standard_unlocks(catalog: &MemoryCatalog) -> BTreeSet<String> {
    catalog.recipes_up_to_tier(u32::MAX, false).into_iter().collect()
}

fn arb_objective() -> impl Strategy<Value = OptimizationObjective> {
    prop_oneof![
        Just(OptimizationObjective::MinimizeMachines),
        Just(OptimizationObjective::MinimizePower),
        Just(OptimizationObjective::MinimizeWaste),
        Just(OptimizationObjective::Balanced),
    ]
}

fn arb_target() -> impl Strategy<Value = String> {
    let ids = craftable_ids(&sample::catalog());
    proptest::sample::select(ids)
}

fn arb_unlocked() -> impl Strategy<Value = BTreeSet<String>> {
    let ids = sample::all_recipe_ids();
    let len = ids.len();
    proptest::sample::subsequence(ids, 0..=len).prop_map(|ids| ids.into_iter().collect())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn solve(
    catalog: &MemoryCatalog,
    target: &str,
    rate: f64,
    unlocked: &BTreeSet<String>,
    objective: OptimizationObjective,
) -> ProductionChainResult {
    calculate_production_chain(
        catalog,
        target,
        rate,
        unlocked,
        &SolveOptions::with_objective(objective),
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn raw_targets_need_only_themselves(rate in 0.1f64..10_000.0, objective in arb_objective()) {
        let catalog = sample::catalog();
        let unlocked = standard_unlocks(&catalog);

        for raw in catalog.raw_resources() {
            let result = solve(&catalog, &raw.id, rate, &unlocked, objective);
            prop_assert_eq!(result.status, CalculationStatus::Success);
            prop_assert!(result.nodes.is_empty());
            prop_assert_eq!(result.raw_resources.len(), 1);
            prop_assert_eq!(&result.raw_resources[0].item_id, &raw.id);
            prop_assert_eq!(result.raw_resources[0].rate, rate);
        }
    }

    #[test]
    fn craftable_targets_reach_raw_leaves(
        target in arb_target(),
        rate in 0.1f64..1_000.0,
        objective in arb_objective(),
    ) {
        let catalog = sample::catalog();
        let unlocked = standard_unlocks(&catalog);
        let result = solve(&catalog, &target, rate, &unlocked, objective);

        prop_assert_eq!(result.status, CalculationStatus::Success);
        prop_assert!(!result.nodes.is_empty());
        prop_assert!(result.missing_recipes.is_empty());
        prop_assert!(result.raw_resources.iter().all(|r| r.rate > 0.0));

        for node in &result.nodes {
            prop_assert!(!catalog.is_raw_resource(&node.item_produced));
            prop_assert!(close(node.produced_rate(), node.target_rate));
            for input in &node.inputs {
                if catalog.is_raw_resource(&input.item_id) {
                    prop_assert!(result.raw_rate(&input.item_id).is_some());
                } else {
                    prop_assert!(result.node_for(&input.item_id).is_some());
                }
            }
        }
        prop_assert_eq!(result.nodes.last().map(|n| n.item_produced.as_str()), Some(target.as_str()));
    }

    #[test]
    fn solving_is_deterministic(
        target in arb_target(),
        rate in 0.1f64..1_000.0,
        unlocked in arb_unlocked(),
        objective in arb_objective(),
    ) {
        let catalog = sample::catalog();
        let first = solve(&catalog, &target, rate, &unlocked, objective);
        let second = solve(&catalog, &target, rate, &unlocked, objective);

        prop_assert_eq!(first.status, second.status);
        prop_assert_eq!(&first.nodes, &second.nodes);
        prop_assert_eq!(&first.connections, &second.connections);
        prop_assert_eq!(&first.raw_resources, &second.raw_resources);
        prop_assert_eq!(&first.missing_recipes, &second.missing_recipes);
        prop_assert_eq!(first.total_power, second.total_power);
    }

    #[test]
    fn demand_scales_linearly(
        target in arb_target(),
        rate in 0.1f64..500.0,
        factor in 1.5f64..4.0,
        objective in arb_objective(),
    ) {
        let catalog = sample::catalog();
        let unlocked = standard_unlocks(&catalog);
        let base = solve(&catalog, &target, rate, &unlocked, objective);
        let scaled = solve(&catalog, &target, rate * factor, &unlocked, objective);

        prop_assert_eq!(base.nodes.len(), scaled.nodes.len());
        for (a, b) in base.nodes.iter().zip(&scaled.nodes) {
            prop_assert_eq!(&a.recipe_id, &b.recipe_id);
            prop_assert!(close(a.machine_count * factor, b.machine_count));
            prop_assert!(close(a.total_power * factor, b.total_power));
            for (fa, fb) in a.inputs.iter().chain(&a.outputs).zip(b.inputs.iter().chain(&b.outputs)) {
                prop_assert_eq!(&fa.item_id, &fb.item_id);
                prop_assert!(close(fa.rate * factor, fb.rate));
            }
        }

        prop_assert_eq!(base.raw_resources.len(), scaled.raw_resources.len());
        for (a, b) in base.raw_resources.iter().zip(&scaled.raw_resources) {
            prop_assert_eq!(&a.item_id, &b.item_id);
            prop_assert!(close(a.rate * factor, b.rate));
        }
    }

    #[test]
    fn locking_a_producer_is_reported(
        target in arb_target(),
        rate in 0.1f64..1_000.0,
    ) {
        let catalog = sample::catalog();
        let mut unlocked = standard_unlocks(&catalog);
        for recipe in catalog.get_recipes_producing(&target) {
            unlocked.remove(&recipe.id);
        }

        let result = solve(&catalog, &target, rate, &unlocked, OptimizationObjective::Balanced);
        let name = catalog.item_name(&target);

        prop_assert_eq!(result.status, CalculationStatus::InsufficientRecipes);
        prop_assert!(result.nodes.is_empty());
        prop_assert!(result.missing_recipes.iter().any(|m| m.starts_with(name)));
    }
}
