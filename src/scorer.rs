//! Recipe scoring for the optimization objectives

use std::collections::BTreeSet;

use crate::models::{OptimizationObjective, Recipe};

/// Figures derived from a recipe for a given target rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipeMetrics {
    pub output_rate_per_machine: f64,
    pub machines_needed: f64,
    pub total_power: f64,
    pub input_complexity: usize,
    pub total_input_rate: f64,
}

impl RecipeMetrics {
    pub fn new(recipe: &Recipe, target_rate: f64) -> Self {
        let output_amount: f64 = recipe.outputs.iter().map(|o| o.amount).sum();
        let output_rate_per_machine = recipe.per_minute(output_amount);

        let machines_needed = if output_rate_per_machine > 0.0 {
            target_rate / output_rate_per_machine
        } else {
            f64::INFINITY
        };

        let total_input_rate = recipe
            .inputs
            .iter()
            .map(|i| recipe.per_minute(i.amount) * machines_needed)
            .sum();

        Self {
            output_rate_per_machine,
            machines_needed,
            total_power: machines_needed * recipe.power_consumption,
            input_complexity: recipe.inputs.len(),
            total_input_rate,
        }
    }
}

/// Score a recipe for the objective. Higher is better.
pub fn score_recipe(recipe: &Recipe, objective: OptimizationObjective, target_rate: f64) -> f64 {
    let m = RecipeMetrics::new(recipe, target_rate);
    let complexity = m.input_complexity as f64;

    match objective {
        OptimizationObjective::MinimizeMachines => {
            1000.0 / (m.machines_needed + 1.0) - complexity * 10.0
        }
        OptimizationObjective::MinimizePower => 1000.0 / (m.total_power + 1.0),
        OptimizationObjective::MinimizeWaste => {
            let efficiency =
                m.output_rate_per_machine / (m.total_input_rate / m.machines_needed + 1.0);
            efficiency * 100.0
        }
        OptimizationObjective::Balanced => {
            let machine_score = 100.0 / (m.machines_needed + 1.0);
            let power_score = 100.0 / (m.total_power + 1.0);
            machine_score + power_score - complexity * 5.0
        }
    }
}

/// Which recipes a selection may pick from.
#[derive(Debug, Clone, Copy)]
pub enum RecipeFilter<'a> {
    /// Only recipes whose id is in the set.
    Unlocked(&'a BTreeSet<String>),
    /// Every candidate, locked or not.
    Any,
}

impl RecipeFilter<'_> {
    pub fn allows(&self, recipe: &Recipe) -> bool {
        match self {
            Self::Unlocked(set) => set.contains(&recipe.id),
            Self::Any => true,
        }
    }
}

/// Outcome of picking a recipe for an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'r> {
    Best(&'r Recipe),
    /// No recipe produces the item at all.
    NoCandidates,
    /// Recipes exist but the filter rejected all of them.
    AllLocked,
}

impl<'r> Selection<'r> {
    pub fn recipe(&self) -> Option<&'r Recipe> {
        match self {
            Self::Best(recipe) => Some(recipe),
            Self::NoCandidates | Self::AllLocked => None,
        }
    }
}

// NaN scores never win a comparison
fn comparable(score: f64) -> f64 {
    if score.is_nan() { f64::NEG_INFINITY } else { score }
}

/// Pick the highest scoring allowed recipe; ties go to the earlier candidate.
pub fn select_best_recipe<'r>(
    recipes: &[&'r Recipe],
    objective: OptimizationObjective,
    target_rate: f64,
    filter: RecipeFilter<'_>,
) -> Selection<'r> {
    if recipes.is_empty() {
        return Selection::NoCandidates;
    }

    let mut best: Option<(&'r Recipe, f64)> = None;
    for &recipe in recipes.iter().filter(|r| filter.allows(r)) {
        let score = comparable(score_recipe(recipe, objective, target_rate));
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((recipe, score)),
        }
    }

    match best {
        Some((recipe, _)) => Selection::Best(recipe),
        None => Selection::AllLocked,
    }
}

/// The top `max_variants` allowed recipes with their scores, best first.
pub fn recipe_variants<'r>(
    recipes: &[&'r Recipe],
    objective: OptimizationObjective,
    target_rate: f64,
    filter: RecipeFilter<'_>,
    max_variants: usize,
) -> Vec<(&'r Recipe, f64)> {
    let mut scored: Vec<_> = recipes
        .iter()
        .filter(|r| filter.allows(r))
        .map(|&r| (r, score_recipe(r, objective, target_rate)))
        .collect();

    // stable sort keeps catalog order among equal scores
    scored.sort_by(|a, b| comparable(b.1).total_cmp(&comparable(a.1)));
    scored.truncate(max_variants);
    scored
}

/// Output per minute per MW, or the plain output rate for unpowered recipes.
pub fn recipe_efficiency(recipe: &Recipe) -> f64 {
    let output_amount: f64 = recipe.outputs.iter().map(|o| o.amount).sum();
    let output_rate = recipe.per_minute(output_amount);

    if recipe.power_consumption > 0.0 {
        output_rate / recipe.power_consumption
    } else {
        output_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sample;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_metrics_for_iron_plate() {
        let catalog = sample::catalog();
        let plate = catalog.get_recipe("iron_plate").unwrap();
        let m = RecipeMetrics::new(plate, 60.0);

        assert!(approx(m.output_rate_per_machine, 200.0));
        assert!(approx(m.machines_needed, 0.3));
        assert!(approx(m.total_power, 1.2));
        assert_eq!(m.input_complexity, 1);
        assert!(approx(m.total_input_rate, 90.0));
    }

    #[test]
    fn test_objective_formulas() {
        let catalog = sample::catalog();
        let plate = catalog.get_recipe("iron_plate").unwrap();

        let machines = score_recipe(plate, OptimizationObjective::MinimizeMachines, 60.0);
        assert!(approx(machines, 1000.0 / 1.3 - 10.0));

        let power = score_recipe(plate, OptimizationObjective::MinimizePower, 60.0);
        assert!(approx(power, 1000.0 / 2.2));

        let waste = score_recipe(plate, OptimizationObjective::MinimizeWaste, 60.0);
        assert!(approx(waste, 100.0 * 200.0 / (300.0 + 1.0)));

        let balanced = score_recipe(plate, OptimizationObjective::Balanced, 60.0);
        assert!(approx(balanced, 100.0 / 1.3 + 100.0 / 2.2 - 5.0));
    }

    #[test]
    fn test_select_best_prefers_higher_score() {
        let catalog = sample::catalog();
        let candidates = catalog.get_recipes_producing("wire");
        let unlocked: BTreeSet<String> = ["wire", "iron_wire"].iter().map(|s| s.to_string()).collect();

        // Iron Wire: 90 per 24s = 225/min vs Wire: 30 per 4s = 450/min
        let best = select_best_recipe(
            &candidates,
            OptimizationObjective::MinimizeMachines,
            100.0,
            RecipeFilter::Unlocked(&unlocked),
        );
        assert_eq!(best.recipe().map(|r| r.id.as_str()), Some("wire"));
    }

    #[test]
    fn test_select_best_distinguishes_missing_from_locked() {
        let catalog = sample::catalog();
        let empty = BTreeSet::new();

        let none = select_best_recipe(
            &catalog.get_recipes_producing("iron_ore"),
            OptimizationObjective::Balanced,
            10.0,
            RecipeFilter::Unlocked(&empty),
        );
        assert_eq!(none, Selection::NoCandidates);

        let locked = select_best_recipe(
            &catalog.get_recipes_producing("screw"),
            OptimizationObjective::Balanced,
            10.0,
            RecipeFilter::Unlocked(&empty),
        );
        assert_eq!(locked, Selection::AllLocked);

        let preview = select_best_recipe(
            &catalog.get_recipes_producing("screw"),
            OptimizationObjective::Balanced,
            10.0,
            RecipeFilter::Any,
        );
        assert_eq!(preview.recipe().map(|r| r.id.as_str()), Some("screw"));
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let catalog = sample::catalog();
        let plastic = catalog.get_recipe("plastic").unwrap();
        let mut twin = plastic.clone();
        twin.id = "plastic_twin".into();

        let candidates = vec![plastic, &twin];
        let best = select_best_recipe(&candidates, OptimizationObjective::Balanced, 20.0, RecipeFilter::Any);
        assert_eq!(best.recipe().map(|r| r.id.as_str()), Some("plastic"));

        let reversed = vec![&twin, plastic];
        let best = select_best_recipe(&reversed, OptimizationObjective::Balanced, 20.0, RecipeFilter::Any);
        assert_eq!(best.recipe().map(|r| r.id.as_str()), Some("plastic_twin"));
    }

    #[test]
    fn test_zero_output_recipe_never_wins() {
        let catalog = sample::catalog();
        let wire = catalog.get_recipe("wire").unwrap();
        let mut broken = wire.clone();
        broken.id = "broken".into();
        broken.outputs[0].amount = 0.0;

        let candidates = vec![&broken, wire];
        for objective in [
            OptimizationObjective::MinimizeMachines,
            OptimizationObjective::MinimizePower,
            OptimizationObjective::MinimizeWaste,
            OptimizationObjective::Balanced,
        ] {
            let best = select_best_recipe(&candidates, objective, 30.0, RecipeFilter::Any);
            assert_eq!(best.recipe().map(|r| r.id.as_str()), Some("wire"), "{objective}");
        }
    }

    #[test]
    fn test_variants_are_ranked() {
        let catalog = sample::catalog();
        let candidates = catalog.get_recipes_producing("modular_frame");
        let variants = recipe_variants(&candidates, OptimizationObjective::MinimizeMachines, 10.0, RecipeFilter::Any, 3);

        assert_eq!(variants.len(), 2);
        assert!(variants[0].1 >= variants[1].1);
        assert_eq!(variants[0].0.id, "bolted_frame");

        let one = recipe_variants(&candidates, OptimizationObjective::MinimizeMachines, 10.0, RecipeFilter::Any, 1);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_efficiency() {
        let catalog = sample::catalog();
        let ingot = catalog.get_recipe("iron_ingot").unwrap();
        assert!(approx(recipe_efficiency(ingot), 900.0 / 4.0));

        let mut unpowered = ingot.clone();
        unpowered.power_consumption = 0.0;
        assert!(approx(recipe_efficiency(&unpowered), 900.0));
    }
}
