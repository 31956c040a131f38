//! Built-in Satisfactory reference data
//!
//! Covers the early and mid game: ores, ingots, constructor and assembler
//! parts, oil products and a handful of alternate recipes.

use crate::catalog::MemoryCatalog;
use crate::models::{Ingredient, Item, Recipe};

fn item(id: &str, name: &str, category: &str, stack_size: u32, raw: bool) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        is_raw_resource: raw,
        stack_size,
    }
}

#[allow(clippy::too_many_arguments)]
fn recipe(
    id: &str,
    name: &str,
    category: &str,
    tier: u32,
    machine: &str,
    power: f64,
    crafting_time: f64,
    alternate: bool,
    inputs: &[(&str, f64)],
    outputs: &[(&str, f64)],
) -> Recipe {
    let ingredients = |list: &[(&str, f64)]| -> Vec<Ingredient> {
        list.iter()
            .map(|&(id, amount)| Ingredient::new(id, amount))
            .collect()
    };
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        unlock_tier: tier,
        machine_type: machine.to_string(),
        power_consumption: power,
        crafting_time,
        is_alternate: alternate,
        inputs: ingredients(inputs),
        outputs: ingredients(outputs),
    }
}

pub fn items() -> Vec<Item> {
    vec![
        // Raw resources
        item("iron_ore", "Iron Ore", "Raw Resource", 100, true),
        item("copper_ore", "Copper Ore", "Raw Resource", 100, true),
        item("limestone", "Limestone", "Raw Resource", 100, true),
        item("coal", "Coal", "Raw Resource", 100, true),
        item("caterium_ore", "Caterium Ore", "Raw Resource", 100, true),
        item("raw_quartz", "Raw Quartz", "Raw Resource", 100, true),
        item("crude_oil", "Crude Oil", "Raw Resource", 1, true),
        item("water", "Water", "Raw Resource", 1, true),
        // Ingots
        item("iron_ingot", "Iron Ingot", "Ingot", 100, false),
        item("copper_ingot", "Copper Ingot", "Ingot", 100, false),
        item("steel_ingot", "Steel Ingot", "Ingot", 100, false),
        item("caterium_ingot", "Caterium Ingot", "Ingot", 100, false),
        // Materials
        item("concrete", "Concrete", "Material", 100, false),
        item("wire", "Wire", "Material", 500, false),
        item("cable", "Cable", "Material", 200, false),
        item("iron_rod", "Iron Rod", "Material", 200, false),
        item("iron_plate", "Iron Plate", "Material", 200, false),
        item("reinforced_iron_plate", "Reinforced Iron Plate", "Material", 100, false),
        item("screw", "Screw", "Material", 500, false),
        item("steel_beam", "Steel Beam", "Material", 100, false),
        item("steel_pipe", "Steel Pipe", "Material", 100, false),
        item("encased_industrial_beam", "Encased Industrial Beam", "Material", 100, false),
        item("quickwire", "Quickwire", "Material", 500, false),
        item("quartz_crystal", "Quartz Crystal", "Material", 100, false),
        // Components
        item("rotor", "Rotor", "Component", 100, false),
        item("modular_frame", "Modular Frame", "Component", 50, false),
        item("smart_plating", "Smart Plating", "Component", 50, false),
        item("stator", "Stator", "Component", 100, false),
        item("motor", "Motor", "Component", 50, false),
        item("heavy_modular_frame", "Heavy Modular Frame", "Component", 50, false),
        item("ai_limiter", "AI Limiter", "Component", 100, false),
        item("computer", "Computer", "Component", 50, false),
        item("circuit_board", "Circuit Board", "Component", 200, false),
        // Oil products
        item("plastic", "Plastic", "Oil Product", 100, false),
        item("rubber", "Rubber", "Oil Product", 100, false),
    ]
}

pub fn recipes() -> Vec<Recipe> {
    vec![
        // Smelter / Foundry
        recipe("iron_ingot", "Iron Ingot", "Smelting", 0, "Smelter", 4.0, 2.0, false,
            &[("iron_ore", 30.0)], &[("iron_ingot", 30.0)]),
        recipe("copper_ingot", "Copper Ingot", "Smelting", 0, "Smelter", 4.0, 2.0, false,
            &[("copper_ore", 30.0)], &[("copper_ingot", 30.0)]),
        recipe("steel_ingot", "Steel Ingot", "Smelting", 3, "Foundry", 16.0, 4.0, false,
            &[("iron_ore", 45.0), ("coal", 45.0)], &[("steel_ingot", 45.0)]),
        recipe("caterium_ingot", "Caterium Ingot", "Smelting", 2, "Smelter", 4.0, 4.0, false,
            &[("caterium_ore", 45.0)], &[("caterium_ingot", 15.0)]),
        // Constructor
        recipe("concrete", "Concrete", "Construction", 0, "Constructor", 4.0, 4.0, false,
            &[("limestone", 45.0)], &[("concrete", 15.0)]),
        recipe("iron_rod", "Iron Rod", "Material", 0, "Constructor", 4.0, 4.0, false,
            &[("iron_ingot", 15.0)], &[("iron_rod", 15.0)]),
        recipe("iron_plate", "Iron Plate", "Material", 0, "Constructor", 4.0, 6.0, false,
            &[("iron_ingot", 30.0)], &[("iron_plate", 20.0)]),
        recipe("screw", "Screw", "Material", 0, "Constructor", 4.0, 2.0, false,
            &[("iron_rod", 10.0)], &[("screw", 40.0)]),
        recipe("wire", "Wire", "Material", 0, "Constructor", 4.0, 4.0, false,
            &[("copper_ingot", 15.0)], &[("wire", 30.0)]),
        recipe("cable", "Cable", "Material", 0, "Constructor", 4.0, 2.0, false,
            &[("wire", 60.0)], &[("cable", 30.0)]),
        recipe("steel_beam", "Steel Beam", "Material", 3, "Constructor", 4.0, 4.0, false,
            &[("steel_ingot", 60.0)], &[("steel_beam", 15.0)]),
        recipe("steel_pipe", "Steel Pipe", "Material", 3, "Constructor", 4.0, 6.0, false,
            &[("steel_ingot", 30.0)], &[("steel_pipe", 20.0)]),
        recipe("quickwire", "Quickwire", "Material", 2, "Constructor", 4.0, 5.0, false,
            &[("caterium_ingot", 12.0)], &[("quickwire", 60.0)]),
        recipe("quartz_crystal", "Quartz Crystal", "Material", 2, "Constructor", 4.0, 8.0, false,
            &[("raw_quartz", 37.5)], &[("quartz_crystal", 22.5)]),
        // Assembler
        recipe("reinforced_iron_plate", "Reinforced Iron Plate", "Material", 0, "Assembler", 15.0, 12.0, false,
            &[("iron_plate", 30.0), ("screw", 60.0)], &[("reinforced_iron_plate", 5.0)]),
        recipe("rotor", "Rotor", "Component", 1, "Assembler", 15.0, 15.0, false,
            &[("iron_rod", 20.0), ("screw", 100.0)], &[("rotor", 4.0)]),
        recipe("modular_frame", "Modular Frame", "Component", 2, "Assembler", 15.0, 60.0, false,
            &[("reinforced_iron_plate", 3.0), ("iron_rod", 12.0)], &[("modular_frame", 2.0)]),
        recipe("smart_plating", "Smart Plating", "Component", 1, "Assembler", 15.0, 30.0, false,
            &[("reinforced_iron_plate", 1.0), ("rotor", 1.0)], &[("smart_plating", 1.0)]),
        recipe("encased_industrial_beam", "Encased Industrial Beam", "Material", 4, "Assembler", 15.0, 10.0, false,
            &[("steel_beam", 24.0), ("concrete", 30.0)], &[("encased_industrial_beam", 6.0)]),
        recipe("stator", "Stator", "Component", 4, "Assembler", 15.0, 12.0, false,
            &[("steel_pipe", 15.0), ("wire", 40.0)], &[("stator", 5.0)]),
        recipe("motor", "Motor", "Component", 4, "Assembler", 15.0, 12.0, false,
            &[("rotor", 10.0), ("stator", 10.0)], &[("motor", 5.0)]),
        recipe("ai_limiter", "AI Limiter", "Component", 5, "Assembler", 15.0, 12.0, false,
            &[("copper_ingot", 25.0), ("quickwire", 100.0)], &[("ai_limiter", 5.0)]),
        recipe("circuit_board", "Circuit Board", "Component", 5, "Assembler", 15.0, 8.0, false,
            &[("copper_ingot", 15.0), ("plastic", 30.0)], &[("circuit_board", 7.5)]),
        // Manufacturer
        recipe("heavy_modular_frame", "Heavy Modular Frame", "Component", 4, "Manufacturer", 55.0, 30.0, false,
            &[("modular_frame", 10.0), ("steel_pipe", 30.0), ("encased_industrial_beam", 10.0), ("screw", 200.0)],
            &[("heavy_modular_frame", 2.0)]),
        recipe("computer", "Computer", "Component", 5, "Manufacturer", 55.0, 24.0, false,
            &[("circuit_board", 25.0), ("cable", 22.5), ("plastic", 45.0), ("screw", 130.0)],
            &[("computer", 2.5)]),
        // Refinery
        recipe("plastic", "Plastic", "Oil Product", 5, "Refinery", 30.0, 6.0, false,
            &[("crude_oil", 30.0)], &[("plastic", 20.0)]),
        recipe("rubber", "Rubber", "Oil Product", 5, "Refinery", 30.0, 6.0, false,
            &[("crude_oil", 30.0)], &[("rubber", 20.0)]),
        // Alternates
        recipe("iron_wire", "Iron Wire (Alternate)", "Material", 0, "Constructor", 4.0, 24.0, true,
            &[("iron_ingot", 50.0)], &[("wire", 90.0)]),
        recipe("stitched_iron_plate", "Stitched Iron Plate (Alternate)", "Material", 0, "Assembler", 15.0, 32.0, true,
            &[("iron_plate", 18.75), ("wire", 37.5)], &[("reinforced_iron_plate", 5.625)]),
        recipe("bolted_frame", "Bolted Frame (Alternate)", "Component", 2, "Assembler", 15.0, 24.0, true,
            &[("reinforced_iron_plate", 7.5), ("screw", 140.0)], &[("modular_frame", 5.0)]),
    ]
}

pub fn catalog() -> MemoryCatalog {
    MemoryCatalog::new(items(), recipes())
}

/// Ids of every recipe in the sample data.
pub fn all_recipe_ids() -> Vec<String> {
    recipes().into_iter().map(|r| r.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_every_ingredient_is_a_known_item() {
        let catalog = catalog();
        for recipe in catalog.recipes() {
            for ing in recipe.inputs.iter().chain(&recipe.outputs) {
                assert!(
                    catalog.get_item(&ing.item_id).is_some(),
                    "{} references unknown item {}",
                    recipe.id,
                    ing.item_id
                );
            }
        }
    }

    #[test]
    fn test_raw_resources_have_no_producers() {
        let catalog = catalog();
        for raw in catalog.raw_resources() {
            assert!(catalog.get_recipes_producing(&raw.id).is_empty());
        }
        assert_eq!(catalog.raw_resources().count(), 8);
    }
}
