//! Read-only item and recipe lookup used by the solver

use std::collections::HashMap;

use crate::models::{Item, Recipe};

/// Reference data the solver resolves against.
pub trait Catalog {
    fn get_item(&self, id: &str) -> Option<&Item>;

    fn get_recipe(&self, id: &str) -> Option<&Recipe>;

    /// Every recipe listing `item_id` among its outputs, in catalog order.
    fn get_recipes_producing(&self, item_id: &str) -> Vec<&Recipe>;

    fn is_raw_resource(&self, item_id: &str) -> bool {
        self.get_item(item_id).is_some_and(|i| i.is_raw_resource)
    }

    /// Display name for an item id, or the id itself when unknown.
    fn item_name<'a>(&'a self, item_id: &'a str) -> &'a str {
        self.get_item(item_id).map_or(item_id, |i| i.name.as_str())
    }
}

/// Catalog held in memory with a precomputed producer index.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: Vec<Item>,
    recipes: Vec<Recipe>,
    item_index: HashMap<String, usize>,
    recipe_index: HashMap<String, usize>,
    producers: HashMap<String, Vec<usize>>,
}

impl MemoryCatalog {
    pub fn new(items: Vec<Item>, recipes: Vec<Recipe>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            catalog.insert_item(item);
        }
        for recipe in recipes {
            catalog.insert_recipe(recipe);
        }
        catalog
    }

    /// Insert an item, replacing any existing item with the same id.
    pub fn insert_item(&mut self, item: Item) {
        match self.item_index.get(&item.id) {
            Some(&idx) => self.items[idx] = item,
            None => {
                self.item_index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Insert a recipe, replacing any existing recipe with the same id.
    pub fn insert_recipe(&mut self, recipe: Recipe) {
        match self.recipe_index.get(&recipe.id) {
            Some(&idx) => {
                let old = std::mem::replace(&mut self.recipes[idx], recipe);
                for output in &old.outputs {
                    if let Some(list) = self.producers.get_mut(&output.item_id) {
                        list.retain(|&i| i != idx);
                    }
                }
                self.index_outputs(idx);
            }
            None => {
                let idx = self.recipes.len();
                self.recipe_index.insert(recipe.id.clone(), idx);
                self.recipes.push(recipe);
                self.index_outputs(idx);
            }
        }
    }

    fn index_outputs(&mut self, idx: usize) {
        for output in &self.recipes[idx].outputs {
            let list = self.producers.entry(output.item_id.clone()).or_default();
            // producer lists stay in catalog order
            if let Err(pos) = list.binary_search(&idx) {
                list.insert(pos, idx);
            }
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn raw_resources(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_raw_resource)
    }

    pub fn craftable_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| !i.is_raw_resource)
    }

    /// Ids of every recipe at or below `tier`.
    pub fn recipes_up_to_tier(&self, tier: u32, include_alternates: bool) -> Vec<String> {
        self.recipes
            .iter()
            .filter(|r| r.unlock_tier <= tier && (include_alternates || !r.is_alternate))
            .map(|r| r.id.clone())
            .collect()
    }
}

impl Catalog for MemoryCatalog {
    fn get_item(&self, id: &str) -> Option<&Item> {
        self.item_index.get(id).map(|&i| &self.items[i])
    }

    fn get_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipe_index.get(id).map(|&i| &self.recipes[i])
    }

    fn get_recipes_producing(&self, item_id: &str) -> Vec<&Recipe> {
        self.producers
            .get(item_id)
            .map(|idxs| idxs.iter().map(|&i| &self.recipes[i]).collect())
            .unwrap_or_default()
    }
}
