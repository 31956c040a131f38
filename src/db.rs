//! Database schema and operations

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::catalog::MemoryCatalog;
use crate::models::{Ingredient, Item, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Items, raw resources included
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            is_raw_resource INTEGER NOT NULL DEFAULT 0,
            stack_size INTEGER NOT NULL DEFAULT 100
        );

        -- Recipe definitions
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            unlock_tier INTEGER NOT NULL DEFAULT 0,
            machine_type TEXT NOT NULL,
            power_mw REAL NOT NULL DEFAULT 0,
            crafting_time_s REAL NOT NULL,
            is_alternate INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL
        );

        -- Ingredients consumed per cycle
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        -- Products per cycle
        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_item ON recipe_outputs(item_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, category, is_raw_resource, stack_size)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &item.id,
            &item.name,
            &item.category,
            item.is_raw_resource,
            item.stack_size,
        ),
    )?;
    Ok(())
}

/// Insert or replace a recipe along with its ingredient lists
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    // a replaced recipe keeps its original position
    let position: i64 = tx
        .query_row(
            "SELECT position FROM recipes WHERE id = ?1",
            [&recipe.id],
            |row| row.get(0),
        )
        .optional()?
        .map_or_else(
            || tx.query_row("SELECT COALESCE(MAX(position) + 1, 0) FROM recipes", [], |row| row.get(0)),
            Ok,
        )?;

    tx.execute(
        "INSERT OR REPLACE INTO recipes
            (id, name, category, unlock_tier, machine_type, power_mw, crafting_time_s, is_alternate, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            &recipe.id,
            &recipe.name,
            &recipe.category,
            recipe.unlock_tier,
            &recipe.machine_type,
            recipe.power_consumption,
            recipe.crafting_time,
            recipe.is_alternate,
            position,
        ),
    )?;

    tx.execute("DELETE FROM recipe_inputs WHERE recipe_id = ?1", [&recipe.id])?;
    tx.execute("DELETE FROM recipe_outputs WHERE recipe_id = ?1", [&recipe.id])?;

    for (pos, input) in recipe.inputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO recipe_inputs (recipe_id, position, item_id, amount) VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, pos as i64, &input.item_id, input.amount),
        )?;
    }
    for (pos, output) in recipe.outputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO recipe_outputs (recipe_id, position, item_id, amount) VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, pos as i64, &output.item_id, output.amount),
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        is_raw_resource: row.get(3)?,
        stack_size: row.get(4)?,
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        unlock_tier: row.get(3)?,
        machine_type: row.get(4)?,
        power_consumption: row.get(5)?,
        crafting_time: row.get(6)?,
        is_alternate: row.get(7)?,
        inputs: Vec::new(),
        outputs: Vec::new(),
    })
}

const RECIPE_COLUMNS: &str =
    "id, name, category, unlock_tier, machine_type, power_mw, crafting_time_s, is_alternate";

fn load_ingredients(conn: &Connection, table: &str, recipe_id: &str) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT item_id, amount FROM {table} WHERE recipe_id = ?1 ORDER BY position"
    ))?;
    let rows = stmt.query_map([recipe_id], |row| {
        Ok(Ingredient {
            item_id: row.get(0)?,
            amount: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn with_ingredients(conn: &Connection, mut recipe: Recipe) -> Result<Recipe> {
    recipe.inputs = load_ingredients(conn, "recipe_inputs", &recipe.id)?;
    recipe.outputs = load_ingredients(conn, "recipe_outputs", &recipe.id)?;
    Ok(recipe)
}

/// Get a single item
pub fn get_item(conn: &Connection, id: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT id, name, category, is_raw_resource, stack_size FROM items WHERE id = ?1",
            [id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

/// Get a single recipe with its inputs and outputs
pub fn get_recipe(conn: &Connection, id: &str) -> Result<Option<Recipe>> {
    let recipe = conn
        .query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
            [id],
            recipe_from_row,
        )
        .optional()?;
    recipe.map(|r| with_ingredients(conn, r)).transpose()
}

/// List all items, raw resources first
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, is_raw_resource, stack_size FROM items
         ORDER BY is_raw_resource DESC, category, name",
    )?;
    let rows = stmt.query_map([], item_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all recipes in insertion order
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY position"
    ))?;
    let rows = stmt.query_map([], recipe_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(with_ingredients(conn, row?)?);
    }
    Ok(results)
}

/// Get all recipes that produce a given item
pub fn get_producers(conn: &Connection, item_id: &str) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes
         WHERE id IN (SELECT recipe_id FROM recipe_outputs WHERE item_id = ?1)
         ORDER BY position"
    ))?;
    let rows = stmt.query_map([item_id], recipe_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(with_ingredients(conn, row?)?);
    }
    Ok(results)
}

/// Load every item and recipe into an in-memory catalog
pub fn load_catalog(conn: &Connection) -> Result<MemoryCatalog> {
    Ok(MemoryCatalog::new(list_items(conn)?, list_recipes(conn)?))
}

/// Replace the catalog contents with the given data
pub fn store_catalog(conn: &Connection, items: &[Item], recipes: &[Recipe]) -> Result<()> {
    clear_catalog(conn)?;
    for item in items {
        upsert_item(conn, item)?;
    }
    for recipe in recipes {
        upsert_recipe(conn, recipe)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sample;

    fn sample_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        store_catalog(&conn, &sample::items(), &sample::recipes()).unwrap();
        conn
    }

    #[test]
    fn test_catalog_survives_storage() {
        let conn = sample_db();
        let loaded = load_catalog(&conn).unwrap();
        let original = sample::catalog();

        assert_eq!(loaded.recipes(), original.recipes());
        assert_eq!(loaded.items().len(), original.items().len());
        assert_eq!(
            loaded.get_item("crude_oil"),
            original.get_item("crude_oil")
        );
    }

    #[test]
    fn test_producers_keep_order() {
        let conn = sample_db();
        let ids: Vec<_> = get_producers(&conn, "wire")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["wire", "iron_wire"]);
    }

    #[test]
    fn test_upsert_replaces_ingredients_in_place() {
        let conn = sample_db();
        let mut screw = get_recipe(&conn, "screw").unwrap().unwrap();
        screw.inputs = vec![Ingredient::new("iron_ingot", 12.5)];
        upsert_recipe(&conn, &screw).unwrap();

        let stored = get_recipe(&conn, "screw").unwrap().unwrap();
        assert_eq!(stored.inputs, vec![Ingredient::new("iron_ingot", 12.5)]);

        let order: Vec<_> = list_recipes(&conn).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(order.iter().position(|id| id == "screw"), Some(7));
    }

    #[test]
    fn test_missing_rows() {
        let conn = sample_db();
        assert!(get_item(&conn, "nope").unwrap().is_none());
        assert!(get_recipe(&conn, "nope").unwrap().is_none());
        clear_catalog(&conn).unwrap();
        assert!(list_items(&conn).unwrap().is_empty());
    }
}
