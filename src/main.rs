//! Satisfactory Production Calculator
//!
//! Command line front end over the catalog database and chain resolver.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use satisfactory_calculator::calculator::{self, DEFAULT_MAX_DEPTH, SolveOptions};
use satisfactory_calculator::catalog::{Catalog, MemoryCatalog};
use satisfactory_calculator::models::{OptimizationObjective, ProductionChainResult};
use satisfactory_calculator::scorer::{self, RecipeFilter};
use satisfactory_calculator::{db, export, extract, report, sample, validation};

#[derive(Parser)]
#[command(name = "satisfactory-calculator")]
#[command(about = "Production chain calculator for Satisfactory")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "satisfactory_data.db", global = true)]
    database: PathBuf,

    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load the built-in item and recipe set
    LoadSample,

    /// Import items and recipes from a directory of JSON data files
    Extract {
        /// Directory holding the data files
        data_dir: PathBuf,

        /// Clear existing data before extraction
        #[arg(long)]
        clear: bool,
    },

    /// List all items in the database
    ListItems {
        /// Only raw resources
        #[arg(long)]
        raw: bool,
    },

    /// List recipes, optionally only those producing an item
    ListRecipes {
        /// Item ID to filter by
        #[arg(short, long)]
        item: Option<String>,
    },

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Calculate production chain for a target item
    Calc {
        /// Target item to produce (e.g., "iron_plate", "modular_frame")
        item: String,

        /// Target production rate: 60, 60/min, 2.5/s or 3600/h
        #[arg(short, long, default_value = "60")]
        rate: String,

        /// Recipe selection policy
        #[arg(short, long, value_enum, default_value_t = Objective::Balanced)]
        objective: Objective,

        /// Unlocked recipe IDs (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        unlock: Vec<String>,

        /// JSON file of unlocked recipes, as written by `unlocks`
        #[arg(long)]
        unlock_file: Option<PathBuf>,

        /// Unlock every recipe up to this tier
        #[arg(long)]
        tier: Option<u32>,

        /// Include alternate recipes when unlocking by tier
        #[arg(long)]
        alternates: bool,

        /// Unlock every recipe in the database
        #[arg(long)]
        all: bool,

        /// Ignore locks and show the full chain with the recipes it would need
        #[arg(long)]
        preview_locked: bool,

        /// Maximum nesting below the target
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Show detailed production tree and machine breakdown
        #[arg(short, long)]
        tree: bool,

        /// Save the result as JSON (file, or directory for a generated name)
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Rank every recipe producing an item under an objective
    Variants {
        /// Item ID
        item: String,

        /// Target production rate: 60, 60/min, 2.5/s or 3600/h
        #[arg(short, long, default_value = "60")]
        rate: String,

        #[arg(short, long, value_enum, default_value_t = Objective::Balanced)]
        objective: Objective,

        /// Maximum number of variants to show
        #[arg(short, long, default_value_t = 5)]
        max: usize,
    },

    /// Show a previously exported result
    Show {
        /// Exported JSON file
        file: PathBuf,

        /// Show detailed production tree
        #[arg(short, long)]
        tree: bool,
    },

    /// Write an unlocked recipe file for a tier
    Unlocks {
        /// Output file
        output: PathBuf,

        /// Highest tier to unlock
        #[arg(long, default_value_t = 0)]
        tier: u32,

        /// Include alternate recipes
        #[arg(long)]
        alternates: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Objective {
    MinimizeMachines,
    MinimizePower,
    MinimizeWaste,
    Balanced,
}

impl From<Objective> for OptimizationObjective {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::MinimizeMachines => Self::MinimizeMachines,
            Objective::MinimizePower => Self::MinimizePower,
            Objective::MinimizeWaste => Self::MinimizeWaste,
            Objective::Balanced => Self::Balanced,
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let items = sample::items();
            let recipes = sample::recipes();
            db::store_catalog(&conn, &items, &recipes)?;
            println!(
                "Sample data loaded: {} items, {} recipes.",
                items.len(),
                recipes.len()
            );
        }

        Commands::Extract { data_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::extract_to_database(&conn, &data_dir)?;
            println!("{}", stats);
        }

        Commands::ListItems { raw } => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'extract' or 'load-sample' first.");
            } else {
                println!("{:<28} {:<28} {:<14} {:>6}", "ID", "Item", "Category", "Stack");
                println!("{}", "-".repeat(79));
                for i in items.iter().filter(|i| !raw || i.is_raw_resource) {
                    println!(
                        "{:<28} {:<28} {:<14} {:>6}",
                        i.id, i.name, i.category, i.stack_size
                    );
                }
            }
        }

        Commands::ListRecipes { item } => {
            let recipes = match &item {
                Some(id) => db::get_producers(&conn, id)?,
                None => db::list_recipes(&conn)?,
            };
            if recipes.is_empty() {
                match item {
                    Some(id) => println!("No recipes produce '{}'", id),
                    None => println!("No recipes in database. Run 'extract' or 'load-sample' first."),
                }
            } else {
                println!("{:<26} {:<34} {:<13} {:>4}", "ID", "Recipe", "Machine", "Tier");
                println!("{}", "-".repeat(80));
                for r in recipes {
                    let marker = if r.is_alternate { " *" } else { "" };
                    println!(
                        "{:<26} {:<34} {:<13} {:>4}{}",
                        r.id, r.name, r.machine_type, r.unlock_tier, marker
                    );
                }
            }
        }

        Commands::Recipe { id } => {
            let catalog = db::load_catalog(&conn)?;
            match catalog.get_recipe(&id) {
                Some(r) => {
                    println!("Recipe: {}", r.name);
                    println!("  ID: {}", r.id);
                    println!("  Machine: {}", r.machine_type);
                    println!("  Tier: {}", report::tier_name(r.unlock_tier));
                    println!("  Alternate: {}", if r.is_alternate { "yes" } else { "no" });
                    println!("  Cycle: {}s", r.crafting_time);
                    println!("  Power: {}", report::format_power(r.power_consumption));

                    println!("  Inputs:");
                    for i in &r.inputs {
                        println!(
                            "    {} x{} ({})",
                            catalog.item_name(&i.item_id),
                            i.amount,
                            report::format_rate(r.per_minute(i.amount))
                        );
                    }
                    println!("  Outputs:");
                    for o in &r.outputs {
                        println!(
                            "    {} x{} ({})",
                            catalog.item_name(&o.item_id),
                            o.amount,
                            report::format_rate(r.per_minute(o.amount))
                        );
                    }
                }
                None => println!("Recipe '{}' not found", id),
            }
        }

        Commands::Calc {
            item,
            rate,
            objective,
            unlock,
            unlock_file,
            tier,
            alternates,
            all,
            preview_locked,
            max_depth,
            tree,
            export: export_path,
        } => {
            let catalog = load_populated_catalog(&conn)?;
            let rate = validation::parse_rate(&rate)?;
            let unlocked = resolve_unlocks(
                &catalog,
                &unlock,
                unlock_file.as_deref(),
                tier,
                alternates,
                all,
            )?;
            validation::validate_calculation_inputs(&catalog, &item, rate, &unlocked)?;

            let options = SolveOptions {
                objective: objective.into(),
                allow_locked_preview: preview_locked,
                max_depth,
            };
            let result =
                calculator::calculate_production_chain(&catalog, &item, rate, &unlocked, &options);

            if tree {
                println!("Production chain:\n");
                println!("{}", report::format_production_chain(&result));
                println!("Machines by type:");
                println!("{}", report::format_stages(&result));
            }
            println!("{}", report::format_summary(&result));
            print_unlock_hints(&catalog, &result, &unlocked, preview_locked);

            if let Some(path) = export_path {
                let path = if path.is_dir() {
                    path.join(export::create_download_filename(&result, "json"))
                } else {
                    path
                };
                export::export_to_file(&result, &path)?;
                println!("\nSaved to {}", path.display());
            }
        }

        Commands::Variants {
            item,
            rate,
            objective,
            max,
        } => {
            let catalog = load_populated_catalog(&conn)?;
            let rate = validation::parse_rate(&rate)?;
            validation::validate_target_item(&catalog, &item)?;
            validation::validate_target_rate(rate)?;

            let producers = catalog.get_recipes_producing(&item);
            if producers.is_empty() {
                println!("No recipes produce {}", catalog.item_name(&item));
            } else {
                let objective = OptimizationObjective::from(objective);
                println!(
                    "Recipes for {} at {} ({}):",
                    catalog.item_name(&item),
                    report::format_rate(rate),
                    objective
                );
                let variants =
                    scorer::recipe_variants(&producers, objective, rate, RecipeFilter::Any, max);
                for (rank, (recipe, score)) in variants.into_iter().enumerate() {
                    let marker = if recipe.is_alternate { " (alt)" } else { "" };
                    println!(
                        "  {}. {}{} - {} - score {:.2}, {:.2}/min per MW",
                        rank + 1,
                        recipe.name,
                        marker,
                        recipe.machine_type,
                        score,
                        scorer::recipe_efficiency(recipe)
                    );
                }
            }
        }

        Commands::Show { file, tree } => {
            let result = export::import_from_file(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            if let Some(timestamp) = &result.timestamp {
                println!("Calculated at {}\n", timestamp);
            }
            if tree {
                println!("{}", report::format_production_chain(&result));
            }
            println!("{}", report::format_summary(&result));
        }

        Commands::Unlocks {
            output,
            tier,
            alternates,
        } => {
            let catalog = load_populated_catalog(&conn)?;
            let unlocked: BTreeSet<String> =
                catalog.recipes_up_to_tier(tier, alternates).into_iter().collect();

            let by_tier = report::recipes_by_tier(
                catalog
                    .recipes()
                    .iter()
                    .filter(|r| unlocked.contains(&r.id))
                    .map(|r| (r.unlock_tier, r.id.as_str())),
            );
            for (tier, ids) in &by_tier {
                println!("{}: {}", report::tier_name(*tier), ids.join(", "));
            }

            export::write_unlocked_recipes(&unlocked, &output)?;
            println!("\nWrote {} recipes to {}", unlocked.len(), output.display());
        }
    }

    Ok(())
}

fn load_populated_catalog(conn: &Connection) -> Result<MemoryCatalog> {
    let catalog = db::load_catalog(conn)?;
    if catalog.items().is_empty() {
        bail!("No data in database. Run 'extract' or 'load-sample' first.");
    }
    Ok(catalog)
}

/// Collect the unlocked set from the command line sources. With no source
/// given, every standard recipe is unlocked.
fn resolve_unlocks(
    catalog: &MemoryCatalog,
    ids: &[String],
    file: Option<&Path>,
    tier: Option<u32>,
    alternates: bool,
    all: bool,
) -> Result<BTreeSet<String>> {
    if all {
        return Ok(catalog.recipes().iter().map(|r| r.id.clone()).collect());
    }

    let mut unlocked: BTreeSet<String> = ids.iter().cloned().collect();
    if let Some(path) = file {
        let from_file = export::read_unlocked_recipes(path)
            .with_context(|| format!("Failed to read unlocked recipes from {}", path.display()))?;
        unlocked.extend(from_file);
    }
    match tier {
        Some(tier) => unlocked.extend(catalog.recipes_up_to_tier(tier, alternates)),
        None if ids.is_empty() && file.is_none() => {
            unlocked.extend(catalog.recipes_up_to_tier(u32::MAX, alternates))
        }
        None => {}
    }
    Ok(unlocked)
}

fn print_unlock_hints(
    catalog: &MemoryCatalog,
    result: &ProductionChainResult,
    unlocked: &BTreeSet<String>,
    preview: bool,
) {
    if preview {
        let locked: Vec<_> = result
            .nodes
            .iter()
            .filter(|n| !unlocked.contains(&n.recipe_id))
            .collect();
        if locked.is_empty() {
            return;
        }
        println!("\nLocked recipes in this chain:");
        for node in locked {
            let options: Vec<&str> = catalog
                .get_recipes_producing(&node.item_produced)
                .into_iter()
                .map(|r| r.name.as_str())
                .collect();
            println!(
                "  {}",
                validation::missing_recipe_message(&node.item_produced_name, &options)
            );
        }
    } else if !result.missing_recipes.is_empty() {
        println!("\nRun again with --preview-locked to see the full chain.");
    }
}
