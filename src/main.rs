use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

use pantry_planner::api_connection::connection::ApiConnectionError;
use pantry_planner::api_connection::endpoints::Provider;
use pantry_planner::assistant;
use pantry_planner::cli::{parse_args, Command};
use pantry_planner::config::AppConfig;
use pantry_planner::logging;
use pantry_planner::meal_plan::MealPlan;
use pantry_planner::model::{DietaryPreferences, Recipe, ShoppingItem};
use pantry_planner::nutrition::{progress, CookedMealLog};
use pantry_planner::pantry::Pantry;
use pantry_planner::price_catalog::{load_price_catalog, PriceCatalog};
use pantry_planner::price_comparison::{compare_stores, suggest_substitutions, PriceComparison, Substitution};
use pantry_planner::shopping_list::{build_shopping_list, group_by_category};
use pantry_planner::units::format_quantity;

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in '{}'", path.display()))
}

async fn read_optional_json<T: DeserializeOwned + Default>(path: Option<&PathBuf>) -> Result<T> {
    match path {
        Some(path) => read_json(path).await,
        None => Ok(T::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe_amount(quantity: f64, unit: &str) -> String {
    if unit.is_empty() {
        format_quantity(quantity)
    } else {
        format!("{} {}", format_quantity(quantity), unit)
    }
}

fn print_shopping_list(items: &[ShoppingItem]) {
    if items.is_empty() {
        println!("Nothing to buy, the pantry covers everything.");
        return;
    }
    for (category, entries) in group_by_category(items) {
        println!("{}", category);
        for item in entries {
            let mark = if item.checked { "x" } else { " " };
            println!("  [{}] {:<28} {}", mark, item.name, describe_amount(item.quantity, &item.unit));
        }
    }
}

fn print_comparison(comparison: &PriceComparison, substitutions: &[Substitution]) {
    println!("{:<16} {:>9} {:>7} {:>9}", "Store", "Total", "Priced", "Estimated");
    for basket in &comparison.baskets {
        println!(
            "{:<16} {:>9} {:>7} {:>9}",
            basket.store,
            format!("£{:.2}", basket.total),
            basket.priced_count,
            basket.unpriced_count
        );
    }
    match &comparison.cheapest_store {
        Some(store) => println!("\nCheapest: {} (saves £{:.2} over the most expensive)", store, comparison.savings),
        None => println!("\nNo stores in the catalog."),
    }
    if !substitutions.is_empty() {
        println!("\nCheaper swaps:");
        for swap in substitutions {
            println!(
                "  {} -> {} (£{:.2} -> £{:.2}, save £{:.2})",
                swap.original, swap.substitute, swap.original_cost, swap.substitute_cost, swap.saving
            );
        }
    }
}

#[derive(Serialize)]
struct ComparisonReport<'a> {
    comparison: &'a PriceComparison,
    substitutions: &'a [Substitution],
}

fn plan_range(plan: &MealPlan, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    let from = from.or_else(|| plan.meals.iter().map(|m| m.date).min())?;
    let to = to.or_else(|| plan.meals.iter().map(|m| m.date).max())?;
    Some((from, to))
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Shop { recipes, pantry, plan, from, to, json } => {
            let recipes: Vec<Recipe> = read_json(&recipes).await?;
            let pantry: Pantry = read_optional_json(pantry.as_ref()).await?;
            let needs = match plan {
                Some(plan_path) => {
                    let plan: MealPlan = read_json(&plan_path).await?;
                    match plan_range(&plan, from, to) {
                        Some((from, to)) => plan.recipes_needed(&recipes, from, to),
                        None => Vec::new(),
                    }
                }
                None => recipes.into_iter().map(|recipe| (recipe, 1.0)).collect(),
            };
            let list = build_shopping_list(&needs, &pantry);
            info!(recipes = needs.len(), items = list.len(), "shopping list built");
            if json {
                print_json(&list)?;
            } else {
                print_shopping_list(&list);
            }
        }
        Command::Compare { list, catalog, fallback_price, json } => {
            let items: Vec<ShoppingItem> = read_json(&list).await?;
            let catalog = match catalog.or(config.price_catalog_path) {
                Some(path) => load_price_catalog(&path)?,
                None => PriceCatalog::builtin(),
            };
            let fallback_price = fallback_price.unwrap_or(config.fallback_price);
            let comparison = compare_stores(&items, &catalog, fallback_price);
            let substitutions = comparison
                .cheapest_store
                .as_deref()
                .map(|store| suggest_substitutions(&items, store, &catalog))
                .unwrap_or_default();
            if json {
                print_json(&ComparisonReport { comparison: &comparison, substitutions: &substitutions })?;
            } else {
                print_comparison(&comparison, &substitutions);
            }
        }
        Command::Nutrition { log, date, preferences } => {
            let log: CookedMealLog = read_json(&log).await?;
            let preferences: DietaryPreferences = read_optional_json(preferences.as_ref()).await?;
            let totals = log.daily_totals(date);
            let reached = progress(&totals, &preferences.daily_targets);
            let percent = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p));
            println!("Nutrition for {}", date);
            println!("  kcal     {:>8.0}  {}", totals.kcal, percent(reached.kcal));
            println!("  protein  {:>7.1}g  {}", totals.protein_g, percent(reached.protein_g));
            println!("  carbs    {:>7.1}g  {}", totals.carbs_g, percent(reached.carbs_g));
            println!("  fat      {:>7.1}g  {}", totals.fat_g, percent(reached.fat_g));
            println!("  fiber    {:>7.1}g  {}", totals.fiber_g, percent(reached.fiber_g));
        }
        Command::Parse { recipe_file } => {
            let text = fs::read_to_string(&recipe_file)
                .await
                .with_context(|| format!("Failed to read recipe file '{}'", recipe_file.display()))?;
            let provider = Provider::openrouter(&config.gateway);
            print_json(&assistant::parse_recipe(&provider, &text).await?)?;
        }
        Command::Generate { preferences, pantry, prompt } => {
            let preferences: DietaryPreferences = read_optional_json(preferences.as_ref()).await?;
            let pantry: Pantry = read_optional_json(pantry.as_ref()).await?;
            let provider = Provider::openrouter(&config.gateway);
            print_json(&assistant::generate_recipe(&provider, &preferences, &pantry, &prompt).await?)?;
        }
        Command::Steps { recipe, amend } => {
            let recipe: Recipe = read_json(&recipe).await?;
            let provider = Provider::openrouter(&config.gateway);
            let steps = match amend {
                Some(instruction) => assistant::amend_cooking_steps(&provider, &recipe.steps, &instruction).await?,
                None => assistant::generate_cooking_steps(&provider, &recipe).await?,
            };
            print_json(&steps)?;
        }
        Command::Estimate { recipe } => {
            let recipe: Recipe = read_json(&recipe).await?;
            let provider = Provider::openrouter(&config.gateway);
            print_json(&assistant::estimate_nutrients(&provider, &recipe).await?)?;
        }
        Command::Suggest { pantry, preferences } => {
            let pantry: Pantry = read_json(&pantry).await?;
            let preferences: DietaryPreferences = read_optional_json(preferences.as_ref()).await?;
            let provider = Provider::openrouter(&config.gateway);
            print_json(&assistant::suggest_shopping(&provider, &pantry, &preferences).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = parse_args();
    logging::init(cli.verbose);

    let mut config = AppConfig::from_env();
    if let Some(model) = cli.model {
        config.gateway.model = model;
        if !Provider::openrouter(&config.gateway).is_known_model(&config.gateway.model) {
            warn!(model = %config.gateway.model, "model is not in the known gateway list; sending it anyway");
        }
    }

    if let Err(e) = run(cli.command, config).await {
        match e.downcast_ref::<ApiConnectionError>() {
            Some(api_error) => {
                error!(error = %api_error, "AI gateway request failed");
                eprintln!("{}", api_error.user_message());
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
