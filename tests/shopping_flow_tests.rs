use anyhow::Result;
use chrono::NaiveDate;
use pantry_planner::categorization::Category;
use pantry_planner::meal_plan::MealPlan;
use pantry_planner::model::{Recipe, ShoppingItem};
use pantry_planner::nutrition::CookedMealLog;
use pantry_planner::pantry::Pantry;
use pantry_planner::price_catalog::{load_price_catalog, PriceCatalog};
use pantry_planner::price_comparison::{compare_stores, suggest_substitutions};
use pantry_planner::shopping_list::{build_shopping_list, toggle_checked, remaining};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

const FALLBACK: f64 = 2.50;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

fn recipes() -> Vec<Recipe> {
    serde_json::from_value(json!([
        {
            "id": "bolognese",
            "title": "Spaghetti Bolognese",
            "servings": 4,
            "ingredients": [
                {"name": "beef mince", "quantity": 500, "unit": "g"},
                {"name": "chopped tomatoes", "quantity": 400, "unit": "g"},
                {"name": "onion", "quantity": 1},
                {"name": "pasta", "quantity": 500, "unit": "g"},
                {"name": "salt"}
            ],
            "macros_per_serving": {"kcal": 650, "protein_g": 38, "carbs_g": 70, "fat_g": 20, "fiber_g": 6}
        },
        {
            "id": "chilli",
            "recipe_title": "Chilli con Carne",
            "servings": 2,
            "ingredients": [
                {"name": "Beef Mince", "quantity": 0.25, "unit": "kg"},
                {"name": "chopped tomatoes", "quantity": 400, "unit": "g"},
                {"name": "onion", "quantity": 1}
            ]
        }
    ]))
    .unwrap()
}

fn plan() -> MealPlan {
    serde_json::from_value(json!({"meals": [
        {"date": "2026-06-01", "slot": "dinner", "recipe_id": "bolognese", "servings": 4},
        {"date": "2026-06-02", "slot": "dinner", "recipe_id": "chilli", "servings": 4},
        {"date": "2026-06-02", "slot": "lunch", "recipe_id": "missing-recipe"},
        {"date": "2026-06-20", "slot": "dinner", "recipe_id": "bolognese", "servings": 8}
    ]}))
    .unwrap()
}

fn pantry() -> Pantry {
    serde_json::from_value(json!([
        {"name": "pasta", "quantity": 1, "unit": "kg", "category": "pantry"},
        {"name": "onion", "quantity": 1}
    ]))
    .unwrap()
}

fn weekly_list() -> Vec<ShoppingItem> {
    let needs = plan().recipes_needed(&recipes(), day(1), day(7));
    assert_eq!(needs.len(), 2);
    build_shopping_list(&needs, &pantry())
}

#[test]
fn plan_to_list_consolidates_and_subtracts_pantry() {
    let list = weekly_list();
    let names: Vec<&str> = list.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["onion", "beef mince", "chopped tomatoes", "salt"]);

    assert_eq!(list[0].quantity, 2.0);
    assert_eq!(list[0].category, Category::Produce);

    let mince = &list[1];
    assert_eq!(mince.quantity, 1000.0);
    assert_eq!(mince.unit, "g");
    assert_eq!(mince.category, Category::Meat);

    let tomatoes = &list[2];
    assert_eq!(tomatoes.quantity, 1200.0);
    assert_eq!(tomatoes.category, Category::Pantry);
    assert_eq!(tomatoes.sources, vec!["Spaghetti Bolognese".to_string(), "Chilli con Carne".to_string()]);

    assert_eq!(list[3].quantity, 0.0);
    assert_eq!(list[3].category, Category::Spices);
}

#[test]
fn list_prices_at_builtin_stores() {
    let list = weekly_list();
    let catalog = PriceCatalog::builtin();
    let comparison = compare_stores(&list, &catalog, FALLBACK);

    let totals: Vec<(&str, f64)> = comparison.baskets.iter().map(|b| (b.store.as_str(), b.total)).collect();
    // Onions are counted but sold by the kilo, so one bag is bought.
    let expected = [("Tesco", 13.35), ("Sainsbury's", 14.05), ("Asda", 12.64), ("Aldi", 11.04), ("Lidl", 11.33)];
    assert_eq!(totals.len(), expected.len());
    for ((store, total), (expected_store, expected_total)) in totals.iter().zip(expected.iter()) {
        assert_eq!(store, expected_store);
        assert!(close(*total, *expected_total), "{} total {} != {}", store, total, expected_total);
    }

    assert_eq!(comparison.cheapest_store.as_deref(), Some("Aldi"));
    assert!(close(comparison.savings, 14.05 - 11.04));

    let aldi = comparison.cheapest().unwrap();
    assert_eq!(aldi.priced_count, 3);
    assert_eq!(aldi.unpriced_count, 1);
    let salt = aldi.lines.iter().find(|line| line.item_name == "salt").unwrap();
    assert!(salt.estimated);
    assert_eq!(salt.line_total, FALLBACK);
    let mince = aldi.lines.iter().find(|line| line.item_name == "beef mince").unwrap();
    assert_eq!(mince.packs, 2);
    let onion = aldi.lines.iter().find(|line| line.item_name == "onion").unwrap();
    assert_eq!(onion.packs, 1);

    let swaps = suggest_substitutions(&list, "Aldi", &catalog);
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0].substitute, "turkey mince");
    assert!(close(swaps[0].saving, 6.58 - 5.98));
}

#[test]
fn checked_items_drop_out_of_remaining() {
    let mut list = weekly_list();
    assert!(toggle_checked(&mut list, "Salt"));
    assert!(!toggle_checked(&mut list, "saffron"));
    let left: Vec<&str> = remaining(&list).iter().map(|item| item.name.as_str()).collect();
    assert_eq!(left, vec!["onion", "beef mince", "chopped tomatoes"]);
}

#[test]
fn accented_pantry_stock_covers_the_need() {
    let recipes: Vec<Recipe> = serde_json::from_value(json!([
        {"id": "quiche", "title": "Quiche", "ingredients": [
            {"name": "Épinards", "quantity": 200, "unit": "g"},
            {"name": "Œufs", "quantity": 4}
        ]}
    ]))
    .unwrap();
    let pantry: Pantry = serde_json::from_value(json!([
        {"name": "épinards", "quantity": 500, "unit": "g"},
        {"name": "œufs", "quantity": 2}
    ]))
    .unwrap();

    let needs: Vec<(Recipe, f64)> = recipes.into_iter().map(|recipe| (recipe, 1.0)).collect();
    let list = build_shopping_list(&needs, &pantry);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Œufs");
    assert_eq!(list[0].quantity, 2.0);
}

#[test]
fn csv_catalog_ties_go_to_first_store() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Store,Item,Pack Size,Unit,Price")?;
    writeln!(file, "Corner Shop,Basmati Rice,1,kg,1.50")?;
    writeln!(file, "Market,rice,2,kg,£3.00")?;
    file.flush()?;
    let catalog = load_price_catalog(file.path())?;

    let list: Vec<ShoppingItem> = serde_json::from_value(json!([
        {"name": "rice", "quantity": 1500, "unit": "g"},
        {"name": "saffron", "quantity": 1, "unit": "g"}
    ]))?;
    let comparison = compare_stores(&list, &catalog, FALLBACK);

    assert_eq!(comparison.baskets.len(), 2);
    assert!(comparison.baskets.iter().all(|basket| close(basket.total, 5.50)));
    assert_eq!(comparison.cheapest_store.as_deref(), Some("Corner Shop"));
    assert_eq!(comparison.savings, 0.0);
    Ok(())
}

#[test]
fn cooking_a_planned_meal_updates_pantry_and_log() {
    let recipes = recipes();
    let mut pantry = pantry();
    let mut log = CookedMealLog::default();

    assert!(log.log_recipe(day(1), &recipes[0], 2, &mut pantry));
    assert_eq!(log.daily_totals(day(1)).kcal, 1300.0);
    assert_eq!(pantry.available("pasta", "g"), 750.0);
    assert!(pantry.available("onion", "") < 1.0);

    assert!(!log.log_recipe(day(2), &recipes[1], 2, &mut pantry));
}
