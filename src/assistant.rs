//! AI-backed helpers: each builds a prompt, makes one gateway call and maps
//! the model's JSON (in whatever shape it chose) onto the crate's types.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api_connection::connection::{first_content, ApiConnectionError};
use crate::api_connection::endpoints::Provider;
use crate::categorization::{categorize, Category};
use crate::model::{DietaryPreferences, Macros, Recipe, RecipeIngredient, ShoppingItem};
use crate::pantry::Pantry;
use crate::response_parser::extract_json;
use crate::units::{normalize_unit, parse_quantity, UnitKind};

const JSON_ONLY: &str = "Respond with a single JSON value and nothing else.";

const RECIPE_SHAPE: &str = r#"{"title": string, "servings": number, "ingredients": [{"name": string, "quantity": number, "unit": string}], "steps": [string], "macros_per_serving": {"kcal": number, "protein_g": number, "carbs_g": number, "fat_g": number, "fiber_g": number}, "tags": [string]}"#;

async fn ask(provider: &Provider, system_prompt: String, user_prompt: String) -> Result<Value, ApiConnectionError> {
    let request = provider.json_request(system_prompt, user_prompt);
    let response = provider.call_chat_completion(request).await?;
    let content = first_content(&response)?;
    debug!(chars = content.len(), "assistant reply received");
    extract_json(&content)
}

fn shape_error(what: &str, value: &Value) -> ApiConnectionError {
    ApiConnectionError::UnparseableResponse {
        reason: format!("response did not contain {}", what),
        content: value.to_string(),
    }
}

fn describe_preferences(preferences: &DietaryPreferences) -> String {
    let mut lines = vec![format!("Diet: {}.", preferences.diet)];
    if !preferences.allergies.is_empty() {
        lines.push(format!("Allergies (never use): {}.", preferences.allergies.join(", ")));
    }
    if !preferences.dislikes.is_empty() {
        lines.push(format!("Dislikes (avoid): {}.", preferences.dislikes.join(", ")));
    }
    lines.push(format!("Servings: {}.", preferences.servings_default));
    lines.join("\n")
}

fn describe_pantry(pantry: &Pantry) -> String {
    if pantry.items.is_empty() {
        return "The pantry is empty.".to_string();
    }
    let items: Vec<String> = pantry
        .items
        .iter()
        .map(|item| format!("- {} {} {}", item.quantity, item.unit, item.name).replace("  ", " "))
        .collect();
    format!("Pantry contents:\n{}", items.join("\n"))
}

pub fn recipe_generation_prompts(
    preferences: &DietaryPreferences,
    pantry: &Pantry,
    request_text: &str,
) -> (String, String) {
    let system = format!(
        "You are a home-cooking assistant. Create one recipe that respects the user's diet, prefers ingredients already in the pantry and uses metric quantities. {} Shape: {}",
        JSON_ONLY, RECIPE_SHAPE
    );
    let user = format!(
        "{}\n{}\nRequest: {}",
        describe_preferences(preferences),
        describe_pantry(pantry),
        if request_text.trim().is_empty() { "Surprise me." } else { request_text.trim() }
    );
    (system, user)
}

pub async fn generate_recipe(
    provider: &Provider,
    preferences: &DietaryPreferences,
    pantry: &Pantry,
    request_text: &str,
) -> Result<Recipe, ApiConnectionError> {
    let (system, user) = recipe_generation_prompts(preferences, pantry, request_text);
    let value = ask(provider, system, user).await?;
    let recipe = recipe_from_value(&value)?;
    info!(title = %recipe.title, ingredients = recipe.ingredients.len(), "recipe generated");
    Ok(recipe)
}

pub async fn parse_recipe(provider: &Provider, recipe_text: &str) -> Result<Recipe, ApiConnectionError> {
    let system = format!(
        "You are a recipe parsing assistant. Extract the title, servings, ingredients and steps from the user's recipe text without inventing anything. Use quantity 0 for amounts like 'to taste'. {} Shape: {}",
        JSON_ONLY, RECIPE_SHAPE
    );
    let value = ask(provider, system, recipe_text.to_string()).await?;
    recipe_from_value(&value)
}

pub async fn generate_cooking_steps(provider: &Provider, recipe: &Recipe) -> Result<Vec<String>, ApiConnectionError> {
    let system = format!(
        "You write clear, numbered-free cooking steps for home cooks. {} Shape: {{\"steps\": [string]}}",
        JSON_ONLY
    );
    let value = ask(provider, system, describe_recipe(recipe)).await?;
    steps_from_value(&value)
}

pub async fn amend_cooking_steps(
    provider: &Provider,
    steps: &[String],
    instruction: &str,
) -> Result<Vec<String>, ApiConnectionError> {
    let system = format!(
        "You revise cooking steps according to the user's instruction, keeping everything else unchanged. {} Shape: {{\"steps\": [string]}}",
        JSON_ONLY
    );
    let current = steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");
    let value = ask(provider, system, format!("Current steps:\n{}\n\nInstruction: {}", current, instruction)).await?;
    steps_from_value(&value)
}

pub async fn estimate_nutrients(provider: &Provider, recipe: &Recipe) -> Result<Macros, ApiConnectionError> {
    let system = format!(
        "You are a nutrition estimator. Estimate the nutrients of ONE serving of the recipe. {} Shape: {{\"kcal\": number, \"protein_g\": number, \"carbs_g\": number, \"fat_g\": number, \"fiber_g\": number}}",
        JSON_ONLY
    );
    let value = ask(provider, system, describe_recipe(recipe)).await?;
    macros_from_value(&value)
}

pub async fn suggest_shopping(
    provider: &Provider,
    pantry: &Pantry,
    preferences: &DietaryPreferences,
) -> Result<Vec<ShoppingItem>, ApiConnectionError> {
    let system = format!(
        "You suggest grocery items that complement what the user already has so they can cook a varied week of meals. {} Shape: {{\"items\": [{{\"name\": string, \"quantity\": number, \"unit\": string, \"category\": string}}]}}",
        JSON_ONLY
    );
    let user = format!("{}\n{}", describe_preferences(preferences), describe_pantry(pantry));
    let value = ask(provider, system, user).await?;
    shopping_items_from_value(&value)
}

fn describe_recipe(recipe: &Recipe) -> String {
    let ingredients = recipe
        .ingredients
        .iter()
        .map(|i| format!("- {} {} {}", i.quantity, i.unit, i.name).replace("  ", " "))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Recipe: {}\nServings: {}\nIngredients:\n{}\nSteps:\n{}",
        recipe.title,
        recipe.servings,
        ingredients,
        recipe.steps.join("\n")
    )
}

// --- Shape normalization ---

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name)).filter(|v| !v.is_null())
}

/// Numbers, numeric strings ("12", "1/2") and unit-suffixed strings ("12 g").
fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let numeric: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '/' | ' ' | '-'))
                .collect();
            parse_quantity(&without_thousands_separators(&numeric))
        }
        _ => None,
    }
}

/// "1,000" and "12,500.5" lose their grouping commas; "0,5" keeps its decimal comma.
fn without_thousands_separators(text: &str) -> String {
    let trimmed = text.trim();
    let integer_part = trimmed.split('.').next().unwrap_or(trimmed);
    let mut groups = integer_part.split(',');
    let leading = groups.next().unwrap_or_default();
    let rest: Vec<&str> = groups.collect();
    let grouped = !rest.is_empty()
        && (1..=3).contains(&leading.len())
        && leading.chars().all(|c| c.is_ascii_digit())
        && rest.iter().all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()));
    if grouped {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    }
}

fn string_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.split('-').filter(|part| !part.is_empty()).collect::<Vec<_>>().join("-")
}

/// Splits "200 g plain flour" into quantity, unit and name.
pub fn parse_ingredient_line(line: &str) -> RecipeIngredient {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut position = 0;
    let mut quantity = 0.0;

    if let Some(first) = tokens.first() {
        let mixed = tokens.get(1).filter(|t| t.contains('/')).map(|t| format!("{} {}", first, t));
        if let Some(value) = mixed.as_deref().and_then(parse_quantity) {
            quantity = value;
            position = 2;
        } else if let Some(value) = parse_quantity(first) {
            quantity = value;
            position = 1;
        }
    }

    let mut unit = String::new();
    if position > 0 {
        if let Some(candidate) = tokens.get(position) {
            let (kind, _) = normalize_unit(candidate);
            if matches!(kind, UnitKind::Mass | UnitKind::Volume) {
                unit = candidate.trim_end_matches('.').to_string();
                position += 1;
            }
        }
    }

    let name = tokens[position.min(tokens.len())..]
        .join(" ")
        .trim_start_matches("of ")
        .trim()
        .to_string();
    RecipeIngredient { name, quantity, unit }
}

fn ingredient_from_value(value: &Value) -> Option<RecipeIngredient> {
    match value {
        Value::String(line) => {
            let ingredient = parse_ingredient_line(line);
            (!ingredient.name.is_empty()).then_some(ingredient)
        }
        Value::Object(object) => {
            let name = field(object, &["name", "ingredient_name", "ingredient", "item"]).and_then(string_from)?;
            if name.is_empty() {
                return None;
            }
            let quantity = field(object, &["quantity", "amount", "qty"]).and_then(number_from).unwrap_or(0.0);
            let unit = field(object, &["unit", "units"]).and_then(string_from).unwrap_or_default();
            Some(RecipeIngredient { name, quantity, unit })
        }
        _ => None,
    }
}

fn string_list(value: &Value, item_keys: &[&str]) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(object) => field(object, item_keys).and_then(string_from),
                    other => string_from(other),
                })
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn recipe_from_value(value: &Value) -> Result<Recipe, ApiConnectionError> {
    let object = match value {
        Value::Object(object) => match object.get("recipe") {
            Some(Value::Object(inner)) => inner,
            _ => object,
        },
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => first,
            _ => return Err(shape_error("a recipe object", value)),
        },
        _ => return Err(shape_error("a recipe object", value)),
    };

    let title = field(object, &["title", "recipe_title", "name"])
        .and_then(string_from)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| shape_error("a recipe title", value))?;

    let ingredients: Vec<RecipeIngredient> = field(object, &["ingredients"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(ingredient_from_value).collect())
        .unwrap_or_default();

    let steps = field(object, &["steps", "instructions", "method"])
        .map(|steps| string_list(steps, &["text", "instruction", "step", "description"]))
        .unwrap_or_default();

    let servings = field(object, &["servings", "serves", "yield"])
        .and_then(number_from)
        .map(|n| n.round().max(1.0) as u32)
        .unwrap_or(1);

    let macros_per_serving = field(object, &["macros_per_serving", "nutrition", "macros", "nutrients"])
        .and_then(|macros| macros_from_value(macros).ok());

    let tags = field(object, &["tags"]).map(|tags| string_list(tags, &["name"])).unwrap_or_default();

    let id = field(object, &["id"])
        .and_then(string_from)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| slug(&title));

    Ok(Recipe {
        id,
        title,
        servings,
        ingredients,
        steps,
        macros_per_serving,
        tags,
    })
}

pub fn steps_from_value(value: &Value) -> Result<Vec<String>, ApiConnectionError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(object) => field(object, &["steps", "instructions", "method"])
            .ok_or_else(|| shape_error("a list of steps", value))?,
        _ => return Err(shape_error("a list of steps", value)),
    };
    let steps = string_list(list, &["text", "instruction", "step", "description"]);
    if steps.is_empty() {
        return Err(shape_error("any steps", value));
    }
    Ok(steps)
}

pub fn macros_from_value(value: &Value) -> Result<Macros, ApiConnectionError> {
    let object = match value {
        Value::Object(object) => match field(object, &["per_serving", "nutrition", "macros"]) {
            Some(Value::Object(inner)) => inner,
            _ => object,
        },
        _ => return Err(shape_error("a nutrient object", value)),
    };
    let read = |names: &[&str]| field(object, names).and_then(number_from);

    let kcal = read(&["kcal", "calories", "energy_kcal", "energy"]);
    let protein_g = read(&["protein_g", "protein"]);
    let carbs_g = read(&["carbs_g", "carbs", "carbohydrates", "carbohydrates_g", "carbohydrate_g"]);
    let fat_g = read(&["fat_g", "fat", "total_fat"]);
    let fiber_g = read(&["fiber_g", "fiber", "fibre", "fibre_g"]);

    if [kcal, protein_g, carbs_g, fat_g, fiber_g].iter().all(Option::is_none) {
        return Err(shape_error("any nutrient values", value));
    }
    Ok(Macros {
        kcal: kcal.unwrap_or(0.0),
        protein_g: protein_g.unwrap_or(0.0),
        carbs_g: carbs_g.unwrap_or(0.0),
        fat_g: fat_g.unwrap_or(0.0),
        fiber_g: fiber_g.unwrap_or(0.0),
    })
}

pub fn shopping_items_from_value(value: &Value) -> Result<Vec<ShoppingItem>, ApiConnectionError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => field(object, &["items", "suggestions", "shopping_list"])
            .and_then(Value::as_array)
            .ok_or_else(|| shape_error("a list of items", value))?,
        _ => return Err(shape_error("a list of items", value)),
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let ingredient = ingredient_from_value(item)?;
            let category = item
                .get("category")
                .cloned()
                .and_then(|c| serde_json::from_value::<Category>(Value::String(c.as_str()?.to_lowercase())).ok())
                .filter(|c| *c != Category::Other)
                .unwrap_or_else(|| categorize(&ingredient.name));
            Some(ShoppingItem {
                name: ingredient.name,
                quantity: ingredient.quantity,
                unit: ingredient.unit,
                category,
                checked: false,
                sources: vec!["suggested".to_string()],
            })
        })
        .collect())
}
