//! Turns an untrusted JSON value into a [`GeneratedRecipe`]
//!
//! Nothing here fails: every missing or malformed field gets a default.

use serde_json::{Map, Value};

use crate::types::{Difficulty, GeneratedRecipe, GenerationRequest, Nutrition, RecipeIngredient};

pub const PLACEHOLDER_NAME: &str = "AI-generated recipe";
pub const PLACEHOLDER_INGREDIENT: &str = "ingredient";
pub const DEFAULT_QUANTITY: &str = "as needed";
pub const PLACEHOLDER_TAG: &str = "AI-generated";
pub const DEFAULT_COOKING_TIME: u32 = 30;
pub const DEFAULT_SERVINGS: u32 = 2;
pub const PLACEHOLDER_INSTRUCTIONS: [&str; 3] = [
    "Prepare the ingredients.",
    "Cook the ingredients.",
    "Plate and serve.",
];

/// Coerce a parsed model answer for a generation request
pub fn to_recipe(value: &Value, request: &GenerationRequest) -> GeneratedRecipe {
    let defaults = request
        .ingredient_names()
        .map(|name| RecipeIngredient::new(name, DEFAULT_QUANTITY, true))
        .collect();
    coerce(value, PLACEHOLDER_NAME, defaults)
}

/// Coerce a parsed model answer for a named dish
///
/// The caller owns none of the ingredients, so every one is marked missing.
pub fn to_named_dish_recipe(value: &Value, dish: &str) -> GeneratedRecipe {
    let fallback_name = match dish.trim() {
        "" => PLACEHOLDER_NAME,
        name => name,
    };
    let mut recipe = coerce(value, fallback_name, Vec::new());
    for ingredient in &mut recipe.ingredients {
        ingredient.is_available = false;
    }
    recipe
}

fn coerce(value: &Value, fallback_name: &str, default_ingredients: Vec<RecipeIngredient>) -> GeneratedRecipe {
    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);

    let name = non_blank_string(fields.get("name")).unwrap_or_else(|| fallback_name.to_string());

    let ingredients = match fields.get("ingredients").and_then(Value::as_array) {
        Some(entries) => {
            let parsed: Vec<_> = entries.iter().filter_map(ingredient_entry).collect();
            if parsed.is_empty() {
                default_ingredients
            } else {
                parsed
            }
        }
        None => default_ingredients,
    };

    let instructions = string_list(fields.get("instructions"))
        .filter(|steps| !steps.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_INSTRUCTIONS.iter().map(|s| s.to_string()).collect());

    let difficulty = fields
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::from_label)
        .unwrap_or(Difficulty::Medium);

    let nutrition = fields
        .get("nutrition")
        .or_else(|| fields.get("nutritionInfo"))
        .and_then(Value::as_object)
        .map(|facts| Nutrition {
            calories: facts.get("calories").and_then(Value::as_f64),
            protein: facts.get("protein").and_then(Value::as_f64),
            carbs: facts.get("carbs").and_then(Value::as_f64),
            fat: facts.get("fat").and_then(Value::as_f64),
        });

    GeneratedRecipe {
        name,
        ingredients,
        instructions,
        cooking_time: positive_integer(fields.get("cookingTime")).unwrap_or(DEFAULT_COOKING_TIME),
        difficulty,
        servings: positive_integer(fields.get("servings")).unwrap_or(DEFAULT_SERVINGS),
        tags: string_list(fields.get("tags")).unwrap_or_else(|| vec![PLACEHOLDER_TAG.to_string()]),
        tips: string_list(fields.get("tips")).unwrap_or_default(),
        image: non_blank_string(fields.get("image")),
        nutrition,
    }
}

fn ingredient_entry(entry: &Value) -> Option<RecipeIngredient> {
    let ingredient = match entry {
        Value::String(name) => RecipeIngredient::new(name.trim(), DEFAULT_QUANTITY, true),
        Value::Object(fields) => {
            let name = match fields.get("name") {
                Some(Value::String(name)) => name.trim().to_string(),
                _ => PLACEHOLDER_INGREDIENT.to_string(),
            };
            let quantity = match fields.get("quantity") {
                Some(Value::String(q)) if !q.trim().is_empty() => q.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => DEFAULT_QUANTITY.to_string(),
            };
            let is_available = fields
                .get("isAvailable")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            RecipeIngredient::new(name, quantity, is_available)
        }
        _ => return None,
    };

    (!ingredient.name.is_empty()).then_some(ingredient)
}

fn non_blank_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Arrays keep their non-blank string elements; anything else is `None`
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn positive_integer(value: Option<&Value>) -> Option<u32> {
    let number = value?;
    if let Some(n) = number.as_u64() {
        return (n > 0).then(|| n.min(u64::from(u32::MAX)) as u32);
    }
    let f = number.as_f64()?;
    let rounded = f.round();
    (rounded.is_finite() && rounded >= 1.0).then(|| rounded.min(f64::from(u32::MAX)) as u32)
}
