//! Helpers for browsing stored recipes against the user's pantry

use serde_json::Value;

use crate::recipe::coerce::to_named_dish_recipe;
use crate::types::GeneratedRecipe;

/// Recipe ingredients the pantry does not cover (case-insensitive)
pub fn missing_ingredients(recipe: &GeneratedRecipe, pantry: &[String]) -> Vec<String> {
    let owned: Vec<String> = pantry
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    recipe
        .ingredients
        .iter()
        .map(|i| i.name.trim())
        .filter(|name| !name.is_empty() && !owned.contains(&name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Match a free-text query against name, tags and ingredient names
pub fn matches_query(recipe: &GeneratedRecipe, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    recipe.name.to_lowercase().contains(&query)
        || recipe.tags.iter().any(|t| t.to_lowercase().contains(&query))
        || recipe
            .ingredients
            .iter()
            .any(|i| i.name.to_lowercase().contains(&query))
}

/// Recipes from an exported or crawled JSON document
///
/// Takes one recipe object or an array of them. Entries without a name are
/// skipped; the rest are coerced like a named-dish answer, so every
/// ingredient starts out missing from the pantry.
pub fn import_recipes(document: &Value) -> Vec<GeneratedRecipe> {
    let entries: &[Value] = match document {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => std::slice::from_ref(document),
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())?;
            Some(to_named_dish_recipe(entry, name))
        })
        .collect()
}

pub fn format_cooking_time(minutes: u32) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{} h", h),
        (h, m) => format!("{} h {} min", h, m),
    }
}
