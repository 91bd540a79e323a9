//! Deterministic last-resort recipe built from the request alone

use crate::types::{GeneratedRecipe, GenerationRequest, RecipeIngredient};

use super::coerce::DEFAULT_QUANTITY;

/// Dish names picked when any requested ingredient contains the keyword
const DISH_KEYWORDS: &[(&str, &str)] = &[
    ("kimchi", "Kimchi Stew"),
    ("김치", "Kimchi Stew"),
    ("tofu", "Braised Tofu"),
    ("두부", "Braised Tofu"),
    ("potato", "Potato Pancakes"),
    ("감자", "Potato Pancakes"),
    ("egg", "Savory Egg Scramble"),
    ("계란", "Savory Egg Scramble"),
    ("달걀", "Savory Egg Scramble"),
    ("rice", "Fried Rice"),
    ("밥", "Fried Rice"),
    ("noodle", "Stir-Fried Noodles"),
    ("pasta", "Garlic Pasta"),
    ("chicken", "Pan-Seared Chicken"),
    ("닭", "Pan-Seared Chicken"),
    ("pork", "Stir-Fried Pork"),
    ("돼지", "Stir-Fried Pork"),
    ("beef", "Beef Stir-Fry"),
    ("소고기", "Beef Stir-Fry"),
];

const SEASONINGS: [(&str, &str); 3] = [("salt", "a pinch"), ("black pepper", "a pinch"), ("cooking oil", "1 tbsp")];

const STEPS: [&str; 5] = [
    "Rinse and prepare all of the ingredients.",
    "Cut everything into bite-sized pieces.",
    "Heat the cooking oil in a pan over medium heat and stir-fry the ingredients until cooked through.",
    "Season to taste with salt and black pepper.",
    "Transfer to a plate and serve warm.",
];

const TAGS: [&str; 3] = ["AI-generated", "quick", "basic"];

const TIPS: [&str; 3] = [
    "Check that the ingredients are fresh.",
    "Keep an eye on the cooking time.",
    "Add seasoning a little at a time.",
];

const FALLBACK_COOKING_TIME: u32 = 20;

/// Build a plain stir-fry from the requested ingredients
///
/// Every requested ingredient is kept (marked available) and three basic
/// seasonings are appended (marked missing). No I/O is performed.
pub fn fallback_recipe(request: &GenerationRequest) -> GeneratedRecipe {
    let mut seen: Vec<String> = Vec::new();
    let mut ingredients: Vec<RecipeIngredient> = Vec::new();
    for name in request.ingredient_names() {
        let key = name.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        ingredients.push(RecipeIngredient::new(name, DEFAULT_QUANTITY, true));
    }
    ingredients.extend(
        SEASONINGS
            .iter()
            .map(|(name, quantity)| RecipeIngredient::new(*name, *quantity, false)),
    );

    GeneratedRecipe {
        name: dish_name(request),
        ingredients,
        instructions: STEPS.iter().map(|s| s.to_string()).collect(),
        cooking_time: FALLBACK_COOKING_TIME,
        difficulty: request.difficulty,
        servings: request.servings.max(1),
        tags: TAGS.iter().map(|s| s.to_string()).collect(),
        tips: TIPS.iter().map(|s| s.to_string()).collect(),
        image: None,
        nutrition: None,
    }
}

fn dish_name(request: &GenerationRequest) -> String {
    let lowered: Vec<String> = request.ingredient_names().map(str::to_lowercase).collect();

    let matched = DISH_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.iter().any(|name| name.contains(keyword)));
    if let Some((_, dish)) = matched {
        return dish.to_string();
    }

    match request.ingredient_names().next() {
        Some(first) => format!("Simple {} Skillet", first),
        None => "Pantry Skillet".to_string(),
    }
}
