//! Prompt construction for recipe generation
//!
//! Every builder here is pure; the same input always yields the same text.

use crate::types::{Difficulty, GenerationRequest};

/// System instruction sent with every generation prompt
pub const SYSTEM_PROMPT: &str = "You are a professional chef who writes practical home recipes. \
Prefer the ingredients the cook already owns, keep extra purchases to a minimum, and assume \
basic seasonings (salt, pepper, cooking oil) are always at hand. Answer with JSON only.";

/// System instruction for recipes of a named dish
pub const SEARCH_SYSTEM_PROMPT: &str = "You are a professional chef who knows the classic \
version of every well-known dish. Answer with JSON only.";

/// Example dishes, one list per attempt slot
const DISH_EXAMPLES: [&[&str]; 3] = [
    &["kimchi fried rice", "soy-braised tofu", "egg drop soup", "stir-fried glass noodles"],
    &["crispy potato pancakes", "spicy pork bulgogi", "miso vegetable stew", "garlic butter shrimp"],
    &["cold buckwheat noodles", "sesame spinach salad", "baked cheese rice", "braised chicken with potatoes"],
];

const RECIPE_SHAPE: &str = r#"{
  "name": "recipe name",
  "ingredients": [
    {"name": "ingredient name", "quantity": "exact amount with unit", "isAvailable": true}
  ],
  "instructions": [
    "Step 1: detailed instruction with time, heat and order",
    "Step 2: next instruction"
  ],
  "cookingTime": 30,
  "difficulty": "easy",
  "servings": 2,
  "tags": ["tag1", "tag2"],
  "tips": ["tip1", "tip2"]
}"#;

/// Dish examples for an attempt, rotating every three attempts
pub fn dish_examples(attempt: u32) -> &'static [&'static str] {
    DISH_EXAMPLES[(attempt % 3) as usize]
}

fn difficulty_label(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy (few steps, basic techniques)",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard (advanced techniques welcome)",
    }
}

/// Build the generation prompt for one attempt
///
/// Only the example dish list changes between attempts, which nudges retried
/// generations away from recipes the user already has.
pub fn build_prompt(request: &GenerationRequest, attempt: u32) -> String {
    let ingredients: Vec<&str> = request.ingredient_names().collect();

    let mut prompt = format!(
        "Create one creative, distinctive recipe using these ingredients.

Ingredients on hand: {}
Difficulty: {}
Servings: {}
",
        ingredients.join(", "),
        difficulty_label(request.difficulty),
        request.servings,
    );

    if let Some(cuisine) = request.cuisine.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Cuisine: {}\n", cuisine));
    }
    if !request.dietary_constraints.is_empty() {
        prompt.push_str(&format!(
            "Dietary constraints: {}\n",
            request.dietary_constraints.join(", ")
        ));
    }

    prompt.push_str(&format!(
        "
For inspiration only, dishes in the spirit of: {}. Do not simply repeat a common dish.

Rules:
1. Respond with exactly one JSON object and nothing else: no markdown, no code fences, no explanation.
2. List only ingredients that are actually used in the instructions.
3. Mark every ingredient from the list above with \"isAvailable\": true.
4. Mark every additional ingredient the cook must buy with \"isAvailable\": false, and keep those to a minimum.
5. Basic seasonings (salt, pepper, cooking oil) may be assumed.
6. Write in the same language as the ingredient names above and use the units customary for that language.
7. Make every step specific: include times, heat levels and the cue for moving on.
8. \"difficulty\" must be one of \"easy\", \"medium\", \"hard\"; \"cookingTime\" is whole minutes.

Use exactly this shape:
{}",
        dish_examples(attempt).join(", "),
        RECIPE_SHAPE,
    ));

    prompt
}

/// Build the prompt for the classic recipe of a named dish
pub fn build_search_prompt(dish: &str) -> String {
    format!(
        "Give the standard, widely known recipe for \"{}\".

Rules:
1. Respond with exactly one JSON object and nothing else: no markdown, no code fences, no explanation.
2. List only ingredients that are actually used in the instructions.
3. Mark every ingredient with \"isAvailable\": false; the cook owns none of them yet.
4. Write in the same language as the dish name and use the units customary for that language.
5. \"difficulty\" must be one of \"easy\", \"medium\", \"hard\"; \"cookingTime\" is whole minutes.

Use exactly this shape:
{}",
        dish.trim(),
        RECIPE_SHAPE.replace("\"isAvailable\": true", "\"isAvailable\": false"),
    )
}

pub fn build_seasonal_prompt() -> String {
    "List 10 fresh ingredients that are in season right now. \
Respond with a JSON array of strings only."
        .to_string()
}

pub fn build_tips_prompt(ingredient: &str) -> String {
    format!(
        "Give 5 useful tips for cooking with {}. Respond with a JSON array of strings only.",
        ingredient.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new(["egg", " ", "rice"])
            .with_difficulty(Difficulty::Easy)
            .with_servings(3)
            .with_cuisine("Korean")
            .with_dietary_constraints(vec!["no nuts".to_string()])
    }

    #[test]
    fn test_prompt_includes_request_fields() {
        let prompt = build_prompt(&request(), 0);
        assert!(prompt.contains("Ingredients on hand: egg, rice\n"));
        assert!(prompt.contains("Difficulty: easy"));
        assert!(prompt.contains("Servings: 3"));
        assert!(prompt.contains("Cuisine: Korean"));
        assert!(prompt.contains("Dietary constraints: no nuts"));
        assert!(prompt.contains("exactly one JSON object"));
        assert!(prompt.contains("\"isAvailable\": false"));
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let prompt = build_prompt(&GenerationRequest::new(["egg"]), 0);
        assert!(!prompt.contains("Cuisine:"));
        assert!(!prompt.contains("Dietary constraints:"));
    }

    #[test]
    fn test_examples_rotate_by_attempt() {
        let req = request();
        let first = build_prompt(&req, 0);
        assert_ne!(first, build_prompt(&req, 1));
        assert_ne!(build_prompt(&req, 1), build_prompt(&req, 2));
        assert_eq!(first, build_prompt(&req, 3));

        for attempt in 0..3 {
            let prompt = build_prompt(&req, attempt);
            for example in dish_examples(attempt) {
                assert!(prompt.contains(example));
            }
        }
    }

    #[test]
    fn test_search_prompt_marks_everything_unavailable() {
        let prompt = build_search_prompt("  Bibimbap ");
        assert!(prompt.contains("\"Bibimbap\""));
        assert!(!prompt.contains("\"isAvailable\": true"));
        assert!(prompt.contains("\"isAvailable\": false"));
    }

    #[test]
    fn test_list_prompts() {
        assert!(build_seasonal_prompt().contains("JSON array"));
        assert!(build_tips_prompt("tofu").contains("cooking with tofu"));
    }
}
