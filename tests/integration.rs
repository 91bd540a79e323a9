//! Integration tests for pantry-chef

use async_trait::async_trait;
use pantry_chef::{
    error::ErrorKind,
    recipe::{extract_json, recover_json, to_recipe},
    types::{Difficulty, GeneratedRecipe, GenerationRequest, StoredRecipe},
    DuplicateGuard, LlmProvider, LocalStore, PantryChefError, RecipeGenerator, RecipeStore, Result,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Provider that always answers with the same text
struct FixedProvider {
    reply: String,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for FixedProvider {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn model(&self) -> &str {
        "fixed-model"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

fn stored(name: &str, ingredients: &[&str]) -> StoredRecipe {
    let value = json!({ "name": name, "ingredients": ingredients });
    StoredRecipe {
        id: "1".to_string(),
        recipe: to_recipe(&value, &GenerationRequest::new(ingredients.iter().copied())),
        created_by: "tester".to_string(),
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn test_duplicate_examples() {
    let guard = DuplicateGuard::default();
    let existing = vec![stored("Kimchi Jjigae", &["kimchi", "pork", "tofu"])];
    assert!(guard.is_duplicate(
        "Kimchi Stew",
        &["kimchi".to_string(), "pork".to_string()],
        &existing
    ));

    let existing = vec![stored("Fruit Salad", &["apple", "banana"])];
    assert!(!guard.is_duplicate("Potato Pancake", &["potato".to_string()], &existing));
}

#[test]
fn test_broken_model_reply_is_recovered() {
    let raw = r#"Here you go: {name: "Egg Rice", ingredients: [{name: egg, quantity: "2", isAvailable: true}], instructions: ["cook"], cookingTime: 10, difficulty: easy, servings: 1, tags: [simple]"#;
    let recovered = recover_json(raw).unwrap();
    assert_eq!(recovered.value["name"], "Egg Rice");
    assert!(recovered.stage.is_some());

    let recipe = to_recipe(&recovered.value, &GenerationRequest::new(["egg"]));
    assert_eq!(recipe.name, "Egg Rice");
    assert_eq!(recipe.ingredients[0].name, "egg");
    assert_eq!(recipe.difficulty, Difficulty::Easy);
    assert_eq!(recipe.tags, vec!["simple"]);
}

#[test]
fn test_invalid_difficulty_becomes_medium() {
    let request = GenerationRequest::new(["egg"]);
    let recipe = to_recipe(&json!({ "name": "Omelette", "difficulty": "extreme" }), &request);
    assert_eq!(recipe.difficulty, Difficulty::Medium);
}

#[test]
fn test_coerced_recipe_round_trips() {
    let request = GenerationRequest::new(["egg", "rice", "scallion"]);
    let inputs = [
        json!({}),
        json!({
            "name": "Egg Fried Rice",
            "ingredients": [{"name": "egg"}, "rice", {"name": "soy sauce", "quantity": "1 tbsp", "isAvailable": false}],
            "instructions": ["Fry", 3, "Serve"],
            "cookingTime": 12.6,
            "difficulty": "hard",
            "servings": "four",
            "tags": "none",
            "nutritionInfo": {"calories": 512, "fat": "lots"},
            "image": "https://example.com/rice.jpg"
        }),
    ];

    for input in inputs {
        let recipe = to_recipe(&input, &request);
        let text = format!("Result: {} -- done", serde_json::to_string(&recipe).unwrap());
        let candidate = extract_json(&text).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(candidate).unwrap();
        assert_eq!(to_recipe(&reparsed, &request), recipe);
    }
}

#[test]
fn test_fallback_keeps_request_ingredients() {
    let request = GenerationRequest::new(["김치", "두부", "pork"]).with_difficulty(Difficulty::Hard);
    let recipe = pantry_chef::fallback_recipe(&request);

    assert_eq!(recipe.name, "Kimchi Stew");
    assert_eq!(recipe.difficulty, Difficulty::Hard);
    for name in &request.ingredients {
        assert!(recipe.ingredients.iter().any(|i| &i.name == name && i.is_available));
    }
    assert_eq!(recipe.ingredients.iter().filter(|i| !i.is_available).count(), 3);
}

#[tokio::test]
async fn test_saved_recipe_blocks_regeneration() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(dir.path().join("store.json")).unwrap());

    let reply = r#"{"name": "Tofu Kimchi", "ingredients": [
        {"name": "tofu", "quantity": "1 block", "isAvailable": true},
        {"name": "kimchi", "quantity": "1 cup", "isAvailable": true}],
        "instructions": ["Pan-fry the tofu", "Stir-fry the kimchi"],
        "cookingTime": 20, "difficulty": "easy", "servings": 2, "tags": ["korean"], "tips": []}"#;
    let provider = FixedProvider::new(reply);
    let generator = RecipeGenerator::new().with_store(store.clone());
    generator.register_provider(provider.clone());

    let request = GenerationRequest::new(["tofu", "kimchi"]);
    let first = generator.generate(&request).await.unwrap();
    store.insert(&first, "tester").await.unwrap();

    let err = generator.generate(&request).await.unwrap_err();
    assert!(matches!(err, PantryChefError::DuplicateExhausted { attempts: 3 }));
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

    let snapshot = generator.get_metrics_snapshot();
    assert_eq!(snapshot.recipes_generated, 1);
    assert_eq!(snapshot.duplicates_rejected, 3);
}

#[test]
fn test_generation_without_store_accepts_everything() {
    let provider = FixedProvider::new("nothing useful");
    let generator = RecipeGenerator::new();
    generator.register_provider(provider.clone());

    let recipe: GeneratedRecipe =
        tokio_test::block_on(generator.generate(&GenerationRequest::new(["potato"]))).unwrap();
    assert_eq!(recipe.name, "Potato Pancakes");
    assert!(recipe.image.is_some());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_error_messages_are_distinct_per_kind() {
    let errors = [
        PantryChefError::config("PERPLEXITY_API_KEY is missing"),
        PantryChefError::network("connection refused", None, None),
        PantryChefError::parse("bad json", None),
        PantryChefError::duplicate_exhausted(3),
    ];
    let kinds: Vec<ErrorKind> = errors.iter().map(PantryChefError::kind).collect();
    assert_eq!(
        kinds,
        vec![ErrorKind::Credential, ErrorKind::Network, ErrorKind::Parse, ErrorKind::Duplicate]
    );

    let messages: Vec<String> = errors.iter().map(PantryChefError::user_message).collect();
    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(errors[0].is_fatal());
    assert!(!errors[1].is_fatal());
}

#[test]
fn test_library_initialization() {
    assert!(pantry_chef::init().is_ok());
    assert!(!pantry_chef::VERSION.is_empty());
}
