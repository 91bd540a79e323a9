//! Core types and structures for pantry-chef

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{PantryChefError, Result};

/// Recipe difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Strict lookup used when reading untrusted model output
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = PantryChefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| {
            PantryChefError::validation(format!(
                "Unknown difficulty '{}'. Expected easy, medium or hard",
                s
            ))
        })
    }
}

/// Input to one recipe generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub dietary_constraints: Vec<String>,
}

fn default_servings() -> u32 {
    2
}

impl GenerationRequest {
    pub fn new<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            difficulty: Difficulty::default(),
            servings: default_servings(),
            cuisine: None,
            dietary_constraints: Vec::new(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings;
        self
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn with_dietary_constraints(mut self, constraints: Vec<String>) -> Self {
        self.dietary_constraints = constraints;
        self
    }

    /// Ingredient names with surrounding whitespace removed and blanks skipped
    pub fn ingredient_names(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }

    /// Reject requests the generator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ingredient_names().next().is_none() {
            return Err(PantryChefError::validation(
                "At least one ingredient is required",
            ));
        }
        if self.servings == 0 {
            return Err(PantryChefError::validation("Servings must be at least 1"));
        }
        Ok(())
    }
}

/// One ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: String,
    /// The caller already owns it
    pub is_available: bool,
}

impl RecipeIngredient {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, is_available: bool) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            is_available,
        }
    }
}

/// Optional nutrition facts per serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

/// A fully validated recipe handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub name: String,
    /// Usage order
    pub ingredients: Vec<RecipeIngredient>,
    /// Step N assumes step N-1 is done
    pub instructions: Vec<String>,
    pub cooking_time: u32,
    pub difficulty: Difficulty,
    pub servings: u32,
    pub tags: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, alias = "nutritionInfo", skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

impl GeneratedRecipe {
    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| i.name.clone()).collect()
    }
}

/// A recipe row as it lives in the recipe store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecipe {
    pub id: String,
    #[serde(flatten)]
    pub recipe: GeneratedRecipe,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// An ingredient the user owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when adding or editing a pantry ingredient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl NewIngredient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Default::default()
        }
    }
}

/// Client timeout for every outbound HTTP call unless configured otherwise
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "perplexity".to_string(),
            model: "llama-3.1-sonar-small-128k-online".to_string(),
            api_key: String::new(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Counters shared by every clone of a generator
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    model_calls: AtomicU64,
    recipes_generated: AtomicU64,
    duplicates_rejected: AtomicU64,
    fallbacks_used: AtomicU64,
    errors: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_model_calls(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recipes_generated(&self) {
        self.recipes_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicates_rejected(&self) {
        self.duplicates_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fallbacks_used(&self) {
        self.fallbacks_used.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            model_calls: self.model_calls.load(Ordering::Relaxed),
            recipes_generated: self.recipes_generated.load(Ordering::Relaxed),
            duplicates_rejected: self.duplicates_rejected.load(Ordering::Relaxed),
            fallbacks_used: self.fallbacks_used.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PerformanceMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub model_calls: u64,
    pub recipes_generated: u64,
    pub duplicates_rejected: u64,
    pub fallbacks_used: u64,
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_request_defaults_and_validation() {
        let request = GenerationRequest::new(["egg", "rice"]);
        assert_eq!(request.servings, 2);
        assert_eq!(request.difficulty, Difficulty::Medium);
        assert!(request.validate().is_ok());

        assert!(GenerationRequest::new(["  ", ""]).validate().is_err());
        assert!(GenerationRequest::new(["egg"]).with_servings(0).validate().is_err());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"ingredients": ["tofu"], "cuisine": "korean"}"#).unwrap();
        assert_eq!(request.servings, 2);
        assert_eq!(request.difficulty, Difficulty::Medium);
        assert_eq!(request.cuisine.as_deref(), Some("korean"));
    }

    #[test]
    fn test_recipe_wire_format_is_camel_case() {
        let recipe = GeneratedRecipe {
            name: "Egg Rice".to_string(),
            ingredients: vec![RecipeIngredient::new("egg", "2", true)],
            instructions: vec!["cook".to_string()],
            cooking_time: 10,
            difficulty: Difficulty::Easy,
            servings: 1,
            tags: vec!["simple".to_string()],
            tips: Vec::new(),
            image: None,
            nutrition: None,
        };
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["cookingTime"], 10);
        assert_eq!(json["ingredients"][0]["isAvailable"], true);
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = PerformanceMetrics::new();
        metrics.increment_model_calls();
        metrics.increment_model_calls();
        metrics.increment_fallbacks_used();
        let stats = metrics.get_stats();
        assert_eq!(stats.model_calls, 2);
        assert_eq!(stats.fallbacks_used, 1);
        assert_eq!(stats.errors, 0);
    }
}
