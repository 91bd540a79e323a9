//! Pantry Chef - AI-powered recipe generation from the ingredients you own
//!
//! Builds a prompt from the user's ingredients, recovers a recipe from
//! whatever the model answers, keeps it from repeating stored recipes, and
//! falls back to an offline recipe when the answer is beyond repair.

pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod recipe;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, StoreBackend};
pub use error::{ErrorKind, PantryChefError, Result};
pub use types::{
    Difficulty, GeneratedRecipe, GenerationRequest, Ingredient, LlmConfig, MetricsSnapshot,
    NewIngredient, Nutrition, PerformanceMetrics, RecipeIngredient, StoredRecipe,
};

// Re-export main functionality
pub use image::{ImageSearch, PlaceholderImages, UnsplashImageSearch};
pub use llm::{LlmProvider, RecipeGenerator};
pub use recipe::{fallback_recipe, DuplicateGuard, DuplicateThresholds};
pub use store::{LocalStore, PantryStore, RecipeStore, SupabaseStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
