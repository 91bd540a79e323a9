//! Recipe and pantry persistence
//!
//! The hosted row store is an external collaborator; these traits are the
//! only surface the rest of the crate sees.

pub mod local;
pub mod supabase;

pub use local::LocalStore;
pub use supabase::SupabaseStore;

use crate::error::Result;
use crate::types::{GeneratedRecipe, Ingredient, NewIngredient, StoredRecipe};
use async_trait::async_trait;

/// Table of saved recipes, newest first
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn select_all(&self) -> Result<Vec<StoredRecipe>>;

    async fn insert(&self, recipe: &GeneratedRecipe, created_by: &str) -> Result<StoredRecipe>;

    async fn update(&self, id: &str, recipe: &GeneratedRecipe) -> Result<StoredRecipe>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Ingredients each user owns
#[async_trait]
pub trait PantryStore: Send + Sync {
    async fn list_ingredients(&self, user_id: &str) -> Result<Vec<Ingredient>>;

    async fn add_ingredient(&self, user_id: &str, ingredient: &NewIngredient) -> Result<Ingredient>;

    /// Add several ingredients by name at once
    async fn add_ingredients(&self, user_id: &str, names: &[String]) -> Result<Vec<Ingredient>>;

    async fn update_ingredient(&self, id: &str, ingredient: &NewIngredient) -> Result<Ingredient>;

    async fn delete_ingredient(&self, id: &str) -> Result<()>;
}
