//! JSON-file store for running without a hosted database

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{PantryStore, RecipeStore};
use crate::error::{PantryChefError, Result};
use crate::types::{GeneratedRecipe, Ingredient, NewIngredient, StoredRecipe};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    recipes: Vec<StoredRecipe>,
    #[serde(default)]
    ingredients: Vec<PantryRow>,
}

impl StoreData {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PantryRow {
    user_id: String,
    #[serde(flatten)]
    ingredient: Ingredient,
}

/// Recipe and pantry store kept in memory, optionally mirrored to a JSON file
pub struct LocalStore {
    path: Option<PathBuf>,
    data: RwLock<StoreData>,
}

impl LocalStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(StoreData::default()),
        }
    }

    /// Open (or start) the store file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            Self::load(&path)?
        } else {
            StoreData::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Get default store file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("data/pantry-chef.json")
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(path: &Path) -> Result<StoreData> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PantryChefError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            PantryChefError::store(format!("Corrupt store file {}: {}", path.display(), e), None)
        })
    }

    fn save(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PantryChefError::io(e.to_string(), Some(parent.to_string_lossy().to_string()))
            })?;
        }

        let content = serde_json::to_string_pretty(data).map_err(|e| {
            PantryChefError::internal(format!("Failed to serialize store: {}", e))
        })?;

        std::fs::write(path, content).map_err(|e| {
            PantryChefError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
        })
    }

    fn not_found(kind: &str, id: &str) -> PantryChefError {
        PantryChefError::store(format!("{} '{}' not found", kind, id), Some(404))
    }
}

#[async_trait]
impl RecipeStore for LocalStore {
    async fn select_all(&self) -> Result<Vec<StoredRecipe>> {
        Ok(self.data.read().recipes.clone())
    }

    async fn insert(&self, recipe: &GeneratedRecipe, created_by: &str) -> Result<StoredRecipe> {
        let mut data = self.data.write();
        let stored = StoredRecipe {
            id: data.allocate_id(),
            recipe: recipe.clone(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        data.recipes.insert(0, stored.clone());
        self.save(&data)?;
        Ok(stored)
    }

    async fn update(&self, id: &str, recipe: &GeneratedRecipe) -> Result<StoredRecipe> {
        let mut data = self.data.write();
        let stored = data
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::not_found("Recipe", id))?;
        stored.recipe = recipe.clone();
        let updated = stored.clone();
        self.save(&data)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut data = self.data.write();
        let before = data.recipes.len();
        data.recipes.retain(|r| r.id != id);
        if data.recipes.len() == before {
            return Err(Self::not_found("Recipe", id));
        }
        self.save(&data)
    }
}

#[async_trait]
impl PantryStore for LocalStore {
    async fn list_ingredients(&self, user_id: &str) -> Result<Vec<Ingredient>> {
        Ok(self
            .data
            .read()
            .ingredients
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.ingredient.clone())
            .collect())
    }

    async fn add_ingredient(&self, user_id: &str, ingredient: &NewIngredient) -> Result<Ingredient> {
        let name = ingredient.name.trim();
        if name.is_empty() {
            return Err(PantryChefError::validation("Ingredient name cannot be empty"));
        }

        let mut data = self.data.write();
        let added = Ingredient {
            id: data.allocate_id(),
            name: name.to_string(),
            quantity: ingredient.quantity.clone(),
            category: ingredient.category.clone(),
            expiry_date: ingredient.expiry_date,
            created_at: Utc::now(),
        };
        data.ingredients.insert(
            0,
            PantryRow {
                user_id: user_id.to_string(),
                ingredient: added.clone(),
            },
        );
        self.save(&data)?;
        Ok(added)
    }

    async fn add_ingredients(&self, user_id: &str, names: &[String]) -> Result<Vec<Ingredient>> {
        let mut added = Vec::new();
        for name in names.iter().filter(|n| !n.trim().is_empty()) {
            added.push(self.add_ingredient(user_id, &NewIngredient::named(name.as_str())).await?);
        }
        Ok(added)
    }

    async fn update_ingredient(&self, id: &str, ingredient: &NewIngredient) -> Result<Ingredient> {
        let mut data = self.data.write();
        let row = data
            .ingredients
            .iter_mut()
            .find(|row| row.ingredient.id == id)
            .ok_or_else(|| Self::not_found("Ingredient", id))?;

        let current = &mut row.ingredient;
        if !ingredient.name.trim().is_empty() {
            current.name = ingredient.name.trim().to_string();
        }
        current.quantity = ingredient.quantity.clone();
        current.category = ingredient.category.clone();
        current.expiry_date = ingredient.expiry_date;
        let updated = current.clone();
        self.save(&data)?;
        Ok(updated)
    }

    async fn delete_ingredient(&self, id: &str) -> Result<()> {
        let mut data = self.data.write();
        let before = data.ingredients.len();
        data.ingredients.retain(|row| row.ingredient.id != id);
        if data.ingredients.len() == before {
            return Err(Self::not_found("Ingredient", id));
        }
        self.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::fallback_recipe;
    use crate::types::GenerationRequest;

    fn sample() -> GeneratedRecipe {
        fallback_recipe(&GenerationRequest::new(["egg", "rice"]))
    }

    #[tokio::test]
    async fn test_recipe_crud_newest_first() {
        let store = LocalStore::in_memory();
        let first = store.insert(&sample(), "alice").await.unwrap();
        let second = store.insert(&sample(), "bob").await.unwrap();

        let all = store.select_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let mut renamed = sample();
        renamed.name = "Renamed".to_string();
        let updated = store.update(&first.id, &renamed).await.unwrap();
        assert_eq!(updated.recipe.name, "Renamed");
        assert_eq!(updated.created_by, "alice");

        store.delete(&first.id).await.unwrap();
        assert_eq!(store.select_all().await.unwrap().len(), 1);
        assert!(store.delete(&first.id).await.is_err());
    }

    #[tokio::test]
    async fn test_pantry_is_scoped_per_user() {
        let store = LocalStore::in_memory();
        store
            .add_ingredients("alice", &["egg".to_string(), " ".to_string(), "rice".to_string()])
            .await
            .unwrap();
        store.add_ingredient("bob", &NewIngredient::named("tofu")).await.unwrap();

        let alice = store.list_ingredients("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].name, "rice");
        assert_eq!(store.list_ingredients("bob").await.unwrap().len(), 1);

        assert!(store.add_ingredient("bob", &NewIngredient::named("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = LocalStore::open(&path).unwrap();
        let saved = store.insert(&sample(), "alice").await.unwrap();
        let pantry = store.add_ingredient("alice", &NewIngredient::named("egg")).await.unwrap();

        let reopened = LocalStore::open(&path).unwrap();
        let all = reopened.select_all().await.unwrap();
        assert_eq!(all, vec![saved]);
        assert_eq!(reopened.list_ingredients("alice").await.unwrap(), vec![pantry]);

        // ids keep counting after a reload
        let next = reopened.insert(&sample(), "alice").await.unwrap();
        assert_ne!(next.id, all[0].id);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            LocalStore::open(&path),
            Err(PantryChefError::Store { .. })
        ));
    }
}
