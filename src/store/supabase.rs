//! Supabase (PostgREST) backed recipe and pantry store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{PantryStore, RecipeStore};
use crate::error::{PantryChefError, Result};
use crate::types::{
    Difficulty, GeneratedRecipe, Ingredient, NewIngredient, StoredRecipe, DEFAULT_TIMEOUT_SECS,
};

const RECIPES: &str = "recipes";
const INGREDIENTS: &str = "ingredients";

/// Row store reached through the Supabase REST API
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(PantryChefError::config("SUPABASE_URL is required"));
        }
        if api_key.trim().is_empty() {
            return Err(PantryChefError::config("SUPABASE_ANON_KEY is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PantryChefError::network(e.to_string(), None, None))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn send(&self, request: RequestBuilder, table: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                return PantryChefError::timeout(format!("Supabase '{}' request", table), self.timeout_secs);
            }
            PantryChefError::store(format!("Failed to reach Supabase: {}", e), None)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PantryChefError::store(
                format!("Request on '{}' failed ({}): {}", table, status, body),
                Some(status.as_u16()),
            ));
        }

        Ok(response)
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, request: RequestBuilder, table: &str) -> Result<Vec<T>> {
        let response = self.send(request, table).await?;
        response.json().await.map_err(|e| {
            PantryChefError::store(format!("Unexpected '{}' rows: {}", table, e), None)
        })
    }

    async fn single_row<T: DeserializeOwned>(&self, request: RequestBuilder, table: &str) -> Result<T> {
        self.fetch_rows(request.header("Prefer", "return=representation"), table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PantryChefError::store(format!("No row returned from '{}'", table), Some(404)))
    }
}

#[async_trait]
impl RecipeStore for SupabaseStore {
    async fn select_all(&self) -> Result<Vec<StoredRecipe>> {
        let request = self
            .request(Method::GET, RECIPES)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let rows: Vec<RecipeRow> = self.fetch_rows(request, RECIPES).await?;
        Ok(rows.into_iter().map(StoredRecipe::from).collect())
    }

    async fn insert(&self, recipe: &GeneratedRecipe, created_by: &str) -> Result<StoredRecipe> {
        let body = RecipeWrite::new(recipe, Some(created_by))?;
        let request = self.request(Method::POST, RECIPES).json(&[body]);
        let row: RecipeRow = self.single_row(request, RECIPES).await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, recipe: &GeneratedRecipe) -> Result<StoredRecipe> {
        let body = RecipeWrite::new(recipe, None)?;
        let request = self
            .request(Method::PATCH, RECIPES)
            .query(&[("id", format!("eq.{}", id))])
            .json(&body);
        let row: RecipeRow = self.single_row(request, RECIPES).await?;
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, RECIPES)
            .query(&[("id", format!("eq.{}", id))]);
        self.send(request, RECIPES).await?;
        Ok(())
    }
}

#[async_trait]
impl PantryStore for SupabaseStore {
    async fn list_ingredients(&self, user_id: &str) -> Result<Vec<Ingredient>> {
        let request = self.request(Method::GET, INGREDIENTS).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let rows: Vec<IngredientRow> = self.fetch_rows(request, INGREDIENTS).await?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    async fn add_ingredient(&self, user_id: &str, ingredient: &NewIngredient) -> Result<Ingredient> {
        if ingredient.name.trim().is_empty() {
            return Err(PantryChefError::validation("Ingredient name cannot be empty"));
        }
        let body = IngredientWrite::new(ingredient, Some(user_id));
        let request = self.request(Method::POST, INGREDIENTS).json(&[body]);
        let row: IngredientRow = self.single_row(request, INGREDIENTS).await?;
        Ok(row.into())
    }

    async fn add_ingredients(&self, user_id: &str, names: &[String]) -> Result<Vec<Ingredient>> {
        let owned = named_ingredients(names);
        if owned.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<IngredientWrite> = owned
            .iter()
            .map(|ingredient| IngredientWrite::new(ingredient, Some(user_id)))
            .collect();

        let request = self
            .request(Method::POST, INGREDIENTS)
            .header("Prefer", "return=representation")
            .json(&rows);
        let inserted: Vec<IngredientRow> = self.fetch_rows(request, INGREDIENTS).await?;
        Ok(inserted.into_iter().map(Ingredient::from).collect())
    }

    async fn update_ingredient(&self, id: &str, ingredient: &NewIngredient) -> Result<Ingredient> {
        let body = IngredientWrite::new(ingredient, None);
        let request = self
            .request(Method::PATCH, INGREDIENTS)
            .query(&[("id", format!("eq.{}", id))])
            .json(&body);
        let row: IngredientRow = self.single_row(request, INGREDIENTS).await?;
        Ok(row.into())
    }

    async fn delete_ingredient(&self, id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, INGREDIENTS)
            .query(&[("id", format!("eq.{}", id))]);
        self.send(request, INGREDIENTS).await?;
        Ok(())
    }
}

/// `recipes` row; list columns may hold JSON arrays or JSON-encoded strings
#[derive(Debug, Deserialize)]
struct RecipeRow {
    id: Value,
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    ingredients: Value,
    #[serde(default)]
    instructions: Value,
    #[serde(default)]
    cooking_time: Option<u32>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    tips: Value,
    #[serde(default)]
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RecipeRow> for StoredRecipe {
    fn from(row: RecipeRow) -> Self {
        StoredRecipe {
            id: id_string(row.id),
            recipe: GeneratedRecipe {
                name: row.name,
                ingredients: decode_list(row.ingredients),
                instructions: decode_list(row.instructions),
                cooking_time: row.cooking_time.unwrap_or_default(),
                difficulty: row
                    .difficulty
                    .as_deref()
                    .and_then(Difficulty::from_label)
                    .unwrap_or_default(),
                servings: row.servings.unwrap_or_default(),
                tags: decode_list(row.tags),
                tips: decode_list(row.tips),
                image: row.image,
                nutrition: None,
            },
            created_by: row.created_by.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecipeWrite<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    ingredients: String,
    instructions: String,
    cooking_time: u32,
    difficulty: Difficulty,
    servings: u32,
    tags: &'a [String],
    tips: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    created_by: Option<&'a str>,
}

impl<'a> RecipeWrite<'a> {
    fn new(recipe: &'a GeneratedRecipe, created_by: Option<&'a str>) -> Result<Self> {
        Ok(Self {
            name: &recipe.name,
            image: recipe.image.as_deref(),
            ingredients: serde_json::to_string(&recipe.ingredients)?,
            instructions: serde_json::to_string(&recipe.instructions)?,
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty,
            servings: recipe.servings,
            tags: &recipe.tags,
            tips: &recipe.tips,
            created_by,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IngredientRow {
    id: Value,
    name: String,
    #[serde(default)]
    quantity: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: id_string(row.id),
            name: row.name,
            quantity: row.quantity,
            category: row.category,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct IngredientWrite<'a> {
    name: &'a str,
    quantity: Option<&'a str>,
    category: Option<&'a str>,
    expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

impl<'a> IngredientWrite<'a> {
    fn new(ingredient: &'a NewIngredient, user_id: Option<&'a str>) -> Self {
        Self {
            name: ingredient.name.trim(),
            quantity: ingredient.quantity.as_deref(),
            category: ingredient.category.as_deref(),
            expiry_date: ingredient.expiry_date,
            user_id,
        }
    }
}

/// Pantry rows for a batch of bare names, blanks skipped
fn named_ingredients(names: &[String]) -> Vec<NewIngredient> {
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| NewIngredient::named(name.as_str()))
        .collect()
}

fn id_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Decode a list column, skipping elements that do not fit `T`
fn decode_list<T: DeserializeOwned>(column: Value) -> Vec<T> {
    let column = match column {
        Value::String(encoded) => serde_json::from_str(&encoded).unwrap_or(Value::Null),
        other => other,
    };

    match column {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}
