//! Dish photo lookup
//!
//! Image lookup never decides whether a generation succeeds; every failure
//! path ends at [`FALLBACK_IMAGE_URL`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{PantryChefError, Result};
use crate::types::{GeneratedRecipe, DEFAULT_TIMEOUT_SECS};

/// Generic plated-food photo used whenever no better match is found
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1604329760661-e71dc83f8f26?w=400&h=300&fit=crop";

const UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";

/// Photos described with these words tend to show produce rather than a dish
const RAW_INGREDIENT_KEYWORDS: [&str; 7] = [
    "raw",
    "uncooked",
    "ingredient",
    "market",
    "grocery",
    "vegetable",
    "fruit",
];

/// Cooking style hints, matched against the dish name
const STYLE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["stir-fry", "stir fry", "볶음", "볶아"], "stir-fry"),
    (&["grill", "구이", "구워"], "grilled"),
    (&["stew", "soup", "찌개", "국"], "stew soup"),
    (&["salad", "샐러드", "무침"], "salad"),
    (&["fried", "튀김", "튀겨"], "fried"),
];

/// Finds a photo URL for a generated recipe
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn find_image(&self, recipe: &GeneratedRecipe) -> Result<String>;
}

/// Always answers with [`FALLBACK_IMAGE_URL`]
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderImages;

#[async_trait]
impl ImageSearch for PlaceholderImages {
    async fn find_image(&self, _recipe: &GeneratedRecipe) -> Result<String> {
        Ok(FALLBACK_IMAGE_URL.to_string())
    }
}

/// Search query for a recipe photo
///
/// Uses up to three available ingredients. A recognised cooking style in the
/// dish name replaces the name itself, which keeps the query on cooked food.
pub fn build_image_query(recipe: &GeneratedRecipe) -> String {
    let main: Vec<&str> = recipe
        .ingredients
        .iter()
        .filter(|i| i.is_available)
        .map(|i| i.name.trim())
        .filter(|name| !name.is_empty())
        .take(3)
        .collect();

    let name = recipe.name.to_lowercase();
    let style = STYLE_KEYWORDS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| name.contains(n)))
        .map(|(_, style)| *style);

    let mut parts: Vec<&str> = Vec::new();
    match style {
        Some(style) => {
            parts.extend(main);
            parts.push(style);
        }
        None => {
            parts.push(recipe.name.trim());
            parts.extend(main);
        }
    }
    parts.push("food");

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unsplash photo search
pub struct UnsplashImageSearch {
    client: Client,
    access_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl UnsplashImageSearch {
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PantryChefError::network(e.to_string(), None, None))?;

        Ok(Self {
            client,
            access_key: access_key.into(),
            base_url: UNSPLASH_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<UnsplashPhoto>> {
        let url = format!("{}/search/photos", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("per_page", "3"), ("orientation", "landscape")])
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await
            .map_err(|e| PantryChefError::request_failed(e, "Image search", self.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PantryChefError::network(
                format!("Image search failed ({})", status),
                Some(status.as_u16()),
                Some(url),
            ));
        }

        let body: UnsplashSearchResponse = response.json().await?;
        Ok(body.results)
    }
}

#[async_trait]
impl ImageSearch for UnsplashImageSearch {
    async fn find_image(&self, recipe: &GeneratedRecipe) -> Result<String> {
        if self.access_key.trim().is_empty() {
            tracing::warn!("Unsplash access key missing, using placeholder image");
            return Ok(FALLBACK_IMAGE_URL.to_string());
        }

        let query = build_image_query(recipe);
        tracing::debug!(query = %query, "Searching recipe image");

        match self.search(&query).await {
            Ok(results) => Ok(select_image(&results).unwrap_or_else(|| FALLBACK_IMAGE_URL.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "Image search failed, using placeholder image");
                Ok(FALLBACK_IMAGE_URL.to_string())
            }
        }
    }
}

/// First of the top three photos that does not look like raw produce,
/// else the first photo
fn select_image(results: &[UnsplashPhoto]) -> Option<String> {
    results
        .iter()
        .take(3)
        .find(|photo| !photo.looks_raw())
        .or_else(|| results.first())
        .map(|photo| photo.urls.regular.clone())
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
    #[serde(default)]
    tags: Vec<UnsplashTag>,
    urls: UnsplashUrls,
}

impl UnsplashPhoto {
    fn looks_raw(&self) -> bool {
        let description = self
            .description
            .as_deref()
            .or(self.alt_description.as_deref())
            .unwrap_or_default()
            .to_lowercase();
        let tags: Vec<String> = self.tags.iter().map(|t| t.title.to_lowercase()).collect();

        RAW_INGREDIENT_KEYWORDS
            .iter()
            .any(|k| description.contains(k) || tags.iter().any(|t| t.contains(k)))
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashTag {
    title: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, RecipeIngredient};
    use serde_json::json;

    fn recipe(name: &str) -> GeneratedRecipe {
        GeneratedRecipe {
            name: name.to_string(),
            ingredients: vec![
                RecipeIngredient::new("pork", "200g", true),
                RecipeIngredient::new("kimchi", "1 cup", true),
                RecipeIngredient::new("gochugaru", "1 tsp", false),
                RecipeIngredient::new("onion", "1", true),
                RecipeIngredient::new("tofu", "1 block", true),
            ],
            instructions: vec!["cook".to_string()],
            cooking_time: 20,
            difficulty: Difficulty::Easy,
            servings: 2,
            tags: Vec::new(),
            tips: Vec::new(),
            image: None,
            nutrition: None,
        }
    }

    #[test]
    fn test_query_with_style_keyword() {
        assert_eq!(build_image_query(&recipe("Spicy Pork Stir-Fry")), "pork kimchi onion stir-fry food");
        assert_eq!(build_image_query(&recipe("김치찌개")), "pork kimchi onion stew soup food");
    }

    #[test]
    fn test_query_without_style_keyword() {
        assert_eq!(build_image_query(&recipe("Pork Bowl")), "Pork Bowl pork kimchi onion food");
    }

    #[test]
    fn test_select_skips_raw_produce() {
        let results: UnsplashSearchResponse = serde_json::from_value(json!({
            "results": [
                {"description": "Fresh vegetables at the market", "urls": {"regular": "a"}},
                {"alt_description": "bowl of stew", "tags": [{"title": "Raw"}], "urls": {"regular": "b"}},
                {"alt_description": "bowl of stew", "urls": {"regular": "c"}}
            ]
        }))
        .unwrap();
        assert_eq!(select_image(&results.results).as_deref(), Some("c"));
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let results: UnsplashSearchResponse = serde_json::from_value(json!({
            "results": [
                {"description": "raw fish", "urls": {"regular": "a"}},
                {"description": "fruit", "urls": {"regular": "b"}}
            ]
        }))
        .unwrap();
        assert_eq!(select_image(&results.results).as_deref(), Some("a"));
        assert_eq!(select_image(&[]), None);
    }

    #[tokio::test]
    async fn test_missing_key_uses_placeholder() {
        let search = UnsplashImageSearch::new("").unwrap();
        assert_eq!(search.find_image(&recipe("x")).await.unwrap(), FALLBACK_IMAGE_URL);
        assert_eq!(PlaceholderImages.find_image(&recipe("x")).await.unwrap(), FALLBACK_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_unreachable_host_uses_placeholder() {
        let search = UnsplashImageSearch::new("key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(search.find_image(&recipe("x")).await.unwrap(), FALLBACK_IMAGE_URL);
    }
}
