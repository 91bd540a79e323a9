//! Recipe generator driving the model through prompt, repair and dedupe

use crate::error::{PantryChefError, Result};
use crate::image::{ImageSearch, PlaceholderImages};
use crate::llm::prompt::{
    build_prompt, build_search_prompt, build_seasonal_prompt, build_tips_prompt, SEARCH_SYSTEM_PROMPT,
    SYSTEM_PROMPT,
};
use crate::llm::{create_provider, LlmProvider};
use crate::recipe::normalize::recover_string_list;
use crate::recipe::{fallback_recipe, recover_json, to_named_dish_recipe, to_recipe, DuplicateGuard};
use crate::store::RecipeStore;
use crate::types::{GeneratedRecipe, GenerationRequest, LlmConfig, MetricsSnapshot, PerformanceMetrics};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Generates recipes with the configured LLM providers
///
/// Clones share the provider registry and metrics.
#[derive(Clone)]
pub struct RecipeGenerator {
    providers: Arc<RwLock<HashMap<String, Arc<dyn LlmProvider>>>>,
    default_provider: Arc<RwLock<String>>,
    images: Arc<dyn ImageSearch>,
    store: Option<Arc<dyn RecipeStore>>,
    guard: DuplicateGuard,
    max_attempts: u32,
    metrics: Arc<PerformanceMetrics>,
}

impl RecipeGenerator {
    /// Create a generator with no providers, placeholder images and no store
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            default_provider: Arc::new(RwLock::new("perplexity".to_string())),
            images: Arc::new(PlaceholderImages),
            store: None,
            guard: DuplicateGuard::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            metrics: Arc::new(PerformanceMetrics::new()),
        }
    }

    pub fn with_image_search(mut self, images: Arc<dyn ImageSearch>) -> Self {
        self.images = images;
        self
    }

    /// Recipes in `store` are what new generations must not repeat
    pub fn with_store(mut self, store: Arc<dyn RecipeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_guard(mut self, guard: DuplicateGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Add an LLM provider built from configuration
    ///
    /// The first provider added becomes the default.
    pub fn add_provider(&self, config: &LlmConfig) -> Result<()> {
        let provider = create_provider(config)?;
        self.register_provider(Arc::from(provider));
        Ok(())
    }

    /// Register an already constructed provider under its own name
    pub fn register_provider(&self, provider: Arc<dyn LlmProvider>) {
        let name = provider.name().to_string();
        let mut providers = self.providers.write();
        if providers.is_empty() {
            *self.default_provider.write() = name.clone();
        }
        providers.insert(name, provider);
    }

    /// Set default provider; unknown names are ignored
    pub fn set_default_provider(&self, provider: &str) {
        let providers = self.providers.read();
        if providers.contains_key(provider) {
            *self.default_provider.write() = provider.to_string();
        }
    }

    pub fn default_provider(&self) -> String {
        self.default_provider.read().clone()
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn LlmProvider>> {
        // Clone the Arc so no lock is held across the model call
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PantryChefError::config(format!("Provider not configured: {}", name)))
    }

    /// Generate a recipe with the default provider
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedRecipe> {
        let provider = self.default_provider();
        self.generate_with_provider(request, &provider).await
    }

    /// Generate a recipe from the request's ingredients
    ///
    /// Each attempt builds a prompt, calls the model, recovers and coerces the
    /// JSON answer and checks it against stored recipes. Unrecoverable output
    /// is replaced by the offline fallback recipe. Transport failures and
    /// duplicates move on to the next attempt. When every attempt was a
    /// duplicate the result is `DuplicateExhausted`; otherwise the last
    /// transport failure is returned. Credential errors stop at once.
    pub async fn generate_with_provider(
        &self,
        request: &GenerationRequest,
        provider_name: &str,
    ) -> Result<GeneratedRecipe> {
        request.validate()?;
        let provider = self.provider(provider_name)?;
        let start_time = Instant::now();
        let mut last_error = None;
        let mut duplicates = 0;

        for attempt in 0..self.max_attempts {
            let prompt = build_prompt(request, attempt);
            self.metrics.increment_model_calls();

            let raw = match provider.complete(SYSTEM_PROMPT, &prompt).await {
                Ok(raw) => raw,
                Err(e) if e.is_fatal() => {
                    self.metrics.increment_errors();
                    tracing::warn!(provider = %provider_name, error = %e, "Model call rejected, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %provider_name,
                        attempt = attempt + 1,
                        error = %e,
                        "Model call failed"
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            let recipe = match recover_json(&raw) {
                Ok(recovered) => to_recipe(&recovered.value, request),
                Err(e) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "Model output unrecoverable, using fallback recipe");
                    self.metrics.increment_fallbacks_used();
                    fallback_recipe(request)
                }
            };

            if self.is_duplicate(&recipe).await {
                self.metrics.increment_duplicates_rejected();
                tracing::warn!(attempt = attempt + 1, recipe = %recipe.name, "Generated recipe duplicates a stored one");
                duplicates += 1;
                continue;
            }

            let recipe = self.attach_image(recipe).await;
            self.metrics.increment_recipes_generated();
            tracing::info!(
                provider = %provider_name,
                attempt = attempt + 1,
                recipe = %recipe.name,
                duration_ms = %start_time.elapsed().as_millis(),
                "Recipe generation completed"
            );
            return Ok(recipe);
        }

        self.metrics.increment_errors();
        match last_error {
            Some(e) if duplicates < self.max_attempts => Err(e),
            _ => Err(PantryChefError::duplicate_exhausted(duplicates)),
        }
    }

    /// Standard recipe for a named dish
    ///
    /// One model call, no duplicate check and no fallback: unreadable output
    /// is returned as a parse error rather than replaced by another dish.
    pub async fn generate_for_named_dish(&self, dish: &str) -> Result<GeneratedRecipe> {
        let dish = dish.trim();
        if dish.is_empty() {
            return Err(PantryChefError::validation("Dish name cannot be empty"));
        }

        let provider_name = self.default_provider();
        let provider = self.provider(&provider_name)?;
        let start_time = Instant::now();

        self.metrics.increment_model_calls();
        let result = async {
            let raw = provider.complete(SEARCH_SYSTEM_PROMPT, &build_search_prompt(dish)).await?;
            let recovered = recover_json(&raw)?;
            Ok::<_, PantryChefError>(to_named_dish_recipe(&recovered.value, dish))
        }
        .await;

        match result {
            Ok(recipe) => {
                let recipe = self.attach_image(recipe).await;
                self.metrics.increment_recipes_generated();
                tracing::info!(
                    provider = %provider_name,
                    dish = %dish,
                    duration_ms = %start_time.elapsed().as_millis(),
                    "Named dish recipe completed"
                );
                Ok(recipe)
            }
            Err(e) => {
                self.metrics.increment_errors();
                tracing::warn!(provider = %provider_name, dish = %dish, error = %e, "Named dish recipe failed");
                Err(e)
            }
        }
    }

    /// Ingredients in season right now; empty when the model cannot answer
    pub async fn seasonal_ingredients(&self) -> Vec<String> {
        self.string_list(&build_seasonal_prompt(), "seasonal ingredients").await
    }

    /// Cooking tips for one ingredient; empty when the model cannot answer
    pub async fn cooking_tips(&self, ingredient: &str) -> Vec<String> {
        if ingredient.trim().is_empty() {
            return Vec::new();
        }
        self.string_list(&build_tips_prompt(ingredient), "cooking tips").await
    }

    async fn string_list(&self, prompt: &str, what: &str) -> Vec<String> {
        let provider = match self.provider(&self.default_provider()) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot fetch {}", what);
                return Vec::new();
            }
        };

        self.metrics.increment_model_calls();
        match provider.complete(SYSTEM_PROMPT, prompt).await {
            Ok(raw) => recover_string_list(&raw).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Fetching {} failed", what);
                Vec::new()
            }
        }
    }

    async fn is_duplicate(&self, recipe: &GeneratedRecipe) -> bool {
        match &self.store {
            Some(store) => self.guard.check_against_store(store.as_ref(), recipe).await,
            None => false,
        }
    }

    /// Image failures leave the recipe as it is
    async fn attach_image(&self, mut recipe: GeneratedRecipe) -> GeneratedRecipe {
        match self.images.find_image(&recipe).await {
            Ok(url) => recipe.image = Some(url),
            Err(e) => tracing::warn!(recipe = %recipe.name, error = %e, "Image lookup failed"),
        }
        recipe
    }

    /// Get available providers (thread-safe)
    pub fn available_providers(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Check if provider is available (thread-safe)
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.read().contains_key(provider)
    }

    /// Check if any providers are configured (thread-safe)
    pub fn is_ready(&self) -> bool {
        !self.providers.read().is_empty()
    }

    /// Get current metrics snapshot
    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }
}

impl Default for RecipeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
