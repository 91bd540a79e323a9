//! Environment-driven application configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{PantryChefError, Result};
use crate::image::{ImageSearch, PlaceholderImages, UnsplashImageSearch};
use crate::llm::generator::DEFAULT_MAX_ATTEMPTS;
use crate::llm::{available_providers, default_model, RecipeGenerator};
use crate::recipe::{DuplicateGuard, DuplicateThresholds};
use crate::store::{LocalStore, PantryStore, RecipeStore, SupabaseStore};
use crate::types::{LlmConfig, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_USER_ID: &str = "local";

/// Hosted row store credentials
#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Everything the binary reads from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub unsplash_access_key: Option<String>,
    pub supabase: Option<SupabaseConfig>,
    pub store_path: PathBuf,
    pub user_id: String,
    pub max_attempts: u32,
    pub thresholds: DuplicateThresholds,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// Blank values count as unset. Credentials are not checked here; the
    /// provider constructors do that, so offline commands work without keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = get("PANTRY_CHEF_PROVIDER")
            .map(|p| p.to_lowercase())
            .unwrap_or_else(|| "perplexity".to_string());
        if !available_providers().iter().any(|p| *p == provider) {
            return Err(PantryChefError::config(format!(
                "Unsupported LLM provider: {}. Supported providers: {}",
                provider,
                available_providers().join(", ")
            )));
        }

        let timeout_secs: u64 = parse_or(&get, "PANTRY_CHEF_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(PantryChefError::config("PANTRY_CHEF_TIMEOUT_SECS must be at least 1"));
        }

        let prefix = provider.to_uppercase();
        let llm = LlmConfig {
            model: get(&format!("{}_MODEL", prefix)).unwrap_or_else(|| default_model(&provider).to_string()),
            api_key: get(&format!("{}_API_KEY", prefix)).unwrap_or_default(),
            base_url: get(&format!("{}_BASE_URL", prefix)),
            provider,
            timeout_secs,
            ..LlmConfig::default()
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            (None, None) => None,
            _ => {
                return Err(PantryChefError::config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together",
                ))
            }
        };

        let max_attempts: u32 = parse_or(&get, "PANTRY_CHEF_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(PantryChefError::config("PANTRY_CHEF_MAX_ATTEMPTS must be at least 1"));
        }

        let defaults = DuplicateThresholds::default();
        let thresholds = DuplicateThresholds {
            name_similarity: parse_or(&get, "DUPLICATE_NAME_SIMILARITY", defaults.name_similarity)?,
            min_shared_ingredients: parse_or(&get, "DUPLICATE_MIN_SHARED", defaults.min_shared_ingredients)?,
            overlap_ratio: parse_or(&get, "DUPLICATE_OVERLAP_RATIO", defaults.overlap_ratio)?,
        };
        for (key, value) in [
            ("DUPLICATE_NAME_SIMILARITY", thresholds.name_similarity),
            ("DUPLICATE_OVERLAP_RATIO", thresholds.overlap_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PantryChefError::config(format!("{} must be between 0 and 1", key)));
            }
        }

        Ok(Self {
            llm,
            unsplash_access_key: get("UNSPLASH_ACCESS_KEY"),
            supabase,
            store_path: get("PANTRY_CHEF_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(LocalStore::default_path),
            user_id: get("PANTRY_CHEF_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            max_attempts,
            thresholds,
        })
    }

    /// Supabase when configured, else the local JSON store
    pub fn open_store(&self) -> Result<StoreBackend> {
        match &self.supabase {
            Some(supabase) => Ok(StoreBackend::Supabase(Arc::new(SupabaseStore::new(
                &supabase.url,
                &supabase.anon_key,
            )?))),
            None => Ok(StoreBackend::Local(Arc::new(LocalStore::open(&self.store_path)?))),
        }
    }

    pub fn image_search(&self) -> Result<Arc<dyn ImageSearch>> {
        match &self.unsplash_access_key {
            Some(key) => Ok(Arc::new(UnsplashImageSearch::new(key.as_str())?)),
            None => Ok(Arc::new(PlaceholderImages)),
        }
    }

    /// Generator with the configured provider and images
    ///
    /// Generations are checked for duplicates against `store` when given.
    pub fn build_generator(&self, store: Option<Arc<dyn RecipeStore>>) -> Result<RecipeGenerator> {
        let mut generator = RecipeGenerator::new()
            .with_image_search(self.image_search()?)
            .with_guard(DuplicateGuard::new(self.thresholds))
            .with_max_attempts(self.max_attempts);
        if let Some(store) = store {
            generator = generator.with_store(store);
        }
        generator.add_provider(&self.llm)?;
        Ok(generator)
    }
}

/// The store the binary talks to
#[derive(Clone)]
pub enum StoreBackend {
    Supabase(Arc<SupabaseStore>),
    Local(Arc<LocalStore>),
}

impl StoreBackend {
    pub fn recipes(&self) -> Arc<dyn RecipeStore> {
        match self {
            Self::Supabase(store) => store.clone(),
            Self::Local(store) => store.clone(),
        }
    }

    pub fn pantry(&self) -> Arc<dyn PantryStore> {
        match self {
            Self::Supabase(store) => store.clone(),
            Self::Local(store) => store.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Supabase(_) => "supabase".to_string(),
            Self::Local(store) => match store.path() {
                Some(path) => format!("local file {}", path.display()),
                None => "in-memory".to_string(),
            },
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| PantryChefError::config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.llm.provider, "perplexity");
        assert_eq!(config.llm.model, "llama-3.1-sonar-small-128k-online");
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.store_path, PathBuf::from("data/pantry-chef.json"));
        assert_eq!(config.user_id, "local");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.thresholds, DuplicateThresholds::default());
        assert!(config.supabase.is_none());
        assert!(config.unsplash_access_key.is_none());
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_provider_specific_keys() {
        let config = config(&[
            ("PANTRY_CHEF_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", " sk-test "),
            ("OPENAI_MODEL", "gpt-4o"),
            ("PERPLEXITY_API_KEY", "pplx-ignored"),
        ])
        .unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn test_tunables() {
        let config = config(&[
            ("PANTRY_CHEF_MAX_ATTEMPTS", "5"),
            ("DUPLICATE_NAME_SIMILARITY", "0.9"),
            ("DUPLICATE_MIN_SHARED", "3"),
            ("DUPLICATE_OVERLAP_RATIO", ""),
            ("PANTRY_CHEF_TIMEOUT_SECS", "75"),
        ])
        .unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.llm.timeout_secs, 75);
        assert_eq!(config.thresholds.name_similarity, 0.9);
        assert_eq!(config.thresholds.min_shared_ingredients, 3);
        assert_eq!(config.thresholds.overlap_ratio, 0.5);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            vec![("PANTRY_CHEF_PROVIDER", "gemini")],
            vec![("PANTRY_CHEF_MAX_ATTEMPTS", "three")],
            vec![("PANTRY_CHEF_MAX_ATTEMPTS", "0")],
            vec![("PANTRY_CHEF_TIMEOUT_SECS", "0")],
            vec![("DUPLICATE_NAME_SIMILARITY", "1.5")],
            vec![("SUPABASE_URL", "https://x.supabase.co")],
        ] {
            assert!(
                matches!(config(&vars), Err(PantryChefError::Config { .. })),
                "{:?} should be rejected",
                vars
            );
        }
    }

    #[test]
    fn test_generator_requires_valid_key() {
        let store: Arc<dyn RecipeStore> = Arc::new(LocalStore::in_memory());

        let missing = config(&[]).unwrap();
        assert!(missing.build_generator(None).is_err());

        let malformed = config(&[("PERPLEXITY_API_KEY", "sk-123")]).unwrap();
        assert!(matches!(
            malformed.build_generator(Some(store.clone())),
            Err(PantryChefError::Config { .. })
        ));

        let valid = config(&[("PERPLEXITY_API_KEY", "pplx-123")]).unwrap();
        let generator = valid.build_generator(Some(store)).unwrap();
        assert_eq!(generator.default_provider(), "perplexity");
    }

    #[test]
    fn test_local_store_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let config = config(&[("PANTRY_CHEF_STORE", path.to_str().unwrap())]).unwrap();
        let backend = config.open_store().unwrap();
        assert!(matches!(backend, StoreBackend::Local(_)));
        assert!(backend.describe().contains("store.json"));
    }
}
