//! Near-duplicate detection against recipes already in the store

use serde::{Deserialize, Serialize};

use crate::store::RecipeStore;
use crate::types::{GeneratedRecipe, StoredRecipe};

/// Tunable limits for the duplicate verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateThresholds {
    /// Names are duplicates above this normalized Levenshtein similarity
    pub name_similarity: f64,
    /// Minimum number of shared ingredients
    pub min_shared_ingredients: usize,
    /// Shared ingredients over the larger list must exceed this ratio
    pub overlap_ratio: f64,
}

impl Default for DuplicateThresholds {
    fn default() -> Self {
        Self {
            name_similarity: 0.8,
            min_shared_ingredients: 2,
            overlap_ratio: 0.5,
        }
    }
}

/// Decides whether a fresh recipe repeats one that already exists
#[derive(Debug, Clone, Default)]
pub struct DuplicateGuard {
    thresholds: DuplicateThresholds,
}

impl DuplicateGuard {
    pub fn new(thresholds: DuplicateThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> DuplicateThresholds {
        self.thresholds
    }

    /// Either a similar name or a large ingredient overlap with any existing recipe
    pub fn is_duplicate(&self, name: &str, ingredient_names: &[String], existing: &[StoredRecipe]) -> bool {
        existing.iter().any(|stored| {
            let other = &stored.recipe;
            if self.names_match(name, &other.name) {
                tracing::debug!(candidate = %name, existing = %other.name, "Recipe name too similar");
                return true;
            }
            if self.ingredients_match(ingredient_names, &other.ingredient_names()) {
                tracing::debug!(candidate = %name, existing = %other.name, "Ingredient lists overlap");
                return true;
            }
            false
        })
    }

    /// Check `recipe` against everything in `store`
    ///
    /// A store that cannot be read never blocks generation: the answer is
    /// then "not a duplicate".
    pub async fn check_against_store(&self, store: &dyn RecipeStore, recipe: &GeneratedRecipe) -> bool {
        match store.select_all().await {
            Ok(existing) => self.is_duplicate(&recipe.name, &recipe.ingredient_names(), &existing),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load recipes for duplicate check, assuming unique");
                false
            }
        }
    }

    pub fn names_match(&self, a: &str, b: &str) -> bool {
        let a = normalize_name(a);
        let b = normalize_name(b);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a == b
            || a.contains(&b)
            || b.contains(&a)
            || name_similarity(&a, &b) > self.thresholds.name_similarity
    }

    pub fn ingredients_match(&self, a: &[String], b: &[String]) -> bool {
        let shared = ingredient_overlap(a, b);
        let larger = a.len().max(b.len());
        shared >= self.thresholds.min_shared_ingredients
            && larger > 0
            && shared as f64 / larger as f64 > self.thresholds.overlap_ratio
    }
}

/// Lowercase and keep only letters and digits (any script)
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Edit distance counted in characters
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / longer length`, in `[0, 1]`
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// How many of `candidate`'s ingredients appear in `existing`
///
/// Matching is case-insensitive and substring based, so "pork belly" and
/// "pork" count as the same ingredient.
pub fn ingredient_overlap(candidate: &[String], existing: &[String]) -> usize {
    let existing: Vec<String> = existing
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    candidate
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .filter(|name| {
            existing
                .iter()
                .any(|other| other.contains(name.as_str()) || name.contains(other.as_str()))
        })
        .count()
}
