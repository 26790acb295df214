//! Recipe catalog client.
//!
//! The catalog answers two questions:
//! - which recipes use a given ingredient (`RecipeSearchClient`)
//! - what a given recipe looks like in full (`RecipeDetailClient`)
//!
//! Both are separate seams so a test can stub one without the other, but the
//! HTTP implementation (`MealDbClient`) serves both from the same catalog.

use async_trait::async_trait;

use domain::{RecipeDetail, RecipeSummary, Result};

pub mod mealdb;

pub use mealdb::{CatalogConfig, MealDbClient};

/// Searches the catalog by ingredient name.
#[async_trait]
pub trait RecipeSearchClient: Send + Sync {
    /// Returns every summary the catalog lists for the ingredient.
    ///
    /// An empty list is a valid answer, not an error. The ingredient must be
    /// non-empty after trimming.
    async fn search_by_ingredient(&self, ingredient: &str) -> Result<Vec<RecipeSummary>>;
}

/// Looks a recipe up by its catalog identifier.
#[async_trait]
pub trait RecipeDetailClient: Send + Sync {
    /// Fails with `NotFound` when the catalog has no such id.
    async fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail>;
}
