//! HTTP implementation of the catalog against the meal-database JSON API.
//!
//! Wire shape (both endpoints):
//! ```text
//! { "meals": [ { "idMeal": "52772", "strMeal": "...", "strMealThumb": "...", ... } ] }
//! { "meals": null }   // no match
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use domain::{PipelineError, RecipeDetail, RecipeSummary, Result};

use crate::{RecipeDetailClient, RecipeSearchClient};

const SERVICE: &str = "recipe catalog";

/// Catalog API configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL (endpoints are `{base_url}/filter.php` and `{base_url}/lookup.php`)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.themealdb.com/api/json/v1/1".to_owned(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MealsEnvelope<T> {
    meals: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct MealSummary {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal")]
    title: String,
    #[serde(rename = "strMealThumb", default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MealDetail {
    #[serde(rename = "strMeal")]
    title: String,
    #[serde(rename = "strMealThumb", default)]
    thumbnail: Option<String>,
    #[serde(rename = "strInstructions", default)]
    instructions: Option<String>,
    #[serde(rename = "strYoutube", default)]
    youtube: Option<String>,
}

impl From<MealSummary> for RecipeSummary {
    fn from(meal: MealSummary) -> Self {
        RecipeSummary {
            id: meal.id,
            title: meal.title,
            thumbnail_url: meal.thumbnail.unwrap_or_default(),
        }
    }
}

impl From<MealDetail> for RecipeDetail {
    fn from(meal: MealDetail) -> Self {
        RecipeDetail {
            title: meal.title,
            thumbnail_url: meal.thumbnail.unwrap_or_default(),
            instructions: meal.instructions.unwrap_or_default(),
            // The catalog sends "" rather than null for recipes without a video
            video_url: meal.youtube.filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Client for the recipe catalog.
pub struct MealDbClient {
    config: CatalogConfig,
    client: Client,
}

impl MealDbClient {
    /// Create a new catalog client
    pub fn new(config: CatalogConfig) -> Self {
        info!("Recipe catalog configured at {}", config.base_url);
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    async fn get_meals<T>(&self, endpoint: &str, key: &str) -> Result<(StatusCode, Option<Vec<T>>)>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .get(self.endpoint(endpoint))
            .query(&[("i", key)])
            .send()
            .await
            .map_err(|e| {
                error!("Catalog request to {} failed: {}", endpoint, e);
                PipelineError::unavailable(SERVICE, e)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok((status, None));
        }
        if !status.is_success() {
            error!("Catalog returned {} for {}", status, endpoint);
            return Err(PipelineError::unavailable(SERVICE, format!("HTTP {status}")));
        }

        let envelope: MealsEnvelope<T> = response.json().await.map_err(|e| {
            error!("Invalid catalog response from {}: {}", endpoint, e);
            PipelineError::unavailable(SERVICE, format!("invalid response: {e}"))
        })?;
        Ok((status, envelope.meals))
    }
}

#[async_trait]
impl RecipeSearchClient for MealDbClient {
    #[instrument(skip(self))]
    async fn search_by_ingredient(&self, ingredient: &str) -> Result<Vec<RecipeSummary>> {
        let ingredient = ingredient.trim().to_lowercase();
        if ingredient.is_empty() {
            return Err(PipelineError::InvalidInput(
                "ingredient must not be empty".to_string(),
            ));
        }

        let (status, meals) = self.get_meals::<MealSummary>("filter.php", &ingredient).await?;
        if status == StatusCode::NOT_FOUND {
            error!("Catalog search endpoint answered 404");
            return Err(PipelineError::unavailable(SERVICE, "search endpoint not found"));
        }

        // Identifiers are unique within one response; keep the first occurrence
        let mut seen = HashSet::new();
        let recipes: Vec<RecipeSummary> = meals
            .unwrap_or_default()
            .into_iter()
            .filter(|meal| seen.insert(meal.id.clone()))
            .map(RecipeSummary::from)
            .collect();

        debug!("Catalog returned {} recipes for '{}'", recipes.len(), ingredient);
        Ok(recipes)
    }
}

#[async_trait]
impl RecipeDetailClient for MealDbClient {
    #[instrument(skip(self))]
    async fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail> {
        let recipe_id = recipe_id.trim();
        if recipe_id.is_empty() {
            return Err(PipelineError::InvalidInput(
                "recipe id must not be empty".to_string(),
            ));
        }

        let (status, meals) = self.get_meals::<MealDetail>("lookup.php", recipe_id).await?;
        match meals.and_then(|m| m.into_iter().next()) {
            Some(meal) => Ok(meal.into()),
            None => {
                warn!("Recipe {} not in catalog (HTTP {})", recipe_id, status);
                Err(PipelineError::not_found("recipe", recipe_id))
            }
        }
    }
}
