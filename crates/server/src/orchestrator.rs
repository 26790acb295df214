//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation screen:
//! 1. Receive an image reference (`submit_image`)
//! 2. Detect labels with the vision service
//! 3. Select one ingredient from the labels
//! 4. Search the recipe catalog for that ingredient
//! 5. Load recipe detail on demand (`select_recipe`)
//!
//! Independently of the chain above, `activate` resolves the user's identity
//! (once) and refreshes the ingredient feed (every time the view regains
//! focus).
//!
//! ## Stale results
//!
//! There is no cancellation. Every request records the generation of the slot
//! it will write to; when its result arrives and the generation has moved on
//! (a newer image, a different recipe), the result is dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use catalog_client::{MealDbClient, RecipeDetailClient, RecipeSearchClient};
use domain::{ImageRef, Ingredient};
use pipeline::IngredientSelector;
use sources::{
    DocumentPhotoRepository, DocumentProfileRepository, FeedTrigger, IdentityProvider,
    IngredientFeedResolver, UserIdentityResolver,
};
use vision_client::{HttpVisionClient, VisionLabelClient};

use crate::config::PipelineConfig;
use crate::state::{AnalysisState, DetailState, Session, SessionSnapshot};

/// What happened to a request once its result came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to the session
    Applied,
    /// A newer request took over the slot; the result was dropped
    Superseded,
    /// The request was a no-op (missing or repeated image reference)
    Unchanged,
}

/// Every external collaborator the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub vision: Arc<dyn VisionLabelClient>,
    pub search: Arc<dyn RecipeSearchClient>,
    pub detail: Arc<dyn RecipeDetailClient>,
    pub identity: UserIdentityResolver,
    pub feed: IngredientFeedResolver,
}

/// Main orchestrator that sequences the recommendation pipeline.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    collaborators: Collaborators,
    selector: Arc<IngredientSelector>,
    session: Arc<Mutex<Session>>,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator over explicit collaborators
    pub fn new(collaborators: Collaborators, selector: IngredientSelector) -> Self {
        Self {
            collaborators,
            selector: Arc::new(selector),
            session: Arc::new(Mutex::new(Session::new())),
        }
    }

    /// Create an orchestrator backed by the HTTP collaborators in `config`
    ///
    /// 1. Vision client for labeling
    /// 2. One catalog client serving both search and detail
    /// 3. Profile and photo repositories (two separate stores)
    /// 4. The configured selection policy
    pub fn from_config(config: &PipelineConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        let catalog = Arc::new(MealDbClient::new(config.catalog.clone()));
        let profiles = Arc::new(DocumentProfileRepository::new(config.profiles.clone()));
        let photos = Arc::new(DocumentPhotoRepository::new(config.photos.clone()));

        let collaborators = Collaborators {
            vision: Arc::new(HttpVisionClient::new(config.vision.clone())),
            search: catalog.clone(),
            detail: catalog,
            identity: UserIdentityResolver::new(identity, profiles),
            feed: IngredientFeedResolver::new(photos),
        };
        info!("Ingredient policy: {}", config.policy);
        Self::new(collaborators, IngredientSelector::from_kind(config.policy))
    }

    /// Copy of the current session for rendering
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    // ------------------------------------------------------------------------
    // Analysis chain
    // ------------------------------------------------------------------------

    /// Entry point: analyze a new image reference.
    ///
    /// `None` and the reference already being analyzed are no-ops. A new
    /// reference resets the whole session (including any selected recipe) and
    /// restarts the chain.
    pub async fn submit_image(&self, image: Option<ImageRef>) -> Outcome {
        let Some(image) = image else {
            debug!("No image reference, staying idle");
            return Outcome::Unchanged;
        };

        let generation = {
            let mut session = self.session.lock().await;
            if session.image.as_ref() == Some(&image) {
                debug!("Image {} already submitted, ignoring", image);
                return Outcome::Unchanged;
            }
            session.image = Some(image.clone());
            session.analysis_generation += 1;
            session.analysis = AnalysisState::Analyzing {
                image: image.clone(),
            };
            session.detail_generation += 1;
            session.detail = DetailState::Idle;
            session.analysis_generation
        };
        info!("Analyzing image {} (generation {})", image, generation);

        let start_time = Instant::now();
        let result = self.run_analysis(&image).await;

        let mut session = self.session.lock().await;
        if session.analysis_generation != generation {
            debug!(
                "Discarding stale analysis for {} (generation {}, current {})",
                image, generation, session.analysis_generation
            );
            return Outcome::Superseded;
        }

        match &result {
            AnalysisState::Analyzed {
                ingredient, recipes, ..
            } => info!(
                "Analysis of {} finished in {:.2?}: '{}' with {} recipes",
                image,
                start_time.elapsed(),
                ingredient,
                recipes.len()
            ),
            AnalysisState::Failed { error, .. } => {
                error!("Analysis of {} failed: {}", image, error)
            }
            _ => {}
        }
        session.analysis = result;
        Outcome::Applied
    }

    /// Run labels → ingredient → recipes. Never fails; failures become state.
    async fn run_analysis(&self, image: &ImageRef) -> AnalysisState {
        let labels = match self.collaborators.vision.detect_labels(image).await {
            Ok(labels) => labels,
            Err(error) => {
                return AnalysisState::Failed {
                    labels: Vec::new(),
                    ingredient: None,
                    error,
                };
            }
        };
        debug!("Detected {} labels", labels.len());

        if labels.is_empty() {
            return AnalysisState::Analyzed {
                labels,
                ingredient: Ingredient::Unidentified,
                recipes: Vec::new(),
            };
        }

        let ingredient = self.selector.select_ingredient(&labels);
        if !ingredient.is_identified() {
            debug!("No ingredient identified, skipping recipe search");
            return AnalysisState::Analyzed {
                labels,
                ingredient,
                recipes: Vec::new(),
            };
        }

        match self
            .collaborators
            .search
            .search_by_ingredient(ingredient.as_str())
            .await
        {
            Ok(recipes) => AnalysisState::Analyzed {
                labels,
                ingredient,
                recipes,
            },
            Err(error) => AnalysisState::Failed {
                labels,
                ingredient: Some(ingredient),
                error,
            },
        }
    }

    // ------------------------------------------------------------------------
    // Recipe detail
    // ------------------------------------------------------------------------

    /// Load the detail of one recipe, replacing any previous selection.
    ///
    /// The id is not checked against the last search result; the catalog
    /// decides whether it exists.
    pub async fn select_recipe(&self, recipe_id: &str) -> Outcome {
        let recipe_id = recipe_id.to_string();
        let generation = {
            let mut session = self.session.lock().await;
            session.detail_generation += 1;
            session.detail = DetailState::Loading {
                recipe_id: recipe_id.clone(),
            };
            session.detail_generation
        };
        debug!("Loading recipe {} (generation {})", recipe_id, generation);

        let result = self.collaborators.detail.recipe_detail(&recipe_id).await;

        let mut session = self.session.lock().await;
        if session.detail_generation != generation {
            debug!("Discarding stale detail for recipe {}", recipe_id);
            return Outcome::Superseded;
        }

        session.detail = match result {
            Ok(detail) => {
                info!("Loaded recipe {}: {}", recipe_id, detail.title);
                DetailState::Loaded { recipe_id, detail }
            }
            Err(error) => {
                warn!("Failed to load recipe {}: {}", recipe_id, error);
                DetailState::Failed { recipe_id, error }
            }
        };
        Outcome::Applied
    }

    // ------------------------------------------------------------------------
    // Identity and feed
    // ------------------------------------------------------------------------

    /// The host view became active (first shown, or regained focus).
    ///
    /// Identity is resolved on the first activation only. The feed is
    /// refreshed on every activation; when identity resolution changed the
    /// nickname in the same activation, the refresh it triggered covers both.
    pub async fn activate(&self) {
        let first_activation = {
            let mut session = self.session.lock().await;
            !std::mem::replace(&mut session.identity_requested, true)
        };

        if first_activation && self.resolve_identity().await {
            return;
        }
        self.refresh_feed(FeedTrigger::Activated).await;
    }

    /// Resolve the signed-in principal's nickname into the session.
    ///
    /// Returns whether the nickname changed. A change re-runs the ingredient
    /// feed for the new nickname before returning. The orchestrator is the
    /// only writer of the nickname slot, and only through this method.
    pub async fn resolve_identity(&self) -> bool {
        let nickname = self.collaborators.identity.resolve_nickname().await;

        {
            let mut session = self.session.lock().await;
            session.identity_requested = true;
            if session.nickname == nickname {
                return false;
            }
            info!(
                "Nickname resolved: {}",
                nickname.as_deref().unwrap_or("<none>")
            );
            session.nickname = nickname;
        }

        self.refresh_feed(FeedTrigger::NicknameChanged).await;
        true
    }

    /// Re-query the ingredient feed for the current nickname.
    pub async fn refresh_feed(&self, trigger: FeedTrigger) -> Outcome {
        let (nickname, generation) = {
            let mut session = self.session.lock().await;
            session.feed_generation += 1;
            (session.nickname.clone(), session.feed_generation)
        };

        let result = self
            .collaborators
            .feed
            .list_for(nickname.as_deref().unwrap_or_default(), trigger)
            .await;

        let mut session = self.session.lock().await;
        if session.feed_generation != generation || session.nickname != nickname {
            debug!("Discarding stale feed for {:?}", nickname);
            return Outcome::Superseded;
        }

        match result {
            Ok(records) => {
                session.feed = records;
                Outcome::Applied
            }
            Err(err) => {
                // Keep showing the previous feed
                error!("Failed to load ingredient feed: {}", err);
                Outcome::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use domain::{
        IngredientPhotoRecord, Label, PipelineError, RecipeDetail, RecipeSummary, Result,
        UserProfile,
    };
    use sources::{InMemoryPhotoRepository, InMemoryProfileRepository, StaticIdentityProvider};

    use crate::state::ANALYSIS_ERROR_MESSAGE;

    // ============================================================================
    // Scripted Collaborators
    // ============================================================================

    /// Vision stub answering per image URL after a configurable delay
    #[derive(Default)]
    struct ScriptedVision {
        responses: HashMap<String, (Duration, Result<Vec<Label>>)>,
        calls: AtomicUsize,
    }

    impl ScriptedVision {
        fn respond(mut self, url: &str, delay_ms: u64, result: Result<Vec<Label>>) -> Self {
            self.responses
                .insert(url.to_string(), (Duration::from_millis(delay_ms), result));
            self
        }
    }

    #[async_trait]
    impl VisionLabelClient for ScriptedVision {
        async fn detect_labels(&self, image: &ImageRef) -> Result<Vec<Label>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = self
                .responses
                .get(image.url())
                .cloned()
                .unwrap_or((Duration::ZERO, Ok(Vec::new())));
            tokio::time::sleep(delay).await;
            result
        }
    }

    /// Catalog stub: search results per ingredient, detail results per id
    #[derive(Default)]
    struct ScriptedCatalog {
        search_results: HashMap<String, Vec<RecipeSummary>>,
        search_failure: Option<PipelineError>,
        details: HashMap<String, (Duration, RecipeDetail)>,
        search_calls: AtomicUsize,
        detail_calls: AtomicUsize,
    }

    impl ScriptedCatalog {
        fn with_recipes(mut self, ingredient: &str, titles: &[&str]) -> Self {
            let recipes = titles
                .iter()
                .enumerate()
                .map(|(i, title)| RecipeSummary {
                    id: format!("{}-{}", ingredient, i),
                    title: title.to_string(),
                    thumbnail_url: format!("https://img/{}-{}.jpg", ingredient, i),
                })
                .collect();
            self.search_results.insert(ingredient.to_string(), recipes);
            self
        }

        fn with_detail(mut self, id: &str, delay_ms: u64, title: &str) -> Self {
            let detail = RecipeDetail {
                title: title.to_string(),
                thumbnail_url: format!("https://img/{}.jpg", id),
                instructions: format!("Cook {}.", title),
                video_url: None,
            };
            self.details
                .insert(id.to_string(), (Duration::from_millis(delay_ms), detail));
            self
        }

        fn failing_search(mut self, error: PipelineError) -> Self {
            self.search_failure = Some(error);
            self
        }
    }

    #[async_trait]
    impl RecipeSearchClient for ScriptedCatalog {
        async fn search_by_ingredient(&self, ingredient: &str) -> Result<Vec<RecipeSummary>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.search_failure {
                return Err(err.clone());
            }
            Ok(self.search_results.get(ingredient).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl RecipeDetailClient for ScriptedCatalog {
        async fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            match self.details.get(recipe_id) {
                Some((delay, detail)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(detail.clone())
                }
                None => Err(PipelineError::not_found("recipe", recipe_id)),
            }
        }
    }

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    struct Harness {
        orchestrator: RecommendationOrchestrator,
        vision: Arc<ScriptedVision>,
        catalog: Arc<ScriptedCatalog>,
        identity: Arc<StaticIdentityProvider>,
        profiles: InMemoryProfileRepository,
        photos: InMemoryPhotoRepository,
    }

    fn build_harness(vision: ScriptedVision, catalog: ScriptedCatalog) -> Harness {
        let vision = Arc::new(vision);
        let catalog = Arc::new(catalog);
        let identity = Arc::new(StaticIdentityProvider::signed_out());
        let profiles = InMemoryProfileRepository::new();
        let photos = InMemoryPhotoRepository::new();

        let collaborators = Collaborators {
            vision: vision.clone(),
            search: catalog.clone(),
            detail: catalog.clone(),
            identity: UserIdentityResolver::new(identity.clone(), Arc::new(profiles.clone())),
            feed: IngredientFeedResolver::new(Arc::new(photos.clone())),
        };

        Harness {
            orchestrator: RecommendationOrchestrator::new(
                collaborators,
                IngredientSelector::default(),
            ),
            vision,
            catalog,
            identity,
            profiles,
            photos,
        }
    }

    fn fridge_labels() -> Vec<Label> {
        vec![
            Label::new("Potato", 0.9),
            Label::new("Onion", 0.8),
            Label::new("Carrot", 0.7),
            Label::new("Garlic", 0.95),
        ]
    }

    fn herb_labels() -> Vec<Label> {
        vec![
            Label::new("Food", 0.99),
            Label::new("Plant", 0.98),
            Label::new("Herb", 0.97),
            Label::new("Basil", 0.9),
        ]
    }

    fn image(url: &str) -> Option<ImageRef> {
        Some(ImageRef::new(url))
    }

    fn photo(id: &str, owner: &str) -> IngredientPhotoRecord {
        IngredientPhotoRecord {
            id: id.to_string(),
            image_url: format!("https://cdn/fridge/{}.jpg", id),
            owner_nickname: owner.to_string(),
        }
    }

    // ============================================================================
    // Analysis Chain
    // ============================================================================

    #[tokio::test]
    async fn test_garlic_with_no_recipes_is_analyzed() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default(),
        );

        let outcome = h.orchestrator.submit_image(image("a")).await;
        assert_eq!(outcome, Outcome::Applied);

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(
            snap.analysis,
            AnalysisState::Analyzed {
                labels: fridge_labels(),
                ingredient: Ingredient::Identified("garlic".to_string()),
                recipes: vec![],
            }
        );
        assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(snap.error_message(), None);
    }

    #[tokio::test]
    async fn test_recipes_are_listed_for_ingredient() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default().with_recipes("garlic", &["Garlic Bread", "Aioli"]),
        );

        h.orchestrator.submit_image(image("a")).await;

        let snap = h.orchestrator.snapshot().await;
        let titles: Vec<_> = snap.analysis.recipes().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Garlic Bread", "Aioli"]);
    }

    #[tokio::test]
    async fn test_vision_failure_never_searches() {
        let h = build_harness(
            ScriptedVision::default().respond(
                "a",
                0,
                Err(PipelineError::unavailable("vision", "timeout")),
            ),
            ScriptedCatalog::default(),
        );

        h.orchestrator.submit_image(image("a")).await;

        let snap = h.orchestrator.snapshot().await;
        assert!(matches!(
            snap.analysis,
            AnalysisState::Failed {
                error: PipelineError::ServiceUnavailable { .. },
                ..
            }
        ));
        assert_eq!(snap.error_message(), Some(ANALYSIS_ERROR_MESSAGE));
        assert_eq!(snap.analysis.ingredient(), None);
        assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_labels_skip_search() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(vec![])),
            ScriptedCatalog::default(),
        );

        h.orchestrator.submit_image(image("a")).await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(
            snap.analysis,
            AnalysisState::Analyzed {
                labels: vec![],
                ingredient: Ingredient::Unidentified,
                recipes: vec![],
            }
        );
        assert_eq!(snap.ingredient_message(), None);
        assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_label_list_skips_search() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels()[..2].to_vec())),
            ScriptedCatalog::default(),
        );

        h.orchestrator.submit_image(image("a")).await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.analysis.ingredient(), Some(&Ingredient::Unidentified));
        assert_eq!(snap.analysis.labels().len(), 2);
        assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_failure_keeps_labels() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default()
                .failing_search(PipelineError::unavailable("recipe catalog", "502")),
        );

        h.orchestrator.submit_image(image("a")).await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.analysis.labels(), fridge_labels().as_slice());
        assert_eq!(snap.analysis.ingredient().map(|i| i.as_str()), Some("garlic"));
        assert!(snap.analysis.error().is_some());
        assert_eq!(snap.error_message(), Some(ANALYSIS_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_missing_image_stays_idle() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());

        assert_eq!(h.orchestrator.submit_image(None).await, Outcome::Unchanged);
        assert_eq!(h.orchestrator.snapshot().await.analysis, AnalysisState::Idle);
        assert_eq!(h.vision.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_image_is_noop() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default(),
        );

        assert_eq!(h.orchestrator.submit_image(image("a")).await, Outcome::Applied);
        assert_eq!(h.orchestrator.submit_image(image("a")).await, Outcome::Unchanged);
        assert_eq!(h.vision.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_image_retriggers_chain() {
        let h = build_harness(
            ScriptedVision::default()
                .respond("a", 0, Ok(fridge_labels()))
                .respond("b", 0, Ok(herb_labels())),
            ScriptedCatalog::default(),
        );

        h.orchestrator.submit_image(image("a")).await;
        h.orchestrator.submit_image(image("b")).await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.analysis.ingredient().map(|i| i.as_str()), Some("basil"));
        assert_eq!(h.vision.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.catalog.search_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_analysis_does_not_bleed() {
        // "a" is slow, "b" is fast: "b" completes first even though it was
        // submitted second, then "a" completes late.
        let h = build_harness(
            ScriptedVision::default()
                .respond("a", 100, Ok(fridge_labels()))
                .respond("b", 10, Ok(herb_labels())),
            ScriptedCatalog::default()
                .with_recipes("garlic", &["Garlic Bread"])
                .with_recipes("basil", &["Pesto"]),
        );

        let first = h.orchestrator.submit_image(image("a"));
        let second = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            h.orchestrator.submit_image(image("b")).await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, Outcome::Superseded);
        assert_eq!(second, Outcome::Applied);

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.image, image("b"));
        assert_eq!(snap.analysis.labels(), herb_labels().as_slice());
        assert_eq!(snap.analysis.ingredient().map(|i| i.as_str()), Some("basil"));
        let titles: Vec<_> = snap.analysis.recipes().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Pesto"]);
    }

    // ============================================================================
    // Recipe Detail
    // ============================================================================

    #[tokio::test]
    async fn test_select_recipe_loads_detail() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default()
                .with_recipes("garlic", &["Garlic Bread"])
                .with_detail("garlic-0", 0, "Garlic Bread"),
        );
        h.orchestrator.submit_image(image("a")).await;

        assert_eq!(h.orchestrator.select_recipe("garlic-0").await, Outcome::Applied);

        let snap = h.orchestrator.snapshot().await;
        let detail = snap.detail.detail().expect("detail should be loaded");
        assert_eq!(detail.title, "Garlic Bread");
        assert_eq!(snap.detail.error_message(), None);
    }

    #[tokio::test]
    async fn test_unknown_recipe_still_requests_detail() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default()
                .with_recipes("garlic", &["Garlic Bread"])
                .with_detail("52772", 0, "Teriyaki Chicken"),
        );
        h.orchestrator.submit_image(image("a")).await;

        // Not in the last search result, but the catalog knows it
        h.orchestrator.select_recipe("52772").await;
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.detail.detail().map(|d| d.title.as_str()), Some("Teriyaki Chicken"));

        // Unknown to the catalog as well
        h.orchestrator.select_recipe("does-not-exist").await;
        let snap = h.orchestrator.snapshot().await;
        assert!(matches!(
            snap.detail,
            DetailState::Failed {
                error: PipelineError::NotFound { .. },
                ..
            }
        ));
        assert_eq!(h.catalog.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_selection_wins() {
        let h = build_harness(
            ScriptedVision::default(),
            ScriptedCatalog::default()
                .with_detail("slow", 50, "Slow Stew")
                .with_detail("fast", 5, "Quick Salad"),
        );

        let first = h.orchestrator.select_recipe("slow");
        let second = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            h.orchestrator.select_recipe("fast").await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, Outcome::Superseded);
        assert_eq!(second, Outcome::Applied);
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.detail.detail().map(|d| d.title.as_str()), Some("Quick Salad"));
    }

    #[tokio::test]
    async fn test_new_image_resets_detail() {
        let h = build_harness(
            ScriptedVision::default()
                .respond("a", 0, Ok(fridge_labels()))
                .respond("b", 0, Ok(herb_labels())),
            ScriptedCatalog::default().with_detail("1", 0, "Garlic Bread"),
        );
        h.orchestrator.submit_image(image("a")).await;
        h.orchestrator.select_recipe("1").await;
        assert!(h.orchestrator.snapshot().await.detail.detail().is_some());

        h.orchestrator.submit_image(image("b")).await;
        assert_eq!(h.orchestrator.snapshot().await.detail, DetailState::Idle);
    }

    // ============================================================================
    // Identity and Feed
    // ============================================================================

    #[tokio::test]
    async fn test_signed_out_user_gets_sentinel_and_empty_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.photos.insert(photo("1", "anonymous"));

        h.orchestrator.activate().await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname, None);
        assert_eq!(snap.display_nickname(), "anonymous");
        assert!(snap.feed.is_empty());
        assert_eq!(h.photos.query_count(), 0);
        assert_eq!(h.profiles.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_activation_resolves_identity_once_and_refreshes_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.identity.sign_in("uid-1");
        h.profiles.insert(UserProfile::new("uid-1", "chef"));
        h.photos.insert(photo("1", "chef"));
        h.photos.insert(photo("2", "someone-else"));

        h.orchestrator.activate().await;
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname.as_deref(), Some("chef"));
        assert_eq!(snap.feed.len(), 1);
        assert_eq!(h.photos.query_count(), 1);

        // Regaining focus after another screen added a photo
        h.photos.insert(photo("3", "chef"));
        h.orchestrator.activate().await;
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.feed.len(), 2);
        assert_eq!(h.photos.query_count(), 2);
        assert_eq!(h.profiles.lookup_count(), 1, "identity resolves only once");
    }

    #[tokio::test]
    async fn test_missing_profile_never_queries_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.identity.sign_in("uid-without-profile");

        h.orchestrator.activate().await;

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname.as_deref(), Some("anonymous"));
        assert!(snap.feed.is_empty());
        assert_eq!(h.photos.query_count(), 0);
    }

    #[tokio::test]
    async fn test_feed_failure_keeps_previous_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.identity.sign_in("uid-1");
        h.profiles.insert(UserProfile::new("uid-1", "chef"));
        h.photos.insert(photo("1", "chef"));

        h.orchestrator.activate().await;
        h.photos.fail_with(PipelineError::unavailable("photo store", "down"));

        let outcome = h.orchestrator.refresh_feed(FeedTrigger::Activated).await;
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(h.orchestrator.snapshot().await.feed.len(), 1);
    }

    #[tokio::test]
    async fn test_identity_does_not_gate_analysis() {
        let h = build_harness(
            ScriptedVision::default().respond("a", 0, Ok(fridge_labels())),
            ScriptedCatalog::default(),
        );
        h.identity.sign_in("uid-1");
        h.profiles.insert(UserProfile::new("uid-1", "chef"));

        // Analysis completes without any activation
        h.orchestrator.submit_image(image("a")).await;
        let snap = h.orchestrator.snapshot().await;
        assert!(matches!(snap.analysis, AnalysisState::Analyzed { .. }));
        assert_eq!(
            snap.ingredient_message().as_deref(),
            Some("anonymous selected garlic!")
        );

        // Both branches can run side by side
        let (_, outcome) = tokio::join!(
            h.orchestrator.activate(),
            h.orchestrator.submit_image(image("b"))
        );
        assert_eq!(outcome, Outcome::Applied);
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname.as_deref(), Some("chef"));
    }

    #[tokio::test]
    async fn test_sign_in_after_activation_fills_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.profiles.insert(UserProfile::new("uid-1", "chef"));
        h.photos.insert(photo("1", "chef"));

        h.orchestrator.activate().await;
        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname, None);
        assert!(snap.feed.is_empty());

        h.identity.sign_in("uid-1");
        assert!(h.orchestrator.resolve_identity().await);

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname.as_deref(), Some("chef"));
        assert_eq!(snap.feed.len(), 1);
        assert_eq!(h.photos.query_count(), 1);

        assert!(!h.orchestrator.resolve_identity().await, "unchanged nickname");
        assert_eq!(h.photos.query_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_feed() {
        let h = build_harness(ScriptedVision::default(), ScriptedCatalog::default());
        h.identity.sign_in("uid-1");
        h.profiles.insert(UserProfile::new("uid-1", "chef"));
        h.photos.insert(photo("1", "chef"));

        h.orchestrator.activate().await;
        assert_eq!(h.orchestrator.snapshot().await.feed.len(), 1);

        h.identity.sign_out();
        assert!(h.orchestrator.resolve_identity().await);

        let snap = h.orchestrator.snapshot().await;
        assert_eq!(snap.nickname, None);
        assert!(snap.feed.is_empty());
        assert_eq!(h.photos.query_count(), 1);
    }
}
