//! Session state for one recommendation screen.
//!
//! Two independent machines live here:
//! - analysis: `Idle → Analyzing → Analyzed | Failed`
//! - detail:   `Idle → Loading → Loaded | Failed`
//!
//! `SessionSnapshot` is the immutable copy handed to the host for rendering.

use domain::{
    ANONYMOUS_NICKNAME, ImageRef, Ingredient, IngredientPhotoRecord, Label, PipelineError,
    RecipeDetail, RecipeId, RecipeSummary,
};

/// Shown whenever the analysis chain fails
pub const ANALYSIS_ERROR_MESSAGE: &str = "An error occurred while analyzing the image.";

/// Shown when the requested recipe is not in the catalog
pub const RECIPE_NOT_FOUND_MESSAGE: &str = "That recipe could not be found.";

/// Shown when the catalog could not be reached for a detail lookup
pub const RECIPE_UNAVAILABLE_MESSAGE: &str = "Could not load the recipe. Please try again.";

/// Outer state machine: image reference → labels → ingredient → recipes
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Analyzing {
        image: ImageRef,
    },
    Analyzed {
        labels: Vec<Label>,
        ingredient: Ingredient,
        recipes: Vec<RecipeSummary>,
    },
    /// Labels (and the ingredient, if selection ran) are kept for display
    Failed {
        labels: Vec<Label>,
        ingredient: Option<Ingredient>,
        error: PipelineError,
    },
}

impl AnalysisState {
    pub fn labels(&self) -> &[Label] {
        match self {
            Self::Analyzed { labels, .. } | Self::Failed { labels, .. } => labels,
            _ => &[],
        }
    }

    pub fn ingredient(&self) -> Option<&Ingredient> {
        match self {
            Self::Analyzed { ingredient, .. } => Some(ingredient),
            Self::Failed { ingredient, .. } => ingredient.as_ref(),
            _ => None,
        }
    }

    pub fn recipes(&self) -> &[RecipeSummary] {
        match self {
            Self::Analyzed { recipes, .. } => recipes,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Detail sub-machine: at most one selected recipe at a time
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Idle,
    Loading {
        recipe_id: RecipeId,
    },
    Loaded {
        recipe_id: RecipeId,
        detail: RecipeDetail,
    },
    Failed {
        recipe_id: RecipeId,
        error: PipelineError,
    },
}

impl DetailState {
    pub fn detail(&self) -> Option<&RecipeDetail> {
        match self {
            Self::Loaded { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// User-visible message for a failed lookup
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Failed { error, .. } if error.is_not_found() => Some(RECIPE_NOT_FOUND_MESSAGE),
            Self::Failed { .. } => Some(RECIPE_UNAVAILABLE_MESSAGE),
            _ => None,
        }
    }
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub image: Option<ImageRef>,
    pub analysis: AnalysisState,
    pub detail: DetailState,
    /// `None` until identity resolves, and when no principal is signed in
    pub nickname: Option<String>,
    pub feed: Vec<IngredientPhotoRecord>,
}

impl SessionSnapshot {
    /// Nickname for display text; the sentinel when unresolved
    pub fn display_nickname(&self) -> &str {
        self.nickname.as_deref().unwrap_or(ANONYMOUS_NICKNAME)
    }

    /// User-visible analysis error, if the chain failed
    pub fn error_message(&self) -> Option<&'static str> {
        self.analysis.error().map(|_| ANALYSIS_ERROR_MESSAGE)
    }

    /// "<nickname> selected <ingredient>!" once an ingredient is known.
    ///
    /// Nothing is announced when the image produced no labels at all.
    pub fn ingredient_message(&self) -> Option<String> {
        if self.analysis.labels().is_empty() {
            return None;
        }
        self.analysis
            .ingredient()
            .map(|ingredient| format!("{} selected {}!", self.display_nickname(), ingredient))
    }
}

/// Mutable session owned by the orchestrator.
///
/// Each slot carries a generation counter; a result is applied only if the
/// generation it started under is still current.
#[derive(Debug)]
pub(crate) struct Session {
    pub image: Option<ImageRef>,
    pub analysis: AnalysisState,
    pub analysis_generation: u64,
    pub detail: DetailState,
    pub detail_generation: u64,
    pub nickname: Option<String>,
    pub identity_requested: bool,
    pub feed: Vec<IngredientPhotoRecord>,
    pub feed_generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            image: None,
            analysis: AnalysisState::Idle,
            analysis_generation: 0,
            detail: DetailState::Idle,
            detail_generation: 0,
            nickname: None,
            identity_requested: false,
            feed: Vec::new(),
            feed_generation: 0,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            image: self.image.clone(),
            analysis: self.analysis.clone(),
            detail: self.detail.clone(),
            nickname: self.nickname.clone(),
            feed: self.feed.clone(),
        }
    }
}
