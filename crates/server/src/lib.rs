//! Server crate for the ingredient recipe recommender.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipeline, the session state it publishes, and the
//! environment-driven configuration used to wire it up.

pub mod config;
pub mod orchestrator;
pub mod state;

pub use config::PipelineConfig;
pub use orchestrator::{Collaborators, Outcome, RecommendationOrchestrator};
pub use state::{
    ANALYSIS_ERROR_MESSAGE, AnalysisState, DetailState, RECIPE_NOT_FOUND_MESSAGE,
    RECIPE_UNAVAILABLE_MESSAGE, SessionSnapshot,
};
