//! Ingredient selection for the recommendation pipeline.
//!
//! This crate provides:
//! - SelectionPolicy trait and implementations for picking an ingredient
//! - IngredientSelector for running the configured policy
//! - PolicyKind for choosing a policy from configuration
//!
//! ## Architecture
//! Selection sits between label detection and recipe search:
//! 1. The vision service returns labels in its own order
//! 2. The selector picks exactly one ingredient (or the sentinel)
//! 3. Only an identified ingredient is sent to the recipe catalog
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{IngredientSelector, PolicyKind};
//!
//! let selector = IngredientSelector::from_kind(PolicyKind::default());
//! let ingredient = selector.select_ingredient(&labels);
//! ```

pub mod policies;
pub mod selector;
pub mod traits;

// Re-export main types
pub use selector::{IngredientSelector, PolicyKind, UnknownPolicy};
pub use traits::SelectionPolicy;
