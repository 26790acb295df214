//! # Domain Crate
//!
//! Shared vocabulary for the ingredient-to-recipe pipeline.
//!
//! ## Main Components
//!
//! - **types**: Labels, ingredients, recipes, profiles and photo records
//! - **error**: The `PipelineError` taxonomy every client maps into
//!
//! ## Example Usage
//!
//! ```ignore
//! use domain::{Ingredient, Label};
//!
//! let label = Label::new("Garlic", 0.95);
//! let ingredient = Ingredient::from_label_name(&label.name);
//! assert_eq!(ingredient.as_str(), "garlic");
//! ```

// Public modules
pub mod error;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{PipelineError, Result};
pub use types::{
    // Type aliases
    RecipeId,
    Uid,
    // Sentinels
    ANONYMOUS_NICKNAME,
    UNIDENTIFIED_INGREDIENT,
    // Core types
    ImageRef,
    Ingredient,
    IngredientPhotoRecord,
    Label,
    RecipeDetail,
    RecipeSummary,
    UserProfile,
};
