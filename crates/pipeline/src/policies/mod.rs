//! Selection policy implementations.
//!
//! Each policy can be plugged into an `IngredientSelector`.

pub mod highest_confidence;
pub mod positional;

// Re-export for convenience
pub use highest_confidence::HighestConfidencePolicy;
pub use positional::{DEFAULT_ORDINAL, PositionalPolicy};
