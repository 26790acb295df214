//! Policy that picks the most confident label.

use crate::traits::SelectionPolicy;
use domain::{Ingredient, Label};

/// Picks the label with the highest confidence.
///
/// Ties keep the earliest label in service order, and NaN confidences never
/// win, so the result stays deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighestConfidencePolicy;

impl SelectionPolicy for HighestConfidencePolicy {
    fn name(&self) -> &str {
        "HighestConfidencePolicy"
    }

    fn select(&self, labels: &[Label]) -> Ingredient {
        let mut best: Option<&Label> = None;
        for label in labels.iter().filter(|l| !l.confidence.is_nan()) {
            match best {
                Some(current) if current.confidence >= label.confidence => {}
                _ => best = Some(label),
            }
        }
        best.map(|label| Ingredient::from_label_name(&label.name))
            .unwrap_or(Ingredient::Unidentified)
    }
}
