//! Positional distance features.

use super::{indicator, FeatureContext, FeatureGenerator};
use crate::mention::EventMention;

const FEATURE_NAMES: &[&str] = &["mention_distance", "sentence_distance", "same_sentence"];

/// Distances between the two mentions of a pair.
///
/// `mention_distance` is the gap in row positions (how many mentions apart),
/// `sentence_distance` the gap in sentence indices, and `same_sentence` an
/// indicator for both mentions sharing a sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceFeatures;

impl DistanceFeatures {
    /// Create the generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeatureGenerator for DistanceFeatures {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn feature_names(&self) -> &'static [&'static str] {
        FEATURE_NAMES
    }

    fn create_features(
        &self,
        a: &EventMention,
        b: &EventMention,
        ctx: &FeatureContext<'_>,
    ) -> Vec<(&'static str, f64)> {
        let mut features = Vec::with_capacity(FEATURE_NAMES.len());

        if let (Some(row_a), Some(row_b)) = (ctx.index.row_of(a.id), ctx.index.row_of(b.id)) {
            features.push(("mention_distance", row_a.row.abs_diff(row_b.row) as f64));
        }
        features.push(("sentence_distance", a.sentence.abs_diff(b.sentence) as f64));
        features.push(("same_sentence", indicator(a.sentence == b.sentence)));

        features
    }
}
