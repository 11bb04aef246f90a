//! Lexical agreement features.

use super::{indicator, FeatureContext, FeatureGenerator};
use crate::mention::EventMention;

const FEATURE_NAMES: &[&str] = &[
    "trigger_exact_match",
    "trigger_lower_match",
    "head_lemma_match",
    "event_type_match",
];

/// String-level agreement between the two triggers and their annotations.
///
/// The head lemma and event type comparisons apply only when both mentions
/// carry the annotation; otherwise the feature is omitted and the classifier
/// falls back to its missing-value sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalFeatures;

impl LexicalFeatures {
    /// Create the generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeatureGenerator for LexicalFeatures {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn feature_names(&self) -> &'static [&'static str] {
        FEATURE_NAMES
    }

    fn create_features(
        &self,
        a: &EventMention,
        b: &EventMention,
        _ctx: &FeatureContext<'_>,
    ) -> Vec<(&'static str, f64)> {
        let mut features = vec![
            ("trigger_exact_match", indicator(a.trigger == b.trigger)),
            (
                "trigger_lower_match",
                indicator(a.trigger.to_lowercase() == b.trigger.to_lowercase()),
            ),
        ];

        if let (Some(lemma_a), Some(lemma_b)) = (&a.head_lemma, &b.head_lemma) {
            features.push(("head_lemma_match", indicator(lemma_a == lemma_b)));
        }
        if let (Some(type_a), Some(type_b)) = (&a.event_type, &b.event_type) {
            features.push(("event_type_match", indicator(type_a == type_b)));
        }

        features
    }
}
