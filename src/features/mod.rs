//! Pluggable feature generators for mention pairs.
//!
//! Each generator produces named numeric scores for one candidate pair
//! through a single capability, [`FeatureGenerator::create_features`].
//! Generators are registered in an ordered list and invoked in registration
//! order for every pair; they own disjoint feature name sets and are
//! side-effect-free with respect to each other. A generator that cannot
//! produce a feature for a pair returns a partial or empty contribution, and
//! the classifier fills the gap with its missing-value sentinel.
//!
//! Four families ship by default, registered by [`default_generators`]:
//!
//! - [`DistanceFeatures`]: positional gaps between the pair
//! - [`DiscourseFeatures`]: title placement and, once clusters exist,
//!   earliest-in-cluster markers (the one cluster-dependent family)
//! - [`LexicalFeatures`]: trigger, head lemma, and event type agreement
//! - [`SurfaceSimilarityFeatures`]: memoized head-word similarity
//!
//! # Custom generators
//!
//! ```rust
//! use evoref::features::{FeatureContext, FeatureGenerator};
//! use evoref::EventMention;
//!
//! struct SameTypeOnly;
//!
//! impl FeatureGenerator for SameTypeOnly {
//!     fn name(&self) -> &'static str {
//!         "same-type-only"
//!     }
//!
//!     fn feature_names(&self) -> &'static [&'static str] {
//!         &["strict_type_match"]
//!     }
//!
//!     fn create_features(
//!         &self,
//!         a: &EventMention,
//!         b: &EventMention,
//!         _ctx: &FeatureContext<'_>,
//!     ) -> Vec<(&'static str, f64)> {
//!         match (&a.event_type, &b.event_type) {
//!             (Some(x), Some(y)) if x == y => vec![("strict_type_match", 1.0)],
//!             (Some(_), Some(_)) => vec![("strict_type_match", 0.0)],
//!             _ => Vec::new(),
//!         }
//!     }
//! }
//! ```

mod discourse;
mod distance;
mod lexical;
mod surface;

pub use discourse::DiscourseFeatures;
pub use distance::DistanceFeatures;
pub use lexical::LexicalFeatures;
pub use surface::SurfaceSimilarityFeatures;

use crate::cluster::Partition;
use crate::mention::{EventMention, MentionIndex};
use crate::similarity::SimilarityCache;

/// Read-only document state handed to generators for one featurization pass.
pub struct FeatureContext<'a> {
    /// The document's mention index.
    pub index: &'a MentionIndex,
    /// Cluster assignments from the previous round. `None` in round one,
    /// before any consolidation has run.
    pub clusters: Option<&'a Partition>,
    /// Shared memoization table for word-pair similarity.
    pub cache: &'a SimilarityCache,
}

/// Producer of named numeric features for a mention pair.
///
/// Implementations must not observe each other's output except through
/// registration order, and must never abort a pair: missing inputs mean an
/// omitted feature, not an error.
pub trait FeatureGenerator: Send + Sync {
    /// Short generator name for diagnostics.
    fn name(&self) -> &'static str;

    /// The feature names this generator owns.
    ///
    /// Refresh passes remove exactly these names before re-running the
    /// generator, so the set must cover everything `create_features` can
    /// emit.
    fn feature_names(&self) -> &'static [&'static str];

    /// Whether any owned feature depends on cluster assignments.
    ///
    /// Cluster-dependent generators are re-run between rounds when feature
    /// refresh is enabled; the rest run once per document.
    fn cluster_dependent(&self) -> bool {
        false
    }

    /// Produce features for one pair. `a` precedes `b` in document order.
    fn create_features(
        &self,
        a: &EventMention,
        b: &EventMention,
        ctx: &FeatureContext<'_>,
    ) -> Vec<(&'static str, f64)>;
}

/// The default generator registration, in invocation order.
#[must_use]
pub fn default_generators() -> Vec<Box<dyn FeatureGenerator>> {
    vec![
        Box::new(DistanceFeatures::new()),
        Box::new(DiscourseFeatures::new()),
        Box::new(LexicalFeatures::new()),
        Box::new(SurfaceSimilarityFeatures::new()),
    ]
}

pub(crate) fn indicator(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generators_own_disjoint_names() {
        let generators = default_generators();
        let mut seen = std::collections::HashSet::new();
        for generator in &generators {
            for name in generator.feature_names() {
                assert!(seen.insert(*name), "feature name {name} owned twice");
            }
        }
    }

    #[test]
    fn test_only_discourse_is_cluster_dependent() {
        let generators = default_generators();
        let dependent: Vec<&str> = generators
            .iter()
            .filter(|g| g.cluster_dependent())
            .map(|g| g.name())
            .collect();
        assert_eq!(dependent, vec!["discourse"]);
    }
}
