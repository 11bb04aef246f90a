//! Memoized surface similarity of head words.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::{FeatureContext, FeatureGenerator};
use crate::mention::EventMention;
use crate::similarity::{head_word_similarity, SimilarityFn};

const FEATURE_NAMES: &[&str] = &["head_similarity"];

/// Similarity of the two head words, looked up through the shared cache.
///
/// Pairs where either mention lacks a head word contribute nothing. A failed
/// similarity computation is caught here and the feature omitted; it never
/// aborts the pair.
pub struct SurfaceSimilarityFeatures {
    similarity: SimilarityFn,
}

impl SurfaceSimilarityFeatures {
    /// Create the generator with the default bigram similarity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            similarity: Arc::new(|a, b| Ok(head_word_similarity(a, b))),
        }
    }

    /// Create the generator with a custom similarity function.
    #[must_use]
    pub fn with_similarity(similarity: SimilarityFn) -> Self {
        Self { similarity }
    }
}

impl Default for SurfaceSimilarityFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SurfaceSimilarityFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceSimilarityFeatures").finish_non_exhaustive()
    }
}

impl FeatureGenerator for SurfaceSimilarityFeatures {
    fn name(&self) -> &'static str {
        "surface-similarity"
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
        let (head_a, head_b) = match (&a.head_word, &b.head_word) {
            (Some(x), Some(y)) => (x.as_str(), y.as_str()),
            _ => return Vec::new(),
        };

        match ctx.cache.lookup(head_a, head_b, |x, y| (self.similarity)(x, y)) {
            Ok(score) => vec![("head_similarity", score)],
            Err(err) => {
                debug!(
                    "head similarity unavailable for mentions {} and {}: {}",
                    a.id, b.id, err
                );
                Vec::new()
            }
        }
    }
}
