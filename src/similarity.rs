//! Symmetric similarity cache and the default head-word similarity.
//!
//! Pairwise lexical similarity is the most expensive signal the feature
//! generators consume, and it is symmetric. [`SimilarityCache`] canonicalizes
//! each word pair (lexicographically smaller word first) so that lookups in
//! either argument order hit the same slot, and memoizes the supplied
//! computation. One cache can be document-scoped or shared across a corpus
//! run; [`SimilarityCache::clear`] resets it between runs that use different
//! scoring functions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sync::{lock, Mutex};

/// Pluggable word-pair similarity computation.
///
/// The default is [`head_word_similarity`]; resource-backed scorers (WordNet,
/// embeddings) plug in through the same shape and may fail, which callers
/// surface as [`crate::Error::SimilarityUnavailable`].
pub type SimilarityFn = Arc<dyn Fn(&str, &str) -> Result<f64> + Send + Sync>;

/// Compute head-word similarity.
///
/// Returns a value in [0.0, 1.0] where:
/// - 1.0 = identical words (after lowercasing)
/// - otherwise the Jaccard coefficient of character bigram sets
///
/// # Examples
///
/// ```
/// use evoref::head_word_similarity;
///
/// assert!((head_word_similarity("Attack", "attack") - 1.0).abs() < 0.001);
/// assert!(head_word_similarity("bombing", "bomb") > 0.3);
/// assert!(head_word_similarity("attack", "merger") < 0.2);
/// ```
#[must_use]
pub fn head_word_similarity(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();

    if a_lower == b_lower {
        return 1.0;
    }

    bigram_jaccard(&a_lower, &b_lower)
}

/// Compute Jaccard similarity on character bigram sets.
///
/// Words shorter than two characters have no bigrams; two such words are
/// similar only if equal.
#[must_use]
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let bigrams_a = bigrams(a);
    let bigrams_b = bigrams(b);

    if bigrams_a.is_empty() && bigrams_b.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }

    let intersection = bigrams_a.intersection(&bigrams_b).count();
    let union = bigrams_a.union(&bigrams_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn bigrams(word: &str) -> HashSet<(char, char)> {
    word.chars().zip(word.chars().skip(1)).collect()
}

/// Hit/miss counters of a [`SimilarityCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to run the computation.
    pub misses: u64,
    /// Entries currently stored.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<(String, String), f64>,
    hits: u64,
    misses: u64,
}

/// Memoization table for symmetric word-pair similarity.
///
/// Thread-safe: the computation runs outside the lock, so concurrent lookups
/// for the same canonical pair may race to compute, but insertion is
/// insert-if-absent and every caller observes the first stored value. Entries
/// are never evicted; corpus-wide callers that need a capacity bound must
/// wrap this type.
///
/// # Example
///
/// ```
/// use evoref::{head_word_similarity, SimilarityCache};
///
/// let cache = SimilarityCache::new();
/// let score = cache
///     .lookup("bombing", "blast", |a, b| Ok(head_word_similarity(a, b)))
///     .unwrap();
/// let again = cache
///     .lookup("blast", "bombing", |a, b| Ok(head_word_similarity(a, b)))
///     .unwrap();
/// assert_eq!(score, again);
/// assert_eq!(cache.stats().misses, 1);
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct SimilarityCache {
    inner: Mutex<CacheInner>,
}

impl SimilarityCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the similarity of a word pair, computing and storing it on a
    /// miss.
    ///
    /// The pair is canonicalized so the lexicographically smaller word comes
    /// first; `compute` receives the words in canonical order. At most one
    /// computation runs per canonical pair per cache lifetime under
    /// single-threaded use.
    ///
    /// # Errors
    ///
    /// Propagates the error of a failed `compute`; nothing is stored in that
    /// case.
    pub fn lookup(
        &self,
        word_a: &str,
        word_b: &str,
        compute: impl FnOnce(&str, &str) -> Result<f64>,
    ) -> Result<f64> {
        let (first, second) = if word_a <= word_b {
            (word_a, word_b)
        } else {
            (word_b, word_a)
        };
        let key = (first.to_owned(), second.to_owned());

        {
            let mut inner = lock(&self.inner);
            if let Some(&score) = inner.map.get(&key) {
                inner.hits += 1;
                return Ok(score);
            }
            inner.misses += 1;
        }

        // Compute outside the lock; a racing thread for the same pair agrees
        // on the value because the computation is pure.
        let computed = compute(first, second)?;

        let mut inner = lock(&self.inner);
        let score = *inner.map.entry(key).or_insert(computed);
        Ok(score)
    }

    /// Current hit/miss counters and entry count.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = lock(&self.inner);
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.map.len(),
        }
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.inner).map.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.inner).map.is_empty()
    }

    /// Drop all entries and reset the counters.
    ///
    /// Call between evaluation runs that use different similarity functions.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        inner.map.clear();
        inner.hits = 0;
        inner.misses = 0;
    }
}
