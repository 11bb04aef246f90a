//! Per-pair feature vectors and the candidate pair store.
//!
//! Candidate pairs are all unordered pairs over the in-scope mention
//! sequence, so the store holds n·(n−1)/2 vectors. That quadratic cost is
//! deliberate; corpus-level callers bound it by capping the in-scope mention
//! count per document (see [`crate::BatchOptions`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::{FeatureContext, FeatureGenerator};
use crate::mention::{EventMention, MentionId, MentionIndex};

/// Canonical unordered pair of mention ids. The smaller id always comes
/// first, so either argument order produces the same key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "(MentionId, MentionId)", into = "(MentionId, MentionId)")]
pub struct PairKey {
    first: MentionId,
    second: MentionId,
}

impl PairKey {
    /// Create a canonical key from two mention ids in any order.
    #[must_use]
    pub fn new(a: MentionId, b: MentionId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The smaller mention id.
    #[must_use]
    pub fn first(&self) -> MentionId {
        self.first
    }

    /// The larger mention id.
    #[must_use]
    pub fn second(&self) -> MentionId {
        self.second
    }

    /// Whether the pair contains the given mention.
    #[must_use]
    pub fn contains(&self, id: MentionId) -> bool {
        self.first == id || self.second == id
    }
}

impl From<(MentionId, MentionId)> for PairKey {
    fn from((a, b): (MentionId, MentionId)) -> Self {
        Self::new(a, b)
    }
}

impl From<PairKey> for (MentionId, MentionId) {
    fn from(key: PairKey) -> Self {
        (key.first, key.second)
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Feature name to score mapping for one candidate pair.
///
/// Names are unique within a vector; inserting an existing name overwrites
/// it (last write wins). Generators are designed to own disjoint name sets,
/// so overwrites only happen when a refresh re-runs a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairFeatureVector {
    features: HashMap<String, f64>,
}

impl PairFeatureVector {
    /// Create an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a feature score, returning the displaced value if the name was
    /// already present.
    pub fn insert(&mut self, name: impl Into<String>, score: f64) -> Option<f64> {
        self.features.insert(name.into(), score)
    }

    /// Score of a feature, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    /// Remove a feature, returning its score if it was present.
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.features.remove(name)
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the vector holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over feature names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Iterate over (name, score) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|(name, &score)| (name.as_str(), score))
    }
}

/// Per-document aggregation of candidate pairs and their feature vectors.
///
/// [`VectorStore::featurize`] runs every registered generator over every
/// pair; [`VectorStore::refresh`] re-runs only cluster-dependent generators
/// and overwrites only the names they own. Between refreshes,
/// [`VectorStore::vector_for`] is idempotent.
#[derive(Debug, Default)]
pub struct VectorStore {
    pairs: Vec<PairKey>,
    positions: Vec<(usize, usize)>,
    vectors: HashMap<PairKey, PairFeatureVector>,
}

impl VectorStore {
    /// Enumerate candidate pairs over the index's in-scope mentions.
    #[must_use]
    pub fn new(index: &MentionIndex) -> Self {
        let scope: Vec<_> = index.in_scope_rows().collect();
        let n = scope.len();
        let capacity = n * n.saturating_sub(1) / 2;

        let mut pairs = Vec::with_capacity(capacity);
        let mut positions = Vec::with_capacity(capacity);
        for i in 0..n {
            for j in (i + 1)..n {
                let row_a = scope[i].row;
                let row_b = scope[j].row;
                pairs.push(PairKey::new(
                    index.mention_at(row_a).id,
                    index.mention_at(row_b).id,
                ));
                positions.push((row_a, row_b));
            }
        }

        Self { pairs, positions, vectors: HashMap::with_capacity(capacity) }
    }

    /// The candidate pairs, ordered by the earlier mention's row then the
    /// later mention's row.
    #[must_use]
    pub fn pairs(&self) -> &[PairKey] {
        &self.pairs
    }

    /// Number of candidate pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the document has no candidate pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Feature vector for a pair, if it was featurized.
    #[must_use]
    pub fn vector_for(&self, pair: &PairKey) -> Option<&PairFeatureVector> {
        self.vectors.get(pair)
    }

    /// Run every generator over every candidate pair and store the merged
    /// vectors. Generators run in registration order per pair.
    #[cfg(feature = "parallel")]
    pub fn featurize(
        &mut self,
        generators: &[Box<dyn FeatureGenerator>],
        ctx: &FeatureContext<'_>,
    ) {
        use rayon::prelude::*;

        let computed: Vec<(PairKey, PairFeatureVector)> = self
            .positions
            .par_iter()
            .zip(self.pairs.par_iter())
            .map(|(&(row_a, row_b), &pair)| {
                let a = ctx.index.mention_at(row_a);
                let b = ctx.index.mention_at(row_b);
                (pair, build_vector(a, b, generators, ctx))
            })
            .collect();
        self.vectors.extend(computed);
    }

    /// Run every generator over every candidate pair and store the merged
    /// vectors. Generators run in registration order per pair.
    #[cfg(not(feature = "parallel"))]
    pub fn featurize(
        &mut self,
        generators: &[Box<dyn FeatureGenerator>],
        ctx: &FeatureContext<'_>,
    ) {
        for (&(row_a, row_b), &pair) in self.positions.iter().zip(self.pairs.iter()) {
            let a = ctx.index.mention_at(row_a);
            let b = ctx.index.mention_at(row_b);
            let vector = build_vector(a, b, generators, ctx);
            self.vectors.insert(pair, vector);
        }
    }

    /// Re-run cluster-dependent generators, overwriting only the feature
    /// names they own. Everything else in each vector survives untouched.
    pub fn refresh(
        &mut self,
        generators: &[Box<dyn FeatureGenerator>],
        ctx: &FeatureContext<'_>,
    ) {
        let dependent: Vec<&dyn FeatureGenerator> = generators
            .iter()
            .filter(|g| g.cluster_dependent())
            .map(|g| g.as_ref())
            .collect();
        if dependent.is_empty() {
            return;
        }

        for (&(row_a, row_b), pair) in self.positions.iter().zip(self.pairs.iter()) {
            let Some(vector) = self.vectors.get_mut(pair) else {
                continue;
            };
            let a = ctx.index.mention_at(row_a);
            let b = ctx.index.mention_at(row_b);
            for generator in &dependent {
                for name in generator.feature_names() {
                    vector.remove(name);
                }
                for (name, score) in generator.create_features(a, b, ctx) {
                    vector.insert(name, score);
                }
            }
        }
    }
}

fn build_vector(
    a: &EventMention,
    b: &EventMention,
    generators: &[Box<dyn FeatureGenerator>],
    ctx: &FeatureContext<'_>,
) -> PairFeatureVector {
    let mut vector = PairFeatureVector::new();
    for generator in generators {
        for (name, score) in generator.create_features(a, b, ctx) {
            vector.insert(name, score);
        }
    }
    vector
}
