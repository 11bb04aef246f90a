//! The resolver engine: featurize, classify, consolidate, repeat.
//!
//! One [`ResolverEngine::resolve`] call processes one document. The engine
//! runs exactly [`ResolverConfig::max_iterations`] classify/consolidate
//! rounds; between rounds, when feature refresh is enabled, the previous
//! round's clusters feed the cluster-dependent generators. Termination is
//! always by iteration count. After the last round the transitivity closer
//! re-derives the partition from the accepted edges, so the output is a
//! valid equivalence relation.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use evoref::{EventMention, LogisticModel, ResolverConfig, ResolverEngine};
//!
//! let mentions = vec![
//!     EventMention::new(0, "attacked", 12, 20, 0).with_head_word("attack"),
//!     EventMention::new(1, "bombing", 40, 47, 1).with_head_word("bombing"),
//!     EventMention::new(2, "attack", 60, 66, 2).with_head_word("attack"),
//! ];
//!
//! let mut weights = HashMap::new();
//! weights.insert("head_similarity".to_string(), 8.0);
//! let model = LogisticModel::new(weights, -4.0, 0.0);
//!
//! let engine = ResolverEngine::new(ResolverConfig::default(), Box::new(model))?;
//! let partition = engine.resolve(&mentions)?;
//!
//! assert_eq!(partition.cluster_of(0).unwrap().members, vec![0, 2]);
//! assert!(partition.cluster_of(1).unwrap().is_singleton());
//! # Ok::<(), evoref::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::classifier::{PairwiseClassifier, PairwiseDecision};
use crate::cluster::{close_transitive, consolidate, Consolidation, Partition};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::features::{default_generators, FeatureContext, FeatureGenerator};
use crate::mention::{EventMention, MentionIndex};
use crate::similarity::SimilarityCache;
use crate::vector::{PairFeatureVector, VectorStore};

/// Per-document coreference resolver.
///
/// Holds the classifier, the registered feature generators, and the
/// similarity cache. The engine itself is stateless across documents, so one
/// instance can resolve a whole corpus; the cache then memoizes head-word
/// similarity across documents.
pub struct ResolverEngine {
    config: ResolverConfig,
    model: Box<dyn PairwiseClassifier>,
    generators: Vec<Box<dyn FeatureGenerator>>,
    cache: Arc<SimilarityCache>,
}

impl fmt::Debug for ResolverEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverEngine").finish_non_exhaustive()
    }
}

impl ResolverEngine {
    /// Create an engine with the default feature generators and a fresh
    /// similarity cache.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] when the configuration fails
    /// validation. Invalid values are never clamped.
    pub fn new(config: ResolverConfig, model: Box<dyn PairwiseClassifier>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model,
            generators: default_generators(),
            cache: Arc::new(SimilarityCache::new()),
        })
    }

    /// Replace the registered feature generators.
    ///
    /// Generators run in the given order for every candidate pair and must
    /// own disjoint feature name sets.
    #[must_use]
    pub fn with_generators(mut self, generators: Vec<Box<dyn FeatureGenerator>>) -> Self {
        self.generators = generators;
        self
    }

    /// Use a shared similarity cache instead of the engine's own.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SimilarityCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The similarity cache in use.
    #[must_use]
    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    /// Resolve one document's mentions into coreference clusters.
    ///
    /// The output partition covers every mention, singletons included, with
    /// clusters ordered by their first member's document order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] when the mention list has
    /// duplicate ids, duplicate order indices, or order indices that are not
    /// monotonic with document position.
    pub fn resolve(&self, mentions: &[EventMention]) -> Result<Partition> {
        let index = MentionIndex::build(mentions)?;
        debug!(
            "resolving document with {} mentions ({} in scope)",
            index.len(),
            index.count_in_scope()
        );

        // Fewer than two in-scope mentions means no candidate pairs; skip
        // featurization and classification entirely.
        if index.count_in_scope() < 2 {
            return Ok(Partition::identity(&index));
        }

        let mut store = VectorStore::new(&index);
        let ctx = FeatureContext {
            index: &index,
            clusters: None,
            cache: self.cache.as_ref(),
        };
        store.featurize(&self.generators, &ctx);

        let mut consolidation = self.run_round(1, &index, &store);
        for round in 2..=self.config.max_iterations {
            if self.config.update_features {
                let ctx = FeatureContext {
                    index: &index,
                    clusters: Some(&consolidation.partition),
                    cache: self.cache.as_ref(),
                };
                store.refresh(&self.generators, &ctx);
            }
            consolidation = self.run_round(round, &index, &store);
        }

        Ok(close_transitive(&index, &consolidation.accepted))
    }

    fn run_round(&self, round: usize, index: &MentionIndex, store: &VectorStore) -> Consolidation {
        let decisions = self.classify(store);
        debug!(
            "round {}/{}: {} pairs classified, {} predicted coreferent",
            round,
            self.config.max_iterations,
            decisions.len(),
            decisions.iter().filter(|d| d.predicted).count()
        );
        consolidate(index, &decisions, &self.config)
    }

    /// Score every candidate pair. Decisions are fully recomputed each
    /// round; a pair with no stored vector is scored on an empty one
    /// (bias-only behavior).
    fn classify(&self, store: &VectorStore) -> Vec<PairwiseDecision> {
        let threshold = self.config.unification_confidence_threshold;
        let empty = PairFeatureVector::new();
        store
            .pairs()
            .iter()
            .map(|&pair| {
                let vector = store.vector_for(&pair).unwrap_or(&empty);
                let probability = self.model.score(vector);
                PairwiseDecision::new(pair, probability, probability >= threshold)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::features::DiscourseFeatures;
    use crate::mention::EventModality;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits a per-pair code so a table-driven classifier can assign
    /// probabilities to specific pairs.
    struct PairCode;

    impl FeatureGenerator for PairCode {
        fn name(&self) -> &'static str {
            "pair-code"
        }

        fn feature_names(&self) -> &'static [&'static str] {
            &["pair_code"]
        }

        fn create_features(
            &self,
            a: &EventMention,
            b: &EventMention,
            _ctx: &FeatureContext<'_>,
        ) -> Vec<(&'static str, f64)> {
            vec![("pair_code", (a.id * 100 + b.id) as f64)]
        }
    }

    /// Looks pair probabilities up in a fixed table, counting calls.
    /// Switches to a second table once cluster-dependent features appear.
    struct TableClassifier {
        round_one: HashMap<u64, f64>,
        with_clusters: HashMap<u64, f64>,
        calls: Arc<AtomicUsize>,
    }

    impl TableClassifier {
        fn new(round_one: HashMap<u64, f64>) -> Self {
            Self {
                with_clusters: round_one.clone(),
                round_one,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_cluster_table(mut self, with_clusters: HashMap<u64, f64>) -> Self {
            self.with_clusters = with_clusters;
            self
        }

        fn with_call_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
            self.calls = calls;
            self
        }
    }

    impl PairwiseClassifier for TableClassifier {
        fn score(&self, vector: &PairFeatureVector) -> f64 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let table = if vector.get("earliest_in_cluster_first").is_some() {
                &self.with_clusters
            } else {
                &self.round_one
            };
            vector
                .get("pair_code")
                .and_then(|code| table.get(&(code as u64)).copied())
                .unwrap_or(0.0)
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    fn table(entries: &[(u64, u64, f64)]) -> HashMap<u64, f64> {
        entries.iter().map(|&(a, b, p)| (a * 100 + b, p)).collect()
    }

    fn mentions(n: u64) -> Vec<EventMention> {
        (0..n)
            .map(|i| {
                EventMention::new(i, format!("trigger{i}"), i as usize * 10, i as usize * 10 + 5, i)
            })
            .collect()
    }

    fn engine_with_tables(
        config: ResolverConfig,
        round_one: HashMap<u64, f64>,
        with_clusters: Option<HashMap<u64, f64>>,
    ) -> ResolverEngine {
        let mut model = TableClassifier::new(round_one);
        if let Some(with_clusters) = with_clusters {
            model = model.with_cluster_table(with_clusters);
        }
        let generators: Vec<Box<dyn FeatureGenerator>> =
            vec![Box::new(PairCode), Box::new(DiscourseFeatures::new())];
        ResolverEngine::new(config, Box::new(model))
            .unwrap()
            .with_generators(generators)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ResolverConfig::default().with_threshold(1.5);
        let model = TableClassifier::new(HashMap::new());
        let err = ResolverEngine::new(config, Box::new(model)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_greedy_chain_resolves_to_single_cluster() {
        let round_one = table(&[(0, 1, 0.9), (1, 2, 0.8), (0, 2, 0.3), (2, 3, 0.95)]);
        let engine = engine_with_tables(ResolverConfig::default(), round_one, None);

        let partition = engine.resolve(&mentions(4)).unwrap();
        assert_eq!(partition.len(), 1);
        assert_eq!(partition.clusters()[0].members, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_single_mention_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = TableClassifier::new(HashMap::new()).with_call_counter(calls.clone());
        let engine = ResolverEngine::new(ResolverConfig::default(), Box::new(model)).unwrap();

        let partition = engine.resolve(&mentions(1)).unwrap();
        assert_eq!(partition.len(), 1);
        assert!(partition.clusters()[0].is_singleton());

        // No pairs, so no classifier or cache activity at all.
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        let stats = engine.cache().stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[test]
    fn test_empty_document_resolves_to_empty_partition() {
        let engine = engine_with_tables(ResolverConfig::default(), HashMap::new(), None);
        let partition = engine.resolve(&[]).unwrap();
        assert!(partition.is_empty());
    }

    #[test]
    fn test_out_of_scope_mentions_never_pair() {
        let round_one = table(&[(0, 2, 0.9)]);
        let engine = engine_with_tables(ResolverConfig::default(), round_one, None);

        let mut all = mentions(3);
        all[1].modality = EventModality::Epistemic;
        let partition = engine.resolve(&all).unwrap();

        assert_eq!(partition.len(), 2);
        assert_eq!(partition.cluster_of(0).unwrap().members, vec![0, 2]);
        assert!(partition.cluster_of(1).unwrap().is_singleton());
    }

    #[test]
    fn test_unification_disabled_yields_identity() {
        let round_one = table(&[(0, 1, 0.99), (1, 2, 0.99)]);
        let config = ResolverConfig::default().with_unification(false);
        let engine = engine_with_tables(config, round_one, None);

        let partition = engine.resolve(&mentions(3)).unwrap();
        assert_eq!(partition.len(), 3);
        assert!(partition.iter().all(|cluster| cluster.is_singleton()));
    }

    #[test]
    fn test_iteration_bound_is_exact() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = TableClassifier::new(table(&[(0, 1, 0.9)])).with_call_counter(calls.clone());
        let generators: Vec<Box<dyn FeatureGenerator>> =
            vec![Box::new(PairCode), Box::new(DiscourseFeatures::new())];
        let config = ResolverConfig::default().with_max_iterations(3);
        let engine = ResolverEngine::new(config, Box::new(model))
            .unwrap()
            .with_generators(generators);

        engine.resolve(&mentions(4)).unwrap();

        // 4 in-scope mentions -> 6 pairs, each classified once per round.
        assert_eq!(calls.load(Ordering::Relaxed), 6 * 3);
    }

    #[test]
    fn test_refresh_enables_second_round_merges() {
        // Round one only links {0,1}. Once clusters exist, the classifier
        // also accepts {1,2}, which the second round consolidates.
        let round_one = table(&[(0, 1, 0.9)]);
        let with_clusters = table(&[(0, 1, 0.9), (1, 2, 0.8)]);
        let engine =
            engine_with_tables(ResolverConfig::default(), round_one, Some(with_clusters));

        let partition = engine.resolve(&mentions(3)).unwrap();
        assert_eq!(partition.len(), 1);
        assert_eq!(partition.clusters()[0].members, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_features_disabled_keeps_round_one_vectors() {
        let round_one = table(&[(0, 1, 0.9)]);
        let with_clusters = table(&[(0, 1, 0.9), (1, 2, 0.8)]);
        let config = ResolverConfig::default().with_update_features(false);
        let engine = engine_with_tables(config, round_one, Some(with_clusters));

        let partition = engine.resolve(&mentions(3)).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.cluster_of(0).unwrap().members, vec![0, 1]);
    }

    #[test]
    fn test_no_refresh_with_single_iteration() {
        let round_one = table(&[(0, 1, 0.9)]);
        let with_clusters = table(&[(0, 1, 0.9), (1, 2, 0.8)]);
        let config = ResolverConfig::default().with_max_iterations(1);
        let engine = engine_with_tables(config, round_one, Some(with_clusters));

        let partition = engine.resolve(&mentions(3)).unwrap();
        assert_eq!(partition.len(), 2);
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let engine = engine_with_tables(ResolverConfig::default(), HashMap::new(), None);
        let mut bad = mentions(2);
        bad[1].order = 0;
        let err = engine.resolve(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
