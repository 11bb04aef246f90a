//! # evoref
//!
//! Event coreference resolution for Rust.
//!
//! Groups event mentions that refer to the same real-world occurrence by
//! scoring mention pairs with a pluggable classifier and greedily merging
//! the most confident pairs, over a bounded number of refinement rounds.
//!
//! - **Resolution**: named numeric pair features, pairwise classification,
//!   best-first consolidation, iterative refinement
//! - **Classifiers**: any [`PairwiseClassifier`]; [`LogisticModel`] loads
//!   trained weights from JSON
//! - **Features**: distance, discourse, lexical, and head-similarity
//!   generators, plus the [`features::FeatureGenerator`] trait for your own
//! - **Evaluation**: MUC, B³, and CoNLL-style scoring of partitions
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use evoref::{EventMention, LogisticModel, ResolverConfig, ResolverEngine};
//!
//! let mentions = vec![
//!     EventMention::new(0, "bombing", 12, 19, 0).with_head_word("bombing"),
//!     EventMention::new(1, "talks", 40, 45, 1).with_head_word("talks"),
//!     EventMention::new(2, "bombing", 60, 67, 2).with_head_word("bombing"),
//! ];
//!
//! let mut weights = HashMap::new();
//! weights.insert("head_similarity".to_string(), 8.0);
//! let model = LogisticModel::new(weights, -4.0, 0.0);
//!
//! let engine = ResolverEngine::new(ResolverConfig::default(), Box::new(model))?;
//! let partition = engine.resolve(&mentions)?;
//!
//! // The two bombing mentions corefer; the talks stay alone.
//! assert_eq!(partition.len(), 2);
//! assert_eq!(partition.non_singletons().count(), 1);
//! # Ok::<(), evoref::Error>(())
//! ```
//!
//! ## Resolution Pipeline
//!
//! | Stage | What happens |
//! |-------|--------------|
//! | Featurize | One named feature vector per in-scope mention pair |
//! | Classify | Classifier maps each vector to a merge probability |
//! | Consolidate | Best-first greedy merge of pairs above the threshold |
//! | Refresh | Cluster-dependent features recomputed between rounds |
//! | Close | Transitive closure yields the final partition |
//!
//! Rounds 2..n repeat classify and consolidate from scratch on the
//! refreshed vectors; [`ResolverConfig::max_iterations`] bounds the loop.
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! evoref = "0.2"                                          # std locking, serial
//! evoref = { version = "0.2", features = ["fast-lock"] }  # parking_lot cache lock
//! evoref = { version = "0.2", features = ["parallel"] }   # rayon featurization
//! ```
//!
//! ## Design Notes
//!
//! - **Deterministic**: identical inputs produce identical partitions;
//!   ties are broken by document order, then pair key
//! - **Trait-based**: classifiers and feature generators are object-safe
//!   traits, so models and features swap without touching the engine
//! - **Isolated failures**: a malformed document rejects that document,
//!   never the batch
//! - **No training here**: classifiers arrive pre-trained; [`LogisticModel`]
//!   deserializes weights produced elsewhere

#![warn(missing_docs)]

mod batch;
mod classifier;
mod cluster;
mod config;
mod engine;
mod error;
mod mention;
mod similarity;
mod vector;

pub mod eval;
pub mod features;
pub mod sync;

// Re-exports
pub use batch::{resolve_corpus, BatchFailure, BatchOptions, BatchOutcome, Document};
pub use classifier::{LogisticModel, PairwiseClassifier, PairwiseDecision};
pub use cluster::{Cluster, ClusterId, Partition};
pub use config::{ClusterMethod, ResolverConfig};
pub use engine::ResolverEngine;
pub use error::{Error, Result};
pub use mention::{EventMention, EventModality, MentionId, MentionIndex, MentionRow};
pub use similarity::{
    bigram_jaccard, head_word_similarity, CacheStats, SimilarityCache, SimilarityFn,
};
pub use vector::{PairFeatureVector, PairKey, VectorStore};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use std::collections::HashMap;
    //! use evoref::prelude::*;
    //!
    //! let model = LogisticModel::new(HashMap::new(), 0.0, 0.0);
    //! let engine = ResolverEngine::new(ResolverConfig::default(), Box::new(model)).unwrap();
    //! let partition = engine.resolve(&[]).unwrap();
    //! assert!(partition.is_empty());
    //! ```
    pub use crate::classifier::{LogisticModel, PairwiseClassifier, PairwiseDecision};
    pub use crate::cluster::{Cluster, ClusterId, Partition};
    pub use crate::config::{ClusterMethod, ResolverConfig};
    pub use crate::engine::ResolverEngine;
    pub use crate::error::{Error, Result};
    pub use crate::features::{default_generators, FeatureContext, FeatureGenerator};
    pub use crate::mention::{EventMention, EventModality, MentionId, MentionIndex};
    pub use crate::{resolve_corpus, BatchOptions, BatchOutcome, Document};
}
