//! Corpus-level resolution over many documents.
//!
//! [`resolve_corpus`] runs one [`ResolverEngine`] across a slice of
//! [`Document`]s. Failures are isolated per document: a malformed document is
//! recorded and the batch continues. Documents whose in-scope mention count
//! exceeds the configured cap are skipped outright, since pair counts grow
//! quadratically.
//!
//! A shared [`SimilarityCache`] can be supplied through [`BatchOptions`] so
//! head-word lookups computed for one document are reused by the rest of the
//! corpus.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::classifier::PairwiseClassifier;
use crate::cluster::Partition;
use crate::config::ResolverConfig;
use crate::engine::ResolverEngine;
use crate::error::Result;
use crate::mention::EventMention;
use crate::similarity::SimilarityCache;

/// One document of a corpus: an id and its extracted event mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Corpus-unique document id.
    pub id: String,
    /// Event mentions in document order.
    pub mentions: Vec<EventMention>,
}

impl Document {
    /// Create a document.
    pub fn new(id: impl Into<String>, mentions: Vec<EventMention>) -> Self {
        Self { id: id.into(), mentions }
    }
}

/// Knobs for a corpus run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Skip documents with more in-scope mentions than this. `None` means
    /// no cap.
    pub max_in_scope_mentions: Option<usize>,
    /// Similarity cache shared across all documents in the batch. When
    /// absent the engine builds a private one.
    pub shared_cache: Option<Arc<SimilarityCache>>,
}

impl BatchOptions {
    /// Options with no cap and a private per-batch cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip documents with more than `cap` in-scope mentions.
    #[must_use]
    pub fn with_max_in_scope_mentions(mut self, cap: usize) -> Self {
        self.max_in_scope_mentions = Some(cap);
        self
    }

    /// Share `cache` across every document in the batch.
    #[must_use]
    pub fn with_shared_cache(mut self, cache: Arc<SimilarityCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }
}

/// A document the batch could not resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Id of the failing document.
    pub doc_id: String,
    /// Rendered error.
    pub message: String,
}

/// What a corpus run produced.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Resolved partitions, one per successful document, in input order.
    pub partitions: Vec<(String, Partition)>,
    /// Documents rejected with an error.
    pub failed: Vec<BatchFailure>,
    /// Documents skipped for exceeding the in-scope mention cap.
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    /// Total documents seen by the batch.
    pub fn total(&self) -> usize {
        self.partitions.len() + self.failed.len() + self.skipped.len()
    }

    /// Documents that resolved successfully.
    pub fn processed(&self) -> usize {
        self.partitions.len()
    }

    /// The partition for `doc_id`, if that document resolved.
    pub fn partition_for(&self, doc_id: &str) -> Option<&Partition> {
        self.partitions
            .iter()
            .find(|(id, _)| id == doc_id)
            .map(|(_, partition)| partition)
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resolved {}/{} documents ({} failed, {} skipped)",
            self.processed(),
            self.total(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

/// Resolve every document of a corpus with a single engine.
///
/// Returns `Err` only for a rejected configuration; document-level problems
/// land in [`BatchOutcome::failed`] and the run continues.
///
/// # Example
///
/// ```
/// use evoref::{
///     resolve_corpus, BatchOptions, Document, EventMention, LogisticModel, ResolverConfig,
/// };
///
/// let docs = vec![
///     Document::new(
///         "d1",
///         vec![
///             EventMention::new(0, "attack", 12, 18, 0).with_head_word("attack"),
///             EventMention::new(1, "strike", 40, 46, 1).with_head_word("strike"),
///         ],
///     ),
///     Document::new("d2", vec![]),
/// ];
///
/// let model = LogisticModel::new(std::collections::HashMap::new(), -4.0, 0.0);
/// let outcome = resolve_corpus(
///     &docs,
///     ResolverConfig::default(),
///     Box::new(model),
///     BatchOptions::new(),
/// )?;
///
/// assert_eq!(outcome.processed(), 2);
/// assert!(outcome.failed.is_empty());
/// # Ok::<(), evoref::Error>(())
/// ```
pub fn resolve_corpus(
    documents: &[Document],
    config: ResolverConfig,
    model: Box<dyn PairwiseClassifier>,
    options: BatchOptions,
) -> Result<BatchOutcome> {
    let mut engine = ResolverEngine::new(config, model)?;
    if let Some(cache) = options.shared_cache {
        engine = engine.with_cache(cache);
    }

    let mut outcome = BatchOutcome {
        partitions: Vec::with_capacity(documents.len()),
        failed: Vec::new(),
        skipped: Vec::new(),
    };

    for doc in documents {
        if let Some(cap) = options.max_in_scope_mentions {
            let in_scope = doc.mentions.iter().filter(|m| m.is_in_scope()).count();
            if in_scope > cap {
                warn!(
                    "skipping document {}: {} in-scope mentions exceeds cap {}",
                    doc.id, in_scope, cap
                );
                outcome.skipped.push(doc.id.clone());
                continue;
            }
        }

        match engine.resolve(&doc.mentions) {
            Ok(partition) => outcome.partitions.push((doc.id.clone(), partition)),
            Err(err) => {
                warn!("document {} failed to resolve: {}", doc.id, err);
                outcome
                    .failed
                    .push(BatchFailure { doc_id: doc.id.clone(), message: err.to_string() });
            }
        }
    }

    debug!("{}", outcome);
    Ok(outcome)
}
