//! Pairwise coreference classifier boundary.
//!
//! The engine treats the classifier as a pure function from a feature vector
//! to a coreference probability. Models are trained offline; this crate
//! ships [`LogisticModel`], a linear model over named features that loads
//! from a JSON artifact, and the [`PairwiseClassifier`] trait for plugging in
//! other backends.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{PairFeatureVector, PairKey};

/// Binary model scoring a feature vector into a coreference probability.
///
/// Implementations must be pure: the same vector always scores the same,
/// with no I/O inside `score`. A vector with no features still receives a
/// score (the model's bias behavior); unknown feature names are ignored and
/// known names absent from the vector read as the model's missing-value
/// sentinel.
pub trait PairwiseClassifier: Send + Sync {
    /// Coreference probability of the pair described by `vector`, in [0, 1].
    /// 0 means confidently not coreferent, 1 confidently coreferent.
    fn score(&self, vector: &PairFeatureVector) -> f64;

    /// Thresholded prediction.
    fn predict(&self, vector: &PairFeatureVector, threshold: f64) -> bool {
        self.score(vector) >= threshold
    }

    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Logistic regression over named features.
///
/// The score is the sigmoid of `bias + Σ weight · value`, summed over the
/// model's own weight table. Feature names in the vector but not in the
/// table are ignored; names in the table but not in the vector contribute
/// the `missing_value` sentinel. The artifact round-trips through JSON:
///
/// ```json
/// {
///   "weights": { "head_similarity": 3.1, "sentence_distance": -0.4 },
///   "bias": -1.2,
///   "missing_value": 0.0
/// }
/// ```
///
/// # Example
///
/// ```rust
/// use evoref::{LogisticModel, PairFeatureVector, PairwiseClassifier};
/// use std::collections::HashMap;
///
/// let mut weights = HashMap::new();
/// weights.insert("head_similarity".to_string(), 4.0);
/// let model = LogisticModel::new(weights, -2.0, 0.0);
///
/// let mut vector = PairFeatureVector::new();
/// vector.insert("head_similarity", 1.0);
/// assert!(model.score(&vector) > 0.8);
///
/// // Empty vector: bias plus sentinel contributions only.
/// assert!(model.score(&PairFeatureVector::new()) < 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: HashMap<String, f64>,
    bias: f64,
    #[serde(default)]
    missing_value: f64,
}

impl LogisticModel {
    /// Create a model from a weight table, bias, and missing-value sentinel.
    #[must_use]
    pub fn new(weights: HashMap<String, f64>, bias: f64, missing_value: f64) -> Self {
        Self { weights, bias, missing_value }
    }

    /// Load the artifact from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] when the artifact is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::model(format!("malformed classifier artifact: {e}")))
    }

    /// Load the artifact from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] when the artifact is malformed or truncated.
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| Error::model(format!("malformed classifier artifact: {e}")))
    }

    /// Load the artifact from a JSON file.
    ///
    /// Model loading happens once, before documents are processed; the
    /// resolve path itself never touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be opened and
    /// [`Error::Model`] when its contents are malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Serialize the artifact to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] when serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::model(format!("cannot serialize classifier artifact: {e}")))
    }

    /// The weight table.
    #[must_use]
    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    /// The bias term.
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// The sentinel used for known features absent from a vector.
    #[must_use]
    pub fn missing_value(&self) -> f64 {
        self.missing_value
    }
}

impl PairwiseClassifier for LogisticModel {
    fn score(&self, vector: &PairFeatureVector) -> f64 {
        let mut logit = self.bias;
        for (name, weight) in &self.weights {
            let value = vector.get(name).unwrap_or(self.missing_value);
            logit += weight * value;
        }
        sigmoid(logit)
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

/// Saturating sigmoid: NaN input collapses to 0.0 rather than poisoning the
/// edge ordering downstream.
fn sigmoid(logit: f64) -> f64 {
    let p = 1.0 / (1.0 + (-logit).exp());
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Classifier output for one candidate pair.
///
/// Recomputed from scratch every round; the gold label is carried for
/// evaluation harnesses and has no effect on clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseDecision {
    /// The scored pair.
    pub pair: PairKey,
    /// Coreference probability in [0, 1].
    pub probability: f64,
    /// Thresholded prediction.
    pub predicted: bool,
    /// Gold coreference label, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<bool>,
}

impl PairwiseDecision {
    /// Create a decision without a gold label.
    #[must_use]
    pub fn new(pair: PairKey, probability: f64, predicted: bool) -> Self {
        Self { pair, probability, predicted, gold: None }
    }

    /// Attach a gold label.
    #[must_use]
    pub fn with_gold(mut self, gold: bool) -> Self {
        self.gold = Some(gold);
        self
    }

    /// Whether the prediction matches the gold label, when one is present.
    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.gold.map(|gold| gold == self.predicted)
    }
}

impl fmt::Display for PairwiseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pair {}: p={:.3} {}",
            self.pair,
            self.probability,
            if self.predicted { "coref" } else { "not coref" }
        )
    }
}
