//! Evaluation metrics for resolved partitions.
//!
//! Scores a predicted [`Partition`] against a gold partition with the two
//! standard coreference metrics plus their average:
//!
//! | Metric | Focus | Key property |
//! |--------|-------|--------------|
//! | MUC | Links | Ignores singletons; counts minimum links |
//! | B³ | Mentions | Per-mention P/R; credits singletons |
//! | CoNLL | Composite | Average of MUC and B³ F1 |
//!
//! Mentions present in only one partition are excluded before scoring.
//!
//! References: MUC is Vilain et al., 1995; B³ is Bagga & Baldwin, 1998.
//!
//! # Example
//!
//! ```rust
//! use evoref::eval::{conll_f1, muc};
//! use evoref::Partition;
//!
//! let gold = Partition::from_clusters(vec![vec![0, 1, 2], vec![3]]);
//! let pred = Partition::from_clusters(vec![vec![0, 1], vec![2], vec![3]]);
//!
//! let scores = muc(&pred, &gold);
//! assert!((scores.precision - 1.0).abs() < 1e-9);
//! assert!((scores.recall - 0.5).abs() < 1e-9);
//! assert!(conll_f1(&pred, &gold) < 1.0);
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::cluster::{ClusterId, Partition};
use crate::mention::MentionId;

/// Precision, recall, and F1 for one metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorefScores {
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
}

impl CorefScores {
    /// Build scores from precision and recall; F1 is derived.
    #[must_use]
    pub fn new(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self { precision, recall, f1 }
    }
}

impl fmt::Display for CorefScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P={:.1}%  R={:.1}%  F1={:.1}%",
            self.precision * 100.0,
            self.recall * 100.0,
            self.f1 * 100.0
        )
    }
}

/// MUC and B³ scores for one predicted/gold pair, with their average.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionEvaluation {
    /// MUC link-based scores.
    pub muc: CorefScores,
    /// B³ mention-based scores.
    pub b_cubed: CorefScores,
    /// Average of the MUC and B³ F1 scores.
    pub conll_f1: f64,
}

impl PartitionEvaluation {
    /// Compute all metrics for `predicted` against `gold`.
    #[must_use]
    pub fn compute(predicted: &Partition, gold: &Partition) -> Self {
        let muc = muc(predicted, gold);
        let b_cubed = b_cubed(predicted, gold);
        Self { muc, b_cubed, conll_f1: (muc.f1 + b_cubed.f1) / 2.0 }
    }
}

impl fmt::Display for PartitionEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partition evaluation:")?;
        writeln!(f, "  MUC:    {}", self.muc)?;
        writeln!(f, "  B³:     {}", self.b_cubed)?;
        writeln!(f, "  CoNLL:  F1={:.1}%", self.conll_f1 * 100.0)
    }
}

/// Mentions covered by both partitions; only these are scored.
fn common_mentions(predicted: &Partition, gold: &Partition) -> HashSet<MentionId> {
    gold.iter()
        .flat_map(|cluster| cluster.members.iter().copied())
        .filter(|&mention| predicted.cluster_of(mention).is_some())
        .collect()
}

/// One direction of the MUC link count: how far `response` is from
/// reproducing `reference`'s links.
fn muc_direction(
    reference: &Partition,
    response: &Partition,
    common: &HashSet<MentionId>,
) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for cluster in reference.iter() {
        let members: Vec<MentionId> = cluster
            .members
            .iter()
            .copied()
            .filter(|m| common.contains(m))
            .collect();
        if members.len() <= 1 {
            continue;
        }

        let partitions: HashSet<ClusterId> = members
            .iter()
            .filter_map(|&m| response.cluster_of(m).map(|c| c.id))
            .collect();

        numerator += (members.len() - partitions.len().max(1)) as f64;
        denominator += (members.len() - 1) as f64;
    }

    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// MUC link-based metric (Vilain et al., 1995).
///
/// Counts the minimum number of links a response would need to add to match
/// the reference clustering. Singleton clusters contribute nothing.
#[must_use]
pub fn muc(predicted: &Partition, gold: &Partition) -> CorefScores {
    let common = common_mentions(predicted, gold);
    if common.is_empty() {
        return CorefScores::new(0.0, 0.0);
    }

    let recall = muc_direction(gold, predicted, &common);
    let precision = muc_direction(predicted, gold, &common);
    CorefScores::new(precision, recall)
}

/// B³ mention-based metric (Bagga & Baldwin, 1998).
///
/// Per-mention precision and recall from the overlap of the mention's
/// predicted and gold clusters, averaged over all scored mentions. Unlike
/// MUC it credits correctly isolated singletons.
#[must_use]
pub fn b_cubed(predicted: &Partition, gold: &Partition) -> CorefScores {
    let common = common_mentions(predicted, gold);
    if common.is_empty() {
        return CorefScores::new(0.0, 0.0);
    }

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;

    for &mention in &common {
        let (Some(pred_cluster), Some(gold_cluster)) =
            (predicted.cluster_of(mention), gold.cluster_of(mention))
        else {
            continue;
        };

        let overlap = pred_cluster
            .members
            .iter()
            .filter(|&&m| gold_cluster.contains(m))
            .count() as f64;

        precision_sum += overlap / pred_cluster.len() as f64;
        recall_sum += overlap / gold_cluster.len() as f64;
    }

    let n = common.len() as f64;
    CorefScores::new(precision_sum / n, recall_sum / n)
}

/// CoNLL-style composite: the unweighted average of the MUC and B³ F1.
#[must_use]
pub fn conll_f1(predicted: &Partition, gold: &Partition) -> f64 {
    let muc_scores = muc(predicted, gold);
    let b3_scores = b_cubed(predicted, gold);
    (muc_scores.f1 + b3_scores.f1) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_match_scores_one() {
        let gold = Partition::from_clusters(vec![vec![0, 1, 2], vec![3, 4], vec![5]]);
        let pred = Partition::from_clusters(vec![vec![0, 1, 2], vec![3, 4], vec![5]]);

        let muc_scores = muc(&pred, &gold);
        assert!(close(muc_scores.precision, 1.0));
        assert!(close(muc_scores.recall, 1.0));
        assert!(close(muc_scores.f1, 1.0));

        let b3_scores = b_cubed(&pred, &gold);
        assert!(close(b3_scores.f1, 1.0));

        assert!(close(conll_f1(&pred, &gold), 1.0));
    }

    #[test]
    fn test_split_chain_partial_credit() {
        // Gold merges 0..=2; prediction recovers only the 0-1 link.
        let gold = Partition::from_clusters(vec![vec![0, 1, 2], vec![3]]);
        let pred = Partition::from_clusters(vec![vec![0, 1], vec![2], vec![3]]);

        let muc_scores = muc(&pred, &gold);
        assert!(close(muc_scores.precision, 1.0));
        assert!(close(muc_scores.recall, 0.5));
        assert!(close(muc_scores.f1, 2.0 / 3.0));

        let b3_scores = b_cubed(&pred, &gold);
        assert!(close(b3_scores.precision, 1.0));
        assert!(close(b3_scores.recall, 2.0 / 3.0));
        assert!(close(b3_scores.f1, 0.8));

        assert!(close(conll_f1(&pred, &gold), (2.0 / 3.0 + 0.8) / 2.0));
    }

    #[test]
    fn test_muc_ignores_singletons_b_cubed_credits_them() {
        let gold = Partition::from_clusters(vec![vec![0], vec![1], vec![2]]);
        let pred = Partition::from_clusters(vec![vec![0], vec![1], vec![2]]);

        // No links exist on either side.
        let muc_scores = muc(&pred, &gold);
        assert!(close(muc_scores.precision, 0.0));
        assert!(close(muc_scores.recall, 0.0));
        assert!(close(muc_scores.f1, 0.0));

        // Every mention is correctly isolated.
        let b3_scores = b_cubed(&pred, &gold);
        assert!(close(b3_scores.f1, 1.0));
    }

    #[test]
    fn test_over_clustering_hurts_precision() {
        let gold = Partition::from_clusters(vec![vec![0, 1], vec![2, 3]]);
        let pred = Partition::from_clusters(vec![vec![0, 1, 2, 3]]);

        let muc_scores = muc(&pred, &gold);
        // Both gold links recovered; the merged cluster needs 3 links but
        // gold supplies only 2 of them.
        assert!(close(muc_scores.recall, 1.0));
        assert!(close(muc_scores.precision, 2.0 / 3.0));

        let b3_scores = b_cubed(&pred, &gold);
        assert!(close(b3_scores.recall, 1.0));
        assert!(close(b3_scores.precision, 0.5));
    }

    #[test]
    fn test_disjoint_mention_sets_score_zero() {
        let gold = Partition::from_clusters(vec![vec![0, 1]]);
        let pred = Partition::from_clusters(vec![vec![10, 11]]);

        assert!(close(muc(&pred, &gold).f1, 0.0));
        assert!(close(b_cubed(&pred, &gold).f1, 0.0));
        assert!(close(conll_f1(&pred, &gold), 0.0));
    }

    #[test]
    fn test_extra_predicted_mentions_excluded() {
        // Mention 9 exists only in the prediction; scoring ignores it.
        let gold = Partition::from_clusters(vec![vec![0, 1]]);
        let pred = Partition::from_clusters(vec![vec![0, 1], vec![9]]);

        assert!(close(muc(&pred, &gold).f1, 1.0));
        assert!(close(b_cubed(&pred, &gold).f1, 1.0));
    }

    #[test]
    fn test_empty_partitions() {
        let gold = Partition::from_clusters(vec![]);
        let pred = Partition::from_clusters(vec![]);

        let muc_scores = muc(&pred, &gold);
        assert!(close(muc_scores.f1, 0.0));
        assert!(!muc_scores.f1.is_nan());

        let b3_scores = b_cubed(&pred, &gold);
        assert!(!b3_scores.f1.is_nan());
    }

    #[test]
    fn test_f1_is_harmonic_mean() {
        let scores = CorefScores::new(0.5, 1.0);
        assert!(close(scores.f1, 2.0 * 0.5 * 1.0 / 1.5));

        let zero = CorefScores::new(0.0, 0.0);
        assert!(close(zero.f1, 0.0));
    }

    #[test]
    fn test_evaluation_display() {
        let gold = Partition::from_clusters(vec![vec![0, 1, 2], vec![3]]);
        let pred = Partition::from_clusters(vec![vec![0, 1], vec![2], vec![3]]);

        let eval = PartitionEvaluation::compute(&pred, &gold);
        assert!(close(eval.conll_f1, (2.0 / 3.0 + 0.8) / 2.0));

        let display = eval.to_string();
        assert!(display.contains("MUC"));
        assert!(display.contains("B³"));
        assert!(display.contains("CoNLL"));
    }
}
