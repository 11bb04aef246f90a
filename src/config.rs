//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Merge policy selector for the cluster consolidator.
///
/// Only greedy best-first is implemented; other policies (average-link
/// scoring over cross-cluster edges, constraint-checked unification) are
/// reserved selector values. Unknown selector strings fail at
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ClusterMethod {
    /// Process accepted edges best-first: descending probability, ties by
    /// ascending combined document order.
    #[default]
    GreedyBestFirst,
}

/// Configuration of the resolver engine.
///
/// Validation is fail-fast: [`crate::ResolverEngine::new`] rejects invalid
/// values at construction and never clamps them silently.
///
/// # Example
///
/// ```rust
/// use evoref::ResolverConfig;
///
/// let config = ResolverConfig::default()
///     .with_threshold(0.65)
///     .with_max_iterations(3);
/// assert!(config.validate().is_ok());
///
/// let bad = ResolverConfig::default().with_threshold(1.5);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Acceptance gate for pairwise edges, in [0, 1].
    pub unification_confidence_threshold: f64,
    /// Merge policy used by the consolidator.
    pub cluster_method: ClusterMethod,
    /// When false, consolidation is an identity pass and every mention stays
    /// a singleton. A valid configuration, not a degenerate one.
    pub do_unification: bool,
    /// When true, cluster-dependent features are recomputed between rounds.
    pub update_features: bool,
    /// Number of classify/consolidate rounds. Must be at least 1.
    pub max_iterations: usize,
    /// Diagnostic detail only; has no behavioral effect on resolution.
    pub verbose_level: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            unification_confidence_threshold: 0.5,
            cluster_method: ClusterMethod::default(),
            do_unification: true,
            update_features: true,
            max_iterations: 2,
            verbose_level: 0,
        }
    }
}

impl ResolverConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the edge acceptance threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.unification_confidence_threshold = threshold;
        self
    }

    /// Set the merge policy.
    #[must_use]
    pub fn with_cluster_method(mut self, method: ClusterMethod) -> Self {
        self.cluster_method = method;
        self
    }

    /// Enable or disable consolidation.
    #[must_use]
    pub fn with_unification(mut self, do_unification: bool) -> Self {
        self.do_unification = do_unification;
        self
    }

    /// Enable or disable cross-round feature refresh.
    #[must_use]
    pub fn with_update_features(mut self, update_features: bool) -> Self {
        self.update_features = update_features;
        self
    }

    /// Set the number of rounds.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the diagnostic verbosity.
    #[must_use]
    pub fn with_verbose_level(mut self, verbose_level: u8) -> Self {
        self.verbose_level = verbose_level;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the threshold falls outside
    /// [0, 1] or `max_iterations` is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.unification_confidence_threshold) {
            return Err(Error::configuration(format!(
                "unification confidence threshold must be in [0, 1], got {}",
                self.unification_confidence_threshold
            )));
        }
        if self.max_iterations < 1 {
            return Err(Error::configuration(
                "max iterations must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 2);
        assert!(config.do_unification);
        assert!(config.update_features);
        assert_eq!(config.unification_confidence_threshold, 0.5);
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(ResolverConfig::default().with_threshold(0.0).validate().is_ok());
        assert!(ResolverConfig::default().with_threshold(1.0).validate().is_ok());
        assert!(ResolverConfig::default().with_threshold(-0.01).validate().is_err());
        assert!(ResolverConfig::default().with_threshold(1.01).validate().is_err());
        assert!(ResolverConfig::default().with_threshold(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = ResolverConfig::default()
            .with_max_iterations(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());

        let config: ResolverConfig =
            serde_json::from_str(r#"{"unification_confidence_threshold": 0.7, "do_unification": false}"#)
                .unwrap();
        assert_eq!(config.unification_confidence_threshold, 0.7);
        assert!(!config.do_unification);
        assert_eq!(config.max_iterations, 2);
    }

    #[test]
    fn test_unknown_cluster_method_rejected_at_parse() {
        let parsed: std::result::Result<ClusterMethod, _> =
            serde_json::from_str(r#""sudoku_unification""#);
        assert!(parsed.is_err());

        let parsed: ClusterMethod = serde_json::from_str(r#""greedy_best_first""#).unwrap();
        assert_eq!(parsed, ClusterMethod::GreedyBestFirst);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_validate_matches_bounds(threshold in -2.0f64..3.0, iterations in 0usize..6) {
            let config = ResolverConfig::default()
                .with_threshold(threshold)
                .with_max_iterations(iterations);
            let valid = (0.0..=1.0).contains(&threshold) && iterations >= 1;
            prop_assert_eq!(config.validate().is_ok(), valid);
        }
    }
}
