//! Discourse placement features, including the cluster-dependent family.

use super::{indicator, FeatureContext, FeatureGenerator};
use crate::cluster::Partition;
use crate::mention::EventMention;

const FEATURE_NAMES: &[&str] = &[
    "in_title_first",
    "in_title_second",
    "earliest_in_cluster_first",
    "earliest_in_cluster_second",
];

/// Title placement and earliest-in-cluster markers.
///
/// The title indicators are emitted every round. The earliest-in-cluster
/// indicators need cluster assignments and are therefore absent in round one;
/// after a refresh they report whether each mention is the earliest in-scope
/// member of its current cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscourseFeatures;

impl DiscourseFeatures {
    /// Create the generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_earliest_in_cluster(partition: &Partition, mention: &EventMention) -> bool {
    partition
        .cluster_of(mention.id)
        .is_some_and(|cluster| cluster.earliest_in_scope == Some(mention.id))
}

impl FeatureGenerator for DiscourseFeatures {
    fn name(&self) -> &'static str {
        "discourse"
    }

    fn feature_names(&self) -> &'static [&'static str] {
        FEATURE_NAMES
    }

    fn cluster_dependent(&self) -> bool {
        true
    }

    fn create_features(
        &self,
        a: &EventMention,
        b: &EventMention,
        ctx: &FeatureContext<'_>,
    ) -> Vec<(&'static str, f64)> {
        let mut features = vec![
            ("in_title_first", indicator(a.in_title)),
            ("in_title_second", indicator(b.in_title)),
        ];

        if let Some(partition) = ctx.clusters {
            features.push((
                "earliest_in_cluster_first",
                indicator(is_earliest_in_cluster(partition, a)),
            ));
            features.push((
                "earliest_in_cluster_second",
                indicator(is_earliest_in_cluster(partition, b)),
            ));
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::MentionIndex;
    use crate::similarity::SimilarityCache;

    fn fixture() -> Vec<EventMention> {
        vec![
            EventMention::new(0, "bombing", 0, 7, 0).with_in_title(true),
            EventMention::new(1, "attack", 20, 26, 1),
            EventMention::new(2, "explosion", 40, 49, 2),
        ]
    }

    #[test]
    fn test_round_one_emits_title_features_only() {
        let mentions = fixture();
        let index = MentionIndex::build(&mentions).unwrap();
        let cache = SimilarityCache::new();
        let ctx = FeatureContext { index: &index, clusters: None, cache: &cache };

        let features = DiscourseFeatures::new().create_features(&mentions[0], &mentions[1], &ctx);
        let names: Vec<&str> = features.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["in_title_first", "in_title_second"]);
        assert_eq!(features[0].1, 1.0);
        assert_eq!(features[1].1, 0.0);
    }

    #[test]
    fn test_cluster_round_emits_earliest_markers() {
        let mentions = fixture();
        let index = MentionIndex::build(&mentions).unwrap();
        let cache = SimilarityCache::new();
        let partition = Partition::from_clusters(vec![vec![0, 1], vec![2]]);
        let ctx = FeatureContext { index: &index, clusters: Some(&partition), cache: &cache };

        let generator = DiscourseFeatures::new();
        let features = generator.create_features(&mentions[0], &mentions[1], &ctx);
        let get = |name: &str| features.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);

        // Mention 0 is the earliest member of {0, 1}; mention 1 is not.
        assert_eq!(get("earliest_in_cluster_first"), Some(1.0));
        assert_eq!(get("earliest_in_cluster_second"), Some(0.0));

        let features = generator.create_features(&mentions[1], &mentions[2], &ctx);
        let get = |name: &str| features.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
        assert_eq!(get("earliest_in_cluster_second"), Some(1.0));
    }
}
