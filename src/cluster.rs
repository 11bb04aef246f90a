//! Coreference clusters and the consolidation machinery.
//!
//! Consolidation turns scored pairwise edges into a [`Partition`] of the
//! document's mentions. Accepted edges (probability at or above the
//! configured threshold) are processed best-first: descending probability,
//! ties broken by ascending combined document order, then by the ordered
//! pair ids so the ordering is total. Each edge merges the two mentions'
//! clusters through a disjoint-set forest; an edge whose endpoints already
//! share a cluster is skipped as a no-op.
//!
//! After the final round the transitivity closer re-derives the partition
//! from the accepted edges alone, guaranteeing the output is a true
//! equivalence relation even under merge policies that are not inherently
//! transitive.

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::classifier::PairwiseDecision;
use crate::config::{ClusterMethod, ResolverConfig};
use crate::mention::{MentionId, MentionIndex};
use crate::vector::PairKey;

/// Stable identifier of a cluster.
///
/// Ids are minted as the smallest document order index among the members,
/// so when two clusters merge the surviving id is the smaller one, and a
/// cluster that survives an iteration unmerged keeps its id.
pub type ClusterId = u64;

/// A set of mentions believed to refer to the same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Stable cluster id (smallest member document order index).
    pub id: ClusterId,
    /// Member mention ids in document order.
    pub members: Vec<MentionId>,
    /// Earliest in-scope member, used by cluster-dependent features.
    /// `None` when every member is epistemic or reported.
    pub earliest_in_scope: Option<MentionId>,
}

impl Cluster {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members. Clusters produced by this crate
    /// always have at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the cluster holds a single mention.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Whether the given mention belongs to this cluster.
    #[must_use]
    pub fn contains(&self, id: MentionId) -> bool {
        self.members.contains(&id)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster {} {{", self.id)?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "}}")
    }
}

/// A document's mentions partitioned into coreference clusters.
///
/// Clusters are ordered by their first member's document order and cover
/// every mention of the document, singletons included; use
/// [`Partition::non_singletons`] to filter for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Cluster>", into = "Vec<Cluster>")]
pub struct Partition {
    clusters: Vec<Cluster>,
    by_mention: HashMap<MentionId, usize>,
}

impl Partition {
    /// Build a partition from explicit member lists.
    ///
    /// Intended for fixtures and gold annotations where mention ids track
    /// document order: members are sorted ascending, every member is treated
    /// as in scope, and each cluster id is its smallest member id. Empty
    /// member lists are dropped.
    #[must_use]
    pub fn from_clusters(members: Vec<Vec<MentionId>>) -> Self {
        let mut clusters: Vec<Cluster> = members
            .into_iter()
            .filter(|ids| !ids.is_empty())
            .map(|mut ids| {
                ids.sort_unstable();
                Cluster {
                    id: ids[0],
                    earliest_in_scope: Some(ids[0]),
                    members: ids,
                }
            })
            .collect();
        clusters.sort_by_key(|cluster| cluster.id);
        Self::from(clusters)
    }

    /// Every mention of the index as its own singleton cluster.
    pub(crate) fn identity(index: &MentionIndex) -> Self {
        let clusters: Vec<Cluster> = index
            .mentions()
            .iter()
            .map(|mention| Cluster {
                id: mention.order,
                members: vec![mention.id],
                earliest_in_scope: mention.is_in_scope().then_some(mention.id),
            })
            .collect();
        Self::from(clusters)
    }

    /// The clusters, ordered by first-member document order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether the partition holds no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of mentions across all clusters.
    #[must_use]
    pub fn mention_count(&self) -> usize {
        self.by_mention.len()
    }

    /// Iterate over the clusters.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    /// The cluster containing a mention, if the mention is in the partition.
    #[must_use]
    pub fn cluster_of(&self, id: MentionId) -> Option<&Cluster> {
        self.by_mention.get(&id).map(|&i| &self.clusters[i])
    }

    /// Clusters with more than one member.
    pub fn non_singletons(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|cluster| !cluster.is_singleton())
    }
}

impl From<Vec<Cluster>> for Partition {
    fn from(clusters: Vec<Cluster>) -> Self {
        let mut by_mention = HashMap::new();
        for (i, cluster) in clusters.iter().enumerate() {
            for &member in &cluster.members {
                by_mention.insert(member, i);
            }
        }
        Self { clusters, by_mention }
    }
}

impl From<Partition> for Vec<Cluster> {
    fn from(partition: Partition) -> Self {
        partition.clusters
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Disjoint-set forest over row indices with the smaller root surviving.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, mut i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`, keeping the smaller root. Returns
    /// false when they were already in the same set.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        let (survivor, absorbed) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[absorbed] = survivor;
        true
    }
}

/// One consolidation pass: the partition it produced and the edges that
/// passed the confidence gate, in processing order.
pub(crate) struct Consolidation {
    pub(crate) partition: Partition,
    pub(crate) accepted: Vec<PairKey>,
}

struct Edge {
    pair: PairKey,
    rows: (usize, usize),
    combined_order: u64,
    probability: f64,
}

/// Turn scored pairwise decisions into a partition of the index's mentions.
///
/// With `do_unification` disabled this is an identity pass and every mention
/// stays a singleton. Decisions whose mentions do not belong to the index
/// are ignored.
pub(crate) fn consolidate(
    index: &MentionIndex,
    decisions: &[PairwiseDecision],
    config: &ResolverConfig,
) -> Consolidation {
    if !config.do_unification {
        return Consolidation { partition: Partition::identity(index), accepted: Vec::new() };
    }

    let mut edges = Vec::new();
    for decision in decisions {
        if decision.probability < config.unification_confidence_threshold {
            continue;
        }
        let (Some(row_a), Some(row_b)) = (
            index.row_of(decision.pair.first()),
            index.row_of(decision.pair.second()),
        ) else {
            continue;
        };
        edges.push(Edge {
            pair: decision.pair,
            rows: (row_a.row, row_b.row),
            combined_order: row_a.order + row_b.order,
            probability: decision.probability,
        });
    }

    match config.cluster_method {
        ClusterMethod::GreedyBestFirst => edges.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.combined_order.cmp(&b.combined_order))
                .then_with(|| a.pair.cmp(&b.pair))
        }),
    }

    let mut set = DisjointSet::new(index.len());
    let mut accepted = Vec::with_capacity(edges.len());
    for edge in &edges {
        accepted.push(edge.pair);
        if set.union(edge.rows.0, edge.rows.1) {
            trace!("merged pair {} at p={:.3}", edge.pair, edge.probability);
        } else {
            trace!("skipped pair {}, already in one cluster", edge.pair);
        }
    }

    let partition = partition_from_set(index, &mut set);
    debug!(
        "consolidated {} accepted edges into {} clusters ({} non-singleton)",
        accepted.len(),
        partition.len(),
        partition.non_singletons().count()
    );
    Consolidation { partition, accepted }
}

/// Reflexive-transitive closure over the accepted edges of the final pass.
///
/// Re-derives the partition with a fresh disjoint-set forest so the output
/// is an equivalence relation regardless of the merge policy that produced
/// the edges. Mentions untouched by any edge come out as singletons.
pub(crate) fn close_transitive(index: &MentionIndex, accepted: &[PairKey]) -> Partition {
    let mut set = DisjointSet::new(index.len());
    for pair in accepted {
        let (Some(row_a), Some(row_b)) = (index.row_of(pair.first()), index.row_of(pair.second()))
        else {
            continue;
        };
        set.union(row_a.row, row_b.row);
    }
    partition_from_set(index, &mut set)
}

fn partition_from_set(index: &MentionIndex, set: &mut DisjointSet) -> Partition {
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for row in 0..index.len() {
        groups.entry(set.find(row)).or_default().push(row);
    }

    let mut clusters: Vec<Cluster> = groups
        .into_values()
        .map(|rows| {
            let earliest_in_scope = rows
                .iter()
                .find(|&&row| index.row_at(row).in_scope)
                .map(|&row| index.mention_at(row).id);
            Cluster {
                id: index.row_at(rows[0]).order,
                members: rows.iter().map(|&row| index.mention_at(row).id).collect(),
                earliest_in_scope,
            }
        })
        .collect();
    clusters.sort_by_key(|cluster| cluster.id);
    Partition::from(clusters)
}
