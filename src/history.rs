use crate::{Clustering, Config, Merge, Point};
use std::collections::BTreeMap;

/// Snapshots of the partition at every cluster-count reached while merging.
///
/// Each snapshot is an independent copy; later merges never alter it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    /// The snapshots, keyed by their cluster-count.
    snapshots: BTreeMap<usize, Clustering>,
}

impl HistoryStore {
    /// Create an empty history.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the snapshot for a cluster-count.
    ///
    /// Each count must only be recorded once. Should it happen anyway, the first snapshot is kept,
    /// as it is the one reached first.
    #[inline]
    pub fn record(&mut self, count: usize, snapshot: Clustering) {
        debug_assert_eq!(
            count,
            snapshot.len(),
            "A snapshot should be recorded under its own cluster-count."
        );
        debug_assert!(
            !self.snapshots.contains_key(&count),
            "Cluster-count {count} should only be recorded once."
        );
        self.snapshots.entry(count).or_insert(snapshot);
    }

    /// Get the snapshot for a cluster-count, or `None` if that count was never recorded.
    #[must_use]
    #[inline]
    pub fn get(&self, count: usize) -> Option<&Clustering> {
        self.snapshots.get(&count)
    }

    /// The number of recorded snapshots.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check whether no snapshot has been recorded.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The recorded cluster-counts, in descending order (which is the order they were reached in).
    #[inline]
    pub fn counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.snapshots.keys().rev().copied()
    }
}

/// The finished result of a clustering-run.
///
/// Holds the points that were clustered, the configuration, the snapshot for every cluster-count
/// reached, and the merges in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub(crate) points: Vec<Point>,
    pub(crate) config: Config,
    pub(crate) history: HistoryStore,
    pub(crate) merges: Vec<Merge>,
}

impl Hierarchy {
    /// Get the partition into `count` clusters, or `None` if that count was never reached.
    ///
    /// The initial count (every point in its own cluster) is not recorded, and neither are
    /// counts below the configured goal.
    #[must_use]
    #[inline]
    pub fn get(&self, count: usize) -> Option<&Clustering> {
        self.history.get(count)
    }

    /// Like [`Hierarchy::get`], but with each cluster resolved to its points.
    ///
    /// The points can then be projected onto their first two coordinates for plotting.
    #[must_use]
    #[inline]
    pub fn points_of(&self, count: usize) -> Option<Vec<Vec<&Point>>> {
        self.get(count).map(|clustering| {
            clustering
                .iter()
                .map(|cluster| cluster.points(&self.points).collect())
                .collect()
        })
    }

    /// Get, for every point, the index of its cluster in the partition into `count` clusters.
    #[must_use]
    #[inline]
    pub fn labels(&self, count: usize) -> Option<Vec<usize>> {
        let clustering = self.get(count)?;
        let mut labels = vec![0; self.points.len()];
        for (label, cluster) in clustering.iter().enumerate() {
            for point_ix in cluster.iter() {
                if let Some(slot) = labels.get_mut(point_ix) {
                    *slot = label;
                }
            }
        }
        Some(labels)
    }

    /// The [cophenetic distance](https://en.wikipedia.org/wiki/Cophenetic) between two points:
    /// the linkage-distance of the merge that first put them into the same cluster.
    ///
    /// Returns `Some(0.0)` if `i == j`, and `None` if either index is out of bounds or the two
    /// points never ended up together (because merging stopped at a goal cluster-count).
    #[must_use]
    #[inline]
    pub fn cophenetic_distance(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.points.len() || j >= self.points.len() {
            return None;
        }
        if i == j {
            return Some(0.0);
        }
        self.merges
            .iter()
            .find(|merge| {
                self.get(merge.cluster_count).is_some_and(|clustering| {
                    clustering
                        .iter()
                        .any(|cluster| cluster.contains(i) && cluster.contains(j))
                })
            })
            .map(|merge| merge.distance)
    }

    /// All merges, in the order they were performed.
    #[must_use]
    #[inline]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// The points that were clustered.
    #[must_use]
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The configuration the hierarchy was built with.
    #[must_use]
    #[inline]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying snapshot-store.
    #[must_use]
    #[inline]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }
}
