use crate::{verify_points, Cluster, Clustering, DistanceCache, Error, Hierarchy, HistoryStore};
use crate::{Linkage, Metric, Point};

/// How to compare points and clusters, and when to stop merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Config {
    /// The distance between two points.
    pub metric: Metric,
    /// The distance between two clusters.
    pub linkage: Linkage,
    /// Stop merging once this many clusters remain. `None` merges down to a single cluster.
    pub goal_clusters: Option<usize>,
}

impl Config {
    /// Create a configuration that builds the full hierarchy, down to a single cluster.
    #[must_use]
    #[inline]
    pub const fn new(metric: Metric, linkage: Linkage) -> Self {
        Self {
            metric,
            linkage,
            goal_clusters: None,
        }
    }

    /// Resolve metric- and linkage-names, see [`Metric::from_str`](core::str::FromStr) and
    /// [`Linkage::from_str`](core::str::FromStr) for the accepted names.
    ///
    /// # Examples
    ///
    /// ```
    /// use agglomerative_clustering::{Config, Error, Linkage, Metric};
    ///
    /// let config = Config::from_names("euclidean", "average").unwrap();
    /// assert_eq!(config, Config::new(Metric::Euclidean, Linkage::Average));
    ///
    /// assert_eq!(
    ///     Config::from_names("hamming", "average"),
    ///     Err(Error::UnknownMetric("hamming".to_owned()))
    /// );
    /// ```
    #[inline]
    pub fn from_names(metric: &str, linkage: &str) -> Result<Self, Error> {
        Ok(Self::new(metric.parse()?, linkage.parse()?))
    }

    /// Stop merging once `goal` clusters remain.
    #[must_use]
    #[inline]
    pub const fn with_goal_clusters(mut self, goal: usize) -> Self {
        self.goal_clusters = Some(goal);
        self
    }

    /// The cluster-count at which merging stops.
    #[must_use]
    #[inline]
    pub fn terminal_count(&self) -> usize {
        self.goal_clusters.unwrap_or(1)
    }
}

/// Whether a [`MergeEngine`] has merges left to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// More clusters remain than the terminal count.
    Running,
    /// The terminal count has been reached.
    Done,
}

/// A single merge-step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Merge {
    /// The index of the cluster that was kept, in the collection before the merge.
    pub absorbing: usize,
    /// The index of the cluster that was absorbed and removed, in the collection before the merge.
    ///
    /// Always greater than [`Merge::absorbing`].
    pub absorbed: usize,
    /// The linkage-distance between the two clusters.
    pub distance: f64,
    /// The number of clusters left after the merge.
    pub cluster_count: usize,
}

/// Agglomerative clustering, one merge at a time.
///
/// Starts with every point in a singleton-cluster. Each [`step`](MergeEngine::step) merges the
/// two closest clusters and records a snapshot of the resulting partition, until the
/// [terminal count](Config::terminal_count) is reached.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    /// The points to be clustered.
    points: Vec<Point>,
    /// The configuration, fixed for the whole run.
    config: Config,
    /// The live partition of the points.
    clusters: Clustering,
    /// Memoized distances, cleared once merging is done.
    cache: DistanceCache,
    /// The snapshots recorded so far.
    history: HistoryStore,
    /// The merges performed so far.
    merges: Vec<Merge>,
}

impl MergeEngine {
    /// Start clustering a slice of points, each in its own cluster.
    ///
    /// Fails if there are no points, the points have different dimensions or non-finite
    /// coordinates, or if a goal cluster-count is configured that is zero or leaves nothing
    /// to merge.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use agglomerative_clustering::{Config, Error, MergeEngine, State};
    ///
    /// let points = [array![0.0], array![1.0], array![5.0]];
    /// let engine = MergeEngine::new(&points, Config::default()).unwrap();
    /// assert_eq!(engine.state(), State::Running);
    ///
    /// let too_few = Config::default().with_goal_clusters(3);
    /// assert_eq!(
    ///     MergeEngine::new(&points, too_few).unwrap_err(),
    ///     Error::InvalidGoal { goal: 3, num_points: 3 }
    /// );
    /// ```
    #[inline]
    pub fn new(points: &[Point], config: Config) -> Result<Self, Error> {
        let verified_points = verify_points(points)?;
        let num_points = verified_points.len();
        if let Some(goal) = config.goal_clusters {
            if goal == 0 || goal >= num_points {
                return Err(Error::InvalidGoal { goal, num_points });
            }
        }
        tracing::debug!(
            num_points,
            metric = %config.metric,
            linkage = %config.linkage,
            terminal_count = config.terminal_count(),
            "starting agglomerative clustering"
        );
        Ok(Self {
            points: verified_points.to_vec(),
            config,
            clusters: (0..num_points).map(Cluster::singleton).collect(),
            cache: DistanceCache::new(),
            history: HistoryStore::new(),
            merges: Vec::with_capacity(num_points.saturating_sub(config.terminal_count())),
        })
    }

    /// Whether there are merges left to do.
    #[must_use]
    #[inline]
    pub fn state(&self) -> State {
        if self.clusters.len() > self.config.terminal_count() {
            State::Running
        } else {
            State::Done
        }
    }

    /// The live partition of the points.
    #[must_use]
    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The configuration of this run.
    #[must_use]
    #[inline]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The snapshots recorded so far.
    #[must_use]
    #[inline]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The distance-cache, for inspecting its statistics.
    #[must_use]
    #[inline]
    pub const fn cache(&self) -> &DistanceCache {
        &self.cache
    }

    /// Find the two closest clusters, returning their indices `(i, j)` with `i < j` and their
    /// linkage-distance.
    ///
    /// All pairs are scanned in ascending `(i, j)`-order and only a strictly smaller distance
    /// replaces the current best, so among equally close pairs the first one wins.
    /// Returns `None` once the terminal count has been reached, so a finished engine never
    /// refills its cleared distance-cache.
    #[inline]
    pub fn closest_pair(&mut self) -> Option<(usize, usize, f64)> {
        if self.state() == State::Done {
            return None;
        }
        let Config {
            metric, linkage, ..
        } = self.config;
        let mut closest: Option<(usize, usize, f64)> = None;
        for (i, cluster_i) in self.clusters.iter().enumerate() {
            for (j, cluster_j) in self.clusters.iter().enumerate().skip(i + 1) {
                let distance = self
                    .cache
                    .linkage(linkage, metric, &self.points, cluster_i, cluster_j);
                if closest.is_none_or(|(_, _, min_distance)| distance < min_distance) {
                    closest = Some((i, j, distance));
                }
            }
        }
        closest
    }

    /// Merge the two closest clusters and record the resulting partition.
    ///
    /// The higher-indexed cluster's points are appended to the lower-indexed cluster, and the
    /// higher-indexed cluster is removed. Returns `None` without doing anything once the
    /// terminal count has been reached. The step that reaches it clears the distance-cache.
    #[inline]
    pub fn step(&mut self) -> Option<Merge> {
        if self.state() == State::Done {
            return None;
        }
        let (absorbing, absorbed, distance) = self.closest_pair()?;

        // This must *not* be a swap_remove, to preserve the order of the remaining clusters.
        let absorbed_cluster = self.clusters.remove(absorbed);
        self.clusters.get_mut(absorbing)?.absorb(absorbed_cluster);

        let cluster_count = self.clusters.len();
        debug_assert!(
            (0..self.points.len()).all(|point_ix| {
                self.clusters
                    .iter()
                    .filter(|cluster| cluster.contains(point_ix))
                    .count()
                    == 1
            }),
            "The clusters should always cover every point exactly once."
        );
        self.history.record(cluster_count, self.clusters.clone());

        let merge = Merge {
            absorbing,
            absorbed,
            distance,
            cluster_count,
        };
        self.merges.push(merge);
        tracing::debug!(absorbing, absorbed, distance, "{cluster_count} clusters left");

        if self.state() == State::Done {
            self.cache.clear();
        }
        Some(merge)
    }

    /// Merge until the terminal count is reached, and return the finished hierarchy.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use agglomerative_clustering::{Config, Linkage, MergeEngine, Metric};
    ///
    /// let points = [array![0.0], array![1.0], array![2.0], array![3.0]];
    /// let config = Config::new(Metric::Manhattan, Linkage::Average);
    /// let hierarchy = MergeEngine::new(&points, config).unwrap().run();
    ///
    /// assert_eq!(hierarchy.merges().len(), 3);
    /// assert_eq!(hierarchy.labels(2), Some(vec![0, 0, 1, 1]));
    /// ```
    #[must_use]
    #[inline]
    pub fn run(mut self) -> Hierarchy {
        while self.step().is_some() {}
        debug_assert!(
            self.cache.is_empty(),
            "The distance-cache should be cleared once merging is done."
        );
        tracing::info!(
            num_points = self.points.len(),
            merges = self.merges.len(),
            clusters = self.clusters.len(),
            "finished agglomerative clustering"
        );
        Hierarchy {
            points: self.points,
            config: self.config,
            history: self.history,
            merges: self.merges,
        }
    }
}
