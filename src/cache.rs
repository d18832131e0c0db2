use crate::{Cluster, Linkage, Metric, Point};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;

/// The bit-patterns of a point's coordinates.
///
/// Floats aren't `Hash`, so points are keyed by their exact bits instead.
type PointKey = SmallVec<[u64; 4]>;

/// A map from (canonically ordered) pairs of points to their distance, used for memoization.
type Distances = FxHashMap<(PointKey, PointKey), f64>;

/// A map from ordered pairs of clusters to their linkage-distance, used for memoization.
///
/// Nested by the first cluster, so that a lookup can borrow both clusters.
type Linkages = FxHashMap<Cluster, FxHashMap<Cluster, f64>>;

/// Counters describing how a [`DistanceCache`] has been used since it was last cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct CacheStats {
    /// Number of memoized point-distances.
    pub distance_entries: usize,
    /// Number of memoized linkage-distances.
    pub linkage_entries: usize,
    /// Point-distances answered from the cache.
    pub distance_hits: u64,
    /// Point-distances that had to be calculated.
    pub distance_misses: u64,
    /// Linkage-distances answered from the cache.
    pub linkage_hits: u64,
    /// Linkage-distances that had to be calculated.
    pub linkage_misses: u64,
}

/// Memoizes point-distances and linkage-distances over the lifetime of one clustering-run.
///
/// Both [`Metric::distance`] and [`Linkage::evaluate`] are pure, so a cached value is always
/// bit-identical to recalculating it. Entries are keyed by value: points by the bits of their
/// coordinates, clusters by their ordered point-indices.
///
/// Point-pairs are stored in canonical order, because every [`Metric`] is exactly symmetric.
/// Cluster-pairs are not: [`Linkage::Average`] sums in traversal order, so `(a, b)` and `(b, a)`
/// may differ in the last bit and get separate entries. The merge-loop always asks for the
/// lower-indexed cluster first, so this doesn't cause duplicate work there.
///
/// Keys don't include the metric or linkage, so a cache must only ever be used with one
/// configuration (and one point-slice) between two calls to [`DistanceCache::clear`].
#[derive(Debug, Clone, Default)]
pub struct DistanceCache {
    /// Memoized point-distances.
    distances: Distances,
    /// Memoized linkage-distances.
    linkages: Linkages,
    /// Hit- and miss-counters. The entry-counts are filled in by [`DistanceCache::stats`].
    stats: CacheStats,
}

impl DistanceCache {
    /// Create an empty cache.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the distance between two points, calculating it on a miss.
    #[inline]
    pub fn distance(&mut self, metric: Metric, p: &Point, q: &Point) -> f64 {
        cached_distance(&mut self.distances, &mut self.stats, metric, p, q)
    }

    /// Get the linkage-distance between two clusters, calculating it on a miss.
    ///
    /// # Panics
    ///
    /// Panics if a cluster contains an index that is out of bounds for `points`.
    #[inline]
    #[expect(
        clippy::indexing_slicing,
        reason = "Documented panic, clusters always index into the points they were built from."
    )]
    pub fn linkage(
        &mut self,
        linkage: Linkage,
        metric: Metric,
        points: &[Point],
        a: &Cluster,
        b: &Cluster,
    ) -> f64 {
        if let Some(&cached) = self.linkages.get(a).and_then(|row| row.get(b)) {
            self.stats.linkage_hits += 1;
            return cached;
        }
        self.stats.linkage_misses += 1;
        let distances = &mut self.distances;
        let stats = &mut self.stats;
        let distance = linkage.evaluate(a, b, |i, j| {
            cached_distance(distances, stats, metric, &points[i], &points[j])
        });
        self.linkages
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), distance);
        distance
    }

    /// Usage-counters and current sizes.
    #[must_use]
    #[inline]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            distance_entries: self.distances.len(),
            linkage_entries: self.linkages.values().map(FxHashMap::len).sum(),
            ..self.stats
        }
    }

    /// Check whether nothing is memoized.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty() && self.linkages.is_empty()
    }

    /// Drop every entry and reset the counters, releasing the memory held by the maps.
    #[inline]
    pub fn clear(&mut self) {
        let stats = self.stats();
        tracing::debug!(
            distance_entries = stats.distance_entries,
            linkage_entries = stats.linkage_entries,
            distance_hits = stats.distance_hits,
            distance_misses = stats.distance_misses,
            linkage_hits = stats.linkage_hits,
            linkage_misses = stats.linkage_misses,
            "clearing distance cache"
        );
        // `HashMap::clear` would keep the allocation around.
        *self = Self::default();
    }
}

/// Look up or calculate a point-distance.
///
/// A free function so that [`DistanceCache::linkage`] can call it while the linkage-map is borrowed.
fn cached_distance(
    distances: &mut Distances,
    stats: &mut CacheStats,
    metric: Metric,
    p: &Point,
    q: &Point,
) -> f64 {
    let (p_key, q_key) = (point_key(p), point_key(q));
    let key = if p_key <= q_key {
        (p_key, q_key)
    } else {
        (q_key, p_key)
    };
    match distances.entry(key) {
        Entry::Occupied(entry) => {
            stats.distance_hits += 1;
            *entry.get()
        }
        Entry::Vacant(entry) => {
            stats.distance_misses += 1;
            *entry.insert(metric.distance(p, q))
        }
    }
}

/// Key a point by the bits of its coordinates.
fn point_key(p: &Point) -> PointKey {
    p.iter().map(|x| x.to_bits()).collect()
}
