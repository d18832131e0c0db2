/*!
Deterministic [agglomerative](https://en.wikipedia.org/wiki/Hierarchical_clustering) clustering.

Every point starts in its own cluster. The two closest clusters, as judged by a [`Linkage`]
built on a point-to-point [`Metric`], are merged until a single cluster (or a configured
number of clusters) remains. The partition reached at every intermediate cluster-count is
recorded, so any step of the merge history can be inspected afterwards.

Ties are broken by scan order: of all pairs `(i, j)` with `i < j` that share the minimal
linkage-distance, the first one in ascending `(i, j)`-order is merged. Running the same input
twice therefore yields exactly the same history.

# Example

```
use ndarray::array;
use agglomerative_clustering::{Config, Linkage, MergeEngine, Metric};

let points = vec![
    array![0.0, 0.0],
    array![1.0, 0.0],
    array![10.0, 0.0],
    array![11.0, 0.0],
];
let config = Config::new(Metric::SquaredEuclidean, Linkage::Single);
let hierarchy = MergeEngine::new(&points, config).unwrap().run();

// Each cluster in a snapshot is an ordered list of point-indices:
let two_clusters = hierarchy.get(2).unwrap();
assert_eq!(two_clusters[0].as_slice(), &[0, 1]);
assert_eq!(two_clusters[1].as_slice(), &[2, 3]);

// The initial count is never recorded, only the counts reached by merging.
assert!(hierarchy.get(4).is_none());
```
*/

use core::{fmt, str::FromStr};
use ndarray::Array1;
use smallvec::SmallVec;

mod cache;
mod engine;
mod error;
mod history;
pub mod loader;
pub mod render;

pub use cache::{CacheStats, DistanceCache};
pub use engine::{Config, Merge, MergeEngine, State};
pub use error::Error;
pub use history::{Hierarchy, HistoryStore};
pub use loader::LoadError;

/// A single point.
pub type Point = Array1<f64>;

/// A partition of the points into disjoint clusters, in collection order.
pub type Clustering = Vec<Cluster>;

/// An ordered, non-empty collection of point-indices.
///
/// The order of the indices is the order in which the points were absorbed during merging.
/// Indices refer to the point-slice the clustering was started on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cluster(SmallVec<[usize; 4]>);
impl Cluster {
    /// Create a new cluster containing a single point.
    #[must_use]
    #[inline]
    pub fn singleton(point_ix: usize) -> Self {
        let mut indices = SmallVec::new();
        indices.push(point_ix);
        Self(indices)
    }

    /// Append all points of `other` to this cluster, preserving their order.
    fn absorb(&mut self, other: Self) {
        debug_assert!(
            other.iter().all(|ix| !self.contains(ix)),
            "Throughout the entire implementation, we should never be merging intersecting clusters."
        );
        self.0.extend(other.0);
    }

    /// Check whether the cluster contains a point-index.
    #[must_use]
    #[inline]
    pub fn contains(&self, point_ix: usize) -> bool {
        self.0.contains(&point_ix)
    }

    /// Count the number of points in the cluster.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the cluster doesn't contain any points.
    ///
    /// Clusters produced by this crate are never empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The point-indices in merge-order.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Construct an iterator over the point-indices in merge-order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Resolve the point-indices against the point-slice the clustering was computed on.
    ///
    /// # Panics
    ///
    /// Panics if `points` is shorter than the largest index in the cluster.
    #[inline]
    #[expect(
        clippy::indexing_slicing,
        reason = "Documented panic, the indices always come from the same point-slice."
    )]
    pub fn points<'a>(&'a self, points: &'a [Point]) -> impl Iterator<Item = &'a Point> + 'a {
        self.iter().map(move |ix| &points[ix])
    }
}

impl FromIterator<usize> for Cluster {
    #[inline]
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut cluster = Self(SmallVec::new());
        for ix in iter {
            debug_assert!(
                !cluster.contains(ix),
                "Throughout the entire implementation, we should never to add the same point twice."
            );
            cluster.0.push(ix);
        }
        cluster
    }
}

impl fmt::Display for Cluster {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (n, ix) in self.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ix}")?;
        }
        f.write_str("}")
    }
}

/// A distance-function between two points.
///
/// Every variant is deterministic, symmetric and zero exactly on equal points. They need not
/// satisfy the triangle-inequality, because only the relative order of distances matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// The [euclidean-distance](https://en.wikipedia.org/wiki/Euclidean_distance).
    #[default]
    Euclidean,
    /// The squared euclidean-distance. Same order as [`Metric::Euclidean`], without the square root.
    SquaredEuclidean,
    /// The [taxicab-distance](https://en.wikipedia.org/wiki/Taxicab_geometry).
    Manhattan,
}

impl Metric {
    /// Calculate the distance between two points of equal dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use agglomerative_clustering::Metric;
    ///
    /// let (p, q) = (array![0.0, 0.0], array![3.0, 4.0]);
    /// assert_eq!(Metric::Euclidean.distance(&p, &q), 5.0);
    /// assert_eq!(Metric::SquaredEuclidean.distance(&p, &q), 25.0);
    /// assert_eq!(Metric::Manhattan.distance(&p, &q), 7.0);
    /// ```
    #[must_use]
    #[inline]
    pub fn distance(self, p: &Point, q: &Point) -> f64 {
        debug_assert_eq!(
            p.raw_dim(),
            q.raw_dim(),
            "Points are verified to share a dimension before any distance is taken."
        );
        match self {
            Self::Euclidean => Self::element_norm(p, q, |x| x.powi(2)).sqrt(),
            Self::SquaredEuclidean => Self::element_norm(p, q, |x| x.powi(2)),
            Self::Manhattan => Self::element_norm(p, q, f64::abs),
        }
    }

    /// Apply `elementnorm` to each coordinate of the difference between two points, and sum up.
    fn element_norm(p: &Point, q: &Point, elementnorm: impl Fn(f64) -> f64) -> f64 {
        (p - q).map(|x| elementnorm(*x)).sum()
    }

    /// The canonical name of the metric, as accepted by [`Metric::from_str`].
    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Manhattan => "manhattan",
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "euclidean" | "euclidean_distance" | "l2" => Ok(Self::Euclidean),
            "squared_euclidean" | "euclidean_squared" | "sqeuclidean" | "l2_squared" => {
                Ok(Self::SquaredEuclidean)
            }
            "manhattan" | "manhattan_distance" | "taxicab" | "cityblock" | "l1" => {
                Ok(Self::Manhattan)
            }
            _ => Err(Error::UnknownMetric(s.to_owned())),
        }
    }
}

impl fmt::Display for Metric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rule for calculating the distance between two clusters from the distances between their points.
///
/// Every variant visits the full cross product of the two clusters, in the order
/// "each point of the first cluster, paired with each point of the second cluster".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
    /// The smallest distance between a point of one cluster and a point of the other.
    #[default]
    Single,
    /// The largest distance between a point of one cluster and a point of the other.
    Complete,
    /// The mean distance over all pairs of points, one from each cluster.
    Average,
}

impl Linkage {
    /// Calculate the linkage-distance between two non-empty clusters.
    ///
    /// `distance(i, j)` must return the distance between the points with indices `i` and `j`.
    ///
    /// # Examples
    ///
    /// ```
    /// use agglomerative_clustering::{Cluster, Linkage};
    ///
    /// let a: Cluster = [0, 1].into_iter().collect();
    /// let b: Cluster = [2, 3].into_iter().collect();
    /// // Points on a line at their own index.
    /// let distance = |i: usize, j: usize| i.abs_diff(j) as f64;
    ///
    /// assert_eq!(Linkage::Single.evaluate(&a, &b, distance), 1.0);
    /// assert_eq!(Linkage::Complete.evaluate(&a, &b, distance), 3.0);
    /// assert_eq!(Linkage::Average.evaluate(&a, &b, distance), 2.0);
    /// ```
    #[inline]
    pub fn evaluate(
        self,
        a: &Cluster,
        b: &Cluster,
        mut distance: impl FnMut(usize, usize) -> f64,
    ) -> f64 {
        debug_assert!(
            !a.is_empty() && !b.is_empty(),
            "Clusters should never be empty."
        );
        let pairwise = a
            .iter()
            .flat_map(|i| b.iter().map(move |j| (i, j)))
            .map(|(i, j)| distance(i, j));
        match self {
            Self::Single => pairwise.fold(f64::INFINITY, f64::min),
            Self::Complete => pairwise.fold(f64::NEG_INFINITY, f64::max),
            Self::Average => {
                #[expect(
                    clippy::as_conversions,
                    clippy::cast_precision_loss,
                    reason = "Cluster sizes are far below 2^52."
                )]
                let pair_count = (a.len() * b.len()) as f64;
                pairwise.sum::<f64>() / pair_count
            }
        }
    }

    /// The canonical name of the linkage, as accepted by [`Linkage::from_str`].
    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
        }
    }
}

impl FromStr for Linkage {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single" | "single_linkage" | "min" => Ok(Self::Single),
            "complete" | "complete_linkage" | "max" => Ok(Self::Complete),
            "average" | "average_linkage" | "mean" | "upgma" => Ok(Self::Average),
            _ => Err(Error::UnknownLinkage(s.to_owned())),
        }
    }
}

impl fmt::Display for Linkage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check whether a set of points is valid for clustering.
fn verify_points(points: &[Point]) -> Result<&[Point], Error> {
    let first_point = points.first().ok_or(Error::EmptyPoints)?;
    let first_dim = first_point.raw_dim();

    if let Some(ix) = points.iter().position(|p| p.raw_dim() != first_dim) {
        return Err(Error::ShapeMismatch(0, ix));
    }

    if let Some(ix) = points
        .iter()
        .position(|p| p.iter().any(|x| !x.is_finite()))
    {
        return Err(Error::NonFinitePoint(ix));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools as _;
    use ndarray::array;

    #[test]
    #[should_panic(
        expected = "Throughout the entire implementation, we should never be merging intersecting clusters."
    )]
    fn cluster_intersecting_merge() {
        let mut cluster7: Cluster = [7, 8].into_iter().collect();
        let cluster9: Cluster = [9, 8].into_iter().collect();
        cluster7.absorb(cluster9);
    }

    #[test]
    #[should_panic(
        expected = "Throughout the entire implementation, we should never to add the same point twice."
    )]
    fn cluster_double_insert() {
        let _: Cluster = [3, 1, 3].into_iter().collect();
    }

    #[test]
    fn cluster() {
        let mut left = Cluster::singleton(5);
        assert!(!left.is_empty());
        assert_eq!(left.len(), 1);
        assert!(left.contains(5));
        assert!(!left.contains(4));

        let right: Cluster = [9, 2, 7].into_iter().collect();
        left.absorb(right);
        // Absorbed points are appended in their own order, not sorted.
        assert_eq!(left.iter().collect_vec(), vec![5, 9, 2, 7]);
        assert_eq!(left.len(), 4);
        assert_eq!(left.to_string(), "{5, 9, 2, 7}");
    }

    #[test]
    fn cluster_points() {
        let points = vec![array![0.0], array![1.0], array![2.0]];
        let cluster: Cluster = [2, 0].into_iter().collect();
        assert_eq!(
            cluster.points(&points).cloned().collect_vec(),
            vec![array![2.0], array![0.0]]
        );
    }

    #[test]
    fn verify() {
        assert_eq!(verify_points(&[]), Err(Error::EmptyPoints));
        assert_eq!(
            verify_points(&[array![0.0, 1.0], array![0.0, 1.0], array![2.0]]),
            Err(Error::ShapeMismatch(0, 2))
        );
        assert_eq!(
            verify_points(&[array![0.0, 1.0], array![f64::NAN, 1.0]]),
            Err(Error::NonFinitePoint(1))
        );
        assert_eq!(
            verify_points(&[array![f64::INFINITY]]),
            Err(Error::NonFinitePoint(0))
        );
        assert!(verify_points(&[array![0.0, 1.0], array![-3.0, 1e300]]).is_ok());
    }

    const METRICS: [Metric; 3] = [
        Metric::Euclidean,
        Metric::SquaredEuclidean,
        Metric::Manhattan,
    ];

    #[test]
    #[expect(clippy::float_cmp, reason = "These comparisons should be exact.")]
    fn distances() {
        let p = array![-6.0, -8.0];
        let q = array![0.0, 0.0];
        let r = array![3.0, 4.0];
        assert_eq!(Metric::Euclidean.distance(&p, &q), 10.0);
        assert_eq!(Metric::Euclidean.distance(&p, &r), 15.0);
        assert_eq!(Metric::SquaredEuclidean.distance(&p, &r), 225.0);
        assert_eq!(Metric::Manhattan.distance(&p, &r), 21.0);
        assert_eq!(Metric::Manhattan.distance(&q, &r), 7.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "Symmetry should be exact.")]
    fn symmetric_and_zero_on_equal_points() {
        let points = [
            array![0.1, 0.7, -3.0],
            array![1e-9, 2.5, 1e9],
            array![-0.3, 0.0, 0.2],
            array![0.1, 0.7, -3.0],
        ];
        for metric in METRICS {
            for (p, q) in points.iter().cartesian_product(points.iter()) {
                let d = metric.distance(p, q);
                assert_eq!(d, metric.distance(q, p), "{metric} should be symmetric.");
                assert!(d >= 0.0, "{metric} should be non-negative.");
                assert_eq!(d == 0.0, p == q, "{metric} should be zero iff p == q.");
            }
        }
    }

    #[test]
    fn metric_names() {
        for metric in METRICS {
            assert_eq!(metric.to_string().parse::<Metric>(), Ok(metric));
        }
        assert_eq!("L1".parse::<Metric>(), Ok(Metric::Manhattan));
        assert_eq!("euclidean_distance".parse::<Metric>(), Ok(Metric::Euclidean));
        assert_eq!("squared-euclidean".parse::<Metric>(), Ok(Metric::SquaredEuclidean));
        assert_eq!(
            "chebyshev".parse::<Metric>(),
            Err(Error::UnknownMetric("chebyshev".to_owned()))
        );
    }

    const LINKAGES: [Linkage; 3] = [Linkage::Single, Linkage::Complete, Linkage::Average];

    fn line() -> Vec<Point> {
        vec![array![0.0], array![1.0], array![2.0], array![3.0], array![7.0]]
    }

    #[expect(clippy::indexing_slicing, reason = "Test indices are in range.")]
    fn linkage_on(linkage: Linkage, points: &[Point], a: &[usize], b: &[usize]) -> f64 {
        let a: Cluster = a.iter().copied().collect();
        let b: Cluster = b.iter().copied().collect();
        linkage.evaluate(&a, &b, |i, j| {
            Metric::Manhattan.distance(&points[i], &points[j])
        })
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "These comparisons should be exact.")]
    fn single_complete_average() {
        let points = line();
        assert_eq!(linkage_on(Linkage::Single, &points, &[0, 1], &[3, 4]), 2.0);
        assert_eq!(linkage_on(Linkage::Complete, &points, &[0, 1], &[3, 4]), 7.0);
        // (3 + 7 + 2 + 6) / 4
        assert_eq!(linkage_on(Linkage::Average, &points, &[0, 1], &[3, 4]), 4.5);
        assert_eq!(linkage_on(Linkage::Average, &points, &[2], &[4]), 5.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "These comparisons should be exact.")]
    fn average_uses_full_cross_product() {
        // Pairing members by offset over a truncated slice would give (2 + 3 + 2) / 3 here.
        // The full cross product is (2 + 3 + 1 + 2) / 4.
        let points = line();
        assert_eq!(linkage_on(Linkage::Average, &points, &[0, 1], &[2, 3]), 2.0);
        // Truncated pairing would only see (0, 4) and give 7.
        assert_eq!(linkage_on(Linkage::Average, &points, &[0, 1, 2], &[4]), 6.0);
        assert_eq!(
            linkage_on(Linkage::Average, &points, &[1, 0], &[3, 2]),
            linkage_on(Linkage::Average, &points, &[0, 1], &[2, 3])
        );
        assert_eq!(linkage_on(Linkage::Average, &points, &[4], &[0, 1, 2]), 6.0);
    }

    #[test]
    fn visits_every_pair_once() {
        let a: Cluster = [0, 1, 2].into_iter().collect();
        let b: Cluster = [3, 4].into_iter().collect();
        for linkage in LINKAGES {
            let mut visited = vec![];
            let _ = linkage.evaluate(&a, &b, |i, j| {
                visited.push((i, j));
                1.0
            });
            assert_eq!(
                visited,
                vec![(0, 3), (0, 4), (1, 3), (1, 4), (2, 3), (2, 4)],
                "{linkage} should visit the full cross product in order."
            );
        }
    }

    #[test]
    fn linkage_names() {
        for linkage in LINKAGES {
            assert_eq!(linkage.to_string().parse::<Linkage>(), Ok(linkage));
        }
        assert_eq!("single_linkage".parse::<Linkage>(), Ok(Linkage::Single));
        assert_eq!("UPGMA".parse::<Linkage>(), Ok(Linkage::Average));
        assert_eq!(
            "ward".parse::<Linkage>(),
            Err(Error::UnknownLinkage("ward".to_owned()))
        );
    }
}
