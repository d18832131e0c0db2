use thiserror::Error;

/// An error-type for configuring and starting a clustering-run.
///
/// All of these are raised before the first merge. Once the merge-loop is running it cannot fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No points were supplied.
    #[error("no points supplied")]
    EmptyPoints,
    /// Two points (specified by their indices in the points-vec) have different dimensions.
    #[error("points {0} and {1} have different dimensions")]
    ShapeMismatch(usize, usize),
    /// A point (specified by its index in the points-vec) has a NaN or infinite coordinate.
    #[error("point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),
    /// The requested metric-name doesn't match a known metric.
    #[error("unknown metric {0:?}, expected one of: euclidean, squared_euclidean, manhattan")]
    UnknownMetric(String),
    /// The requested linkage-name doesn't match a known linkage.
    #[error("unknown linkage {0:?}, expected one of: single, complete, average")]
    UnknownLinkage(String),
    /// The goal cluster-count leaves nothing to merge, or is zero.
    #[error("cannot merge {num_points} points down to {goal} clusters")]
    InvalidGoal {
        /// The configured goal cluster-count.
        goal: usize,
        /// The number of points, which is the initial cluster-count.
        num_points: usize,
    },
}
