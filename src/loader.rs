//! Reading points from delimited text.
//!
//! Each non-blank line is one point. Coordinates are separated by `,` or `;`, and every line
//! must have as many coordinates as the first one.

use crate::Point;
use ndarray::Array1;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// An error while reading points. Loading stops at the first malformed line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Reading the input failed.
    #[error("failed to read points: {0}")]
    Io(#[from] io::Error),
    /// The input contains no points.
    #[error("no points found in input")]
    Empty,
    /// A line has a different number of coordinates than the first line.
    #[error("line {line}: expected {expected} coordinates, found {found}")]
    FieldCount {
        /// The 1-based line-number.
        line: usize,
        /// The number of coordinates on the first line.
        expected: usize,
        /// The number of coordinates on this line.
        found: usize,
    },
    /// A coordinate isn't a number.
    #[error("line {line}: {field:?} is not a number")]
    NotANumber {
        /// The 1-based line-number.
        line: usize,
        /// The offending field.
        field: String,
    },
}

/// Read points from a file, see the [module-documentation](self) for the format.
///
/// # Errors
///
/// Fails if the file can't be read or contains a malformed line.
#[inline]
pub fn load_points_from_path(path: impl AsRef<Path>) -> Result<Vec<Point>, LoadError> {
    let file = File::open(path)?;
    load_points(BufReader::new(file))
}

/// Read points from a reader, see the [module-documentation](self) for the format.
///
/// # Errors
///
/// Fails if reading fails or the input contains a malformed line.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use agglomerative_clustering::loader::load_points;
///
/// let points = load_points("0.5,1\n2;-3.25\n".as_bytes()).unwrap();
/// assert_eq!(points, vec![array![0.5, 1.0], array![2.0, -3.25]]);
/// ```
#[inline]
pub fn load_points(reader: impl BufRead) -> Result<Vec<Point>, LoadError> {
    let mut points: Vec<Point> = Vec::new();
    for (line_ix, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = line_ix + 1;
        let coordinates = line
            .split([',', ';'])
            .map(|field| {
                let field = field.trim();
                field.parse::<f64>().map_err(|_| LoadError::NotANumber {
                    line: line_number,
                    field: field.to_owned(),
                })
            })
            .collect::<Result<Vec<f64>, LoadError>>()?;
        if let Some(first) = points.first() {
            if first.len() != coordinates.len() {
                return Err(LoadError::FieldCount {
                    line: line_number,
                    expected: first.len(),
                    found: coordinates.len(),
                });
            }
        }
        points.push(Array1::from_vec(coordinates));
    }
    if points.is_empty() {
        return Err(LoadError::Empty);
    }
    tracing::debug!(num_points = points.len(), "loaded points");
    Ok(points)
}
