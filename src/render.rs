//! Drawing a partition as a character-grid.
//!
//! Points are projected onto their first two coordinates; one-dimensional points are drawn on
//! the line `y = 0`. Every cluster gets its own glyph, and the grid is scaled to the bounding box
//! of all points.

use crate::{Clustering, Point};

/// The glyphs assigned to clusters, in cluster-order. Cycles for more clusters than glyphs.
const GLYPHS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The glyph used when points of different clusters land on the same cell.
const COLLISION: char = '*';

/// The glyph for a cluster-index.
#[must_use]
#[inline]
pub fn glyph(cluster_ix: usize) -> char {
    GLYPHS
        .get(cluster_ix % GLYPHS.len())
        .map_or(COLLISION, |&byte| char::from(byte))
}

/// Project a point onto its first two coordinates.
fn project(point: &Point) -> (f64, f64) {
    (
        point.get(0).copied().unwrap_or(0.0),
        point.get(1).copied().unwrap_or(0.0),
    )
}

/// Map a coordinate in `[min, max]` onto a cell in `0..cells`.
#[expect(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "The value is clamped to `0..cells` before the cast."
)]
fn cell(value: f64, min: f64, max: f64, cells: usize) -> usize {
    let last = cells.saturating_sub(1);
    if max <= min {
        return last / 2;
    }
    let scaled = ((value - min) / (max - min) * last as f64).round();
    (scaled.max(0.0) as usize).min(last)
}

/// Render `clustering` of `points` as a `width`×`height` character-grid, one line per row.
///
/// Rows run from the largest second coordinate at the top to the smallest at the bottom.
/// Empty cells are `.`.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use agglomerative_clustering::{render::render_ascii, Cluster};
///
/// let points = [array![0.0, 0.0], array![1.0, 0.0], array![1.0, 1.0]];
/// let clustering = vec![
///     [0, 1].into_iter().collect::<Cluster>(),
///     Cluster::singleton(2),
/// ];
/// assert_eq!(render_ascii(&points, &clustering, 3, 2), "..1\n0.0\n");
/// ```
#[must_use]
#[inline]
pub fn render_ascii(points: &[Point], clustering: &Clustering, width: usize, height: usize) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points.iter().map(project) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let mut grid = vec![vec!['.'; width]; height];
    for (cluster_ix, cluster) in clustering.iter().enumerate() {
        let symbol = glyph(cluster_ix);
        for point in cluster.iter().filter_map(|ix| points.get(ix)) {
            let (x, y) = project(point);
            let column = cell(x, min_x, max_x, width);
            let row = height - 1 - cell(y, min_y, max_y, height);
            if let Some(slot) = grid.get_mut(row).and_then(|line| line.get_mut(column)) {
                *slot = if *slot == '.' || *slot == symbol {
                    symbol
                } else {
                    COLLISION
                };
            }
        }
    }

    let mut rendered = String::with_capacity((width + 1) * height);
    for line in grid {
        rendered.extend(line);
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cluster;
    use ndarray::array;

    #[test]
    fn glyphs_cycle() {
        assert_eq!(glyph(0), '0');
        assert_eq!(glyph(10), 'a');
        assert_eq!(glyph(GLYPHS.len()), '0');
    }

    #[test]
    fn one_dimensional_points() {
        let points = [array![0.0], array![1.0], array![4.0]];
        let clustering = vec![Cluster::singleton(2), [0, 1].into_iter().collect()];
        assert_eq!(render_ascii(&points, &clustering, 5, 1), "11..0\n");
        // With zero y-extent, the points sit on the middle row.
        assert_eq!(
            render_ascii(&points, &clustering, 5, 3),
            ".....\n11..0\n.....\n"
        );
    }

    #[test]
    fn collisions() {
        let points = [array![0.0, 0.0], array![0.0, 0.0], array![2.0, 2.0]];
        let clustering = vec![
            Cluster::singleton(0),
            Cluster::singleton(1),
            Cluster::singleton(2),
        ];
        assert_eq!(render_ascii(&points, &clustering, 2, 2), ".2\n*.\n");
    }

    #[test]
    fn degenerate_sizes() {
        let points = [array![0.0, 0.0]];
        let clustering = vec![Cluster::singleton(0)];
        assert_eq!(render_ascii(&points, &clustering, 0, 4), "");
        assert_eq!(render_ascii(&points, &clustering, 1, 1), "0\n");
    }
}
