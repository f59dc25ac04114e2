//! Even-index sampling over decoded paths.
//!
//! Reduces a path to a small representative point set before fanning out
//! per-point provider queries. Sampling is pure index arithmetic:
//! deterministic, never out of bounds, and tolerant of paths shorter than
//! the requested count.

use crate::GeoPoint;

/// Indices `floor(i * len / count)` for `i in 0..count`, clamped to the
/// valid range. Empty when either argument is zero.
pub fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    (0..count).map(|i| (i * len / count).min(len - 1)).collect()
}

/// Like [`sample_indices`] over a `splits`-way division, but excluding the
/// first point: indices for `i in 1..splits`. Used where the path start
/// itself is not a useful sample (the driver is already standing there).
pub fn sample_indices_skip_first(len: usize, splits: usize) -> Vec<usize> {
    if len == 0 || splits < 2 {
        return Vec::new();
    }
    (1..splits).map(|i| (i * len / splits).min(len - 1)).collect()
}

/// The path's midpoint by index. `None` for an empty path.
pub fn midpoint(path: &[GeoPoint]) -> Option<GeoPoint> {
    if path.is_empty() {
        None
    } else {
        Some(path[path.len() / 2])
    }
}
