//! Grid dimensions, wraparound and address resolution.
//!
//! All address arithmetic goes through [`GridTopology::resolve`], so the
//! shape of the world is decided in one place:
//!
//! | east-west | north-south | shape    |
//! |-----------|-------------|----------|
//! | no        | no          | plane    |
//! | yes       | no          | cylinder |
//! | yes       | yes         | torus    |

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::hex::HexCoord;

/// Dimensions and wrap flags of a grid, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridTopology {
    columns: u32,
    rows: u32,
    wrap_east_west: bool,
    wrap_north_south: bool,
}

impl GridTopology {
    /// Create a topology.
    ///
    /// Fails with [`WorldError::InvalidDimensions`] if either dimension is
    /// zero or does not fit an `i32` coordinate.
    pub fn new(columns: u32, rows: u32, wrap_east_west: bool, wrap_north_south: bool) -> Result<Self> {
        let limit = i32::MAX as u32;
        if columns == 0 || rows == 0 || columns > limit || rows > limit {
            return Err(WorldError::InvalidDimensions { columns, rows });
        }
        Ok(Self {
            columns,
            rows,
            wrap_east_west,
            wrap_north_south,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Whether columns wrap around.
    #[must_use]
    pub const fn wraps_east_west(&self) -> bool {
        self.wrap_east_west
    }

    /// Whether rows wrap around.
    #[must_use]
    pub const fn wraps_north_south(&self) -> bool {
        self.wrap_north_south
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Resolve a logical `(x, y)` address to an in-range `(column, row)`.
    ///
    /// Wrapping axes are reduced with a true modulo (never negative);
    /// a coordinate outside `[0, N)` on a non-wrapping axis is an
    /// [`WorldError::InvalidAddress`].
    pub fn resolve(&self, x: i32, y: i32) -> Result<(u32, u32)> {
        let column = wrap_axis(x, self.columns, self.wrap_east_west);
        let row = wrap_axis(y, self.rows, self.wrap_north_south);
        match (column, row) {
            (Some(column), Some(row)) => Ok((column, row)),
            _ => Err(WorldError::InvalidAddress { x, y }),
        }
    }

    /// Row-major storage index of an in-range address.
    #[inline]
    #[must_use]
    pub const fn index(&self, column: u32, row: u32) -> usize {
        (row as usize) * (self.columns as usize) + (column as usize)
    }

    /// `(column, row)` of a storage index.
    #[inline]
    #[must_use]
    pub const fn coords(&self, index: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((index % columns) as u32, (index / columns) as u32)
    }

    /// Every resolvable cell within hex distance `range` of `(q, r)`.
    ///
    /// Offsets are enumerated `dq` ascending, then `dr` ascending, over the
    /// inclusive bounds `dq ∈ [-range, range]` and
    /// `dr ∈ [max(-range, -dq-range), min(range, -dq+range)]`, so the center
    /// comes first within its column and the result contains it. Offsets that
    /// fall off a non-wrapping edge are skipped. On a wrapping grid narrower
    /// than the range, offsets that fold onto an already listed cell are
    /// dropped, so each cell appears once.
    ///
    /// No two cells are farther apart than `columns + rows`, so larger ranges
    /// are clamped to that and return the whole grid.
    #[must_use]
    pub fn within_range(&self, q: i32, r: i32, range: u32) -> Vec<(u32, u32)> {
        let range = range.min(self.max_span());
        // Dimensions are at most i32::MAX each, so the span fits an i64.
        let range = i64::from(range);
        let mut seen = vec![false; self.cell_count()];
        let mut results = Vec::new();

        for dq in -range..=range {
            let dr_min = (-range).max(-dq - range);
            let dr_max = range.min(-dq + range);
            for dr in dr_min..=dr_max {
                let x = i64::from(q) + dq;
                let y = i64::from(r) + dr;
                let (Some(column), Some(row)) = (
                    wrap_axis_wide(x, self.columns, self.wrap_east_west),
                    wrap_axis_wide(y, self.rows, self.wrap_north_south),
                ) else {
                    tracing::trace!(q, r, dq, dr, "range offset off the grid, skipped");
                    continue;
                };
                let index = self.index(column, row);
                if !seen[index] {
                    seen[index] = true;
                    results.push((column, row));
                }
            }
        }

        results
    }

    /// Largest hex distance any two cells can be apart.
    #[must_use]
    pub const fn max_span(&self) -> u32 {
        self.columns.saturating_add(self.rows)
    }

    /// Hex distance between two in-range cells, taking the shortest way
    /// around on wrapping axes.
    ///
    /// Image offsets are computed in `i64`: a shift by a full dimension can
    /// leave the `i32` range even though every in-range distance fits a `u32`.
    #[must_use]
    pub fn distance(&self, a: HexCoord, b: HexCoord) -> u32 {
        let dq = i64::from(b.q) - i64::from(a.q);
        let dr = i64::from(b.r) - i64::from(a.r);
        let columns = i64::from(self.columns);
        let rows = i64::from(self.rows);

        let q_images: &[i64] = if self.wrap_east_west {
            &[-1, 0, 1]
        } else {
            &[0]
        };
        let r_images: &[i64] = if self.wrap_north_south {
            &[-1, 0, 1]
        } else {
            &[0]
        };

        let mut best = u64::MAX;
        for &kq in q_images {
            for &kr in r_images {
                let q = dq + kq * columns;
                let r = dr + kr * rows;
                let d = q.unsigned_abs().max(r.unsigned_abs()).max((q + r).unsigned_abs());
                best = best.min(d);
            }
        }
        u32::try_from(best).unwrap_or(u32::MAX)
    }
}

/// Reduce one coordinate onto `[0, size)`, or `None` if it is off a
/// non-wrapping axis.
#[inline]
fn wrap_axis(value: i32, size: u32, wraps: bool) -> Option<u32> {
    let size = size as i32;
    if wraps {
        Some(value.rem_euclid(size) as u32)
    } else if (0..size).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}

/// [`wrap_axis`] for offsets that may leave the `i32` range.
#[inline]
fn wrap_axis_wide(value: i64, size: u32, wraps: bool) -> Option<u32> {
    let size = i64::from(size);
    let value = if wraps { value.rem_euclid(size) } else { value };
    if (0..size).contains(&value) {
        u32::try_from(value).ok()
    } else {
        None
    }
}
