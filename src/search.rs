//! Bin locators over sorted grids.
//!
//! Both locators return the index `i` of the lower boundary of the bin
//! `[grid[i], grid[i+1]]` containing a value. They only differ in how a value
//! lying exactly on an interior grid point is assigned.

use crate::error::SearchError;
use crate::num::Float;

fn check_bounds<T: Float>(grid: &[T], value: T) -> Result<(), SearchError> {
    if grid.len() < 2 {
        return Err(SearchError::DegenerateGrid);
    }
    let lower = grid[0];
    let upper = grid[grid.len() - 1];
    if !(value >= lower && value <= upper) {
        return Err(SearchError::OutOfBounds {
            value: value.as_f64(),
            lower: lower.as_f64(),
            upper: upper.as_f64(),
        });
    }

    Ok(())
}

/// Finds the lower bin index of a value, with bins closed at their lower
/// boundary.
///
/// A value equal to an interior grid point belongs to the bin starting at that
/// point; if several grid points are equal, the last one is used. The upper
/// grid bound belongs to the last bin.
pub fn find_lower_bin_index<T: Float>(grid: &[T], value: T) -> Result<usize, SearchError> {
    check_bounds(grid, value)?;

    let last_bin = grid.len() - 2;
    if value >= grid[last_bin + 1] {
        return Ok(last_bin);
    }

    // Invariant: grid[lo] <= value < grid[hi].
    let mut lo = 0;
    let mut hi = last_bin + 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if grid[mid] <= value {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(lo)
}

/// Finds the lower bin index of a value, with bins closed at their upper
/// boundary.
///
/// A value equal to an interior grid point belongs to the bin ending at that
/// point; if several grid points are equal, the first one is used. The lower
/// grid bound belongs to the first bin.
pub fn find_lower_bin_index_including_upper_bound<T: Float>(
    grid: &[T],
    value: T,
) -> Result<usize, SearchError> {
    check_bounds(grid, value)?;

    if value <= grid[0] {
        return Ok(0);
    }

    // Invariant: grid[lo] < value <= grid[hi].
    let mut lo = 0;
    let mut hi = grid.len() - 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if grid[mid] < value {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(lo)
}
