//! Test data generators for synthetic gridded measurements.
//!
//! These generators create predictable, verifiable patterns shared across
//! the test suite. All grids are row-major `f64` buffers.

/// Evenly spaced axis values: `start, start + step, ...` (`n` values).
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Creates a test grid where each cell is `col * 1000 + row`.
///
/// Makes it easy to tell which cell a value came from, and therefore whether
/// an index mapping swapped rows and columns.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a reflectivity-like grid in dBZ.
///
/// Values fall off radially from a storm core at the grid centre: ~75 dBZ at
/// the core down to 0 dBZ at the corners.
pub fn create_reflectivity_grid(width: usize, height: usize) -> Vec<f64> {
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let max_dist = (center_x * center_x + center_y * center_y).sqrt().max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - center_x;
            let dy = row as f64 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            data.push(75.0 * (1.0 - dist / max_dist));
        }
    }
    data
}

/// Replaces every `every`-th cell (starting at index 0) with `sentinel`.
///
/// Returns the number of cells replaced.
pub fn punch_missing(data: &mut [f64], every: usize, sentinel: f64) -> usize {
    if every == 0 {
        return 0;
    }
    let mut count = 0;
    for v in data.iter_mut().step_by(every) {
        *v = sentinel;
        count += 1;
    }
    count
}

/// Transposes a row-major `rows × cols` buffer into `cols × rows`.
pub fn transpose(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = data[r * cols + c];
        }
    }
    out
}
