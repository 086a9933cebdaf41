use super::VectorGrid;
use nalgebra::DMatrix;

/// Cells excluded from streamline tracing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskOptions {
    /// Vectors shorter than this are excluded
    pub threshold: f64,
    pub remove_border: bool,
    /// Excludes cells where either component is exactly zero
    pub remove_zeros: bool,
}
impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-3,
            remove_border: true,
            remove_zeros: true,
        }
    }
}

/// Vector field components and magnitude as `S×S` matrices
///
/// Matrices are indexed `(row, column)` where the row is the y coordinate, starting from the
/// bottom of the plot, and the column is the x coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    pub u: DMatrix<f64>,
    pub v: DMatrix<f64>,
    pub magnitude: DMatrix<f64>,
}
impl FlowField {
    /// Splits the grid into its `u`, `v` components
    pub fn from_grid(grid: &VectorGrid) -> Self {
        let n = grid.side();
        let cells = grid.cells();
        let u = DMatrix::from_fn(n, n, |i, j| cells[i * n + j].dx);
        let v = DMatrix::from_fn(n, n, |i, j| cells[i * n + j].dy);
        let magnitude = u.zip_map(&v, |u, v| u.hypot(v));
        Self { u, v, magnitude }
    }
    /// Side length
    pub fn side(&self) -> usize {
        self.u.nrows()
    }
    /// Returns a copy with the excluded cells of `u` and `v` set to NaN
    ///
    /// The magnitude is left untouched, it still colors the lines and the heatmap.
    pub fn masked(&self, options: &MaskOptions) -> Self {
        let n = self.side();
        let excluded = |i: usize, j: usize| {
            let (u, v) = (self.u[(i, j)], self.v[(i, j)]);
            self.magnitude[(i, j)] < options.threshold
                || (options.remove_zeros && (u == 0f64 || v == 0f64))
                || (options.remove_border && (i == 0 || j == 0 || i + 1 == n || j + 1 == n))
        };
        let mut u = self.u.clone();
        let mut v = self.v.clone();
        let mut count = 0usize;
        for i in 0..n {
            for j in 0..n {
                if excluded(i, j) {
                    u[(i, j)] = f64::NAN;
                    v[(i, j)] = f64::NAN;
                    count += 1;
                }
            }
        }
        log::debug!("masked {count} of {} cells", n * n);
        Self {
            u,
            v,
            magnitude: self.magnitude.clone(),
        }
    }
    /// Returns the smallest and largest finite magnitude
    pub fn magnitude_range(&self) -> Option<(f64, f64)> {
        self.magnitude
            .iter()
            .filter(|x| x.is_finite())
            .fold(None, |range, &x| match range {
                None => Some((x, x)),
                Some((lo, hi)) => Some((f64::min(lo, x), f64::max(hi, x))),
            })
    }
}
impl From<&VectorGrid> for FlowField {
    fn from(grid: &VectorGrid) -> Self {
        Self::from_grid(grid)
    }
}
