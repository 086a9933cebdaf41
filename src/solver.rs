use super::{Vector2, VectorGrid};
use nalgebra::DMatrix;

/// A Dirichlet boundary segment
///
/// Cells `(i, j)` where `condition` holds keep `value(i, j)` for the whole solve.
pub struct Boundary {
    condition: Box<dyn Fn(usize, usize) -> bool>,
    value: Box<dyn Fn(usize, usize) -> f64>,
}
impl Boundary {
    pub fn new(
        condition: impl Fn(usize, usize) -> bool + 'static,
        value: impl Fn(usize, usize) -> f64 + 'static,
    ) -> Self {
        Self {
            condition: Box::new(condition),
            value: Box::new(value),
        }
    }
    /// Segment held at a constant value
    pub fn constant(condition: impl Fn(usize, usize) -> bool + 'static, value: f64) -> Self {
        Self::new(condition, move |_, _| value)
    }
}

/// Dirichlet boundary segments, the first segment containing a cell sets its value
#[derive(Default)]
pub struct Bound {
    boundaries: Vec<Boundary>,
}
impl Bound {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn add(&mut self, boundary: Boundary) -> &mut Self {
        self.boundaries.push(boundary);
        self
    }
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
    pub fn value_at(&self, i: usize, j: usize) -> Option<f64> {
        self.boundaries
            .iter()
            .find(|b| (b.condition)(i, j))
            .map(|b| (b.value)(i, j))
    }
    /// Potential flow through a `l×l` channel split by a cross shaped wall at its center
    ///
    /// `i` is the row (y) and `j` the column (x). The potential is 14 along the inflow edges,
    /// 7 along the outflow edges and 0 on the cross and along the right half of the bottom edge,
    /// with linear ramps in between.
    pub fn channel(l: usize) -> Self {
        let half = l / 2;
        let quarter = l / 4;
        let three_quarter = 3 * l / 4;
        let per_cell = 1.0 / l as f64;
        let mut bound = Self::new();
        bound
            .add(Boundary::constant(
                move |i, j| i == half && (quarter..=three_quarter).contains(&j),
                0.0,
            ))
            .add(Boundary::constant(
                move |i, j| j == half && (quarter..=three_quarter).contains(&i),
                0.0,
            ))
            .add(Boundary::constant(move |i, j| i == 0 && j <= quarter, 14.0))
            .add(Boundary::new(
                move |i, j| i == 0 && j > quarter && j < half,
                move |_, j| 14.0 - (j as f64 - quarter as f64) * 56.0 * per_cell,
            ))
            .add(Boundary::constant(move |i, j| i == 0 && j >= half, 0.0))
            .add(Boundary::constant(move |i, _| i + 1 == l, 7.0))
            .add(Boundary::constant(move |i, j| j == 0 && i <= half, 14.0))
            .add(Boundary::new(
                move |i, j| j == 0 && i > half && i < three_quarter,
                move |i, _| 7.0 + (three_quarter as f64 - i as f64) * 28.0 * per_cell,
            ))
            .add(Boundary::constant(
                move |i, j| j == 0 && i >= three_quarter,
                7.0,
            ))
            .add(Boundary::constant(
                move |i, j| j + 1 == l && i <= half,
                0.0,
            ))
            .add(Boundary::new(
                move |i, j| j + 1 == l && i > half && i < three_quarter,
                move |i, _| (i as f64 - half as f64) * 28.0 * per_cell,
            ))
            .add(Boundary::constant(
                move |i, j| j + 1 == l && i >= three_quarter,
                7.0,
            ));
        bound
    }
}

/// Outcome of [Solver::solve]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Potential, indexed `(row, column)`
    pub phi: DMatrix<f64>,
    pub iterations: usize,
    /// Largest change of the last iteration
    pub residual: f64,
    pub converged: bool,
}

/// Jacobi iteration for the 2D Poisson equation on a unit spaced square grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solver {
    /// Iteration stops once no cell changes by more than `epsilon`
    pub epsilon: f64,
    pub max_iter: usize,
}
impl Default for Solver {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_iter: 100,
        }
    }
}
impl Solver {
    pub fn new(epsilon: f64, max_iter: usize) -> Self {
        Self { epsilon, max_iter }
    }
    /// Solves the Laplace equation `∇²φ = 0` on a `side×side` grid
    pub fn solve(&self, side: usize, bound: &Bound) -> Solution {
        self.solve_poisson(side, bound, |_, _| 0f64)
    }
    /// Solves `∇²φ = source` on a `side×side` grid
    ///
    /// Cells covered by `bound` are fixed. Outer cells no segment covers keep their initial
    /// value of 0, every other cell starts at 0 and is updated.
    pub fn solve_poisson(
        &self,
        side: usize,
        bound: &Bound,
        source: impl Fn(usize, usize) -> f64,
    ) -> Solution {
        let fixed = DMatrix::from_fn(side, side, |i, j| bound.value_at(i, j));
        let mut phi = fixed.map(|x| x.unwrap_or(0f64));
        let mut next = phi.clone();
        let inner = 1..side.saturating_sub(1);
        let mut residual = f64::INFINITY;
        let mut iterations = 0usize;
        while iterations < self.max_iter {
            for j in inner.clone() {
                for i in inner.clone() {
                    if fixed[(i, j)].is_none() {
                        let neighbors =
                            phi[(i - 1, j)] + phi[(i + 1, j)] + phi[(i, j - 1)] + phi[(i, j + 1)];
                        next[(i, j)] = 0.25 * (neighbors - source(i, j));
                    }
                }
            }
            residual = (&next - &phi).amax();
            std::mem::swap(&mut phi, &mut next);
            iterations += 1;
            if residual < self.epsilon {
                break;
            }
        }
        let converged = residual < self.epsilon;
        if converged {
            log::debug!("{side}x{side} solve converged in {iterations} iterations");
        } else {
            log::warn!(
                "{side}x{side} solve stopped after {iterations} iterations, residual {residual:e}"
            );
        }
        Solution {
            phi,
            iterations,
            residual,
            converged,
        }
    }
}

/// Partial derivatives `[∂φ/∂i, ∂φ/∂j]`
///
/// Central differences inside the grid, one sided differences on the edges.
pub fn gradient(phi: &DMatrix<f64>) -> [DMatrix<f64>; 2] {
    let (rows, cols) = phi.shape();
    let d_row = DMatrix::from_fn(rows, cols, |i, j| difference(rows, i, |k| phi[(k, j)]));
    let d_col = DMatrix::from_fn(rows, cols, |i, j| difference(cols, j, |k| phi[(i, k)]));
    [d_row, d_col]
}

fn difference(n: usize, k: usize, at: impl Fn(usize) -> f64) -> f64 {
    match k {
        _ if n < 2 => 0f64,
        0 => at(1) - at(0),
        k if k + 1 == n => at(k) - at(k - 1),
        k => 0.5 * (at(k + 1) - at(k - 1)),
    }
}

/// Velocities `(∂φ/∂j, -∂φ/∂i)` of a square potential, zero on the outer ring
pub fn velocities(phi: &DMatrix<f64>) -> VectorGrid {
    let side = phi.nrows().min(phi.ncols());
    let [d_row, d_col] = gradient(phi);
    VectorGrid::from_fn(side, |i, j| {
        if i == 0 || j == 0 || i + 1 == side || j + 1 == side {
            return Vector2::default();
        }
        let dy = d_row[(i, j)];
        Vector2::new(d_col[(i, j)], if dy != 0f64 { -dy } else { 0f64 })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(side: usize) -> impl Fn(usize, usize) -> bool {
        move |i, j| i == 0 || j == 0 || i + 1 == side || j + 1 == side
    }

    #[test]
    fn linear_potential_is_exact() {
        let mut bound = Bound::new();
        bound.add(Boundary::new(ring(6), |i, j| i as f64 + 2.0 * j as f64));
        let solution = Solver::new(1e-12, 10_000).solve(6, &bound);
        assert!(solution.converged);
        assert!(solution.iterations < 10_000);
        for i in 0..6 {
            for j in 0..6 {
                assert!((solution.phi[(i, j)] - (i as f64 + 2.0 * j as f64)).abs() < 1e-9);
            }
        }
        let grid = velocities(&solution.phi);
        assert_eq!(grid.get(0, 3), Some(Vector2::default()));
        let v = grid.get(2, 3).unwrap();
        assert!((v.dx - 2.0).abs() < 1e-9 && (v.dy + 1.0).abs() < 1e-9);
    }

    #[test]
    fn source_term_sign() {
        // ∇²(i² + j²) = 4
        let mut bound = Bound::new();
        bound.add(Boundary::new(ring(7), |i, j| (i * i + j * j) as f64));
        let solution = Solver::new(1e-12, 10_000).solve_poisson(7, &bound, |_, _| 4.0);
        assert!(solution.converged);
        assert!((solution.phi[(3, 2)] - 13.0).abs() < 1e-9);
    }

    #[test]
    fn channel_segments() {
        let bound = Bound::channel(12);
        assert_eq!(bound.len(), 12);
        assert_eq!(bound.value_at(0, 0), Some(14.0));
        assert!((bound.value_at(0, 4).unwrap() - (14.0 - 56.0 / 12.0)).abs() < 1e-12);
        assert_eq!(bound.value_at(0, 8), Some(0.0));
        assert_eq!(bound.value_at(11, 0), Some(7.0));
        assert!((bound.value_at(7, 0).unwrap() - (7.0 + 2.0 * 28.0 / 12.0)).abs() < 1e-12);
        assert!((bound.value_at(7, 11).unwrap() - 28.0 / 12.0).abs() < 1e-12);
        assert_eq!(bound.value_at(6, 4), Some(0.0));
        assert_eq!(bound.value_at(8, 6), Some(0.0));
        assert_eq!(bound.value_at(2, 2), None);
        assert_eq!(bound.value_at(6, 1), None);
    }

    #[test]
    fn channel_converges_and_keeps_boundaries() {
        let side = 12;
        let bound = Bound::channel(side);
        let solution = Solver::new(1e-6, 5_000).solve(side, &bound);
        assert!(solution.converged);
        assert!(solution.residual < 1e-6);
        assert!(solution.iterations > 1 && solution.iterations < 5_000);
        for i in 0..side {
            for j in 0..side {
                let phi = solution.phi[(i, j)];
                match bound.value_at(i, j) {
                    Some(value) => assert_eq!(phi, value, "({i}, {j})"),
                    None => assert!((0.0..=14.0).contains(&phi), "({i}, {j}): {phi}"),
                }
            }
        }
        let grid = velocities(&solution.phi);
        assert_eq!(grid.side(), side);
        assert!(grid.cells().iter().all(|v| v.dx.is_finite() && v.dy.is_finite()));
        assert!(grid.cells().iter().any(|v| v.magnitude() > 0.0));
    }

    #[test]
    fn stops_at_max_iter() {
        let solution = Solver::new(0.0, 3).solve(10, &Bound::channel(10));
        assert_eq!(solution.iterations, 3);
        assert!(!solution.converged);
        let solution = Solver::new(1e-6, 0).solve(10, &Bound::channel(10));
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.phi[(0, 0)], 14.0);
    }

    #[test]
    fn one_sided_gradient_on_edges() {
        let phi = DMatrix::from_fn(3, 4, |i, j| (i * i) as f64 + j as f64);
        let [d_row, d_col] = gradient(&phi);
        assert_eq!(d_row[(0, 1)], 1.0);
        assert_eq!(d_row[(1, 1)], 2.0);
        assert_eq!(d_row[(2, 1)], 3.0);
        assert!(d_col.iter().all(|&d| d == 1.0));
        let [d, _] = gradient(&DMatrix::from_element(1, 1, 5.0));
        assert_eq!(d[(0, 0)], 0.0);
    }
}
