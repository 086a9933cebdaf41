use super::{read_samples, Error, Result};
use std::path::Path;

/// A flow field sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub dx: f64,
    pub dy: f64,
}
impl Vector2 {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}
impl From<(f64, f64)> for Vector2 {
    fn from((dx, dy): (f64, f64)) -> Self {
        Self { dx, dy }
    }
}

/// What to do with samples that do not fit the largest square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReshapePolicy {
    /// Keep the leading `2S²` samples and drop the rest
    #[default]
    Truncate,
    /// Reject any input that is not exactly `2S²` samples
    Strict,
}

/// A square grid of vectors in row-major order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorGrid {
    side: usize,
    cells: Vec<Vector2>,
}
impl VectorGrid {
    /// Reshapes a flat `[dx, dy, dx, dy, ...]` sequence into a `S×S` grid
    ///
    /// `S = floor(sqrt(len / 2))`; pairs fill the rows left to right, one row after the other.
    pub fn from_samples(samples: &[f64], policy: ReshapePolicy) -> Result<Self> {
        let side = isqrt(samples.len() / 2);
        let used = 2 * side * side;
        if used != samples.len() {
            match policy {
                ReshapePolicy::Strict => {
                    return Err(Error::Shape {
                        samples: samples.len(),
                    })
                }
                ReshapePolicy::Truncate => log::warn!(
                    "{} samples do not form a square grid, dropping the last {}",
                    samples.len(),
                    samples.len() - used
                ),
            }
        }
        let cells = samples[..used]
            .chunks_exact(2)
            .map(|pair| Vector2::new(pair[0], pair[1]))
            .collect();
        Ok(Self { side, cells })
    }
    /// Builds a `side×side` grid from the vector at each row `i`, column `j`
    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize) -> Vector2) -> Self {
        let cells = (0..side * side).map(|k| f(k / side, k % side)).collect();
        Self { side, cells }
    }
    /// Side length
    pub fn side(&self) -> usize {
        self.side
    }
    pub fn is_empty(&self) -> bool {
        self.side == 0
    }
    /// Returns the vector at row `i`, column `j`
    pub fn get(&self, i: usize, j: usize) -> Option<Vector2> {
        (i < self.side && j < self.side).then(|| self.cells[i * self.side + j])
    }
    pub fn cells(&self) -> &[Vector2] {
        &self.cells
    }
    /// Iterates over the rows
    pub fn rows(&self) -> impl Iterator<Item = &[Vector2]> {
        self.cells.chunks_exact(self.side.max(1))
    }
    /// Flattens the grid back into the on-disk sample order
    pub fn to_samples(&self) -> Vec<f64> {
        self.cells.iter().flat_map(|v| [v.dx, v.dy]).collect()
    }
}

/// Interface to raw binary vector field dumps
pub trait FromBinary {
    fn from_bin<P: AsRef<Path>>(path: P, policy: ReshapePolicy) -> Result<Self>
    where
        Self: Sized;
}
impl FromBinary for VectorGrid {
    /// Loads a `.bin` dump into a grid
    fn from_bin<P: AsRef<Path>>(path: P, policy: ReshapePolicy) -> Result<Self> {
        let samples = read_samples(path)?;
        Self::from_samples(&samples, policy)
    }
}

// floating point sqrt is not exact past 2^52
fn isqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reshapes_four_vectors() {
        let samples = [1., 0., 0., 1., -1., 0., 0., -1.];
        let grid = VectorGrid::from_samples(&samples, ReshapePolicy::Strict).unwrap();
        assert_eq!(grid.side(), 2);
        let rows: Vec<Vec<(f64, f64)>> = grid
            .rows()
            .map(|row| row.iter().map(|v| (v.dx, v.dy)).collect())
            .collect();
        assert_eq!(
            rows,
            vec![vec![(1., 0.), (0., 1.)], vec![(-1., 0.), (0., -1.)]]
        );
    }

    #[test]
    fn truncates_to_largest_square() {
        // 11 samples: 5 pairs + 1, S = 2
        let samples: Vec<f64> = (0..11).map(f64::from).collect();
        let grid = VectorGrid::from_samples(&samples, ReshapePolicy::Truncate).unwrap();
        assert_eq!(grid.side(), 2);
        assert_eq!(grid.to_samples(), samples[..8].to_vec());
    }

    #[test]
    fn strict_rejects_imperfect_square() {
        let samples = vec![0f64; 10];
        let err = VectorGrid::from_samples(&samples, ReshapePolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::Shape { samples: 10 }));
        let odd = vec![0f64; 9];
        assert!(VectorGrid::from_samples(&odd, ReshapePolicy::Strict).is_err());
    }

    #[test]
    fn empty_input_is_empty_grid() {
        for policy in [ReshapePolicy::Strict, ReshapePolicy::Truncate] {
            let grid = VectorGrid::from_samples(&[], policy).unwrap();
            assert!(grid.is_empty());
            assert_eq!(grid.rows().count(), 0);
        }
    }

    #[test]
    fn out_of_range_get() {
        let grid = VectorGrid::from_samples(&[1., 2.], ReshapePolicy::Strict).unwrap();
        assert_eq!(grid.get(0, 0), Some(Vector2::new(1., 2.)));
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(1, 0), None);
    }

    #[test]
    fn from_fn_is_row_major() {
        let grid = VectorGrid::from_fn(3, |i, j| Vector2::new(i as f64, j as f64));
        assert_eq!(grid.side(), 3);
        assert_eq!(grid.get(2, 1), Some(Vector2::new(2., 1.)));
        assert_eq!(&grid.to_samples()[..6], &[0., 0., 0., 1., 0., 2.]);
        assert!(VectorGrid::from_fn(0, |_, _| Vector2::default()).is_empty());
    }

    #[test]
    fn integer_square_root() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt((1 << 53) + 1), 94_906_265);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velocity.bin");
        crate::write_samples(&path, &[3., 4., 0., 0., 1., 1., 2., 2.]).unwrap();
        let grid = VectorGrid::from_bin(&path, ReshapePolicy::Strict).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().magnitude(), 5.);
        assert_eq!(grid.get(1, 1), Some(Vector2::from((2., 2.))));
    }

    proptest! {
        #[test]
        fn pair_index_matches_row_major_layout(k in 1usize..12, seed in any::<u64>()) {
            let samples: Vec<f64> = (0..2 * k * k)
                .map(|n| (seed.wrapping_mul(n as u64 + 1) % 10_007) as f64 - 5000.)
                .collect();
            let grid = VectorGrid::from_samples(&samples, ReshapePolicy::Strict).unwrap();
            prop_assert_eq!(grid.side(), k);
            for i in 0..k {
                for j in 0..k {
                    let v = grid.get(i, j).unwrap();
                    prop_assert_eq!(v.dx, samples[2 * (i * k + j)]);
                    prop_assert_eq!(v.dy, samples[2 * (i * k + j) + 1]);
                }
            }
        }

        #[test]
        fn truncation_keeps_prefix(k in 0usize..8, extra in 0usize..40) {
            let n = 2 * k * k + extra;
            let samples: Vec<f64> = (0..n).map(|x| x as f64).collect();
            let grid = VectorGrid::from_samples(&samples, ReshapePolicy::Truncate).unwrap();
            let s = grid.side();
            prop_assert!(2 * s * s <= n);
            prop_assert!(2 * (s + 1) * (s + 1) > n);
            prop_assert_eq!(grid.to_samples(), samples[..2 * s * s].to_vec());
        }
    }
}
