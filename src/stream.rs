use super::FlowField;
use nalgebra::DMatrix;

/// Largest streamline density, [Streamlines::streamlines] clamps to it
pub const MAX_DENSITY: f64 = 20.0;

/// Streamline tracing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    /// Line closeness, the occupancy mask has `30 × density` cells per side
    pub density: f64,
    /// Shortest kept streamline, as a fraction of the domain width
    pub min_length: f64,
    /// Longest streamline in each direction from its seed, as a fraction of the domain width
    pub max_length: f64,
}
impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            density: 1.7,
            min_length: 0.1,
            max_length: 4.0,
        }
    }
}

/// A traced streamline in grid coordinates (`x` = column, `y` = row)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Streamline {
    pub points: Vec<[f64; 2]>,
}
impl Streamline {
    /// Arc length in grid units
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| distance(a, b)).sum()
    }
    /// Consecutive point pairs
    pub fn segments(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
    /// Returns the point at half arc length and the unit heading of the line there
    pub fn midpoint_direction(&self) -> Option<([f64; 2], [f64; 2])> {
        let half = 0.5 * self.length();
        let mut acc = 0f64;
        for (a, b) in self.segments() {
            let d = distance(a, b);
            if acc + d >= half && d > 0f64 {
                let t = (half - acc) / d;
                let anchor = [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])];
                return Some((anchor, [(b[0] - a[0]) / d, (b[1] - a[1]) / d]));
            }
            acc += d;
        }
        None
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Streamline integration
pub trait Streamlines {
    /// Traces streamlines through the field
    ///
    /// Integration stops at NaN or zero velocities, so masked cells are never crossed.
    fn streamlines(&self, options: &StreamOptions) -> Vec<Streamline>;
}
impl Streamlines for FlowField {
    fn streamlines(&self, options: &StreamOptions) -> Vec<Streamline> {
        let side = self.side();
        if side < 2 {
            return Vec::new();
        }
        let density = options.density.min(MAX_DENSITY);
        let n = ((30.0 * density).round() as usize).max(2);
        let tracer = Tracer::new(self, n, options);
        let mut occupancy = Occupancy::new(n);
        let mut lines = Vec::new();
        for cell in spiral(n) {
            if occupancy.is_occupied(cell) {
                continue;
            }
            let seed = tracer.seed_point(cell);
            occupancy.start(cell);
            let (forward, forward_length) = tracer.integrate(seed, 1f64, &mut occupancy);
            occupancy.reset(cell);
            let (backward, backward_length) = tracer.integrate(seed, -1f64, &mut occupancy);
            let total = (forward_length + backward_length) / (side - 1) as f64;
            if total > 0f64 && total >= options.min_length {
                occupancy.commit();
                let points = backward
                    .into_iter()
                    .rev()
                    .chain(forward.into_iter().skip(1))
                    .collect();
                lines.push(Streamline { points });
            } else {
                occupancy.undo();
            }
        }
        log::debug!("{} streamlines on a {n}x{n} mask", lines.len());
        lines
    }
}

struct Tracer<'a> {
    u: &'a DMatrix<f64>,
    v: &'a DMatrix<f64>,
    // grid units to mask units
    scale: f64,
    extent: f64,
    step: f64,
    max_length: f64,
}
impl<'a> Tracer<'a> {
    fn new(field: &'a FlowField, n: usize, options: &StreamOptions) -> Self {
        let extent = (field.side() - 1) as f64;
        let scale = (n - 1) as f64 / extent;
        Self {
            u: &field.u,
            v: &field.v,
            scale,
            extent,
            step: 0.25 * scale.recip().min(1f64),
            max_length: options.max_length * extent,
        }
    }
    fn seed_point(&self, (xm, ym): (usize, usize)) -> [f64; 2] {
        [xm, ym].map(|k| (k as f64 / self.scale).min(self.extent))
    }
    fn to_mask(&self, p: [f64; 2]) -> (usize, usize) {
        (
            (p[0] * self.scale).round() as usize,
            (p[1] * self.scale).round() as usize,
        )
    }
    fn contains(&self, p: [f64; 2]) -> bool {
        (0f64..=self.extent).contains(&p[0]) && (0f64..=self.extent).contains(&p[1])
    }
    /// Unit velocity at `p`, `None` where the field is masked or stagnant
    fn direction(&self, p: [f64; 2], sign: f64) -> Option<[f64; 2]> {
        let u = bilinear(self.u, p);
        let v = bilinear(self.v, p);
        let speed = u.hypot(v);
        (speed.is_finite() && speed > 0f64).then(|| [sign * u / speed, sign * v / speed])
    }
    /// Midpoint rule integration from `seed` until the line leaves the domain, stalls or
    /// collides with another line
    fn integrate(
        &self,
        seed: [f64; 2],
        sign: f64,
        occupancy: &mut Occupancy,
    ) -> (Vec<[f64; 2]>, f64) {
        let h = self.step;
        let mut points = vec![seed];
        let mut p = seed;
        let mut length = 0f64;
        while length + h <= self.max_length {
            let Some(k1) = self.direction(p, sign) else {
                break;
            };
            let mid = [p[0] + 0.5 * h * k1[0], p[1] + 0.5 * h * k1[1]];
            if !self.contains(mid) {
                break;
            }
            let Some(k2) = self.direction(mid, sign) else {
                break;
            };
            let next = [p[0] + h * k2[0], p[1] + h * k2[1]];
            if !self.contains(next) || !occupancy.update(self.to_mask(next)) {
                break;
            }
            points.push(next);
            p = next;
            length += h;
        }
        (points, length)
    }
}

/// Bilinear interpolation at `p = [x, y]`; any NaN corner makes the result NaN
pub(crate) fn bilinear(m: &DMatrix<f64>, p: [f64; 2]) -> f64 {
    let n = m.ncols();
    let (x, y) = (p[0], p[1]);
    let j = (x.floor() as usize).min(n - 2);
    let i = (y.floor() as usize).min(n - 2);
    let (tx, ty) = (x - j as f64, y - i as f64);
    let bottom = m[(i, j)] * (1f64 - tx) + m[(i, j + 1)] * tx;
    let top = m[(i + 1, j)] * (1f64 - tx) + m[(i + 1, j + 1)] * tx;
    bottom * (1f64 - ty) + top * ty
}

/// Mask cells claimed by streamlines
struct Occupancy {
    n: usize,
    cells: Vec<bool>,
    current: (usize, usize),
    // cells claimed by the trajectory in progress
    trail: Vec<usize>,
}
impl Occupancy {
    fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![false; n * n],
            current: (0, 0),
            trail: Vec::new(),
        }
    }
    fn index(&self, (x, y): (usize, usize)) -> usize {
        y * self.n + x
    }
    fn is_occupied(&self, cell: (usize, usize)) -> bool {
        self.cells[self.index(cell)]
    }
    fn claim(&mut self, cell: (usize, usize)) {
        let k = self.index(cell);
        self.cells[k] = true;
        self.trail.push(k);
        self.current = cell;
    }
    fn start(&mut self, cell: (usize, usize)) {
        self.trail.clear();
        self.claim(cell);
    }
    fn reset(&mut self, cell: (usize, usize)) {
        self.current = cell;
    }
    /// Moves the trajectory into `cell`, returns false on collision
    fn update(&mut self, cell: (usize, usize)) -> bool {
        if cell == self.current {
            return true;
        }
        if self.is_occupied(cell) {
            return false;
        }
        self.claim(cell);
        true
    }
    fn commit(&mut self) {
        self.trail.clear();
    }
    fn undo(&mut self) {
        for k in self.trail.drain(..) {
            self.cells[k] = false;
        }
    }
}

/// Mask cells from the outer ring inwards
fn spiral(n: usize) -> impl Iterator<Item = (usize, usize)> {
    let (mut x, mut y) = (0isize, 0isize);
    let (mut x_first, mut y_first) = (0isize, 1isize);
    let (mut x_last, mut y_last) = (n as isize - 1, n as isize - 1);
    let mut heading = 0u8;
    (0..n * n).map(move |_| {
        let cell = (x as usize, y as usize);
        match heading {
            0 => {
                x += 1;
                if x >= x_last {
                    x_last -= 1;
                    heading = 1;
                }
            }
            1 => {
                y += 1;
                if y >= y_last {
                    y_last -= 1;
                    heading = 2;
                }
            }
            2 => {
                x -= 1;
                if x <= x_first {
                    x_first += 1;
                    heading = 3;
                }
            }
            _ => {
                y -= 1;
                if y <= y_first {
                    y_first += 1;
                    heading = 0;
                }
            }
        }
        cell
    })
}
