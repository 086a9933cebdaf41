use super::{Error, Result};
use image::Rgba;

/// A color map sampled from evenly spaced RGB stops in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: String,
    pub stops: Vec<[f64; 3]>,
}
impl ColorMap {
    pub fn new(name: impl Into<String>, stops: Vec<[f64; 3]>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }
    /// Names accepted by [ColorMap::by_name]
    pub const NAMES: [&'static str; 4] = ["turbo", "viridis", "coolwarm", "blues"];
    /// Looks up one of the built-in color maps
    pub fn by_name(name: &str) -> Result<Self> {
        let stops = match name {
            "turbo" => turbo(),
            "viridis" => vec![
                [0.267, 0.004, 0.329],
                [0.282, 0.140, 0.457],
                [0.253, 0.265, 0.529],
                [0.206, 0.371, 0.553],
                [0.163, 0.471, 0.558],
                [0.127, 0.566, 0.550],
                [0.134, 0.658, 0.517],
                [0.266, 0.749, 0.440],
                [0.477, 0.821, 0.318],
                [0.741, 0.873, 0.150],
                [0.993, 0.906, 0.144],
            ],
            "coolwarm" => vec![
                [0.230, 0.299, 0.754],
                [0.552, 0.690, 0.996],
                [0.866, 0.866, 0.866],
                [0.956, 0.604, 0.486],
                [0.706, 0.016, 0.150],
            ],
            "blues" => vec![
                [0.969, 0.984, 1.000],
                [0.871, 0.922, 0.969],
                [0.776, 0.859, 0.937],
                [0.620, 0.792, 0.882],
                [0.419, 0.682, 0.839],
                [0.259, 0.573, 0.776],
                [0.129, 0.443, 0.710],
                [0.031, 0.318, 0.612],
                [0.031, 0.188, 0.420],
            ],
            _ => return Err(Error::ColorMap(name.to_string())),
        };
        Ok(Self::new(name, stops))
    }
    /// Samples the color map at `t`, clamped to `[0, 1]`
    pub fn sample(&self, t: f64) -> [f64; 3] {
        match self.stops.len() {
            0 => return [0f64; 3],
            1 => return self.stops[0],
            _ => (),
        }
        let t = t.clamp(0.0, 1.0);
        let n = self.stops.len() - 1;
        if t >= 1.0 {
            return self.stops[n];
        }
        let idx = ((t * n as f64).floor() as usize).min(n - 1);
        let frac = t * n as f64 - idx as f64;
        let (a, b) = (self.stops[idx], self.stops[idx + 1]);
        [0, 1, 2].map(|k| a[k] + (b[k] - a[k]) * frac)
    }
    /// Samples the color map as an 8-bit pixel, NaN is fully transparent
    pub fn rgba(&self, t: f64, alpha: f64) -> Rgba<u8> {
        if t.is_nan() {
            return Rgba([0, 0, 0, 0]);
        }
        let [r, g, b] = self.sample(t);
        Rgba([to_u8(r), to_u8(g), to_u8(b), to_u8(alpha)])
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

// polynomial fit of Google's Turbo
fn turbo() -> Vec<[f64; 3]> {
    const R: [f64; 6] = [
        0.13572138,
        4.61539260,
        -42.66032258,
        132.13108234,
        -152.94239396,
        59.28637943,
    ];
    const G: [f64; 6] = [
        0.09140261,
        2.19418839,
        4.84296658,
        -14.18503333,
        4.27729857,
        2.82956604,
    ];
    const B: [f64; 6] = [
        0.10667330,
        12.64194608,
        -60.58204836,
        110.36276771,
        -89.90310912,
        27.34824973,
    ];
    let horner = |c: &[f64; 6], t: f64| c.iter().rev().fold(0f64, |acc, &c| acc * t + c);
    (0..=32)
        .map(|k| k as f64 / 32.0)
        .map(|t| [R, G, B].map(|c| horner(&c, t).clamp(0.0, 1.0)))
        .collect()
}

/// Linear mapping of `[min, max]` onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub min: f64,
    pub max: f64,
}
impl Normalize {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
    /// Maps `x`; a degenerate range maps everything to 0
    pub fn apply(&self, x: f64) -> f64 {
        let span = self.max - self.min;
        if x.is_nan() {
            f64::NAN
        } else if span > 0.0 {
            (x - self.min) / span
        } else {
            0.0
        }
    }
}
impl Default for Normalize {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}
