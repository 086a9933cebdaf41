mod loader;
pub use loader::{read_samples, samples_from_bytes, write_samples, write_text};
mod grid;
pub use grid::{FromBinary, ReshapePolicy, Vector2, VectorGrid};
mod field;
pub use field::{FlowField, MaskOptions};
mod colormap;
pub use colormap::{ColorMap, Normalize};
mod stream;
pub use stream::{StreamOptions, Streamline, Streamlines, MAX_DENSITY};
mod raster;
pub use raster::Canvas;
mod render;
pub use render::{RasterRenderer, Renderer};
mod solver;
pub use solver::{gradient, velocities, Bound, Boundary, Solution, Solver};
mod config;
pub use config::{PlotOptions, MAX_PIXELS};
pub mod batch;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read or write vector field data")]
    Read(#[from] std::io::Error),
    #[error("byte length {0} is not a multiple of 8")]
    Decode(usize),
    #[error("{samples} samples do not form a square grid of 2-component vectors")]
    Shape { samples: usize },
    #[error("unknown color map: {0}")]
    ColorMap(String),
    #[error("invalid plot options: {0}")]
    Options(String),
    #[error("failed to parse plot options")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode image")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
