use super::{ColorMap, Error, MaskOptions, Result, StreamOptions, MAX_DENSITY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the renderer can write
pub const FORMATS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];
/// Largest figure area in pixels
pub const MAX_PIXELS: u64 = 1 << 27;

/// Plot rendering options
///
/// Missing fields take their default value when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Vectors with a smaller magnitude are not traced
    pub threshold: f64,
    /// Leaves the outer ring of cells out of the stream plot
    pub remove_border: bool,
    /// Leaves cells with a zero component out of the stream plot
    pub remove_zeros: bool,
    /// Streamline density
    pub density: f64,
    /// Streamline width in points
    pub linewidth: f64,
    /// Arrow head scale
    pub arrowsize: f64,
    /// Heatmap opacity
    pub alpha: f64,
    pub color_map: String,
    /// Figure width and height in inches
    pub size: (f64, f64),
    pub dpi: u32,
    /// Image file extension
    pub format: String,
}
impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-3,
            remove_border: true,
            remove_zeros: true,
            density: 1.7,
            linewidth: 1.2,
            arrowsize: 1.5,
            alpha: 0.9,
            color_map: "turbo".into(),
            size: (8.0, 6.0),
            dpi: 200,
            format: "png".into(),
        }
    }
}
impl PlotOptions {
    /// Loads options from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let options: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        options.validate()?;
        Ok(options)
    }
    /// Checks that every option is in range
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("density", self.density),
            ("linewidth", self.linewidth),
            ("arrowsize", self.arrowsize),
            ("width", self.size.0),
            ("height", self.size.1),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, x)| !(*x > 0.0 && x.is_finite())) {
            return Err(Error::Options(format!("{name} must be positive, got {value}")));
        }
        if self.density > MAX_DENSITY {
            return Err(Error::Options(format!(
                "density must not exceed {MAX_DENSITY}, got {}",
                self.density
            )));
        }
        if self.dpi == 0 {
            return Err(Error::Options("dpi must be positive".into()));
        }
        self.pixel_size()?;
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::Options(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.threshold >= 0.0) {
            return Err(Error::Options(format!(
                "threshold must not be negative, got {}",
                self.threshold
            )));
        }
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(Error::Options(format!(
                "unsupported image format {:?}, expected one of {FORMATS:?}",
                self.format
            )));
        }
        ColorMap::by_name(&self.color_map)?;
        Ok(())
    }
    /// Figure size in pixels, at most [MAX_PIXELS] in area
    pub fn pixel_size(&self) -> Result<(u32, u32)> {
        let dpi = self.dpi as f64;
        let to_pixels = |inches: f64| {
            let pixels = (inches * dpi).round();
            if pixels.is_finite() && pixels >= 1.0 && pixels <= u32::MAX as f64 {
                Ok(pixels as u32)
            } else {
                Err(Error::Options(format!(
                    "figure size of {inches} in at {} dpi is not a valid pixel size",
                    self.dpi
                )))
            }
        };
        let (width, height) = (to_pixels(self.size.0)?, to_pixels(self.size.1)?);
        if width as u64 * height as u64 > MAX_PIXELS {
            return Err(Error::Options(format!(
                "{width}x{height} figure exceeds {MAX_PIXELS} pixels"
            )));
        }
        Ok((width, height))
    }
    /// Pixels per typographic point
    pub fn pixels_per_point(&self) -> f64 {
        self.dpi as f64 / 72.0
    }
    pub fn mask_options(&self) -> MaskOptions {
        MaskOptions {
            threshold: self.threshold,
            remove_border: self.remove_border,
            remove_zeros: self.remove_zeros,
        }
    }
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            density: self.density,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = PlotOptions::default();
        options.validate().unwrap();
        assert_eq!(options.pixel_size().unwrap(), (1600, 1200));
        assert_eq!(options.mask_options(), MaskOptions::default());
        assert_eq!(options.stream_options().density, 1.7);
        assert_eq!(StreamOptions::default().density, options.density);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: PlotOptions =
            serde_json::from_str(r#"{"dpi": 50, "color_map": "viridis", "size": [4, 3]}"#)
                .unwrap();
        assert_eq!(options.dpi, 50);
        assert_eq!(options.color_map, "viridis");
        assert_eq!(options.pixel_size().unwrap(), (200, 150));
        assert_eq!(options.density, 1.7);
        assert!(options.remove_border);
    }

    #[test]
    fn rejects_out_of_range() {
        let cases = [
            PlotOptions {
                density: 0.0,
                ..Default::default()
            },
            PlotOptions {
                alpha: 1.5,
                ..Default::default()
            },
            PlotOptions {
                threshold: -1.0,
                ..Default::default()
            },
            PlotOptions {
                dpi: 0,
                ..Default::default()
            },
            PlotOptions {
                format: "svg".into(),
                ..Default::default()
            },
            PlotOptions {
                size: (1e7, 1e7),
                dpi: 1000,
                ..Default::default()
            },
            PlotOptions {
                size: (100.0, 100.0),
                dpi: 1000,
                ..Default::default()
            },
            PlotOptions {
                size: (1e-4, 6.0),
                ..Default::default()
            },
            PlotOptions {
                density: 1e6,
                ..Default::default()
            },
        ];
        for options in cases {
            assert!(
                matches!(options.validate(), Err(Error::Options(_))),
                "{options:?}"
            );
        }
        let options = PlotOptions {
            color_map: "jet".into(),
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::ColorMap(_))));
    }

    #[test]
    fn oversized_figure_is_an_error() {
        let options = PlotOptions {
            size: (1e7, 1e7),
            dpi: 1000,
            ..Default::default()
        };
        assert!(matches!(options.pixel_size(), Err(Error::Options(_))));
        assert!(matches!(
            crate::RasterRenderer::new(options),
            Err(Error::Options(_))
        ));
        let options = PlotOptions {
            density: MAX_DENSITY,
            ..Default::default()
        };
        options.validate().unwrap();
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.json");
        std::fs::write(&path, r#"{"threshold": 0.5, "remove_zeros": false}"#).unwrap();
        let options = PlotOptions::from_json_file(&path).unwrap();
        assert_eq!(options.threshold, 0.5);
        assert!(!options.remove_zeros);

        std::fs::write(&path, r#"{"threshold": "high"}"#).unwrap();
        assert!(matches!(
            PlotOptions::from_json_file(&path),
            Err(Error::Json(_))
        ));
    }
}
