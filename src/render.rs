use super::{
    raster::BLACK, stream::bilinear, Canvas, ColorMap, Error, FlowField, Normalize, PlotOptions,
    Result, Streamlines,
};
use std::path::{Path, PathBuf};

// Figure fractions of the axes and of the color bar
const AXES_LEFT: f64 = 0.125;
const AXES_RIGHT: f64 = 0.775;
const AXES_BOTTOM: f64 = 0.11;
const AXES_TOP: f64 = 0.88;
const BAR_LEFT: f64 = 0.8;
const BAR_RIGHT: f64 = 0.83;
// in points
const TICK_LENGTH: f64 = 3.5;
const FRAME_WIDTH: f64 = 1.0;
const N_TICK: usize = 5;

/// Vector field visualizations
pub trait Renderer {
    /// Draws the streamlines of the field, colored by magnitude
    fn stream_plot(&self, field: &FlowField, path: &Path) -> Result<()>;
    /// Draws the magnitude of the field as a heatmap
    fn magnitude_plot(&self, field: &FlowField, path: &Path) -> Result<()>;
    /// Image file extension
    fn extension(&self) -> &str;
    /// Writes both plots as `<base>_stream.<ext>` and `<base>_magnitude.<ext>`
    fn render(&self, field: &FlowField, base: &Path) -> Result<[PathBuf; 2]> {
        let stream = suffixed(base, "stream", self.extension());
        self.stream_plot(field, &stream)?;
        let magnitude = suffixed(base, "magnitude", self.extension());
        self.magnitude_plot(field, &magnitude)?;
        Ok([stream, magnitude])
    }
}

fn suffixed(base: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("_{suffix}.{extension}"));
    PathBuf::from(name)
}

/// Software renderer into `image` buffers
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    options: PlotOptions,
    color_map: ColorMap,
}
impl RasterRenderer {
    pub fn new(options: PlotOptions) -> Result<Self> {
        options.validate()?;
        let color_map = ColorMap::by_name(&options.color_map)?;
        Ok(Self { options, color_map })
    }
    pub fn options(&self) -> &PlotOptions {
        &self.options
    }
    /// Blank figure with the axes geometry and the magnitude normalization
    fn figure(&self, field: &FlowField) -> Result<(Canvas, Axes, Normalize)> {
        let side = field.side();
        if side < 2 {
            return Err(Error::Shape {
                samples: 2 * side * side,
            });
        }
        let (width, height) = self.options.pixel_size()?;
        let (w, h) = (width as f64, height as f64);
        let axes = Axes {
            left: AXES_LEFT * w,
            right: AXES_RIGHT * w,
            top: (1.0 - AXES_TOP) * h,
            bottom: (1.0 - AXES_BOTTOM) * h,
            extent: (side - 1) as f64,
        };
        let norm = field
            .magnitude_range()
            .map(|(min, max)| Normalize::new(min, max))
            .unwrap_or_default();
        Ok((Canvas::new(width, height), axes, norm))
    }
    /// Axes frame, ticks and color bar drawn over the plot content
    fn decorate(&self, canvas: &mut Canvas, axes: &Axes) {
        let ppp = self.options.pixels_per_point();
        let stroke = FRAME_WIDTH * ppp;
        let tick = TICK_LENGTH * ppp;
        canvas.rect_outline(axes.left, axes.top, axes.right, axes.bottom, stroke, BLACK);
        for k in 0..N_TICK {
            let t = k as f64 / (N_TICK - 1) as f64;
            let x = axes.left + t * axes.width();
            canvas.line([x, axes.bottom], [x, axes.bottom + tick], stroke, BLACK);
            let y = axes.bottom - t * axes.height();
            canvas.line([axes.left - tick, y], [axes.left, y], stroke, BLACK);
        }

        let w = canvas.width() as f64;
        let (left, right) = (BAR_LEFT * w, BAR_RIGHT * w);
        let y0 = axes.top.round() as i64;
        let y1 = axes.bottom.round() as i64;
        for y in y0..y1 {
            let t = (axes.bottom - (y as f64 + 0.5)) / axes.height();
            let color = self.color_map.rgba(t, 1.0);
            canvas.fill_rect(left, y as f64, right, (y + 1) as f64, color);
        }
        canvas.rect_outline(left, axes.top, right, axes.bottom, stroke, BLACK);
        for k in 0..N_TICK {
            let y = axes.bottom - k as f64 / (N_TICK - 1) as f64 * axes.height();
            canvas.line([right, y], [right + tick, y], stroke, BLACK);
        }
    }
}

impl Renderer for RasterRenderer {
    fn stream_plot(&self, field: &FlowField, path: &Path) -> Result<()> {
        let (mut canvas, axes, norm) = self.figure(field)?;
        let ppp = self.options.pixels_per_point();
        let masked = field.masked(&self.options.mask_options());
        let lines = masked.streamlines(&self.options.stream_options());
        let width = self.options.linewidth * ppp;
        let head = 3.5 * self.options.arrowsize * ppp;
        for line in &lines {
            for (a, b) in line.segments() {
                let mid = [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])];
                let t = norm.apply(bilinear(&field.magnitude, mid));
                if t.is_nan() {
                    continue;
                }
                let color = self.color_map.rgba(t, 1.0);
                canvas.line(axes.to_pixel(a), axes.to_pixel(b), width, color);
            }
            if let Some((anchor, heading)) = line.midpoint_direction() {
                let t = norm.apply(bilinear(&field.magnitude, anchor));
                let color = self.color_map.rgba(t, 1.0);
                let [tip, left, right] = arrow_head(axes.to_pixel(anchor), axes.heading(heading), head);
                canvas.triangle(tip, left, right, color);
            }
        }
        self.decorate(&mut canvas, &axes);
        log::info!("{:?}: {} streamlines", path, lines.len());
        canvas.save(path)
    }

    fn magnitude_plot(&self, field: &FlowField, path: &Path) -> Result<()> {
        let (mut canvas, axes, norm) = self.figure(field)?;
        let side = field.side();
        let x0 = axes.left.round() as i64;
        let x1 = axes.right.round() as i64;
        let y0 = axes.top.round() as i64;
        let y1 = axes.bottom.round() as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                let [x, y] = axes.to_grid([px as f64 + 0.5, py as f64 + 0.5]);
                let j = (x.round().max(0.0) as usize).min(side - 1);
                let i = (y.round().max(0.0) as usize).min(side - 1);
                let color = self
                    .color_map
                    .rgba(norm.apply(field.magnitude[(i, j)]), self.options.alpha);
                canvas.blend(px, py, color, 1.0);
            }
        }
        self.decorate(&mut canvas, &axes);
        log::info!("{:?}: {side}x{side} magnitude", path);
        canvas.save(path)
    }

    fn extension(&self) -> &str {
        &self.options.format
    }
}

/// Pixel geometry of the plot area; grid `y` grows upwards, pixel `y` downwards
#[derive(Debug, Clone, Copy)]
struct Axes {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    extent: f64,
}
impl Axes {
    fn width(&self) -> f64 {
        self.right - self.left
    }
    fn height(&self) -> f64 {
        self.bottom - self.top
    }
    fn to_pixel(&self, p: [f64; 2]) -> [f64; 2] {
        [
            self.left + p[0] / self.extent * self.width(),
            self.bottom - p[1] / self.extent * self.height(),
        ]
    }
    fn to_grid(&self, p: [f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.left) / self.width() * self.extent,
            (self.bottom - p[1]) / self.height() * self.extent,
        ]
    }
    /// Grid heading to a unit pixel heading
    fn heading(&self, d: [f64; 2]) -> [f64; 2] {
        let h = [d[0] * self.width(), -d[1] * self.height()];
        let norm = h[0].hypot(h[1]);
        [h[0] / norm, h[1] / norm]
    }
}

/// Tip and base corners of an arrow head centered on `anchor`
fn arrow_head(anchor: [f64; 2], heading: [f64; 2], length: f64) -> [[f64; 2]; 3] {
    let normal = [-heading[1], heading[0]];
    let half = 0.5 * length;
    let spread = 0.3 * length;
    let tip = [anchor[0] + half * heading[0], anchor[1] + half * heading[1]];
    let base = [anchor[0] - half * heading[0], anchor[1] - half * heading[1]];
    [
        tip,
        [base[0] + spread * normal[0], base[1] + spread * normal[1]],
        [base[0] - spread * normal[0], base[1] - spread * normal[1]],
    ]
}
