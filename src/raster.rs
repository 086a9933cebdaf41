use super::Result;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::Path;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// An RGBA drawing surface
///
/// Coordinates are in pixels with the origin at the top left corner; pixel `(x, y)` covers
/// `[x, x + 1) × [y, y + 1)`.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}
impl Canvas {
    /// Creates a white canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, WHITE),
        }
    }
    pub fn width(&self) -> u32 {
        self.image.width()
    }
    pub fn height(&self) -> u32 {
        self.image.height()
    }
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
    /// Composites `color` over pixel `(x, y)` with its alpha scaled by `coverage`
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f64) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let a = coverage.clamp(0.0, 1.0) * color[3] as f64 / 255.0;
        if a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        for k in 0..3 {
            dst[k] = (color[k] as f64 * a + dst[k] as f64 * (1.0 - a)).round() as u8;
        }
        dst[3] = (255.0 * a + dst[3] as f64 * (1.0 - a)).round() as u8;
    }
    /// Fills the pixels whose centers fall inside `[x0, x1) × [y0, y1)`
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
        let (i0, i1) = (pixel_span(x0), pixel_span(x1));
        let (j0, j1) = (pixel_span(y0), pixel_span(y1));
        for y in j0..j1 {
            for x in i0..i1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }
    /// Outlines a rectangle with a stroke of `width` pixels centered on its edges
    pub fn rect_outline(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgba<u8>) {
        self.line([x0, y0], [x1, y0], width, color);
        self.line([x1, y0], [x1, y1], width, color);
        self.line([x1, y1], [x0, y1], width, color);
        self.line([x0, y1], [x0, y0], width, color);
    }
    /// Draws an anti-aliased segment with round caps
    pub fn line(&mut self, a: [f64; 2], b: [f64; 2], width: f64, color: Rgba<u8>) {
        let hw = 0.5 * width;
        let pad = hw + 1.0;
        let x_min = (a[0].min(b[0]) - pad).floor() as i64;
        let x_max = (a[0].max(b[0]) + pad).ceil() as i64;
        let y_min = (a[1].min(b[1]) - pad).floor() as i64;
        let y_max = (a[1].max(b[1]) + pad).ceil() as i64;
        for y in y_min.max(0)..=y_max.min(self.height() as i64 - 1) {
            for x in x_min.max(0)..=x_max.min(self.width() as i64 - 1) {
                let d = segment_distance([x as f64 + 0.5, y as f64 + 0.5], a, b);
                let coverage = if hw < 0.5 {
                    // hairlines fade rather than thin out
                    (1.0 - d).clamp(0.0, 1.0) * 2.0 * hw
                } else {
                    (hw + 0.5 - d).clamp(0.0, 1.0)
                };
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }
    /// Fills a triangle, edges are anti-aliased by 4× supersampling
    pub fn triangle(&mut self, a: [f64; 2], b: [f64; 2], c: [f64; 2], color: Rgba<u8>) {
        const OFFSETS: [[f64; 2]; 4] = [[0.25, 0.25], [0.75, 0.25], [0.25, 0.75], [0.75, 0.75]];
        let area = edge(a, b, c);
        if area == 0.0 {
            return;
        }
        let x_min = a[0].min(b[0]).min(c[0]).floor() as i64;
        let x_max = a[0].max(b[0]).max(c[0]).ceil() as i64;
        let y_min = a[1].min(b[1]).min(c[1]).floor() as i64;
        let y_max = a[1].max(b[1]).max(c[1]).ceil() as i64;
        for y in y_min.max(0)..=y_max.min(self.height() as i64 - 1) {
            for x in x_min.max(0)..=x_max.min(self.width() as i64 - 1) {
                let inside = OFFSETS
                    .iter()
                    .map(|o| [x as f64 + o[0], y as f64 + o[1]])
                    .filter(|&p| {
                        let w = [edge(b, c, p), edge(c, a, p), edge(a, b, p)];
                        w.iter().all(|&w| w * area >= 0.0)
                    })
                    .count();
                if inside > 0 {
                    self.blend(x, y, color, inside as f64 / OFFSETS.len() as f64);
                }
            }
        }
    }
    /// Encodes the canvas, the format follows the file extension
    ///
    /// Formats without an alpha channel get the canvas flattened to RGB.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)?;
        match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(self.image.clone())
                .to_rgb8()
                .save_with_format(path, format)?,
            _ => self.image.save_with_format(path, format)?,
        }
        log::debug!("{:?}: {}x{}", path, self.width(), self.height());
        Ok(())
    }
}

fn pixel_span(x: f64) -> i64 {
    (x - 0.5).ceil() as i64
}

fn edge(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

fn segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (ap[0] - t * ab[0]).hypot(ap[1] - t * ab[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn starts_white() {
        let canvas = Canvas::new(3, 2);
        assert_eq!((canvas.width(), canvas.height()), (3, 2));
        assert!(canvas.into_image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn blend_half_coverage() {
        let mut canvas = Canvas::new(2, 2);
        canvas.blend(0, 0, BLACK, 0.5);
        assert_eq!(canvas.pixel(0, 0), Rgba([128, 128, 128, 255]));
        canvas.blend(-1, 5, BLACK, 1.0);
        assert_eq!(canvas.pixel(1, 1), WHITE);
    }

    #[test]
    fn fill_rect_by_pixel_centers() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(1.0, 1.0, 3.0, 2.0, RED);
        assert_eq!(canvas.pixel(1, 1), RED);
        assert_eq!(canvas.pixel(2, 1), RED);
        assert_eq!(canvas.pixel(1, 2), WHITE);
        assert_eq!(canvas.pixel(0, 1), WHITE);
    }

    #[test]
    fn thick_line_covers_its_axis() {
        let mut canvas = Canvas::new(10, 10);
        canvas.line([1.0, 5.0], [9.0, 5.0], 3.0, RED);
        for x in 1..9 {
            assert_eq!(canvas.pixel(x, 5), RED, "x = {x}");
            assert_eq!(canvas.pixel(x, 4), RED, "x = {x}");
        }
        assert_eq!(canvas.pixel(5, 0), WHITE);
        assert_eq!(canvas.pixel(5, 9), WHITE);
    }

    #[test]
    fn triangle_fills_interior_only() {
        let mut canvas = Canvas::new(10, 10);
        canvas.triangle([0.0, 0.0], [10.0, 0.0], [0.0, 10.0], RED);
        assert_eq!(canvas.pixel(1, 1), RED);
        assert_eq!(canvas.pixel(8, 8), WHITE);
        // winding order does not matter
        let mut canvas = Canvas::new(10, 10);
        canvas.triangle([0.0, 0.0], [0.0, 10.0], [10.0, 0.0], RED);
        assert_eq!(canvas.pixel(1, 1), RED);
    }

    #[test]
    fn saves_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut canvas = Canvas::new(5, 4);
        canvas.fill_rect(0.0, 0.0, 5.0, 4.0, RED);
        for name in ["a.png", "a.jpg", "a.bmp"] {
            let path = dir.path().join(name);
            canvas.save(&path).unwrap();
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (5, 4));
        }
        assert!(canvas.save(dir.path().join("a.unknown")).is_err());
    }
}
