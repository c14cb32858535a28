//! Residual field visualization.
//!
//! Renders |f(x, y)| over a rectangle as concentric grey rings and saves it as an image.
//! Handy for eyeballing a least-squares landscape before picking a starting point:
//! the turquoise regions are where the residual nearly vanishes.

use std::io;
use std::path::Path;

use crate::{BivariateFunction, Interval};

/// Residual magnitude below this is drawn as turquoise (zero/satisfied).
const ZERO_RESIDUAL_THRESHOLD: f64 = 0.08;

/// Turquoise color for the zero-residual locus (R, G, B).
const TURQUOISE: [u8; 3] = [64, 224, 208];

/// Where the function couldn't be evaluated.
const UNDEFINED: [u8; 3] = [128, 0, 0];

/// The part of the plane to render, and the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Horizontal extent.
    pub x: Interval,
    /// Vertical extent. Larger y is drawn nearer the top.
    pub y: Interval,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Plane coordinates of the center of pixel (px, py).
    fn point(&self, px: u32, py: u32) -> (f64, f64) {
        let x = self.x.lo() + self.x.length() * (f64::from(px) + 0.5) / f64::from(self.width);
        let y = self.y.hi() - self.y.length() * (f64::from(py) + 0.5) / f64::from(self.height);
        (x, y)
    }
}

/// Render |f| over the viewport. Each unit of residual is one grey ring.
pub fn render_field_to_image<F>(f: &F, viewport: Viewport) -> image::RgbImage
where
    F: BivariateFunction + ?Sized,
{
    let ring_scale = 1.0_f64;
    let mut buf = image::RgbImage::new(viewport.width, viewport.height);
    for py in 0..viewport.height {
        for px in 0..viewport.width {
            let (x, y) = viewport.point(px, py);
            let pixel = match f.eval(x, y) {
                Ok(value) if value.is_finite() => {
                    let mag = value.abs();
                    if mag < ZERO_RESIDUAL_THRESHOLD {
                        image::Rgb(TURQUOISE)
                    } else {
                        let value = mag * ring_scale;
                        let fractional = value - value.trunc();
                        let intensity = (255.0 - fractional * 255.0).round() as u8;
                        image::Rgb([intensity, intensity, intensity])
                    }
                }
                _ => image::Rgb(UNDEFINED),
            };
            buf.put_pixel(px, py, pixel);
        }
    }
    buf
}

/// Render |f| over the viewport and save it to `path` (format from the extension).
///
/// Returns an error if the image could not be written.
pub fn render_field<F>(path: &Path, f: &F, viewport: Viewport) -> Result<(), io::Error>
where
    F: BivariateFunction + ?Sized,
{
    let buf = render_field_to_image(f, viewport);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    buf.save(path).map_err(io::Error::other)
}
