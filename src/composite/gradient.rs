use rayon::prelude::*;

use crate::foundation::core::{Argb, Extent, PixelBuffer, Point, Rgba8Premul, Vec2};
use crate::foundation::error::NoiseResult;

/// A position expressed as percentages (0..=100) of a surface's width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PercentPoint {
    /// Horizontal position, percent of the width.
    pub x: u32,
    /// Vertical position, percent of the height.
    pub y: u32,
}

impl PercentPoint {
    /// Point at `x`% across and `y`% down. Values above 100 are kept as given.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Absolute coordinates inside `extent`: `pct / 100 * side`.
    pub fn to_absolute(self, extent: Extent) -> Point {
        Point::new(
            f64::from(self.x) / 100.0 * f64::from(extent.width),
            f64::from(self.y) / 100.0 * f64::from(extent.height),
        )
    }
}

/// Build the background layer: a linear gradient from `color_a` at `start_pct` to `color_b` at
/// `end_pct`, clamped beyond both ends.
///
/// Without a secondary colour the layer is a solid `color_a` fill. Colours are interpolated in
/// straight alpha and premultiplied per pixel. When start and end coincide the whole layer takes
/// the end colour.
pub fn build_gradient(
    extent: Extent,
    color_a: Argb,
    color_b: Option<Argb>,
    start_pct: PercentPoint,
    end_pct: PercentPoint,
) -> NoiseResult<PixelBuffer> {
    let Some(color_b) = color_b else {
        return PixelBuffer::filled(extent.width, extent.height, color_a.to_premul());
    };

    let start = start_pct.to_absolute(extent);
    let end = end_pct.to_absolute(extent);
    let axis: Vec2 = end - start;
    let len2 = axis.hypot2();

    let mut out = PixelBuffer::new(extent.width, extent.height)?;
    let stride = extent.width as usize * 4;

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let t = if len2 <= f64::EPSILON {
                    1.0
                } else {
                    let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    ((p - start).dot(axis) / len2).clamp(0.0, 1.0)
                };
                px.copy_from_slice(&lerp_argb(color_a, color_b, t).to_array());
            }
        });

    Ok(out)
}

fn lerp_argb(a: Argb, b: Argb, t: f64) -> Rgba8Premul {
    fn ch(a: u8, b: u8, t: f64) -> u8 {
        (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    }

    Rgba8Premul::from_straight_rgba(
        ch(a.r(), b.r(), t),
        ch(a.g(), b.g(), t),
        ch(a.b(), b.b(), t),
        ch(a.a(), b.a(), t),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/composite/gradient.rs"]
mod tests;
