use rayon::prelude::*;

use crate::foundation::core::{Affine, PixelBuffer, Point};
use crate::foundation::error::{NoiseError, NoiseResult};

/// Resampling filter used by [`scale`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    /// Pick the covering source pixel. Keeps noise grains crisp.
    #[default]
    Nearest,
    /// Bilinear interpolation between the four nearest source pixel centers.
    Linear,
}

/// Upsample `src` by an integer `factor` to `(width * factor, height * factor)`.
///
/// Every destination pixel center is mapped back through the inverse of `Affine::scale(factor)`
/// and sampled with `filter`. A factor of 1 returns a copy.
pub fn scale(src: &PixelBuffer, factor: u32, filter: ScaleFilter) -> NoiseResult<PixelBuffer> {
    if factor == 0 {
        return Err(NoiseError::invalid_argument("scale factor must be >= 1"));
    }
    if factor == 1 {
        return Ok(src.clone());
    }

    let out_w = src
        .width()
        .checked_mul(factor)
        .ok_or_else(|| NoiseError::invalid_argument("scaled width overflows u32"))?;
    let out_h = src
        .height()
        .checked_mul(factor)
        .ok_or_else(|| NoiseError::invalid_argument("scaled height overflows u32"))?;

    let inv = Affine::scale(f64::from(factor)).inverse();
    let mut out = PixelBuffer::new(out_w, out_h)?;
    let stride = out_w as usize * 4;

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let sample = match filter {
                    ScaleFilter::Nearest => sample_nearest(src, p),
                    ScaleFilter::Linear => sample_linear(src, p),
                };
                px.copy_from_slice(&sample);
            }
        });

    Ok(out)
}

fn clamp_coord(v: f64, len: u32) -> u32 {
    (v.floor().max(0.0) as u32).min(len - 1)
}

fn sample_nearest(src: &PixelBuffer, p: Point) -> [u8; 4] {
    let x = clamp_coord(p.x, src.width());
    let y = clamp_coord(p.y, src.height());
    src.pixel(x, y).unwrap_or([0, 0, 0, 0])
}

fn sample_linear(src: &PixelBuffer, p: Point) -> [u8; 4] {
    // Shift into pixel-center space so integer coordinates hit centers exactly.
    let fx = (p.x - 0.5).clamp(0.0, f64::from(src.width() - 1));
    let fy = (p.y - 0.5).clamp(0.0, f64::from(src.height() - 1));
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let tx = fx - f64::from(x0);
    let ty = fy - f64::from(y0);

    let px = |x, y| src.pixel(x, y).unwrap_or([0, 0, 0, 0]);
    let (p00, p10, p01, p11) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(p00[i]) + (f64::from(p10[i]) - f64::from(p00[i])) * tx;
        let bottom = f64::from(p01[i]) + (f64::from(p11[i]) - f64::from(p01[i])) * tx;
        out[i] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/composite/scale.rs"]
mod tests;
