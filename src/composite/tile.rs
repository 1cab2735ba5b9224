use rayon::prelude::*;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{NoiseError, NoiseResult};

/// Replicate `src` into a `factor x factor` grid.
///
/// The output is `(width * factor, height * factor)`. A factor of 1 returns a copy.
pub fn tile(src: &PixelBuffer, factor: u32) -> NoiseResult<PixelBuffer> {
    if factor == 0 {
        return Err(NoiseError::invalid_argument("tiling factor must be >= 1"));
    }
    if factor == 1 {
        return Ok(src.clone());
    }

    let out_w = src
        .width()
        .checked_mul(factor)
        .ok_or_else(|| NoiseError::invalid_argument("tiled width overflows u32"))?;
    let out_h = src
        .height()
        .checked_mul(factor)
        .ok_or_else(|| NoiseError::invalid_argument("tiled height overflows u32"))?;

    let mut out = PixelBuffer::new(out_w, out_h)?;
    let stride = out_w as usize * 4;
    let src_h = src.height();

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = src.row(y as u32 % src_h);
            for dst in row.chunks_exact_mut(src_row.len()) {
                dst.copy_from_slice(src_row);
            }
        });

    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/tile.rs"]
mod tests;
