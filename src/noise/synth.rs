use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{NoiseError, NoiseResult};

/// Upper bound (inclusive) accepted for brightness values.
pub const MAX_BRIGHTNESS: u32 = 256;

/// Pixels per independently seeded generator in seeded synthesis.
const SEED_BLOCK_PX: usize = 1024;

/// Fills pixel buffers with opaque grayscale noise.
///
/// Pixels are split into `partitions` contiguous index ranges which are filled concurrently on
/// the current rayon pool; each range owns its own generator, so ranges share nothing but the
/// (disjoint) output slice.
///
/// Seeded output does not depend on the partition count: generators are keyed by fixed
/// [`SEED_BLOCK_PX`]-pixel blocks and whole blocks are handed to partitions.
#[derive(Clone, Debug)]
pub struct NoiseSynthesizer {
    partitions: usize,
}

impl Default for NoiseSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSynthesizer {
    /// One partition per available core.
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_partitions(cores)
    }

    /// Explicit partition count, clamped to at least 1.
    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    /// Number of concurrently filled index ranges.
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Fill a `width x height` buffer with gray values drawn uniformly from
    /// `[min_brightness, max_brightness)`, alpha fixed at 255.
    ///
    /// Unseeded: two calls with identical arguments produce different pixels.
    pub fn synthesize(
        &self,
        width: u32,
        height: u32,
        min_brightness: u32,
        max_brightness: u32,
    ) -> NoiseResult<PixelBuffer> {
        self.synthesize_inner(width, height, min_brightness, max_brightness, None)
    }

    /// Same as [`NoiseSynthesizer::synthesize`], reproducible for a given `seed` and partition
    /// count.
    pub fn synthesize_seeded(
        &self,
        width: u32,
        height: u32,
        min_brightness: u32,
        max_brightness: u32,
        seed: u64,
    ) -> NoiseResult<PixelBuffer> {
        self.synthesize_inner(width, height, min_brightness, max_brightness, Some(seed))
    }

    fn synthesize_inner(
        &self,
        width: u32,
        height: u32,
        min_brightness: u32,
        max_brightness: u32,
        seed: Option<u64>,
    ) -> NoiseResult<PixelBuffer> {
        check_brightness(min_brightness, max_brightness)?;
        let mut out = PixelBuffer::new(width, height)?;

        let pixels = out.data().len() / 4;
        let chunk_px = match seed {
            Some(_) => {
                let blocks = pixels.div_ceil(SEED_BLOCK_PX);
                blocks.div_ceil(self.partitions).max(1) * SEED_BLOCK_PX
            }
            None => pixels.div_ceil(self.partitions).max(1),
        };

        out.data_mut()
            .par_chunks_mut(chunk_px * 4)
            .enumerate()
            .for_each(|(i, chunk)| match seed {
                Some(s) => {
                    let first_block = i * chunk_px / SEED_BLOCK_PX;
                    for (j, block) in chunk.chunks_mut(SEED_BLOCK_PX * 4).enumerate() {
                        let key = ((first_block + j) as u64).rotate_left(32);
                        let mut rng = StdRng::seed_from_u64(mix64(s ^ key));
                        fill_chunk(block, min_brightness, max_brightness, &mut rng);
                    }
                }
                None => fill_chunk(chunk, min_brightness, max_brightness, &mut rand::rng()),
            });

        Ok(out)
    }
}

fn check_brightness(min: u32, max: u32) -> NoiseResult<()> {
    if min < 1 || max > MAX_BRIGHTNESS || min > max {
        return Err(NoiseError::invalid_argument(format!(
            "brightness range must satisfy 1 <= min <= max <= {MAX_BRIGHTNESS}, got [{min}, {max})"
        )));
    }
    Ok(())
}

fn fill_chunk<R: Rng>(chunk: &mut [u8], min: u32, max: u32, rng: &mut R) {
    for px in chunk.chunks_exact_mut(4) {
        // An empty range collapses to its lower bound.
        let v = if min < max {
            rng.random_range(min..max)
        } else {
            min
        };
        let v = v.min(255) as u8;
        px.copy_from_slice(&[v, v, v, 255]);
    }
}

/// SplitMix64 finalizer; decorrelates per-block and per-frame seeds.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
#[path = "../../tests/unit/noise/synth.rs"]
mod tests;
