use crate::composite::scale::{ScaleFilter, scale};
use crate::composite::tile::tile;
use crate::config::settings::Configuration;
use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::{NoiseError, NoiseResult};
use crate::noise::synth::{NoiseSynthesizer, mix64};

/// Everything needed to produce any slot of one frame set, derived from a configuration
/// snapshot and a surface extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationPlan {
    /// Slots in the loop: `fps * loop_seconds`.
    pub total_frames: usize,
    /// Resolution of every finished frame (the working extent).
    pub frame_extent: Extent,
    /// Resolution noise is synthesized at before amplification.
    pub tile_extent: Extent,
    /// Tile repetitions per axis.
    pub tiling_factor: u32,
    /// Upscale factor after tiling.
    pub scale_factor: u32,
    /// Lowest gray level (inclusive).
    pub min_brightness: u32,
    /// Gray upper bound (exclusive).
    pub max_brightness: u32,
    /// Filter used for the upscale.
    pub filter: ScaleFilter,
    /// Base seed; `None` draws fresh entropy for every frame.
    pub seed: Option<u64>,
}

impl GenerationPlan {
    /// Derive a plan. `config` is expected to be clamped already.
    ///
    /// The tile side is `ceil(side / (tiling * scale))` so that the amplified layer covers the
    /// whole working extent; the overshoot is cropped after scaling.
    pub fn new(config: &Configuration, surface: Extent, seed: Option<u64>) -> NoiseResult<Self> {
        let frame_extent = surface.working(config.rotation_support);
        let amplification = config
            .tiling_factor
            .checked_mul(config.scale_factor)
            .filter(|&a| a > 0)
            .ok_or_else(|| {
                NoiseError::invalid_argument("tiling and scale factors must be >= 1")
            })?;
        let tile_extent = Extent::new(
            frame_extent.width.div_ceil(amplification).max(1),
            frame_extent.height.div_ceil(amplification).max(1),
        )?;
        let total_frames = config.total_frames();
        if total_frames == 0 {
            return Err(NoiseError::invalid_argument("fps and loop seconds must be >= 1"));
        }

        Ok(Self {
            total_frames,
            frame_extent,
            tile_extent,
            tiling_factor: config.tiling_factor,
            scale_factor: config.scale_factor,
            min_brightness: config.min_noise_brightness,
            max_brightness: config.max_noise_brightness,
            filter: ScaleFilter::Nearest,
            seed,
        })
    }

    /// Synthesize, tile, scale and crop the noise layer for `slot`.
    pub fn render_slot(&self, synth: &NoiseSynthesizer, slot: usize) -> NoiseResult<PixelBuffer> {
        let Extent { width, height } = self.tile_extent;
        let noise = match self.seed {
            Some(seed) => synth.synthesize_seeded(
                width,
                height,
                self.min_brightness,
                self.max_brightness,
                mix64(seed ^ mix64(slot as u64)),
            )?,
            None => synth.synthesize(width, height, self.min_brightness, self.max_brightness)?,
        };

        let tiled = if self.tiling_factor > 1 {
            tile(&noise, self.tiling_factor)?
        } else {
            noise
        };
        let scaled = if self.scale_factor > 1 {
            scale(&tiled, self.scale_factor, self.filter)?
        } else {
            tiled
        };

        if scaled.extent() == self.frame_extent {
            Ok(scaled)
        } else {
            scaled.crop(self.frame_extent)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/plan.rs"]
mod tests;
