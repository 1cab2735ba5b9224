use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::composite::blend::BlendMode;
use crate::composite::gradient::PercentPoint;
use crate::foundation::core::Argb;
use crate::foundation::error::{NoiseError, NoiseResult};

/// Default gradient start colour (`#1D0130`).
pub const DEFAULT_PRIMARY_COLOR: Argb = Argb(0xFF1D_0130);
/// Default gradient end colour (`#FC056C`).
pub const DEFAULT_SECONDARY_COLOR: Argb = Argb(0xFFFC_056C);

/// Documented `(min, max)` range of each bounded field.
pub mod limits {
    /// Gradient endpoint coordinates, in percent.
    pub const PERCENT: (u32, u32) = (0, 100);
    /// Frames per second.
    pub const FPS: (u32, u32) = (1, 300);
    /// Loop length in seconds.
    pub const LOOP_SECONDS: (u32, u32) = (1, 10);
    /// Nearest-neighbour upscale factor.
    pub const SCALE_FACTOR: (u32, u32) = (1, 8);
    /// Tile repetitions per axis.
    pub const TILING_FACTOR: (u32, u32) = (1, 8);
    /// Noise brightness bounds.
    pub const BRIGHTNESS: (u32, u32) = (1, 256);
}

/// Immutable snapshot of every setting the engine consumes.
///
/// Serialized field names match the persisted preference keys. Missing keys fall back to
/// [`Configuration::default`]. Bounded fields accept any integer, including negative ones, and
/// the parsing constructors clamp them into [`limits`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Gradient start colour, also the solid fill without a secondary colour.
    #[serde(rename = "wallpaper_color")]
    pub primary_color: Argb,
    /// `None` paints a solid `primary_color` background.
    #[serde(rename = "wallpaper_color_2")]
    pub secondary_color: Option<Argb>,
    /// Gradient start, percent of the surface width.
    #[serde(deserialize_with = "saturating_u32")]
    pub start_x_pct: u32,
    /// Gradient start, percent of the surface height.
    #[serde(deserialize_with = "saturating_u32")]
    pub start_y_pct: u32,
    /// Gradient end, percent of the surface width.
    #[serde(deserialize_with = "saturating_u32")]
    pub end_x_pct: u32,
    /// Gradient end, percent of the surface height.
    #[serde(deserialize_with = "saturating_u32")]
    pub end_y_pct: u32,
    /// Animation frame rate.
    #[serde(deserialize_with = "saturating_u32")]
    pub fps: u32,
    /// Length of the animation loop.
    #[serde(deserialize_with = "saturating_u32")]
    pub loop_seconds: u32,
    /// Upscale factor applied to the tiled noise.
    #[serde(deserialize_with = "saturating_u32")]
    pub scale_factor: u32,
    /// Tile repetitions per axis.
    #[serde(deserialize_with = "saturating_u32")]
    pub tiling_factor: u32,
    /// Lowest gray level drawn (inclusive).
    #[serde(deserialize_with = "saturating_u32")]
    pub min_noise_brightness: u32,
    /// Upper gray bound (exclusive, capped to 255 when drawn).
    #[serde(deserialize_with = "saturating_u32")]
    pub max_noise_brightness: u32,
    /// Operator blending noise over the background.
    pub blend_mode: BlendMode,
    /// Reuse frames when the surface is rotated (size is taken as max side squared).
    pub rotation_support: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR,
            secondary_color: Some(DEFAULT_SECONDARY_COLOR),
            start_x_pct: 50,
            start_y_pct: 60,
            end_x_pct: 100,
            end_y_pct: 100,
            fps: 60,
            loop_seconds: 1,
            scale_factor: 2,
            tiling_factor: 2,
            min_noise_brightness: 1,
            max_noise_brightness: 23,
            blend_mode: BlendMode::Screen,
            rotation_support: false,
        }
    }
}

/// Settings that invalidate generated frames when they change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseParams {
    /// See [`Configuration::fps`].
    pub fps: u32,
    /// See [`Configuration::loop_seconds`].
    pub loop_seconds: u32,
    /// See [`Configuration::scale_factor`].
    pub scale_factor: u32,
    /// See [`Configuration::tiling_factor`].
    pub tiling_factor: u32,
    /// See [`Configuration::min_noise_brightness`].
    pub min_noise_brightness: u32,
    /// See [`Configuration::max_noise_brightness`].
    pub max_noise_brightness: u32,
    /// See [`Configuration::rotation_support`].
    pub rotation_support: bool,
}

/// Settings that invalidate the background layer when they change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradientParams {
    /// See [`Configuration::primary_color`].
    pub primary_color: Argb,
    /// See [`Configuration::secondary_color`].
    pub secondary_color: Option<Argb>,
    /// Gradient start point.
    pub start: PercentPoint,
    /// Gradient end point.
    pub end: PercentPoint,
}

/// Reads any JSON integer into `u32`, saturating at both ends; [`Configuration::clamped`] then
/// narrows it to the field's range.
fn saturating_u32<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let v = i64::deserialize(de)?;
    Ok(u32::try_from(v.max(0)).unwrap_or(u32::MAX))
}

fn clamp_to(v: u32, (lo, hi): (u32, u32)) -> u32 {
    v.clamp(lo, hi)
}

impl Configuration {
    /// Parse a JSON document, defaulting missing keys and clamping the result.
    pub fn from_json_str(s: &str) -> NoiseResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| NoiseError::validation(format!("parse configuration JSON: {e}")))?;
        Ok(cfg.clamped())
    }

    /// Parse a JSON reader, defaulting missing keys and clamping the result.
    pub fn from_reader<R: std::io::Read>(r: R) -> NoiseResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| NoiseError::validation(format!("parse configuration JSON: {e}")))?;
        Ok(cfg.clamped())
    }

    /// Parse a JSON configuration file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> NoiseResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            NoiseError::validation(format!("open configuration JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> NoiseResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NoiseError::serde(e.to_string()))
    }

    /// Copy with every bounded field forced into its documented range and the brightness bounds
    /// ordered so that `min <= max`.
    pub fn clamped(&self) -> Self {
        let a = clamp_to(self.min_noise_brightness, limits::BRIGHTNESS);
        let b = clamp_to(self.max_noise_brightness, limits::BRIGHTNESS);
        Self {
            start_x_pct: clamp_to(self.start_x_pct, limits::PERCENT),
            start_y_pct: clamp_to(self.start_y_pct, limits::PERCENT),
            end_x_pct: clamp_to(self.end_x_pct, limits::PERCENT),
            end_y_pct: clamp_to(self.end_y_pct, limits::PERCENT),
            fps: clamp_to(self.fps, limits::FPS),
            loop_seconds: clamp_to(self.loop_seconds, limits::LOOP_SECONDS),
            scale_factor: clamp_to(self.scale_factor, limits::SCALE_FACTOR),
            tiling_factor: clamp_to(self.tiling_factor, limits::TILING_FACTOR),
            min_noise_brightness: a.min(b),
            max_noise_brightness: a.max(b),
            ..self.clone()
        }
    }

    /// Number of slots in one animation loop: `fps * loop_seconds`.
    pub fn total_frames(&self) -> usize {
        self.fps as usize * self.loop_seconds as usize
    }

    /// Delay between two scheduler ticks: `1s / fps`.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }

    /// Gradient start as a percent point.
    pub fn gradient_start(&self) -> PercentPoint {
        PercentPoint::new(self.start_x_pct, self.start_y_pct)
    }

    /// Gradient end as a percent point.
    pub fn gradient_end(&self) -> PercentPoint {
        PercentPoint::new(self.end_x_pct, self.end_y_pct)
    }

    /// Subset of settings the frame set depends on.
    pub fn noise_params(&self) -> NoiseParams {
        NoiseParams {
            fps: self.fps,
            loop_seconds: self.loop_seconds,
            scale_factor: self.scale_factor,
            tiling_factor: self.tiling_factor,
            min_noise_brightness: self.min_noise_brightness,
            max_noise_brightness: self.max_noise_brightness,
            rotation_support: self.rotation_support,
        }
    }

    /// Subset of settings the background depends on.
    pub fn gradient_params(&self) -> GradientParams {
        GradientParams {
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            start: self.gradient_start(),
            end: self.gradient_end(),
        }
    }
}

/// A persisted configuration key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// `wallpaper_color`
    PrimaryColor,
    /// `wallpaper_color_2`
    SecondaryColor,
    /// `start_x_pct`
    StartXPct,
    /// `start_y_pct`
    StartYPct,
    /// `end_x_pct`
    EndXPct,
    /// `end_y_pct`
    EndYPct,
    /// `fps`
    Fps,
    /// `loop_seconds`
    LoopSeconds,
    /// `scale_factor`
    ScaleFactor,
    /// `tiling_factor`
    TilingFactor,
    /// `min_noise_brightness`
    MinNoiseBrightness,
    /// `max_noise_brightness`
    MaxNoiseBrightness,
    /// `blend_mode`
    BlendMode,
    /// `rotation_support`
    RotationSupport,
}

impl ConfigKey {
    /// Every key, in declaration order.
    pub const ALL: [ConfigKey; 14] = [
        ConfigKey::PrimaryColor,
        ConfigKey::SecondaryColor,
        ConfigKey::StartXPct,
        ConfigKey::StartYPct,
        ConfigKey::EndXPct,
        ConfigKey::EndYPct,
        ConfigKey::Fps,
        ConfigKey::LoopSeconds,
        ConfigKey::ScaleFactor,
        ConfigKey::TilingFactor,
        ConfigKey::MinNoiseBrightness,
        ConfigKey::MaxNoiseBrightness,
        ConfigKey::BlendMode,
        ConfigKey::RotationSupport,
    ];

    /// Key name in the persisted store.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::PrimaryColor => "wallpaper_color",
            ConfigKey::SecondaryColor => "wallpaper_color_2",
            ConfigKey::StartXPct => "start_x_pct",
            ConfigKey::StartYPct => "start_y_pct",
            ConfigKey::EndXPct => "end_x_pct",
            ConfigKey::EndYPct => "end_y_pct",
            ConfigKey::Fps => "fps",
            ConfigKey::LoopSeconds => "loop_seconds",
            ConfigKey::ScaleFactor => "scale_factor",
            ConfigKey::TilingFactor => "tiling_factor",
            ConfigKey::MinNoiseBrightness => "min_noise_brightness",
            ConfigKey::MaxNoiseBrightness => "max_noise_brightness",
            ConfigKey::BlendMode => "blend_mode",
            ConfigKey::RotationSupport => "rotation_support",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigKey {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| NoiseError::validation(format!("unknown configuration key '{s}'")))
    }
}

/// Change notification: `key` changed in the store and `config` is the full re-read snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigEvent {
    /// Key that triggered the notification.
    pub key: ConfigKey,
    /// Full configuration after the change.
    pub config: Configuration,
}

impl ConfigEvent {
    /// Notification that `key` changed, carrying the new snapshot.
    pub fn new(key: ConfigKey, config: Configuration) -> Self {
        Self { key, config }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
