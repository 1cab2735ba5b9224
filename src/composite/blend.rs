use rayon::prelude::*;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::NoiseError;

/// One premultiplied RGBA8 pixel as stored in a [`PixelBuffer`](crate::PixelBuffer).
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff style operator used to put the noise layer (source) over the background
/// (destination).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    /// `[0, 0]`
    Clear,
    /// Source only.
    Src,
    /// Destination only.
    Dst,
    /// Source over destination.
    SrcOver,
    /// Destination over source.
    DstOver,
    /// Source where destination is opaque.
    SrcIn,
    /// Destination where source is opaque.
    DstIn,
    /// Source where destination is transparent.
    SrcOut,
    /// Destination where source is transparent.
    DstOut,
    /// Source atop destination.
    SrcAtop,
    /// Destination atop source.
    DstAtop,
    /// Non-overlapping regions of source and destination.
    Xor,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// Channel product.
    Multiply,
    /// Inverse product of inverses.
    Screen,
    /// Saturated sum.
    Add,
    /// Multiply or screen depending on the destination.
    Overlay,
}

impl BlendMode {
    /// Every supported operator, in declaration order.
    pub const ALL: [BlendMode; 18] = [
        BlendMode::Clear,
        BlendMode::Src,
        BlendMode::Dst,
        BlendMode::SrcOver,
        BlendMode::DstOver,
        BlendMode::SrcIn,
        BlendMode::DstIn,
        BlendMode::SrcOut,
        BlendMode::DstOut,
        BlendMode::SrcAtop,
        BlendMode::DstAtop,
        BlendMode::Xor,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Add,
        BlendMode::Overlay,
    ];

    /// Canonical upper-case name, as persisted in configuration.
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Clear => "CLEAR",
            BlendMode::Src => "SRC",
            BlendMode::Dst => "DST",
            BlendMode::SrcOver => "SRC_OVER",
            BlendMode::DstOver => "DST_OVER",
            BlendMode::SrcIn => "SRC_IN",
            BlendMode::DstIn => "DST_IN",
            BlendMode::SrcOut => "SRC_OUT",
            BlendMode::DstOut => "DST_OUT",
            BlendMode::SrcAtop => "SRC_ATOP",
            BlendMode::DstAtop => "DST_ATOP",
            BlendMode::Xor => "XOR",
            BlendMode::Darken => "DARKEN",
            BlendMode::Lighten => "LIGHTEN",
            BlendMode::Multiply => "MULTIPLY",
            BlendMode::Screen => "SCREEN",
            BlendMode::Add => "ADD",
            BlendMode::Overlay => "OVERLAY",
        }
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BlendMode {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', ' '], "_");
        BlendMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| NoiseError::validation(format!("unknown blend mode '{s}'")))
    }
}

impl<'de> serde::Deserialize<'de> for BlendMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Combine one source pixel with one destination pixel.
pub fn blend(mode: BlendMode, dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = i32::from(src[3]);
    let da = i32::from(dst[3]);
    let union_a = sa + da - m(sa, da);

    let alpha = match mode {
        BlendMode::Clear => 0,
        BlendMode::Src => sa,
        BlendMode::Dst => da,
        BlendMode::SrcOver => sa + m(da, 255 - sa),
        BlendMode::DstOver => da + m(sa, 255 - da),
        BlendMode::SrcIn | BlendMode::DstIn | BlendMode::Multiply => m(sa, da),
        BlendMode::SrcOut => m(sa, 255 - da),
        BlendMode::DstOut => m(da, 255 - sa),
        BlendMode::SrcAtop => da,
        BlendMode::DstAtop => sa,
        BlendMode::Xor => sa + da - 2 * m(sa, da),
        BlendMode::Add => (sa + da).min(255),
        BlendMode::Darken | BlendMode::Lighten | BlendMode::Screen | BlendMode::Overlay => union_a,
    }
    .clamp(0, 255);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = i32::from(src[i]);
        let dc = i32::from(dst[i]);
        let c = match mode {
            BlendMode::Clear => 0,
            BlendMode::Src => sc,
            BlendMode::Dst => dc,
            BlendMode::SrcOver => sc + m(dc, 255 - sa),
            BlendMode::DstOver => dc + m(sc, 255 - da),
            BlendMode::SrcIn => m(sc, da),
            BlendMode::DstIn => m(dc, sa),
            BlendMode::SrcOut => m(sc, 255 - da),
            BlendMode::DstOut => m(dc, 255 - sa),
            BlendMode::SrcAtop => m(sc, da) + m(dc, 255 - sa),
            BlendMode::DstAtop => m(dc, sa) + m(sc, 255 - da),
            BlendMode::Xor => m(sc, 255 - da) + m(dc, 255 - sa),
            BlendMode::Darken => sc + dc - m(sc, da).max(m(dc, sa)),
            BlendMode::Lighten => sc + dc - m(sc, da).min(m(dc, sa)),
            BlendMode::Multiply => m(sc, dc),
            BlendMode::Screen => sc + dc - m(sc, dc),
            BlendMode::Add => sc + dc,
            BlendMode::Overlay => {
                let both = if 2 * dc <= da {
                    2 * m(sc, dc)
                } else {
                    m(sa, da) - 2 * m(da - dc, sa - sc)
                };
                m(sc, 255 - da) + m(dc, 255 - sa) + both
            }
        };
        out[i] = c.clamp(0, alpha) as u8;
    }
    out[3] = alpha as u8;
    out
}

/// Blend `src` onto `dst` in place, anchored at the top-left corner.
///
/// Destination pixels outside the source's bounds are left untouched. Rows are processed in
/// parallel.
pub fn blend_in_place(dst: &mut PixelBuffer, src: &PixelBuffer, mode: BlendMode) {
    let dst_stride = dst.width() as usize * 4;
    let cols = dst.width().min(src.width()) as usize;
    let rows = dst.height().min(src.height()) as usize;
    let src_stride = src.width() as usize * 4;
    let src_data = src.data();

    dst.data_mut()
        .par_chunks_mut(dst_stride)
        .take(rows)
        .enumerate()
        .for_each(|(y, drow)| {
            let srow = &src_data[y * src_stride..y * src_stride + cols * 4];
            for (d, s) in drow[..cols * 4]
                .chunks_exact_mut(4)
                .zip(srow.chunks_exact(4))
            {
                let out = blend(mode, [d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        });
}

/// Produce the final frame: `noise` blended over a copy of `background`.
///
/// The result has the background's extent.
pub fn composite(noise: &PixelBuffer, background: &PixelBuffer, mode: BlendMode) -> PixelBuffer {
    let mut out = background.clone();
    blend_in_place(&mut out, noise, mode);
    out
}

#[inline]
fn m(x: i32, y: i32) -> i32 {
    ((x * y) + 127) / 255
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
