use crate::foundation::error::{NoiseError, NoiseResult};

pub use kurbo::{Affine, Point, Vec2};

/// Size of a drawing surface in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Build an extent, rejecting zero-sized dimensions.
    pub fn new(width: u32, height: u32) -> NoiseResult<Self> {
        if width == 0 || height == 0 {
            return Err(NoiseError::invalid_argument(format!(
                "extent must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by this extent.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Larger of the two sides.
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }

    /// Extent frames are generated at.
    ///
    /// With rotation support the working extent is a `max_side` square so frames stay valid when
    /// the host swaps width and height.
    pub fn working(self, rotation_support: bool) -> Self {
        if rotation_support {
            let side = self.max_side();
            Self {
                width: side,
                height: side,
            }
        } else {
            self
        }
    }
}

/// 32-bit packed `0xAARRGGBB` colour, straight alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    /// Build from straight-alpha channels.
    pub const fn from_channels(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Alpha channel.
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Convert to premultiplied RGBA8.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r(), self.g(), self.b(), self.a())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red, premultiplied.
    pub r: u8,
    /// Green, premultiplied.
    pub g: u8,
    /// Blue, premultiplied.
    pub b: u8,
    /// Coverage.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiply straight-alpha channels.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channels in `[r, g, b, a]` byte order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A tightly packed, row-major, premultiplied RGBA8 image.
///
/// The byte length always equals `width * height * 4`; constructors enforce it.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Byte length of a `width x height` RGBA8 buffer.
    pub fn byte_len(width: u32, height: u32) -> NoiseResult<usize> {
        if width == 0 || height == 0 {
            return Err(NoiseError::invalid_argument(format!(
                "pixel buffer must be at least 1x1, got {width}x{height}"
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| NoiseError::invalid_argument("pixel buffer size overflow"))
    }

    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> NoiseResult<Self> {
        let len = Self::byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Buffer where every pixel is `px`.
    pub fn filled(width: u32, height: u32, px: Rgba8Premul) -> NoiseResult<Self> {
        let n = Self::byte_len(width, height)? / 4;
        Ok(Self {
            width,
            height,
            data: px.to_array().repeat(n),
        })
    }

    /// Wrap existing premultiplied RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> NoiseResult<Self> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(NoiseError::invalid_argument(format!(
                "expected {expected} bytes for {width}x{height} rgba8, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height as an [`Extent`].
    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
        }
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable view of the pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer, returning its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Top-left anchored crop. Returns a clone when `extent` matches the buffer.
    pub fn crop(&self, extent: Extent) -> NoiseResult<Self> {
        if extent.width > self.width || extent.height > self.height {
            return Err(NoiseError::invalid_argument(format!(
                "cannot crop {}x{} buffer to larger {}x{}",
                self.width, self.height, extent.width, extent.height
            )));
        }
        if extent.width == self.width && extent.height == self.height {
            return Ok(self.clone());
        }
        let len = Self::byte_len(extent.width, extent.height)?;
        let row_bytes = extent.width as usize * 4;
        let mut data = Vec::with_capacity(len);
        for y in 0..extent.height {
            data.extend_from_slice(&self.row(y)[..row_bytes]);
        }
        Self::from_rgba8(extent.width, extent.height, data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
