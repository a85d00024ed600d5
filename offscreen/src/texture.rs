//! 2D RGBA8 textures.

use std::error;
use std::fmt;

use crate::backend::texture::Texture as TextureBackend;
use crate::config::SurfaceDim;
use crate::error::ErrorCode;

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// A `Sampler` object gives hint on how a `Texture` should be sampled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sampler {
  /// Minification filter.
  pub min_filter: MinFilter,
  /// Magnification filter.
  pub mag_filter: MagFilter,
}

/// Default value is nearest filtering both ways, without mipmaps, so that output stays bit-exact.
impl Default for Sampler {
  fn default() -> Self {
    Sampler {
      min_filter: MinFilter::Nearest,
      mag_filter: MagFilter::Nearest,
    }
  }
}

/// Errors that might happen when working with textures.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureError {
  /// The device rejected the allocation.
  AllocationFailed(ErrorCode),
  /// Not enough (or too many) texels were provided.
  ///
  /// The first [`usize`] is the number of expected bytes and the second the number provided.
  NotEnoughPixels(usize, usize),
  /// A zero-sized texture was requested.
  EmptyTexture,
  /// The requested size cannot be addressed in memory.
  ///
  /// The two [`u32`] are the requested width and height.
  TooLarge(u32, u32),
}

impl fmt::Display for TextureError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      TextureError::AllocationFailed(code) => write!(f, "texture allocation failed: {}", code),
      TextureError::NotEnoughPixels(expected, provided) => write!(
        f,
        "wrong texel count: expected {} bytes, got {}",
        expected, provided
      ),
      TextureError::EmptyTexture => f.write_str("cannot create an empty texture"),
      TextureError::TooLarge(w, h) => write!(f, "{}×{} texture is too large", w, h),
    }
  }
}

impl error::Error for TextureError {}

/// A 2D RGBA8 texture.
pub struct Texture<'c, D>
where
  D: TextureBackend,
{
  repr: D::TextureRepr,
  size: [u32; 2],
  device: &'c D,
}

impl<'c, D> Texture<'c, D>
where
  D: TextureBackend,
{
  /// Create a texture from tightly packed RGBA8 rows.
  pub fn new(
    device: &'c D,
    width: u32,
    height: u32,
    texels: &[u8],
    sampler: Sampler,
  ) -> Result<Self, TextureError> {
    if width == 0 || height == 0 {
      return Err(TextureError::EmptyTexture);
    }

    let expected = SurfaceDim::new(width, height)
      .rgba8_len()
      .ok_or(TextureError::TooLarge(width, height))?;

    if texels.len() != expected {
      return Err(TextureError::NotEnoughPixels(expected, texels.len()));
    }

    let repr = unsafe { device.new_texture_2d(width, height, texels, sampler) }
      .map_err(TextureError::AllocationFailed)?;

    log::debug!("{}×{} texture uploaded", width, height);

    Ok(Texture {
      repr,
      size: [width, height],
      device,
    })
  }

  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  pub(crate) fn repr(&self) -> &D::TextureRepr {
    &self.repr
  }
}

impl<D> Drop for Texture<'_, D>
where
  D: TextureBackend,
{
  fn drop(&mut self) {
    unsafe { self.device.destroy_texture(&mut self.repr) };
  }
}
