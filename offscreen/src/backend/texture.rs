//! Texture backend interface.

use crate::error::ErrorCode;
use crate::texture::Sampler;

/// Texture backend.
pub unsafe trait Texture {
  /// The inner representation of a texture for this backend.
  type TextureRepr;

  /// Create a 2D RGBA8 texture from `texels` and apply `sampler` to it.
  ///
  /// `texels` is guaranteed to hold exactly `width * height * 4` bytes.
  unsafe fn new_texture_2d(
    &self,
    width: u32,
    height: u32,
    texels: &[u8],
    sampler: Sampler,
  ) -> Result<Self::TextureRepr, ErrorCode>;

  unsafe fn destroy_texture(&self, texture: &mut Self::TextureRepr);
}
