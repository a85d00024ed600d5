//! Pipeline backend interface.
//!
//! This interface defines the low-level API pipelines must implement to be usable.

use crate::backend::buffer::Buffer;
use crate::backend::shader::Shader;
use crate::backend::texture::Texture;
use crate::buffer::IndexType;
use crate::error::ErrorCode;
use crate::pipeline::VertexAttrib;

/// A texture bound to a texture unit and exposed to a sampler uniform.
pub struct BoundTexture<'a, T> {
  pub location: i32,
  pub unit: u32,
  pub texture: &'a T,
}

/// Everything a single indexed draw call needs.
pub struct DrawCall<'a, B>
where
  B: ?Sized + Shader + Buffer + Texture,
{
  pub program: &'a B::ProgramRepr,
  pub vertices: &'a B::BufferRepr,
  pub indices: &'a B::BufferRepr,
  pub index_type: IndexType,
  pub attribs: &'a [VertexAttrib],
  pub textures: &'a [BoundTexture<'a, B::TextureRepr>],
  pub index_count: usize,
}

pub unsafe trait Pipeline: Shader + Buffer + Texture {
  unsafe fn set_viewport(&self, width: u32, height: u32);

  /// Clear the color buffer.
  unsafe fn clear_color(&self, color: [f32; 4]);

  /// Use the program, bind the vertex layout and textures, and issue the draw call.
  unsafe fn draw(&self, call: &DrawCall<Self>);

  /// Read the whole color buffer as RGBA8 rows into `out`.
  unsafe fn read_pixels(&self, width: u32, height: u32, out: &mut [u8]);

  /// Pop the device error flag.
  fn last_error(&self) -> Option<ErrorCode>;
}
