//! Rendering into the off-screen surface.
//!
//! This module gathers everything a current [`Context`] can do with the device: compiling shaders,
//! uploading geometry and textures, issuing a draw call and reading the result back.
//!
//! Device resources borrow the context. They must all be dropped before [`Context::teardown`],
//! which gives the only legal destruction order: device objects, then context, then surface,
//! then display.

use std::error;
use std::fmt;

use bytemuck::Pod;

use crate::backend::pipeline::{BoundTexture, DrawCall, Pipeline as _};
use crate::backend::platform::Platform;
use crate::buffer::{Buffer, BufferError, BufferKind, Index};
use crate::context::Context;
use crate::error::ErrorCode;
use crate::shader::{Location, Program, ProgramError, Stage, StageError, StageType};
use crate::texture::{Sampler, Texture, TextureError};

/// Layout of one float vertex attribute in an array buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VertexAttrib {
  /// Attribute location in the program.
  pub location: Location,
  /// Number of `f32` components (1 to 4).
  pub components: u8,
  /// Distance in bytes between two consecutive vertices.
  pub stride: usize,
  /// Offset in bytes of the attribute inside a vertex.
  pub offset: usize,
}

impl VertexAttrib {
  /// Attribute described in number of `f32`s rather than bytes.
  pub fn floats(location: Location, components: u8, stride: usize, offset: usize) -> Self {
    let f = std::mem::size_of::<f32>();

    VertexAttrib {
      location,
      components,
      stride: stride * f,
      offset: offset * f,
    }
  }
}

/// Indexed geometry: vertices, indices and how to read the vertices.
pub struct Geometry<'a, 'c, D, V, I>
where
  D: crate::backend::buffer::Buffer,
{
  pub vertices: &'a Buffer<'c, D, V>,
  pub indices: &'a Buffer<'c, D, I>,
  pub layout: Vec<VertexAttrib>,
}

/// A texture exposed to a sampler uniform through a texture unit.
pub struct TextureBinding<'a, 'c, D>
where
  D: crate::backend::texture::Texture,
{
  pub location: Location,
  pub unit: u32,
  pub texture: &'a Texture<'c, D>,
}

/// Various customization options for draw calls.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineState {
  /// Color to use when clearing the color buffer.
  pub clear_color: [f32; 4],
}

impl Default for PipelineState {
  /// Clear color is `[0., 0., 0., 1.]`.
  fn default() -> Self {
    PipelineState {
      clear_color: [0., 0., 0., 1.],
    }
  }
}

impl PipelineState {
  /// Set the clear color.
  pub fn set_clear_color(self, clear_color: [f32; 4]) -> Self {
    PipelineState { clear_color }
  }
}

/// Errors that might happen when drawing.
#[derive(Debug, Eq, PartialEq)]
pub enum PipelineError {
  /// More indices were requested than the index buffer holds.
  IndexOutOfRange { count: usize, len: usize },
  /// The device raised an error.
  Driver(ErrorCode),
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      PipelineError::IndexOutOfRange { count, len } => write!(
        f,
        "cannot draw {} indices out of an index buffer of {}",
        count, len
      ),
      PipelineError::Driver(code) => write!(f, "device error: {}", code),
    }
  }
}

impl error::Error for PipelineError {}

impl<'p, P> Context<'p, P>
where
  P: Platform,
{
  /// Compile a shader stage.
  pub fn compile(&self, ty: StageType, src: &str) -> Result<Stage<'_, P::Device>, StageError> {
    Stage::new(self.device(), ty, src)
  }

  /// Link two stages into a program.
  pub fn link<'c>(
    &'c self,
    vertex: Stage<'c, P::Device>,
    fragment: Stage<'c, P::Device>,
  ) -> Result<Program<'c, P::Device>, ProgramError> {
    Program::link(self.device(), vertex, fragment)
  }

  /// Compile and link a program from its vertex and fragment sources.
  pub fn new_program(
    &self,
    vertex: &str,
    fragment: &str,
  ) -> Result<Program<'_, P::Device>, ProgramError> {
    Program::from_sources(self.device(), vertex, fragment)
  }

  /// Upload vertices and indices to two static buffers.
  #[allow(clippy::type_complexity)]
  pub fn upload_geometry<V, I>(
    &self,
    vertices: &[V],
    indices: &[I],
  ) -> Result<(Buffer<'_, P::Device, V>, Buffer<'_, P::Device, I>), BufferError>
  where
    V: Pod,
    I: Index,
  {
    let vertices = Buffer::from_slice(self.device(), BufferKind::Array, vertices)?;
    let indices = Buffer::from_slice(self.device(), BufferKind::Element, indices)?;

    Ok((vertices, indices))
  }

  /// Upload a 2D RGBA8 texture sampled with nearest filtering.
  pub fn upload_texture(
    &self,
    width: u32,
    height: u32,
    texels: &[u8],
  ) -> Result<Texture<'_, P::Device>, TextureError> {
    Texture::new(self.device(), width, height, texels, Sampler::default())
  }

  /// Pop the device error flag.
  pub fn check_error(&self) -> Result<(), ErrorCode> {
    match self.device().last_error() {
      Some(code) => Err(code),
      None => Ok(()),
    }
  }

  /// Clear the color buffer and issue one indexed draw call.
  ///
  /// The device error flag is checked once the call is issued; anything raised fails the draw.
  pub fn draw<V, I>(
    &self,
    state: &PipelineState,
    program: &Program<P::Device>,
    geometry: &Geometry<P::Device, V, I>,
    textures: &[TextureBinding<P::Device>],
    index_count: usize,
  ) -> Result<(), PipelineError>
  where
    I: Index,
  {
    let len = geometry.indices.len();
    if index_count > len {
      return Err(PipelineError::IndexOutOfRange {
        count: index_count,
        len,
      });
    }

    let textures = textures
      .iter()
      .map(|binding| BoundTexture {
        location: binding.location.index(),
        unit: binding.unit,
        texture: binding.texture.repr(),
      })
      .collect::<Vec<_>>();

    let call = DrawCall {
      program: program.repr(),
      vertices: geometry.vertices.repr(),
      indices: geometry.indices.repr(),
      index_type: I::INDEX_TYPE,
      attribs: &geometry.layout,
      textures: &textures,
      index_count,
    };

    let device = self.device();

    unsafe {
      device.clear_color(state.clear_color);
      device.draw(&call);
    }

    self.check_error().map_err(PipelineError::Driver)?;

    log::debug!("drew {} indices", index_count);
    Ok(())
  }

  /// Read the surface back as RGBA8 rows.
  ///
  /// A surface too large to be addressed reads back as nothing.
  pub fn read_pixels(&self) -> Vec<u8> {
    let dim = self.dim();
    let mut pixels = match dim.rgba8_len() {
      Some(len) => vec![0; len],
      None => return Vec::new(),
    };

    unsafe { self.device().read_pixels(dim.width, dim.height, &mut pixels) };

    pixels
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn float_layout_is_in_bytes() {
    let attrib = VertexAttrib::floats(Location::new(1), 2, 5, 3);

    assert_eq!(attrib.stride, 20);
    assert_eq!(attrib.offset, 12);
  }

  #[test]
  fn default_clear_color_is_opaque_black() {
    assert_eq!(PipelineState::default().clear_color, [0., 0., 0., 1.]);
  }
}
