//! OpenGL texture implementation.

use std::os::raw::c_void;

use gl::types::*;
use offscreen::backend::texture::Texture;
use offscreen::texture::{MagFilter, MinFilter, Sampler};
use offscreen::ErrorCode;

use crate::gl20::{get_error, GL20};

fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
  }
}

fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}

unsafe impl Texture for GL20 {
  type TextureRepr = GLuint;

  unsafe fn new_texture_2d(
    &self,
    width: u32,
    height: u32,
    texels: &[u8],
    sampler: Sampler,
  ) -> Result<Self::TextureRepr, ErrorCode> {
    let mut handle: GLuint = 0;

    gl::GenTextures(1, &mut handle);
    gl::BindTexture(gl::TEXTURE_2D, handle);

    // rows are tightly packed
    gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
    gl::TexImage2D(
      gl::TEXTURE_2D,
      0,
      gl::RGBA as GLint,
      width as GLsizei,
      height as GLsizei,
      0,
      gl::RGBA,
      gl::UNSIGNED_BYTE,
      texels.as_ptr() as *const c_void,
    );

    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MIN_FILTER,
      opengl_min_filter(sampler.min_filter) as GLint,
    );
    gl::TexParameteri(
      gl::TEXTURE_2D,
      gl::TEXTURE_MAG_FILTER,
      opengl_mag_filter(sampler.mag_filter) as GLint,
    );
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);

    gl::BindTexture(gl::TEXTURE_2D, 0);

    if let Some(code) = get_error() {
      gl::DeleteTextures(1, &handle);
      return Err(code);
    }

    Ok(handle)
  }

  unsafe fn destroy_texture(&self, texture: &mut Self::TextureRepr) {
    gl::DeleteTextures(1, texture);
  }
}
