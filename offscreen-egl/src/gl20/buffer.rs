//! OpenGL buffer implementation.

use std::os::raw::c_void;

use gl::types::*;
use offscreen::backend::buffer::Buffer;
use offscreen::buffer::BufferKind;
use offscreen::ErrorCode;

use crate::gl20::{get_error, GL20};

pub(crate) fn opengl_target(kind: BufferKind) -> GLenum {
  match kind {
    BufferKind::Array => gl::ARRAY_BUFFER,
    BufferKind::Element => gl::ELEMENT_ARRAY_BUFFER,
  }
}

unsafe impl Buffer for GL20 {
  type BufferRepr = GLuint;

  unsafe fn new_buffer(&self, kind: BufferKind, bytes: &[u8]) -> Result<Self::BufferRepr, ErrorCode> {
    let target = opengl_target(kind);
    let mut handle: GLuint = 0;

    gl::GenBuffers(1, &mut handle);
    gl::BindBuffer(target, handle);
    gl::BufferData(
      target,
      bytes.len() as isize,
      bytes.as_ptr() as *const c_void,
      gl::STATIC_DRAW,
    );
    gl::BindBuffer(target, 0);

    // out of memory is only known once the data is in
    if let Some(code) = get_error() {
      gl::DeleteBuffers(1, &handle);
      return Err(code);
    }

    Ok(handle)
  }

  unsafe fn destroy_buffer(&self, buffer: &mut Self::BufferRepr) {
    gl::DeleteBuffers(1, buffer);
  }
}
