use std::os::raw::c_void;
use std::ptr::null;

use gl::types::*;
use offscreen::backend::pipeline::{DrawCall, Pipeline};
use offscreen::buffer::IndexType;
use offscreen::ErrorCode;

use crate::gl20::{get_error, GL20};

fn opengl_index_type(ty: IndexType) -> GLenum {
  match ty {
    IndexType::U8 => gl::UNSIGNED_BYTE,
    IndexType::U16 => gl::UNSIGNED_SHORT,
    IndexType::U32 => gl::UNSIGNED_INT,
  }
}

unsafe impl Pipeline for GL20 {
  unsafe fn set_viewport(&self, width: u32, height: u32) {
    gl::Viewport(0, 0, width as GLint, height as GLint);
  }

  unsafe fn clear_color(&self, color: [f32; 4]) {
    let [r, g, b, a] = color;

    gl::ClearColor(r, g, b, a);
    gl::Clear(gl::COLOR_BUFFER_BIT);
  }

  unsafe fn draw(&self, call: &DrawCall<Self>) {
    gl::UseProgram(*call.program);
    gl::BindBuffer(gl::ARRAY_BUFFER, *call.vertices);

    // absent attributes are skipped, as the driver would ignore them anyway
    let enabled = call
      .attribs
      .iter()
      .filter(|attrib| !attrib.location.is_absent())
      .map(|attrib| {
        let index = attrib.location.index() as GLuint;

        gl::EnableVertexAttribArray(index);
        gl::VertexAttribPointer(
          index,
          GLint::from(attrib.components),
          gl::FLOAT,
          gl::FALSE,
          attrib.stride as GLsizei,
          attrib.offset as *const c_void,
        );

        index
      })
      .collect::<Vec<_>>();

    for bound in call.textures {
      gl::ActiveTexture(gl::TEXTURE0 + bound.unit);
      gl::BindTexture(gl::TEXTURE_2D, *bound.texture);
      gl::Uniform1i(bound.location, bound.unit as GLint);
    }

    gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, *call.indices);
    gl::DrawElements(
      gl::TRIANGLES,
      call.index_count as GLsizei,
      opengl_index_type(call.index_type),
      null(),
    );

    for index in enabled {
      gl::DisableVertexAttribArray(index);
    }

    gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0);
    gl::BindBuffer(gl::ARRAY_BUFFER, 0);
    gl::UseProgram(0);
  }

  unsafe fn read_pixels(&self, width: u32, height: u32, out: &mut [u8]) {
    gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
    gl::ReadPixels(
      0,
      0,
      width as GLsizei,
      height as GLsizei,
      gl::RGBA,
      gl::UNSIGNED_BYTE,
      out.as_mut_ptr() as *mut c_void,
    );
  }

  fn last_error(&self) -> Option<ErrorCode> {
    unsafe { get_error() }
  }
}
