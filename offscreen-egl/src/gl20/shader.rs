use std::ffi::CString;

use gl::types::*;
use offscreen::backend::shader::Shader;
use offscreen::shader::StageType;
use offscreen::ErrorCode;

use crate::gl20::{get_error, GL20};

fn opengl_shader_type(t: StageType) -> GLenum {
  match t {
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
  }
}

/// A zero handle with no error raised is still a failure.
unsafe fn handle_or_error(handle: GLuint) -> Result<GLuint, ErrorCode> {
  if handle == 0 {
    Err(get_error().unwrap_or(ErrorCode(gl::INVALID_OPERATION)))
  } else {
    Ok(handle)
  }
}

unsafe fn status(handle: GLuint, pname: GLenum, get: unsafe fn(GLuint, GLenum, *mut GLint)) -> GLint {
  let mut value: GLint = 0;
  get(handle, pname, &mut value);
  value
}

unsafe impl Shader for GL20 {
  type StageRepr = GLuint;

  type ProgramRepr = GLuint;

  unsafe fn create_stage(&self, ty: StageType) -> Result<Self::StageRepr, ErrorCode> {
    handle_or_error(gl::CreateShader(opengl_shader_type(ty)))
  }

  unsafe fn compile_stage(&self, stage: &Self::StageRepr, src: &str) -> bool {
    let src_ptr = src.as_ptr() as *const GLchar;
    let src_len = src.len() as GLint;

    gl::ShaderSource(*stage, 1, &src_ptr, &src_len);
    gl::CompileShader(*stage);

    status(*stage, gl::COMPILE_STATUS, gl::GetShaderiv) == GLint::from(gl::TRUE)
  }

  unsafe fn stage_log_len(&self, stage: &Self::StageRepr) -> usize {
    status(*stage, gl::INFO_LOG_LENGTH, gl::GetShaderiv).max(0) as usize
  }

  unsafe fn read_stage_log(&self, stage: &Self::StageRepr, buf: &mut [u8]) -> usize {
    let mut written: GLsizei = 0;
    gl::GetShaderInfoLog(
      *stage,
      buf.len() as GLsizei,
      &mut written,
      buf.as_mut_ptr() as *mut GLchar,
    );

    written.max(0) as usize
  }

  unsafe fn destroy_stage(&self, stage: &mut Self::StageRepr) {
    gl::DeleteShader(*stage);
  }

  unsafe fn create_program(&self) -> Result<Self::ProgramRepr, ErrorCode> {
    handle_or_error(gl::CreateProgram())
  }

  unsafe fn attach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr) {
    gl::AttachShader(*program, *stage);
  }

  unsafe fn detach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr) {
    gl::DetachShader(*program, *stage);
  }

  unsafe fn link_program(&self, program: &Self::ProgramRepr) -> bool {
    gl::LinkProgram(*program);
    status(*program, gl::LINK_STATUS, gl::GetProgramiv) == GLint::from(gl::TRUE)
  }

  unsafe fn program_log_len(&self, program: &Self::ProgramRepr) -> usize {
    status(*program, gl::INFO_LOG_LENGTH, gl::GetProgramiv).max(0) as usize
  }

  unsafe fn read_program_log(&self, program: &Self::ProgramRepr, buf: &mut [u8]) -> usize {
    let mut written: GLsizei = 0;
    gl::GetProgramInfoLog(
      *program,
      buf.len() as GLsizei,
      &mut written,
      buf.as_mut_ptr() as *mut GLchar,
    );

    written.max(0) as usize
  }

  unsafe fn destroy_program(&self, program: &mut Self::ProgramRepr) {
    gl::DeleteProgram(*program);
  }

  unsafe fn attrib_location(&self, program: &Self::ProgramRepr, name: &str) -> i32 {
    match CString::new(name) {
      Ok(c_name) => gl::GetAttribLocation(*program, c_name.as_ptr() as *const GLchar),
      Err(_) => -1,
    }
  }

  unsafe fn uniform_location(&self, program: &Self::ProgramRepr, name: &str) -> i32 {
    match CString::new(name) {
      Ok(c_name) => gl::GetUniformLocation(*program, c_name.as_ptr() as *const GLchar),
      Err(_) => -1,
    }
  }
}
