//! Driver error codes and the crate-wide error type.

use std::error;
use std::fmt;

use crate::buffer::BufferError;
use crate::context::ContextError;
use crate::loader::LoaderError;
use crate::pipeline::PipelineError;
use crate::shader::{ProgramError, StageError};
use crate::texture::TextureError;

/// Raw error code reported by the graphics driver.
///
/// Displayed in hexadecimal, the way drivers document them (`0x3009` is `EGL_BAD_MATCH`, `0x0501`
/// is `GL_INVALID_VALUE`, etc.).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "0x{:x}", self.0)
  }
}

/// Any fatal failure of the bootstrap sequence.
///
/// None of these are recoverable: the only sensible reaction is to let the already-acquired
/// resources drop and exit.
#[derive(Debug)]
pub enum Error {
  Loader(LoaderError),
  Context(ContextError),
  Stage(StageError),
  Program(ProgramError),
  Buffer(BufferError),
  Texture(TextureError),
  Pipeline(PipelineError),
}

impl Error {
  /// Short tag naming the step that failed.
  pub fn step(&self) -> &'static str {
    match *self {
      Error::Loader(_) => "load",
      Error::Context(ref e) => e.step(),
      Error::Stage(_) => "compile",
      Error::Program(_) => "link",
      Error::Buffer(_) => "upload-geometry",
      Error::Texture(_) => "upload-texture",
      Error::Pipeline(_) => "draw",
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Error::Loader(ref e) => e.fmt(f),
      Error::Context(ref e) => e.fmt(f),
      Error::Stage(ref e) => e.fmt(f),
      Error::Program(ref e) => e.fmt(f),
      Error::Buffer(ref e) => e.fmt(f),
      Error::Texture(ref e) => e.fmt(f),
      Error::Pipeline(ref e) => e.fmt(f),
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Error::Loader(e) => Some(e),
      Error::Context(e) => Some(e),
      Error::Stage(e) => Some(e),
      Error::Program(e) => Some(e),
      Error::Buffer(e) => Some(e),
      Error::Texture(e) => Some(e),
      Error::Pipeline(e) => Some(e),
    }
  }
}

impl From<LoaderError> for Error {
  fn from(e: LoaderError) -> Self {
    Error::Loader(e)
  }
}

impl From<ContextError> for Error {
  fn from(e: ContextError) -> Self {
    Error::Context(e)
  }
}

impl From<StageError> for Error {
  fn from(e: StageError) -> Self {
    Error::Stage(e)
  }
}

impl From<ProgramError> for Error {
  fn from(e: ProgramError) -> Self {
    match e {
      ProgramError::StageError(e) => Error::Stage(e),
      e => Error::Program(e),
    }
  }
}

impl From<BufferError> for Error {
  fn from(e: BufferError) -> Self {
    Error::Buffer(e)
  }
}

impl From<TextureError> for Error {
  fn from(e: TextureError) -> Self {
    Error::Texture(e)
  }
}

impl From<PipelineError> for Error {
  fn from(e: PipelineError) -> Self {
    Error::Pipeline(e)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_code_is_hexadecimal() {
    assert_eq!(ErrorCode(0x3009).to_string(), "0x3009");
    assert_eq!(ErrorCode(0x501).to_string(), "0x501");
  }

  #[test]
  fn context_errors_keep_their_step() {
    let e = Error::from(ContextError::NoMatchingConfig);
    assert_eq!(e.step(), "choose-config");

    let e = Error::from(ContextError::MakeCurrentFailed(ErrorCode(0x3009)));
    assert_eq!(e.step(), "make-current");
    assert!(e.to_string().contains("0x3009"));
  }

  #[test]
  fn program_stage_errors_are_compile_failures() {
    let e = Error::from(ProgramError::StageError(StageError::compilation_failed(
      crate::shader::StageType::FragmentShader,
      "0:1: syntax error",
    )));

    assert_eq!(e.step(), "compile");
  }
}
