//! OpenGL device.
//!
//! This module implements the device side of offscreen with the subset of OpenGL shared by
//! desktop OpenGL 3.0 and OpenGL ES 2. The device type is [`GL20`].

mod buffer;
mod pipeline;
mod shader;
mod texture;

use std::marker::PhantomData;
use std::os::raw::c_void;

use offscreen::loader::LoaderError;
use offscreen::ErrorCode;

/// OpenGL device of the current context.
///
/// Entry points are process-global but only valid on the thread the context is current on, hence
/// `!Send` and `!Sync`.
#[derive(Debug)]
pub struct GL20 {
  _a: PhantomData<*const ()>,
}

impl GL20 {
  /// Resolve the OpenGL entry points with `loader`.
  ///
  /// # Unsafety
  ///
  /// A context must be current on the calling thread.
  pub(crate) unsafe fn load(mut loader: impl FnMut(&str) -> *const c_void) -> Result<Self, LoaderError> {
    gl::load_with(|s| loader(s));

    let required = [
      ("glCreateShader", gl::CreateShader::is_loaded()),
      ("glCreateProgram", gl::CreateProgram::is_loaded()),
      ("glGenBuffers", gl::GenBuffers::is_loaded()),
      ("glGenTextures", gl::GenTextures::is_loaded()),
      ("glDrawElements", gl::DrawElements::is_loaded()),
      ("glReadPixels", gl::ReadPixels::is_loaded()),
    ];

    if let Some((symbol, _)) = required.iter().find(|(_, loaded)| !loaded) {
      return Err(LoaderError::MissingDeviceSymbol(*symbol));
    }

    Ok(GL20 { _a: PhantomData })
  }
}

/// Pop the OpenGL error flag.
unsafe fn get_error() -> Option<ErrorCode> {
  match gl::GetError() {
    gl::NO_ERROR => None,
    code => Some(ErrorCode(code)),
  }
}
