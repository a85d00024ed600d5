//! Draw a textured quad in an OpenGL ES 2 off-screen context.
//!
//! Pass `--headless` to run against the in-process driver instead of the system EGL.

use std::process::ExitCode;

use offscreen_egl::Egl;
use offscreen_examples::{advanced_texture, headless_requested, run};
use offscreen_headless::Headless;

fn main() -> ExitCode {
  env_logger::init();

  if headless_requested() {
    run::<Headless, _>(advanced_texture)
  } else {
    run::<Egl, _>(advanced_texture)
  }
}
