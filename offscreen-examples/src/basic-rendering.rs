//! Bring a desktop OpenGL 3.0 off-screen context up, then tear it down.
//!
//! Pass `--headless` to run against the in-process driver instead of the system EGL.

use std::process::ExitCode;

use offscreen_egl::Egl;
use offscreen_examples::{basic_rendering, headless_requested, run};
use offscreen_headless::Headless;

fn main() -> ExitCode {
  env_logger::init();

  if headless_requested() {
    run::<Headless, _>(basic_rendering)
  } else {
    run::<Egl, _>(basic_rendering)
  }
}
