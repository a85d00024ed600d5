use offscreen::config::{ConfigAttribs, NativeDisplay, Profile};
use offscreen::context::{self, ContextError};
use offscreen::loader::{self, Load as _};
use offscreen_egl::Egl;

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();
  let profile = Profile::embedded().set_attribs(ConfigAttribs::default().set_red_size(32));

  match context::bootstrap(&mut egl, NativeDisplay::Default, &profile) {
    Err(ContextError::NoMatchingConfig) => (),
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("a 32-bit red channel must not match"),
  }

  egl.unload();
}
