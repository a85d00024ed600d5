use offscreen::config::{NativeDisplay, Profile};
use offscreen::context;
use offscreen::loader::{self, Load as _};
use offscreen_egl::Egl;

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();

  for _ in 0..2 {
    let ctx = context::bootstrap(&mut egl, NativeDisplay::Default, &Profile::embedded()).unwrap();
    ctx.teardown();
  }

  egl.unload();
}
