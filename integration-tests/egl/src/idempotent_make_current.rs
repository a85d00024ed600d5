use offscreen::config::{NativeDisplay, Profile};
use offscreen::context;
use offscreen::loader::{self, Load as _};
use offscreen_egl::Egl;

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();
  let mut ctx = context::bootstrap(&mut egl, NativeDisplay::Default, &Profile::desktop()).unwrap();

  ctx.make_current().unwrap();
  ctx.make_current().unwrap();
  ctx.check_error().unwrap();

  ctx.teardown();
  egl.unload();
}
