use offscreen::config::{NativeDisplay, Profile};
use offscreen::context;
use offscreen::loader::{self, Load as _};
use offscreen::shader::Location;
use offscreen_egl::Egl;
use offscreen_examples::{FS, VS};

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();
  let ctx = context::bootstrap(&mut egl, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();

    assert_eq!(program.attrib_location("normal"), Location::ABSENT);
    assert!(!program.attrib_location("position").is_absent());
  }

  ctx.teardown();
  egl.unload();
}
