use offscreen::loader::{self, Load as _};
use offscreen_egl::Egl;

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();

  offscreen_examples::advanced_texture(&mut egl).unwrap();
  egl.unload();
}
