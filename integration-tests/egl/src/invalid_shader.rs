use offscreen::config::{NativeDisplay, Profile};
use offscreen::context;
use offscreen::loader::{self, Load as _};
use offscreen::shader::{StageError, StageType};
use offscreen_egl::Egl;

pub fn fixture() {
  let mut egl = loader::load::<Egl>().unwrap();
  let ctx = context::bootstrap(&mut egl, NativeDisplay::Default, &Profile::embedded()).unwrap();

  match ctx.compile(StageType::VertexShader, "void main() { gl_Position = ; }") {
    Err(StageError::CompilationFailed(_, log)) => assert!(!log.is_empty()),
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("the stage must not compile"),
  }

  ctx.teardown();
  egl.unload();
}
