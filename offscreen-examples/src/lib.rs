//! Illustrative offscreen programs.
//!
//! Each program is generic over the platform, so that the binaries can run them against EGL or,
//! with `--headless`, against the in-process driver:
//!
//! - [`basic_rendering`] brings a desktop OpenGL 3.0 context up and tears it down.
//! - [`advanced_texture`] brings an OpenGL ES 2 context up and draws a textured quad.
//!
//! Set `RUST_LOG=debug` to follow the lifecycle.

use std::process::ExitCode;

use offscreen::backend::platform::Platform;
use offscreen::config::{NativeDisplay, Profile};
use offscreen::context::{self, Context};
use offscreen::loader;
use offscreen::pipeline::{Geometry, PipelineState, TextureBinding, VertexAttrib};
use offscreen::Error;

pub const VS: &str = "
attribute vec4 position;
attribute vec2 texCoord;
varying vec2 vTexCoord;
void main() {
    gl_Position = position;
    vTexCoord = texCoord;
}
";

pub const FS: &str = "
precision mediump float;
varying vec2 vTexCoord;
uniform sampler2D texture;
void main() {
    gl_FragColor = texture2D(texture, vTexCoord);
}
";

/// Interleaved quad vertices: position (3 floats) then texture coordinates (2 floats).
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 20] = [
  -0.5, -0.5, 0., 0., 1.,
   0.5, -0.5, 0., 1., 1.,
  -0.5,  0.5, 0., 0., 0.,
   0.5,  0.5, 0., 1., 0.,
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// 2×2 RGBA8 checker: red, green, blue, yellow.
#[rustfmt::skip]
pub const CHECKER: [u8; 16] = [
  255, 0, 0, 255,    0, 255, 0, 255,
  0, 0, 255, 255,    255, 255, 0, 255,
];

/// Bring a desktop OpenGL 3.0 context up on the default display and tear it down.
pub fn basic_rendering<P>(platform: &mut P) -> Result<(), Error>
where
  P: Platform,
{
  let ctx = context::bootstrap(platform, NativeDisplay::Default, &Profile::desktop())?;

  println!("display version: {}", ctx.display_version());
  println!("{} context current on {}", ctx.api(), ctx.config());
  println!("context and surface successfully created!");

  ctx.teardown();
  Ok(())
}

/// Bring an OpenGL ES 2 context up and draw a textured quad.
pub fn advanced_texture<P>(platform: &mut P) -> Result<(), Error>
where
  P: Platform,
{
  let ctx = context::bootstrap(platform, NativeDisplay::Default, &Profile::embedded())?;

  textured_quad(&ctx)?;

  ctx.teardown();
  Ok(())
}

fn textured_quad<P>(ctx: &Context<P>) -> Result<(), Error>
where
  P: Platform,
{
  let program = ctx.new_program(VS, FS)?;
  let (vertices, indices) = ctx.upload_geometry(&QUAD_VERTICES, &QUAD_INDICES)?;
  let texture = ctx.upload_texture(2, 2, &CHECKER)?;

  let geometry = Geometry {
    vertices: &vertices,
    indices: &indices,
    layout: vec![
      VertexAttrib::floats(program.attrib_location("position"), 3, 5, 0),
      VertexAttrib::floats(program.attrib_location("texCoord"), 2, 5, 3),
    ],
  };

  let textures = [TextureBinding {
    location: program.uniform_location("texture"),
    unit: 0,
    texture: &texture,
  }];

  ctx.draw(
    &PipelineState::default(),
    &program,
    &geometry,
    &textures,
    QUAD_INDICES.len(),
  )?;

  println!("textured quad drawn ({} indices)", QUAD_INDICES.len());
  Ok(())
}

/// Whether `--headless` was passed on the command line.
pub fn headless_requested() -> bool {
  std::env::args().skip(1).any(|arg| arg == "--headless")
}

/// One-line diagnostic naming the failed step.
pub fn describe(e: &Error) -> String {
  format!("{}: {}", e.step(), e)
}

/// Load `P`, run `program` on it and unload it, turning the outcome into an exit code.
pub fn run<P, F>(program: F) -> ExitCode
where
  P: Platform,
  F: FnOnce(&mut P) -> Result<(), Error>,
{
  let result = loader::load::<P>()
    .map_err(Error::from)
    .and_then(|mut platform| {
      let result = program(&mut platform);
      platform.unload();
      result
    });

  match result {
    Ok(()) => ExitCode::SUCCESS,

    Err(e) => {
      eprintln!("{}", describe(&e));
      ExitCode::FAILURE
    }
  }
}
