use offscreen::buffer::{BufferError, BufferKind};
use offscreen::config::{NativeDisplay, Profile, SurfaceDim};
use offscreen::context;
use offscreen::pipeline::{Geometry, PipelineError, PipelineState, TextureBinding, VertexAttrib};
use offscreen::shader::{Location, ProgramError, StageError, StageType};
use offscreen::texture::TextureError;
use offscreen::ErrorCode;
use offscreen_headless::{Faults, Headless};

const VS: &str = "
attribute vec4 position;
attribute vec2 texCoord;
varying vec2 vTexCoord;

void main() {
  gl_Position = position;
  vTexCoord = texCoord;
}";

const FS: &str = "
precision mediump float;
varying vec2 vTexCoord;
uniform sampler2D texture;

void main() {
  gl_FragColor = texture2D(texture, vTexCoord);
}";

#[rustfmt::skip]
const QUAD: [f32; 20] = [
  -0.5, -0.5, 0., 0., 1.,
   0.5, -0.5, 0., 1., 1.,
  -0.5,  0.5, 0., 0., 0.,
   0.5,  0.5, 0., 1., 0.,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

#[rustfmt::skip]
const CHECKER: [u8; 16] = [
  255, 0, 0, 255,    0, 255, 0, 255,
  0, 0, 255, 255,    255, 255, 0, 255,
];

#[test]
fn invalid_stage_is_destroyed() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  match ctx.compile(StageType::VertexShader, "void main() {\n  gl_Position = ;\n}") {
    Err(StageError::CompilationFailed(StageType::VertexShader, log)) => {
      assert_eq!(log, "0:2: error: expression expected");
    }
    _ => panic!("the stage must not compile"),
  }

  assert_eq!(ctx.device().census().stages, 0);

  // later compilations are unaffected
  {
    let stage = ctx.compile(StageType::VertexShader, VS);
    assert!(stage.is_ok());
    assert_eq!(ctx.device().census().stages, 1);
  }

  ctx.teardown();
  assert!(platform.census().is_clean());
}

#[test]
fn link_failure_carries_the_log() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  let fs = "varying vec4 vColor;\nvoid main() {\n  gl_FragColor = vColor;\n}";

  match ctx.new_program(VS, fs) {
    Err(ProgramError::LinkFailed(log)) => assert!(log.contains("vColor"), "{}", log),
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("the program must not link"),
  }

  let census = ctx.device().census();
  assert_eq!(census.stages, 0);
  assert_eq!(census.programs, 0);
  ctx.teardown();
}

#[test]
fn stage_errors_in_programs_are_compile_errors() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  let err = ctx.new_program(VS, "void main() {").err().unwrap();
  assert_eq!(offscreen::Error::from(err).step(), "compile");

  // the vertex stage compiled and was destroyed along the way
  assert_eq!(ctx.device().census().stages, 0);
  ctx.teardown();
}

#[test]
fn locations() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();

    assert_eq!(program.attrib_location("position"), Location::new(0));
    assert_eq!(program.attrib_location("texCoord"), Location::new(1));
    assert_eq!(program.uniform_location("texture"), Location::new(0));

    assert_eq!(program.attrib_location("normal"), Location::ABSENT);
    assert!(program.uniform_location("time").is_absent());

    // stages are gone once linked
    assert_eq!(ctx.device().census().stages, 0);
    assert_eq!(ctx.device().census().programs, 1);
  }

  ctx.teardown();
  assert!(platform.census().is_clean());
}

#[test]
fn textured_quad() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();
    let (vertices, indices) = ctx.upload_geometry(&QUAD, &QUAD_INDICES).unwrap();
    let texture = ctx.upload_texture(2, 2, &CHECKER).unwrap();

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

    let state = PipelineState::default().set_clear_color([1., 0., 0., 1.]);
    ctx
      .draw(&state, &program, &geometry, &textures, QUAD_INDICES.len())
      .unwrap();

    let census = ctx.device().census();
    assert_eq!(census.draw_calls, 1);
    assert_eq!((census.programs, census.buffers, census.textures), (1, 2, 1));

    let pixels = ctx.read_pixels();
    assert_eq!(pixels.len(), 256 * 256 * 4);
    assert_eq!(&pixels[..4], &[255, 0, 0, 255]);
    assert_eq!(&pixels[pixels.len() - 4..], &[255, 0, 0, 255]);
  }

  assert!(ctx.check_error().is_ok());
  ctx.teardown();
  assert!(platform.census().is_clean());
}

#[test]
fn zero_sized_surface_draws_nothing() {
  let mut platform = Headless::new();
  let profile = Profile::embedded().set_dim(SurfaceDim::new(0, 0));
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &profile).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();
    let (vertices, indices) = ctx.upload_geometry(&QUAD, &QUAD_INDICES).unwrap();
    let geometry = Geometry {
      vertices: &vertices,
      indices: &indices,
      layout: vec![VertexAttrib::floats(Location::new(0), 3, 5, 0)],
    };

    ctx
      .draw(&PipelineState::default(), &program, &geometry, &[], QUAD_INDICES.len())
      .unwrap();

    assert!(ctx.read_pixels().is_empty());
    assert!(ctx.check_error().is_ok());
  }

  ctx.teardown();
  assert!(platform.census().is_clean());
}

#[test]
fn absent_attributes_are_skipped() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();
    let (vertices, indices) = ctx.upload_geometry(&QUAD, &QUAD_INDICES).unwrap();
    let geometry = Geometry {
      vertices: &vertices,
      indices: &indices,
      layout: vec![
        VertexAttrib::floats(program.attrib_location("position"), 3, 5, 0),
        VertexAttrib::floats(program.attrib_location("normal"), 3, 5, 0),
      ],
    };

    ctx
      .draw(&PipelineState::default(), &program, &geometry, &[], QUAD_INDICES.len())
      .unwrap();

    assert_eq!(ctx.device().census().draw_calls, 1);
  }

  ctx.teardown();
}

#[test]
fn index_count_is_checked_before_drawing() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();
    let (vertices, indices) = ctx.upload_geometry(&QUAD, &QUAD_INDICES).unwrap();
    let geometry = Geometry {
      vertices: &vertices,
      indices: &indices,
      layout: vec![VertexAttrib::floats(Location::new(0), 3, 5, 0)],
    };

    let err = ctx.draw(&PipelineState::default(), &program, &geometry, &[], 7);

    assert_eq!(err, Err(PipelineError::IndexOutOfRange { count: 7, len: 6 }));
    assert_eq!(ctx.device().census().draw_calls, 0);
  }

  ctx.teardown();
}

#[test]
fn device_errors_fail_the_draw() {
  let mut platform = Headless::new();
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  {
    let program = ctx.new_program(VS, FS).unwrap();
    // index 4 fetches past the last vertex
    let (vertices, indices) = ctx.upload_geometry(&QUAD, &[0u16, 1, 4]).unwrap();
    let geometry = Geometry {
      vertices: &vertices,
      indices: &indices,
      layout: vec![VertexAttrib::floats(Location::new(0), 3, 5, 0)],
    };

    let err = ctx.draw(&PipelineState::default(), &program, &geometry, &[], 3);

    assert_eq!(err, Err(PipelineError::Driver(ErrorCode(0x0502))));
    assert_eq!(ctx.device().census().draw_calls, 0);
    // the flag was popped by the failed draw
    assert!(ctx.check_error().is_ok());
  }

  ctx.teardown();
}

#[test]
fn uploads() {
  let mut platform = Headless::new().with_faults(Faults {
    buffer: true,
    ..Faults::default()
  });
  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  let err = ctx.upload_geometry(&QUAD, &QUAD_INDICES).err();
  assert_eq!(
    err,
    Some(BufferError::AllocationFailed(BufferKind::Array, ErrorCode(0x0505)))
  );

  let err = ctx.upload_geometry::<f32, u32>(&[], &QUAD_INDICES).err();
  assert_eq!(err, Some(BufferError::Empty(BufferKind::Array)));

  let err = ctx.upload_texture(2, 2, &CHECKER[..12]).err();
  assert_eq!(err, Some(TextureError::NotEnoughPixels(16, 12)));

  let err = ctx.upload_texture(0, 2, &[]).err();
  assert_eq!(err, Some(TextureError::EmptyTexture));

  let err = ctx.upload_texture(u32::MAX, u32::MAX, &CHECKER).err();
  assert_eq!(err, Some(TextureError::TooLarge(u32::MAX, u32::MAX)));

  let census = ctx.device().census();
  assert_eq!((census.buffers, census.textures), (0, 0));
  ctx.teardown();
}
