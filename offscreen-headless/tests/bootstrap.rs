use offscreen::config::{Api, ConfigAttribs, ContextVersion, NativeDisplay, Profile};
use offscreen::context::{self, Bootstrap, ContextError};
use offscreen::ErrorCode;
use offscreen_headless::{Faults, Headless};

#[test]
fn chosen_config_satisfies_attributes() {
  let mut platform = Headless::new();

  let attribs = [
    ConfigAttribs::default(),
    ConfigAttribs::default().set_api(Api::OpenGlEs),
    ConfigAttribs::default().set_red_size(10).set_alpha_size(0),
  ];

  for attribs in &attribs {
    let bootstrap = Bootstrap::new(&mut platform)
      .open_display(NativeDisplay::Default)
      .unwrap()
      .initialize()
      .unwrap()
      .choose_config(attribs)
      .unwrap();

    assert!(bootstrap.config().satisfies(attribs), "{}", bootstrap.config());
    bootstrap.teardown();
  }

  assert!(platform.census().is_clean());
}

#[test]
fn first_matching_config_wins() {
  let mut platform = Headless::new();

  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::desktop()).unwrap();
  assert_eq!(ctx.config().id, 3);
  assert_eq!(ctx.api(), Api::OpenGl);
  ctx.teardown();

  let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();
  assert_eq!(ctx.config().id, 2);
  assert_eq!(ctx.api(), Api::OpenGlEs);
  ctx.teardown();
}

#[test]
fn display_can_be_reopened_after_teardown() {
  let mut platform = Headless::new();

  for _ in 0..3 {
    let ctx =
      context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();
    assert_eq!(ctx.device().census().displays, 1);
    ctx.teardown();

    assert!(platform.census().is_clean());
  }
}

#[test]
fn open_display_then_teardown_leaves_no_lock() {
  let mut platform = Headless::new();

  Bootstrap::new(&mut platform)
    .open_display(NativeDisplay::Default)
    .unwrap()
    .teardown();
  assert!(platform.census().is_clean());

  let bootstrap = Bootstrap::new(&mut platform)
    .open_display(NativeDisplay::Default)
    .unwrap()
    .initialize()
    .unwrap();
  bootstrap.teardown();

  assert!(platform.census().is_clean());
}

#[test]
fn make_current_is_idempotent() {
  let mut platform = Headless::new();
  let mut ctx =
    context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();

  let before = ctx.device().census();
  assert_eq!(before.bindings, 1);

  ctx.make_current().unwrap();
  ctx.make_current().unwrap();

  assert_eq!(ctx.device().census(), before);
  ctx.teardown();
}

#[test]
fn impossible_config_leaves_nothing_behind() {
  let mut platform = Headless::new();
  let profile = Profile::embedded().set_attribs(ConfigAttribs::default().set_red_size(32));

  let err = context::bootstrap(&mut platform, NativeDisplay::Default, &profile).err();

  assert!(matches!(err, Some(ContextError::NoMatchingConfig)));
  assert!(platform.census().is_clean());
}

#[test]
fn null_native_display_is_no_display() {
  let mut platform = Headless::new();
  let hint = NativeDisplay::Raw(std::ptr::null_mut());

  let err = context::bootstrap(&mut platform, hint, &Profile::embedded()).err();

  assert!(matches!(err, Some(ContextError::NoDisplay)));
  assert_eq!(platform.census().allocations, 0);
}

#[test]
fn every_failing_step_unwinds() {
  let none = Faults::default();
  let cases = [
    (Faults { no_display: true, ..none }, "open-display"),
    (Faults { initialize: true, ..none }, "initialize-display"),
    (Faults { choose_config: true, ..none }, "choose-config"),
    (Faults { surface: true, ..none }, "create-surface"),
    (Faults { bind_api: true, ..none }, "bind-api"),
    (Faults { context: true, ..none }, "create-context"),
    (Faults { make_current: true, ..none }, "make-current"),
    (Faults { device: true, ..none }, "make-current"),
  ];

  for (faults, step) in &cases {
    let mut platform = Headless::new().with_faults(*faults);

    let err = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::desktop())
      .err()
      .unwrap();

    assert_eq!(err.step(), *step, "{:?}", faults);
    assert!(platform.census().is_clean(), "{:?} leaked {:?}", faults, platform.census());
  }
}

#[test]
fn driver_codes_are_carried() {
  let mut platform = Headless::new().with_faults(Faults {
    surface: true,
    ..Faults::default()
  });

  let err = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).err();

  match err {
    Some(ContextError::SurfaceCreationFailed(code)) => {
      assert_eq!(code, ErrorCode(0x3003));
      assert_eq!(
        offscreen::Error::from(ContextError::SurfaceCreationFailed(code)).to_string(),
        "surface creation failed: 0x3003"
      );
    }
    _ => panic!("expected a surface creation failure"),
  }
}

#[test]
fn one_context_per_thread() {
  let mut first = Headless::new();
  let mut second = Headless::new();

  let ctx = context::bootstrap(&mut first, NativeDisplay::Default, &Profile::embedded()).unwrap();
  let err = context::bootstrap(&mut second, NativeDisplay::Default, &Profile::embedded()).err();

  assert!(matches!(err, Some(ContextError::ThreadAlreadyHasContext)));
  assert!(second.census().is_clean());

  ctx.teardown();

  let ctx = context::bootstrap(&mut second, NativeDisplay::Default, &Profile::embedded()).unwrap();
  ctx.teardown();
}

#[test]
fn version_must_match_bound_api() {
  let mut platform = Headless::new();
  let profile = Profile {
    version: ContextVersion::Desktop { major: 3, minor: 0 },
    ..Profile::embedded()
  };

  let err = context::bootstrap(&mut platform, NativeDisplay::Default, &profile).err();

  match err {
    Some(ContextError::IncompatibleVersion { bound, requested }) => {
      assert_eq!(bound, Api::OpenGlEs);
      assert_eq!(requested, profile.version);
    }
    _ => panic!("expected an incompatible version"),
  }

  let census = platform.census();
  assert!(census.is_clean());
  // the surface got created, the context never was
  assert_eq!(census.allocations, 1);
}
