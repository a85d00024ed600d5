use offscreen_examples::{advanced_texture, basic_rendering, describe};
use offscreen_headless::{Faults, Headless};

#[test]
fn basic_rendering_runs_clean() {
  let mut platform = Headless::new();

  basic_rendering(&mut platform).unwrap();

  let census = platform.census();
  assert!(census.is_clean());
  assert_eq!(census.allocations, 2);
}

#[test]
fn advanced_texture_draws_once() {
  let mut platform = Headless::new();

  advanced_texture(&mut platform).unwrap();

  let census = platform.census();
  assert!(census.is_clean(), "{:?}", census);
  assert_eq!(census.draw_calls, 1);
}

#[test]
fn missing_configs_fail_at_choose_config() {
  let mut platform = Headless::with_configs(Vec::new());

  let err = basic_rendering(&mut platform).unwrap_err();

  assert_eq!(
    describe(&err),
    "choose-config: no configuration matches the desired attributes"
  );
  assert!(platform.census().is_clean());
}

#[test]
fn failing_uploads_release_everything() {
  let mut platform = Headless::new().with_faults(Faults {
    texture: true,
    ..Faults::default()
  });

  let err = advanced_texture(&mut platform).unwrap_err();

  assert_eq!(describe(&err), "upload-texture: texture allocation failed: 0x505");
  assert_eq!(platform.census().draw_calls, 0);
  assert!(platform.census().is_clean());
}

#[test]
fn failing_display_is_reported_with_its_step() {
  let mut platform = Headless::new().with_faults(Faults {
    no_display: true,
    ..Faults::default()
  });

  let err = advanced_texture(&mut platform).unwrap_err();

  assert_eq!(err.step(), "open-display");
  assert_eq!(platform.census().allocations, 0);
}
