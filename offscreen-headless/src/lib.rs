//! A headless, in-process graphics driver for offscreen.
//!
//! [`Headless`] behaves like an EGL platform and [`HeadlessDevice`] like an OpenGL device, without
//! any GPU or system library behind them. It is what tests and CI use to exercise the whole
//! bootstrap / compile / upload / draw / teardown lifecycle.
//!
//! On top of mimicking the driver, it can:
//!
//! - Fail any step on purpose, with the error code a real driver would raise; see [`Faults`].
//! - Count every live driver object, so that leaks show up; see [`Census`].
//!
//! ```
//! use offscreen::config::{NativeDisplay, Profile};
//! use offscreen::context;
//! use offscreen_headless::Headless;
//!
//! let mut platform = offscreen::loader::load::<Headless>().unwrap();
//! let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded()).unwrap();
//!
//! assert_eq!(ctx.config().id, 2);
//!
//! ctx.teardown();
//! assert!(platform.census().is_clean());
//! ```

mod device;
mod glsl;
mod registry;

use std::cell::RefCell;
use std::rc::Rc;

use offscreen::backend::platform::{Load, Platform};
use offscreen::config::{
  Api, ConfigAttribs, ConfigDescription, ContextVersion, NativeDisplay, Renderable, SurfaceDim,
  SurfaceType,
};
use offscreen::loader::{LoaderError, Version};
use offscreen::ErrorCode;

pub use crate::device::HeadlessDevice;
pub use crate::registry::Census;
use crate::registry::{
  Registry, EGL_BAD_ALLOC, EGL_BAD_ATTRIBUTE, EGL_BAD_CONFIG, EGL_BAD_CONTEXT, EGL_BAD_DISPLAY,
  EGL_BAD_MATCH, EGL_BAD_PARAMETER, EGL_BAD_SURFACE, EGL_NOT_INITIALIZED,
};

/// The only display the headless driver knows about.
const DISPLAY: u32 = 0xd15;

const DRIVER_VERSION: Version = Version::new(1, 5);

/// Steps to fail on purpose.
///
/// Every flag makes the matching driver call fail the way a real driver would.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Faults {
  /// Return the “no display” sentinel.
  pub no_display: bool,
  pub initialize: bool,
  pub choose_config: bool,
  pub surface: bool,
  pub bind_api: bool,
  pub context: bool,
  pub make_current: bool,
  /// Device entry points cannot be resolved.
  pub device: bool,
  /// Buffer allocations run out of memory.
  pub buffer: bool,
  /// Texture allocations run out of memory.
  pub texture: bool,
}

/// Headless platform.
#[derive(Debug)]
pub struct Headless {
  registry: Rc<RefCell<Registry>>,
}

impl Default for Headless {
  fn default() -> Self {
    Headless::new()
  }
}

impl Headless {
  /// A platform exposing [`Headless::default_configs`] and failing nothing.
  pub fn new() -> Self {
    Headless::with_configs(Headless::default_configs())
  }

  /// A platform exposing the given configurations, in that order.
  pub fn with_configs(configs: Vec<ConfigDescription>) -> Self {
    Headless {
      registry: Rc::new(RefCell::new(Registry::new(configs, Faults::default()))),
    }
  }

  /// Fail the steps flagged in `faults`.
  pub fn with_faults(self, faults: Faults) -> Self {
    self.set_faults(faults);
    self
  }

  pub fn set_faults(&self, faults: Faults) {
    self.registry.borrow_mut().faults = faults;
  }

  /// Live driver objects.
  pub fn census(&self) -> Census {
    self.registry.borrow().census()
  }

  /// Configurations exposed by default, in driver order:
  ///
  /// 1. RGB565, window only, OpenGL ES 2 and OpenGL.
  /// 2. RGBA8, window and pbuffer, OpenGL ES 2.
  /// 3. RGBA8, pbuffer, OpenGL ES 2 and OpenGL.
  /// 4. RGB10A2, pbuffer, OpenGL ES 2 and OpenGL.
  /// 5. RGBA16, pbuffer, OpenGL.
  pub fn default_configs() -> Vec<ConfigDescription> {
    let gles_gl = Renderable::OPENGL_ES2 | Renderable::OPENGL;

    vec![
      config(1, [5, 6, 5, 0], SurfaceType::WINDOW, gles_gl),
      config(
        2,
        [8, 8, 8, 8],
        SurfaceType::WINDOW | SurfaceType::PBUFFER,
        Renderable::OPENGL_ES2,
      ),
      config(3, [8, 8, 8, 8], SurfaceType::PBUFFER, gles_gl),
      config(4, [10, 10, 10, 2], SurfaceType::PBUFFER, gles_gl),
      config(5, [16, 16, 16, 16], SurfaceType::PBUFFER, Renderable::OPENGL),
    ]
  }

  fn fail<T>(&self, code: ErrorCode) -> Result<T, ErrorCode> {
    Err(self.registry.borrow_mut().platform_fail(code))
  }

  /// Check that the display is the one we handed out and that it’s usable.
  fn check_display(&self, display: &u32) -> Result<(), ErrorCode> {
    let registry = self.registry.borrow();

    if *display != DISPLAY || !registry.display_open {
      drop(registry);
      self.fail(EGL_BAD_DISPLAY)
    } else if !registry.display_initialized {
      drop(registry);
      self.fail(EGL_NOT_INITIALIZED)
    } else {
      Ok(())
    }
  }

  fn describe(&self, config: i32) -> Option<ConfigDescription> {
    self
      .registry
      .borrow()
      .configs
      .iter()
      .find(|desc| desc.id == config)
      .copied()
  }
}

fn config(
  id: i32,
  [red_size, green_size, blue_size, alpha_size]: [u8; 4],
  surface_type: SurfaceType,
  renderable: Renderable,
) -> ConfigDescription {
  ConfigDescription {
    id,
    red_size,
    green_size,
    blue_size,
    alpha_size,
    surface_type,
    renderable,
  }
}

fn is_supported(version: ContextVersion) -> bool {
  match version {
    ContextVersion::Desktop { major, minor } => match major {
      1 | 2 => true,
      3 => minor <= 3,
      4 => minor <= 6,
      _ => false,
    },
    ContextVersion::Embedded { client } => client == 2 || client == 3,
  }
}

unsafe impl Load for Headless {
  fn load() -> Result<Self, LoaderError> {
    Ok(Headless::new())
  }

  fn version(&self) -> Version {
    DRIVER_VERSION
  }

  fn unload(self) {
    log::debug!("headless driver unloaded ({:?})", self.census());
  }
}

unsafe impl Platform for Headless {
  type DisplayRepr = u32;

  type ConfigRepr = i32;

  type SurfaceRepr = u32;

  type ContextRepr = u32;

  type Device = HeadlessDevice;

  unsafe fn get_display(&mut self, hint: NativeDisplay) -> Option<Self::DisplayRepr> {
    let mut registry = self.registry.borrow_mut();

    if registry.faults.no_display {
      return None;
    }

    if let NativeDisplay::Raw(ptr) = hint {
      if ptr.is_null() {
        return None;
      }
    }

    registry.display_open = true;
    Some(DISPLAY)
  }

  unsafe fn initialize(&mut self, display: &Self::DisplayRepr) -> Result<Version, ErrorCode> {
    if *display != DISPLAY || !self.registry.borrow().display_open {
      return self.fail(EGL_BAD_DISPLAY);
    }

    if self.registry.borrow().faults.initialize {
      return self.fail(EGL_NOT_INITIALIZED);
    }

    self.registry.borrow_mut().display_initialized = true;
    Ok(DRIVER_VERSION)
  }

  unsafe fn choose_configs(
    &mut self,
    display: &Self::DisplayRepr,
    attribs: &ConfigAttribs,
  ) -> Result<Vec<Self::ConfigRepr>, ErrorCode> {
    self.check_display(display)?;

    if self.registry.borrow().faults.choose_config {
      return self.fail(EGL_BAD_ATTRIBUTE);
    }

    let configs = self
      .registry
      .borrow()
      .configs
      .iter()
      .filter(|desc| desc.satisfies(attribs))
      .map(|desc| desc.id)
      .collect();

    Ok(configs)
  }

  unsafe fn describe_config(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
  ) -> Result<ConfigDescription, ErrorCode> {
    self.check_display(display)?;

    match self.describe(config) {
      Some(desc) => Ok(desc),
      None => self.fail(EGL_BAD_CONFIG),
    }
  }

  unsafe fn create_pbuffer(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    dim: SurfaceDim,
  ) -> Result<Self::SurfaceRepr, ErrorCode> {
    self.check_display(display)?;

    let desc = match self.describe(config) {
      Some(desc) => desc,
      None => return self.fail(EGL_BAD_CONFIG),
    };

    if self.registry.borrow().faults.surface {
      return self.fail(EGL_BAD_ALLOC);
    }

    if !desc.surface_type.contains(SurfaceType::PBUFFER) {
      return self.fail(EGL_BAD_MATCH);
    }

    let len = match dim.rgba8_len() {
      Some(len) => len,
      None => return self.fail(EGL_BAD_ALLOC),
    };

    let mut registry = self.registry.borrow_mut();
    let handle = registry.allocate();
    registry.surfaces.insert(
      handle,
      registry::Surface {
        config,
        dim,
        pixels: vec![0; len],
      },
    );

    Ok(handle)
  }

  unsafe fn bind_api(&mut self, api: Api) -> Result<(), ErrorCode> {
    if self.registry.borrow().faults.bind_api {
      return self.fail(EGL_BAD_PARAMETER);
    }

    self.registry.borrow_mut().bound_api = api;
    Ok(())
  }

  unsafe fn create_context(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    version: ContextVersion,
  ) -> Result<Self::ContextRepr, ErrorCode> {
    self.check_display(display)?;

    let desc = match self.describe(config) {
      Some(desc) => desc,
      None => return self.fail(EGL_BAD_CONFIG),
    };

    let bound_api = self.registry.borrow().bound_api;

    if self.registry.borrow().faults.context {
      return self.fail(EGL_BAD_ALLOC);
    }

    if !desc.renderable.contains(bound_api.renderable()) {
      return self.fail(EGL_BAD_CONFIG);
    }

    if !is_supported(version) {
      return self.fail(EGL_BAD_MATCH);
    }

    let mut registry = self.registry.borrow_mut();
    let handle = registry.allocate();
    registry.contexts.insert(handle, registry::Context { config });

    Ok(handle)
  }

  unsafe fn make_current(
    &mut self,
    display: &Self::DisplayRepr,
    surface: &Self::SurfaceRepr,
    context: &Self::ContextRepr,
  ) -> Result<(), ErrorCode> {
    self.check_display(display)?;
    self.registry.borrow_mut().count_binding();

    if self.registry.borrow().faults.make_current {
      return self.fail(EGL_BAD_MATCH);
    }

    let (surface_config, context_config) = {
      let registry = self.registry.borrow();
      (
        registry.surfaces.get(surface).map(|s| s.config),
        registry.contexts.get(context).map(|c| c.config),
      )
    };

    match (surface_config, context_config) {
      (None, _) => self.fail(EGL_BAD_SURFACE),
      (_, None) => self.fail(EGL_BAD_CONTEXT),
      (Some(a), Some(b)) if a != b => self.fail(EGL_BAD_MATCH),
      _ => {
        self.registry.borrow_mut().current = Some((*surface, *context));
        Ok(())
      }
    }
  }

  unsafe fn release_current(&mut self, display: &Self::DisplayRepr) -> Result<(), ErrorCode> {
    self.check_display(display)?;
    self.registry.borrow_mut().current = None;
    Ok(())
  }

  unsafe fn device(&mut self) -> Result<Self::Device, LoaderError> {
    if self.registry.borrow().faults.device {
      return Err(LoaderError::MissingDeviceSymbol("glCreateShader"));
    }

    Ok(HeadlessDevice::new(self.registry.clone()))
  }

  unsafe fn destroy_context(
    &mut self,
    display: &Self::DisplayRepr,
    context: Self::ContextRepr,
  ) -> Result<(), ErrorCode> {
    self.check_display(display)?;

    let mut registry = self.registry.borrow_mut();
    if registry.contexts.remove(&context).is_none() {
      return Err(registry.platform_fail(EGL_BAD_CONTEXT));
    }

    Ok(())
  }

  unsafe fn destroy_surface(
    &mut self,
    display: &Self::DisplayRepr,
    surface: Self::SurfaceRepr,
  ) -> Result<(), ErrorCode> {
    self.check_display(display)?;

    let mut registry = self.registry.borrow_mut();
    if registry.surfaces.remove(&surface).is_none() {
      return Err(registry.platform_fail(EGL_BAD_SURFACE));
    }

    Ok(())
  }

  unsafe fn terminate(&mut self, display: Self::DisplayRepr) -> Result<(), ErrorCode> {
    if display != DISPLAY {
      return self.fail(EGL_BAD_DISPLAY);
    }

    // objects still alive are kept so that they show up in the census
    let mut registry = self.registry.borrow_mut();
    registry.display_open = false;
    registry.display_initialized = false;
    registry.current = None;

    Ok(())
  }

  fn last_error(&mut self) -> Option<ErrorCode> {
    self.registry.borrow_mut().take_platform_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn initialized() -> Headless {
    let mut platform = Headless::new();

    unsafe {
      let display = platform.get_display(NativeDisplay::Default).unwrap();
      platform.initialize(&display).unwrap();
    }

    platform
  }

  #[test]
  fn null_native_display_has_no_display() {
    let mut platform = Headless::new();
    let display = unsafe { platform.get_display(NativeDisplay::Raw(std::ptr::null_mut())) };

    assert!(display.is_none());
    assert_eq!(platform.census().displays, 0);
  }

  #[test]
  fn uninitialized_display_is_rejected() {
    let mut platform = Headless::new();

    let result = unsafe {
      let display = platform.get_display(NativeDisplay::Default).unwrap();
      platform.choose_configs(&display, &ConfigAttribs::default())
    };

    assert_eq!(result, Err(EGL_NOT_INITIALIZED));
    assert_eq!(platform.last_error(), Some(EGL_NOT_INITIALIZED));
    assert_eq!(platform.last_error(), None);
  }

  #[test]
  fn configs_are_filtered_in_driver_order() {
    let mut platform = initialized();

    let desktop = unsafe { platform.choose_configs(&DISPLAY, &ConfigAttribs::default()) };
    let embedded = unsafe {
      platform.choose_configs(&DISPLAY, &ConfigAttribs::default().set_api(Api::OpenGlEs))
    };

    assert_eq!(desktop, Ok(vec![3, 5]));
    assert_eq!(embedded, Ok(vec![2, 3]));
  }

  #[test]
  fn window_only_config_cannot_back_a_pbuffer() {
    let mut platform = initialized();
    let surface = unsafe { platform.create_pbuffer(&DISPLAY, 1, SurfaceDim::default()) };

    assert_eq!(surface, Err(EGL_BAD_MATCH));
  }

  #[test]
  fn context_needs_a_renderable_config() {
    let mut platform = initialized();

    let context = unsafe {
      platform.bind_api(Api::OpenGl).unwrap();
      platform.create_context(&DISPLAY, 2, ContextVersion::Desktop { major: 3, minor: 0 })
    };

    assert_eq!(context, Err(EGL_BAD_CONFIG));
  }

  #[test]
  fn unsupported_versions_are_rejected() {
    let mut platform = initialized();

    let context = unsafe {
      platform.bind_api(Api::OpenGlEs).unwrap();
      platform.create_context(&DISPLAY, 3, ContextVersion::Embedded { client: 4 })
    };

    assert_eq!(context, Err(EGL_BAD_MATCH));
  }

  #[test]
  fn mismatching_configs_cannot_be_bound_together() {
    let mut platform = initialized();

    let result = unsafe {
      platform.bind_api(Api::OpenGlEs).unwrap();
      let surface = platform.create_pbuffer(&DISPLAY, 2, SurfaceDim::default()).unwrap();
      let context = platform
        .create_context(&DISPLAY, 3, ContextVersion::Embedded { client: 2 })
        .unwrap();

      platform.make_current(&DISPLAY, &surface, &context)
    };

    assert_eq!(result, Err(EGL_BAD_MATCH));
  }

  #[test]
  fn terminate_keeps_leaked_objects_visible() {
    let mut platform = initialized();

    unsafe {
      platform.create_pbuffer(&DISPLAY, 3, SurfaceDim::default()).unwrap();
      platform.terminate(DISPLAY).unwrap();
    }

    let census = platform.census();
    assert_eq!(census.displays, 0);
    assert_eq!(census.surfaces, 1);
    assert!(!census.is_clean());
  }
}
