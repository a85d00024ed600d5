//! EGL platform implementation.

use std::os::raw::c_void;
use std::ptr;

use khronos_egl as egl;
use offscreen::backend::platform::{Load, Platform};
use offscreen::config::{
  Api, ConfigAttribs, ConfigDescription, ContextVersion, NativeDisplay, Renderable, SurfaceDim,
  SurfaceType,
};
use offscreen::loader::{LoaderError, Version};
use offscreen::ErrorCode;

use crate::gl20::GL20;

// EGL 1.5 / EGL_KHR_create_context attributes; the major version shares its value with the ES
// client version
const CONTEXT_MAJOR_VERSION: egl::Int = 0x3098;
const CONTEXT_MINOR_VERSION: egl::Int = 0x30FB;
const CONTEXT_CLIENT_VERSION: egl::Int = 0x3098;

fn error_code(e: egl::Error) -> ErrorCode {
  ErrorCode(e.native() as u32)
}

fn egl_version(version: egl::Version) -> Version {
  match version {
    egl::Version::EGL1_0 => Version::new(1, 0),
    egl::Version::EGL1_1 => Version::new(1, 1),
    egl::Version::EGL1_2 => Version::new(1, 2),
    egl::Version::EGL1_3 => Version::new(1, 3),
    egl::Version::EGL1_4 => Version::new(1, 4),
    egl::Version::EGL1_5 => Version::new(1, 5),
  }
}

/// EGL platform, loaded from the system library at runtime.
pub struct Egl {
  egl: egl::DynamicInstance<egl::EGL1_4>,
}

impl Egl {
  fn config_attrib(
    &self,
    display: egl::Display,
    config: egl::Config,
    attribute: egl::Int,
  ) -> Result<egl::Int, ErrorCode> {
    self
      .egl
      .get_config_attrib(display, config, attribute)
      .map_err(error_code)
  }
}

unsafe impl Load for Egl {
  fn load() -> Result<Self, LoaderError> {
    let egl = unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() }
      .map_err(|e| LoaderError::library_not_found(e.to_string()))?;

    log::debug!("EGL {} entry points resolved", egl.version());

    Ok(Egl { egl })
  }

  /// Version of the entry points found in the library.
  fn version(&self) -> Version {
    egl_version(self.egl.version())
  }

  fn unload(self) {
    log::debug!("unloading EGL");
  }
}

unsafe impl Platform for Egl {
  type DisplayRepr = egl::Display;

  type ConfigRepr = egl::Config;

  type SurfaceRepr = egl::Surface;

  type ContextRepr = egl::Context;

  type Device = GL20;

  unsafe fn get_display(&mut self, hint: NativeDisplay) -> Option<Self::DisplayRepr> {
    let native = match hint {
      NativeDisplay::Default => egl::DEFAULT_DISPLAY,
      NativeDisplay::Raw(ptr) => ptr,
    };

    self.egl.get_display(native)
  }

  unsafe fn initialize(&mut self, display: &Self::DisplayRepr) -> Result<Version, ErrorCode> {
    let (major, minor) = self.egl.initialize(*display).map_err(error_code)?;
    Ok(Version::new(major as u16, minor as u16))
  }

  unsafe fn choose_configs(
    &mut self,
    display: &Self::DisplayRepr,
    attribs: &ConfigAttribs,
  ) -> Result<Vec<Self::ConfigRepr>, ErrorCode> {
    let attrib_list = [
      egl::SURFACE_TYPE,
      attribs.surface_type().bits() as egl::Int,
      egl::RED_SIZE,
      attribs.red_size().into(),
      egl::GREEN_SIZE,
      attribs.green_size().into(),
      egl::BLUE_SIZE,
      attribs.blue_size().into(),
      egl::ALPHA_SIZE,
      attribs.alpha_size().into(),
      egl::RENDERABLE_TYPE,
      attribs.renderable().bits() as egl::Int,
      egl::NONE,
    ];

    let count = self
      .egl
      .matching_config_count(*display, &attrib_list)
      .map_err(error_code)?;

    let mut configs = Vec::with_capacity(count);
    self
      .egl
      .choose_config(*display, &attrib_list, &mut configs)
      .map_err(error_code)?;

    Ok(configs)
  }

  unsafe fn describe_config(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
  ) -> Result<ConfigDescription, ErrorCode> {
    let size = |attribute| {
      self
        .config_attrib(*display, config, attribute)
        .map(|size| size.max(0).min(u8::MAX.into()) as u8)
    };

    Ok(ConfigDescription {
      id: self.config_attrib(*display, config, egl::CONFIG_ID)?,
      red_size: size(egl::RED_SIZE)?,
      green_size: size(egl::GREEN_SIZE)?,
      blue_size: size(egl::BLUE_SIZE)?,
      alpha_size: size(egl::ALPHA_SIZE)?,
      surface_type: SurfaceType::from_bits(
        self.config_attrib(*display, config, egl::SURFACE_TYPE)? as u32,
      ),
      renderable: Renderable::from_bits(
        self.config_attrib(*display, config, egl::RENDERABLE_TYPE)? as u32,
      ),
    })
  }

  unsafe fn create_pbuffer(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    dim: SurfaceDim,
  ) -> Result<Self::SurfaceRepr, ErrorCode> {
    let attrib_list = [
      egl::WIDTH,
      dim.width as egl::Int,
      egl::HEIGHT,
      dim.height as egl::Int,
      egl::NONE,
    ];

    self
      .egl
      .create_pbuffer_surface(*display, config, &attrib_list)
      .map_err(error_code)
  }

  unsafe fn bind_api(&mut self, api: Api) -> Result<(), ErrorCode> {
    let api = match api {
      Api::OpenGl => egl::OPENGL_API,
      Api::OpenGlEs => egl::OPENGL_ES_API,
    };

    self.egl.bind_api(api).map_err(error_code)
  }

  unsafe fn create_context(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    version: ContextVersion,
  ) -> Result<Self::ContextRepr, ErrorCode> {
    let attrib_list = match version {
      ContextVersion::Desktop { major, minor } => vec![
        CONTEXT_MAJOR_VERSION,
        major.into(),
        CONTEXT_MINOR_VERSION,
        minor.into(),
        egl::NONE,
      ],
      ContextVersion::Embedded { client } => vec![CONTEXT_CLIENT_VERSION, client.into(), egl::NONE],
    };

    self
      .egl
      .create_context(*display, config, None, &attrib_list)
      .map_err(error_code)
  }

  unsafe fn make_current(
    &mut self,
    display: &Self::DisplayRepr,
    surface: &Self::SurfaceRepr,
    context: &Self::ContextRepr,
  ) -> Result<(), ErrorCode> {
    self
      .egl
      .make_current(*display, Some(*surface), Some(*surface), Some(*context))
      .map_err(error_code)
  }

  unsafe fn release_current(&mut self, display: &Self::DisplayRepr) -> Result<(), ErrorCode> {
    self
      .egl
      .make_current(*display, None, None, None)
      .map_err(error_code)
  }

  unsafe fn device(&mut self) -> Result<Self::Device, LoaderError> {
    let egl = &self.egl;

    GL20::load(|symbol| {
      egl
        .get_proc_address(symbol)
        .map_or(ptr::null(), |f| f as *const c_void)
    })
  }

  unsafe fn destroy_context(
    &mut self,
    display: &Self::DisplayRepr,
    context: Self::ContextRepr,
  ) -> Result<(), ErrorCode> {
    self
      .egl
      .destroy_context(*display, context)
      .map_err(error_code)
  }

  unsafe fn destroy_surface(
    &mut self,
    display: &Self::DisplayRepr,
    surface: Self::SurfaceRepr,
  ) -> Result<(), ErrorCode> {
    self
      .egl
      .destroy_surface(*display, surface)
      .map_err(error_code)
  }

  unsafe fn terminate(&mut self, display: Self::DisplayRepr) -> Result<(), ErrorCode> {
    self.egl.terminate(display).map_err(error_code)
  }

  fn last_error(&mut self) -> Option<ErrorCode> {
    self.egl.get_error().map(error_code)
  }
}
