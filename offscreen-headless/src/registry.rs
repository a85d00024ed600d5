//! Driver-side object bookkeeping.

use std::collections::HashMap;

use offscreen::buffer::BufferKind;
use offscreen::config::{Api, ConfigDescription, SurfaceDim};
use offscreen::texture::Sampler;
use offscreen::shader::StageType;
use offscreen::ErrorCode;

use crate::glsl::Interface;
use crate::Faults;

pub(crate) const EGL_SUCCESS: ErrorCode = ErrorCode(0x3000);
pub(crate) const EGL_NOT_INITIALIZED: ErrorCode = ErrorCode(0x3001);
pub(crate) const EGL_BAD_ALLOC: ErrorCode = ErrorCode(0x3003);
pub(crate) const EGL_BAD_ATTRIBUTE: ErrorCode = ErrorCode(0x3004);
pub(crate) const EGL_BAD_CONFIG: ErrorCode = ErrorCode(0x3005);
pub(crate) const EGL_BAD_CONTEXT: ErrorCode = ErrorCode(0x3006);
pub(crate) const EGL_BAD_DISPLAY: ErrorCode = ErrorCode(0x3008);
pub(crate) const EGL_BAD_MATCH: ErrorCode = ErrorCode(0x3009);
pub(crate) const EGL_BAD_PARAMETER: ErrorCode = ErrorCode(0x300C);
pub(crate) const EGL_BAD_SURFACE: ErrorCode = ErrorCode(0x300D);

pub(crate) const GL_INVALID_VALUE: ErrorCode = ErrorCode(0x0501);
pub(crate) const GL_INVALID_OPERATION: ErrorCode = ErrorCode(0x0502);
pub(crate) const GL_OUT_OF_MEMORY: ErrorCode = ErrorCode(0x0505);

#[derive(Debug)]
pub(crate) struct Surface {
  pub(crate) config: i32,
  pub(crate) dim: SurfaceDim,
  pub(crate) pixels: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct Context {
  pub(crate) config: i32,
}

#[derive(Debug)]
pub(crate) struct Stage {
  pub(crate) ty: StageType,
  pub(crate) compiled: Option<Interface>,
  pub(crate) log: String,
}

#[derive(Debug, Default)]
pub(crate) struct Program {
  pub(crate) attached: Vec<u32>,
  pub(crate) linked: Option<Interface>,
  pub(crate) log: String,
}

#[derive(Debug)]
pub(crate) struct Buffer {
  pub(crate) kind: BufferKind,
  pub(crate) bytes: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct Texture {
  pub(crate) size: [u32; 2],
  pub(crate) sampler: Sampler,
}

/// Live objects, as seen by the driver.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Census {
  /// Open display connections (zero or one).
  pub displays: usize,
  pub surfaces: usize,
  pub contexts: usize,
  pub stages: usize,
  pub programs: usize,
  pub buffers: usize,
  pub textures: usize,
  /// Total number of objects ever allocated.
  pub allocations: u64,
  /// Total number of draw calls issued.
  pub draw_calls: u64,
  /// Total number of surface / context bindings requested.
  pub bindings: u64,
}

impl Census {
  /// Whether no driver object is alive anymore.
  pub fn is_clean(&self) -> bool {
    self.displays == 0
      && self.surfaces == 0
      && self.contexts == 0
      && self.stages == 0
      && self.programs == 0
      && self.buffers == 0
      && self.textures == 0
  }
}

#[derive(Debug)]
pub(crate) struct Registry {
  pub(crate) configs: Vec<ConfigDescription>,
  pub(crate) faults: Faults,
  pub(crate) display_open: bool,
  pub(crate) display_initialized: bool,
  pub(crate) bound_api: Api,
  pub(crate) surfaces: HashMap<u32, Surface>,
  pub(crate) contexts: HashMap<u32, Context>,
  pub(crate) current: Option<(u32, u32)>,
  pub(crate) stages: HashMap<u32, Stage>,
  pub(crate) programs: HashMap<u32, Program>,
  pub(crate) buffers: HashMap<u32, Buffer>,
  pub(crate) textures: HashMap<u32, Texture>,
  pub(crate) viewport: [u32; 2],
  platform_error: ErrorCode,
  device_error: Option<ErrorCode>,
  next_handle: u32,
  allocations: u64,
  draw_calls: u64,
  bindings: u64,
}

impl Registry {
  pub(crate) fn new(configs: Vec<ConfigDescription>, faults: Faults) -> Self {
    Registry {
      configs,
      faults,
      display_open: false,
      display_initialized: false,
      // EGL starts with OpenGL ES bound
      bound_api: Api::OpenGlEs,
      surfaces: HashMap::new(),
      contexts: HashMap::new(),
      current: None,
      stages: HashMap::new(),
      programs: HashMap::new(),
      buffers: HashMap::new(),
      textures: HashMap::new(),
      viewport: [0, 0],
      platform_error: EGL_SUCCESS,
      device_error: None,
      next_handle: 1,
      allocations: 0,
      draw_calls: 0,
      bindings: 0,
    }
  }

  /// Get a fresh, never used handle.
  pub(crate) fn allocate(&mut self) -> u32 {
    let handle = self.next_handle;
    self.next_handle += 1;
    self.allocations += 1;
    handle
  }

  /// Record a platform failure and hand it back.
  pub(crate) fn platform_fail(&mut self, code: ErrorCode) -> ErrorCode {
    self.platform_error = code;
    code
  }

  pub(crate) fn take_platform_error(&mut self) -> Option<ErrorCode> {
    let code = std::mem::replace(&mut self.platform_error, EGL_SUCCESS);

    if code == EGL_SUCCESS {
      None
    } else {
      Some(code)
    }
  }

  /// Raise a device error; only the first one sticks until it’s popped.
  pub(crate) fn device_fail(&mut self, code: ErrorCode) {
    if self.device_error.is_none() {
      self.device_error = Some(code);
    }
  }

  pub(crate) fn take_device_error(&mut self) -> Option<ErrorCode> {
    self.device_error.take()
  }

  pub(crate) fn count_draw(&mut self) {
    self.draw_calls += 1;
  }

  pub(crate) fn count_binding(&mut self) {
    self.bindings += 1;
  }

  pub(crate) fn current_surface_mut(&mut self) -> Option<&mut Surface> {
    let (surface, _) = self.current?;
    self.surfaces.get_mut(&surface)
  }

  pub(crate) fn census(&self) -> Census {
    Census {
      displays: self.display_open as usize,
      surfaces: self.surfaces.len(),
      contexts: self.contexts.len(),
      stages: self.stages.len(),
      programs: self.programs.len(),
      buffers: self.buffers.len(),
      textures: self.textures.len(),
      allocations: self.allocations,
      draw_calls: self.draw_calls,
      bindings: self.bindings,
    }
  }
}
