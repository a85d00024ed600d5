//! Platform backend.
//!
//! The platform is the part of the driver that exists before any rendering context is current:
//! loading entry points, display connections, configurations, surfaces and contexts.
//!
//! Backends report failures with the driver’s raw [`ErrorCode`]. Sentinel returns (“no surface”,
//! “no context”, a `false` status) must be turned into `Err(last_error)` right where they are
//! observed, before any other driver call can overwrite the last error. Mapping those codes to
//! a meaningful error is the job of [`crate::context`].

use crate::backend::Device;
use crate::config::{Api, ConfigAttribs, ConfigDescription, ContextVersion, NativeDisplay, SurfaceDim};
use crate::error::ErrorCode;
use crate::loader::{LoaderError, Version};

/// Loading and unloading driver entry points.
///
/// # Unsafety
///
/// Implementors must guarantee that no driver call is possible before [`Load::load`] returns
/// successfully.
pub unsafe trait Load: Sized {
  /// Resolve the driver entry points for the current process.
  fn load() -> Result<Self, LoaderError>;

  /// Version of the driver that got loaded.
  ///
  /// A zero version means the entry points could not be resolved.
  fn version(&self) -> Version;

  /// Release everything the loader holds.
  fn unload(self);
}

/// Display, configuration, surface and context management.
///
/// # Unsafety
///
/// Every method taking a representation expects it to come from the same platform and to not
/// have been destroyed yet.
pub unsafe trait Platform: Load {
  /// Display connection representation.
  type DisplayRepr;

  /// Configuration representation.
  type ConfigRepr: Copy;

  /// Drawable surface representation.
  type SurfaceRepr;

  /// Rendering context representation.
  type ContextRepr;

  /// Device used once a context is current.
  type Device: Device;

  /// Get the display matching the native hint.
  ///
  /// `None` is the “no display” sentinel. Drivers do not set an error code in that case.
  unsafe fn get_display(&mut self, hint: NativeDisplay) -> Option<Self::DisplayRepr>;

  /// Bring the display connection up, returning the driver’s display version.
  unsafe fn initialize(&mut self, display: &Self::DisplayRepr) -> Result<Version, ErrorCode>;

  /// All configurations matching the attributes, in driver order.
  unsafe fn choose_configs(
    &mut self,
    display: &Self::DisplayRepr,
    attribs: &ConfigAttribs,
  ) -> Result<Vec<Self::ConfigRepr>, ErrorCode>;

  /// Query what a configuration actually provides.
  unsafe fn describe_config(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
  ) -> Result<ConfigDescription, ErrorCode>;

  /// Create an off-screen pixel buffer surface.
  unsafe fn create_pbuffer(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    dim: SurfaceDim,
  ) -> Result<Self::SurfaceRepr, ErrorCode>;

  /// Select the rendering API flavor subsequent contexts target.
  unsafe fn bind_api(&mut self, api: Api) -> Result<(), ErrorCode>;

  /// Create a rendering context.
  unsafe fn create_context(
    &mut self,
    display: &Self::DisplayRepr,
    config: Self::ConfigRepr,
    version: ContextVersion,
  ) -> Result<Self::ContextRepr, ErrorCode>;

  /// Bind a surface and a context as the thread’s current rendering target.
  unsafe fn make_current(
    &mut self,
    display: &Self::DisplayRepr,
    surface: &Self::SurfaceRepr,
    context: &Self::ContextRepr,
  ) -> Result<(), ErrorCode>;

  /// Unbind whatever is current on the display.
  unsafe fn release_current(&mut self, display: &Self::DisplayRepr) -> Result<(), ErrorCode>;

  /// Device entry points for the current context.
  ///
  /// Only called once [`Platform::make_current`] succeeded.
  unsafe fn device(&mut self) -> Result<Self::Device, LoaderError>;

  unsafe fn destroy_context(
    &mut self,
    display: &Self::DisplayRepr,
    context: Self::ContextRepr,
  ) -> Result<(), ErrorCode>;

  unsafe fn destroy_surface(
    &mut self,
    display: &Self::DisplayRepr,
    surface: Self::SurfaceRepr,
  ) -> Result<(), ErrorCode>;

  unsafe fn terminate(&mut self, display: Self::DisplayRepr) -> Result<(), ErrorCode>;

  /// The driver’s last error, if any.
  fn last_error(&mut self) -> Option<ErrorCode>;
}
