//! Context bootstrapping.
//!
//! Bringing up an off-screen context is a strictly linear sequence:
//!
//! ```text
//! UNINITIALIZED → DISPLAY_OPEN → DISPLAY_INITIALIZED → CONFIG_CHOSEN → SURFACE_CREATED
//!               → API_BOUND → CONTEXT_CREATED → CURRENT
//! ```
//!
//! [`Bootstrap`] encodes the current step in its type and only exposes the next legal one, so an
//! out-of-order call doesn’t compile. Every step consumes the bootstrap; if it fails, whatever got
//! acquired so far is released (context, then surface, then display) before the error is handed
//! back. The last step yields a [`Context`].
//!
//! # On context and threads
//!
//! A [`Context`] is `!Send` and `!Sync`, and a thread can only have one at a time: binding a second
//! one while the first is alive fails with [`ContextError::ThreadAlreadyHasContext`]. If you want
//! `n` contexts, you need `n` threads.

use std::cell::RefCell;
use std::error;
use std::fmt;
use std::marker::PhantomData;

use crate::backend::pipeline::Pipeline as _;
use crate::backend::platform::Platform;
use crate::config::{Api, ConfigAttribs, ConfigDescription, ContextVersion, NativeDisplay, Profile, SurfaceDim};
use crate::error::ErrorCode;
use crate::loader::{LoaderError, Version};

// TLS synchronization barrier for current contexts.
thread_local!(static TLS_ACQUIRE_CONTEXT: RefCell<Option<()>> = RefCell::new(Some(())));

/// Proof that the current thread has no other current context.
#[derive(Debug)]
struct ThreadToken {
  _a: PhantomData<*const ()>, // !Send and !Sync
}

impl ThreadToken {
  fn acquire() -> Option<Self> {
    TLS_ACQUIRE_CONTEXT
      .try_with(|rc| rc.borrow_mut().take())
      .ok()
      .flatten()
      .map(|_| ThreadToken { _a: PhantomData })
  }
}

impl Drop for ThreadToken {
  fn drop(&mut self) {
    let _ = TLS_ACQUIRE_CONTEXT.try_with(|rc| *rc.borrow_mut() = Some(()));
  }
}

/// Cached value.
///
/// Used to prevent issuing driver commands if we know the target value is already set to what the
/// command tries to set.
#[derive(Debug)]
struct Cached<T>(Option<T>)
where
  T: PartialEq;

impl<T> Cached<T>
where
  T: PartialEq,
{
  fn empty() -> Self {
    Cached(None)
  }

  fn invalidate(&mut self) {
    self.0 = None;
  }

  fn set(&mut self, value: T) {
    self.0 = Some(value);
  }

  /// A non-cached value is always invalid whatever compared value.
  fn is_invalid(&self, new_val: &T) -> bool {
    match &self.0 {
      Some(ref t) => t != new_val,
      _ => true,
    }
  }
}

/// Errors that might happen while bootstrapping a context.
#[derive(Debug)]
pub enum ContextError {
  /// The driver has no display for the native hint.
  NoDisplay,
  /// The display connection could not be brought up.
  InitializeFailed(ErrorCode),
  /// The driver failed to enumerate configurations.
  ChooseConfigFailed(ErrorCode),
  /// No configuration matches the desired attributes.
  NoMatchingConfig,
  /// The off-screen surface could not be created.
  SurfaceCreationFailed(ErrorCode),
  /// The rendering API could not be bound.
  BindApiFailed(Api, ErrorCode),
  /// The requested context version is encoded for another API than the bound one.
  IncompatibleVersion { bound: Api, requested: ContextVersion },
  /// The rendering context could not be created.
  ContextCreationFailed(ErrorCode),
  /// Another context is already current on this thread.
  ThreadAlreadyHasContext,
  /// The driver rejected the display / surface / context binding.
  MakeCurrentFailed(ErrorCode),
  /// Device entry points are not available for the current context.
  DeviceUnavailable(LoaderError),
}

impl ContextError {
  /// Short tag naming the step that failed.
  pub fn step(&self) -> &'static str {
    match *self {
      ContextError::NoDisplay => "open-display",
      ContextError::InitializeFailed(_) => "initialize-display",
      ContextError::ChooseConfigFailed(_) | ContextError::NoMatchingConfig => "choose-config",
      ContextError::SurfaceCreationFailed(_) => "create-surface",
      ContextError::BindApiFailed(..) => "bind-api",
      ContextError::IncompatibleVersion { .. } | ContextError::ContextCreationFailed(_) => {
        "create-context"
      }
      ContextError::ThreadAlreadyHasContext
      | ContextError::MakeCurrentFailed(_)
      | ContextError::DeviceUnavailable(_) => "make-current",
    }
  }
}

impl fmt::Display for ContextError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ContextError::NoDisplay => f.write_str("no display available"),
      ContextError::InitializeFailed(code) => write!(f, "display initialization failed: {}", code),
      ContextError::ChooseConfigFailed(code) => {
        write!(f, "configuration enumeration failed: {}", code)
      }
      ContextError::NoMatchingConfig => f.write_str("no configuration matches the desired attributes"),
      ContextError::SurfaceCreationFailed(code) => write!(f, "surface creation failed: {}", code),
      ContextError::BindApiFailed(api, code) => write!(f, "cannot bind {}: {}", api, code),
      ContextError::IncompatibleVersion { bound, requested } => {
        write!(f, "cannot request {} with {} bound", requested, bound)
      }
      ContextError::ContextCreationFailed(code) => write!(f, "context creation failed: {}", code),
      ContextError::ThreadAlreadyHasContext => {
        f.write_str("another context is already current on this thread")
      }
      ContextError::MakeCurrentFailed(code) => write!(f, "cannot make context current: {}", code),
      ContextError::DeviceUnavailable(ref e) => write!(f, "device unavailable: {}", e),
    }
  }
}

impl error::Error for ContextError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ContextError::DeviceUnavailable(e) => Some(e),
      _ => None,
    }
  }
}

/// Bootstrap steps.
pub mod state {
  #[derive(Debug)]
  pub enum Uninitialized {}
  #[derive(Debug)]
  pub enum DisplayOpen {}
  #[derive(Debug)]
  pub enum DisplayInitialized {}
  #[derive(Debug)]
  pub enum ConfigChosen {}
  #[derive(Debug)]
  pub enum SurfaceCreated {}
  #[derive(Debug)]
  pub enum ApiBound {}
  #[derive(Debug)]
  pub enum ContextCreated {}
}

use self::state::*;

/// Everything acquired so far.
///
/// Dropping it releases the acquired handles, most recent first.
struct Acquired<'p, P>
where
  P: Platform,
{
  platform: &'p mut P,
  display: Option<P::DisplayRepr>,
  display_version: Version,
  config: Option<(P::ConfigRepr, ConfigDescription)>,
  attribs: Option<ConfigAttribs>,
  surface: Option<P::SurfaceRepr>,
  dim: SurfaceDim,
  api: Option<Api>,
  context: Option<P::ContextRepr>,
  current: Cached<bool>,
}

impl<'p, P> Acquired<'p, P>
where
  P: Platform,
{
  fn new(platform: &'p mut P) -> Self {
    Acquired {
      platform,
      display: None,
      display_version: Version::new(0, 0),
      config: None,
      attribs: None,
      surface: None,
      dim: SurfaceDim::default(),
      api: None,
      context: None,
      current: Cached::empty(),
    }
  }

  fn release(&mut self) {
    let display = match self.display.take() {
      Some(display) => display,
      None => return,
    };

    unsafe {
      if !self.current.is_invalid(&true) {
        if let Err(code) = self.platform.release_current(&display) {
          log::warn!("cannot release current binding: {}", code);
        }

        self.current.invalidate();
      }

      if let Some(context) = self.context.take() {
        if let Err(code) = self.platform.destroy_context(&display, context) {
          log::warn!("cannot destroy context: {}", code);
        }
      }

      if let Some(surface) = self.surface.take() {
        if let Err(code) = self.platform.destroy_surface(&display, surface) {
          log::warn!("cannot destroy surface: {}", code);
        }
      }

      if let Err(code) = self.platform.terminate(display) {
        log::warn!("cannot terminate display: {}", code);
      }
    }

    log::debug!("display connection released");
  }

  fn config(&self) -> (P::ConfigRepr, &ConfigDescription) {
    match self.config {
      Some((config, ref desc)) => (config, desc),
      None => unreachable!("configuration accessed before being chosen"),
    }
  }
}

impl<P> Drop for Acquired<'_, P>
where
  P: Platform,
{
  fn drop(&mut self) {
    self.release();
  }
}

/// Context bootstrapper, currently at step `S`.
pub struct Bootstrap<'p, P, S>
where
  P: Platform,
{
  acquired: Acquired<'p, P>,
  _state: PhantomData<S>,
}

impl<'p, P, S> Bootstrap<'p, P, S>
where
  P: Platform,
{
  fn advance<T>(self) -> Bootstrap<'p, P, T> {
    Bootstrap {
      acquired: self.acquired,
      _state: PhantomData,
    }
  }

  /// Release everything acquired so far, most recent first.
  ///
  /// Release failures are logged, never reported.
  pub fn teardown(self) {
    drop(self);
  }
}

impl<'p, P> Bootstrap<'p, P, Uninitialized>
where
  P: Platform,
{
  /// Start bootstrapping on a loaded platform.
  pub fn new(platform: &'p mut P) -> Self {
    Bootstrap {
      acquired: Acquired::new(platform),
      _state: PhantomData,
    }
  }

  /// Get the display connection matching `hint`.
  ///
  /// Drivers don’t raise an error when they have no display; the “no display” sentinel is
  /// checked here and turned into [`ContextError::NoDisplay`].
  pub fn open_display(
    mut self,
    hint: NativeDisplay,
  ) -> Result<Bootstrap<'p, P, DisplayOpen>, ContextError> {
    let display =
      unsafe { self.acquired.platform.get_display(hint) }.ok_or(ContextError::NoDisplay)?;
    self.acquired.display = Some(display);

    log::debug!("display opened");
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, DisplayOpen>
where
  P: Platform,
{
  /// Bring the display connection up.
  pub fn initialize(mut self) -> Result<Bootstrap<'p, P, DisplayInitialized>, ContextError> {
    let acquired = &mut self.acquired;
    let display = match acquired.display {
      Some(ref display) => display,
      None => unreachable!("display accessed before being opened"),
    };

    let version =
      unsafe { acquired.platform.initialize(display) }.map_err(ContextError::InitializeFailed)?;
    acquired.display_version = version;

    log::info!("display initialized (version {})", version);
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, DisplayInitialized>
where
  P: Platform,
{
  /// Version reported by the display initialization.
  pub fn display_version(&self) -> Version {
    self.acquired.display_version
  }

  /// Pick the first configuration, in driver order, matching `attribs`.
  ///
  /// There is no relaxed retry: no exact match is fatal.
  pub fn choose_config(
    mut self,
    attribs: &ConfigAttribs,
  ) -> Result<Bootstrap<'p, P, ConfigChosen>, ContextError> {
    let acquired = &mut self.acquired;
    let display = match acquired.display {
      Some(ref display) => display,
      None => unreachable!("display accessed before being opened"),
    };

    let configs = unsafe { acquired.platform.choose_configs(display, attribs) }
      .map_err(ContextError::ChooseConfigFailed)?;
    let config = *configs.first().ok_or(ContextError::NoMatchingConfig)?;
    let desc = unsafe { acquired.platform.describe_config(display, config) }
      .map_err(ContextError::ChooseConfigFailed)?;

    log::info!("chose {} out of {} matching", desc, configs.len());

    acquired.config = Some((config, desc));
    acquired.attribs = Some(*attribs);
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, ConfigChosen>
where
  P: Platform,
{
  /// The configuration that got chosen.
  pub fn config(&self) -> &ConfigDescription {
    self.acquired.config().1
  }

  /// Create the off-screen surface.
  pub fn create_surface(
    mut self,
    dim: SurfaceDim,
  ) -> Result<Bootstrap<'p, P, SurfaceCreated>, ContextError> {
    let acquired = &mut self.acquired;
    let (config, _) = acquired.config();
    let display = match acquired.display {
      Some(ref display) => display,
      None => unreachable!("display accessed before being opened"),
    };

    let surface = unsafe { acquired.platform.create_pbuffer(display, config, dim) }
      .map_err(ContextError::SurfaceCreationFailed)?;

    log::debug!("{}×{} surface created", dim.width, dim.height);

    acquired.surface = Some(surface);
    acquired.dim = dim;
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, SurfaceCreated>
where
  P: Platform,
{
  /// Bind the rendering API the configuration was chosen for.
  pub fn bind_api(mut self) -> Result<Bootstrap<'p, P, ApiBound>, ContextError> {
    let api = match self.acquired.attribs {
      Some(ref attribs) => attribs.api(),
      None => unreachable!("API bound before choosing a configuration"),
    };

    unsafe { self.acquired.platform.bind_api(api) }
      .map_err(|code| ContextError::BindApiFailed(api, code))?;

    log::debug!("{} bound", api);

    self.acquired.api = Some(api);
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, ApiBound>
where
  P: Platform,
{
  /// Create the rendering context.
  ///
  /// `version` must be encoded for the bound API.
  pub fn create_context(
    mut self,
    version: ContextVersion,
  ) -> Result<Bootstrap<'p, P, ContextCreated>, ContextError> {
    let bound = match self.acquired.api {
      Some(api) => api,
      None => unreachable!("context created before binding an API"),
    };

    if version.api() != bound {
      return Err(ContextError::IncompatibleVersion {
        bound,
        requested: version,
      });
    }

    let acquired = &mut self.acquired;
    let (config, _) = acquired.config();
    let display = match acquired.display {
      Some(ref display) => display,
      None => unreachable!("display accessed before being opened"),
    };

    let context = unsafe { acquired.platform.create_context(display, config, version) }
      .map_err(ContextError::ContextCreationFailed)?;

    log::debug!("{} context created", version);

    acquired.context = Some(context);
    Ok(self.advance())
  }
}

impl<'p, P> Bootstrap<'p, P, ContextCreated>
where
  P: Platform,
{
  /// Bind the surface and context as this thread’s rendering target.
  pub fn make_current(self) -> Result<Context<'p, P>, ContextError> {
    let token = ThreadToken::acquire().ok_or(ContextError::ThreadAlreadyHasContext)?;
    let mut acquired = self.acquired;

    bind(&mut acquired)?;

    let device = unsafe { acquired.platform.device() }.map_err(ContextError::DeviceUnavailable)?;

    let dim = acquired.dim;
    unsafe {
      device.set_viewport(dim.width, dim.height);
    }

    log::debug!("context current");

    Ok(Context {
      device,
      acquired,
      _token: token,
    })
  }
}

fn bind<P>(acquired: &mut Acquired<P>) -> Result<(), ContextError>
where
  P: Platform,
{
  if !acquired.current.is_invalid(&true) {
    return Ok(());
  }

  let (display, surface, context) = match (&acquired.display, &acquired.surface, &acquired.context) {
    (Some(display), Some(surface), Some(context)) => (display, surface, context),
    _ => unreachable!("binding an incomplete context"),
  };

  unsafe { acquired.platform.make_current(display, surface, context) }
    .map_err(ContextError::MakeCurrentFailed)?;
  acquired.current.set(true);

  Ok(())
}

/// A current off-screen rendering context.
///
/// Device resources ([`Program`], [`Buffer`], [`Texture`]) borrow the context, so they are all gone
/// by the time the context can be torn down.
///
/// [`Program`]: crate::shader::Program
/// [`Buffer`]: crate::buffer::Buffer
/// [`Texture`]: crate::texture::Texture
pub struct Context<'p, P>
where
  P: Platform,
{
  // fields drop in order: device entry points, then driver handles, then the thread barrier
  device: P::Device,
  acquired: Acquired<'p, P>,
  _token: ThreadToken,
}

impl<'p, P> Context<'p, P>
where
  P: Platform,
{
  /// Device entry points.
  pub fn device(&self) -> &P::Device {
    &self.device
  }

  /// Bind this context again.
  ///
  /// Binding an already current context is a no-op.
  pub fn make_current(&mut self) -> Result<(), ContextError> {
    bind(&mut self.acquired)
  }

  /// The configuration this context was created against.
  pub fn config(&self) -> &ConfigDescription {
    self.acquired.config().1
  }

  pub fn display_version(&self) -> Version {
    self.acquired.display_version
  }

  /// Dimension of the off-screen surface.
  pub fn dim(&self) -> SurfaceDim {
    self.acquired.dim
  }

  pub fn api(&self) -> Api {
    match self.acquired.api {
      Some(api) => api,
      None => unreachable!("current context without API"),
    }
  }

  /// Destroy the context, then the surface, then terminate the display connection.
  ///
  /// This never fails: release errors are logged and the context is retired anyway.
  pub fn teardown(self) {
    drop(self);
  }
}

/// Run the whole bootstrap sequence for a profile.
pub fn bootstrap<'p, P>(
  platform: &'p mut P,
  hint: NativeDisplay,
  profile: &Profile,
) -> Result<Context<'p, P>, ContextError>
where
  P: Platform,
{
  Bootstrap::new(platform)
    .open_display(hint)?
    .initialize()?
    .choose_config(&profile.attribs)?
    .create_surface(profile.dim)?
    .bind_api()?
    .create_context(profile.version)?
    .make_current()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn one_token_per_thread() {
    let token = ThreadToken::acquire();
    assert!(token.is_some());
    assert!(ThreadToken::acquire().is_none());

    drop(token);
    assert!(ThreadToken::acquire().is_some());
  }

  #[test]
  fn tokens_are_per_thread() {
    let _token = ThreadToken::acquire();

    let other = std::thread::spawn(|| ThreadToken::acquire().is_some())
      .join()
      .unwrap();
    assert!(other);
  }

  #[test]
  fn cached_invalidation() {
    let mut current = Cached::empty();
    assert!(current.is_invalid(&true));

    current.set(true);
    assert!(!current.is_invalid(&true));

    current.invalidate();
    assert!(current.is_invalid(&true));
  }

  #[test]
  fn incompatible_version_step() {
    let e = ContextError::IncompatibleVersion {
      bound: Api::OpenGlEs,
      requested: ContextVersion::Desktop { major: 3, minor: 0 },
    };

    assert_eq!(e.step(), "create-context");
    assert_eq!(e.to_string(), "cannot request OpenGL 3.0 with OpenGL ES bound");
  }
}
