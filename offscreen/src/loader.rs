//! Driver loading.
//!
//! Nothing else in this crate can be used before a platform got loaded with [`load`]. Unloading
//! consumes the platform, and every resource acquired through it borrows it, so the borrow checker
//! guarantees that [`Load::unload`] only runs once everything else is gone.

use std::error;
use std::fmt;

pub use crate::backend::platform::Load;

/// Driver version.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version {
  pub major: u16,
  pub minor: u16,
}

impl Version {
  pub const fn new(major: u16, minor: u16) -> Self {
    Version { major, minor }
  }

  /// A zero version is what drivers report when nothing could be resolved.
  pub fn is_zero(&self) -> bool {
    self.major == 0 && self.minor == 0
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

/// Errors that might happen when loading the driver.
#[derive(Debug)]
pub enum LoaderError {
  /// The driver library could not be opened.
  ///
  /// The carried [`String`] gives the reason of the failure.
  LibraryNotFound(String),
  /// The driver got opened but its entry points could not be resolved.
  NoEntryPoints,
  /// Device entry points (shaders, buffers, …) could not be resolved for the current context.
  MissingDeviceSymbol(&'static str),
}

impl LoaderError {
  pub fn library_not_found<R>(reason: R) -> Self
  where
    R: Into<String>,
  {
    LoaderError::LibraryNotFound(reason.into())
  }
}

impl fmt::Display for LoaderError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      LoaderError::LibraryNotFound(ref r) => write!(f, "cannot load graphics driver: {}", r),
      LoaderError::NoEntryPoints => f.write_str("graphics driver entry points cannot be resolved"),
      LoaderError::MissingDeviceSymbol(s) => write!(f, "missing device entry point {}", s),
    }
  }
}

impl error::Error for LoaderError {}

/// Load a platform.
///
/// This must be the very first call. A driver reporting a zero version is treated as a failure,
/// since no further call would be safe.
pub fn load<P>() -> Result<P, LoaderError>
where
  P: Load,
{
  let platform = P::load()?;
  let version = platform.version();

  if version.is_zero() {
    platform.unload();
    return Err(LoaderError::NoEntryPoints);
  }

  log::info!("loaded graphics driver {}", version);
  Ok(platform)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Broken;

  unsafe impl Load for Broken {
    fn load() -> Result<Self, LoaderError> {
      Ok(Broken)
    }

    fn version(&self) -> Version {
      Version::new(0, 0)
    }

    fn unload(self) {}
  }

  #[test]
  fn zero_version_is_fatal() {
    match load::<Broken>() {
      Err(LoaderError::NoEntryPoints) => (),
      _ => panic!("a zero version must not load"),
    }
  }

  #[test]
  fn version_display() {
    assert_eq!(Version::new(1, 5).to_string(), "1.5");
    assert!(Version::new(1, 4) < Version::new(1, 5));
  }
}
