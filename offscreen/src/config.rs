//! Configuration types.
//!
//! Everything the bootstrap needs to know is a typed value with a sensible [`Default`]. Values are
//! tweaked with consuming setters:
//!
//! ```
//! use offscreen::config::{Api, ConfigAttribs};
//!
//! let attribs = ConfigAttribs::default().set_api(Api::OpenGlEs).set_alpha_size(0);
//! assert_eq!(attribs.api(), Api::OpenGlEs);
//! ```

use std::fmt;
use std::ops::BitOr;
use std::os::raw::c_void;

/// Hint used to select a display connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NativeDisplay {
  /// Whatever display the driver considers the default one.
  Default,
  /// A native display handle (an X11 `Display*`, a GBM device, etc.).
  Raw(*mut c_void),
}

impl Default for NativeDisplay {
  fn default() -> Self {
    NativeDisplay::Default
  }
}

/// Set of surface kinds a configuration supports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SurfaceType(u32);

impl SurfaceType {
  pub const PBUFFER: SurfaceType = SurfaceType(0x0001);
  pub const PIXMAP: SurfaceType = SurfaceType(0x0002);
  pub const WINDOW: SurfaceType = SurfaceType(0x0004);

  pub const fn empty() -> Self {
    SurfaceType(0)
  }

  pub const fn bits(self) -> u32 {
    self.0
  }

  pub const fn from_bits(bits: u32) -> Self {
    SurfaceType(bits)
  }

  pub const fn contains(self, other: SurfaceType) -> bool {
    self.0 & other.0 == other.0
  }
}

impl BitOr for SurfaceType {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    SurfaceType(self.0 | rhs.0)
  }
}

/// Set of rendering APIs a configuration can render with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Renderable(u32);

impl Renderable {
  pub const OPENGL_ES: Renderable = Renderable(0x0001);
  pub const OPENGL_ES2: Renderable = Renderable(0x0004);
  pub const OPENGL: Renderable = Renderable(0x0008);

  pub const fn empty() -> Self {
    Renderable(0)
  }

  pub const fn bits(self) -> u32 {
    self.0
  }

  pub const fn from_bits(bits: u32) -> Self {
    Renderable(bits)
  }

  pub const fn contains(self, other: Renderable) -> bool {
    self.0 & other.0 == other.0
  }
}

impl BitOr for Renderable {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    Renderable(self.0 | rhs.0)
  }
}

/// Rendering API flavor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Api {
  /// Desktop OpenGL.
  OpenGl,
  /// OpenGL ES 2.
  OpenGlEs,
}

impl Api {
  /// The renderable bit a configuration must carry to host a context of this API.
  pub fn renderable(self) -> Renderable {
    match self {
      Api::OpenGl => Renderable::OPENGL,
      Api::OpenGlEs => Renderable::OPENGL_ES2,
    }
  }
}

impl fmt::Display for Api {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Api::OpenGl => f.write_str("OpenGL"),
      Api::OpenGlEs => f.write_str("OpenGL ES"),
    }
  }
}

/// Desired configuration attributes.
///
/// Color sizes are minimums; surface and renderable bits must all be present.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConfigAttribs {
  surface_type: SurfaceType,
  red_size: u8,
  green_size: u8,
  blue_size: u8,
  alpha_size: u8,
  api: Api,
}

impl Default for ConfigAttribs {
  /// Defaults:
  ///
  /// - `surface_type` set to `SurfaceType::PBUFFER`.
  /// - 8 bits per RGBA channel.
  /// - `api` set to `Api::OpenGl`.
  fn default() -> Self {
    ConfigAttribs {
      surface_type: SurfaceType::PBUFFER,
      red_size: 8,
      green_size: 8,
      blue_size: 8,
      alpha_size: 8,
      api: Api::OpenGl,
    }
  }
}

impl ConfigAttribs {
  #[inline]
  pub fn set_surface_type(self, surface_type: SurfaceType) -> Self {
    ConfigAttribs {
      surface_type,
      ..self
    }
  }

  #[inline]
  pub fn set_red_size(self, red_size: u8) -> Self {
    ConfigAttribs { red_size, ..self }
  }

  #[inline]
  pub fn set_green_size(self, green_size: u8) -> Self {
    ConfigAttribs { green_size, ..self }
  }

  #[inline]
  pub fn set_blue_size(self, blue_size: u8) -> Self {
    ConfigAttribs { blue_size, ..self }
  }

  #[inline]
  pub fn set_alpha_size(self, alpha_size: u8) -> Self {
    ConfigAttribs { alpha_size, ..self }
  }

  /// Rendering API the configuration must be renderable with.
  #[inline]
  pub fn set_api(self, api: Api) -> Self {
    ConfigAttribs { api, ..self }
  }

  #[inline]
  pub fn surface_type(&self) -> SurfaceType {
    self.surface_type
  }

  #[inline]
  pub fn red_size(&self) -> u8 {
    self.red_size
  }

  #[inline]
  pub fn green_size(&self) -> u8 {
    self.green_size
  }

  #[inline]
  pub fn blue_size(&self) -> u8 {
    self.blue_size
  }

  #[inline]
  pub fn alpha_size(&self) -> u8 {
    self.alpha_size
  }

  #[inline]
  pub fn api(&self) -> Api {
    self.api
  }

  #[inline]
  pub fn renderable(&self) -> Renderable {
    self.api.renderable()
  }
}

/// What a chosen configuration actually provides.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConfigDescription {
  pub id: i32,
  pub red_size: u8,
  pub green_size: u8,
  pub blue_size: u8,
  pub alpha_size: u8,
  pub surface_type: SurfaceType,
  pub renderable: Renderable,
}

impl ConfigDescription {
  /// Whether this configuration satisfies every requested attribute.
  pub fn satisfies(&self, attribs: &ConfigAttribs) -> bool {
    self.red_size >= attribs.red_size
      && self.green_size >= attribs.green_size
      && self.blue_size >= attribs.blue_size
      && self.alpha_size >= attribs.alpha_size
      && self.surface_type.contains(attribs.surface_type)
      && self.renderable.contains(attribs.renderable())
  }
}

impl fmt::Display for ConfigDescription {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    write!(
      f,
      "config #{} (R{}G{}B{}A{})",
      self.id, self.red_size, self.green_size, self.blue_size, self.alpha_size
    )
  }
}

/// Requested context version.
///
/// Desktop and embedded contexts use mutually exclusive attribute encodings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContextVersion {
  /// Desktop OpenGL `major.minor`.
  Desktop { major: u8, minor: u8 },
  /// OpenGL ES client version.
  Embedded { client: u8 },
}

impl ContextVersion {
  /// API this version encoding belongs to.
  pub fn api(self) -> Api {
    match self {
      ContextVersion::Desktop { .. } => Api::OpenGl,
      ContextVersion::Embedded { .. } => Api::OpenGlEs,
    }
  }
}

impl fmt::Display for ContextVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ContextVersion::Desktop { major, minor } => write!(f, "OpenGL {}.{}", major, minor),
      ContextVersion::Embedded { client } => write!(f, "OpenGL ES {}", client),
    }
  }
}

/// Off-screen surface dimension, in pixels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SurfaceDim {
  pub width: u32,
  pub height: u32,
}

impl SurfaceDim {
  pub const fn new(width: u32, height: u32) -> Self {
    SurfaceDim { width, height }
  }

  /// Number of RGBA8 bytes needed to hold the whole surface, if addressable.
  pub fn rgba8_len(&self) -> Option<usize> {
    (self.width as usize)
      .checked_mul(self.height as usize)?
      .checked_mul(4)
  }
}

impl Default for SurfaceDim {
  /// 256×256.
  fn default() -> Self {
    SurfaceDim::new(256, 256)
  }
}

/// Everything needed to bring up a context for a given API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Profile {
  pub attribs: ConfigAttribs,
  pub version: ContextVersion,
  pub dim: SurfaceDim,
}

impl Profile {
  /// Desktop OpenGL 3.0 on a 256×256 RGBA8 pbuffer.
  pub fn desktop() -> Self {
    Profile {
      attribs: ConfigAttribs::default().set_api(Api::OpenGl),
      version: ContextVersion::Desktop { major: 3, minor: 0 },
      dim: SurfaceDim::default(),
    }
  }

  /// OpenGL ES 2 on a 256×256 RGBA8 pbuffer.
  pub fn embedded() -> Self {
    Profile {
      attribs: ConfigAttribs::default().set_api(Api::OpenGlEs),
      version: ContextVersion::Embedded { client: 2 },
      dim: SurfaceDim::default(),
    }
  }

  #[inline]
  pub fn set_attribs(self, attribs: ConfigAttribs) -> Self {
    Profile { attribs, ..self }
  }

  #[inline]
  pub fn set_dim(self, dim: SurfaceDim) -> Self {
    Profile { dim, ..self }
  }

  /// API bound before creating the context.
  pub fn api(&self) -> Api {
    self.attribs.api()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rgba8(surface_type: SurfaceType, renderable: Renderable) -> ConfigDescription {
    ConfigDescription {
      id: 1,
      red_size: 8,
      green_size: 8,
      blue_size: 8,
      alpha_size: 8,
      surface_type,
      renderable,
    }
  }

  #[test]
  fn sizes_are_minimums() {
    let desc = rgba8(SurfaceType::PBUFFER, Renderable::OPENGL);

    assert!(desc.satisfies(&ConfigAttribs::default().set_alpha_size(0)));
    assert!(!desc.satisfies(&ConfigAttribs::default().set_red_size(10)));
  }

  #[test]
  fn bits_must_all_be_present() {
    let desc = rgba8(SurfaceType::WINDOW | SurfaceType::PBUFFER, Renderable::OPENGL_ES2);

    assert!(desc.satisfies(&ConfigAttribs::default().set_api(Api::OpenGlEs)));
    assert!(!desc.satisfies(&ConfigAttribs::default().set_api(Api::OpenGl)));
    assert!(!desc.satisfies(
      &ConfigAttribs::default()
        .set_api(Api::OpenGlEs)
        .set_surface_type(SurfaceType::PBUFFER | SurfaceType::PIXMAP)
    ));
  }

  #[test]
  fn profiles_agree_with_their_api() {
    for profile in &[Profile::desktop(), Profile::embedded()] {
      assert_eq!(profile.version.api(), profile.api());
      assert_eq!(profile.dim, SurfaceDim::new(256, 256));
    }
  }

  #[test]
  fn rgba8_len_does_not_overflow() {
    assert_eq!(SurfaceDim::default().rgba8_len(), Some(256 * 256 * 4));
    assert_eq!(SurfaceDim::new(0, 0).rgba8_len(), Some(0));
    assert_eq!(SurfaceDim::new(u32::MAX, u32::MAX).rgba8_len(), None);
  }
}
