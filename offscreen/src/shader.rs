//! Shader stages and programs.
//!
//! A [`Stage`] is a compiled unit of code for a single pipeline stage. Two stages (vertex and
//! fragment) get linked into a [`Program`]. Both destroy their driver object when dropped.
//!
//! Compilation and link failures carry the driver’s diagnostic log. Once linked, a program
//! doesn’t need its stages anymore: [`Program::link`] takes them by value, detaches them and
//! destroys them, so no stage object outlives the link.

use std::error;
use std::fmt;

use crate::backend::shader::Shader;
use crate::error::ErrorCode;

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Fragment shader.
  FragmentShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
    }
  }
}

/// Errors that shader stages can emit.
#[derive(Clone, Debug)]
pub enum StageError {
  /// Occurs when a shader fails to compile.
  CompilationFailed(StageType, String),
  /// Occurs when the driver cannot even allocate the stage object.
  CreationFailed(StageType, ErrorCode),
}

impl StageError {
  pub fn compilation_failed<R>(ty: StageType, reason: R) -> Self
  where
    R: Into<String>,
  {
    StageError::CompilationFailed(ty, reason.into())
  }
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      StageError::CompilationFailed(ref ty, ref r) => write!(f, "{} compilation error: {}", ty, r),
      StageError::CreationFailed(ty, code) => write!(f, "cannot create {}: {}", ty, code),
    }
  }
}

impl error::Error for StageError {}

impl From<StageError> for ProgramError {
  fn from(e: StageError) -> Self {
    ProgramError::StageError(e)
  }
}

/// Errors that a `Program` can generate.
#[derive(Clone, Debug)]
pub enum ProgramError {
  /// A shader stage failed to compile.
  StageError(StageError),
  /// The driver cannot allocate the program object.
  CreationFailed(ErrorCode),
  /// Program link failed. You can inspect the reason by looking at the contained `String`.
  LinkFailed(String),
}

impl ProgramError {
  pub fn link_failed<R>(reason: R) -> Self
  where
    R: Into<String>,
  {
    ProgramError::LinkFailed(reason.into())
  }
}

impl fmt::Display for ProgramError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ProgramError::StageError(ref e) => write!(f, "shader program has stage error: {}", e),
      ProgramError::CreationFailed(code) => write!(f, "cannot create shader program: {}", code),
      ProgramError::LinkFailed(ref s) => write!(f, "shader program failed to link: {}", s),
    }
  }
}

impl error::Error for ProgramError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ProgramError::StageError(e) => Some(e),
      _ => None,
    }
  }
}

/// Read a diagnostic log.
///
/// `len` includes the terminating NUL, so a length of one or less means there’s nothing to read
/// and nothing gets allocated.
fn read_log(len: usize, read: impl FnOnce(&mut [u8]) -> usize) -> String {
  if len <= 1 {
    return String::new();
  }

  let mut log = vec![0; len];
  let written = read(&mut log).min(len);
  log.truncate(written);

  String::from_utf8_lossy(&log).trim_end_matches('\0').to_owned()
}

/// A compiled shader stage.
pub struct Stage<'c, D>
where
  D: Shader,
{
  repr: D::StageRepr,
  ty: StageType,
  device: &'c D,
}

impl<'c, D> Stage<'c, D>
where
  D: Shader,
{
  /// Compile a stage.
  ///
  /// On failure, the partially built stage object is destroyed before the error is returned.
  pub fn new(device: &'c D, ty: StageType, src: &str) -> Result<Self, StageError> {
    let repr = unsafe { device.create_stage(ty) }.map_err(|code| StageError::CreationFailed(ty, code))?;

    // from now on, dropping the stage destroys the driver object
    let stage = Stage { repr, ty, device };

    if unsafe { device.compile_stage(&stage.repr, src) } {
      log::debug!("{} compiled", ty);
      Ok(stage)
    } else {
      let len = unsafe { device.stage_log_len(&stage.repr) };
      let log = read_log(len, |buf| unsafe { device.read_stage_log(&stage.repr, buf) });

      Err(StageError::CompilationFailed(ty, log))
    }
  }

  pub fn ty(&self) -> StageType {
    self.ty
  }
}

impl<D> Drop for Stage<'_, D>
where
  D: Shader,
{
  fn drop(&mut self) {
    unsafe { self.device.destroy_stage(&mut self.repr) };
  }
}

/// Kind of location a program exposes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LocationKind {
  /// Vertex attribute.
  Attribute,
  /// Uniform variable.
  Uniform,
}

/// Location of a vertex attribute or uniform in a linked program.
///
/// Names absent from the program resolve to [`Location::ABSENT`]; using such a location in a
/// draw call is up to the driver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Location(i32);

impl Location {
  /// Sentinel for names the program doesn’t have.
  pub const ABSENT: Location = Location(-1);

  pub const fn new(index: i32) -> Self {
    Location(index)
  }

  pub fn index(&self) -> i32 {
    self.0
  }

  pub fn is_absent(&self) -> bool {
    self.0 < 0
  }
}

/// A linked shader program.
pub struct Program<'c, D>
where
  D: Shader,
{
  repr: D::ProgramRepr,
  device: &'c D,
}

impl<'c, D> Program<'c, D>
where
  D: Shader,
{
  /// Compile a vertex and a fragment stage and link them.
  pub fn from_sources(device: &'c D, vertex: &str, fragment: &str) -> Result<Self, ProgramError> {
    let vertex = Stage::new(device, StageType::VertexShader, vertex)?;
    let fragment = Stage::new(device, StageType::FragmentShader, fragment)?;

    Self::link(device, vertex, fragment)
  }

  /// Link a vertex and a fragment stage.
  ///
  /// The stages are detached and destroyed whatever the outcome.
  pub fn link(
    device: &'c D,
    vertex: Stage<'c, D>,
    fragment: Stage<'c, D>,
  ) -> Result<Self, ProgramError> {
    let repr = unsafe { device.create_program() }.map_err(ProgramError::CreationFailed)?;
    let program = Program { repr, device };

    let linked = unsafe {
      device.attach_stage(&program.repr, &vertex.repr);
      device.attach_stage(&program.repr, &fragment.repr);

      let linked = device.link_program(&program.repr);

      device.detach_stage(&program.repr, &vertex.repr);
      device.detach_stage(&program.repr, &fragment.repr);

      linked
    };

    drop(vertex);
    drop(fragment);

    if linked {
      log::debug!("shader program linked");
      Ok(program)
    } else {
      let len = unsafe { device.program_log_len(&program.repr) };
      let log = read_log(len, |buf| unsafe { device.read_program_log(&program.repr, buf) });

      Err(ProgramError::LinkFailed(log))
    }
  }

  /// Resolve a location by name.
  pub fn resolve_location(&self, name: &str, kind: LocationKind) -> Location {
    let index = unsafe {
      match kind {
        LocationKind::Attribute => self.device.attrib_location(&self.repr, name),
        LocationKind::Uniform => self.device.uniform_location(&self.repr, name),
      }
    };

    let location = Location(index.max(-1));

    if location.is_absent() {
      log::warn!("{:?} {} is not active in the program", kind, name);
    }

    location
  }

  pub fn attrib_location(&self, name: &str) -> Location {
    self.resolve_location(name, LocationKind::Attribute)
  }

  pub fn uniform_location(&self, name: &str) -> Location {
    self.resolve_location(name, LocationKind::Uniform)
  }

  pub(crate) fn repr(&self) -> &D::ProgramRepr {
    &self.repr
  }
}

impl<D> Drop for Program<'_, D>
where
  D: Shader,
{
  fn drop(&mut self) {
    unsafe { self.device.destroy_program(&mut self.repr) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_logs_are_not_read() {
    let mut read = false;

    let log = read_log(0, |_| {
      read = true;
      0
    });
    assert_eq!(log, "");

    let log = read_log(1, |_| {
      read = true;
      0
    });
    assert_eq!(log, "");

    assert!(!read);
  }

  #[test]
  fn logs_lose_their_nul() {
    let msg = b"0:3: error: syntax error\0";
    let log = read_log(msg.len(), |buf| {
      buf.copy_from_slice(msg);
      msg.len() - 1
    });

    assert_eq!(log, "0:3: error: syntax error");
  }

  #[test]
  fn absent_location() {
    assert!(Location::ABSENT.is_absent());
    assert!(!Location::new(0).is_absent());
  }
}
