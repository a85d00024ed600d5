//! Shader backend.
//!
//! This is deliberately low level: the compile → check → log → destroy sequence is driven by
//! [`crate::shader`], so that every backend gets the exact same failure handling.

use crate::error::ErrorCode;
use crate::shader::StageType;

pub unsafe trait Shader {
  /// Shader stage representation.
  type StageRepr;

  /// Shader program representation.
  type ProgramRepr;

  /// Allocate a stage object; fails only if the driver cannot allocate one.
  unsafe fn create_stage(&self, ty: StageType) -> Result<Self::StageRepr, ErrorCode>;

  /// Set the source of a stage and compile it, returning the compile status.
  unsafe fn compile_stage(&self, stage: &Self::StageRepr, src: &str) -> bool;

  /// Length of the stage diagnostic log, terminating NUL included.
  unsafe fn stage_log_len(&self, stage: &Self::StageRepr) -> usize;

  /// Read the stage diagnostic log into `buf`, returning the number of bytes written (without
  /// the NUL).
  unsafe fn read_stage_log(&self, stage: &Self::StageRepr, buf: &mut [u8]) -> usize;

  unsafe fn destroy_stage(&self, stage: &mut Self::StageRepr);

  unsafe fn create_program(&self) -> Result<Self::ProgramRepr, ErrorCode>;

  unsafe fn attach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr);

  unsafe fn detach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr);

  /// Link a program, returning the link status.
  unsafe fn link_program(&self, program: &Self::ProgramRepr) -> bool;

  /// Length of the program diagnostic log, terminating NUL included.
  unsafe fn program_log_len(&self, program: &Self::ProgramRepr) -> usize;

  unsafe fn read_program_log(&self, program: &Self::ProgramRepr, buf: &mut [u8]) -> usize;

  unsafe fn destroy_program(&self, program: &mut Self::ProgramRepr);

  /// Location of a vertex attribute; negative if absent.
  unsafe fn attrib_location(&self, program: &Self::ProgramRepr, name: &str) -> i32;

  /// Location of a uniform; negative if absent.
  unsafe fn uniform_location(&self, program: &Self::ProgramRepr, name: &str) -> i32;
}
