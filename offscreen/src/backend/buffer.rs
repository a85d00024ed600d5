//! Buffer backend interface.
//!
//! This interface defines the low-level API buffers must implement to be usable.

use crate::buffer::BufferKind;
use crate::error::ErrorCode;

/// Buffer backend.
///
/// You want to implement that trait on your backend type to support buffers.
pub unsafe trait Buffer {
  /// The inner representation of the buffer for this backend.
  type BufferRepr;

  /// Create a new buffer holding a copy of `bytes`, with static usage.
  unsafe fn new_buffer(&self, kind: BufferKind, bytes: &[u8]) -> Result<Self::BufferRepr, ErrorCode>;

  unsafe fn destroy_buffer(&self, buffer: &mut Self::BufferRepr);
}
