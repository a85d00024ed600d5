//! Static GPU buffers.
//!
//! Buffers are regions of device memory initialized once from client data: vertex data goes in
//! [`BufferKind::Array`] buffers and indices in [`BufferKind::Element`] buffers.

use std::error;
use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::buffer::Buffer as BufferBackend;
use crate::error::ErrorCode;

/// What a buffer holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferKind {
  /// Vertex attributes.
  Array,
  /// Vertex indices.
  Element,
}

/// Type of the indices stored in an element buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexType {
  U8,
  U16,
  U32,
}

impl IndexType {
  pub fn bytes(self) -> usize {
    match self {
      IndexType::U8 => 1,
      IndexType::U16 => 2,
      IndexType::U32 => 4,
    }
  }
}

/// Types usable as indices.
pub trait Index: Pod {
  const INDEX_TYPE: IndexType;
}

impl Index for u8 {
  const INDEX_TYPE: IndexType = IndexType::U8;
}

impl Index for u16 {
  const INDEX_TYPE: IndexType = IndexType::U16;
}

impl Index for u32 {
  const INDEX_TYPE: IndexType = IndexType::U32;
}

/// Buffer errors.
#[derive(Debug, Eq, PartialEq)]
pub enum BufferError {
  /// The device rejected the allocation.
  AllocationFailed(BufferKind, ErrorCode),
  /// Buffers can’t be empty.
  Empty(BufferKind),
}

impl fmt::Display for BufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      BufferError::AllocationFailed(kind, code) => {
        write!(f, "{:?} buffer allocation failed: {}", kind, code)
      }
      BufferError::Empty(kind) => write!(f, "cannot create an empty {:?} buffer", kind),
    }
  }
}

impl error::Error for BufferError {}

/// A device buffer of `T`.
pub struct Buffer<'c, D, T>
where
  D: BufferBackend,
{
  repr: D::BufferRepr,
  kind: BufferKind,
  len: usize,
  device: &'c D,
  _t: PhantomData<T>,
}

impl<'c, D, T> Buffer<'c, D, T>
where
  D: BufferBackend,
  T: Pod,
{
  /// Upload `values` to a new static buffer.
  pub fn from_slice(device: &'c D, kind: BufferKind, values: &[T]) -> Result<Self, BufferError> {
    if values.is_empty() {
      return Err(BufferError::Empty(kind));
    }

    let bytes = bytemuck::cast_slice(values);
    let repr = unsafe { device.new_buffer(kind, bytes) }
      .map_err(|code| BufferError::AllocationFailed(kind, code))?;

    log::debug!("{:?} buffer of {} bytes uploaded", kind, bytes.len());

    Ok(Buffer {
      repr,
      kind,
      len: values.len(),
      device,
      _t: PhantomData,
    })
  }
}

impl<D, T> Buffer<'_, D, T>
where
  D: BufferBackend,
{
  /// Number of elements.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn kind(&self) -> BufferKind {
    self.kind
  }

  pub(crate) fn repr(&self) -> &D::BufferRepr {
    &self.repr
  }
}

impl<D, T> Drop for Buffer<'_, D, T>
where
  D: BufferBackend,
{
  fn drop(&mut self) {
    unsafe { self.device.destroy_buffer(&mut self.repr) };
  }
}
