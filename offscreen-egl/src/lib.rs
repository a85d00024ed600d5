//! EGL platform and OpenGL device for offscreen.
//!
//! [`Egl`] loads the system EGL library at runtime, so nothing has to be present at link time: a
//! machine without EGL simply fails [`offscreen::loader::load`] with
//! [`LoaderError::LibraryNotFound`].
//!
//! Once a context is current, OpenGL entry points are resolved through EGL and exposed by [`GL20`],
//! which sticks to what OpenGL 3.0 and OpenGL ES 2 have in common.
//!
//! [`LoaderError::LibraryNotFound`]: offscreen::loader::LoaderError::LibraryNotFound

mod gl20;
mod platform;

pub use crate::gl20::GL20;
pub use crate::platform::Egl;
