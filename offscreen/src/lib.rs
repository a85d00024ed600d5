//! # Type-safe offscreen graphics contexts
//!
//! offscreen brings up a rendering context without any window: it loads the graphics driver,
//! opens a display connection, picks a pixel-format configuration, creates an off-screen pixel
//! buffer, creates a rendering context and makes it current. Once current, the context compiles
//! and links shader programs, uploads geometry and textures and issues draw calls.
//!
//! The hard part is not any single call but the lifecycle: every step can fail, and whatever was
//! acquired before the failure must be released, in reverse order. offscreen takes care of that
//! with two mechanisms:
//!
//! - **Typestate**: [`context::Bootstrap`] only exposes the next legal step, so steps cannot be
//!   called out of order.
//! - **Ownership**: every acquired handle is released on drop, and device resources borrow the
//!   [`context::Context`] they come from, so they cannot outlive it.
//!
//! # Backends
//!
//! This crate doesn’t talk to any driver itself. A backend implements the traits of the
//! [`backend`] module:
//!
//! - [`backend::platform::Load`] and [`backend::platform::Platform`] for everything happening
//!   before a context is current.
//! - [`backend::shader::Shader`], [`backend::buffer::Buffer`], [`backend::texture::Texture`] and
//!   [`backend::pipeline::Pipeline`] for everything happening after.
//!
//! Sentinel values, boolean statuses and last-error codes reported by drivers are all normalized
//! into the error types of this crate; see [`Error`].
//!
//! # Example
//!
//! ```ignore
//! use offscreen::{config::{NativeDisplay, Profile}, context, loader};
//!
//! let mut platform = loader::load::<SomePlatform>()?;
//! let ctx = context::bootstrap(&mut platform, NativeDisplay::Default, &Profile::embedded())?;
//! // …
//! ctx.teardown();
//! platform.unload();
//! ```

pub mod backend;
pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod shader;
pub mod texture;

pub use crate::error::{Error, ErrorCode};
