//! Backend interfacing.
//!
//! A backend is the graphics driver seen through a handful of traits: [`platform::Platform`] for
//! everything that happens before a context is current, and the device traits
//! ([`shader::Shader`], [`buffer::Buffer`], [`texture::Texture`], [`pipeline::Pipeline`]) for
//! everything that happens after.

pub mod buffer;
pub mod pipeline;
pub mod platform;
pub mod shader;
pub mod texture;

/// Everything a current context can do.
///
/// This trait is automatically implemented for any type implementing all of the device traits.
pub trait Device: shader::Shader + buffer::Buffer + texture::Texture + pipeline::Pipeline {}

impl<D> Device for D where D: shader::Shader + buffer::Buffer + texture::Texture + pipeline::Pipeline {}
