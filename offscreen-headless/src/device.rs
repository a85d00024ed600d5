//! Device side of the headless driver.
//!
//! Draw calls are validated, not rasterized: clearing does touch the surface, but triangles are
//! only checked for consistency and counted.

use std::cell::RefCell;
use std::rc::Rc;

use offscreen::backend::buffer::Buffer;
use offscreen::backend::pipeline::{DrawCall, Pipeline};
use offscreen::backend::shader::Shader;
use offscreen::backend::texture::Texture;
use offscreen::buffer::{BufferKind, IndexType};
use offscreen::shader::StageType;
use offscreen::texture::Sampler;
use offscreen::ErrorCode;

use crate::glsl::{self, Interface};
use crate::registry::{self, Census, Registry, GL_INVALID_OPERATION, GL_INVALID_VALUE, GL_OUT_OF_MEMORY};

const MAX_TEXTURE_UNITS: u32 = 8;

/// Headless device, handed out by [`crate::Headless`] once a context is current.
#[derive(Debug)]
pub struct HeadlessDevice {
  registry: Rc<RefCell<Registry>>,
}

impl HeadlessDevice {
  pub(crate) fn new(registry: Rc<RefCell<Registry>>) -> Self {
    HeadlessDevice { registry }
  }

  /// Live driver objects.
  pub fn census(&self) -> Census {
    self.registry.borrow().census()
  }
}

/// GL semantics: the log length counts the terminating NUL, and an empty log has length 0.
fn log_len(log: &str) -> usize {
  if log.is_empty() {
    0
  } else {
    log.len() + 1
  }
}

/// GL semantics: write at most `buf.len() - 1` bytes plus a NUL.
fn copy_log(log: &str, buf: &mut [u8]) -> usize {
  if buf.is_empty() {
    return 0;
  }

  let written = log.len().min(buf.len() - 1);
  buf[..written].copy_from_slice(&log.as_bytes()[..written]);
  buf[written] = 0;
  written
}

unsafe impl Shader for HeadlessDevice {
  type StageRepr = u32;

  type ProgramRepr = u32;

  unsafe fn create_stage(&self, ty: StageType) -> Result<Self::StageRepr, ErrorCode> {
    let mut registry = self.registry.borrow_mut();
    let handle = registry.allocate();

    registry.stages.insert(
      handle,
      registry::Stage {
        ty,
        compiled: None,
        log: String::new(),
      },
    );

    Ok(handle)
  }

  unsafe fn compile_stage(&self, stage: &Self::StageRepr, src: &str) -> bool {
    let mut registry = self.registry.borrow_mut();

    let compiled = registry.stages.get_mut(stage).map(|stage| match glsl::check(stage.ty, src) {
      Ok(interface) => {
        stage.compiled = Some(interface);
        stage.log.clear();
        true
      }

      Err(log) => {
        stage.compiled = None;
        stage.log = log;
        false
      }
    });

    compiled.unwrap_or_else(|| {
      registry.device_fail(GL_INVALID_VALUE);
      false
    })
  }

  unsafe fn stage_log_len(&self, stage: &Self::StageRepr) -> usize {
    self
      .registry
      .borrow()
      .stages
      .get(stage)
      .map_or(0, |stage| log_len(&stage.log))
  }

  unsafe fn read_stage_log(&self, stage: &Self::StageRepr, buf: &mut [u8]) -> usize {
    self
      .registry
      .borrow()
      .stages
      .get(stage)
      .map_or(0, |stage| copy_log(&stage.log, buf))
  }

  unsafe fn destroy_stage(&self, stage: &mut Self::StageRepr) {
    if self.registry.borrow_mut().stages.remove(stage).is_none() {
      log::warn!("destroying unknown stage {}", stage);
    }
  }

  unsafe fn create_program(&self) -> Result<Self::ProgramRepr, ErrorCode> {
    let mut registry = self.registry.borrow_mut();
    let handle = registry.allocate();

    registry.programs.insert(handle, registry::Program::default());
    Ok(handle)
  }

  unsafe fn attach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr) {
    let mut registry = self.registry.borrow_mut();

    if !registry.stages.contains_key(stage) {
      registry.device_fail(GL_INVALID_VALUE);
      return;
    }

    let attached = match registry.programs.get_mut(program) {
      Some(program) if !program.attached.contains(stage) => {
        program.attached.push(*stage);
        true
      }
      _ => false,
    };

    if !attached {
      registry.device_fail(GL_INVALID_OPERATION);
    }
  }

  unsafe fn detach_stage(&self, program: &Self::ProgramRepr, stage: &Self::StageRepr) {
    let mut registry = self.registry.borrow_mut();

    let detached = match registry.programs.get_mut(program) {
      Some(program) if program.attached.contains(stage) => {
        program.attached.retain(|s| s != stage);
        true
      }
      _ => false,
    };

    if !detached {
      registry.device_fail(GL_INVALID_OPERATION);
    }
  }

  unsafe fn link_program(&self, program: &Self::ProgramRepr) -> bool {
    let mut registry = self.registry.borrow_mut();

    let attached = match registry.programs.get(program) {
      Some(program) => program.attached.clone(),
      None => {
        registry.device_fail(GL_INVALID_VALUE);
        return false;
      }
    };

    let linked = link(&registry, &attached);

    if let Some(program) = registry.programs.get_mut(program) {
      match linked {
        Ok(interface) => {
          program.linked = Some(interface);
          program.log.clear();
        }

        Err(log) => {
          program.linked = None;
          program.log = log;
        }
      }

      program.linked.is_some()
    } else {
      false
    }
  }

  unsafe fn program_log_len(&self, program: &Self::ProgramRepr) -> usize {
    self
      .registry
      .borrow()
      .programs
      .get(program)
      .map_or(0, |program| log_len(&program.log))
  }

  unsafe fn read_program_log(&self, program: &Self::ProgramRepr, buf: &mut [u8]) -> usize {
    self
      .registry
      .borrow()
      .programs
      .get(program)
      .map_or(0, |program| copy_log(&program.log, buf))
  }

  unsafe fn destroy_program(&self, program: &mut Self::ProgramRepr) {
    if self.registry.borrow_mut().programs.remove(program).is_none() {
      log::warn!("destroying unknown program {}", program);
    }
  }

  unsafe fn attrib_location(&self, program: &Self::ProgramRepr, name: &str) -> i32 {
    self.location(program, |interface| &interface.attributes, name)
  }

  unsafe fn uniform_location(&self, program: &Self::ProgramRepr, name: &str) -> i32 {
    self.location(program, |interface| &interface.uniforms, name)
  }
}

impl HeadlessDevice {
  fn location(
    &self,
    program: &u32,
    names: impl FnOnce(&Interface) -> &Vec<String>,
    name: &str,
  ) -> i32 {
    let mut registry = self.registry.borrow_mut();

    let index = registry
      .programs
      .get(program)
      .and_then(|program| program.linked.as_ref())
      .map(|interface| names(interface).iter().position(|n| n == name));

    match index {
      Some(index) => index.map_or(-1, |index| index as i32),
      None => {
        registry.device_fail(GL_INVALID_OPERATION);
        -1
      }
    }
  }
}

/// Link attached stages: exactly one vertex and one fragment stage, both compiled, and every
/// fragment input written by the vertex stage.
fn link(registry: &Registry, attached: &[u32]) -> Result<Interface, String> {
  let mut vertex = None;
  let mut fragment = None;

  for handle in attached {
    let stage = registry
      .stages
      .get(handle)
      .ok_or_else(|| "error: attached shader was deleted".to_owned())?;

    let interface = stage
      .compiled
      .as_ref()
      .ok_or_else(|| format!("error: {} is not compiled", stage.ty))?;

    let slot = match stage.ty {
      StageType::VertexShader => &mut vertex,
      StageType::FragmentShader => &mut fragment,
    };

    if slot.replace(interface).is_some() {
      return Err(format!("error: more than one {} attached", stage.ty));
    }
  }

  let vertex = vertex.ok_or_else(|| "error: no vertex shader attached".to_owned())?;
  let fragment = fragment.ok_or_else(|| "error: no fragment shader attached".to_owned())?;

  if let Some(missing) = fragment
    .varyings
    .iter()
    .find(|v| !vertex.varyings.contains(v))
  {
    return Err(format!(
      "error: varying '{}' is read by the fragment shader but not written by the vertex shader",
      missing
    ));
  }

  let mut uniforms = vertex.uniforms.clone();
  for uniform in &fragment.uniforms {
    if !uniforms.contains(uniform) {
      uniforms.push(uniform.clone());
    }
  }

  Ok(Interface {
    attributes: vertex.attributes.clone(),
    uniforms,
    varyings: vertex.varyings.clone(),
  })
}

unsafe impl Buffer for HeadlessDevice {
  type BufferRepr = u32;

  unsafe fn new_buffer(&self, kind: BufferKind, bytes: &[u8]) -> Result<Self::BufferRepr, ErrorCode> {
    let mut registry = self.registry.borrow_mut();

    if registry.faults.buffer {
      return Err(GL_OUT_OF_MEMORY);
    }

    let handle = registry.allocate();
    registry.buffers.insert(
      handle,
      registry::Buffer {
        kind,
        bytes: bytes.to_vec(),
      },
    );

    Ok(handle)
  }

  unsafe fn destroy_buffer(&self, buffer: &mut Self::BufferRepr) {
    if self.registry.borrow_mut().buffers.remove(buffer).is_none() {
      log::warn!("destroying unknown buffer {}", buffer);
    }
  }
}

unsafe impl Texture for HeadlessDevice {
  type TextureRepr = u32;

  unsafe fn new_texture_2d(
    &self,
    width: u32,
    height: u32,
    texels: &[u8],
    sampler: Sampler,
  ) -> Result<Self::TextureRepr, ErrorCode> {
    let mut registry = self.registry.borrow_mut();

    if registry.faults.texture {
      return Err(GL_OUT_OF_MEMORY);
    }

    let len = (width as usize)
      .checked_mul(height as usize)
      .and_then(|texels| texels.checked_mul(4));

    if len != Some(texels.len()) {
      return Err(GL_INVALID_VALUE);
    }

    let handle = registry.allocate();
    registry.textures.insert(
      handle,
      registry::Texture {
        size: [width, height],
        sampler,
      },
    );

    Ok(handle)
  }

  unsafe fn destroy_texture(&self, texture: &mut Self::TextureRepr) {
    if self.registry.borrow_mut().textures.remove(texture).is_none() {
      log::warn!("destroying unknown texture {}", texture);
    }
  }
}

unsafe impl Pipeline for HeadlessDevice {
  unsafe fn set_viewport(&self, width: u32, height: u32) {
    self.registry.borrow_mut().viewport = [width, height];
  }

  unsafe fn clear_color(&self, color: [f32; 4]) {
    let mut registry = self.registry.borrow_mut();
    let [vw, vh] = registry.viewport;
    let rgba = color.map(|c| (c.max(0.).min(1.) * 255.).round() as u8);

    let cleared = match registry.current_surface_mut() {
      Some(surface) => {
        let width = surface.dim.width.min(vw) as usize;
        let height = surface.dim.height.min(vh) as usize;
        let stride = surface.dim.width as usize * 4;

        // a zero-sized surface has nothing to clear
        if stride > 0 {
          for row in surface.pixels.chunks_mut(stride).take(height) {
            for texel in row[..width * 4].chunks_mut(4) {
              texel.copy_from_slice(&rgba);
            }
          }
        }

        true
      }

      None => false,
    };

    if !cleared {
      registry.device_fail(GL_INVALID_OPERATION);
    }
  }

  unsafe fn draw(&self, call: &DrawCall<Self>) {
    let mut registry = self.registry.borrow_mut();

    if let Err(code) = validate(&registry, call) {
      registry.device_fail(code);
      return;
    }

    registry.count_draw();
  }

  unsafe fn read_pixels(&self, width: u32, height: u32, out: &mut [u8]) {
    let mut registry = self.registry.borrow_mut();

    let read = match registry.current_surface_mut() {
      Some(surface) if surface.dim.width == width && surface.dim.height == height => {
        let len = out.len().min(surface.pixels.len());
        out[..len].copy_from_slice(&surface.pixels[..len]);
        true
      }

      _ => false,
    };

    if !read {
      registry.device_fail(GL_INVALID_OPERATION);
    }
  }

  fn last_error(&self) -> Option<ErrorCode> {
    self.registry.borrow_mut().take_device_error()
  }
}

fn validate(registry: &Registry, call: &DrawCall<HeadlessDevice>) -> Result<(), ErrorCode> {
  let interface = match registry.programs.get(call.program) {
    Some(registry::Program {
      linked: Some(interface),
      ..
    }) => interface,
    _ => return Err(GL_INVALID_OPERATION),
  };

  let vertices = match registry.buffers.get(call.vertices) {
    Some(buffer) if buffer.kind == BufferKind::Array => buffer,
    _ => return Err(GL_INVALID_OPERATION),
  };

  let indices = match registry.buffers.get(call.indices) {
    Some(buffer) if buffer.kind == BufferKind::Element => buffer,
    _ => return Err(GL_INVALID_OPERATION),
  };

  // number of vertices every attribute can be fetched for
  let mut vertex_count = usize::MAX;

  for attrib in call.attribs.iter().filter(|attrib| !attrib.location.is_absent()) {
    let location = attrib.location.index();

    if location < 0 || location as usize >= interface.attributes.len() {
      return Err(GL_INVALID_VALUE);
    }

    if !(1..=4).contains(&attrib.components) || attrib.stride == 0 {
      return Err(GL_INVALID_VALUE);
    }

    let size = attrib.components as usize * 4;
    let len = vertices.bytes.len();
    let fetchable = if len < attrib.offset + size {
      0
    } else {
      (len - attrib.offset - size) / attrib.stride + 1
    };

    vertex_count = vertex_count.min(fetchable);
  }

  let index_bytes = call.index_type.bytes();
  if call.index_count * index_bytes > indices.bytes.len() {
    return Err(GL_INVALID_OPERATION);
  }

  let out_of_range = indices.bytes[..call.index_count * index_bytes]
    .chunks(index_bytes)
    .map(|b| read_index(call.index_type, b))
    .any(|index| index >= vertex_count);

  if out_of_range {
    return Err(GL_INVALID_OPERATION);
  }

  for bound in call.textures {
    let texture = registry.textures.get(bound.texture).ok_or(GL_INVALID_OPERATION)?;

    if bound.unit >= MAX_TEXTURE_UNITS {
      return Err(GL_INVALID_VALUE);
    }

    // -1 is silently ignored, as uniform updates are
    if bound.location >= 0 && bound.location as usize >= interface.uniforms.len() {
      return Err(GL_INVALID_OPERATION);
    }

    log::trace!(
      "texture {:?} sampled with {:?} on unit {}",
      texture.size,
      texture.sampler,
      bound.unit
    );
  }

  Ok(())
}

fn read_index(ty: IndexType, bytes: &[u8]) -> usize {
  match ty {
    IndexType::U8 => bytes[0] as usize,
    IndexType::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as usize,
    IndexType::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
  }
}
