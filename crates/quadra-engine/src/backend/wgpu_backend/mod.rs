//! wgpu implementation of [`GpuBackend`].
//!
//! wgpu has no immediate-mode state machine, so this backend emulates one:
//! - `bind_*`, `use_program` and `set_uniform` update a CPU-side binding state
//! - `draw_indexed` snapshots that state (including the program's uniform
//!   block) into the open frame's recording
//! - `end_frame` acquires the swapchain image, uploads every recorded uniform
//!   block into one dynamic-offset buffer and replays the draws in a single
//!   render pass
//!
//! Buffer writes go through `Queue::write_buffer` and land before the frame's
//! submission: a buffer rewritten twice within one frame keeps only the last
//! contents for every draw of that frame.

mod program;
mod surface;
mod uniforms;

pub use surface::GpuInit;

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::coords::{Rgba, SurfaceSize};
use crate::scene::TextureHandle;

use super::{
    BackendError, BufferHandle, BufferUsage, FrameOutcome, GpuBackend, ProgramDesc,
    ProgramHandle, ProgramKind, UniformValue,
};
use program::{GpuProgram, SharedLayouts};
use surface::{SurfaceContext, SurfaceErrorAction};
use uniforms::{UniformArena, UniformBlock};

struct GpuBuffer {
    buffer: wgpu::Buffer,
    usage: wgpu::BufferUsages,
    size: u64,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bindings {
    program: Option<ProgramHandle>,
    vertex: Option<BufferHandle>,
    index: Option<BufferHandle>,
    texture: Option<TextureHandle>,
}

struct RecordedDraw {
    program: ProgramHandle,
    blended: bool,
    vertex: BufferHandle,
    index: BufferHandle,
    texture: Option<TextureHandle>,
    uniform_slot: u32,
    indices: Range<u32>,
    base_vertex: i32,
}

#[derive(Default)]
struct FrameRecording {
    clear: Option<Rgba>,
    draws: Vec<RecordedDraw>,
    uniforms: Vec<UniformBlock>,
}

/// Window-bound wgpu backend.
///
/// Borrows the window for `'w` through its surface.
pub struct WgpuBackend<'w> {
    ctx: SurfaceContext<'w>,
    layouts: SharedLayouts,
    arena: UniformArena,

    buffers: HashMap<BufferHandle, GpuBuffer>,
    textures: HashMap<TextureHandle, GpuTexture>,
    programs: HashMap<ProgramHandle, GpuProgram>,
    next_id: u32,

    bound: Bindings,
    blend: bool,
    viewport: Option<SurfaceSize>,
    frame: Option<FrameRecording>,

    warned: HashSet<&'static str>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the device and surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let ctx = SurfaceContext::new(window, init).await?;
        let layouts = SharedLayouts::new(ctx.device());
        let arena = UniformArena::new(ctx.device());

        log::debug!("wgpu backend ready, surface format {:?}", ctx.format());

        Ok(Self {
            ctx,
            layouts,
            arena,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            next_id: 0,
            bound: Bindings::default(),
            blend: false,
            viewport: None,
            frame: None,
            warned: HashSet::new(),
        })
    }

    /// Reconfigures the swapchain after a window resize.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.ctx.resize(size);
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.ctx.size()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn create_buffer(&mut self, label: &str, bytes: &[u8], usage: wgpu::BufferUsages) -> BufferHandle {
        let contents = padded(bytes);
        let buffer = self
            .ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: &contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            });

        let handle = BufferHandle(self.next_id());
        self.buffers.insert(
            handle,
            GpuBuffer {
                buffer,
                usage: usage | wgpu::BufferUsages::COPY_DST,
                size: contents.len() as u64,
            },
        );
        handle
    }

    fn replay(&mut self, rec: FrameRecording) -> Result<FrameOutcome, BackendError> {
        let mut frame = match self.ctx.acquire() {
            Ok(f) => f,
            Err(err) => {
                return match self.ctx.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(BackendError::Surface(
                        "out of memory while acquiring the swapchain image".to_string(),
                    )),
                    action => {
                        log::debug!("frame skipped after surface error ({action:?})");
                        Ok(FrameOutcome::Skipped)
                    }
                };
            }
        };

        self.arena.upload(
            self.ctx.device(),
            self.ctx.queue(),
            &self.layouts.uniforms,
            &rec.uniforms,
        );

        let mut dropped = 0usize;
        {
            let load = match rec.clear {
                Some(c) => wgpu::LoadOp::Clear(c.into()),
                None => wgpu::LoadOp::Load,
            };

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quadra scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let target = self.ctx.size();
            if let Some(vp) = self.viewport {
                let (w, h) = (vp.width.min(target.width), vp.height.min(target.height));
                if w > 0 && h > 0 {
                    rpass.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);
                }
            }

            if let Some(uniform_group) = self.arena.bind_group() {
                for d in &rec.draws {
                    // Objects deleted after the draw was recorded are skipped.
                    let (Some(program), Some(vb), Some(ib)) = (
                        self.programs.get(&d.program),
                        self.buffers.get(&d.vertex),
                        self.buffers.get(&d.index),
                    ) else {
                        dropped += 1;
                        continue;
                    };

                    rpass.set_pipeline(program.pipeline(d.blended));
                    rpass.set_bind_group(0, uniform_group, &[self.arena.offset(d.uniform_slot)]);

                    if program.kind == ProgramKind::Textured {
                        let Some(tex) = d.texture.and_then(|t| self.textures.get(&t)) else {
                            dropped += 1;
                            continue;
                        };
                        rpass.set_bind_group(1, &tex.bind_group, &[]);
                    }

                    rpass.set_vertex_buffer(0, vb.buffer.slice(..));
                    rpass.set_index_buffer(ib.buffer.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(d.indices.clone(), d.base_vertex, 0..1);
                }
            }
        }

        if dropped > 0 {
            log::debug!("{dropped} draw(s) referenced objects deleted mid-frame");
        }

        self.ctx.present(frame);
        Ok(FrameOutcome::Presented)
    }
}

impl GpuBackend for WgpuBackend<'_> {
    fn begin_frame(&mut self) -> Result<(), BackendError> {
        if self.frame.is_some() {
            warn_once(&mut self.warned, "begin_frame called twice; previous recording discarded");
        }
        self.frame = Some(FrameRecording::default());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<FrameOutcome, BackendError> {
        let Some(rec) = self.frame.take() else {
            return Ok(FrameOutcome::Skipped);
        };
        if !self.ctx.size().is_valid() {
            return Ok(FrameOutcome::Skipped);
        }
        self.replay(rec)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError> {
        let label = match usage {
            BufferUsage::Static => "quadra static vbo",
            BufferUsage::Dynamic => "quadra dynamic vbo",
        };
        Ok(self.create_buffer(label, data, wgpu::BufferUsages::VERTEX))
    }

    fn create_index_buffer(
        &mut self,
        indices: &[u16],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError> {
        let label = match usage {
            BufferUsage::Static => "quadra static ibo",
            BufferUsage::Dynamic => "quadra dynamic ibo",
        };
        Ok(self.create_buffer(label, bytemuck::cast_slice(indices), wgpu::BufferUsages::INDEX))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<(), BackendError> {
        let device = self.ctx.device();
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownHandle { kind: "buffer", id: buffer.0 })?;

        let contents = padded(data);
        if contents.len() as u64 > entry.size {
            let size = (contents.len() as u64).next_power_of_two();
            entry.buffer.destroy();
            entry.buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("quadra grown buffer"),
                size,
                usage: entry.usage,
                mapped_at_creation: false,
            });
            entry.size = size;
        }

        self.ctx.queue().write_buffer(&entry.buffer, 0, &contents);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(entry) = self.buffers.remove(&buffer) {
            entry.buffer.destroy();
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        let max = self.ctx.device().limits().max_texture_dimension_2d;
        let invalid = |reason: String| BackendError::InvalidTexture { width, height, reason };

        if width == 0 || height == 0 || width > max || height > max {
            return Err(invalid(format!("dimensions must be within 1..={max}")));
        }
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(invalid(format!("{} bytes of RGBA data", rgba.len())));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.ctx.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("quadra sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.ctx.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quadra texture bind group"),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.layouts.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle, GpuTexture { texture, bind_group });
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(&texture) {
            entry.texture.destroy();
        }
        if self.bound.texture == Some(texture) {
            self.bound.texture = None;
        }
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError> {
        let program =
            program::create_program(self.ctx.device(), self.ctx.format(), &self.layouts, desc)?;
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(handle, program);
        log::debug!("program `{}` linked as {handle:?}", desc.label);
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.bound.program == Some(program) {
            self.bound.program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.bound.program = Some(program);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let applied = self
            .programs
            .get_mut(&program)
            .is_some_and(|p| p.uniforms.set(name, value));
        if !applied {
            warn_once(&mut self.warned, "set_uniform ignored (unknown program, name or type)");
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if unit != 0 {
            warn_once(&mut self.warned, "only texture unit 0 is supported");
            return;
        }
        self.bound.texture = Some(texture);
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.bound.vertex = Some(buffer);
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.bound.index = Some(buffer);
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        let Some(frame) = self.frame.as_mut() else {
            warn_once(&mut self.warned, "draw outside begin_frame/end_frame ignored");
            return;
        };
        let Bindings {
            program: Some(program_handle),
            vertex: Some(vertex),
            index: Some(index),
            texture,
        } = self.bound
        else {
            warn_once(&mut self.warned, "draw with incomplete bindings ignored");
            return;
        };
        let Some(program) = self.programs.get(&program_handle) else {
            warn_once(&mut self.warned, "draw with unknown program ignored");
            return;
        };

        let texture = match program.kind {
            ProgramKind::Solid => None,
            ProgramKind::Textured => match texture.filter(|t| self.textures.contains_key(t)) {
                Some(t) => Some(t),
                None => {
                    warn_once(&mut self.warned, "textured draw with unknown texture skipped");
                    return;
                }
            },
        };

        let uniform_slot = frame.uniforms.len() as u32;
        frame.uniforms.push(program.uniforms);
        frame.draws.push(RecordedDraw {
            program: program_handle,
            blended: self.blend,
            vertex,
            index,
            texture,
            uniform_slot,
            indices: first_index..first_index + index_count,
            base_vertex,
        });
    }

    fn set_viewport(&mut self, size: SurfaceSize) {
        self.viewport = Some(size);
    }

    /// Clears the whole target; draws recorded earlier in the frame are discarded.
    fn clear(&mut self, color: Rgba) {
        let Some(frame) = self.frame.as_mut() else {
            warn_once(&mut self.warned, "clear outside begin_frame/end_frame ignored");
            return;
        };
        frame.clear = Some(color);
        frame.draws.clear();
        frame.uniforms.clear();
    }

    fn enable_alpha_blending(&mut self) {
        self.blend = true;
    }
}

fn warn_once(warned: &mut HashSet<&'static str>, msg: &'static str) {
    if warned.insert(msg) {
        log::warn!("{msg}");
    }
}

/// Pads to `wgpu::COPY_BUFFER_ALIGNMENT`, with a minimum of one word.
fn padded(bytes: &[u8]) -> Vec<u8> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let len = bytes.len().div_ceil(align).max(1) * align;
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(bytes);
    out.resize(len, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_rounds_up_to_copy_alignment() {
        assert_eq!(padded(&[]).len(), 4);
        assert_eq!(padded(&[1, 2, 3, 4, 5, 6]), vec![1, 2, 3, 4, 5, 6, 0, 0]);
        assert_eq!(padded(&[7; 8]).len(), 8);
    }
}
