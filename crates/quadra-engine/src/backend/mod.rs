//! GPU backend seam.
//!
//! The render pipeline talks to the GPU exclusively through [`GpuBackend`], an
//! immediate-mode interface in the style of a classic GL context: objects are
//! addressed by small integer handles, uniforms are set by name on a program,
//! and draws consume whatever is currently bound.
//!
//! Implementations:
//! - [`wgpu_backend::WgpuBackend`]: records draws and replays them into one render pass
//!   per frame
//! - [`recording::RecordingBackend`]: headless, records every call; used by tests
//!
//! All calls are synchronous and must come from the render thread.

mod error;
mod vertex;

pub mod recording;
pub mod wgpu_backend;

pub use error::BackendError;
pub use vertex::{SolidVertex, TexturedVertex};

use crate::coords::{Rgba, SurfaceSize};
use crate::scene::TextureHandle;

/// Handle to a vertex or index buffer. `0` is never issued.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a compiled shader program. `0` is never issued.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Any GPU object a backend can create.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum GpuObject {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Program(ProgramHandle),
}

impl GpuObject {
    /// Deletes the object through the matching `delete_*` call.
    pub fn delete(self, backend: &mut dyn GpuBackend) {
        match self {
            GpuObject::Buffer(b) => backend.delete_buffer(b),
            GpuObject::Texture(t) => backend.delete_texture(t),
            GpuObject::Program(p) => backend.delete_program(p),
        }
    }
}

/// Update-frequency hint for buffers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Written once at creation.
    Static,
    /// Rewritten every frame or so.
    Dynamic,
}

/// Vertex layout + binding scheme a program expects.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProgramKind {
    /// [`TexturedVertex`] input, texture on unit 0, `transform`/`color`/`opacity` uniforms.
    Textured,
    /// [`SolidVertex`] input, `transform`/`color` uniforms.
    Solid,
}

/// Shader program source.
///
/// `source` is a single WGSL module with `vs_main` and `fs_main` entry points.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub kind: ProgramKind,
    pub source: &'a str,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

/// Result of closing a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// Transient surface condition (timeout, outdated, zero size); try next frame.
    Skipped,
}

/// Immediate-mode GPU interface consumed by the render pipeline.
pub trait GpuBackend {
    /// Opens a frame. Draw and clear calls are only valid between
    /// `begin_frame` and [`end_frame`](Self::end_frame).
    fn begin_frame(&mut self) -> Result<(), BackendError>;

    /// Closes the frame and presents it.
    fn end_frame(&mut self) -> Result<FrameOutcome, BackendError>;

    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError>;

    fn create_index_buffer(
        &mut self,
        indices: &[u16],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError>;

    /// Replaces the buffer contents, growing it if needed.
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<(), BackendError>;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Creates an RGBA8 texture from tightly packed rows.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError>;

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Compiles and links a program. Failures carry the backend diagnostic.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError>;

    fn delete_program(&mut self, program: ProgramHandle);

    fn use_program(&mut self, program: ProgramHandle);

    /// Sets a named uniform on `program`. Unknown names are ignored.
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    /// Binds `texture` to sampler unit `unit`. Handles are not validated here.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle);

    fn bind_index_buffer(&mut self, buffer: BufferHandle);

    /// Draws `index_count` indices starting at `first_index` as a triangle list.
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);

    fn set_viewport(&mut self, size: SurfaceSize);

    fn clear(&mut self, color: Rgba);

    /// Enables `srcAlpha, 1 - srcAlpha` blending for subsequent draws.
    fn enable_alpha_blending(&mut self);
}
