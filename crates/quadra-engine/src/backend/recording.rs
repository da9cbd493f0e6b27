//! Headless backend that records every call.
//!
//! Handles are issued from a counter starting at 1, live objects are tracked so
//! leaks show up as leftovers after disposal, and buffer/texture contents are
//! retained for inspection.

use std::collections::{BTreeSet, HashMap};

use crate::coords::{Rgba, SurfaceSize};
use crate::scene::TextureHandle;

use super::{
    BackendError, BufferHandle, BufferUsage, FrameOutcome, GpuBackend, GpuObject, ProgramDesc,
    ProgramHandle, ProgramKind, UniformValue,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    BeginFrame,
    EndFrame,
    CreateVertexBuffer { buffer: BufferHandle, len: usize, usage: BufferUsage },
    CreateIndexBuffer { buffer: BufferHandle, indices: Vec<u16>, usage: BufferUsage },
    WriteBuffer { buffer: BufferHandle, len: usize },
    DeleteBuffer(BufferHandle),
    CreateTexture { texture: TextureHandle, width: u32, height: u32 },
    DeleteTexture(TextureHandle),
    CreateProgram { program: ProgramHandle, label: String, kind: ProgramKind },
    DeleteProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    SetUniform { program: ProgramHandle, name: String, value: UniformValue },
    BindTexture { unit: u32, texture: TextureHandle },
    BindVertexBuffer(BufferHandle),
    BindIndexBuffer(BufferHandle),
    DrawIndexed { index_count: u32, first_index: u32, base_vertex: i32 },
    SetViewport(SurfaceSize),
    Clear(Rgba),
    EnableAlphaBlending,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_id: u32,
    live: BTreeSet<GpuObject>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, (u32, u32, Vec<u8>)>,
    fail_programs: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `create_program` fail with `diagnostic`.
    pub fn fail_program_creation(&mut self, diagnostic: impl Into<String>) {
        self.fail_programs = Some(diagnostic.into());
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Returns and forgets the calls recorded so far.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::DrawIndexed { .. }))
            .count()
    }

    pub fn clear_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Clear(_)))
            .count()
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> &BTreeSet<GpuObject> {
        &self.live
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn texture_data(&self, texture: TextureHandle) -> Option<(u32, u32, &[u8])> {
        self.textures
            .get(&texture)
            .map(|(w, h, data)| (*w, *h, data.as_slice()))
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuBackend for RecordingBackend {
    fn begin_frame(&mut self) -> Result<(), BackendError> {
        self.calls.push(BackendCall::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<FrameOutcome, BackendError> {
        self.calls.push(BackendCall::EndFrame);
        Ok(FrameOutcome::Presented)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError> {
        let buffer = BufferHandle(self.next_id());
        self.live.insert(GpuObject::Buffer(buffer));
        self.buffers.insert(buffer, data.to_vec());
        self.calls.push(BackendCall::CreateVertexBuffer { buffer, len: data.len(), usage });
        Ok(buffer)
    }

    fn create_index_buffer(
        &mut self,
        indices: &[u16],
        usage: BufferUsage,
    ) -> Result<BufferHandle, BackendError> {
        let buffer = BufferHandle(self.next_id());
        self.live.insert(GpuObject::Buffer(buffer));
        self.buffers.insert(buffer, bytemuck::cast_slice(indices).to_vec());
        self.calls.push(BackendCall::CreateIndexBuffer {
            buffer,
            indices: indices.to_vec(),
            usage,
        });
        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<(), BackendError> {
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownHandle { kind: "buffer", id: buffer.0 })?;
        slot.clear();
        slot.extend_from_slice(data);
        self.calls.push(BackendCall::WriteBuffer { buffer, len: data.len() });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.live.remove(&GpuObject::Buffer(buffer));
        self.buffers.remove(&buffer);
        self.calls.push(BackendCall::DeleteBuffer(buffer));
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, BackendError> {
        if width == 0 || height == 0 || rgba.len() != width as usize * height as usize * 4 {
            return Err(BackendError::InvalidTexture {
                width,
                height,
                reason: format!("{} bytes of RGBA data", rgba.len()),
            });
        }
        let texture = TextureHandle(self.next_id());
        self.live.insert(GpuObject::Texture(texture));
        self.textures.insert(texture, (width, height, rgba.to_vec()));
        self.calls.push(BackendCall::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.live.remove(&GpuObject::Texture(texture));
        self.textures.remove(&texture);
        self.calls.push(BackendCall::DeleteTexture(texture));
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError> {
        if let Some(diagnostic) = &self.fail_programs {
            return Err(BackendError::Shader {
                label: desc.label.to_string(),
                diagnostic: diagnostic.clone(),
            });
        }
        let program = ProgramHandle(self.next_id());
        self.live.insert(GpuObject::Program(program));
        self.calls.push(BackendCall::CreateProgram {
            program,
            label: desc.label.to_string(),
            kind: desc.kind,
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.live.remove(&GpuObject::Program(program));
        self.calls.push(BackendCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(BackendCall::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        self.calls.push(BackendCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.calls.push(BackendCall::BindTexture { unit, texture });
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(BackendCall::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(BackendCall::BindIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.calls.push(BackendCall::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        });
    }

    fn set_viewport(&mut self, size: SurfaceSize) {
        self.calls.push(BackendCall::SetViewport(size));
    }

    fn clear(&mut self, color: Rgba) {
        self.calls.push(BackendCall::Clear(color));
    }

    fn enable_alpha_blending(&mut self) {
        self.calls.push(BackendCall::EnableAlphaBlending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_never_zero_and_tracked_until_deleted() {
        let mut gpu = RecordingBackend::new();
        let b = gpu.create_vertex_buffer(&[0; 8], BufferUsage::Static).unwrap();
        let t = gpu.create_texture(1, 1, &[255; 4]).unwrap();

        assert_ne!(b.0, 0);
        assert!(!t.is_none());
        assert_eq!(gpu.live_objects().len(), 2);

        GpuObject::Buffer(b).delete(&mut gpu);
        GpuObject::Texture(t).delete(&mut gpu);
        assert!(gpu.live_objects().is_empty());
    }

    #[test]
    fn write_buffer_replaces_contents() {
        let mut gpu = RecordingBackend::new();
        let b = gpu.create_vertex_buffer(&[1, 2, 3, 4], BufferUsage::Dynamic).unwrap();
        gpu.write_buffer(b, &[9; 12]).unwrap();
        assert_eq!(gpu.buffer_data(b), Some(&[9u8; 12][..]));

        assert_eq!(
            gpu.write_buffer(BufferHandle(99), &[0; 4]),
            Err(BackendError::UnknownHandle { kind: "buffer", id: 99 })
        );
    }

    #[test]
    fn texture_size_is_validated() {
        let mut gpu = RecordingBackend::new();
        assert!(gpu.create_texture(2, 2, &[0; 15]).is_err());
        assert!(gpu.create_texture(0, 2, &[]).is_err());
        assert!(gpu.live_objects().is_empty());
    }
}
