use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::backend::UniformValue;

/// Per-draw uniform data shared by both program kinds.
///
/// Matches `struct Uniforms` in the WGSL sources.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct UniformBlock {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub params: [f32; 4], // x = opacity
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self {
            transform: glam::Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0; 4],
            params: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl UniformBlock {
    /// Stores `value` under `name`. Returns `false` for unknown names or
    /// mismatched value types, leaving the block unchanged.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match (name, value) {
            ("transform", UniformValue::Mat4(m)) => self.transform = m,
            ("color", UniformValue::Vec4(c)) => self.color = c,
            ("opacity", UniformValue::Float(a)) => self.params[0] = a,
            _ => return false,
        }
        true
    }

    pub fn min_binding_size() -> NonZeroU64 {
        NonZeroU64::new(std::mem::size_of::<UniformBlock>() as u64)
            .unwrap_or(NonZeroU64::MIN)
    }
}

/// Dynamic-offset uniform buffer holding every draw's block for one frame.
///
/// Grows to the next power of two when a frame needs more slots; never shrinks.
pub(super) struct UniformArena {
    stride: u64,
    capacity: usize,
    buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    staging: Vec<u8>,
}

impl UniformArena {
    pub fn new(device: &wgpu::Device) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment.max(1) as u64;
        let size = std::mem::size_of::<UniformBlock>() as u64;
        Self {
            stride: size.div_ceil(align) * align,
            capacity: 0,
            buffer: None,
            bind_group: None,
            staging: Vec::new(),
        }
    }

    /// Byte offset of slot `slot` for `set_bind_group`.
    pub fn offset(&self, slot: u32) -> u32 {
        (slot as u64 * self.stride) as u32
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Uploads `blocks`, one per slot.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        blocks: &[UniformBlock],
    ) {
        if blocks.is_empty() {
            return;
        }
        self.ensure_capacity(device, layout, blocks.len());
        let Some(buffer) = self.buffer.as_ref() else { return };

        let stride = self.stride as usize;
        self.staging.clear();
        self.staging.resize(blocks.len() * stride, 0);
        for (i, block) in blocks.iter().enumerate() {
            let bytes = bytemuck::bytes_of(block);
            self.staging[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(buffer, 0, &self.staging);
    }

    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        slots: usize,
    ) {
        if slots <= self.capacity && self.buffer.is_some() {
            return;
        }

        let capacity = slots.next_power_of_two().max(64);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quadra uniform arena"),
            size: capacity as u64 * self.stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quadra uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(UniformBlock::min_binding_size()),
                }),
            }],
        });

        log::debug!("uniform arena grown to {capacity} slots");
        self.buffer = Some(buffer);
        self.bind_group = Some(bind_group);
        self.capacity = capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout_matches_wgsl_struct() {
        // mat4x4 (64) + vec4 (16) + vec4 (16)
        assert_eq!(std::mem::size_of::<UniformBlock>(), 96);
    }

    #[test]
    fn set_accepts_known_names_with_matching_types() {
        let mut block = UniformBlock::default();
        assert!(block.set("color", UniformValue::Vec4([0.5; 4])));
        assert!(block.set("opacity", UniformValue::Float(0.25)));
        assert_eq!(block.color, [0.5; 4]);
        assert_eq!(block.params[0], 0.25);

        let before = block;
        assert!(!block.set("color", UniformValue::Float(1.0)));
        assert!(!block.set("tint", UniformValue::Vec4([0.0; 4])));
        assert_eq!(block, before);
    }
}
