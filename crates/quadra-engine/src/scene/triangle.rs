use glam::Vec2;

use crate::coords::Rgba;

/// Solid-color triangle in NDC.
///
/// Immutable once recorded; only [`SceneBuffer::clear_triangles`](super::SceneBuffer::clear_triangles)
/// removes it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub points: [Vec2; 3],
    pub color: Rgba,
}

impl Triangle {
    #[inline]
    pub const fn new(points: [Vec2; 3], color: Rgba) -> Self {
        Self { points, color }
    }
}
