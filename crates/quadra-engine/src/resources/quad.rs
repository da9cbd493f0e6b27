//! Canonical geometry shared by every sprite and triangle draw.

use crate::backend::TexturedVertex;

/// Unit square centered on the origin, counter-clockwise from bottom-left.
pub const QUAD_VERTICES: [TexturedVertex; 4] = [
    TexturedVertex { pos: [-0.5, -0.5], uv: [0.0, 0.0] },
    TexturedVertex { pos: [0.5, -0.5], uv: [1.0, 0.0] },
    TexturedVertex { pos: [0.5, 0.5], uv: [1.0, 1.0] },
    TexturedVertex { pos: [-0.5, 0.5], uv: [0.0, 1.0] },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Indices of one triangle; combined with a base vertex of `3 * i` to address
/// triangle `i` of the batched vertex buffer.
pub const TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_unit_square_with_ccw_triangles() {
        for tri in QUAD_INDICES.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| QUAD_VERTICES[tri[k] as usize].pos);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross > 0.0);
        }
        for v in QUAD_VERTICES {
            assert_eq!(v.pos.map(f32::abs), [0.5, 0.5]);
            assert_eq!(v.uv, [v.pos[0] + 0.5, v.pos[1] + 0.5]);
        }
    }
}
