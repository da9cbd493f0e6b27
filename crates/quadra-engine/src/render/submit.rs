use crate::backend::{BackendError, GpuBackend, SolidVertex, UniformValue};
use crate::coords::Rgba;
use crate::resources::quad::{QUAD_INDICES, TRIANGLE_INDICES};
use crate::resources::GpuResources;
use crate::snapshot::SceneSnapshot;
use crate::transform::{compose_sprite, to_clip_matrix};

/// Issues the draw calls for one snapshot and returns how many were issued.
///
/// Must run between `begin_frame` and `end_frame`. Sprites are drawn first, in
/// snapshot order, one draw each; triangles follow from a single vertex upload,
/// one draw each with base vertex `3 * i`. `scratch` is reused across frames.
pub fn submit(
    backend: &mut dyn GpuBackend,
    res: &GpuResources,
    snapshot: &SceneSnapshot<'_>,
    clear_color: Rgba,
    scratch: &mut Vec<SolidVertex>,
) -> Result<usize, BackendError> {
    let mut draw_calls = 0;

    backend.enable_alpha_blending();
    backend.clear(clear_color);

    if !snapshot.sprites.is_empty() {
        backend.use_program(res.textured_program);
        backend.bind_vertex_buffer(res.quad_vertices);
        backend.bind_index_buffer(res.quad_indices);

        for sprite in snapshot.sprites {
            let clip = to_clip_matrix(&compose_sprite(sprite));
            backend.set_uniform(
                res.textured_program,
                "transform",
                UniformValue::Mat4(clip.to_cols_array_2d()),
            );
            backend.bind_texture(0, sprite.texture);
            backend.draw_indexed(QUAD_INDICES.len() as u32, 0, 0);
            draw_calls += 1;
        }
    }

    if !snapshot.triangles.is_empty() {
        scratch.clear();
        scratch.extend(
            snapshot
                .triangles
                .iter()
                .flat_map(|t| t.points)
                .map(|p| SolidVertex { pos: p.to_array() }),
        );
        backend.write_buffer(res.triangle_vertices, bytemuck::cast_slice(scratch))?;

        backend.use_program(res.solid_program);
        backend.bind_vertex_buffer(res.triangle_vertices);
        backend.bind_index_buffer(res.triangle_indices);

        for (i, tri) in snapshot.triangles.iter().enumerate() {
            backend.set_uniform(
                res.solid_program,
                "color",
                UniformValue::Vec4(tri.color.to_array()),
            );
            backend.draw_indexed(TRIANGLE_INDICES.len() as u32, 0, (3 * i) as i32);
            draw_calls += 1;
        }
    }

    Ok(draw_calls)
}
