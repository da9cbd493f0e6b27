use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::backend::{BackendError, FrameOutcome, GpuBackend, SolidVertex};
use crate::coords::SurfaceSize;
use crate::core::{AppControl, FrameHandler};
use crate::resources::{GpuResources, ImageDecoder, TextureDecoder};
use crate::scene::{GlobalQuad, SceneBuffer, TextureHandle};
use crate::snapshot::FrameSnapshotter;
use crate::time::FrameTime;

use super::config::{RenderMode, RendererConfig};
use super::stats::{FrameReport, FrameStats};
use super::submit::submit;

/// Draws the shared scene once per frame.
///
/// Producers hold clones of [`scene`](Self::scene) and [`global_quad`](Self::global_quad);
/// everything else lives on the render thread. Rendering and disposal both take
/// `&mut self`, so they can never overlap.
pub struct SceneRenderer {
    scene: Arc<SceneBuffer>,
    quad: Arc<GlobalQuad>,
    config: RendererConfig,
    decoder: Box<dyn TextureDecoder + Send>,

    resources: Option<GpuResources>,
    snapshotter: FrameSnapshotter,
    triangle_vertices: Vec<SolidVertex>,
    stats: FrameStats,
    surface: SurfaceSize,
}

impl SceneRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self::with_decoder(config, ImageDecoder)
    }

    pub fn with_decoder(config: RendererConfig, decoder: impl TextureDecoder + Send + 'static) -> Self {
        Self {
            scene: Arc::new(SceneBuffer::new()),
            quad: Arc::new(GlobalQuad::new()),
            config,
            decoder: Box::new(decoder),
            resources: None,
            snapshotter: FrameSnapshotter::new(),
            triangle_vertices: Vec::new(),
            stats: FrameStats::new(),
            surface: SurfaceSize::default(),
        }
    }

    pub fn scene(&self) -> &Arc<SceneBuffer> {
        &self.scene
    }

    pub fn global_quad(&self) -> &Arc<GlobalQuad> {
        &self.quad
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn resources(&self) -> Option<&GpuResources> {
        self.resources.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Creates GPU resources and sets the viewport. A second call is ignored.
    pub fn initialize(
        &mut self,
        backend: &mut dyn GpuBackend,
        surface: SurfaceSize,
    ) -> Result<(), BackendError> {
        if self.resources.is_some() {
            log::debug!("renderer already initialized");
            return Ok(());
        }

        let resources = GpuResources::create(
            backend,
            &*self.decoder,
            self.config.default_texture.as_deref(),
        )?;
        self.resources = Some(resources);

        self.surface = surface;
        backend.set_viewport(surface);
        log::info!("renderer initialized ({:?}, {}x{})", self.config.mode, surface.width, surface.height);
        Ok(())
    }

    /// Snapshots the scene and submits it.
    ///
    /// Does nothing before [`initialize`](Self::initialize), after
    /// [`dispose`](Self::dispose), or when there is nothing to draw.
    pub fn render(&mut self, backend: &mut dyn GpuBackend) -> Result<FrameReport, BackendError> {
        let Some(res) = self.resources.as_ref() else {
            return Ok(FrameReport::default());
        };

        let snapshot = match self.config.mode {
            RenderMode::MultiSprite => self.snapshotter.capture(&self.scene),
            RenderMode::SingleQuad => {
                let mut quad = self.quad.sprite();
                if quad.texture.is_none() {
                    quad.texture = res.default_texture;
                }
                self.snapshotter.capture_single(&self.scene, quad)
            }
        };

        if snapshot.is_empty() {
            return Ok(FrameReport::default());
        }

        backend.begin_frame()?;
        let draw_calls = submit(
            backend,
            res,
            &snapshot,
            self.config.clear_color,
            &mut self.triangle_vertices,
        )?;
        let outcome = backend.end_frame()?;

        let report = FrameReport {
            sprites: snapshot.sprites.len(),
            triangles: snapshot.triangles.len(),
            draw_calls,
            skipped: outcome == FrameOutcome::Skipped,
        };
        log::trace!("{report:?}");

        if let Some(summary) = self.stats.record(&report, Instant::now()) {
            log::debug!(
                "{:.1} fps, {} draw calls, {} skipped over {:.2?}",
                summary.fps(),
                summary.draw_calls,
                summary.skipped,
                summary.elapsed,
            );
        }

        Ok(report)
    }

    pub fn on_resize(&mut self, backend: &mut dyn GpuBackend, size: SurfaceSize) {
        self.surface = size;
        if self.resources.is_some() && size.is_valid() {
            backend.set_viewport(size);
        }
    }

    /// Releases every GPU object. Later calls, and renders, are no-ops.
    pub fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        if let Some(resources) = self.resources.take() {
            resources.dispose(backend);
            log::debug!("renderer disposed");
        }
    }

    /// Loads a texture for use by sprites. Returns [`TextureHandle::NONE`]
    /// before initialization.
    pub fn load_texture(
        &mut self,
        backend: &mut dyn GpuBackend,
        path: &Path,
    ) -> Result<TextureHandle, BackendError> {
        match self.resources.as_mut() {
            Some(res) => res.load_texture(backend, &*self.decoder, path),
            None => Ok(TextureHandle::NONE),
        }
    }
}

impl FrameHandler for SceneRenderer {
    fn initialize(&mut self, backend: &mut dyn GpuBackend, surface: SurfaceSize) -> anyhow::Result<()> {
        SceneRenderer::initialize(self, backend, surface).context("failed to create GPU resources")
    }

    fn render(&mut self, backend: &mut dyn GpuBackend, _time: &FrameTime) -> anyhow::Result<AppControl> {
        SceneRenderer::render(self, backend).context("frame submission failed")?;
        Ok(AppControl::Continue)
    }

    fn on_resize(&mut self, backend: &mut dyn GpuBackend, size: SurfaceSize) {
        SceneRenderer::on_resize(self, backend, size);
    }

    fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        SceneRenderer::dispose(self, backend);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};
    use crate::backend::UniformValue;
    use crate::coords::Rgba;
    use crate::scene::Sprite;
    use crate::transform::{compose_sprite, to_clip_matrix};

    const SURFACE: SurfaceSize = SurfaceSize { width: 800, height: 600 };

    fn ready(config: RendererConfig) -> (SceneRenderer, RecordingBackend) {
        let mut renderer = SceneRenderer::new(config);
        let mut backend = RecordingBackend::new();
        renderer.initialize(&mut backend, SURFACE).unwrap();
        backend.take_calls();
        (renderer, backend)
    }

    #[test]
    fn empty_scene_issues_no_backend_calls() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());

        let report = renderer.render(&mut backend).unwrap();

        assert_eq!(report, FrameReport::default());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn sprites_are_drawn_in_insertion_order() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());
        let res = renderer.resources().unwrap();
        let (program, vbo, ibo) = (res.textured_program, res.quad_vertices, res.quad_indices);

        let a = Sprite::at(Vec2::new(-0.5, 0.0), TextureHandle(40));
        let b = Sprite::at(Vec2::new(0.5, 0.0), TextureHandle(41)).with_rotation_degrees(45.0);
        renderer.scene().add_sprites([a, b]);

        let report = renderer.render(&mut backend).unwrap();
        assert_eq!(report.sprites, 2);
        assert_eq!(report.draw_calls, 2);

        let transform = |s: &Sprite| BackendCall::SetUniform {
            program,
            name: "transform".to_string(),
            value: UniformValue::Mat4(to_clip_matrix(&compose_sprite(s)).to_cols_array_2d()),
        };
        let draw = BackendCall::DrawIndexed { index_count: 6, first_index: 0, base_vertex: 0 };

        let clear = RendererConfig::default().clear_color;
        assert_eq!(
            backend.calls(),
            &[
                BackendCall::BeginFrame,
                BackendCall::EnableAlphaBlending,
                BackendCall::Clear(clear),
                BackendCall::UseProgram(program),
                BackendCall::BindVertexBuffer(vbo),
                BackendCall::BindIndexBuffer(ibo),
                transform(&a),
                BackendCall::BindTexture { unit: 0, texture: TextureHandle(40) },
                draw.clone(),
                transform(&b),
                BackendCall::BindTexture { unit: 0, texture: TextureHandle(41) },
                draw,
                BackendCall::EndFrame,
            ]
        );
    }

    #[test]
    fn triangles_share_one_upload_and_offset_by_base_vertex() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());
        let tri_vbo = renderer.resources().unwrap().triangle_vertices;

        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = Rgba::new(0.0, 0.0, 1.0, 0.5);
        let scene = renderer.scene().clone();
        scene
            .draw_triangle(&[Vec2::ZERO, Vec2::X, Vec2::Y], red)
            .unwrap();
        scene
            .draw_triangle(&[Vec2::NEG_X, Vec2::NEG_Y, Vec2::ONE], blue)
            .unwrap();

        let report = renderer.render(&mut backend).unwrap();
        assert_eq!((report.sprites, report.triangles, report.draw_calls), (0, 2, 2));

        let writes: Vec<_> = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::WriteBuffer { .. }))
            .collect();
        assert_eq!(writes.len(), 1);

        let uploaded = backend.buffer_data(tri_vbo).unwrap();
        let stride = std::mem::size_of::<SolidVertex>();
        assert_eq!(uploaded.len(), 6 * stride);
        let v4: SolidVertex = bytemuck::pod_read_unaligned(&uploaded[4 * stride..5 * stride]);
        assert_eq!(v4.pos, [0.0, -1.0]);

        let draws: Vec<_> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::DrawIndexed { index_count, base_vertex, .. } => {
                    Some((*index_count, *base_vertex))
                }
                _ => None,
            })
            .collect();
        assert_eq!(draws, [(3, 0), (3, 3)]);

        let colors: Vec<_> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetUniform { name, value: UniformValue::Vec4(v), .. } if name == "color" => {
                    Some(*v)
                }
                _ => None,
            })
            .collect();
        assert_eq!(colors, [red.to_array(), blue.to_array()]);
    }

    #[test]
    fn triangles_follow_sprites() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());
        let scene = renderer.scene().clone();
        scene
            .draw_triangle(&[Vec2::ZERO, Vec2::X, Vec2::Y], Rgba::WHITE)
            .unwrap();
        scene.add_sprite(Sprite::default());

        renderer.render(&mut backend).unwrap();

        let res = renderer.resources().unwrap();
        let programs: Vec<_> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::UseProgram(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(programs, [res.textured_program, res.solid_program]);
    }

    #[test]
    fn single_quad_mode_draws_exactly_one_quad_with_default_texture() {
        let (mut renderer, mut backend) = ready(RendererConfig {
            mode: RenderMode::SingleQuad,
            ..RendererConfig::default()
        });
        renderer.scene().add_sprites([Sprite::default(); 5]);
        renderer.global_quad().set_translation(0.25, -0.25);

        let report = renderer.render(&mut backend).unwrap();
        assert_eq!((report.sprites, report.draw_calls), (1, 1));
        assert_eq!(backend.draw_count(), 1);
        assert_eq!(backend.clear_count(), 1);

        let default_texture = renderer.resources().unwrap().default_texture;
        assert!(backend.calls().contains(&BackendCall::BindTexture {
            unit: 0,
            texture: default_texture
        }));

        renderer.global_quad().set_texture(TextureHandle(77));
        backend.take_calls();
        renderer.render(&mut backend).unwrap();
        assert!(backend.calls().contains(&BackendCall::BindTexture {
            unit: 0,
            texture: TextureHandle(77)
        }));
    }

    #[test]
    fn render_and_dispose_before_initialize_are_no_ops() {
        let mut renderer = SceneRenderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        renderer.scene().add_sprite(Sprite::default());

        assert_eq!(renderer.render(&mut backend).unwrap(), FrameReport::default());
        renderer.dispose(&mut backend);
        assert_eq!(
            renderer.load_texture(&mut backend, Path::new("x.png")).unwrap(),
            TextureHandle::NONE
        );
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn dispose_is_idempotent_and_stops_rendering() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());
        renderer.scene().add_sprite(Sprite::default());
        renderer
            .load_texture(&mut backend, Path::new("/missing/texture.png"))
            .unwrap();

        renderer.dispose(&mut backend);
        assert!(backend.live_objects().is_empty());
        assert!(!renderer.is_initialized());

        backend.take_calls();
        renderer.dispose(&mut backend);
        renderer.render(&mut backend).unwrap();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn resize_updates_viewport_once_initialized() {
        let (mut renderer, mut backend) = ready(RendererConfig::default());
        let size = SurfaceSize::new(1024, 768);

        renderer.on_resize(&mut backend, size);
        renderer.on_resize(&mut backend, SurfaceSize::new(0, 0));

        assert_eq!(backend.calls(), &[BackendCall::SetViewport(size)]);
    }

    #[test]
    fn initialize_sets_viewport_and_is_not_repeated() {
        let mut renderer = SceneRenderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();

        renderer.initialize(&mut backend, SURFACE).unwrap();
        assert_eq!(backend.calls().last(), Some(&BackendCall::SetViewport(SURFACE)));

        let live = backend.live_objects().len();
        renderer.initialize(&mut backend, SURFACE).unwrap();
        assert_eq!(backend.live_objects().len(), live);
    }

    #[test]
    fn shader_failure_leaves_renderer_uninitialized() {
        let mut renderer = SceneRenderer::new(RendererConfig::default());
        let mut backend = RecordingBackend::new();
        backend.fail_program_creation("link error");

        let err = renderer.initialize(&mut backend, SURFACE).unwrap_err();
        assert!(matches!(err, BackendError::Shader { .. }));
        assert!(!renderer.is_initialized());
        assert!(backend.live_objects().is_empty());
    }
}
