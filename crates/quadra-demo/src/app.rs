use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context;
use quadra_engine::backend::GpuBackend;
use quadra_engine::core::{AppControl, FrameHandler};
use quadra_engine::time::FrameTime;
use quadra_engine::{RenderMode, SceneRenderer, SurfaceSize};

use crate::producers;

/// Renderer plus the producer threads feeding it.
///
/// Producers start once GPU resources exist (they need the default texture
/// handle) and are stopped and joined before the renderer releases the GPU.
pub struct DemoApp {
    renderer: SceneRenderer,
    stop: Arc<AtomicBool>,
    producers: Vec<JoinHandle<()>>,
}

impl DemoApp {
    pub fn new(renderer: SceneRenderer) -> Self {
        Self {
            renderer,
            stop: Arc::new(AtomicBool::new(false)),
            producers: Vec::new(),
        }
    }

    fn start_producers(&mut self) -> std::io::Result<()> {
        let texture = self
            .renderer
            .resources()
            .map(|r| r.default_texture)
            .unwrap_or_default();
        let scene = self.renderer.scene().clone();

        match self.renderer.config().mode {
            RenderMode::MultiSprite => {
                self.producers
                    .push(producers::spawn_grid(scene.clone(), texture, self.stop.clone())?);
            }
            RenderMode::SingleQuad => {
                let quad = self.renderer.global_quad().clone();
                self.producers.push(producers::spawn_quad(quad, self.stop.clone())?);
            }
        }
        self.producers.push(producers::spawn_fan(scene, self.stop.clone())?);

        log::info!("{} producer threads running", self.producers.len());
        Ok(())
    }

    fn stop_producers(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.producers.drain(..) {
            let name = handle.thread().name().unwrap_or("producer").to_string();
            if handle.join().is_err() {
                log::warn!("{name} panicked");
            }
        }
    }
}

impl FrameHandler for DemoApp {
    fn initialize(&mut self, backend: &mut dyn GpuBackend, surface: SurfaceSize) -> anyhow::Result<()> {
        FrameHandler::initialize(&mut self.renderer, backend, surface)?;
        self.start_producers().context("failed to spawn producer threads")
    }

    fn render(&mut self, backend: &mut dyn GpuBackend, time: &FrameTime) -> anyhow::Result<AppControl> {
        FrameHandler::render(&mut self.renderer, backend, time)
    }

    fn on_resize(&mut self, backend: &mut dyn GpuBackend, size: SurfaceSize) {
        self.renderer.on_resize(backend, size);
    }

    fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        self.stop_producers();
        self.renderer.dispose(backend);
    }
}
