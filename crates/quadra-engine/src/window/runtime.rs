use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::backend::wgpu_backend::{GpuInit, WgpuBackend};
use crate::coords::SurfaceSize;
use crate::core::{AppControl, FrameHandler};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "quadra".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
        }
    }
}

/// Owns the event loop and drives one [`FrameHandler`] in one window.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes, `Escape` is pressed or the handler asks
    /// to exit. Errors from window/GPU setup, `initialize` or `render` end the
    /// loop and are returned here, after the handler has been disposed.
    pub fn run<H>(config: RuntimeConfig, gpu_init: GpuInit, handler: H) -> Result<()>
    where
        H: FrameHandler + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, gpu_init, handler);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.shutdown();
        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    backend: WgpuBackend<'this>,
}

struct RuntimeState<H: FrameHandler> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    handler: H,

    entry: Option<WindowEntry>,
    disposed: bool,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<H: FrameHandler> RuntimeState<H> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, handler: H) -> Self {
        Self {
            config,
            gpu_init,
            handler,
            entry: None,
            disposed: false,
            exit_requested: false,
            error: None,
        }
    }

    fn create_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            backend_builder: |w| {
                pollster::block_on(WgpuBackend::new(w, gpu_init))
                    .context("GPU initialization failed")
            },
        }
        .try_build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        self.shutdown();
        event_loop.exit();
    }

    /// Disposes the handler's GPU state, then drops the backend and window.
    fn shutdown(&mut self) {
        let Some(mut entry) = self.entry.take() else {
            return;
        };
        if !self.disposed {
            let handler = &mut self.handler;
            entry.with_backend_mut(|backend| handler.dispose(backend));
            self.disposed = true;
        }
        drop(entry);
    }

    fn resize(&mut self, size: SurfaceSize) {
        let handler = &mut self.handler;
        if let Some(entry) = self.entry.as_mut() {
            entry.with_backend_mut(|backend| {
                backend.resize(size);
                handler.on_resize(backend, size);
            });
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn redraw(&mut self) -> Result<AppControl> {
        let handler = &mut self.handler;
        let Some(entry) = self.entry.as_mut() else {
            return Ok(AppControl::Continue);
        };
        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            handler.render(fields.backend, &time)
        })
    }
}

impl<H: FrameHandler> ApplicationHandler for RuntimeState<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        let mut entry = match self.create_entry(event_loop) {
            Ok(entry) => entry,
            Err(err) => return self.fail(event_loop, err),
        };

        let handler = &mut self.handler;
        let init = entry.with_mut(|fields| {
            let size = SurfaceSize::from(fields.window.inner_size());
            handler.initialize(fields.backend, size)
        });
        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);

        if let Err(err) = init {
            self.fail(event_loop, err.context("renderer initialization failed"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.handler.on_window_event(&event) == AppControl::Exit {
            return self.request_exit(event_loop);
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.request_exit(event_loop)
            }

            WindowEvent::Resized(size) => self.resize(size.into()),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size.into());
                }
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => self.request_exit(event_loop),
                Err(err) => self.fail(event_loop, err),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
