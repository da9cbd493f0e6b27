use winit::event::WindowEvent;

use crate::backend::GpuBackend;
use crate::coords::SurfaceSize;
use crate::time::FrameTime;

/// Control directive returned by handler callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame callbacks driven by [`Runtime`](crate::window::Runtime).
///
/// All callbacks run on the thread that owns the event loop. `dispose` is
/// called exactly once, before the window and its backend are dropped.
pub trait FrameHandler {
    /// Called once after the window and backend exist.
    fn initialize(&mut self, backend: &mut dyn GpuBackend, surface: SurfaceSize) -> anyhow::Result<()>;

    /// Called once per redraw.
    fn render(&mut self, backend: &mut dyn GpuBackend, time: &FrameTime) -> anyhow::Result<AppControl>;

    fn on_resize(&mut self, backend: &mut dyn GpuBackend, size: SurfaceSize);

    fn dispose(&mut self, backend: &mut dyn GpuBackend);

    /// Raw window events, before the runtime's own handling.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }
}
