//! Frame rendering: snapshot the scene, submit draws, report what happened.
//!
//! [`SceneRenderer`] is the render-thread owner of everything GPU-side. It reads
//! the shared scene through [`FrameSnapshotter`](crate::snapshot::FrameSnapshotter)
//! and drives any [`GpuBackend`](crate::backend::GpuBackend).

mod config;
mod renderer;
mod stats;
mod submit;

pub use config::{RenderMode, RendererConfig};
pub use renderer::SceneRenderer;
pub use stats::{FrameReport, FrameStats, StatsSummary};
pub use submit::submit;
