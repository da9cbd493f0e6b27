//! Quadra engine crate.
//!
//! A concurrent 2D scene of textured sprites and solid triangles, rendered once
//! per frame through an immediate-mode GPU backend. Producer threads mutate the
//! shared [`scene::SceneBuffer`]; the render thread owns a
//! [`render::SceneRenderer`], which snapshots the scene and submits draws.

pub mod backend;
pub mod coords;
pub mod core;
pub mod logging;
pub mod render;
pub mod resources;
pub mod scene;
pub mod snapshot;
pub mod time;
pub mod transform;
pub mod window;

pub use backend::wgpu_backend::{GpuInit, WgpuBackend};
pub use coords::{Rgba, SurfaceSize, Vec2};
pub use render::{RenderMode, RendererConfig, SceneRenderer};
pub use scene::{GlobalQuad, SceneBuffer, Sprite, SpriteUpdate, TextureHandle, Triangle};
