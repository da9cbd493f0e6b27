//! Coordinate and color types shared by the scene and the renderers.
//!
//! Scene space is NDC:
//! - origin at the viewport center
//! - +X right, +Y up, both nominally in `-1..=1`
//!
//! Positions and scales use `glam::Vec2`; this module only adds what glam lacks.

mod color;
mod viewport;

pub use color::Rgba;
pub use glam::Vec2;
pub use viewport::SurfaceSize;
