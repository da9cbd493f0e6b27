//! Scene state shared between producer threads and the render thread.
//!
//! Responsibilities:
//! - own the sprite and triangle sequences behind independent locks
//! - validate mutations so failed calls leave the scene unchanged
//! - expose the single-quad transform used by [`RenderMode::SingleQuad`](crate::render::RenderMode)

mod buffer;
mod error;
mod global;
mod sprite;
mod triangle;

pub use buffer::SceneBuffer;
pub use error::SceneError;
pub use global::GlobalQuad;
pub use sprite::{Sprite, SpriteUpdate, TextureHandle};
pub use triangle::Triangle;
