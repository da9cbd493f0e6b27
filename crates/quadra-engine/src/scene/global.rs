use glam::Vec2;
use parking_lot::Mutex;

use super::{Sprite, TextureHandle};

/// Transform of the single quad drawn in single-quad mode.
///
/// Setters may be called from any thread; the render thread reads the whole
/// state once per frame through [`GlobalQuad::sprite`].
#[derive(Debug)]
pub struct GlobalQuad {
    state: Mutex<Sprite>,
}

impl GlobalQuad {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Sprite::default()),
        }
    }

    pub fn set_translation(&self, x: f32, y: f32) {
        self.state.lock().position = Vec2::new(x, y);
    }

    pub fn set_scale(&self, x: f32, y: f32) {
        self.state.lock().scale = Vec2::new(x, y);
    }

    /// Sets the rotation in degrees (counter-clockwise). Stored as radians.
    pub fn set_rotation_degrees(&self, degrees: f32) {
        self.state.lock().rotation = crate::transform::deg_to_rad(degrees);
    }

    /// Overrides the texture. [`TextureHandle::NONE`] selects the default texture.
    pub fn set_texture(&self, texture: TextureHandle) {
        self.state.lock().texture = texture;
    }

    pub fn reset(&self) {
        *self.state.lock() = Sprite::default();
    }

    /// Current state as a sprite.
    pub fn sprite(&self) -> Sprite {
        *self.state.lock()
    }
}

impl Default for GlobalQuad {
    fn default() -> Self {
        Self::new()
    }
}
