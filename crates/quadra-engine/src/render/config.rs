use std::path::PathBuf;

use crate::coords::Rgba;

/// What the renderer draws from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RenderMode {
    /// Every sprite in the shared [`SceneBuffer`](crate::scene::SceneBuffer).
    #[default]
    MultiSprite,
    /// Exactly one quad driven by [`GlobalQuad`](crate::scene::GlobalQuad);
    /// the sprite buffer is ignored.
    SingleQuad,
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub mode: RenderMode,
    pub clear_color: Rgba,
    /// Image used for the default texture. `None` or an unloadable file gives
    /// the procedural fallback.
    pub default_texture: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::MultiSprite,
            clear_color: Rgba::new(0.08, 0.08, 0.10, 1.0),
            default_texture: None,
        }
    }
}
