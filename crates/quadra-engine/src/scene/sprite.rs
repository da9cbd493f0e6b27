use glam::Vec2;

/// Handle to a GPU texture owned by the resource lifecycle.
///
/// `0` means "no texture assigned". Drawing a sprite with [`TextureHandle::NONE`]
/// is left to the backend; the scene does not validate handles.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const NONE: TextureHandle = TextureHandle(0);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A positioned, scaled, rotated, textured quad.
///
/// Equality is structural over all four fields; two sprites that share every
/// field are indistinguishable to [`SceneBuffer::remove_sprite`](super::SceneBuffer::remove_sprite).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    /// Center in NDC. Not clamped.
    pub position: Vec2,
    /// `1.0` is native size; negative values mirror.
    pub scale: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
    pub texture: TextureHandle,
}

impl Sprite {
    #[inline]
    pub const fn new(position: Vec2, scale: Vec2, rotation: f32, texture: TextureHandle) -> Self {
        Self { position, scale, rotation, texture }
    }

    /// Unit-scale, unrotated sprite at `position`.
    #[inline]
    pub fn at(position: Vec2, texture: TextureHandle) -> Self {
        Self::new(position, Vec2::ONE, 0.0, texture)
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    #[inline]
    pub fn with_rotation_degrees(self, degrees: f32) -> Self {
        self.with_rotation(crate::transform::deg_to_rad(degrees))
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::at(Vec2::ZERO, TextureHandle::NONE)
    }
}

/// Partial update for [`SceneBuffer::update_sprite`](super::SceneBuffer::update_sprite).
///
/// `None` fields are left untouched.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SpriteUpdate {
    pub position: Option<Vec2>,
    pub scale: Option<Vec2>,
    pub rotation: Option<f32>,
    pub texture: Option<TextureHandle>,
}

impl SpriteUpdate {
    #[inline]
    pub fn position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    #[inline]
    pub fn scale(mut self, scale: Vec2) -> Self {
        self.scale = Some(scale);
        self
    }

    #[inline]
    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = Some(radians);
        self
    }

    #[inline]
    pub fn texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub(crate) fn apply(self, sprite: &mut Sprite) {
        if let Some(p) = self.position {
            sprite.position = p;
        }
        if let Some(s) = self.scale {
            sprite.scale = s;
        }
        if let Some(r) = self.rotation {
            sprite.rotation = r;
        }
        if let Some(t) = self.texture {
            sprite.texture = t;
        }
    }
}
