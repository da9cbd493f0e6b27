//! Per-frame scene capture.
//!
//! Each sequence is locked only for the duration of a copy into buffers owned
//! by the snapshotter, so producers never wait on GPU work. The buffers are
//! reused across frames; no allocation happens once they have grown to the
//! scene's working size.

use crate::scene::{SceneBuffer, Sprite, Triangle};

/// Render-thread view of one frame's scene contents.
///
/// The sprite and triangle halves are taken under separate locks and are not
/// guaranteed to describe the same instant relative to each other.
#[derive(Debug, Clone, Copy)]
pub struct SceneSnapshot<'a> {
    pub sprites: &'a [Sprite],
    pub triangles: &'a [Triangle],
}

impl SceneSnapshot<'_> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty() && self.triangles.is_empty()
    }
}

/// Owns the reusable copy buffers for [`SceneSnapshot`].
#[derive(Debug, Default)]
pub struct FrameSnapshotter {
    sprites: Vec<Sprite>,
    triangles: Vec<Triangle>,
}

impl FrameSnapshotter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies both sequences of `scene`, one lock at a time.
    pub fn capture(&mut self, scene: &SceneBuffer) -> SceneSnapshot<'_> {
        scene.copy_sprites_into(&mut self.sprites);
        scene.copy_triangles_into(&mut self.triangles);
        self.view()
    }

    /// Like [`capture`](Self::capture), but the sprite half is the single `quad`
    /// instead of the scene's sprite sequence.
    pub fn capture_single(&mut self, scene: &SceneBuffer, quad: Sprite) -> SceneSnapshot<'_> {
        self.sprites.clear();
        self.sprites.push(quad);
        scene.copy_triangles_into(&mut self.triangles);
        self.view()
    }

    fn view(&self) -> SceneSnapshot<'_> {
        SceneSnapshot {
            sprites: &self.sprites,
            triangles: &self.triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::coords::Rgba;
    use crate::scene::TextureHandle;

    #[test]
    fn empty_scene_yields_empty_snapshot() {
        let scene = SceneBuffer::new();
        let mut snap = FrameSnapshotter::new();
        assert!(snap.capture(&scene).is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let scene = SceneBuffer::new();
        scene.add_sprite(Sprite::at(Vec2::ZERO, TextureHandle(1)));
        scene
            .draw_triangle(&[Vec2::ZERO, Vec2::X, Vec2::Y], Rgba::WHITE)
            .unwrap();

        let mut snap = FrameSnapshotter::new();
        let (sprites, triangles) = {
            let s = snap.capture(&scene);
            (s.sprites.to_vec(), s.triangles.to_vec())
        };

        scene.clear_sprites();
        scene.clear_triangles();
        scene.add_sprite(Sprite::at(Vec2::ONE, TextureHandle(2)));

        assert_eq!(sprites, vec![Sprite::at(Vec2::ZERO, TextureHandle(1))]);
        assert_eq!(triangles.len(), 1);
    }

    #[test]
    fn capture_reuses_buffers_across_frames() {
        let scene = SceneBuffer::new();
        for i in 0..64 {
            scene.add_sprite(Sprite::at(Vec2::splat(i as f32), TextureHandle(1)));
        }

        let mut snap = FrameSnapshotter::new();
        let _ = snap.capture(&scene);
        let cap = snap.sprites.capacity();
        let ptr = snap.sprites.as_ptr();

        scene.remove_sprite_at(0);
        assert_eq!(snap.capture(&scene).sprites.len(), 63);
        assert_eq!(snap.sprites.capacity(), cap);
        assert_eq!(snap.sprites.as_ptr(), ptr);
    }

    #[test]
    fn capture_single_ignores_sprite_sequence() {
        let scene = SceneBuffer::new();
        scene.add_sprite(Sprite::at(Vec2::ONE, TextureHandle(4)));
        let quad = Sprite::at(Vec2::new(0.1, 0.1), TextureHandle(9));

        let mut snap = FrameSnapshotter::new();
        let s = snap.capture_single(&scene, quad);
        assert_eq!(s.sprites, &[quad]);
        assert!(s.triangles.is_empty());
    }
}
