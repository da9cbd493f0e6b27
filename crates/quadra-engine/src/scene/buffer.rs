use glam::Vec2;
use parking_lot::Mutex;

use crate::coords::Rgba;

use super::{SceneError, Sprite, SpriteUpdate, Triangle};

/// Thread-safe store of everything drawn each frame.
///
/// Sprites and triangles live in two independent sequences, each behind its own
/// lock. No method holds both locks at once, and every method is atomic with
/// respect to its own sequence.
///
/// Sprite indices are positional: inserting or removing shifts every later
/// element. Callers caching indices across calls from other threads race by
/// construction; the buffer only guarantees per-call atomicity.
#[derive(Debug, Default)]
pub struct SceneBuffer {
    sprites: Mutex<Vec<Sprite>>,
    triangles: Mutex<Vec<Triangle>>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── sprites ───────────────────────────────────────────────────────────

    pub fn add_sprite(&self, sprite: Sprite) {
        self.sprites.lock().push(sprite);
    }

    pub fn add_sprites<I>(&self, sprites: I)
    where
        I: IntoIterator<Item = Sprite>,
    {
        // Collect outside the lock so a slow iterator never blocks the render thread.
        let incoming: Vec<Sprite> = sprites.into_iter().collect();
        self.sprites.lock().extend(incoming);
    }

    /// Removes the first sprite structurally equal to `sprite`.
    ///
    /// Returns whether one was found.
    pub fn remove_sprite(&self, sprite: &Sprite) -> bool {
        let mut sprites = self.sprites.lock();
        match sprites.iter().position(|s| s == sprite) {
            Some(i) => {
                sprites.remove(i);
                true
            }
            None => false,
        }
    }

    /// Removes the sprite at `index`. Out-of-range indices are ignored.
    pub fn remove_sprite_at(&self, index: usize) {
        let mut sprites = self.sprites.lock();
        if index < sprites.len() {
            sprites.remove(index);
        }
    }

    /// Applies the provided fields of `update` to the sprite at `index`.
    pub fn update_sprite(&self, index: usize, update: SpriteUpdate) -> Result<(), SceneError> {
        let mut sprites = self.sprites.lock();
        let len = sprites.len();
        let sprite = sprites
            .get_mut(index)
            .ok_or(SceneError::IndexOutOfRange { index, len })?;
        update.apply(sprite);
        Ok(())
    }

    /// Replaces the sprite at `index` as a whole.
    pub fn replace_sprite(&self, index: usize, sprite: Sprite) -> Result<(), SceneError> {
        let mut sprites = self.sprites.lock();
        let len = sprites.len();
        let slot = sprites
            .get_mut(index)
            .ok_or(SceneError::IndexOutOfRange { index, len })?;
        *slot = sprite;
        Ok(())
    }

    /// Returns a copy of the sprite at `index`.
    pub fn sprite(&self, index: usize) -> Result<Sprite, SceneError> {
        let sprites = self.sprites.lock();
        sprites
            .get(index)
            .copied()
            .ok_or(SceneError::IndexOutOfRange { index, len: sprites.len() })
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.lock().len()
    }

    /// Copy of the whole sprite sequence.
    pub fn snapshot(&self) -> Vec<Sprite> {
        self.sprites.lock().clone()
    }

    pub fn clear_sprites(&self) {
        self.sprites.lock().clear();
    }

    /// Copies the sprite sequence into `out`, reusing its allocation.
    pub(crate) fn copy_sprites_into(&self, out: &mut Vec<Sprite>) {
        out.clear();
        let sprites = self.sprites.lock();
        out.extend_from_slice(&sprites);
    }

    // ── triangles ─────────────────────────────────────────────────────────

    /// Records one triangle. `points` must hold exactly three points.
    pub fn draw_triangle(&self, points: &[Vec2], color: Rgba) -> Result<(), SceneError> {
        let points: [Vec2; 3] = points.try_into().map_err(|_| SceneError::InvalidPointCount {
            expected: 3,
            actual: points.len(),
        })?;
        self.triangles.lock().push(Triangle::new(points, color));
        Ok(())
    }

    /// Records `count` triangles sharing `color`, three consecutive points each.
    pub fn draw_triangles(&self, points: &[Vec2], color: Rgba, count: usize) -> Result<(), SceneError> {
        let expected = count.checked_mul(3).unwrap_or(usize::MAX);
        if points.len() != expected {
            return Err(SceneError::InvalidPointCount {
                expected,
                actual: points.len(),
            });
        }

        let incoming: Vec<Triangle> = points
            .chunks_exact(3)
            .map(|c| Triangle::new([c[0], c[1], c[2]], color))
            .collect();
        self.triangles.lock().extend(incoming);
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.lock().len()
    }

    /// Copy of the whole triangle sequence.
    pub fn triangle_snapshot(&self) -> Vec<Triangle> {
        self.triangles.lock().clone()
    }

    pub fn clear_triangles(&self) {
        self.triangles.lock().clear();
    }

    pub(crate) fn copy_triangles_into(&self, out: &mut Vec<Triangle>) {
        out.clear();
        let triangles = self.triangles.lock();
        out.extend_from_slice(&triangles);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::scene::TextureHandle;

    fn sprite_at(x: f32, y: f32) -> Sprite {
        Sprite::at(Vec2::new(x, y), TextureHandle(1))
    }

    fn grid() -> Vec<Sprite> {
        let mut out = Vec::new();
        for x in -2..=2 {
            for y in -2..=2 {
                out.push(sprite_at(x as f32 * 0.3, y as f32 * 0.3));
            }
        }
        out
    }

    // ── sprites ───────────────────────────────────────────────────────────

    #[test]
    fn grid_of_25_is_index_addressable_in_insertion_order() {
        let scene = SceneBuffer::new();
        for s in grid() {
            scene.add_sprite(s);
        }

        assert_eq!(scene.sprite_count(), 25);
        // x-major: index 12 is x = 0, y = 0.
        assert_eq!(scene.sprite(12).unwrap(), grid()[12]);
        assert_eq!(scene.sprite(12).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn add_sprites_appends_in_order() {
        let scene = SceneBuffer::new();
        scene.add_sprite(sprite_at(9.0, 9.0));
        scene.add_sprites(grid());
        assert_eq!(scene.sprite_count(), 26);
        assert_eq!(scene.sprite(0).unwrap(), sprite_at(9.0, 9.0));
        assert_eq!(scene.sprite(1).unwrap(), grid()[0]);
    }

    #[test]
    fn remove_sprite_removes_first_structural_match_only() {
        let scene = SceneBuffer::new();
        let a = sprite_at(0.1, 0.1);
        scene.add_sprites([a, sprite_at(0.2, 0.2), a]);

        assert!(scene.remove_sprite(&a));
        assert_eq!(scene.snapshot(), vec![sprite_at(0.2, 0.2), a]);

        assert!(!scene.remove_sprite(&sprite_at(5.0, 5.0)));
        assert_eq!(scene.sprite_count(), 2);
    }

    #[test]
    fn remove_sprite_at_out_of_range_is_a_noop() {
        let scene = SceneBuffer::new();
        scene.add_sprites(grid());

        scene.remove_sprite_at(25);
        scene.remove_sprite_at(usize::MAX);
        assert_eq!(scene.sprite_count(), 25);

        scene.remove_sprite_at(0);
        assert_eq!(scene.sprite_count(), 24);
        assert_eq!(scene.sprite(0).unwrap(), grid()[1]);
    }

    #[test]
    fn update_with_only_scale_leaves_other_fields() {
        let scene = SceneBuffer::new();
        let original = Sprite::new(Vec2::new(0.3, -0.4), Vec2::ONE, 1.25, TextureHandle(7));
        scene.add_sprite(original);

        scene
            .update_sprite(0, SpriteUpdate::default().scale(Vec2::new(2.0, -1.0)))
            .unwrap();

        let s = scene.sprite(0).unwrap();
        assert_eq!(s.scale, Vec2::new(2.0, -1.0));
        assert_eq!(s.position, original.position);
        assert_eq!(s.rotation, original.rotation);
        assert_eq!(s.texture, original.texture);
    }

    #[test]
    fn indexed_access_out_of_range_fails() {
        let scene = SceneBuffer::new();
        scene.add_sprite(sprite_at(0.0, 0.0));

        assert_eq!(
            scene.sprite(1),
            Err(SceneError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            scene.update_sprite(3, SpriteUpdate::default().rotation(1.0)),
            Err(SceneError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert!(scene.replace_sprite(1, sprite_at(1.0, 1.0)).is_err());
        assert_eq!(scene.sprite(0).unwrap(), sprite_at(0.0, 0.0));
    }

    #[test]
    fn clear_sprites_leaves_triangles() {
        let scene = SceneBuffer::new();
        scene.add_sprites(grid());
        scene
            .draw_triangle(&[Vec2::ZERO, Vec2::X, Vec2::Y], Rgba::WHITE)
            .unwrap();

        scene.clear_sprites();
        assert_eq!(scene.sprite_count(), 0);
        assert_eq!(scene.triangle_count(), 1);
    }

    // ── triangles ─────────────────────────────────────────────────────────

    #[test]
    fn draw_triangle_rejects_wrong_point_counts() {
        let scene = SceneBuffer::new();
        let two = [Vec2::ZERO, Vec2::X];
        let four = [Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE];

        assert_eq!(
            scene.draw_triangle(&two, Rgba::WHITE),
            Err(SceneError::InvalidPointCount { expected: 3, actual: 2 })
        );
        assert_eq!(
            scene.draw_triangle(&four, Rgba::WHITE),
            Err(SceneError::InvalidPointCount { expected: 3, actual: 4 })
        );
        assert_eq!(scene.triangle_count(), 0);
    }

    #[test]
    fn draw_triangles_splits_points_into_records_sharing_color() {
        let scene = SceneBuffer::new();
        let color = Rgba::new(0.2, 0.4, 0.6, 0.8);
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(-1.0, -1.0),
        ];

        scene.draw_triangles(&points, color, 2).unwrap();

        let tris = scene.triangle_snapshot();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0].points, [points[0], points[1], points[2]]);
        assert_eq!(tris[1].points, [points[3], points[4], points[5]]);
        assert!(tris.iter().all(|t| t.color == color));
    }

    #[test]
    fn draw_triangles_rejects_mismatched_count() {
        let scene = SceneBuffer::new();
        let points = [Vec2::ZERO; 6];

        assert!(scene.draw_triangles(&points, Rgba::WHITE, 3).is_err());
        assert!(scene.draw_triangles(&points[..5], Rgba::WHITE, 2).is_err());
        assert!(scene.draw_triangles(&points, Rgba::WHITE, usize::MAX).is_err());
        assert_eq!(scene.triangle_count(), 0);

        scene.draw_triangles(&[], Rgba::WHITE, 0).unwrap();
        assert_eq!(scene.triangle_count(), 0);
    }

    // ── concurrency ───────────────────────────────────────────────────────

    #[test]
    fn concurrent_mutations_apply_whole_calls_only() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;
        const REMOVE_ATTEMPTS: usize = 50;

        let scene = SceneBuffer::new();
        let removed = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for t in 0..THREADS {
                let scene = &scene;
                let removed = &removed;
                s.spawn(move || {
                    let tag = t as u32 + 1;
                    let mine =
                        |i: usize| Sprite::at(Vec2::new(tag as f32, i as f32), TextureHandle(tag));

                    for i in 0..PER_THREAD {
                        scene.add_sprite(mine(i));
                    }
                    for i in 0..PER_THREAD {
                        // Position and texture move together; a torn update would
                        // break the `position.x == texture` relation checked below.
                        let other = (tag % THREADS as u32) + 1;
                        let _ = scene.update_sprite(
                            i % 4,
                            SpriteUpdate::default()
                                .position(Vec2::new(other as f32, -(i as f32) - 1.0))
                                .texture(TextureHandle(other)),
                        );
                        assert!(scene
                            .update_sprite(usize::MAX, SpriteUpdate::default().rotation(1.0))
                            .is_err());
                        scene.remove_sprite_at(usize::MAX);
                    }
                    // Some of these were rewritten by other threads; only hits count.
                    for i in 0..REMOVE_ATTEMPTS {
                        if scene.remove_sprite(&mine(i)) {
                            removed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let sprites = scene.snapshot();
        assert_eq!(
            sprites.len(),
            THREADS * PER_THREAD - removed.load(Ordering::Relaxed)
        );
        assert_eq!(scene.sprite_count(), sprites.len());
        assert!(sprites.iter().all(|s| s.position.x == s.texture.0 as f32));
    }
}
