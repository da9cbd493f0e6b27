//! Sprite transform composition.
//!
//! Every sprite is the canonical unit quad (corners at ±0.5) pushed through
//! `T(position) · R(rotation) · S(scale)`: scale about the local origin, then
//! rotate about the local origin, then translate. Rotation therefore always
//! pivots around the sprite's own center.

use glam::{Affine2, Mat4, Vec2, Vec4};

use crate::scene::Sprite;

/// `degrees * π / 180`.
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Builds the local-to-NDC transform for a quad.
#[inline]
pub fn compose(position: Vec2, scale: Vec2, rotation: f32) -> Affine2 {
    Affine2::from_scale_angle_translation(scale, rotation, position)
}

#[inline]
pub fn compose_sprite(sprite: &Sprite) -> Affine2 {
    compose(sprite.position, sprite.scale, sprite.rotation)
}

/// Homogeneous 4×4 form of a 2D affine transform (z passes through).
pub fn to_clip_matrix(t: &Affine2) -> Mat4 {
    let m = t.matrix2;
    Mat4::from_cols(
        Vec4::new(m.x_axis.x, m.x_axis.y, 0.0, 0.0),
        Vec4::new(m.y_axis.x, m.y_axis.y, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(t.translation.x, t.translation.y, 0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn near(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPS
    }

    #[test]
    fn deg_to_rad_matches_formula() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < EPS);
        assert!((deg_to_rad(90.0) - std::f32::consts::FRAC_PI_2).abs() < EPS);
        assert_eq!(deg_to_rad(0.0), 0.0);
    }

    #[test]
    fn scale_then_rotate_then_translate() {
        let t = compose(Vec2::new(0.5, 0.0), Vec2::new(2.0, 1.0), deg_to_rad(90.0));

        // (0.5, 0) -S-> (1, 0) -R-> (0, 1) -T-> (0.5, 1)
        assert!(near(t.transform_point2(Vec2::new(0.5, 0.0)), Vec2::new(0.5, 1.0)));
        // (0.5, 0.5) -S-> (1, 0.5) -R-> (-0.5, 1) -T-> (0, 1)
        assert!(near(t.transform_point2(Vec2::new(0.5, 0.5)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn other_orders_disagree_when_scale_is_non_uniform() {
        let scale = Vec2::new(2.0, 1.0);
        let rot = deg_to_rad(90.0);
        let pos = Vec2::new(0.5, 0.0);
        let canonical = compose(pos, scale, rot);

        // T · S · R
        let tsr = Affine2::from_translation(pos)
            * Affine2::from_scale(scale)
            * Affine2::from_angle(rot);
        let v = Vec2::new(0.5, 0.5);
        assert!(!near(canonical.transform_point2(v), tsr.transform_point2(v)));
    }

    #[test]
    fn rotation_pivots_on_sprite_center() {
        let pos = Vec2::new(-0.7, 0.3);
        let t = compose(pos, Vec2::new(1.5, 0.25), 1.1);
        assert!(near(t.transform_point2(Vec2::ZERO), pos));
    }

    #[test]
    fn negative_scale_mirrors() {
        let t = compose(Vec2::ZERO, Vec2::new(-1.0, 1.0), 0.0);
        assert!(near(t.transform_point2(Vec2::new(0.5, 0.5)), Vec2::new(-0.5, 0.5)));
    }

    #[test]
    fn clip_matrix_matches_affine() {
        let t = compose(Vec2::new(0.2, -0.4), Vec2::new(0.5, 3.0), 0.7);
        let m = to_clip_matrix(&t);

        for p in [
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ] {
            let h = m * Vec4::new(p.x, p.y, 0.0, 1.0);
            assert!(near(Vec2::new(h.x, h.y), t.transform_point2(p)));
            assert_eq!(h.w, 1.0);
        }
    }

    #[test]
    fn compose_sprite_uses_all_transform_fields() {
        let s = Sprite::new(
            Vec2::new(0.1, 0.2),
            Vec2::new(2.0, 2.0),
            0.0,
            crate::scene::TextureHandle(3),
        );
        let p = compose_sprite(&s).transform_point2(Vec2::new(0.5, 0.5));
        assert!(near(p, Vec2::new(1.1, 1.2)));
    }
}
