//! Background threads that animate the shared scene.

use std::f32::consts::TAU;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Vec2;
use quadra_engine::{GlobalQuad, Rgba, SceneBuffer, Sprite, SpriteUpdate, TextureHandle};

pub const GRID: usize = 5;
const CELL: f32 = 0.36;
const SPRITE_SCALE: f32 = 0.28;

const GRID_TICK: Duration = Duration::from_millis(8);
const FAN_TICK: Duration = Duration::from_millis(16);
const FAN_SEGMENTS: usize = 12;

/// Center of grid cell `i`, row-major from the top-left.
pub fn grid_position(i: usize) -> Vec2 {
    let (row, col) = (i / GRID, i % GRID);
    let half = (GRID - 1) as f32 / 2.0;
    Vec2::new((col as f32 - half) * CELL, (half - row as f32) * CELL)
}

/// Lays out the grid, then spins and pulses each cell until `stop` is set.
pub fn spawn_grid(
    scene: Arc<SceneBuffer>,
    texture: TextureHandle,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("grid-producer".into())
        .spawn(move || {
            let base = Sprite::at(Vec2::ZERO, texture).with_scale(Vec2::splat(SPRITE_SCALE));
            scene.add_sprites((0..GRID * GRID).map(|i| Sprite { position: grid_position(i), ..base }));

            let start = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f32();
                for i in 0..GRID * GRID {
                    let phase = i as f32 * 0.4;
                    let pulse = 1.0 + 0.15 * (t * 2.0 + phase).sin();
                    let update = SpriteUpdate::default()
                        .rotation(t * (0.5 + 0.1 * i as f32))
                        .scale(Vec2::splat(SPRITE_SCALE * pulse));
                    if let Err(err) = scene.update_sprite(i, update) {
                        log::debug!("grid update skipped: {err}");
                    }
                }
                thread::sleep(GRID_TICK);
            }
        })
}

/// Rebuilds a rotating triangle fan every few milliseconds.
pub fn spawn_fan(scene: Arc<SceneBuffer>, stop: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("fan-producer".into())
        .spawn(move || {
            let center = Vec2::new(0.0, -0.05);
            let radius = 0.95;
            let mut points = Vec::with_capacity(FAN_SEGMENTS * 3);
            let start = Instant::now();

            while !stop.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f32();
                points.clear();
                for k in 0..FAN_SEGMENTS {
                    // Every other wedge, so the sprites stay visible between them.
                    if k % 2 == 1 {
                        continue;
                    }
                    let a0 = t * 0.3 + k as f32 * TAU / FAN_SEGMENTS as f32;
                    let a1 = a0 + TAU / FAN_SEGMENTS as f32;
                    points.extend([
                        center,
                        center + radius * Vec2::from_angle(a0),
                        center + radius * Vec2::from_angle(a1),
                    ]);
                }

                let color = Rgba::new(0.2, 0.5 + 0.3 * (t * 0.7).sin(), 0.9, 0.18);
                scene.clear_triangles();
                if let Err(err) = scene.draw_triangles(&points, color, points.len() / 3) {
                    log::warn!("fan rebuild failed: {err}");
                }
                thread::sleep(FAN_TICK);
            }
        })
}

/// Drives the single-quad transform (used with `--single`).
pub fn spawn_quad(quad: Arc<GlobalQuad>, stop: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("quad-producer".into())
        .spawn(move || {
            let start = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f32();
                quad.set_translation(0.4 * (t * 0.8).cos(), 0.4 * (t * 0.8).sin());
                quad.set_scale(0.8 + 0.2 * t.sin(), 0.8 + 0.2 * t.sin());
                quad.set_rotation_degrees(t * 45.0);
                thread::sleep(GRID_TICK);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_centered_and_row_major() {
        assert_eq!(grid_position(12), Vec2::ZERO);
        assert_eq!(grid_position(0), Vec2::new(-2.0 * CELL, 2.0 * CELL));
        assert_eq!(grid_position(24), Vec2::new(2.0 * CELL, -2.0 * CELL));
    }

    #[test]
    fn grid_producer_lays_out_all_cells_and_stops() {
        let scene = Arc::new(SceneBuffer::new());
        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_grid(scene.clone(), TextureHandle(3), stop.clone()).unwrap();

        while scene.sprite_count() < GRID * GRID {
            thread::yield_now();
        }
        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();

        assert_eq!(scene.sprite_count(), 25);
        let center = scene.sprite(12).unwrap();
        assert_eq!(center.position, grid_position(12));
        assert_eq!(center.texture, TextureHandle(3));
    }
}
