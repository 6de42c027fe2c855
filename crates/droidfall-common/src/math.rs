//! Vector helpers shared by the spawner and the agent controller.

use std::f32::consts::TAU;

pub use glam::{Vec2, Vec3};

/// Draws a point uniformly distributed over the area of a disk.
///
/// The radius is `radius * sqrt(u)`, so density grows linearly with the
/// distance from the center instead of bunching up near it.
#[must_use]
pub fn sample_disk(rng: &mut fastrand::Rng, radius: f32) -> Vec2 {
    let angle = rng.f32() * TAU;
    let dist = radius * rng.f32().sqrt();
    Vec2::new(dist * angle.cos(), dist * angle.sin())
}

/// Draws a direction uniformly distributed over the unit sphere.
#[must_use]
pub fn random_unit_vector(rng: &mut fastrand::Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            2.0 * rng.f32() - 1.0,
            2.0 * rng.f32() - 1.0,
            2.0 * rng.f32() - 1.0,
        );
        let len_sq = candidate.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return candidate / len_sq.sqrt();
        }
    }
}

/// Unit vector pointing from `from` to `to`.
///
/// Coincident points yield `fallback`.
#[must_use]
pub fn direction_to(from: Vec3, to: Vec3, fallback: Vec3) -> Vec3 {
    (to - from).try_normalize().unwrap_or(fallback)
}
