//! Body fragments scattered when a droid explodes.

use droidfall_common::math::random_unit_vector;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One body part flying away from the droid.
///
/// Positions are in the droid's local frame, as reported by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionFragment {
    /// Where the part was when the droid was hit.
    pub start_position: Vec3,
    /// Where the part comes to rest.
    pub end_position: Vec3,
}

impl ExplosionFragment {
    /// Creates a fragment travelling `distance` along `direction`.
    #[must_use]
    pub fn new(start_position: Vec3, direction: Vec3, distance: f32) -> Self {
        Self {
            start_position,
            end_position: start_position + direction * distance,
        }
    }

    /// Creates a fragment travelling `distance` in a random direction.
    #[must_use]
    pub fn scatter(start_position: Vec3, distance: f32, rng: &mut fastrand::Rng) -> Self {
        Self::new(start_position, random_unit_vector(rng), distance)
    }

    /// Position at eased progress `t`.
    #[must_use]
    pub fn position_at(&self, t: f32) -> Vec3 {
        self.start_position.lerp(self.end_position, t)
    }
}
