use bevy::math::{Quat, Vec3};
use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

use crate::constants::PLAYER_SPAWN;

/// Distances and the torch cone every behavior reads each frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentRanges {
    /// Half angle of the torch cone, in degrees
    pub light_half_angle_degrees: f32,
    pub light_range: f32,
    pub predator_detect_range: f32,
    pub player_avoid_range: f32,
}

impl Default for EnvironmentRanges {
    fn default() -> Self {
        Self {
            light_half_angle_degrees: 15.0,
            light_range: 80.0,
            predator_detect_range: 30.0,
            player_avoid_range: 15.0,
        }
    }
}

/// Snapshot of the player written once per frame by the frame driver and
/// read by every creature during that frame.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EnvironmentContext {
    pub player_position: Vec3,
    /// Unit vector the player (and its torch) faces
    pub player_facing: Vec3,
    pub light_cone_cos: f32,
    pub light_range: f32,
    pub predator_detect_range: f32,
    pub player_avoid_range: f32,
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self::new(&EnvironmentRanges::default())
    }
}

impl EnvironmentContext {
    pub fn new(ranges: &EnvironmentRanges) -> Self {
        Self {
            player_position: PLAYER_SPAWN,
            player_facing: Vec3::NEG_Z,
            light_cone_cos: ranges.light_half_angle_degrees.to_radians().cos(),
            light_range: ranges.light_range,
            predator_detect_range: ranges.predator_detect_range,
            player_avoid_range: ranges.player_avoid_range,
        }
    }

    /// Updates the player snapshot. Called once per frame, before behaviors run.
    pub fn refresh(&mut self, player_position: Vec3, player_facing: Vec3) {
        self.player_position = player_position;
        self.player_facing = player_facing.normalize_or(Vec3::NEG_Z);
    }

    /// Same as [`refresh`](Self::refresh), deriving the facing from the vehicle
    /// orientation (forward is -Z).
    pub fn refresh_from_pose(&mut self, player_position: Vec3, orientation: Quat) {
        self.refresh(player_position, orientation * Vec3::NEG_Z);
    }

    pub fn player_within(&self, point: Vec3, range: f32) -> bool {
        point.distance_squared(self.player_position) < range * range
    }

    /// True when `point` is inside the torch cone.
    pub fn is_illuminated(&self, point: Vec3) -> bool {
        let offset = point - self.player_position;
        let distance = offset.length();
        if distance > self.light_range {
            return false;
        }
        if distance <= f32::EPSILON {
            return true;
        }
        offset.dot(self.player_facing) / distance >= self.light_cone_cos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torch_cone() {
        let mut env = EnvironmentContext::default();
        env.refresh(Vec3::ZERO, Vec3::NEG_Z);

        assert!(env.is_illuminated(Vec3::new(0.0, 0.0, -50.0)));
        // 10 units off-axis at 50 units is about 11°, inside a 15° cone
        assert!(env.is_illuminated(Vec3::new(10.0, 0.0, -50.0)));
        // 20 units off-axis is about 22°
        assert!(!env.is_illuminated(Vec3::new(20.0, 0.0, -50.0)));
        assert!(!env.is_illuminated(Vec3::new(0.0, 0.0, 50.0)));
        assert!(!env.is_illuminated(Vec3::new(0.0, 0.0, -81.0)));
    }

    #[test]
    fn facing_follows_orientation() {
        let mut env = EnvironmentContext::default();
        env.refresh_from_pose(
            Vec3::ZERO,
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        assert!(env.player_facing.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn zero_facing_keeps_a_direction() {
        let mut env = EnvironmentContext::default();
        env.refresh(Vec3::ONE, Vec3::ZERO);
        assert_eq!(env.player_facing, Vec3::NEG_Z);
    }
}
