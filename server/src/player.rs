use bevy::math::{ops::atan2, Quat, Vec3};
use bevy::time::{Fixed, Time};
use bevy_ecs::resource::Resource;
use bevy_ecs::system::{Res, ResMut};
use shared::constants::{PLAYER_SPAWN, PLAYER_SPEED};
use shared::creatures::EnvironmentContext;

/// Position and orientation of the player vehicle. Forward is -Z.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self {
            position: PLAYER_SPAWN,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Circle the headless player follows around the origin, at spawn height.
#[derive(Resource, Debug, Clone, Copy)]
pub struct PatrolRoute {
    pub radius: f32,
    pub speed: f32,
}

impl PatrolRoute {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            speed: PLAYER_SPEED,
        }
    }

    /// Pose after `elapsed` seconds. A zero radius keeps the spawn pose.
    pub fn pose_at(&self, elapsed: f32) -> PlayerPose {
        if self.radius <= 0.0 {
            return PlayerPose::default();
        }

        let angle = elapsed * self.speed / self.radius;
        let position = Vec3::new(
            self.radius * angle.cos(),
            PLAYER_SPAWN.y,
            self.radius * angle.sin(),
        );
        let tangent = Vec3::new(-angle.sin(), 0.0, angle.cos());
        // local +Z points backwards
        let back = -tangent;
        PlayerPose {
            position,
            orientation: Quat::from_rotation_y(atan2(back.x, back.z)),
        }
    }
}

pub fn advance_player_system(
    route: Res<PatrolRoute>,
    mut pose: ResMut<PlayerPose>,
    time: Res<Time<Fixed>>,
) {
    *pose = route.pose_at(time.elapsed_secs());
}

/// Writes the player snapshot every creature reads this frame.
pub fn refresh_environment_system(pose: Res<PlayerPose>, mut env: ResMut<EnvironmentContext>) {
    env.refresh_from_pose(pose.position, pose.orientation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radius_stays_at_spawn() {
        let route = PatrolRoute::new(0.0);
        assert_eq!(route.pose_at(12.0), PlayerPose::default());
    }

    #[test]
    fn patrol_follows_the_circle() {
        let route = PatrolRoute::new(40.0);
        for elapsed in [0.0, 1.0, 7.5, 30.0] {
            let pose = route.pose_at(elapsed);
            let radius = Vec3::new(pose.position.x, 0.0, pose.position.z).length();
            assert!((radius - 40.0).abs() < 1e-3);
            assert_eq!(pose.position.y, PLAYER_SPAWN.y);
        }
    }

    #[test]
    fn patrol_faces_along_the_path() {
        let route = PatrolRoute::new(40.0);
        let now = route.pose_at(2.0);
        let later = route.pose_at(2.01);
        let travel = (later.position - now.position).normalize();
        let facing = now.orientation * Vec3::NEG_Z;
        assert!(facing.dot(travel) > 0.99);

        let mut env = EnvironmentContext::default();
        env.refresh_from_pose(now.position, now.orientation);
        assert!(env.is_illuminated(now.position + travel * 10.0));
    }
}
