use bevy::math::{ops::atan2, Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use super::flat_area::RING_SAMPLES;

/// Point `index` of the 12 evenly spaced samples around a circle.
pub fn ring_point(center: Vec2, radius: f32, index: usize) -> Vec2 {
    let angle = (index % RING_SAMPLES) as f32 * TAU / RING_SAMPLES as f32;
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Projects a world position onto the seabed plane.
#[inline]
pub fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(a).distance(horizontal(b))
}

/// Heading about the Y axis for a direction, matching `Quat::from_rotation_y`.
#[inline]
pub fn yaw_from_direction(direction: Vec3) -> f32 {
    atan2(direction.x, direction.z)
}

/// Unit vector in the horizontal plane for a heading angle.
#[inline]
pub fn heading_vector(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

pub fn random_heading(rng: &mut impl Rng) -> Vec3 {
    heading_vector(rng.gen_range(0.0..TAU))
}

/// Uniform point inside a disc.
pub fn random_in_disc(rng: &mut impl Rng, center: Vec2, radius: f32) -> Vec2 {
    let r = radius * rng.gen::<f32>().sqrt();
    let angle = rng.gen_range(0.0..TAU);
    center + Vec2::new(angle.cos(), angle.sin()) * r
}

/// Uniform point inside the square `[-half_extent, half_extent]²`.
pub fn random_in_square(rng: &mut impl Rng, half_extent: f32) -> Vec2 {
    if half_extent <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.gen_range(-half_extent..half_extent),
        rng.gen_range(-half_extent..half_extent),
    )
}

/// Uniform value in `[low, high)`, or `low` when the range is empty.
pub fn uniform_or_low(rng: &mut impl Rng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Teleports a position that left `[-limit, limit]` on x or z to the opposite side.
pub fn wrap_horizontal(position: &mut Vec3, limit: f32) {
    for axis in [&mut position.x, &mut position.z] {
        if *axis > limit {
            *axis = -limit;
        } else if *axis < -limit {
            *axis = limit;
        }
    }
}
