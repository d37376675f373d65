//! Search for level circular regions of the seabed, used to seat landmarks.

use bevy::math::Vec2;
use bevy_ecs::resource::Resource;
use bevy_log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::terrain::TerrainField;
use super::utils::ring_point;

/// Number of samples taken around a circle (one every 30°).
pub const RING_SAMPLES: usize = 12;

/// Tuning of the flatness test and of the ring search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatAreaParams {
    /// Largest allowed height difference from the circle's center
    pub tolerance: f32,
    /// Spacing of the interior sample grid
    pub interior_step: f32,
    /// Distance between two consecutive search rings
    pub scan_step: f32,
    /// Minimum distance kept between two landmark centers
    pub min_separation: f32,
}

impl Default for FlatAreaParams {
    fn default() -> Self {
        Self {
            tolerance: 5.0,
            interior_step: 10.0,
            scan_step: 20.0,
            min_separation: 150.0,
        }
    }
}

/// A circle that a search candidate must stay clear of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exclusion {
    pub center: Vec2,
    pub radius: f32,
}

impl Exclusion {
    /// True when a circle of `radius` around `point` reaches into this exclusion.
    pub fn overlaps(&self, point: Vec2, radius: f32) -> bool {
        point.distance(self.center) < self.radius + radius
    }
}

/// Outcome of a ring search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlatSearch {
    Found(Vec2),
    /// Every ring was exhausted; holds the default point.
    Fallback(Vec2),
}

impl FlatSearch {
    pub fn point(&self) -> Vec2 {
        match self {
            FlatSearch::Found(p) | FlatSearch::Fallback(p) => *p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FlatSearch::Fallback(_))
    }
}

pub struct FlatAreaLocator<'a> {
    terrain: &'a TerrainField,
    params: FlatAreaParams,
}

impl<'a> FlatAreaLocator<'a> {
    pub fn new(terrain: &'a TerrainField, params: FlatAreaParams) -> Self {
        Self { terrain, params }
    }

    pub fn params(&self) -> &FlatAreaParams {
        &self.params
    }

    /// Checks that every boundary sample and every interior grid sample of the
    /// circle lies within tolerance of the center height.
    pub fn is_flat(&self, center: Vec2, radius: f32) -> bool {
        let center_height = self.terrain.height(center.x, center.y);
        let within = |p: Vec2| {
            (self.terrain.height(p.x, p.y) - center_height).abs() <= self.params.tolerance
        };

        // Boundary alone misses bowls and peaks hidden inside the circle
        let boundary_flat = (0..RING_SAMPLES).all(|i| within(ring_point(center, radius, i)));
        if !boundary_flat {
            return false;
        }

        let step = self.params.interior_step.max(f32::EPSILON);
        let mut dx = -radius;
        while dx <= radius {
            let mut dz = -radius;
            while dz <= radius {
                if dx * dx + dz * dz <= radius * radius && !within(center + Vec2::new(dx, dz)) {
                    return false;
                }
                dz += step;
            }
            dx += step;
        }
        true
    }

    /// Walks rings outward from the origin and returns the first flat,
    /// non-excluded candidate, or the fixed point `(radius, radius)`.
    pub fn find_flat_center(&self, radius: f32, exclusions: &[Exclusion]) -> FlatSearch {
        let max_distance = self.terrain.size() / 2.0 - radius;
        let step = self.params.scan_step.max(f32::EPSILON);

        let mut distance = 0.0;
        while distance <= max_distance {
            if distance >= radius {
                for i in 0..RING_SAMPLES {
                    let candidate = ring_point(Vec2::ZERO, distance, i);
                    if exclusions.iter().any(|e| e.overlaps(candidate, radius)) {
                        continue;
                    }
                    if self.is_flat(candidate, radius) {
                        return FlatSearch::Found(candidate);
                    }
                }
            }
            distance += step;
        }

        FlatSearch::Fallback(Vec2::splat(radius))
    }
}

/// A static structure the world should seat on flat ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkConfig {
    pub name: String,
    pub asset: String,
    pub radius: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub y_offset: f32,
}

fn default_scale() -> f32 {
    1.0
}

pub fn default_landmarks() -> Vec<LandmarkConfig> {
    vec![
        LandmarkConfig {
            name: "ruin".to_string(),
            asset: "models/building/Ruin.glb".to_string(),
            radius: 20.0,
            scale: 20.0,
            y_offset: 8.0,
        },
        LandmarkConfig {
            name: "ship".to_string(),
            asset: "models/building/Ship.glb".to_string(),
            radius: 30.0,
            scale: 2.0,
            y_offset: 0.0,
        },
    ]
}

/// Flat circular region reserved for a landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSite {
    pub center: Vec2,
    pub radius: f32,
    /// Name of the structure occupying the site
    pub structure: String,
    /// Ground height under the center
    pub ground_height: f32,
}

impl LandmarkSite {
    /// Exclusion a landmark of `other_radius` must respect around this site.
    pub fn exclusion_for(&self, other_radius: f32, min_separation: f32) -> Exclusion {
        Exclusion {
            center: self.center,
            radius: self.radius.max(min_separation - other_radius),
        }
    }

    pub fn conflicts_with(&self, other: &LandmarkSite, min_separation: f32) -> bool {
        self.exclusion_for(other.radius, min_separation)
            .overlaps(other.center, other.radius)
    }

    /// True when `(x, z)` lies inside the reserved circle.
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.center) < self.radius
    }
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSites(pub Vec<LandmarkSite>);

impl LandmarkSites {
    pub fn contains(&self, point: Vec2) -> bool {
        self.0.iter().any(|site| site.contains(point))
    }
}

/// Seats every landmark in order, each one excluding the sites placed before it.
///
/// A landmark whose search falls back to a point that conflicts with an
/// existing site is left out.
pub fn place_landmarks(
    terrain: &TerrainField,
    params: &FlatAreaParams,
    landmarks: &[LandmarkConfig],
) -> LandmarkSites {
    let locator = FlatAreaLocator::new(terrain, params.clone());
    let mut sites: Vec<LandmarkSite> = Vec::with_capacity(landmarks.len());

    for landmark in landmarks {
        let exclusions: Vec<Exclusion> = sites
            .iter()
            .map(|site| site.exclusion_for(landmark.radius, params.min_separation))
            .collect();

        let search = locator.find_flat_center(landmark.radius, &exclusions);
        let center = search.point();
        let site = LandmarkSite {
            center,
            radius: landmark.radius,
            structure: landmark.name.clone(),
            ground_height: terrain.height(center.x, center.y),
        };

        if search.is_fallback() {
            if sites
                .iter()
                .any(|placed| placed.conflicts_with(&site, params.min_separation))
            {
                warn!(
                    "No flat site for landmark {} and fallback {:?} overlaps another landmark, omitting it",
                    landmark.name, center
                );
                continue;
            }
            warn!(
                "No flat site for landmark {}, using fallback {:?}",
                landmark.name, center
            );
        } else {
            debug!(
                "Landmark {} seated at {:?} (radius {})",
                landmark.name, center, landmark.radius
            );
        }

        sites.push(site);
    }

    LandmarkSites(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100x100 world with one vertex per unit, vertices on integer coordinates.
    fn flat_with(spikes: &[(i32, i32, f32)]) -> TerrainField {
        let resolution = 101;
        let mut heights = vec![0.0; resolution * resolution];
        for &(x, z, h) in spikes {
            let col = (x + 50) as usize;
            let row = (z + 50) as usize;
            heights[row * resolution + col] = h;
        }
        TerrainField::from_heights(100.0, resolution, heights).unwrap()
    }

    #[test]
    fn flat_ground_is_flat() {
        let terrain = flat_with(&[]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        assert!(locator.is_flat(Vec2::ZERO, 20.0));
    }

    #[test]
    fn interior_peak_is_rejected() {
        // Sits on the interior grid but between boundary samples
        let terrain = flat_with(&[(10, 0, 50.0)]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());

        let boundary_only = (0..RING_SAMPLES).all(|i| {
            let p = ring_point(Vec2::ZERO, 20.0, i);
            terrain.height(p.x, p.y).abs() <= 5.0
        });
        assert!(boundary_only);
        assert!(!locator.is_flat(Vec2::ZERO, 20.0));
    }

    #[test]
    fn boundary_peak_is_rejected() {
        let terrain = flat_with(&[(20, 0, -50.0)]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        assert!(!locator.is_flat(Vec2::ZERO, 20.0));
    }

    #[test]
    fn deviation_within_tolerance_is_flat() {
        let terrain = flat_with(&[(10, 0, 5.0), (20, 0, -5.0)]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        assert!(locator.is_flat(Vec2::ZERO, 20.0));
    }

    #[test]
    fn search_skips_rings_closer_than_radius() {
        let terrain = flat_with(&[]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        let found = locator.find_flat_center(20.0, &[]);
        assert_eq!(found, FlatSearch::Found(Vec2::new(20.0, 0.0)));
    }

    #[test]
    fn search_respects_exclusions() {
        let terrain = flat_with(&[]);
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        let exclusion = Exclusion {
            center: Vec2::new(20.0, 0.0),
            radius: 5.0,
        };
        let found = locator.find_flat_center(10.0, &[exclusion]).point();
        assert!(found.distance(exclusion.center) >= 15.0);
    }

    #[test]
    fn search_falls_back_when_nothing_is_flat() {
        // A steep ramp is never flat over a 20 unit circle
        let resolution = 101;
        let heights = (0..resolution * resolution)
            .map(|i| (i % resolution) as f32 * 3.0)
            .collect();
        let terrain = TerrainField::from_heights(100.0, resolution, heights).unwrap();
        let locator = FlatAreaLocator::new(&terrain, FlatAreaParams::default());
        assert_eq!(
            locator.find_flat_center(20.0, &[]),
            FlatSearch::Fallback(Vec2::splat(20.0))
        );
    }

    #[test]
    fn two_landmarks_keep_separation() {
        let terrain = TerrainField::flat(500.0, 200, 0.0).unwrap();
        let params = FlatAreaParams::default();
        let sites = place_landmarks(&terrain, &params, &default_landmarks());

        assert_eq!(sites.0.len(), 2);
        let (ruin, ship) = (&sites.0[0], &sites.0[1]);
        assert_eq!((ruin.radius, ship.radius), (20.0, 30.0));
        let min_distance = ruin.radius.max(params.min_separation - ship.radius);
        assert!(ruin.center.distance(ship.center) >= min_distance);
        assert!(!ruin.conflicts_with(ship, params.min_separation));
    }

    #[test]
    fn landmarks_never_overlap_on_generated_terrain() {
        let terrain = TerrainField::build(11, &Default::default()).unwrap();
        for tolerance in [1.0, 5.0, 20.0] {
            let params = FlatAreaParams {
                tolerance,
                ..Default::default()
            };
            let sites = place_landmarks(&terrain, &params, &default_landmarks());
            for (i, a) in sites.0.iter().enumerate() {
                for b in sites.0.iter().skip(i + 1) {
                    assert!(!a.conflicts_with(b, params.min_separation));
                }
            }
        }
    }

    #[test]
    fn conflicting_fallback_is_omitted() {
        // Nothing is flat, so both searches fall back to nearby default points
        let resolution = 101;
        let heights = (0..resolution * resolution)
            .map(|i| (i % resolution) as f32 * 3.0)
            .collect();
        let terrain = TerrainField::from_heights(100.0, resolution, heights).unwrap();
        let sites = place_landmarks(&terrain, &FlatAreaParams::default(), &default_landmarks());
        assert_eq!(sites.0.len(), 1);
        assert_eq!(sites.0[0].structure, "ruin");
    }
}
