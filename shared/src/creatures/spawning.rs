//! One-time placement of every species instance.
//!
//! Clustered species are split into cluster quotas around randomly placed
//! centers, everything else is placed one instance at a time. All rejection
//! loops share the same bounded retry budget from [`PlacementConfig`].

use bevy::math::{Vec2, Vec3};
use bevy_log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::constants::{
    DEFAULT_RETRY_BUDGET, PLACEMENT_HALF_EXTENT, SCATTER_HALF_EXTENT, SEABED_CLEARANCE,
    WORLD_CEILING,
};
use crate::error::WorldBuildError;
use crate::world::{
    random_heading, random_in_disc, random_in_square, uniform_or_low, yaw_from_direction,
    LandmarkSites, TerrainField,
};

use super::behavior::{FREE_SWIM_RETARGET_RANGE, PREDATOR_ACTIVE_RANGE};
use super::entity::{
    BehaviorState, ClusterMembership, ClusterSite, Creature, PredatorMode, Population, SpeciesId,
};
use super::species::{BehaviorTag, ClusterParams, SpeciesConfig};

/// Range of the vertical speed a bobbing creature starts with.
const BOB_SPEED_RANGE: std::ops::Range<f32> = 0.2..0.5;
/// Fraction of the max speed a schooling creature starts with, per axis.
const SCHOOL_START_SPEED_FACTOR: f32 = 0.25;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Half extent of the square creatures are placed in
    pub placement_half_extent: f32,
    /// Half extent of the wider square scatter species are placed in
    pub scatter_half_extent: f32,
    /// Highest spawn height for swimmers
    pub ceiling: f32,
    /// Draws allowed per rejection loop before giving up
    pub max_attempts: usize,
    /// Keep the last draw when the budget runs out instead of dropping it
    pub accept_on_exhaustion: bool,
    /// Fail the build when a species has no behavior tag
    pub require_behavior_tag: bool,
    /// Step used to measure local slope for scatter gates
    pub slope_step: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            placement_half_extent: PLACEMENT_HALF_EXTENT,
            scatter_half_extent: SCATTER_HALF_EXTENT,
            ceiling: WORLD_CEILING,
            max_attempts: DEFAULT_RETRY_BUDGET,
            accept_on_exhaustion: true,
            require_behavior_tag: false,
            slope_step: 1.0,
        }
    }
}

/// What happened while placing one species.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub species: String,
    pub requested: usize,
    pub placed: usize,
    pub clusters: usize,
    /// Instances scattered after the cluster quotas
    pub remainder: usize,
    pub skipped_by_landmark: usize,
    pub skipped_by_gate: usize,
    /// Draws kept after the retry budget ran out
    pub fallback_accepts: usize,
    /// Draws dropped after the retry budget ran out
    pub exhausted_rejects: usize,
}

enum Sampled {
    Clear(Vec2),
    Exhausted(Vec2),
}

pub struct PopulationSpawner<'a> {
    terrain: &'a TerrainField,
    landmarks: &'a LandmarkSites,
    config: &'a PlacementConfig,
}

impl<'a> PopulationSpawner<'a> {
    pub fn new(
        terrain: &'a TerrainField,
        landmarks: &'a LandmarkSites,
        config: &'a PlacementConfig,
    ) -> Self {
        Self {
            terrain,
            landmarks,
            config,
        }
    }

    /// Places every instance of every species. Fails before placing anything
    /// when a species is invalid.
    pub fn spawn(
        &self,
        species: Vec<SpeciesConfig>,
        rng: &mut impl Rng,
    ) -> Result<(Population, Vec<SpawnReport>), WorldBuildError> {
        for config in &species {
            config.validate()?;
            if config.behavior.is_none() {
                if self.config.require_behavior_tag {
                    return Err(WorldBuildError::MissingBehaviorTag(config.id.clone()));
                }
                warn!(
                    "Species {} has no behavior tag, it will not move",
                    config.id
                );
            }
        }

        let mut population = Population {
            species: Vec::with_capacity(species.len()),
            creatures: Vec::new(),
            clusters: Vec::new(),
        };
        let mut reports = Vec::with_capacity(species.len());

        for (index, config) in species.into_iter().enumerate() {
            let id = SpeciesId(index);
            let mut report = SpawnReport {
                species: config.id.clone(),
                requested: config.count,
                ..Default::default()
            };

            match (&config.cluster, config.schooling) {
                (Some(cluster), true) => {
                    self.spawn_clustered(&mut population, id, &config, cluster, rng, &mut report)
                }
                _ => {
                    for _ in 0..config.count {
                        if let Some(position) = self.place_single(&config, rng, &mut report) {
                            let creature = self.make_creature(id, &config, position, None, rng);
                            population.creatures.push(creature);
                            report.placed += 1;
                        }
                    }
                }
            }

            if report.placed < report.requested {
                debug!(
                    "Species {}: placed {}/{} ({} near landmarks, {} gated, {} exhausted)",
                    report.species,
                    report.placed,
                    report.requested,
                    report.skipped_by_landmark,
                    report.skipped_by_gate,
                    report.exhausted_rejects
                );
            }
            if report.fallback_accepts > 0 {
                debug!(
                    "Species {}: {} placements kept after exhausting {} attempts",
                    report.species, report.fallback_accepts, self.config.max_attempts
                );
            }

            population.species.push(config);
            reports.push(report);
        }

        info!(
            "Spawned {} creatures across {} species and {} clusters",
            population.creatures.len(),
            population.species.len(),
            population.clusters.len()
        );

        Ok((population, reports))
    }

    fn spawn_clustered(
        &self,
        population: &mut Population,
        id: SpeciesId,
        config: &SpeciesConfig,
        cluster: &ClusterParams,
        rng: &mut impl Rng,
        report: &mut SpawnReport,
    ) {
        let per_cluster = config.count / cluster.cluster_count;
        let remainder = config.count - per_cluster * cluster.cluster_count;
        let half_spread = cluster.vertical_spread.map(|s| s / 2.0);

        let mut centers: Vec<Vec2> = Vec::with_capacity(cluster.cluster_count);
        let mut last_cluster = None;

        for _ in 0..cluster.cluster_count {
            let area = self.config.placement_half_extent;
            let Some(center) = self.sample_spaced(
                rng,
                |rng| random_in_square(rng, area),
                &centers,
                cluster.min_cluster_distance,
                report,
            ) else {
                continue;
            };

            if config.avoid_landmarks && self.landmarks.contains(center) {
                report.skipped_by_landmark += per_cluster;
                continue;
            }
            centers.push(center);

            let cluster_height = half_spread.map(|half| {
                let ground = self.terrain.height(center.x, center.y);
                uniform_or_low(
                    rng,
                    ground + SEABED_CLEARANCE + half,
                    self.config.ceiling - half,
                )
            });

            let cluster_index = population.clusters.len();
            population.clusters.push(ClusterSite {
                species: id,
                center,
                radius: cluster.cluster_radius,
                height: cluster_height,
            });
            last_cluster = Some(cluster_index);
            report.clusters += 1;

            let mut members: Vec<Vec2> = Vec::with_capacity(per_cluster);
            for _ in 0..per_cluster {
                let Some(point) = self.sample_spaced(
                    rng,
                    |rng| random_in_disc(rng, center, cluster.cluster_radius),
                    &members,
                    cluster.min_member_distance,
                    report,
                ) else {
                    continue;
                };

                if !self.passes_exclusions(config, point, report) {
                    continue;
                }
                members.push(point);

                let ground = self.terrain.height(point.x, point.y);
                let y = match (cluster_height, half_spread) {
                    (Some(height), Some(half)) => {
                        (height + uniform_or_low(rng, -half, half)).max(ground + SEABED_CLEARANCE)
                    }
                    _ => self.height_for(config.effective_behavior(), point, rng),
                };

                let membership = ClusterMembership {
                    cluster: cluster_index,
                    remainder: false,
                };
                let creature = self.make_creature(
                    id,
                    config,
                    Vec3::new(point.x, y, point.y),
                    Some(membership),
                    rng,
                );
                population.creatures.push(creature);
                report.placed += 1;
            }
        }

        for _ in 0..remainder {
            if let Some(position) = self.place_single(config, rng, report) {
                let membership = last_cluster.map(|cluster| ClusterMembership {
                    cluster,
                    remainder: true,
                });
                let creature = self.make_creature(id, config, position, membership, rng);
                population.creatures.push(creature);
                report.placed += 1;
                report.remainder += 1;
            }
        }
    }

    /// Independent placement used by non-clustered species and cluster remainders.
    fn place_single(
        &self,
        config: &SpeciesConfig,
        rng: &mut impl Rng,
        report: &mut SpawnReport,
    ) -> Option<Vec3> {
        let area = if config.scatter.is_some() {
            self.config.scatter_half_extent
        } else {
            self.config.placement_half_extent
        };
        let point = random_in_square(rng, area);

        if !self.passes_exclusions(config, point, report) {
            return None;
        }

        let y = self.height_for(config.effective_behavior(), point, rng);
        Some(Vec3::new(point.x, y, point.y))
    }

    /// Landmark and scatter-gate checks. A failing candidate is skipped, not retried.
    fn passes_exclusions(
        &self,
        config: &SpeciesConfig,
        point: Vec2,
        report: &mut SpawnReport,
    ) -> bool {
        if config.avoid_landmarks && self.landmarks.contains(point) {
            report.skipped_by_landmark += 1;
            return false;
        }

        if let Some(gate) = &config.scatter {
            let height = self.terrain.height(point.x, point.y);
            let slope = self
                .terrain
                .slope(point.x, point.y, self.config.slope_step);
            if !gate.allows(height, slope) {
                report.skipped_by_gate += 1;
                return false;
            }
        }
        true
    }

    fn height_for(&self, behavior: BehaviorTag, point: Vec2, rng: &mut impl Rng) -> f32 {
        let ground = self.terrain.height(point.x, point.y);
        if behavior.is_grounded() {
            ground
        } else {
            uniform_or_low(rng, ground + SEABED_CLEARANCE, self.config.ceiling)
        }
    }

    /// Rejection sampling against already taken points with the bounded retry
    /// budget. Returns `None` only when the budget ran out and exhausted draws
    /// are configured to be dropped.
    fn sample_spaced<R: Rng>(
        &self,
        rng: &mut R,
        mut draw: impl FnMut(&mut R) -> Vec2,
        taken: &[Vec2],
        min_distance: f32,
        report: &mut SpawnReport,
    ) -> Option<Vec2> {
        let min_distance_sq = min_distance * min_distance;
        let attempts = self.config.max_attempts.max(1);

        let mut sampled = Sampled::Exhausted(Vec2::ZERO);
        for _ in 0..attempts {
            let candidate = draw(rng);
            if taken
                .iter()
                .all(|p| p.distance_squared(candidate) >= min_distance_sq)
            {
                sampled = Sampled::Clear(candidate);
                break;
            }
            sampled = Sampled::Exhausted(candidate);
        }

        match sampled {
            Sampled::Clear(point) => Some(point),
            Sampled::Exhausted(point) if self.config.accept_on_exhaustion => {
                report.fallback_accepts += 1;
                Some(point)
            }
            Sampled::Exhausted(_) => {
                report.exhausted_rejects += 1;
                None
            }
        }
    }

    fn make_creature(
        &self,
        species: SpeciesId,
        config: &SpeciesConfig,
        position: Vec3,
        cluster: Option<ClusterMembership>,
        rng: &mut impl Rng,
    ) -> Creature {
        let (state, velocity) = initial_state(config, position.y, rng);
        let horizontal = velocity.with_y(0.0);
        let yaw = if horizontal.length_squared() > f32::EPSILON {
            yaw_from_direction(horizontal)
        } else {
            rng.gen_range(0.0..TAU)
        };

        Creature {
            species,
            position,
            velocity,
            yaw,
            state,
            cluster,
        }
    }
}

/// Behavior state and starting velocity of a freshly spawned instance.
pub fn initial_state(
    config: &SpeciesConfig,
    spawn_height: f32,
    rng: &mut impl Rng,
) -> (BehaviorState, Vec3) {
    match config.effective_behavior() {
        BehaviorTag::GroundDweller => (BehaviorState::GroundDweller, Vec3::ZERO),
        BehaviorTag::Bobbing => {
            let speed = rng.gen_range(BOB_SPEED_RANGE);
            let speed = if rng.gen_bool(0.5) { speed } else { -speed };
            (
                BehaviorState::Bobbing {
                    base_height: spawn_height,
                },
                Vec3::new(0.0, speed, 0.0),
            )
        }
        BehaviorTag::Predator => (
            BehaviorState::Predator {
                mode: PredatorMode::Active,
                timer: rng.gen_range(PREDATOR_ACTIVE_RANGE),
                wander_angle: rng.gen_range(0.0..TAU),
                base_height: spawn_height,
            },
            Vec3::ZERO,
        ),
        BehaviorTag::FreeSwimmer => (
            BehaviorState::FreeSwimmer {
                timer: rng.gen_range(FREE_SWIM_RETARGET_RANGE),
                base_height: spawn_height,
            },
            random_heading(rng) * config.speed,
        ),
        BehaviorTag::Schooling => {
            let start = config.max_speed * SCHOOL_START_SPEED_FACTOR;
            (
                BehaviorState::Schooling,
                Vec3::new(
                    rng.gen_range(-1.0f32..1.0) * start,
                    0.0,
                    rng.gen_range(-1.0f32..1.0) * start,
                ),
            )
        }
    }
}
