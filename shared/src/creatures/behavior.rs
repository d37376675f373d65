use bevy::math::Vec3;
use bevy_log::error;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::constants::{SEABED_CLEARANCE, WORLD_CEILING, WORLD_SIZE};
use crate::world::{
    heading_vector, random_heading, wrap_horizontal, yaw_from_direction, TerrainField,
};

use super::entity::{BehaviorState, Creature, PredatorMode, Population};
use super::environment::EnvironmentContext;
use super::neighbors::{BruteForceNeighbors, GridNeighbors, NeighborQuery};
use super::species::SpeciesConfig;

/// Seconds a predator stays active before resting.
pub const PREDATOR_ACTIVE_RANGE: Range<f32> = 3.0..6.0;
/// Seconds a predator rests before hunting again.
pub const PREDATOR_IDLE_RANGE: Range<f32> = 2.0..4.0;
/// Seconds a free swimmer keeps its heading.
pub const FREE_SWIM_RETARGET_RANGE: Range<f32> = 2.0..5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Radius in which schooling creatures see each other
    pub perception_radius: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    /// Flee speed from the player as a multiple of max speed
    pub avoid_speed_factor: f32,
    /// Flee steering cap as a multiple of max force
    pub avoid_force_factor: f32,
    /// Chase speed as a multiple of the species speed
    pub chase_speed_factor: f32,
    /// Largest wander turn rate, in radians per second
    pub wander_jitter: f32,
    /// Vertical drift allowed around the base height of bobbing creatures
    pub bob_threshold: f32,
    /// Horizontal speed under which yaw is left unchanged
    pub yaw_epsilon: f32,
    /// Moving creatures past this |x| or |z| reappear on the other side
    pub wrap_limit: f32,
    pub ceiling: f32,
    pub seabed_clearance: f32,
    /// Use the uniform grid instead of the brute force neighbor scan
    pub spatial_grid: bool,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            perception_radius: 10.0,
            alignment_weight: 1.0,
            cohesion_weight: 0.8,
            separation_weight: 1.5,
            avoid_speed_factor: 1.5,
            avoid_force_factor: 4.0,
            chase_speed_factor: 2.0,
            wander_jitter: 9.0,
            bob_threshold: 1.0,
            yaw_epsilon: 1e-3,
            wrap_limit: WORLD_SIZE / 2.0,
            ceiling: WORLD_CEILING,
            seabed_clearance: SEABED_CLEARANCE,
            spatial_grid: false,
        }
    }
}

/// Neighbor strategy picked at runtime from [`BehaviorTuning::spatial_grid`].
pub type DynNeighbors = Box<dyn NeighborQuery + Send + Sync>;

/// Advances every creature by one frame, in index order.
///
/// Creatures are updated in place, so a schooling creature sees the already
/// updated positions of neighbors with a lower index.
pub struct BehaviorEngine<Q: NeighborQuery = BruteForceNeighbors> {
    tuning: BehaviorTuning,
    neighbors: Q,
    scratch: Vec<usize>,
}

impl BehaviorEngine {
    pub fn new(tuning: BehaviorTuning) -> Self {
        Self::with_neighbors(tuning, BruteForceNeighbors)
    }
}

impl BehaviorEngine<GridNeighbors> {
    pub fn gridded(tuning: BehaviorTuning) -> Self {
        let cell = tuning.perception_radius;
        Self::with_neighbors(tuning, GridNeighbors::new(cell))
    }
}

impl BehaviorEngine<DynNeighbors> {
    /// Engine whose neighbor strategy follows the tuning.
    pub fn from_tuning(tuning: BehaviorTuning) -> Self {
        let neighbors: DynNeighbors = if tuning.spatial_grid {
            Box::new(GridNeighbors::new(tuning.perception_radius))
        } else {
            Box::new(BruteForceNeighbors)
        };
        Self::with_neighbors(tuning, neighbors)
    }
}

impl<Q: NeighborQuery> BehaviorEngine<Q> {
    pub fn with_neighbors(tuning: BehaviorTuning, neighbors: Q) -> Self {
        Self {
            tuning,
            neighbors,
            scratch: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &BehaviorTuning {
        &self.tuning
    }

    /// Runs one frame. Returns the number of creatures skipped because their
    /// state was not finite.
    pub fn tick(
        &mut self,
        population: &mut Population,
        env: &EnvironmentContext,
        terrain: &TerrainField,
        delta: f32,
        rng: &mut impl Rng,
    ) -> usize {
        if !(delta > 0.0) || !delta.is_finite() {
            return 0;
        }

        let Population {
            species, creatures, ..
        } = population;
        self.neighbors.refresh(creatures);

        let mut skipped = 0;
        for index in 0..creatures.len() {
            let mut creature = creatures[index];
            if !creature.is_finite() {
                error!("Creature {} has non-finite state, skipping", index);
                skipped += 1;
                continue;
            }
            let Some(config) = species.get(creature.species.0) else {
                error!("Creature {} points at unknown species {}", index, creature.species.0);
                skipped += 1;
                continue;
            };

            match creature.state {
                BehaviorState::GroundDweller => continue,
                BehaviorState::Schooling => {
                    let steering = self.school_steering(creatures, index, config, env);
                    self.integrate_schooling(&mut creature, steering, config, terrain, delta);
                }
                BehaviorState::Predator { .. } => {
                    self.update_predator(&mut creature, config, env, terrain, delta, rng)
                }
                BehaviorState::FreeSwimmer { .. } => {
                    self.update_free_swimmer(&mut creature, config, delta, rng)
                }
                BehaviorState::Bobbing { .. } => self.update_bobbing(&mut creature, delta),
            }

            let from = creatures[index].position;
            creatures[index] = creature;
            if from != creature.position {
                self.neighbors.moved(index, from, creature.position);
            }
        }
        skipped
    }

    /// Sum of the weighted flocking forces and player avoidance for one
    /// schooling creature. Only neighbors of the same species count.
    fn school_steering(
        &mut self,
        creatures: &[Creature],
        index: usize,
        config: &SpeciesConfig,
        env: &EnvironmentContext,
    ) -> Vec3 {
        let me = &creatures[index];
        let max_speed = config.max_speed;
        let max_force = config.max_force;

        self.scratch.clear();
        self.neighbors.neighbors_within(
            creatures,
            index,
            self.tuning.perception_radius,
            &mut self.scratch,
        );

        let mut heading = Vec3::ZERO;
        let mut center = Vec3::ZERO;
        let mut away = Vec3::ZERO;
        let mut count = 0;
        for &other in &self.scratch {
            let other = &creatures[other];
            if other.species != me.species {
                continue;
            }
            heading += other.velocity;
            center += other.position;
            let offset = me.position - other.position;
            let distance_sq = offset.length_squared();
            if distance_sq > f32::EPSILON {
                away += offset / distance_sq;
            }
            count += 1;
        }

        let steer = |desired: Vec3| -> Vec3 {
            if desired.length_squared() <= f32::EPSILON {
                return Vec3::ZERO;
            }
            (desired.normalize() * max_speed - me.velocity).clamp_length_max(max_force)
        };

        let mut steering = Vec3::ZERO;
        if count > 0 {
            let count = count as f32;
            let alignment = steer(heading / count);
            let cohesion = steer(center / count - me.position);
            let separation = steer(away / count);
            steering += alignment * self.tuning.alignment_weight
                + cohesion * self.tuning.cohesion_weight
                + separation * self.tuning.separation_weight;
        }

        if env.player_within(me.position, env.player_avoid_range) {
            let flee = (me.position - env.player_position).normalize_or_zero()
                * max_speed
                * self.tuning.avoid_speed_factor;
            steering += (flee - me.velocity)
                .clamp_length_max(max_force * self.tuning.avoid_force_factor);
        }

        steering
    }

    fn integrate_schooling(
        &self,
        creature: &mut Creature,
        steering: Vec3,
        config: &SpeciesConfig,
        terrain: &TerrainField,
        delta: f32,
    ) {
        creature.velocity = (creature.velocity + steering).clamp_length_max(config.max_speed);
        creature.position += creature.velocity * delta;

        let floor = terrain.height(creature.position.x, creature.position.z)
            + self.tuning.seabed_clearance;
        creature.position.y = creature.position.y.min(self.tuning.ceiling).max(floor);

        wrap_horizontal(&mut creature.position, self.tuning.wrap_limit);
        self.face_velocity(creature);
    }

    fn update_predator(
        &self,
        creature: &mut Creature,
        config: &SpeciesConfig,
        env: &EnvironmentContext,
        terrain: &TerrainField,
        delta: f32,
        rng: &mut impl Rng,
    ) {
        let BehaviorState::Predator {
            mut mode,
            mut timer,
            mut wander_angle,
            base_height,
        } = creature.state
        else {
            return;
        };

        timer -= delta;
        if timer <= 0.0 {
            (mode, timer) = match mode {
                PredatorMode::Idle => (PredatorMode::Active, rng.gen_range(PREDATOR_ACTIVE_RANGE)),
                PredatorMode::Active => (PredatorMode::Idle, rng.gen_range(PREDATOR_IDLE_RANGE)),
            };
        }

        // the chase overrides both modes
        if env.player_within(creature.position, env.predator_detect_range) {
            let offset = env.player_position - creature.position;
            let distance = offset.length();
            let speed = config.speed * self.tuning.chase_speed_factor;
            let direction = offset.normalize_or_zero();
            // never overshoot the player
            creature.position += direction * (speed * delta).min(distance);
            creature.velocity = direction * speed;

            let floor = terrain.height(creature.position.x, creature.position.z)
                + self.tuning.seabed_clearance;
            creature.position.y = creature.position.y.max(floor);
        } else {
            match mode {
                PredatorMode::Idle => creature.velocity = Vec3::ZERO,
                PredatorMode::Active => {
                    wander_angle +=
                        rng.gen_range(-1.0f32..=1.0) * self.tuning.wander_jitter * delta;
                    creature.velocity = heading_vector(wander_angle) * config.speed;
                    creature.position += creature.velocity * delta;
                    creature.position.y = base_height;
                }
            }
        }
        wrap_horizontal(&mut creature.position, self.tuning.wrap_limit);
        self.face_velocity(creature);

        creature.state = BehaviorState::Predator {
            mode,
            timer,
            wander_angle,
            base_height,
        };
    }

    fn update_free_swimmer(
        &self,
        creature: &mut Creature,
        config: &SpeciesConfig,
        delta: f32,
        rng: &mut impl Rng,
    ) {
        let BehaviorState::FreeSwimmer {
            mut timer,
            base_height,
        } = creature.state
        else {
            return;
        };

        timer -= delta;
        if timer <= 0.0 {
            creature.velocity = random_heading(rng) * config.speed;
            timer = rng.gen_range(FREE_SWIM_RETARGET_RANGE);
        }

        creature.position += creature.velocity * delta;
        creature.position.y = base_height;
        wrap_horizontal(&mut creature.position, self.tuning.wrap_limit);
        self.face_velocity(creature);

        creature.state = BehaviorState::FreeSwimmer { timer, base_height };
    }

    fn update_bobbing(&self, creature: &mut Creature, delta: f32) {
        let BehaviorState::Bobbing { base_height } = creature.state else {
            return;
        };

        creature.position.y += creature.velocity.y * delta;
        let drift = creature.position.y - base_height;
        if drift.abs() > self.tuning.bob_threshold {
            creature.position.y = base_height + self.tuning.bob_threshold * drift.signum();
            creature.velocity.y = -creature.velocity.y.abs() * drift.signum();
        }
    }

    fn face_velocity(&self, creature: &mut Creature) {
        let horizontal = creature.velocity.with_y(0.0);
        if horizontal.length() > self.tuning.yaw_epsilon {
            creature.yaw = yaw_from_direction(horizontal);
        }
    }
}
