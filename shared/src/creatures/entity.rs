use bevy::math::{Quat, Vec2, Vec3};
use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

use super::environment::EnvironmentContext;
use super::species::{BehaviorTag, SpeciesConfig};

/// Index of a species in [`Population::species`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredatorMode {
    Active,
    Idle,
}

/// Per-creature behavior state. Each variant only carries what its rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BehaviorState {
    GroundDweller,
    Schooling,
    Predator {
        mode: PredatorMode,
        timer: f32,
        wander_angle: f32,
        base_height: f32,
    },
    FreeSwimmer {
        /// Time left before picking a new heading
        timer: f32,
        base_height: f32,
    },
    Bobbing {
        base_height: f32,
    },
}

impl BehaviorState {
    pub fn tag(&self) -> BehaviorTag {
        match self {
            BehaviorState::GroundDweller => BehaviorTag::GroundDweller,
            BehaviorState::Schooling => BehaviorTag::Schooling,
            BehaviorState::Predator { .. } => BehaviorTag::Predator,
            BehaviorState::FreeSwimmer { .. } => BehaviorTag::FreeSwimmer,
            BehaviorState::Bobbing { .. } => BehaviorTag::Bobbing,
        }
    }

    pub fn base_height(&self) -> Option<f32> {
        match self {
            BehaviorState::Predator { base_height, .. }
            | BehaviorState::FreeSwimmer { base_height, .. }
            | BehaviorState::Bobbing { base_height } => Some(*base_height),
            _ => None,
        }
    }
}

/// Membership of a creature in a spawn cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMembership {
    /// Index in [`Population::clusters`]
    pub cluster: usize,
    /// Scattered independently after the cluster quotas were filled
    pub remainder: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Creature {
    pub species: SpeciesId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading about the Y axis
    pub yaw: f32,
    pub state: BehaviorState,
    pub cluster: Option<ClusterMembership>,
}

impl Creature {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.yaw.is_finite()
    }
}

/// Recorded center of a spawn cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSite {
    pub species: SpeciesId,
    pub center: Vec2,
    pub radius: f32,
    /// Height shared by the cluster when the species has a vertical spread
    pub height: Option<f32>,
}

/// Every spawned creature, plus the species they point at.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    pub species: Vec<SpeciesConfig>,
    pub creatures: Vec<Creature>,
    pub clusters: Vec<ClusterSite>,
}

impl Population {
    pub fn species_of(&self, creature: &Creature) -> &SpeciesConfig {
        &self.species[creature.species.0]
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn count_with(&self, tag: BehaviorTag) -> usize {
        self.creatures
            .iter()
            .filter(|c| c.state.tag() == tag)
            .count()
    }

    pub fn count_of(&self, species: SpeciesId) -> usize {
        self.creatures
            .iter()
            .filter(|c| c.species == species)
            .count()
    }

    /// Indices of creatures with the given behavior that sit inside the torch cone.
    pub fn illuminated(&self, env: &EnvironmentContext, tag: BehaviorTag) -> Vec<usize> {
        self.creatures
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state.tag() == tag && env.is_illuminated(c.position))
            .map(|(i, _)| i)
            .collect()
    }
}
