pub mod behavior;

use bevy_ecs::resource::Resource;
use bevy_ecs::system::Res;
use bevy_log::debug;
use rand::rngs::StdRng;
use shared::constants::STATS_INTERVAL_TICKS;
use shared::creatures::{BehaviorEngine, BehaviorTag, DynNeighbors, EnvironmentContext, Population};

use crate::init::ServerTime;
use crate::world::WorldSeed;

/// Randomness used by the behavior frames, seeded from the world seed.
#[derive(Resource)]
pub struct SimulationRng(pub StdRng);

#[derive(Resource)]
pub struct CreatureEngine(pub BehaviorEngine<DynNeighbors>);

/// Per-tag counts plus the ground dwellers caught by the torch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationStats {
    pub total: usize,
    pub schooling: usize,
    pub predators: usize,
    pub free_swimmers: usize,
    pub bobbing: usize,
    pub ground_dwellers: usize,
    pub lit_ground_dwellers: usize,
}

impl PopulationStats {
    pub fn collect(population: &Population, env: &EnvironmentContext) -> Self {
        Self {
            total: population.len(),
            schooling: population.count_with(BehaviorTag::Schooling),
            predators: population.count_with(BehaviorTag::Predator),
            free_swimmers: population.count_with(BehaviorTag::FreeSwimmer),
            bobbing: population.count_with(BehaviorTag::Bobbing),
            ground_dwellers: population.count_with(BehaviorTag::GroundDweller),
            lit_ground_dwellers: population
                .illuminated(env, BehaviorTag::GroundDweller)
                .len(),
        }
    }
}

pub fn log_population_stats_system(
    time: Res<ServerTime>,
    seed: Res<WorldSeed>,
    population: Option<Res<Population>>,
    env: Res<EnvironmentContext>,
) {
    if time.0 == 0 || time.0 % STATS_INTERVAL_TICKS != 0 {
        return;
    }
    let Some(population) = population else {
        debug!("Tick {} (seed {}): no population", time.0, seed.0);
        return;
    };

    let stats = PopulationStats::collect(&population, &env);
    debug!(
        "Tick {} (seed {}): {} creatures ({} schooling, {} predators, {} free swimmers, {} bobbing, {} on the seabed, {} lit)",
        time.0,
        seed.0,
        stats.total,
        stats.schooling,
        stats.predators,
        stats.free_swimmers,
        stats.bobbing,
        stats.ground_dwellers,
        stats.lit_ground_dwellers
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;
    use shared::creatures::{BehaviorState, Creature, SpeciesConfig, SpeciesId};

    fn at(state: BehaviorState, position: Vec3) -> Creature {
        Creature {
            species: SpeciesId(0),
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            state,
            cluster: None,
        }
    }

    #[test]
    fn stats_count_lit_ground_dwellers() {
        let population = Population {
            species: vec![SpeciesConfig::new(
                "crab",
                "crab.glb",
                3,
                BehaviorTag::GroundDweller,
            )],
            creatures: vec![
                at(BehaviorState::GroundDweller, Vec3::new(0.0, 0.0, -20.0)),
                at(BehaviorState::GroundDweller, Vec3::new(0.0, 0.0, 20.0)),
                at(BehaviorState::Bobbing { base_height: 5.0 }, Vec3::new(0.0, 5.0, -20.0)),
            ],
            clusters: Vec::new(),
        };
        let mut env = EnvironmentContext::default();
        env.refresh(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z);

        let stats = PopulationStats::collect(&population, &env);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.ground_dwellers, 2);
        assert_eq!(stats.bobbing, 1);
        assert_eq!(stats.lit_ground_dwellers, 1);
    }
}
