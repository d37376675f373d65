use bevy::time::{Fixed, Time};
use bevy_ecs::system::{Res, ResMut};
use log::warn;
use shared::creatures::{EnvironmentContext, Population};
use shared::world::TerrainField;

use super::{CreatureEngine, SimulationRng};

/// Runs one behavior frame over the whole population.
pub fn creature_behavior_system(
    population: Option<ResMut<Population>>,
    env: Res<EnvironmentContext>,
    terrain: Res<TerrainField>,
    mut engine: ResMut<CreatureEngine>,
    mut rng: ResMut<SimulationRng>,
    delta: Res<Time<Fixed>>,
) {
    let Some(mut population) = population else {
        return;
    };

    let delta = delta.delta_secs();
    let skipped = engine
        .0
        .tick(&mut population, &env, &terrain, delta, &mut rng.0);
    if skipped > 0 {
        warn!("{} creatures skipped this frame", skipped);
    }
}
