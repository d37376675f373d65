use crate::{
    mob::{
        behavior::creature_behavior_system, log_population_stats_system, CreatureEngine,
        SimulationRng,
    },
    player::{advance_player_system, refresh_environment_system, PatrolRoute, PlayerPose},
    world::{
        generation::generate_world,
        templates::{load_templates, TemplateOutcome},
        WorldSeed,
    },
};
use bevy::prelude::*;
use bevy_app::ScheduleRunnerPlugin;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::{
    creatures::{BehaviorEngine, EnvironmentContext},
    GameFolderPaths, WorldBuildError, WorldSettings, TICKS_PER_SECOND,
};
use std::time::Duration;

/// Number of fixed ticks simulated so far.
#[derive(Resource, Serialize, Deserialize, Debug, Clone)]
pub struct ServerTime(pub u64);

#[derive(Resource, Debug, Clone)]
pub struct HostConfig {
    pub seed: u32,
    /// Stop after this many ticks; run forever when `None`
    pub tick_limit: Option<u64>,
    pub patrol_radius: f32,
    /// Read templates from the assets folder before building the population
    pub load_templates: bool,
}

pub fn tick_counter_system(mut time: ResMut<ServerTime>) {
    time.0 += 1;
}

pub fn exit_after_ticks_system(
    time: Res<ServerTime>,
    config: Res<HostConfig>,
    mut exit: EventWriter<AppExit>,
) {
    if config.tick_limit.is_some_and(|limit| time.0 >= limit) {
        info!("Reached {} ticks, stopping", time.0);
        exit.write(AppExit::Success);
    }
}

/// Builds the world and inserts every resource the fixed frame systems read.
pub fn setup_world(
    app: &mut App,
    settings: WorldSettings,
    config: &HostConfig,
    paths: &GameFolderPaths,
) -> Result<(), WorldBuildError> {
    let templates = if config.load_templates {
        load_templates(&settings, &paths.assets_folder_path)
    } else {
        info!("No assets folder given, skipping template loading");
        TemplateOutcome::default()
    };

    let mut rng = StdRng::seed_from_u64(config.seed as u64);
    let world = generate_world(&settings, &templates, config.seed, &mut rng)?;

    app.insert_resource(world.terrain);
    app.insert_resource(world.landmarks);
    if let Some(population) = world.population {
        app.insert_resource(population);
    }

    app.insert_resource(WorldSeed(config.seed));
    app.insert_resource(ServerTime(0));
    app.insert_resource(SimulationRng(rng));
    app.insert_resource(CreatureEngine(BehaviorEngine::from_tuning(
        settings.tuning.clone(),
    )));
    app.insert_resource(EnvironmentContext::new(&settings.ranges));
    app.insert_resource(PlayerPose::default());
    app.insert_resource(PatrolRoute::new(config.patrol_radius));
    app.insert_resource(settings);
    Ok(())
}

pub fn register_systems(app: &mut App) {
    app.insert_resource(Time::<Fixed>::from_hz(TICKS_PER_SECOND as f64));
    app.add_systems(
        FixedUpdate,
        (
            advance_player_system,
            refresh_environment_system,
            creature_behavior_system,
            tick_counter_system,
            log_population_stats_system,
            exit_after_ticks_system,
        )
            .chain(),
    );
}

pub fn init(settings: WorldSettings, config: HostConfig, game_folder_paths: GameFolderPaths) {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / TICKS_PER_SECOND as f64,
        ))),
    );
    app.add_plugins(bevy::log::LogPlugin::default());

    info!(
        "Starting deepwater host with seed {} ({} species, {} landmarks)",
        config.seed,
        settings.species.len(),
        settings.landmarks.len()
    );

    if let Err(err) = setup_world(&mut app, settings, &config, &game_folder_paths) {
        error!("Failed to generate world with seed {} : {}", config.seed, err);
        std::process::exit(1);
    }

    app.insert_resource(config);

    register_systems(&mut app);

    app.run();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use shared::{constants::PLAYER_SPAWN, creatures::Population, get_game_folder_paths};

    fn host(seed: u32) -> HostConfig {
        HostConfig {
            seed,
            tick_limit: Some(1),
            patrol_radius: 40.0,
            load_templates: false,
        }
    }

    #[test]
    fn one_frame_moves_player_and_creatures() {
        let mut app = App::new();
        let config = host(7);
        setup_world(
            &mut app,
            WorldSettings::default(),
            &config,
            &get_game_folder_paths(None, None),
        )
        .unwrap();
        app.insert_resource(config);

        let mut time = Time::<Fixed>::from_hz(TICKS_PER_SECOND as f64);
        time.advance_by(Duration::from_secs_f64(1.0 / TICKS_PER_SECOND as f64));
        app.insert_resource(time);

        let before = app.world().resource::<Population>().creatures.clone();

        app.world_mut()
            .run_system_once(advance_player_system)
            .unwrap();
        app.world_mut()
            .run_system_once(refresh_environment_system)
            .unwrap();
        app.world_mut()
            .run_system_once(creature_behavior_system)
            .unwrap();
        app.world_mut().run_system_once(tick_counter_system).unwrap();

        let world = app.world();
        assert_eq!(world.resource::<ServerTime>().0, 1);
        assert_ne!(
            world.resource::<EnvironmentContext>().player_position,
            PLAYER_SPAWN
        );
        let after = &world.resource::<Population>().creatures;
        assert_eq!(before.len(), after.len());
        assert!(before
            .iter()
            .zip(after)
            .any(|(a, b)| a.position != b.position));
    }

    #[test]
    fn same_seed_builds_same_world() {
        let build = || {
            let mut app = App::new();
            setup_world(
                &mut app,
                WorldSettings::default(),
                &host(11),
                &get_game_folder_paths(None, None),
            )
            .unwrap();
            app.world().resource::<Population>().creatures.clone()
        };
        let a = build();
        let b = build();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.position == y.position));
    }
}
