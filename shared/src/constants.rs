use bevy::prelude::*;

pub const TICKS_PER_SECOND: u64 = 30;
/// Side length of the square seabed, centered on the origin.
pub const WORLD_SIZE: f32 = 500.0;
/// Vertices per terrain grid side.
pub const TERRAIN_RESOLUTION: usize = 200;
/// Height returned for queries outside the terrain grid.
pub const OUT_OF_BOUNDS_HEIGHT: f32 = 0.0;
/// Highest point a swimmer may be spawned at.
pub const WORLD_CEILING: f32 = 60.0;
/// Half extent of the square creatures are spawned in.
pub const PLACEMENT_HALF_EXTENT: f32 = 100.0;
/// Half extent of the square scatter decorations are spawned in.
pub const SCATTER_HALF_EXTENT: f32 = 200.0;
/// Minimum gap kept between a swimmer and the seabed.
pub const SEABED_CLEARANCE: f32 = 1.0;
pub const DEFAULT_RETRY_BUDGET: usize = 10;
pub const PLAYER_SPAWN: Vec3 = Vec3 {
    x: 0.0,
    y: 5.0,
    z: 0.0,
};
pub const TEMPLATE_LOAD_ERROR: &str = "Failed to load species template";
pub const SETTINGS_LOAD_ERROR: &str = "Failed to load world settings";
/// Settings file looked up in the game folder when no `--config` is given.
pub const WORLD_SETTINGS_FILE: &str = "world.ron";
/// Radius of the circle the headless player patrols, 0 keeps it still.
pub const DEFAULT_PATROL_RADIUS: f32 = 40.0;
/// Cruise speed of the player vehicle.
pub const PLAYER_SPEED: f32 = 10.0;
/// Ticks between two population statistics logs.
pub const STATS_INTERVAL_TICKS: u64 = TICKS_PER_SECOND * 5;
