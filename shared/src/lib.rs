use std::path::{Path, PathBuf};

use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

pub mod constants;
pub mod creatures;
pub mod error;
pub mod world;

pub use constants::*;
pub use error::WorldBuildError;

use creatures::{default_roster, BehaviorTuning, EnvironmentRanges, PlacementConfig, SpeciesConfig};
use world::{default_landmarks, FlatAreaParams, LandmarkConfig, TerrainParams};

#[derive(Debug, Clone)]
pub struct GameFolderPaths {
    pub game_folder_path: PathBuf,
    pub assets_folder_path: PathBuf,
}

impl GameFolderPaths {
    /// File the world settings are read from. An explicit path wins,
    /// otherwise `world.ron` inside the game folder.
    pub fn settings_path(&self, config: Option<&Path>) -> PathBuf {
        match config {
            Some(path) => path.to_path_buf(),
            None => self.game_folder_path.join(WORLD_SETTINGS_FILE),
        }
    }
}

/// Everything tunable about a world, loaded once before the world is built.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub terrain: TerrainParams,
    pub flat_area: FlatAreaParams,
    pub landmarks: Vec<LandmarkConfig>,
    pub placement: PlacementConfig,
    pub tuning: BehaviorTuning,
    pub ranges: EnvironmentRanges,
    /// Species roster; each entry carries its own behavior tag
    pub species: Vec<SpeciesConfig>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            flat_area: FlatAreaParams::default(),
            landmarks: default_landmarks(),
            placement: PlacementConfig::default(),
            tuning: BehaviorTuning::default(),
            ranges: EnvironmentRanges::default(),
            species: default_roster(),
        }
    }
}

impl WorldSettings {
    pub fn validate(&self) -> Result<(), WorldBuildError> {
        self.terrain.validate()?;
        for species in &self.species {
            species.validate()?;
        }

        if self.flat_area.scan_step <= 0.0 || self.flat_area.interior_step <= 0.0 {
            return Err(WorldBuildError::InvalidSettings(
                "flat area steps must be positive".into(),
            ));
        }
        if self.placement.ceiling <= SEABED_CLEARANCE {
            return Err(WorldBuildError::InvalidSettings(format!(
                "placement ceiling {} leaves no room above the seabed",
                self.placement.ceiling
            )));
        }
        if self.tuning.perception_radius <= 0.0 || self.tuning.wrap_limit <= 0.0 {
            return Err(WorldBuildError::InvalidSettings(
                "perception radius and wrap limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub fn get_game_folder_paths(
    game_folder_path: Option<String>,
    assets_folder_path: Option<String>,
) -> GameFolderPaths {
    let mut paths = default_game_folder_paths();

    if let Some(game_data) = game_folder_path {
        paths.game_folder_path = game_data.into();
    }
    if let Some(game_assets) = assets_folder_path {
        paths.assets_folder_path = game_assets.into();
    }

    paths
}

#[cfg(target_os = "windows")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "%AppData/deepwater".into(),
        assets_folder_path: "%AppData/deepwater/assets".into(),
    }
}

#[cfg(target_os = "linux")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "$HOME/.local/share/deepwater".into(),
        assets_folder_path: "$HOME/.local/share/deepwater/assets".into(),
    }
}

#[cfg(target_os = "macos")]
pub fn default_game_folder_paths() -> GameFolderPaths {
    GameFolderPaths {
        game_folder_path: "$HOME/Library/Application Support/deepwater".into(),
        assets_folder_path: "$HOME/Library/Application Support/deepwater/assets".into(),
    }
}
