use bevy_log::info;
use ron::de::from_str;
use shared::WorldSettings;
use std::fs;
use std::path::Path;

/// Reads the world settings from a ron file. A missing file yields the
/// default settings.
pub fn load_world_settings(path: &Path) -> Result<WorldSettings, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(
            "World settings file not found: {}. Using default settings.",
            path.display()
        );
        return Ok(WorldSettings::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let settings: WorldSettings = from_str(&contents)?;
    settings.validate()?;

    info!("Found world settings file on disk: {}", path.display());

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{get_game_folder_paths, WORLD_SETTINGS_FILE};
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "deepwater-{}-{}.ron",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = load_world_settings(Path::new("/nonexistent/deepwater/world.ron")).unwrap();
        assert_eq!(settings.species.len(), WorldSettings::default().species.len());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_file(
            "partial",
            "(placement: (max_attempts: 3, accept_on_exhaustion: false), tuning: (spatial_grid: true))",
        );
        let settings = load_world_settings(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(settings.placement.max_attempts, 3);
        assert!(!settings.placement.accept_on_exhaustion);
        assert!(settings.tuning.spatial_grid);
        assert_eq!(settings.flat_area.min_separation, 150.0);
        assert_eq!(settings.landmarks.len(), 2);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let path = temp_file("invalid", "(terrain: (resolution: 1))");
        let result = load_world_settings(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file("malformed", "(placement: [");
        let result = load_world_settings(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn default_file_is_read_from_the_game_folder() {
        let folder = std::env::temp_dir().join(format!("deepwater-game-{}", std::process::id()));
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            folder.join(WORLD_SETTINGS_FILE),
            "(placement: (max_attempts: 4))",
        )
        .unwrap();

        let paths = get_game_folder_paths(Some(folder.display().to_string()), None);
        let settings = load_world_settings(&paths.settings_path(None)).unwrap();
        fs::remove_dir_all(&folder).ok();

        assert_eq!(settings.placement.max_attempts, 4);
    }
}
