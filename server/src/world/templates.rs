use bevy::tasks::{IoTaskPool, Task, TaskPool};
use futures_lite::future;
use log::{debug, info};
use shared::{WorldBuildError, WorldSettings};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// An asset read from the assets folder, shared by every instance using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub asset: String,
    pub bytes: usize,
}

#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, Template>,
}

impl TemplateLibrary {
    pub fn get(&self, asset: &str) -> Option<&Template> {
        self.templates.get(asset)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Result of the loading phase that runs before the world is built.
#[derive(Debug, Default)]
pub struct TemplateOutcome {
    pub library: TemplateLibrary,
    /// First species whose template failed; the population is not built when set
    pub species_error: Option<WorldBuildError>,
    /// Landmarks whose template failed; they are left out of the world
    pub failed_landmarks: Vec<String>,
}

/// Reads every species and landmark template on the IO task pool and waits
/// for all of them.
pub fn load_templates(settings: &WorldSettings, assets_folder: &Path) -> TemplateOutcome {
    let pool = IoTaskPool::get_or_init(TaskPool::new);

    let mut assets: Vec<&str> = settings
        .species
        .iter()
        .map(|s| s.asset.as_str())
        .chain(settings.landmarks.iter().map(|l| l.asset.as_str()))
        .collect();
    assets.sort_unstable();
    assets.dedup();

    let tasks: Vec<(String, Task<Result<usize, String>>)> = assets
        .into_iter()
        .map(|asset| {
            let path = assets_folder.join(asset);
            let task = pool.spawn(async move {
                fs::read(&path)
                    .map(|bytes| bytes.len())
                    .map_err(|err| format!("{}: {err}", path.display()))
            });
            (asset.to_string(), task)
        })
        .collect();

    let mut failures: HashMap<String, String> = HashMap::new();
    let mut library = TemplateLibrary::default();
    for (asset, task) in tasks {
        match future::block_on(task) {
            Ok(bytes) => {
                debug!("Loaded template {} ({} bytes)", asset, bytes);
                library
                    .templates
                    .insert(asset.clone(), Template { asset, bytes });
            }
            Err(reason) => {
                failures.insert(asset, reason);
            }
        }
    }

    let species_error = settings.species.iter().find_map(|species| {
        failures
            .get(&species.asset)
            .map(|reason| WorldBuildError::TemplateLoad {
                species: species.id.clone(),
                asset: species.asset.clone(),
                reason: reason.clone(),
            })
    });

    let failed_landmarks = settings
        .landmarks
        .iter()
        .filter(|landmark| failures.contains_key(&landmark.asset))
        .map(|landmark| landmark.name.clone())
        .collect();

    info!(
        "Loaded {} templates from {} ({} failed)",
        library.len(),
        assets_folder.display(),
        failures.len()
    );

    TemplateOutcome {
        library,
        species_error,
        failed_landmarks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::creatures::{BehaviorTag, SpeciesConfig};
    use shared::world::LandmarkConfig;
    use std::path::PathBuf;

    fn assets_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deepwater-assets-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(dir.join("models")).unwrap();
        dir
    }

    fn settings(species_asset: &str, landmark_asset: &str) -> WorldSettings {
        WorldSettings {
            species: vec![SpeciesConfig::new(
                "crab",
                species_asset,
                2,
                BehaviorTag::GroundDweller,
            )],
            landmarks: vec![LandmarkConfig {
                name: "ruin".to_string(),
                asset: landmark_asset.to_string(),
                radius: 20.0,
                scale: 1.0,
                y_offset: 0.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn present_templates_load() {
        let dir = assets_dir("present");
        fs::write(dir.join("models/crab.glb"), b"crab").unwrap();
        fs::write(dir.join("models/ruin.glb"), b"ruin!").unwrap();

        let outcome = load_templates(&settings("models/crab.glb", "models/ruin.glb"), &dir);
        fs::remove_dir_all(&dir).ok();

        assert!(outcome.species_error.is_none());
        assert!(outcome.failed_landmarks.is_empty());
        assert_eq!(outcome.library.len(), 2);
        assert_eq!(outcome.library.get("models/ruin.glb").unwrap().bytes, 5);
    }

    #[test]
    fn missing_templates_are_reported() {
        let dir = assets_dir("missing");

        let outcome = load_templates(&settings("models/crab.glb", "models/ruin.glb"), &dir);
        fs::remove_dir_all(&dir).ok();

        assert!(matches!(
            outcome.species_error,
            Some(WorldBuildError::TemplateLoad { ref species, .. }) if species == "crab"
        ));
        assert_eq!(outcome.failed_landmarks, vec!["ruin".to_string()]);
        assert!(outcome.library.is_empty());
    }
}
