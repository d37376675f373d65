use bevy_log::{error, info, warn};
use rand::Rng;
use shared::constants::TEMPLATE_LOAD_ERROR;
use shared::creatures::{Population, PopulationSpawner, SpawnReport};
use shared::world::{place_landmarks, LandmarkConfig, LandmarkSites, TerrainField};
use shared::{WorldBuildError, WorldSettings};

use super::templates::{Template, TemplateOutcome};

pub struct GeneratedWorld {
    pub terrain: TerrainField,
    pub landmarks: LandmarkSites,
    /// `None` when a template failed or the roster was rejected
    pub population: Option<Population>,
}

/// One log line per species, with the size of the template its instances share.
pub fn spawn_summary(report: &SpawnReport, template: Option<&Template>) -> String {
    let mut line = format!(
        "Species {}: {}/{} placed in {} clusters",
        report.species, report.placed, report.requested, report.clusters
    );
    if report.fallback_accepts + report.exhausted_rejects > 0 {
        line.push_str(&format!(
            ", retry budget ran out {} times",
            report.fallback_accepts + report.exhausted_rejects
        ));
    }
    match template {
        Some(template) => {
            line.push_str(&format!(" (template {}, {} bytes)", template.asset, template.bytes))
        }
        None => line.push_str(" (no template loaded)"),
    }
    line
}

/// Builds terrain, then landmark sites, then the population, in that order.
///
/// Only a terrain failure is fatal. Population failures are logged and the
/// world is returned without creatures.
pub fn generate_world(
    settings: &WorldSettings,
    templates: &TemplateOutcome,
    seed: u32,
    rng: &mut impl Rng,
) -> Result<GeneratedWorld, WorldBuildError> {
    let terrain = TerrainField::build(seed, &settings.terrain)?;
    let (lowest, highest) = terrain.height_range();
    info!(
        "Generated {}x{} seabed with seed {} (heights {:.1} to {:.1})",
        terrain.resolution(),
        terrain.resolution(),
        seed,
        lowest,
        highest
    );

    let landmarks: Vec<LandmarkConfig> = settings
        .landmarks
        .iter()
        .filter(|landmark| {
            let failed = templates.failed_landmarks.contains(&landmark.name);
            if failed {
                warn!("Template for landmark {} failed, omitting it", landmark.name);
            }
            !failed
        })
        .cloned()
        .collect();
    let sites = place_landmarks(&terrain, &settings.flat_area, &landmarks);
    for site in &sites.0 {
        info!(
            "Landmark {} seated at ({:.1}, {:.1}), radius {}",
            site.structure, site.center.x, site.center.y, site.radius
        );
    }

    let population = match &templates.species_error {
        Some(err) => {
            error!("{}: {}", TEMPLATE_LOAD_ERROR, err);
            None
        }
        None => {
            let spawner = PopulationSpawner::new(&terrain, &sites, &settings.placement);
            match spawner.spawn(settings.species.clone(), rng) {
                Ok((population, reports)) => {
                    for report in &reports {
                        let template = settings
                            .species
                            .iter()
                            .find(|species| species.id == report.species)
                            .and_then(|species| templates.library.get(&species.asset));
                        info!("{}", spawn_summary(report, template));
                    }
                    Some(population)
                }
                Err(err) => {
                    error!("Population was not built: {}", err);
                    None
                }
            }
        }
    };

    Ok(GeneratedWorld {
        terrain,
        landmarks: sites,
        population,
    })
}
