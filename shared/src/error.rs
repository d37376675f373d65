use thiserror::Error;

/// Failures that stop the world from being built.
///
/// Out-of-bounds terrain queries and placement exhaustion are not errors;
/// they resolve to sentinels and fallbacks instead.
#[derive(Debug, Error)]
pub enum WorldBuildError {
    #[error("failed to load template `{asset}` for species `{species}`: {reason}")]
    TemplateLoad {
        species: String,
        asset: String,
        reason: String,
    },
    #[error("species `{0}` has no behavior tag")]
    MissingBehaviorTag(String),
    #[error("terrain resolution must be at least 2, got {0}")]
    TerrainResolution(usize),
    #[error("terrain size must be positive and finite, got {0}")]
    TerrainSize(f32),
    #[error("terrain grid holds {actual} heights, expected {expected}")]
    TerrainGrid { expected: usize, actual: usize },
    #[error("species `{species}`: {reason}")]
    InvalidSpecies { species: String, reason: String },
    #[error("invalid world settings: {0}")]
    InvalidSettings(String),
}
