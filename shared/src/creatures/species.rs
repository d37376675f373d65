use serde::{Deserialize, Serialize};

use crate::error::WorldBuildError;

/// Which per-tick update rule drives a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorTag {
    GroundDweller,
    Schooling,
    Predator,
    FreeSwimmer,
    Bobbing,
}

impl BehaviorTag {
    pub fn name(&self) -> &'static str {
        match self {
            BehaviorTag::GroundDweller => "ground-dweller",
            BehaviorTag::Schooling => "schooling",
            BehaviorTag::Predator => "predator",
            BehaviorTag::FreeSwimmer => "free-swimmer",
            BehaviorTag::Bobbing => "bobbing",
        }
    }

    /// Ground dwellers sit on the seabed; everything else swims.
    pub fn is_grounded(&self) -> bool {
        matches!(self, BehaviorTag::GroundDweller)
    }
}

/// How members of a clustered species are grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterParams {
    pub cluster_count: usize,
    pub cluster_radius: f32,
    /// Soft minimum distance between members of the same cluster
    pub min_member_distance: f32,
    /// Soft minimum distance between two cluster centers
    #[serde(default = "default_min_cluster_distance")]
    pub min_cluster_distance: f32,
    /// Height band shared by a cluster; `None` lets every member pick its own height
    #[serde(default)]
    pub vertical_spread: Option<f32>,
}

fn default_min_cluster_distance() -> f32 {
    20.0
}

/// Terrain conditions a scatter instance needs before it is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScatterGate {
    /// Instances above this seabed height are dropped
    pub max_height: f32,
    /// Instances on steeper ground are dropped
    #[serde(default)]
    pub max_slope: Option<f32>,
}

impl ScatterGate {
    pub fn allows(&self, height: f32, slope: f32) -> bool {
        height < self.max_height && self.max_slope.is_none_or(|max| slope < max)
    }
}

/// Immutable description of a species, shared by all of its instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub id: String,
    pub asset: String,
    pub count: usize,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Placed in clusters rather than one by one
    #[serde(default)]
    pub schooling: bool,
    #[serde(default)]
    pub cluster: Option<ClusterParams>,
    /// `None` leaves the species without per-tick motion
    #[serde(default)]
    pub behavior: Option<BehaviorTag>,
    /// Cruise speed for roaming and free swimming
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speed cap for flocking
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Steering cap for flocking
    #[serde(default = "default_max_force")]
    pub max_force: f32,
    /// Scatter placement over the wide area, gated on height and slope
    #[serde(default)]
    pub scatter: Option<ScatterGate>,
    /// Skip candidates that fall inside a landmark site
    #[serde(default)]
    pub avoid_landmarks: bool,
}

fn default_scale() -> f32 {
    1.0
}

fn default_speed() -> f32 {
    3.0
}

fn default_max_speed() -> f32 {
    6.0
}

fn default_max_force() -> f32 {
    0.3
}

impl SpeciesConfig {
    pub fn new(id: &str, asset: &str, count: usize, behavior: BehaviorTag) -> Self {
        Self {
            id: id.to_string(),
            asset: asset.to_string(),
            count,
            scale: default_scale(),
            schooling: false,
            cluster: None,
            behavior: Some(behavior),
            speed: default_speed(),
            max_speed: default_max_speed(),
            max_force: default_max_force(),
            scatter: None,
            avoid_landmarks: false,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_clusters(mut self, cluster: ClusterParams) -> Self {
        self.schooling = true;
        self.cluster = Some(cluster);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_flocking(mut self, max_speed: f32, max_force: f32) -> Self {
        self.max_speed = max_speed;
        self.max_force = max_force;
        self
    }

    pub fn with_scatter(mut self, gate: ScatterGate) -> Self {
        self.scatter = Some(gate);
        self
    }

    pub fn avoiding_landmarks(mut self) -> Self {
        self.avoid_landmarks = true;
        self
    }

    /// Behavior a species gets when spawned, ground dweller when untagged.
    pub fn effective_behavior(&self) -> BehaviorTag {
        self.behavior.unwrap_or(BehaviorTag::GroundDweller)
    }

    pub fn validate(&self) -> Result<(), WorldBuildError> {
        let invalid = |reason: &str| WorldBuildError::InvalidSpecies {
            species: self.id.clone(),
            reason: reason.to_string(),
        };

        if let Some(cluster) = &self.cluster {
            if cluster.cluster_count == 0 {
                return Err(invalid("cluster_count must be at least 1"));
            }
            if cluster.cluster_radius < 0.0 {
                return Err(invalid("cluster_radius must not be negative"));
            }
            if cluster.vertical_spread.is_some_and(|s| s < 0.0) {
                return Err(invalid("vertical_spread must not be negative"));
            }
        }
        if self.schooling && self.cluster.is_none() {
            return Err(invalid("schooling species need cluster parameters"));
        }
        if self.max_speed <= 0.0 || self.max_force <= 0.0 || self.speed < 0.0 {
            return Err(invalid("speeds and forces must be positive"));
        }
        Ok(())
    }
}

/// Built-in roster. Each entry's behavior tag is the single source for how
/// that species moves.
pub fn default_roster() -> Vec<SpeciesConfig> {
    vec![
        SpeciesConfig::new(
            "clownfish",
            "models/animals/Clown_fish.glb",
            120,
            BehaviorTag::Schooling,
        )
        .with_scale(3.0)
        .with_clusters(ClusterParams {
            cluster_count: 6,
            cluster_radius: 20.0,
            min_member_distance: 2.0,
            min_cluster_distance: 20.0,
            vertical_spread: Some(6.0),
        })
        .with_flocking(6.0, 0.3),
        SpeciesConfig::new(
            "blue_tang",
            "models/animals/Blue_tang.glb",
            80,
            BehaviorTag::Schooling,
        )
        .with_scale(2.0)
        .with_clusters(ClusterParams {
            cluster_count: 4,
            cluster_radius: 15.0,
            min_member_distance: 2.0,
            min_cluster_distance: 30.0,
            vertical_spread: Some(4.0),
        })
        .with_flocking(7.0, 0.35),
        SpeciesConfig::new("shark", "models/animals/Shark.glb", 3, BehaviorTag::Predator)
            .with_scale(4.0)
            .with_speed(4.0),
        SpeciesConfig::new(
            "lionfish",
            "models/animals/Lionfish.glb",
            4,
            BehaviorTag::Predator,
        )
        .with_speed(2.0),
        SpeciesConfig::new(
            "blobfish",
            "models/animals/Blobfish.glb",
            3,
            BehaviorTag::Predator,
        )
        .with_speed(1.5),
        SpeciesConfig::new(
            "turtle",
            "models/animals/Turtle.glb",
            5,
            BehaviorTag::FreeSwimmer,
        )
        .with_scale(2.0)
        .with_speed(2.5),
        SpeciesConfig::new(
            "jellyfish",
            "models/animals/Jellyfish.glb",
            12,
            BehaviorTag::Bobbing,
        ),
        SpeciesConfig::new("crab", "models/animals/Crab.glb", 10, BehaviorTag::GroundDweller)
            .avoiding_landmarks(),
        SpeciesConfig::new(
            "starfish",
            "models/animals/Starfish.glb",
            10,
            BehaviorTag::GroundDweller,
        )
        .avoiding_landmarks(),
        SpeciesConfig::new(
            "octopus",
            "models/animals/Octopus.glb",
            4,
            BehaviorTag::GroundDweller,
        )
        .avoiding_landmarks(),
        SpeciesConfig::new(
            "seaweed",
            "models/plants/Seaweed1.glb",
            60,
            BehaviorTag::GroundDweller,
        )
        .with_scale(3.0)
        .with_clusters(ClusterParams {
            cluster_count: 10,
            cluster_radius: 4.0,
            min_member_distance: 2.0,
            min_cluster_distance: 20.0,
            vertical_spread: None,
        })
        .with_scatter(ScatterGate {
            max_height: 10.0,
            max_slope: Some(0.4),
        })
        .avoiding_landmarks(),
        SpeciesConfig::new(
            "coral",
            "models/plants/Coral3.glb",
            50,
            BehaviorTag::GroundDweller,
        )
        .with_scale(6.0)
        .with_clusters(ClusterParams {
            cluster_count: 8,
            cluster_radius: 4.0,
            min_member_distance: 2.0,
            min_cluster_distance: 20.0,
            vertical_spread: None,
        })
        .with_scatter(ScatterGate {
            max_height: 25.0,
            max_slope: Some(0.6),
        })
        .avoiding_landmarks(),
        SpeciesConfig::new("clam", "models/plants/Clam.glb", 10, BehaviorTag::GroundDweller)
            .with_scale(3.0)
            .with_scatter(ScatterGate {
                max_height: 20.0,
                max_slope: Some(0.4),
            })
            .avoiding_landmarks(),
        SpeciesConfig::new("rock", "models/rock/Rock1.glb", 40, BehaviorTag::GroundDweller)
            .with_scale(3.0)
            .with_scatter(ScatterGate {
                max_height: 10.0,
                max_slope: None,
            })
            .avoiding_landmarks(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_is_valid() {
        for species in default_roster() {
            species.validate().unwrap();
            assert!(species.behavior.is_some(), "{} has no tag", species.id);
        }
    }

    #[test]
    fn untagged_species_is_grounded() {
        let mut species = SpeciesConfig::new("mystery", "a.glb", 1, BehaviorTag::Predator);
        species.behavior = None;
        assert_eq!(species.effective_behavior(), BehaviorTag::GroundDweller);
    }

    #[test]
    fn schooling_without_clusters_is_rejected() {
        let mut species = SpeciesConfig::new("fish", "a.glb", 1, BehaviorTag::Schooling);
        species.schooling = true;
        assert!(species.validate().is_err());
    }

    #[test]
    fn scatter_gate() {
        let gate = ScatterGate {
            max_height: 20.0,
            max_slope: Some(0.4),
        };
        assert!(gate.allows(19.0, 0.1));
        assert!(!gate.allows(20.0, 0.1));
        assert!(!gate.allows(5.0, 0.5));
        let rocks = ScatterGate {
            max_height: 10.0,
            max_slope: None,
        };
        assert!(rocks.allows(2.0, 100.0));
    }
}
