pub mod generation;
pub mod load_from_file;
pub mod templates;

use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSeed(pub u32);
