pub mod behavior;
pub mod entity;
pub mod environment;
pub mod neighbors;
pub mod spawning;
pub mod species;

pub use behavior::*;
pub use entity::*;
pub use environment::*;
pub use neighbors::*;
pub use spawning::*;
pub use species::*;
