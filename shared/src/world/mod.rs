pub mod flat_area;
pub mod terrain;
mod utils;

pub use flat_area::*;
pub use terrain::*;
pub use utils::*;
