pub mod init;
pub mod mob;
pub mod player;
pub mod world;
