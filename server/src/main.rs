use std::path::PathBuf;

use clap::Parser;
use server::init::{self, HostConfig};
use server::world::load_from_file::load_world_settings;
use shared::constants::{DEFAULT_PATROL_RADIUS, SETTINGS_LOAD_ERROR, WORLD_SIZE};
use shared::get_game_folder_paths;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// World seed; random when omitted
    #[arg(short, long)]
    seed: Option<u32>,

    /// Path to a ron file holding the world settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding `world.ron`, used when `--config` is omitted
    #[arg(short, long)]
    game_folder_path: Option<String>,

    /// Folder the species and landmark templates are read from
    #[arg(short, long)]
    assets_folder_path: Option<String>,

    /// Stop after this many fixed ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    #[arg(short, long, default_value_t = DEFAULT_PATROL_RADIUS)]
    patrol_radius: f32,
}

fn main() {
    let args = Args::parse();

    let max_radius = WORLD_SIZE / 2.0;
    if !(0.0..=max_radius).contains(&args.patrol_radius) {
        eprintln!("Error: patrol_radius must be between 0 and {max_radius} (inclusive).");
        eprintln!("Got: {}", args.patrol_radius);
        std::process::exit(1);
    }

    if args.ticks == Some(0) {
        eprintln!("Error: ticks must be at least 1 when given.");
        std::process::exit(1);
    }

    let load_templates = args.assets_folder_path.is_some();
    let game_folder_paths = get_game_folder_paths(args.game_folder_path, args.assets_folder_path);
    let settings_path = game_folder_paths.settings_path(args.config.as_deref());
    let settings = match load_world_settings(&settings_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{} {}: {err}", SETTINGS_LOAD_ERROR, settings_path.display());
            std::process::exit(1);
        }
    };

    init::init(
        settings,
        HostConfig {
            seed: args.seed.unwrap_or_else(rand::random),
            tick_limit: args.ticks,
            patrol_radius: args.patrol_radius,
            load_templates,
        },
        game_folder_paths,
    );
}
