use particle_field::config::{AppConfig, ConfigSource};
use particle_field::core::App;
use std::path::PathBuf;

fn main() {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let (config, source) = match AppConfig::load(explicit.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let ConfigSource::File(path) = &source {
        println!("Using configuration {}", path.display());
    }
    if let Err(e) = App::new(config).run() {
        eprintln!("Particle field failed: {}", e);
        std::process::exit(1);
    }
}
