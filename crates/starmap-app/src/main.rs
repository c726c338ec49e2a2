//! The binary entry point for the starmap viewer.

use clap::Parser;
use starmap_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info, warn};

fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Logging is configured from the config, so a load failure is reported
    // once the subscriber is up.
    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    let log_dir = dirs::data_local_dir().map(|dir| dir.join("starmap").join("logs"));
    starmap_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    if let Some(e) = load_error {
        warn!("{e}, using defaults");
    }
    info!("Starmap starting, catalog: {}", config.catalog.path.display());

    if let Err(e) = starmap_app::run(config) {
        error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
