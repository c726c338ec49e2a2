//! Command-line argument parsing for the starmap viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Starmap command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "starmap", about = "Interactive 3D starfield with selective bloom")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Path to the JSON star catalog.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Bloom strength multiplier.
    #[arg(long)]
    pub bloom_strength: Option<f32>,

    /// Tone-mapping exposure.
    #[arg(long)]
    pub exposure: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref path) = args.catalog {
            self.catalog.path = path.clone();
        }
        if let Some(strength) = args.bloom_strength {
            self.render.bloom_strength = strength;
        }
        if let Some(exposure) = args.exposure {
            self.render.exposure = exposure;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            catalog: Some(PathBuf::from("stars/near.json")),
            bloom_strength: Some(2.5),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.catalog.path, PathBuf::from("stars/near.json"));
        assert_eq!(config.render.bloom_strength, 2.5);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert_eq!(config.render.exposure, 2.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "starmap",
            "--catalog",
            "hyg.json",
            "--exposure",
            "1.5",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.catalog, Some(PathBuf::from("hyg.json")));
        assert_eq!(args.exposure, Some(1.5));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}
