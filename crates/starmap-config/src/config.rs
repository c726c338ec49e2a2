//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Bloom and tone-mapping settings.
    pub render: RenderConfig,
    /// Projection and scripted orbit settings.
    pub camera: CameraConfig,
    /// Interactive orbit-control limits.
    pub controls: ControlsConfig,
    /// Star catalog source.
    pub catalog: CatalogConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Post-processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Exposure applied before Reinhard tone mapping.
    pub exposure: f32,
    /// Multiplier applied to the bloom texture in the combine pass.
    pub bloom_strength: f32,
    /// Luminance threshold for the bright pass. 0 lets every lit pixel glow.
    pub bloom_threshold: f32,
    /// Blur tap offset multiplier.
    pub bloom_radius: f32,
    /// Number of mip levels in the blur chain.
    pub bloom_iterations: u32,
}

/// Camera projection and scripted-orbit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Radius of the automatic orbit around the origin.
    pub orbit_radius: f32,
    /// Angular speed of the automatic orbit in radians per second.
    pub orbit_speed: f32,
}

/// Orbit-control limits used once the user takes over the camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Closest allowed distance to the orbit target.
    pub min_distance: f32,
    /// Farthest allowed distance from the orbit target.
    pub max_distance: f32,
    /// Largest polar angle from +Y in radians. PI/2 keeps the camera above the horizon.
    pub max_polar_angle: f32,
    /// Radians of rotation per pixel of drag.
    pub rotate_sensitivity: f32,
    /// Fractional distance change per wheel line.
    pub zoom_speed: f32,
}

/// Star catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the JSON star catalog.
    pub path: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Starmap".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exposure: 2.0,
            bloom_strength: 10.0,
            bloom_threshold: 0.0,
            bloom_radius: 1.0,
            bloom_iterations: 5,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 40.0,
            near: 1.0,
            far: 200.0,
            orbit_radius: 30.0,
            orbit_speed: 0.1,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 100.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
            rotate_sensitivity: 0.005,
            zoom_speed: 0.1,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("nodes/stars.json"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for the viewer (`<config_dir>/starmap`).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("starmap")
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                })?;
            let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("bloom_strength: 10.0"));
    }

    #[test]
    fn test_defaults_match_viewer_constants() {
        let config = Config::default();
        assert_eq!(config.render.exposure, 2.0);
        assert_eq!(config.render.bloom_threshold, 0.0);
        assert_eq!(config.render.bloom_radius, 1.0);
        assert_eq!(config.camera.fov_y_degrees, 40.0);
        assert_eq!(config.camera.near, 1.0);
        assert_eq!(config.camera.far, 200.0);
        assert_eq!(config.camera.orbit_radius, 30.0);
        assert_eq!(config.controls.min_distance, 1.0);
        assert_eq!(config.controls.max_distance, 100.0);
        assert_eq!(config.catalog.path, PathBuf::from("nodes/stars.json"));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: (bloom_strength: 3.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.render.bloom_strength, 3.0);
        assert_eq!(config.render.exposure, 2.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.render.bloom_iterations = 3;
        config.catalog.path = PathBuf::from("/data/hyg.json");

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        match result {
            Err(ConfigError::Parse { path, .. }) => {
                assert_eq!(path, dir.path().join("config.ron"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_names_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.ron");
        std::fs::write(&config_path, "(window: (width: \"wide\"))").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(err.to_string().contains(&config_path.display().to_string()));
    }

    #[test]
    fn test_save_into_file_reports_write_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        match Config::default().save(&blocker) {
            Err(ConfigError::Write { path, .. }) => assert_eq!(path, blocker),
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// starmap settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
