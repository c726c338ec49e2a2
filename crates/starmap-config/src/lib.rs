//! Configuration system for the starmap viewer.
//!
//! Settings are fixed for the lifetime of a session: they are loaded once from a
//! RON file at startup, optionally overridden on the command line via clap, and
//! then handed to the renderer and frame driver.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, CatalogConfig, Config, ControlsConfig, DebugConfig, RenderConfig, WindowConfig,
    default_config_dir,
};
pub use error::ConfigError;
