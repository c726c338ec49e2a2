//! Star catalog ingestion and scene construction.
//!
//! Turns tabular star records into positioned, colored, glow-tagged proxies
//! held in a [`SceneGraph`], which the compositor reads every frame.

pub mod builder;
pub mod catalog;
pub mod graph;
pub mod layers;
pub mod material;
pub mod mesh;
pub mod proxy;
pub mod spectral;

pub use builder::{BuildSummary, SceneBuilder};
pub use catalog::{CatalogError, CatalogLoader, StarRecord, parse_catalog, read_catalog};
pub use graph::{SceneGraph, SceneState};
pub use layers::{DEFAULT_LAYER, GLOW_LAYER, Layers};
pub use material::{Material, MaterialLedger};
pub use mesh::{IcosphereMesh, generate_icosphere};
pub use proxy::{
    LABEL_OFFSET, Label, PROXY_RADIUS, PROXY_SCALE, PROXY_SUBDIVISIONS, StarProxy, StarProxyBuilder,
};
pub use spectral::{FALLBACK_COLOR, SPECTRAL_PALETTE, StarColor, resolve_spectral_color};
