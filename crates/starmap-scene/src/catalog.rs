//! Star catalog loading.
//!
//! The catalog is a JSON array of records keyed the way the published dataset
//! names its columns. Reading happens off the main thread through
//! [`CatalogLoader`]; the parsed records come back over a channel.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use glam::Vec3;
use serde::Deserialize;

/// Errors produced while reading a star catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not a JSON array of objects.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// The loader thread could not be started.
    #[error("failed to spawn catalog loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The loader thread exited without delivering a result.
    #[error("catalog loader exited without a result")]
    Disconnected,
}

/// One star as read from the catalog. Immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct StarRecord {
    /// Spectral class code, e.g. `"G2V"`. Empty when the record had none.
    pub spectral_class: String,
    /// Galactic coordinates.
    pub position: Vec3,
    /// Human-readable name, if the catalog has one.
    pub display_name: Option<String>,
    /// Absolute magnitude. Carried but unused for sizing.
    pub abs_mag: Option<f32>,
}

#[derive(Deserialize)]
struct RawStarRecord {
    // Kept loose so a non-string class falls back to white instead of
    // dropping the star.
    #[serde(rename = "Spectral Class", default)]
    spectral_class: Option<serde_json::Value>,
    #[serde(rename = "Xg", default)]
    x: Option<f32>,
    #[serde(rename = "Yg", default)]
    y: Option<f32>,
    #[serde(rename = "Zg", default)]
    z: Option<f32>,
    #[serde(rename = "Display Name", default)]
    display_name: Option<String>,
    #[serde(rename = "AbsMag", default)]
    abs_mag: Option<f32>,
}

impl RawStarRecord {
    fn into_record(self) -> Option<StarRecord> {
        let (x, y, z) = (self.x?, self.y?, self.z?);
        Some(StarRecord {
            spectral_class: self
                .spectral_class
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default(),
            position: Vec3::new(x, y, z),
            display_name: self.display_name.filter(|n| !n.trim().is_empty()),
            abs_mag: self.abs_mag,
        })
    }
}

/// Parse a catalog document.
///
/// A document that is not a JSON array is an error. Individual records that
/// are malformed or lack a coordinate are skipped with a warning.
pub fn parse_catalog(json: &str) -> Result<Vec<StarRecord>, CatalogError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = values.len();
    let mut records = Vec::with_capacity(total);

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawStarRecord>(value) {
            Ok(raw) => match raw.into_record() {
                Some(record) => records.push(record),
                None => log::warn!("Skipping catalog record {index}: missing coordinate"),
            },
            Err(e) => log::warn!("Skipping catalog record {index}: {e}"),
        }
    }

    if records.len() != total {
        log::info!(
            "Catalog parsed: {} of {total} records usable",
            records.len()
        );
    } else {
        log::debug!("Catalog parsed: {total} records");
    }
    Ok(records)
}

/// Read and parse a catalog file on the calling thread.
pub fn read_catalog(path: &Path) -> Result<Vec<StarRecord>, CatalogError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&contents)
}

/// Reads a catalog on a dedicated thread and hands the result back once.
pub struct CatalogLoader {
    receiver: crossbeam_channel::Receiver<Result<Vec<StarRecord>, CatalogError>>,
    handle: Option<JoinHandle<()>>,
    delivered: bool,
}

impl CatalogLoader {
    /// Start loading `path` in the background.
    ///
    /// `on_ready` runs on the loader thread after the result has been sent, so
    /// it can wake whichever loop polls [`try_take`](Self::try_take).
    pub fn spawn<F>(path: impl Into<PathBuf>, on_ready: F) -> Result<Self, CatalogError>
    where
        F: FnOnce() + Send + 'static,
    {
        let path = path.into();
        let (tx, rx) = crossbeam_channel::bounded(1);

        let handle = std::thread::Builder::new()
            .name("catalog-loader".to_string())
            .spawn(move || {
                log::debug!("Loading catalog from {}", path.display());
                let result = read_catalog(&path);
                if tx.send(result).is_err() {
                    log::debug!("Catalog receiver dropped before delivery");
                    return;
                }
                on_ready();
            })
            .map_err(CatalogError::Spawn)?;

        Ok(Self {
            receiver: rx,
            handle: Some(handle),
            delivered: false,
        })
    }

    /// Take the result if it has arrived.
    ///
    /// Returns `None` while loading is still in progress and after the result
    /// has already been taken.
    pub fn try_take(&mut self) -> Option<Result<Vec<StarRecord>, CatalogError>> {
        if self.delivered {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(crossbeam_channel::TryRecvError::Empty) => return None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => Err(CatalogError::Disconnected),
        };
        self.delivered = true;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("Catalog loader thread panicked");
        }
        Some(result)
    }

    /// Whether the result has been taken.
    pub fn is_finished(&self) -> bool {
        self.delivered
    }
}
