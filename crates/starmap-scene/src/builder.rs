//! Converts catalog records into star proxies.

use crate::catalog::StarRecord;
use crate::graph::SceneGraph;
use crate::material::MaterialLedger;
use crate::proxy::{StarProxy, StarProxyBuilder};
use crate::spectral::resolve_spectral_color;

/// Outcome of one [`SceneBuilder::build`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Proxies added to the scene.
    pub stars: usize,
    /// Records whose spectral class fell back to the default color.
    pub fallback_colors: usize,
    /// Proxies released from the previous population.
    pub released: usize,
}

/// Builds star proxies from catalog records.
///
/// Every proxy currently glows; [`StarProxyBuilder::glow`] is the hook for
/// selective glow.
#[derive(Clone, Debug, Default)]
pub struct SceneBuilder;

impl SceneBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }

    /// Replace the contents of `scene` with one proxy per record, in order.
    ///
    /// The previous population is disposed before anything new is created.
    pub fn build(&self, records: &[StarRecord], scene: &mut SceneGraph) -> BuildSummary {
        let released = scene.len();
        scene.clear();

        let ledger = scene.ledger().clone();
        let mut fallback_colors = 0;
        let proxies: Vec<StarProxy> = records
            .iter()
            .map(|record| {
                let (proxy, resolved) = self.proxy_for(record, &ledger);
                if !resolved {
                    fallback_colors += 1;
                }
                proxy
            })
            .collect();

        let stars = proxies.len();
        scene.extend(proxies);

        log::info!(
            "Scene built: {stars} stars ({fallback_colors} with fallback color, {released} released)"
        );

        BuildSummary {
            stars,
            fallback_colors,
            released,
        }
    }

    /// Build a single proxy. The flag reports whether the spectral class was
    /// found in the palette.
    pub fn proxy_for(&self, record: &StarRecord, ledger: &MaterialLedger) -> (StarProxy, bool) {
        let color = resolve_spectral_color(&record.spectral_class);
        if color.is_none() {
            log::trace!(
                "No palette entry for spectral class {:?}, using fallback",
                record.spectral_class
            );
        }
        let proxy = StarProxyBuilder::new(record.position)
            .color(color)
            .glow(true)
            .label_text(record.display_name.clone())
            .build(ledger);
        (proxy, color.is_some())
    }
}
