//! The scene graph: every star proxy currently on stage.

use crate::layers::Layers;
use crate::material::MaterialLedger;
use crate::proxy::StarProxy;

/// Population state of a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    /// No catalog has been applied yet, or the last one was empty.
    Empty,
    /// At least one proxy is present.
    Populated {
        /// Number of proxies on stage.
        stars: usize,
    },
}

/// Append-only-then-clearable container of [`StarProxy`] instances.
///
/// The generation counter advances on every structural change so GPU-side
/// caches can tell when their instance data is stale.
#[derive(Debug, Default)]
pub struct SceneGraph {
    proxies: Vec<StarProxy>,
    generation: u64,
    ledger: MaterialLedger,
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current population state.
    pub fn state(&self) -> SceneState {
        if self.proxies.is_empty() {
            SceneState::Empty
        } else {
            SceneState::Populated {
                stars: self.proxies.len(),
            }
        }
    }

    /// Number of proxies.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether the scene has no proxies.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Structural change counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ledger that proxies added to this scene must register their materials with.
    pub fn ledger(&self) -> &MaterialLedger {
        &self.ledger
    }

    /// Number of materials that have not been released.
    pub fn live_materials(&self) -> usize {
        self.ledger.live()
    }

    /// Append a proxy.
    pub fn add(&mut self, proxy: StarProxy) {
        self.proxies.push(proxy);
        self.generation += 1;
    }

    /// Append many proxies as a single structural change.
    pub fn extend(&mut self, proxies: impl IntoIterator<Item = StarProxy>) {
        let before = self.proxies.len();
        self.proxies.extend(proxies);
        if self.proxies.len() != before {
            self.generation += 1;
        }
    }

    /// Dispose every proxy's material, then remove all proxies.
    pub fn clear(&mut self) {
        if self.proxies.is_empty() {
            return;
        }
        for proxy in &mut self.proxies {
            proxy.dispose();
        }
        let released = self.proxies.len();
        self.proxies.clear();
        self.generation += 1;
        log::debug!("Released {released} star proxies");
    }

    /// All proxies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StarProxy> {
        self.proxies.iter()
    }

    /// Proxies whose layers intersect `mask`.
    pub fn visible_in(&self, mask: Layers) -> impl Iterator<Item = &StarProxy> {
        self.proxies.iter().filter(move |p| p.layers().test(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::GLOW_LAYER;
    use crate::proxy::StarProxyBuilder;
    use glam::Vec3;

    #[test]
    fn test_new_scene_is_empty() {
        let scene = SceneGraph::new();
        assert_eq!(scene.state(), SceneState::Empty);
        assert_eq!(scene.generation(), 0);
        assert_eq!(scene.live_materials(), 0);
    }

    #[test]
    fn test_add_populates_and_bumps_generation() {
        let mut scene = SceneGraph::new();
        let proxy = StarProxyBuilder::new(Vec3::ZERO).build(scene.ledger());
        scene.add(proxy);
        assert_eq!(scene.state(), SceneState::Populated { stars: 1 });
        assert_eq!(scene.generation(), 1);
    }

    #[test]
    fn test_clear_releases_materials() {
        let mut scene = SceneGraph::new();
        let ledger = scene.ledger().clone();
        scene.extend((0..10).map(|i| StarProxyBuilder::new(Vec3::splat(i as f32)).build(&ledger)));
        assert_eq!(scene.live_materials(), 10);
        let generation = scene.generation();

        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.live_materials(), 0);
        assert!(scene.generation() > generation);
    }

    #[test]
    fn test_clear_on_empty_scene_is_noop() {
        let mut scene = SceneGraph::new();
        scene.clear();
        assert_eq!(scene.generation(), 0);
    }

    #[test]
    fn test_visible_in_partitions_by_layer() {
        let mut scene = SceneGraph::new();
        let ledger = scene.ledger().clone();
        scene.add(StarProxyBuilder::new(Vec3::X).build(&ledger));
        scene.add(StarProxyBuilder::new(Vec3::Y).glow(false).build(&ledger));
        scene.add(StarProxyBuilder::new(Vec3::Z).build(&ledger));

        let glowing: Vec<Vec3> = scene
            .visible_in(Layers::only(GLOW_LAYER))
            .map(|p| p.position())
            .collect();
        assert_eq!(glowing, vec![Vec3::X, Vec3::Z]);
        assert_eq!(scene.visible_in(Layers::all()).count(), 3);
    }
}
