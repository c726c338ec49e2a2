//! Layer membership masks used to select object subsets per render pass.

/// Layer every object belongs to unless told otherwise.
pub const DEFAULT_LAYER: u32 = 0;
/// Layer drawn by the bloom pass.
pub const GLOW_LAYER: u32 = 1;

/// A 32-bit layer membership mask.
///
/// An object is drawn by a pass when the pass mask and the object mask share at
/// least one bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layers(u32);

impl Layers {
    /// Membership in the default layer only.
    pub const fn new() -> Self {
        Self(1 << DEFAULT_LAYER)
    }

    /// Membership in exactly one layer.
    pub const fn only(layer: u32) -> Self {
        Self(1 << layer)
    }

    /// Membership in every layer.
    pub const fn all() -> Self {
        Self(u32::MAX)
    }

    /// Membership in no layer.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Add membership in `layer`.
    pub const fn with(self, layer: u32) -> Self {
        Self(self.0 | (1 << layer))
    }

    /// Remove membership in `layer`.
    pub const fn without(self, layer: u32) -> Self {
        Self(self.0 & !(1 << layer))
    }

    /// Whether this mask contains `layer`.
    pub const fn is_enabled(self, layer: u32) -> bool {
        self.0 & (1 << layer) != 0
    }

    /// Whether the two masks share a layer.
    pub const fn test(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_layer_zero() {
        let layers = Layers::default();
        assert!(layers.is_enabled(DEFAULT_LAYER));
        assert!(!layers.is_enabled(GLOW_LAYER));
        assert_eq!(layers.bits(), 1);
    }

    #[test]
    fn test_enable_glow_keeps_default() {
        let layers = Layers::new().with(GLOW_LAYER);
        assert!(layers.is_enabled(DEFAULT_LAYER));
        assert!(layers.is_enabled(GLOW_LAYER));
    }

    #[test]
    fn test_pass_selection() {
        let glowing = Layers::new().with(GLOW_LAYER);
        let plain = Layers::new();
        let glow_pass = Layers::only(GLOW_LAYER);
        let base_pass = Layers::all();

        assert!(glowing.test(glow_pass));
        assert!(!plain.test(glow_pass));
        assert!(glowing.test(base_pass));
        assert!(plain.test(base_pass));
        assert!(!glowing.test(Layers::none()));
    }

    #[test]
    fn test_without_removes_membership() {
        let layers = Layers::new().with(GLOW_LAYER).without(GLOW_LAYER);
        assert_eq!(layers, Layers::new());
    }
}
