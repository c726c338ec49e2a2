//! Star proxies: the renderable stand-in for one catalog entry.

use glam::{Mat4, Vec3};

use crate::layers::{GLOW_LAYER, Layers};
use crate::material::{Material, MaterialLedger};
use crate::spectral::{FALLBACK_COLOR, StarColor};

/// Radius of the proxy icosphere before scaling.
pub const PROXY_RADIUS: f32 = 0.05;
/// Uniform scale applied to every proxy.
pub const PROXY_SCALE: f32 = 1.5;
/// Subdivision level of the shared proxy icosphere.
pub const PROXY_SUBDIVISIONS: u32 = 4;
/// Label anchor in the proxy's local space.
pub const LABEL_OFFSET: Vec3 = Vec3::new(0.0, -0.1, 0.0);

/// Screen-space annotation owned by a [`StarProxy`].
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    offset: Vec3,
    color: StarColor,
    text: Option<String>,
}

impl Label {
    /// Anchor offset in the owner's local space.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Marker color.
    pub fn color(&self) -> StarColor {
        self.color
    }

    /// Optional annotation text (the star's display name).
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// A positioned, colored, glow-tagged star.
///
/// Layer membership is fixed at construction; there is no setter.
#[derive(Debug)]
pub struct StarProxy {
    position: Vec3,
    scale: f32,
    radius: f32,
    layers: Layers,
    material: Material,
    label: Label,
}

impl StarProxy {
    /// World-space center.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Uniform scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Unscaled mesh radius.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Display color.
    pub fn color(&self) -> StarColor {
        self.material.color()
    }

    /// Layer membership.
    pub fn layers(&self) -> Layers {
        self.layers
    }

    /// Whether the proxy contributes to the bloom pass.
    pub fn emits_glow(&self) -> bool {
        self.layers.is_enabled(GLOW_LAYER)
    }

    /// The attached label.
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// The proxy's material.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// World-space label anchor. The offset is expressed in local space, so it
    /// scales with the proxy.
    pub fn label_anchor(&self) -> Vec3 {
        self.position + self.label.offset * self.scale
    }

    /// Local-to-world transform applied to the unit-radius proxy mesh.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(Vec3::splat(self.radius * self.scale))
    }

    /// Release the material ahead of removal from the scene.
    pub fn dispose(&mut self) {
        self.material.dispose();
    }
}

/// Builder for [`StarProxy`].
#[derive(Clone, Debug)]
pub struct StarProxyBuilder {
    position: Vec3,
    scale: f32,
    radius: f32,
    color: Option<StarColor>,
    glow: bool,
    label_text: Option<String>,
}

impl StarProxyBuilder {
    /// Start a proxy at `position` with the standard radius and scale.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            scale: PROXY_SCALE,
            radius: PROXY_RADIUS,
            color: None,
            glow: true,
            label_text: None,
        }
    }

    /// Palette color, or `None` for the fallback.
    pub fn color(mut self, color: Option<StarColor>) -> Self {
        self.color = color;
        self
    }

    /// Whether the proxy joins the glow layer.
    pub fn glow(mut self, glow: bool) -> Self {
        self.glow = glow;
        self
    }

    /// Label text.
    pub fn label_text(mut self, text: Option<String>) -> Self {
        self.label_text = text;
        self
    }

    /// Override the uniform scale.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Finish the proxy, registering its material with `ledger`.
    pub fn build(self, ledger: &MaterialLedger) -> StarProxy {
        let color = self.color.unwrap_or(FALLBACK_COLOR);
        let layers = if self.glow {
            Layers::new().with(GLOW_LAYER)
        } else {
            Layers::new()
        };
        StarProxy {
            position: self.position,
            scale: self.scale,
            radius: self.radius,
            layers,
            material: Material::new(color, ledger),
            label: Label {
                offset: LABEL_OFFSET,
                color,
                text: self.label_text,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::new(1.0, 2.0, 3.0)).build(&ledger);
        assert_eq!(proxy.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(proxy.scale(), PROXY_SCALE);
        assert_eq!(proxy.radius(), PROXY_RADIUS);
        assert_eq!(proxy.color(), FALLBACK_COLOR);
        assert!(proxy.emits_glow());
        assert_eq!(ledger.live(), 1);
    }

    #[test]
    fn test_label_matches_proxy_color() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::ZERO)
            .color(Some(StarColor(0xffd2a1)))
            .label_text(Some("Arcturus".to_string()))
            .build(&ledger);
        assert_eq!(proxy.label().color(), StarColor(0xffd2a1));
        assert_eq!(proxy.label().text(), Some("Arcturus"));
        assert_eq!(proxy.label().offset(), LABEL_OFFSET);
    }

    #[test]
    fn test_label_anchor_scales_with_proxy() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::new(0.0, 1.0, 0.0)).build(&ledger);
        let anchor = proxy.label_anchor();
        assert!((anchor.y - (1.0 - 0.1 * PROXY_SCALE)).abs() < 1e-6);
        assert_eq!(anchor.x, 0.0);
        assert_eq!(anchor.z, 0.0);
    }

    #[test]
    fn test_non_glowing_proxy_stays_in_default_layer() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::ZERO).glow(false).build(&ledger);
        assert!(!proxy.emits_glow());
        assert_eq!(proxy.layers(), Layers::new());
    }

    #[test]
    fn test_model_matrix_places_mesh() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::new(4.0, 0.0, -2.0)).build(&ledger);
        let m = proxy.model_matrix();
        let surface = m.transform_point3(Vec3::X);
        let expected_radius = PROXY_RADIUS * PROXY_SCALE;
        assert!((surface - Vec3::new(4.0 + expected_radius, 0.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn test_dispose_releases_material() {
        let ledger = MaterialLedger::new();
        let mut proxy = StarProxyBuilder::new(Vec3::ZERO).build(&ledger);
        proxy.dispose();
        assert!(proxy.material().is_disposed());
        assert_eq!(ledger.live(), 0);
    }
}
