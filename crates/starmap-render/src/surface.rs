//! Viewport tracking that normalizes platform resize behavior.
//!
//! Wayland can report zero-size windows, and HiDPI displays change the scale
//! factor at runtime. [`SurfaceWrapper`] turns both into one stream of
//! physical-pixel sizes that every render target is resized to.

/// Minimum surface dimension (prevents zero-size textures).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Physical pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
}

/// Emitted when the physical dimensions actually change.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceResizeEvent {
    /// New physical pixel dimensions.
    pub physical: PhysicalSize,
    /// Current scale factor.
    pub scale_factor: f64,
}

/// Physical size and scale factor of the window's drawable area.
#[derive(Clone, Debug)]
pub struct SurfaceWrapper {
    physical_width: u32,
    physical_height: u32,
    scale_factor: f64,
    configured: bool,
}

impl SurfaceWrapper {
    /// Zero dimensions are clamped to 1 and leave the wrapper unconfigured
    /// until the first real resize.
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            physical_width: physical_width.max(MIN_SURFACE_DIMENSION),
            physical_height: physical_height.max(MIN_SURFACE_DIMENSION),
            scale_factor,
            configured: physical_width > 0 && physical_height > 0,
        }
    }

    /// Record a resize. Returns `None` when the clamped size is unchanged.
    pub fn handle_resize(
        &mut self,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let width = physical_width.max(MIN_SURFACE_DIMENSION);
        let height = physical_height.max(MIN_SURFACE_DIMENSION);

        if width == self.physical_width && height == self.physical_height {
            return None;
        }

        self.physical_width = width;
        self.physical_height = height;
        self.configured = true;

        Some(SurfaceResizeEvent {
            physical: PhysicalSize { width, height },
            scale_factor: self.scale_factor,
        })
    }

    /// Record a DPI change together with the physical size it implies.
    pub fn handle_scale_factor_changed(
        &mut self,
        new_scale_factor: f64,
        new_physical_width: u32,
        new_physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        self.scale_factor = new_scale_factor;
        self.handle_resize(new_physical_width, new_physical_height)
    }

    pub fn physical_size(&self) -> PhysicalSize {
        PhysicalSize {
            width: self.physical_width,
            height: self.physical_height,
        }
    }

    pub fn physical_width(&self) -> u32 {
        self.physical_width
    }

    pub fn physical_height(&self) -> u32 {
        self.physical_height
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.physical_width as f32 / self.physical_height as f32
    }

    /// Whether a non-zero size has been seen.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Map a cursor position in physical pixels to normalized device
    /// coordinates: x in [-1, 1] left to right, y in [-1, 1] bottom to top.
    pub fn to_ndc(&self, x: f64, y: f64) -> [f32; 2] {
        let nx = (x / self.physical_width as f64) * 2.0 - 1.0;
        let ny = -((y / self.physical_height as f64) * 2.0 - 1.0);
        [nx.clamp(-1.0, 1.0) as f32, ny.clamp(-1.0, 1.0) as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_surface_handled_gracefully() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0);
        assert!(!wrapper.is_configured());
        assert_eq!(
            wrapper.physical_size(),
            PhysicalSize {
                width: 1,
                height: 1
            }
        );

        let event = wrapper.handle_resize(1920, 1080).unwrap();
        assert_eq!(event.physical.width, 1920);
        assert_eq!(event.physical.height, 1080);
        assert!(wrapper.is_configured());
    }

    #[test]
    fn test_repeated_resize_is_noop() {
        let mut wrapper = SurfaceWrapper::new(800, 600, 1.0);
        assert!(wrapper.handle_resize(1024, 768).is_some());
        assert!(wrapper.handle_resize(1024, 768).is_none());
        assert!(wrapper.handle_resize(1024, 768).is_none());
        assert_eq!(wrapper.physical_width(), 1024);
    }

    #[test]
    fn test_zero_dimensions_clamped_to_one() {
        let mut wrapper = SurfaceWrapper::new(800, 600, 1.0);
        assert!(wrapper.handle_resize(0, 0).is_some());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });
        assert!(wrapper.handle_resize(0, 0).is_none());
    }

    #[test]
    fn test_scale_factor_change_updates_physical_size() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        let event = wrapper.handle_scale_factor_changed(2.0, 3840, 2160).unwrap();
        assert_eq!(event.physical.width, 3840);
        assert_eq!(event.scale_factor, 2.0);
        assert_eq!(wrapper.scale_factor(), 2.0);
    }

    #[test]
    fn test_aspect_ratio() {
        let wrapper = SurfaceWrapper::new(1280, 720, 1.0);
        assert!((wrapper.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_ndc_corners_and_center() {
        let wrapper = SurfaceWrapper::new(800, 600, 1.0);
        assert_eq!(wrapper.to_ndc(0.0, 0.0), [-1.0, 1.0]);
        assert_eq!(wrapper.to_ndc(800.0, 600.0), [1.0, -1.0]);
        assert_eq!(wrapper.to_ndc(400.0, 300.0), [0.0, 0.0]);
    }

    #[test]
    fn test_to_ndc_clamps_outside_window() {
        let wrapper = SurfaceWrapper::new(100, 100, 1.0);
        assert_eq!(wrapper.to_ndc(-50.0, 500.0), [-1.0, -1.0]);
    }
}
