//! All mutable viewer state, owned in one place and handed to every handler.

use std::time::Instant;

use glam::Vec3;
use starmap_config::Config;
use starmap_input::{MouseState, OrbitControls, OrbitLimits};
use starmap_render::{
    BloomConfig, Camera, CombineSettings, Compositor, CompositorSettings, FrameEncoder,
    GpuContext, SurfaceError, SurfaceWrapper,
};
use starmap_scene::{BuildSummary, SceneBuilder, SceneGraph, StarRecord};
use tracing::{debug, info};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use crate::frame_driver::FrameDriver;
use crate::redraw::{RedrawQueue, RedrawReason};

/// Device state plus the compositor built against its surface format.
pub struct GpuResources {
    pub gpu: GpuContext,
    pub compositor: Compositor,
}

/// What a frame did, so the caller can decide whether to schedule another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was submitted.
    Presented,
    /// Nothing to draw into yet.
    NoSurface,
}

/// Map the render section of the config onto compositor settings.
pub fn compositor_settings(config: &Config) -> CompositorSettings {
    let render = &config.render;
    CompositorSettings {
        bloom: BloomConfig {
            threshold: render.bloom_threshold,
            radius: render.bloom_radius,
            iterations: render.bloom_iterations,
            ..BloomConfig::default()
        },
        combine: CombineSettings {
            exposure: render.exposure,
            bloom_strength: render.bloom_strength,
        },
    }
}

pub struct RenderContext {
    pub camera: Camera,
    pub scene: SceneGraph,
    pub driver: FrameDriver,
    pub controls: Option<OrbitControls>,
    pub redraw: RedrawQueue,
    pub surface: SurfaceWrapper,
    pub mouse: MouseState,
    pub gpu: Option<GpuResources>,
    /// Where the last pointer-down landed, in normalized device coordinates.
    pub last_pointer_ndc: Option<[f32; 2]>,
    settings: CompositorSettings,
    limits: OrbitLimits,
    rotate_sensitivity: f32,
    zoom_speed: f32,
    builder: SceneBuilder,
}

impl RenderContext {
    /// Build the CPU side of the viewer. The camera starts at the first point
    /// of the scripted orbit.
    pub fn new(config: &Config, width: u32, height: u32, scale_factor: f64) -> Self {
        let surface = SurfaceWrapper::new(width, height, scale_factor);
        let mut camera = Camera::new(
            config.camera.fov_y_degrees,
            surface.aspect_ratio(),
            config.camera.near,
            config.camera.far,
        );
        let driver = FrameDriver::new(config.camera.orbit_radius, config.camera.orbit_speed);
        driver.advance(&mut camera, Instant::now());

        Self {
            camera,
            scene: SceneGraph::new(),
            driver,
            controls: None,
            redraw: RedrawQueue::new(),
            surface,
            mouse: MouseState::new(),
            gpu: None,
            last_pointer_ndc: None,
            settings: compositor_settings(config),
            limits: OrbitLimits {
                min_distance: config.controls.min_distance,
                max_distance: config.controls.max_distance,
                max_polar_angle: config.controls.max_polar_angle,
            },
            rotate_sensitivity: config.controls.rotate_sensitivity,
            zoom_speed: config.controls.zoom_speed,
            builder: SceneBuilder::new(),
        }
    }

    /// Build the compositor for `gpu` at the current surface size.
    pub fn attach_gpu(&mut self, gpu: GpuContext) {
        let size = self.surface.physical_size();
        let compositor = Compositor::new(
            &gpu.device,
            gpu.surface_format,
            size.width,
            size.height,
            self.settings.clone(),
        );
        info!(
            "Compositor ready at {}x{} ({:?})",
            size.width, size.height, gpu.surface_format
        );
        self.gpu = Some(GpuResources { gpu, compositor });
    }

    pub fn request_redraw(&mut self, reason: RedrawReason) -> bool {
        self.redraw.request(reason)
    }

    /// Apply a window resize to every target. Returns whether the window
    /// should be asked for a redraw; repeated sizes are ignored.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> bool {
        let Some(resize) = self.surface.handle_resize(width, height) else {
            return false;
        };
        self.apply_size(resize.physical.width, resize.physical.height);
        self.request_redraw(RedrawReason::Resize)
    }

    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
        width: u32,
        height: u32,
    ) -> bool {
        let Some(resize) = self
            .surface
            .handle_scale_factor_changed(scale_factor, width, height)
        else {
            return false;
        };
        self.apply_size(resize.physical.width, resize.physical.height);
        self.request_redraw(RedrawReason::Resize)
    }

    fn apply_size(&mut self, width: u32, height: u32) {
        self.camera.set_aspect_ratio(width, height);
        if let Some(resources) = &mut self.gpu {
            resources.gpu.resize(width, height);
            resources
                .compositor
                .resize(&resources.gpu.device, width, height);
        }
        debug!("Viewport resized to {width}x{height}");
    }

    /// Replace the scene with `records` and queue a redraw. The bool is
    /// whether the window needs to be asked for it.
    pub fn populate(&mut self, records: &[StarRecord]) -> (BuildSummary, bool) {
        let summary = self.builder.build(records, &mut self.scene);
        info!(
            stars = summary.stars,
            fallback_colors = summary.fallback_colors,
            released = summary.released,
            "Scene populated"
        );
        (summary, self.request_redraw(RedrawReason::ScenePopulated))
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) -> bool {
        self.mouse.on_cursor_moved(x, y);
        let drag = self.mouse.take_drag();
        let changed = self
            .controls
            .as_mut()
            .is_some_and(|controls| controls.rotate(drag));
        self.controls_changed(changed)
    }

    /// A pointer-down records its normalized position. The first one ends the
    /// scripted orbit and seeds the controls from the camera.
    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let Some(down) = self.mouse.on_button(button, state) else {
            return;
        };
        let ndc = self
            .surface
            .to_ndc(down.position.x as f64, down.position.y as f64);
        self.last_pointer_ndc = Some(ndc);
        debug!(x = ndc[0], y = ndc[1], "Pointer down");

        if self.driver.on_pointer_down() {
            let mut controls =
                OrbitControls::from_camera_position(self.camera.position, Vec3::ZERO, self.limits);
            controls.rotate_sensitivity = self.rotate_sensitivity;
            controls.zoom_speed = self.zoom_speed;
            self.controls = Some(controls);
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) -> bool {
        self.mouse.on_scroll(delta);
        let lines = self.mouse.take_scroll();
        let changed = self
            .controls
            .as_mut()
            .is_some_and(|controls| controls.zoom(lines));
        self.controls_changed(changed)
    }

    fn controls_changed(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        if let Some(controls) = &self.controls {
            self.camera.position = controls.position();
            self.camera.look_at(controls.target());
        }
        self.request_redraw(RedrawReason::ControlChange)
    }

    /// Run one frame: drive the camera if still animating, then render.
    ///
    /// While animating, the next frame is queued before returning; the bool
    /// reports whether the window needs to be asked for it.
    pub fn frame(&mut self, now: Instant) -> Result<(FrameOutcome, bool), SurfaceError> {
        let reasons = self.redraw.take();
        tracing::trace!(?reasons, "Frame");

        let animating = self.driver.advance(&mut self.camera, now);
        let outcome = self.render()?;
        let reschedule = animating && self.request_redraw(RedrawReason::Animation);
        Ok((outcome, reschedule))
    }

    /// Record and submit one frame. An empty scene renders the cleared background.
    pub fn render(&mut self) -> Result<FrameOutcome, SurfaceError> {
        let Some(resources) = self.gpu.as_mut() else {
            return Ok(FrameOutcome::NoSurface);
        };
        let surface_texture = resources.gpu.get_current_texture()?;
        let mut frame = FrameEncoder::new(&resources.gpu.device, surface_texture);
        let (encoder, view) = frame.parts();
        resources.compositor.render(
            &resources.gpu.device,
            &resources.gpu.queue,
            encoder,
            &self.camera,
            &self.scene,
            view,
        );
        frame.submit(&resources.gpu.queue);
        Ok(FrameOutcome::Presented)
    }
}
