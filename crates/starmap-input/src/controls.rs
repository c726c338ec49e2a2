//! Orbit controls: drag to rotate around a target, wheel to zoom.
//!
//! The camera position is kept in spherical coordinates around the target.
//! The polar angle is measured from +Y, so `PI / 2` is the horizon.

use glam::{Vec2, Vec3};

/// Smallest polar angle. Keeps the camera off the pole, where look-at with a
/// +Y up vector degenerates.
pub const MIN_POLAR_ANGLE: f32 = 1e-3;

/// Clamps applied after every update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 100.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

impl OrbitLimits {
    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance.max(self.min_distance))
    }

    fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(MIN_POLAR_ANGLE, self.max_polar_angle.max(MIN_POLAR_ANGLE))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    target: Vec3,
    azimuth: f32,
    polar: f32,
    distance: f32,
    limits: OrbitLimits,
    /// Radians per pixel of drag.
    pub rotate_sensitivity: f32,
    /// Exponential zoom rate per wheel line.
    pub zoom_speed: f32,
}

impl OrbitControls {
    /// Seed the controls from where the camera currently is, so taking over
    /// does not move it. Limits are applied immediately.
    pub fn from_camera_position(position: Vec3, target: Vec3, limits: OrbitLimits) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (azimuth, polar) = if radius > f32::EPSILON {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, std::f32::consts::FRAC_PI_2)
        };

        Self {
            target,
            azimuth,
            polar: limits.clamp_polar(polar),
            distance: limits.clamp_distance(radius),
            limits,
            rotate_sensitivity: 0.005,
            zoom_speed: 0.1,
        }
    }

    /// Apply a drag delta in pixels. Returns whether the camera moved.
    pub fn rotate(&mut self, drag: Vec2) -> bool {
        if drag == Vec2::ZERO {
            return false;
        }
        let azimuth = self.azimuth - drag.x * self.rotate_sensitivity;
        let polar = self
            .limits
            .clamp_polar(self.polar - drag.y * self.rotate_sensitivity);

        let changed = azimuth != self.azimuth || polar != self.polar;
        self.azimuth = azimuth;
        self.polar = polar;
        changed
    }

    /// Apply wheel lines, positive zooming in. Returns whether the camera moved.
    pub fn zoom(&mut self, lines: f32) -> bool {
        if lines == 0.0 {
            return false;
        }
        let distance = self
            .limits
            .clamp_distance(self.distance * (-lines * self.zoom_speed).exp());
        let changed = distance != self.distance;
        self.distance = distance;
        changed
    }

    /// Camera position implied by the current angles and distance.
    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.target
            + self.distance * Vec3::new(sin_polar * sin_azimuth, cos_polar, sin_polar * cos_azimuth)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn limits(&self) -> OrbitLimits {
        self.limits
    }
}
