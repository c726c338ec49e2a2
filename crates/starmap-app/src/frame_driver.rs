//! Scripted camera orbit that runs until the user first touches the view.
//!
//! The driver starts in [`DriverState::Animating`] and moves the camera along
//! a fixed circle in the XZ plane as a pure function of elapsed time. The first
//! pointer-down hands control to the orbit controls for the rest of the session.

use std::time::Instant;

use glam::Vec3;
use starmap_render::Camera;
use tracing::info;

/// Point on the scripted orbit `elapsed_secs` after start.
pub fn orbit_position(elapsed_secs: f32, radius: f32, speed: f32) -> Vec3 {
    let angle = elapsed_secs * speed;
    Vec3::new(angle.sin() * radius, 0.0, angle.cos() * radius)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Camera follows the scripted orbit and every frame schedules the next.
    Animating,
    /// Camera belongs to the orbit controls; frames are rendered on demand.
    Interactive,
}

#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    start: Instant,
    radius: f32,
    speed: f32,
}

impl FrameDriver {
    pub fn new(radius: f32, speed: f32) -> Self {
        Self::starting_at(Instant::now(), radius, speed)
    }

    /// Driver whose elapsed time is measured from `start`.
    pub fn starting_at(start: Instant, radius: f32, speed: f32) -> Self {
        Self {
            state: DriverState::Animating,
            start,
            radius,
            speed,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == DriverState::Animating
    }

    /// Scripted camera position at `now`, or `None` once interactive.
    pub fn position_at(&self, now: Instant) -> Option<Vec3> {
        if !self.is_animating() {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        Some(orbit_position(elapsed, self.radius, self.speed))
    }

    /// Move `camera` along the orbit and aim it at the origin. Returns whether
    /// the camera was driven, which is also whether the loop should reschedule.
    pub fn advance(&self, camera: &mut Camera, now: Instant) -> bool {
        let Some(position) = self.position_at(now) else {
            return false;
        };
        camera.position = position;
        camera.look_at(Vec3::ZERO);
        true
    }

    /// Handle a pointer-down. Returns `true` only for the one call that ends
    /// the animation.
    pub fn on_pointer_down(&mut self) -> bool {
        if self.state == DriverState::Interactive {
            return false;
        }
        self.state = DriverState::Interactive;
        info!("Scripted orbit stopped, camera is now interactive");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_orbit_starts_on_positive_z() {
        assert_eq!(orbit_position(0.0, 30.0, 0.1), Vec3::new(0.0, 0.0, 30.0));
    }

    #[test]
    fn test_orbit_stays_on_circle_in_xz_plane() {
        for step in 0..50 {
            let p = orbit_position(step as f32 * 1.7, 30.0, 0.1);
            assert_eq!(p.y, 0.0);
            assert!((p.length() - 30.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_orbit_quarter_turn() {
        let t = std::f32::consts::FRAC_PI_2 / 0.1;
        let p = orbit_position(t, 30.0, 0.1);
        assert!((p.x - 30.0).abs() < 1e-3);
        assert!(p.z.abs() < 1e-3);
    }

    #[test]
    fn test_successive_frames_follow_elapsed_time() {
        let start = Instant::now();
        let driver = FrameDriver::starting_at(start, 30.0, 0.1);
        let mut camera = Camera::default();

        for secs in [1_u64, 2, 5] {
            let now = start + Duration::from_secs(secs);
            assert!(driver.advance(&mut camera, now));
            let expected = orbit_position(secs as f32, 30.0, 0.1);
            assert!((camera.position - expected).length() < 1e-4);
            // Always aimed at the origin.
            let to_origin = (-camera.position).normalize();
            assert!((camera.forward() - to_origin).length() < 1e-3);
        }
    }

    #[test]
    fn test_pointer_down_transitions_once() {
        let mut driver = FrameDriver::new(30.0, 0.1);
        assert_eq!(driver.state(), DriverState::Animating);
        assert!(driver.on_pointer_down());
        assert_eq!(driver.state(), DriverState::Interactive);
        assert!(!driver.on_pointer_down());
        assert_eq!(driver.state(), DriverState::Interactive);
    }

    #[test]
    fn test_no_automatic_motion_after_transition() {
        let start = Instant::now();
        let mut driver = FrameDriver::starting_at(start, 30.0, 0.1);
        let mut camera = Camera::default();
        driver.advance(&mut camera, start + Duration::from_secs(3));
        let parked = camera.position;

        driver.on_pointer_down();
        assert!(!driver.advance(&mut camera, start + Duration::from_secs(10)));
        assert_eq!(camera.position, parked);
        assert_eq!(driver.position_at(start + Duration::from_secs(20)), None);
    }
}
