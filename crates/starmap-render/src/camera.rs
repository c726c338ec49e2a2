//! Perspective camera with reverse-Z projection.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4Swizzles};

/// Camera data uploaded once per pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// A perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Orientation as a unit quaternion. Looks down -Z at identity.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect_ratio: f32,
    /// Near clip distance (positive).
    pub near: f32,
    /// Far clip distance (positive, greater than near).
    pub far: f32,
}

impl Camera {
    /// Build a camera from a field of view in degrees.
    pub fn new(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    /// Orient the camera toward `target`, keeping +Y as up.
    ///
    /// Does nothing when the target coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_to_rh(self.position, forward, up);
        self.rotation = Quat::from_mat4(&view.inverse()).normalize();
    }

    /// Inverse of the camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)).inverse()
    }

    /// Perspective projection with near and far swapped, so the near plane
    /// maps to depth 1 and the far plane to 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Project a world-space point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera or outside the clip volume.
    pub fn project_to_ndc(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let inside = ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0 && (0.0..=1.0).contains(&ndc.z);
        inside.then_some(ndc)
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(40.0, 16.0 / 9.0, 1.0, 200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit_camera() -> Camera {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 0.0, 30.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(21.0, 0.0, 21.0);
        camera.look_at(Vec3::ZERO);
        let expected = (-camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-5);
        assert!(camera.up().y > 0.9);
    }

    #[test]
    fn test_look_at_straight_down_is_stable() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 10.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert!((camera.forward() - Vec3::NEG_Y).length() < 1e-5);
        assert!(camera.rotation.is_finite());
    }

    #[test]
    fn test_look_at_same_point_keeps_rotation() {
        let mut camera = orbit_camera();
        let before = camera.rotation;
        camera.look_at(camera.position);
        assert_eq!(camera.rotation, before);
    }

    #[test]
    fn test_reverse_z_near_maps_to_one_far_to_zero() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();

        let near = proj * glam::Vec4::new(0.0, 0.0, -camera.near, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-5);

        let far = proj * glam::Vec4::new(0.0, 0.0, -camera.far, 1.0);
        assert!((far.z / far.w).abs() < 1e-5);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = orbit_camera();
        let ndc = camera.project_to_ndc(Vec3::ZERO).unwrap();
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_culled() {
        let camera = orbit_camera();
        assert!(camera.project_to_ndc(Vec3::new(0.0, 0.0, 40.0)).is_none());
    }

    #[test]
    fn test_point_outside_frustum_is_culled() {
        let camera = orbit_camera();
        assert!(camera.project_to_ndc(Vec3::new(500.0, 0.0, 0.0)).is_none());
        // Beyond the far plane.
        assert!(camera.project_to_ndc(Vec3::new(0.0, 0.0, -500.0)).is_none());
    }

    #[test]
    fn test_set_aspect_ratio_guards_zero() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920, 0);
        assert_eq!(camera.aspect_ratio, 1920.0);
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }
}
