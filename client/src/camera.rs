use glam::{Mat4, Vec3};

use crate::config::*;

/// Third-person camera orbiting the player. `yaw` turns around the
/// vertical axis, `elevation` tilts above the horizon.
pub struct FollowCamera {
    pub yaw: f32,
    pub elevation: f32,
    pub distance: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl FollowCamera {
    pub fn new(target: Vec3) -> Self {
        let mut camera = Self {
            yaw: 0.0,
            elevation: CAMERA_HEIGHT.atan2(CAMERA_BACK),
            distance: Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_BACK).length(),
            position: Vec3::ZERO,
            target,
        };
        camera.position = target + camera.offset();
        camera
    }

    /// Offset from the target to the desired eye position. With the
    /// default yaw this is (0, CAMERA_HEIGHT, CAMERA_BACK).
    pub fn offset(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        Vec3::new(sin_yaw * cos_el, sin_el, cos_yaw * cos_el) * self.distance
    }

    pub fn apply_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * MOUSE_SENSITIVITY;
        self.yaw = self.yaw.rem_euclid(std::f32::consts::TAU);
        self.elevation = (self.elevation + dy * MOUSE_SENSITIVITY)
            .clamp(CAMERA_MIN_ELEVATION, CAMERA_MAX_ELEVATION);
    }

    pub fn update(&mut self, dt: f32, target: Vec3) {
        self.target = target;
        let desired = target + self.offset();
        let t = 1.0 - (1.0 - CAMERA_SMOOTHING).powf(dt * 60.0);
        self.position = self.position.lerp(desired, t.clamp(0.0, 1.0));
    }

    /// Snaps to the desired position, used after respawns.
    pub fn reset(&mut self, target: Vec3) {
        self.target = target;
        self.position = target + self.offset();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            CAMERA_FOV_DEGREES.to_radians(),
            aspect.max(1e-3),
            CAMERA_NEAR,
            CAMERA_FAR,
        )
    }
}

/// Forward and right unit vectors on the ground plane for a camera yaw.
/// Forward looks from the camera towards its target; right is `forward x up`.
pub fn horizontal_basis(yaw: f32) -> (Vec3, Vec3) {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let forward = Vec3::new(-sin_yaw, 0.0, -cos_yaw);
    (forward, forward.cross(Vec3::Y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_matches_follow_offset() {
        let camera = FollowCamera::new(Vec3::ZERO);
        let offset = camera.offset();
        assert!((offset - Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_BACK)).length() < 1e-4);
        assert!((camera.position - offset).length() < 1e-4);
    }

    #[test]
    fn forward_and_right_at_default_yaw() {
        let camera = FollowCamera::new(Vec3::ZERO);
        let (forward, right) = horizontal_basis(camera.yaw);
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((right - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn forward_points_away_from_camera() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        camera.apply_mouse(200.0, 0.0);
        let horizontal = Vec3::new(camera.offset().x, 0.0, camera.offset().z).normalize();
        assert!((horizontal_basis(camera.yaw).0 + horizontal).length() < 1e-4);
    }

    #[test]
    fn elevation_is_clamped() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        camera.apply_mouse(0.0, 1.0e6);
        assert_eq!(camera.elevation, CAMERA_MAX_ELEVATION);
        camera.apply_mouse(0.0, -1.0e6);
        assert_eq!(camera.elevation, CAMERA_MIN_ELEVATION);
    }

    #[test]
    fn smoothing_closes_a_tenth_per_frame() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        let start = camera.position;
        let target = Vec3::new(10.0, 0.0, 0.0);
        camera.update(1.0 / 60.0, target);
        let desired = target + camera.offset();
        let expected = start.lerp(desired, CAMERA_SMOOTHING);
        assert!((camera.position - expected).length() < 1e-4);
    }

    #[test]
    fn smoothing_is_frame_rate_independent() {
        let target = Vec3::new(0.0, 0.0, -20.0);
        let mut fast = FollowCamera::new(Vec3::ZERO);
        for _ in 0..4 {
            fast.update(1.0 / 120.0, target);
        }
        let mut slow = FollowCamera::new(Vec3::ZERO);
        slow.update(1.0 / 30.0, target);
        assert!((fast.position - slow.position).length() < 1e-3);
    }
}
