//! Code to manage the camera, and to turn screen positions into pick rays.

use core::f32::consts::TAU;

use lin_alg::f32::{Quaternion, Vec3};

use crate::{
    ray::Ray,
    types::{FWD_VEC, RIGHT_VEC, UP_VEC},
};

#[derive(Clone, Debug)]
pub struct Camera {
    pub fov_y: f32,  // Vertical field of view in radians.
    pub aspect: f32, // width / height.
    /// Position in world space; this is what we adjust with move keys.
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate_vec(FWD_VEC)
    }

    pub fn right(&self) -> Vec3 {
        self.orientation.rotate_vec(RIGHT_VEC)
    }

    pub fn up(&self) -> Vec3 {
        self.orientation.rotate_vec(UP_VEC)
    }

    /// Rotate about the camera's own right axis. Angle is in degrees.
    pub fn pitch(&mut self, angle: f32) {
        let rotation = Quaternion::from_axis_angle(-RIGHT_VEC, angle.to_radians());
        self.orientation = (self.orientation * rotation).to_normalized();
    }

    /// Rotate about the world's up axis, so the horizon stays level. Angle is in degrees.
    pub fn yaw(&mut self, angle: f32) {
        let rotation = Quaternion::from_axis_angle(UP_VEC, angle.to_radians());
        self.orientation = (rotation * self.orientation).to_normalized();
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Point the camera at `target`, with no roll.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.magnitude() < f32::EPSILON {
            return;
        }
        let dir = dir.to_normalized();

        let yaw = dir.x.atan2(dir.z);
        let pitch = dir.y.clamp(-1., 1.).asin();

        self.orientation = (Quaternion::from_axis_angle(UP_VEC, yaw)
            * Quaternion::from_axis_angle(-RIGHT_VEC, pitch))
        .to_normalized();
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Convert a screen position to a ray in world space, starting at the camera.
    /// `screen_pos` is normalized to the viewport: (0, 0) is the top left corner, and (1, 1)
    /// the bottom right.
    ///
    /// The canonical use case for this is finding the object in 3D space a user is intending to
    /// select with the cursor.
    pub fn screen_ray(&self, screen_pos: (f32, f32)) -> Ray {
        let half_height = (self.fov_y / 2.).tan();
        let half_width = half_height * self.aspect;

        let x = 2.0 * screen_pos.0 - 1.0;
        let y = 1.0 - 2.0 * screen_pos.1; // Flips the Y so 0 is top, 1 is bottom

        let dir_cam = Vec3::new(x * half_width, y * half_height, 1.);

        Ray::new(self.position, self.orientation.rotate_vec(dir_cam))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0., 0., 0.),
            orientation: Quaternion::new_identity(),
            fov_y: TAU / 6., // Vertical field of view in radians.
            aspect: 4. / 3., // width / height.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Aabb;

    const EPS: f32 = 1e-4;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).magnitude() < EPS
    }

    #[test]
    fn center_ray_points_forward() {
        let mut cam = Camera {
            position: Vec3::new(1., 2., 3.),
            ..Default::default()
        };
        cam.yaw(30.);
        cam.pitch(10.);

        let ray = cam.screen_ray((0.5, 0.5));
        assert!(close(ray.origin, cam.position));
        assert!(close(ray.direction, cam.forward()));
    }

    #[test]
    fn corner_rays_fan_out() {
        let cam = Camera::default();

        let left = cam.screen_ray((0., 0.5)).direction;
        let right = cam.screen_ray((1., 0.5)).direction;
        let top = cam.screen_ray((0.5, 0.)).direction;

        assert!(left.x < 0. && right.x > 0.);
        assert!((left.x + right.x).abs() < EPS);
        assert!(top.y > 0.);
        // The top edge is half the vertical FOV above the view axis.
        assert!((top.y.atan2(top.z) - cam.fov_y / 2.).abs() < EPS);
    }

    #[test]
    fn basis_stays_orthonormal() {
        let mut cam = Camera::default();
        cam.yaw(37.);
        cam.pitch(-12.);
        cam.yaw(-80.);

        let (f, r, u) = (cam.forward(), cam.right(), cam.up());
        assert!((f.magnitude() - 1.).abs() < EPS);
        assert!(f.dot(r).abs() < EPS);
        assert!(f.dot(u).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
    }

    #[test]
    fn yaw_keeps_horizon_level() {
        let mut cam = Camera::default();
        cam.yaw(45.);
        cam.yaw(45.);

        assert!(cam.right().y.abs() < EPS);
        assert!(cam.forward().y.abs() < EPS);
        // A quarter turn puts forward on the old X axis.
        assert!((cam.forward().x.abs() - 1.).abs() < EPS);
    }

    #[test]
    fn look_at_faces_target() {
        let mut cam = Camera {
            position: Vec3::new(1683., 50., 2116.),
            ..Default::default()
        };
        let target = Vec3::new(1963., 50., 1660.);
        cam.look_at(target);

        let expected = (target - cam.position).to_normalized();
        assert!(close(cam.forward(), expected));
        assert!(cam.right().y.abs() < EPS);

        let above = Vec3::new(1683., 80., 2156.);
        cam.look_at(above);
        assert!(close(cam.forward(), (above - cam.position).to_normalized()));
    }

    #[test]
    fn screen_rays_have_no_clip_range() {
        let cam = Camera::default();
        let ray = cam.screen_ray((0.5, 0.5));

        let far_box = Aabb::new(Vec3::new(-1., -1., 99_999.), Vec3::new(1., 1., 100_001.));
        let t = ray.intersect_aabb(&far_box).unwrap();
        assert!((t - 99_999.).abs() < 1.);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = Camera::default();
        cam.set_viewport(1920, 1080);
        assert!((cam.aspect - 16. / 9.).abs() < EPS);

        cam.set_viewport(800, 0);
        assert!((cam.aspect - 16. / 9.).abs() < EPS);
    }
}
