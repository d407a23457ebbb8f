use crate::scene::Aabb;
use glam::{Mat4, Vec3};

const FOV_Y_DEG: f32 = 60.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

const ORBIT_SPEED: f32 = 0.005; // rad per pixel of drag
const ZOOM_SPEED: f32 = 0.1;
const DAMPING: f32 = 8.0; // velocity decay per second
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit controller: yaw/pitch/distance around a target, with inertia.
/// Pointer drags and scroll feed velocities; the render loop advances them
/// every frame so releasing the pointer coasts to a stop.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            target,
            yaw,
            pitch,
            distance,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
        }
    }

    /// Auto-framing: back off from the box center along the (1,1,1) diagonal
    /// by 1.5x the largest extent. An absent or zero-size box leaves the
    /// camera at the origin looking at the origin.
    pub fn frame_bounds(&mut self, bounds: Option<Aabb>) {
        let (center, distance) = match bounds {
            Some(aabb) => (aabb.center(), aabb.max_extent() * 1.5),
            None => (Vec3::ZERO, 0.0),
        };
        self.target = center;
        self.distance = distance;
        // normalize(1,1,1): pitch = asin(1/sqrt(3)), yaw = 45 degrees.
        self.pitch = (1.0 / 3.0f32.sqrt()).asin();
        self.yaw = std::f32::consts::FRAC_PI_4;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.zoom_velocity = 0.0;
    }

    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        );
        self.target + offset * self.distance
    }

    pub fn on_drag(&mut self, dx: f32, dy: f32) {
        self.yaw_velocity += dx * ORBIT_SPEED;
        self.pitch_velocity += dy * ORBIT_SPEED;
    }

    pub fn on_scroll(&mut self, delta: f32) {
        self.zoom_velocity += delta * ZOOM_SPEED;
    }

    /// Advances damping; called once per frame by the render loop.
    pub fn update(&mut self, dt: f32) {
        self.yaw += self.yaw_velocity;
        self.pitch = (self.pitch + self.pitch_velocity).clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = (self.distance * (-self.zoom_velocity).exp()).clamp(0.0, FAR);

        let decay = (-DAMPING * dt.max(0.0)).exp();
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        self.zoom_velocity *= decay;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.position();
        if self.distance <= f32::EPSILON {
            // Degenerate framing (empty scene): look down -Z from the target.
            return Mat4::look_to_rh(eye, Vec3::NEG_Z, Vec3::Y);
        }
        Mat4::look_at_rh(eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect.max(1e-3), NEAR, FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, std::f32::consts::FRAC_PI_4, 0.5, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_matches_the_diagonal_formula() {
        let mut camera = OrbitCamera::default();
        let aabb = Aabb::new(Vec3::new(-50.0, -75.0, -50.0), Vec3::new(50.0, 75.0, 50.0));
        camera.frame_bounds(Some(aabb));

        let expected = aabb.center() + Vec3::ONE.normalize() * 1.5 * aabb.max_extent();
        assert!((camera.position() - expected).length() < 1e-3);
        assert_eq!(camera.target, aabb.center());
    }

    #[test]
    fn framing_an_offcenter_box_targets_its_center() {
        let mut camera = OrbitCamera::default();
        let aabb = Aabb::new(Vec3::new(10.0, 20.0, 30.0), Vec3::new(30.0, 40.0, 50.0));
        camera.frame_bounds(Some(aabb));

        let expected = Vec3::new(20.0, 30.0, 40.0) + Vec3::ONE.normalize() * 1.5 * 20.0;
        assert!((camera.position() - expected).length() < 1e-3);
    }

    #[test]
    fn empty_scene_leaves_camera_at_origin() {
        let mut camera = OrbitCamera::default();
        camera.frame_bounds(None);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.target, Vec3::ZERO);
        // Degenerate view must still be finite.
        assert!(camera
            .view_matrix()
            .to_cols_array()
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn drag_velocity_decays_over_time() {
        let mut camera = OrbitCamera::default();
        let start_yaw = camera.yaw;
        camera.on_drag(100.0, 0.0);
        for _ in 0..240 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.yaw != start_yaw);
        let settled = camera.yaw;
        camera.update(1.0 / 60.0);
        assert!((camera.yaw - settled).abs() < 1e-3);
    }

    #[test]
    fn pitch_clamps_short_of_the_poles() {
        let mut camera = OrbitCamera::default();
        camera.on_drag(0.0, 1.0e6);
        camera.update(1.0 / 60.0);
        assert!(camera.pitch <= MAX_PITCH);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn projection_is_perspective_with_finite_terms() {
        let camera = OrbitCamera::default();
        let m = camera.view_projection(16.0 / 9.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
