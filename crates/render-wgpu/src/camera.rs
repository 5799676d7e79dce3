use cascadeview_render::RenderView;
use glam::{Mat4, Vec3};

/// Orbit camera around a target, Z up.
///
/// `azimuth` turns around +Z from +X; `elevation` is measured from the XY
/// plane. Camera motion lives outside the scene state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            distance: 1.0,
            azimuth: 0.0,
            elevation: 0.0,
            fovy: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100.0,
            sensitivity: 0.005,
            zoom_speed: 0.1,
        };
        camera.look_from(Vec3::new(0.0, 2.0, 3.464));
        camera
    }
}

impl OrbitCamera {
    const MAX_ELEVATION: f32 = 89.0 * std::f32::consts::PI / 180.0;

    pub fn eye(&self) -> Vec3 {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        self.target + self.distance * Vec3::new(ce * ca, ce * sa, se)
    }

    /// Re-derive orbit angles so the camera sits at `eye`.
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.azimuth = offset.y.atan2(offset.x);
        self.elevation = (offset.z / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Drag rotation in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.sensitivity;
        self.elevation = (self.elevation + dy * self.sensitivity)
            .clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Scroll zoom; positive `steps` move closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = (1.0 - self.zoom_speed).powf(steps);
        self.distance = (self.distance * factor).max(1e-3);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Z)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), self.aspect.max(1e-6), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Column-major camera world matrix.
    pub fn pose(&self) -> [f32; 16] {
        self.view_matrix().inverse().to_cols_array()
    }

    /// Restore from a pose; only its translation is used, the camera keeps
    /// looking at its target.
    pub fn restore_pose(&mut self, pose: &[f32; 16]) {
        let world = Mat4::from_cols_array(pose);
        self.look_from(world.w_axis.truncate());
    }

    pub fn set_lens(&mut self, fovy: f32, near: f32, far: f32) {
        self.fovy = fovy;
        self.near = near;
        self.far = far;
    }

    pub fn render_view(&self, background: [f32; 3]) -> RenderView {
        RenderView {
            eye: self.eye(),
            target: self.target,
            up: Vec3::Z,
            fovy: self.fovy,
            near: self.near,
            far: self.far,
            background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_matches_initial_position() {
        let cam = OrbitCamera::default();
        assert!((cam.eye() - Vec3::new(0.0, 2.0, 3.464)).length() < 1e-4);
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn pose_round_trip() {
        let mut cam = OrbitCamera::default();
        cam.rotate(120.0, -40.0);
        cam.zoom(3.0);
        let pose = cam.pose();

        let mut restored = OrbitCamera::default();
        restored.restore_pose(&pose);
        assert!((restored.eye() - cam.eye()).length() < 1e-4);
    }

    #[test]
    fn elevation_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 1.0e6);
        assert!(cam.elevation <= OrbitCamera::MAX_ELEVATION);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn zoom_moves_closer() {
        let mut cam = OrbitCamera::default();
        let before = cam.distance;
        cam.zoom(1.0);
        assert!(cam.distance < before);
    }

    #[test]
    fn render_view_carries_lens() {
        let mut cam = OrbitCamera::default();
        cam.set_lens(45.0, 0.1, 10.0);
        let view = cam.render_view([0.0; 3]);
        assert_eq!(view.fovy, 45.0);
        assert_eq!(view.up, Vec3::Z);
        assert_eq!(view.eye, cam.eye());
    }
}
