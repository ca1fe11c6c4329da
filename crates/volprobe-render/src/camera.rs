//! Fly camera driven by keyboard and mouse input.

use glam::Vec3;
use volprobe_core::{CameraMatrices, CameraSettings};

/// Direction of a movement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// A first-person camera with yaw/pitch mouse look.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Unit view direction.
    pub front: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Heading in degrees.
    pub yaw: f32,
    /// Elevation in degrees, kept within (-89, 89).
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl FlyCamera {
    /// Creates a camera from configuration.
    #[must_use]
    pub fn new(settings: &CameraSettings, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: settings.position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: settings.yaw,
            pitch: settings.pitch.clamp(-89.0, 89.0),
            fov: settings.fov_y.to_radians(),
            aspect_ratio,
            near: settings.near,
            far: settings.far,
            move_speed: settings.move_speed,
            sensitivity: settings.mouse_sensitivity,
        };
        camera.update_front();
        camera
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// The two matrices the renderer consumes.
    #[must_use]
    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices::look_from(
            self.position,
            self.front,
            self.up,
            self.fov,
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    /// Moves the camera for `dt` seconds.
    pub fn process_movement(&mut self, movement: Movement, dt: f32) {
        let distance = self.move_speed * dt;
        let offset = match movement {
            Movement::Forward => self.front,
            Movement::Backward => -self.front,
            Movement::Left => -self.right(),
            Movement::Right => self.right(),
            Movement::Up => self.up,
            Movement::Down => -self.up,
        };
        self.position += offset * distance;
    }

    /// Rotates by a mouse delta in pixels. Screen y grows downward.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-89.0, 89.0);
        self.update_front();
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(&CameraSettings::default(), 4.0 / 3.0)
    }
}
