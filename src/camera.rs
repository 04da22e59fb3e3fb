//! A first-person fly camera driven by mouse drag, scroll and held keys.
//!
//! [`FlyCamera`] keeps yaw/pitch in degrees and derives its facing direction
//! from them. Rotation only happens while a look-drag is active (right mouse
//! button held). The first cursor sample after a drag starts is swallowed so
//! the view does not jump to wherever the cursor was when the button went down.
//!
//! # Example
//!
//! ```
//! use pbr_bloom::{CameraSettings, FlyCamera};
//!
//! let mut camera = FlyCamera::new(CameraSettings::default());
//! camera.set_drag(true);
//! camera.cursor_moved(400.0, 300.0); // swallowed
//! camera.cursor_moved(410.0, 300.0); // turns right
//! assert!(camera.yaw() > -90.0);
//! ```

use glam::{Mat4, Vec2, Vec3};
use winit::keyboard::KeyCode;

use crate::input::HeldKeys;

/// Starting pose and tuning for a [`FlyCamera`].
#[derive(Clone, Debug)]
pub struct CameraSettings {
    pub position: Vec3,
    /// Yaw in degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of rotation per pixel of cursor travel.
    pub sensitivity: f32,
    /// World units per second.
    pub move_speed: f32,
    pub pitch_limit: f32,
    pub fov_min: f32,
    pub fov_max: f32,
    /// Cursor position assumed before the first move event arrives.
    pub initial_cursor: Vec2,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 10.0),
            yaw: -90.0,
            pitch: -10.0,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            sensitivity: 0.18,
            move_speed: 4.0,
            pitch_limit: 89.0,
            fov_min: 15.0,
            fov_max: 90.0,
            initial_cursor: Vec2::new(400.0, 300.0),
        }
    }
}

impl CameraSettings {
    pub fn position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn orientation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    pub fn fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }
}

/// Fly camera state. Mutated only by input and per-frame integration.
#[derive(Clone, Debug)]
pub struct FlyCamera {
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    drag_active: bool,
    first_sample: bool,
    last_cursor: Vec2,
    settings: CameraSettings,
}

impl FlyCamera {
    pub fn new(settings: CameraSettings) -> Self {
        let pitch = settings
            .pitch
            .clamp(-settings.pitch_limit, settings.pitch_limit);
        let fov = settings.fov.clamp(settings.fov_min, settings.fov_max);
        Self {
            position: settings.position,
            front: facing(settings.yaw, pitch),
            up: Vec3::Y,
            yaw: settings.yaw,
            pitch,
            fov,
            drag_active: false,
            first_sample: false,
            last_cursor: settings.initial_cursor,
            settings,
        }
    }

    /// Start or stop a look-drag.
    ///
    /// Starting a drag arms first-sample suppression.
    pub fn set_drag(&mut self, active: bool) {
        if active && !self.drag_active {
            self.first_sample = true;
        }
        self.drag_active = active;
    }

    /// Feed a cursor position in window coordinates (y grows downward).
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let cursor = Vec2::new(x, y);
        if !self.drag_active {
            self.last_cursor = cursor;
            return;
        }
        if self.first_sample {
            self.first_sample = false;
            self.last_cursor = cursor;
            return;
        }

        let dx = (cursor.x - self.last_cursor.x) * self.settings.sensitivity;
        let dy = (self.last_cursor.y - cursor.y) * self.settings.sensitivity;
        self.last_cursor = cursor;

        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-self.settings.pitch_limit, self.settings.pitch_limit);
        self.front = facing(self.yaw, self.pitch);
    }

    /// Apply a vertical scroll delta in lines. Scrolling up zooms in.
    pub fn scroll(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(self.settings.fov_min, self.settings.fov_max);
    }

    /// Move along the camera axes for every held movement key.
    pub fn integrate(&mut self, keys: &HeldKeys, dt: f32) {
        let step = self.settings.move_speed * dt;
        let right = self.right();

        if keys.is_down(KeyCode::KeyW) {
            self.position += self.front * step;
        }
        if keys.is_down(KeyCode::KeyS) {
            self.position -= self.front * step;
        }
        if keys.is_down(KeyCode::KeyA) {
            self.position -= right * step;
        }
        if keys.is_down(KeyCode::KeyD) {
            self.position += right * step;
        }
        if keys.is_down(KeyCode::KeyE) {
            self.position += self.up * step;
        }
        if keys.is_down(KeyCode::KeyQ) {
            self.position -= self.up * step;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection in wgpu clip space (depth 0..1).
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            aspect,
            self.settings.near,
            self.settings.far,
        )
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize_or_zero()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_active
    }
}

/// Spherical to Cartesian, angles in degrees.
fn facing(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}
