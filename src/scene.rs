//! Per-frame scene state: the animated model transform and the two lights.
//!
//! Nothing here is stored between frames; everything is a closed-form
//! function of elapsed time.

use glam::{Mat4, Vec3};

/// Animation of the single model.
#[derive(Clone, Debug)]
pub struct SceneParams {
    /// Uniform scale of the model about its own origin.
    pub scale: f32,
    /// Oscillation amplitude along +X, in world units.
    pub walk_amplitude: f32,
    /// Angular speed of the oscillation, radians per second.
    pub walk_speed: f32,
    /// Spin about +Y, degrees per second.
    pub spin_rate: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            scale: 3.0,
            walk_amplitude: 4.0,
            walk_speed: 2.0,
            spin_rate: 60.0,
        }
    }
}

impl SceneParams {
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn walk(mut self, amplitude: f32, speed: f32) -> Self {
        self.walk_amplitude = amplitude;
        self.walk_speed = speed;
        self
    }

    pub fn spin_rate(mut self, degrees_per_second: f32) -> Self {
        self.spin_rate = degrees_per_second;
        self
    }

    /// Model matrix at time `t`: spin in place, scale, then walk along X.
    ///
    /// The walk offset is applied after the scale, so the model origin sits at
    /// exactly `walk_amplitude * cos(walk_speed * t)` on X whatever the scale.
    pub fn model_matrix(&self, t: f32) -> Mat4 {
        let offset = self.walk_amplitude * (self.walk_speed * t).cos();
        Mat4::from_translation(Vec3::new(offset, 0.0, 0.0))
            * Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_rotation_y((self.spin_rate * t).to_radians())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

/// Positions and colors of both lights at time `t`.
pub fn lights_at(t: f32) -> [PointLight; 2] {
    [
        PointLight {
            position: Vec3::new(5.0 * (0.6 * t).cos(), 4.0 + (0.7 * t).sin(), 5.0 * (0.6 * t).sin()),
            color: Vec3::new(1.0, 0.9, 0.7),
        },
        PointLight {
            position: Vec3::new(
                -6.0 * (0.4 * t).cos(),
                3.4 + 0.3 * (0.9 * t).sin(),
                -6.0 * (0.4 * t).sin(),
            ),
            color: Vec3::new(0.4, 0.7, 1.0),
        },
    ]
}

/// Uniform block of the geometry pass (group 0, binding 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal_matrix: [[f32; 4]; 4],
    /// Camera position in xyz, elapsed time in w.
    pub camera_pos_time: [f32; 4],
    pub light_positions: [[f32; 4]; 2],
    pub light_colors: [[f32; 4]; 2],
}

impl SceneUniforms {
    pub fn new(projection: Mat4, view: Mat4, model: Mat4, camera_pos: Vec3, time: f32) -> Self {
        let lights = lights_at(time);
        Self {
            projection: projection.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            camera_pos_time: camera_pos.extend(time).to_array(),
            light_positions: lights.map(|l| l.position.extend(1.0).to_array()),
            light_colors: lights.map(|l| l.color.extend(1.0).to_array()),
        }
    }
}
