use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// View and projection supplied by the camera collaborator each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraSettings::default().params(1.0)
    }
}

/// Fixed perspective camera looking at a target point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(30.0, 30.0, 30.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 75.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

impl CameraSettings {
    pub fn params(&self, aspect: f32) -> CameraParams {
        CameraParams {
            view: Mat4::look_at_rh(self.position, self.target, self.up),
            projection: Mat4::perspective_rh(
                self.fov_degrees.to_radians(),
                aspect.max(0.01),
                self.near,
                self.far,
            ),
            position: self.position,
        }
    }
}
