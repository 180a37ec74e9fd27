use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Translation, Euler rotation (radians) and scale of a renderable object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub translate: Vec3,
    #[serde(default)]
    pub rotate: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: default_scale(),
        }
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl Transform {
    pub fn new(translate: Vec3, rotate: Vec3, scale: Vec3) -> Self {
        Self {
            translate,
            rotate,
            scale,
        }
    }

    pub fn from_translation(translate: Vec3) -> Self {
        Self {
            translate,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation applied by the model matrix: yaw first, then pitch, then roll.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotate.y, self.rotate.x, self.rotate.z)
    }

    /// Builds the `T * R * S` model matrix.
    pub fn to_model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::default().to_model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scales_before_translating() {
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::splat(2.0));
        let point = transform.to_model_matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn composes_translate_rotate_scale() {
        let transform = Transform::new(
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::splat(3.0),
        );
        let expected = Mat4::from_translation(transform.translate)
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2)
            * Mat4::from_scale(transform.scale);
        let actual = transform.to_model_matrix();
        assert!(actual.abs_diff_eq(expected, 1e-5));
    }
}
