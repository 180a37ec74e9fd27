use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::light::LightId;
use crate::render::{GeometryHandle, Program};
use crate::transform::Transform;

/// Index of a [`Model`] inside its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Phong surface parameters of a lit drawable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub base_color: Vec3,
    pub specular: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::splat(0.8),
            specular: Vec3::splat(0.5),
        }
    }
}

/// Registration parameters for a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDesc {
    pub name: String,
    pub transform: Transform,
    pub material: Material,
    /// Follows the per-frame translation parameters and spins about Y.
    pub animated: bool,
}

impl ModelDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            material: Material::default(),
            animated: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }
}

/// Uploaded geometry placed in the world. Lit and shadow drawables of the
/// same model share its transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub geometry: GeometryHandle,
    pub transform: Transform,
    pub animated: bool,
}

/// A renderable unit: one model drawn with one program for one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub model: ModelId,
    pub program: Program,
    pub material: Material,
    pub light: LightId,
}

impl Drawable {
    /// Drawable for the lit sub-pass.
    pub fn lit(model: ModelId, light: LightId, material: Material) -> Self {
        Self {
            model,
            program: Program::Lit,
            material,
            light,
        }
    }

    /// Depth-only counterpart for the shadow sub-pass.
    pub fn shadow_caster(model: ModelId, light: LightId) -> Self {
        Self {
            model,
            program: Program::ShadowDepth,
            material: Material::default(),
            light,
        }
    }

    pub fn is_bound_to(&self, light: LightId) -> bool {
        self.light == light
    }
}
