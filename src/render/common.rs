use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::geometry::Geometry;
use crate::shadow::ShadowTechnique;

/// Handle to geometry resident in the graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub(crate) u32);

impl GeometryHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a depth-only shadow framebuffer owned by a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowMapId(pub(crate) u32);

impl ShadowMapId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Render target selected by [`GraphicsContext::bind_framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferId {
    Main,
    Shadow(ShadowMapId),
}

/// How a draw combines with what the bound framebuffer already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Overwrite the destination (blending disabled).
    #[default]
    Replace,
    /// `src * ONE + dst * ONE`.
    AdditiveSum,
}

impl BlendMode {
    /// Blend mode of the lit sub-pass for the light at `position` in the
    /// registration order. Only the first light replaces.
    pub fn for_light_position(position: usize) -> Self {
        if position == 0 {
            Self::Replace
        } else {
            Self::AdditiveSum
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthTest {
    #[default]
    Disabled,
    /// Fragments at equal or nearer depth win.
    LessEqual,
}

/// Shader programs understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    /// Blinn-Phong shading with a shadow-map visibility term.
    Lit,
    /// Writes light-space depth only.
    ShadowDepth,
    /// Flat emissive color, used for light markers.
    Emissive,
}

/// A single uniform assignment on the current program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Model(Mat4),
    View(Mat4),
    Projection(Mat4),
    CameraPosition(Vec3),
    LightMvp(Mat4),
    LightPosition(Vec3),
    LightColor(Vec3),
    LightIntensity(f32),
    ShadowClass(ShadowTechnique),
    ShadowMap(Option<ShadowMapId>),
    BaseColor(Vec3),
    Specular(Vec3),
    Emissive(Vec3),
}

/// Uniform state of one program. Values persist until overwritten, the
/// way an immediate-mode context keeps them between draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSet {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light_mvp: Mat4,
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub shadow_class: ShadowTechnique,
    pub shadow_map: Option<ShadowMapId>,
    pub base_color: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
}

impl Default for UniformSet {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            light_mvp: Mat4::IDENTITY,
            light_position: Vec3::ZERO,
            light_color: Vec3::ONE,
            light_intensity: 0.0,
            shadow_class: ShadowTechnique::default(),
            shadow_map: None,
            base_color: Vec3::ONE,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
        }
    }
}

impl UniformSet {
    pub fn apply(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Model(value) => self.model = value,
            Uniform::View(value) => self.view = value,
            Uniform::Projection(value) => self.projection = value,
            Uniform::CameraPosition(value) => self.camera_position = value,
            Uniform::LightMvp(value) => self.light_mvp = value,
            Uniform::LightPosition(value) => self.light_position = value,
            Uniform::LightColor(value) => self.light_color = value,
            Uniform::LightIntensity(value) => self.light_intensity = value,
            Uniform::ShadowClass(value) => self.shadow_class = value,
            Uniform::ShadowMap(value) => self.shadow_map = value,
            Uniform::BaseColor(value) => self.base_color = value,
            Uniform::Specular(value) => self.specular = value,
            Uniform::Emissive(value) => self.emissive = value,
        }
    }
}

/// Immediate-mode graphics API consumed by the renderer.
///
/// State set through these calls (bound framebuffer, blend mode, depth test,
/// program, uniforms) persists until it is changed again. Only the resource
/// creation calls can fail; everything issued inside a frame is infallible.
pub trait GraphicsContext {
    fn create_shadow_framebuffer(&mut self, resolution: u32) -> Result<ShadowMapId, SetupError>;

    fn upload_geometry(&mut self, geometry: &Geometry) -> Result<GeometryHandle, SetupError>;

    fn bind_framebuffer(&mut self, target: FramebufferId);

    /// Clears color and depth of the bound framebuffer.
    fn clear(&mut self, color: Vec4, depth: f32);

    fn set_depth_test(&mut self, test: DepthTest);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn use_program(&mut self, program: Program);

    fn set_uniform(&mut self, uniform: Uniform);

    fn draw_indexed(&mut self, geometry: GeometryHandle);
}
