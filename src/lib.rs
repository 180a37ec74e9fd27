//! Multi-light forward renderer with per-light shadow maps.
//!
//! Every light owns a depth-only shadow framebuffer. Each frame the
//! [`Renderer`] walks the lights in registration order, renders shadow
//! casters into the light's shadow map and then shades the lit drawables
//! bound to that light, adding each light's contribution onto the first.
//! Drawing goes through the immediate-mode [`render::GraphicsContext`]
//! trait so the frame loop can run against wgpu or a recording backend.

pub mod app;
pub mod camera;
pub mod config;
pub mod drawable;
pub mod error;
pub mod geometry;
pub mod light;
pub mod obj;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod shadow;
pub mod transform;

pub use camera::{CameraParams, CameraSettings};
pub use config::{FrameParams, GeometrySource, ModelSettings, SceneDescription};
pub use drawable::{Drawable, Material, Model, ModelDesc, ModelId};
pub use error::{ConfigurationDefect, SetupError};
pub use geometry::{Geometry, Shape};
pub use light::{Light, LightId, LightKind, LightSettings};
pub use obj::load_obj_from_str;
pub use render::{GraphicsContext, RecordingContext};
pub use renderer::{FrameStats, Renderer};
pub use scene::Scene;
pub use shadow::{ShadowTechnique, ShadowTechniqueError};
pub use transform::Transform;
