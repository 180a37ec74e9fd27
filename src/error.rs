use thiserror::Error;

use crate::light::LightId;

/// Fatal problems detected while the scene and graphics resources are set up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("failed to allocate {resolution}x{resolution} shadow framebuffer: {reason}")]
    ShadowFramebuffer { resolution: u32, reason: String },
    #[error("failed to upload geometry: {0}")]
    GeometryUpload(String),
    #[error("invalid light settings: {0}")]
    InvalidLight(String),
    #[error("{0} is already registered")]
    DuplicateLight(LightId),
    #[error("renderer has no lights registered")]
    NoLights,
    #[error("graphics context unavailable: {0}")]
    Unsupported(String),
}

/// Scene wiring mistakes that the frame loop tolerates silently.
///
/// They never abort a frame; [`crate::Scene::audit`] reports them so tests
/// and the headless summary can catch them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationDefect {
    #[error("{pass} drawable for model `{model}` is bound to unknown {light}")]
    UnknownLight {
        pass: &'static str,
        model: String,
        light: LightId,
    },
    #[error("{pass} drawable references unknown model #{model}")]
    UnknownModel { pass: &'static str, model: usize },
    #[error("lit drawable for model `{model}` has no shadow caster for {light}")]
    MissingShadowCaster { model: String, light: LightId },
}
