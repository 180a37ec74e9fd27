mod common;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;
pub mod recording;
mod shared;

pub use common::{
    BlendMode, DepthTest, FramebufferId, GeometryHandle, GraphicsContext, Program, ShadowMapId,
    Uniform, UniformSet,
};
#[cfg(not(target_arch = "wasm32"))]
pub use native::WgpuContext;
pub use recording::{Command, DrawCall, RecordingContext};
