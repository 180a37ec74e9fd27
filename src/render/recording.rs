use std::collections::HashMap;

use glam::Vec4;
use log::warn;

use crate::error::SetupError;
use crate::geometry::Geometry;

use super::common::{
    BlendMode, DepthTest, FramebufferId, GeometryHandle, GraphicsContext, Program, ShadowMapId,
    Uniform, UniformSet,
};

/// Command issued against a [`RecordingContext`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateShadowFramebuffer { id: ShadowMapId, resolution: u32 },
    UploadGeometry { handle: GeometryHandle, index_count: usize },
    BindFramebuffer(FramebufferId),
    Clear { color: Vec4, depth: f32 },
    SetDepthTest(DepthTest),
    SetBlendMode(BlendMode),
    UseProgram(Program),
    SetUniform(Uniform),
    DrawIndexed(GeometryHandle),
}

/// Snapshot of the context state at the moment of a draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub target: FramebufferId,
    pub program: Program,
    pub blend: BlendMode,
    pub depth_test: DepthTest,
    pub geometry: GeometryHandle,
    pub uniforms: UniformSet,
}

/// Headless graphics context that records every call instead of drawing.
///
/// Used by the headless CLI mode and by tests to check pass ordering and
/// uniform values without a GPU.
#[derive(Debug)]
pub struct RecordingContext {
    commands: Vec<Command>,
    draws: Vec<DrawCall>,
    bound: FramebufferId,
    blend: BlendMode,
    depth_test: DepthTest,
    program: Option<Program>,
    uniforms: HashMap<Program, UniformSet>,
    shadow_maps: Vec<u32>,
    geometries: Vec<usize>,
    fail_shadow_allocation: bool,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            draws: Vec::new(),
            bound: FramebufferId::Main,
            blend: BlendMode::Replace,
            depth_test: DepthTest::Disabled,
            program: None,
            uniforms: HashMap::new(),
            shadow_maps: Vec::new(),
            geometries: Vec::new(),
            fail_shadow_allocation: false,
        }
    }

    /// A context whose shadow framebuffer allocations always fail.
    pub fn failing_shadow_allocation() -> Self {
        Self {
            fail_shadow_allocation: true,
            ..Self::new()
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Draws issued into `target`.
    pub fn draws_into(&self, target: FramebufferId) -> impl Iterator<Item = &DrawCall> + '_ {
        self.draws.iter().filter(move |draw| draw.target == target)
    }

    /// Number of times `target` was bound.
    pub fn bind_count(&self, target: FramebufferId) -> usize {
        self.commands
            .iter()
            .filter(|command| **command == Command::BindFramebuffer(target))
            .count()
    }

    pub fn shadow_map_resolution(&self, id: ShadowMapId) -> Option<u32> {
        self.shadow_maps.get(id.index()).copied()
    }

    /// Forgets recorded frame commands while keeping allocated resources.
    pub fn reset_log(&mut self) {
        self.commands.clear();
        self.draws.clear();
    }
}

impl GraphicsContext for RecordingContext {
    fn create_shadow_framebuffer(&mut self, resolution: u32) -> Result<ShadowMapId, SetupError> {
        if self.fail_shadow_allocation {
            return Err(SetupError::ShadowFramebuffer {
                resolution,
                reason: "allocation disabled for this context".to_string(),
            });
        }
        if resolution == 0 {
            return Err(SetupError::ShadowFramebuffer {
                resolution,
                reason: "resolution must be non-zero".to_string(),
            });
        }
        let id = ShadowMapId(self.shadow_maps.len() as u32);
        self.shadow_maps.push(resolution);
        self.commands
            .push(Command::CreateShadowFramebuffer { id, resolution });
        Ok(id)
    }

    fn upload_geometry(&mut self, geometry: &Geometry) -> Result<GeometryHandle, SetupError> {
        geometry.validate().map_err(SetupError::GeometryUpload)?;
        let handle = GeometryHandle(self.geometries.len() as u32);
        self.geometries.push(geometry.index_count());
        self.commands.push(Command::UploadGeometry {
            handle,
            index_count: geometry.index_count(),
        });
        Ok(handle)
    }

    fn bind_framebuffer(&mut self, target: FramebufferId) {
        self.bound = target;
        self.commands.push(Command::BindFramebuffer(target));
    }

    fn clear(&mut self, color: Vec4, depth: f32) {
        self.commands.push(Command::Clear { color, depth });
    }

    fn set_depth_test(&mut self, test: DepthTest) {
        self.depth_test = test;
        self.commands.push(Command::SetDepthTest(test));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.commands.push(Command::SetBlendMode(mode));
    }

    fn use_program(&mut self, program: Program) {
        self.program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        self.commands.push(Command::SetUniform(uniform));
        match self.program {
            Some(program) => self.uniforms.entry(program).or_default().apply(uniform),
            None => warn!("uniform {uniform:?} set with no program bound"),
        }
    }

    fn draw_indexed(&mut self, geometry: GeometryHandle) {
        self.commands.push(Command::DrawIndexed(geometry));
        let Some(program) = self.program else {
            warn!("draw of {geometry:?} skipped: no program bound");
            return;
        };
        if geometry.index() >= self.geometries.len() {
            warn!("draw of {geometry:?} skipped: geometry was never uploaded");
            return;
        }
        self.draws.push(DrawCall {
            target: self.bound,
            program,
            blend: self.blend,
            depth_test: self.depth_test,
            geometry,
            uniforms: self.uniforms.get(&program).copied().unwrap_or_default(),
        });
    }
}
