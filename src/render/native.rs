use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec4};
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::error::SetupError;
use crate::geometry::{Geometry, FLOATS_PER_VERTEX};

use super::common::{
    BlendMode, DepthTest, FramebufferId, GeometryHandle, GraphicsContext, Program, ShadowMapId,
    Uniform, UniformSet,
};
use super::shared::SHADER;

/// [`GraphicsContext`] backed by wgpu, drawing into a window surface.
///
/// Calls made during a frame are recorded into one segment per framebuffer
/// binding. [`WgpuContext::end_frame`] encodes each segment as its own render
/// pass, in call order, and presents the result.
pub struct WgpuContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    shader: wgpu::ShaderModule,
    draw_layout: wgpu::BindGroupLayout,
    shadow_sample_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    meshes: Vec<MeshBuffers>,
    shadow_maps: Vec<ShadowTarget>,
    no_shadow_map: ShadowTarget,
    state: ContextState,
    segments: Vec<Segment>,
}

impl WgpuContext {
    /// Creates the surface, device and shared layouts for `window`.
    pub async fn new(window: Arc<Window>) -> Result<Self, SetupError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(SetupError::Unsupported("window has zero area".to_string()));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|err| SetupError::Unsupported(format!("failed to create surface: {err}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| SetupError::Unsupported(format!("failed to acquire GPU adapter: {err}")))?;

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("shadowcaster-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .map_err(|err| SetupError::Unsupported(format!("failed to create GPU device: {err}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(SetupError::Unsupported(
                "surface reports no supported formats".to_string(),
            ));
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(first_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!(
            "configured {}x{} surface with format {surface_format:?}",
            size.width, size.height
        );

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadowcaster-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let shadow_sample_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow-sample-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        // Bound for lit draws whose light has no shadow map; never sampled.
        let no_shadow_map = ShadowTarget::create(&device, &shadow_sample_layout, 1, "no-shadow-map");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            shader,
            draw_layout,
            shadow_sample_layout,
            pipelines: HashMap::new(),
            meshes: Vec::new(),
            shadow_maps: Vec::new(),
            no_shadow_map,
            state: ContextState::default(),
            segments: Vec::new(),
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Width over height of the surface.
    pub fn aspect(&self) -> f32 {
        self.size.width as f32 / self.size.height.max(1) as f32
    }

    /// Resizes the swap chain and main depth buffer.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Reconfigures the surface at its current size.
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    /// Encodes every recorded segment and presents the frame.
    ///
    /// Recorded work is discarded when the surface texture cannot be
    /// acquired.
    pub fn end_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let segments = std::mem::take(&mut self.segments);
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for segment in &segments {
            for draw in &segment.draws {
                if !self.pipelines.contains_key(&draw.key) {
                    let pipeline = self.build_pipeline(draw.key);
                    self.pipelines.insert(draw.key, pipeline);
                }
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        for segment in &segments {
            let bind_groups: Vec<wgpu::BindGroup> = segment
                .draws
                .iter()
                .map(|draw| self.draw_bind_group(&draw.uniforms))
                .collect();

            let (clear_color, clear_depth) = match segment.clear {
                Some((color, depth)) => (Some(color), Some(depth)),
                None => (None, None),
            };
            let depth_ops = Some(wgpu::Operations {
                load: clear_depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            });

            let mut pass = match segment.target {
                FramebufferId::Main => encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("main-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: clear_color.map_or(wgpu::LoadOp::Load, |color| {
                                wgpu::LoadOp::Clear(wgpu::Color {
                                    r: color.x as f64,
                                    g: color.y as f64,
                                    b: color.z as f64,
                                    a: color.w as f64,
                                })
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth.view,
                        depth_ops,
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                }),
                FramebufferId::Shadow(id) => {
                    let Some(target) = self.shadow_maps.get(id.index()) else {
                        warn!("segment for unknown shadow map {id:?} dropped");
                        continue;
                    };
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("shadow-pass"),
                        color_attachments: &[],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &target.view,
                            depth_ops,
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    })
                }
            };

            for (draw, bind_group) in segment.draws.iter().zip(bind_groups.iter()) {
                let (Some(pipeline), Some(mesh)) = (
                    self.pipelines.get(&draw.key),
                    self.meshes.get(draw.geometry.index()),
                ) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                if draw.key.program == Program::Lit {
                    let shadow = draw
                        .uniforms
                        .shadow_map
                        .and_then(|id| self.shadow_maps.get(id.index()))
                        .unwrap_or(&self.no_shadow_map);
                    pass.set_bind_group(1, &shadow.sample_group, &[]);
                }
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn draw_bind_group(&self, uniforms: &UniformSet) -> wgpu::BindGroup {
        let has_shadow_map = uniforms
            .shadow_map
            .is_some_and(|id| id.index() < self.shadow_maps.len());
        let constants = DrawUniforms::new(uniforms, has_shadow_map);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("draw-uniform"),
                contents: bytemuck::bytes_of(&constants),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout: &self.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn build_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let (label, vertex_entry, fragment_entry) = match key.program {
            Program::Lit => ("lit-pipeline", "vs_lit", Some("fs_lit")),
            Program::ShadowDepth => ("shadow-pipeline", "vs_shadow", None),
            Program::Emissive => ("emissive-pipeline", "vs_emissive", Some("fs_emissive")),
        };
        let layout = if key.program == Program::Lit {
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("lit-pipeline-layout"),
                    bind_group_layouts: &[&self.draw_layout, &self.shadow_sample_layout],
                    push_constant_ranges: &[],
                })
        } else {
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("draw-pipeline-layout"),
                    bind_group_layouts: &[&self.draw_layout],
                    push_constant_ranges: &[],
                })
        };

        let (depth_write_enabled, depth_compare) = match key.depth_test {
            DepthTest::LessEqual => (true, wgpu::CompareFunction::LessEqual),
            DepthTest::Disabled => (false, wgpu::CompareFunction::Always),
        };
        let bias = if key.program == Program::ShadowDepth {
            wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            }
        } else {
            wgpu::DepthBiasState::default()
        };
        let color_targets = [Some(wgpu::ColorTargetState {
            format: self.config.format,
            blend: blend_state(key.blend),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some(vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil: Default::default(),
                    bias,
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: fragment_entry.map(|entry| wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &color_targets,
                }),
                multiview: None,
                cache: None,
            })
    }

    fn current_segment(&mut self) -> &mut Segment {
        let target = self.state.target;
        let reuse = self
            .segments
            .last()
            .is_some_and(|segment| segment.target == target);
        if !reuse {
            self.segments.push(Segment::new(target));
        }
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }
}

impl GraphicsContext for WgpuContext {
    fn create_shadow_framebuffer(&mut self, resolution: u32) -> Result<ShadowMapId, SetupError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if resolution == 0 || resolution > max {
            return Err(SetupError::ShadowFramebuffer {
                resolution,
                reason: format!("resolution must be within 1..={max}"),
            });
        }
        let id = ShadowMapId(self.shadow_maps.len() as u32);
        let label = format!("shadow-map-{}", id.index());
        self.shadow_maps.push(ShadowTarget::create(
            &self.device,
            &self.shadow_sample_layout,
            resolution,
            &label,
        ));
        info!("allocated {resolution}x{resolution} shadow map {}", id.index());
        Ok(id)
    }

    fn upload_geometry(&mut self, geometry: &Geometry) -> Result<GeometryHandle, SetupError> {
        geometry.validate().map_err(SetupError::GeometryUpload)?;
        let handle = GeometryHandle(self.meshes.len() as u32);
        let label = format!("geometry-{}", handle.index());
        self.meshes
            .push(MeshBuffers::from_geometry(&self.device, geometry, &label));
        Ok(handle)
    }

    fn bind_framebuffer(&mut self, target: FramebufferId) {
        self.state.target = target;
    }

    fn clear(&mut self, color: Vec4, depth: f32) {
        let segment = self.current_segment();
        if segment.draws.is_empty() {
            segment.clear = Some((color, depth));
        } else {
            let target = segment.target;
            let mut fresh = Segment::new(target);
            fresh.clear = Some((color, depth));
            self.segments.push(fresh);
        }
    }

    fn set_depth_test(&mut self, test: DepthTest) {
        self.state.depth_test = test;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn use_program(&mut self, program: Program) {
        self.state.program = Some(program);
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        match self.state.program {
            Some(program) => self
                .state
                .uniforms
                .entry(program)
                .or_default()
                .apply(uniform),
            None => warn!("uniform {uniform:?} set with no program bound"),
        }
    }

    fn draw_indexed(&mut self, geometry: GeometryHandle) {
        let Some(program) = self.state.program else {
            warn!("draw of {geometry:?} skipped: no program bound");
            return;
        };
        if geometry.index() >= self.meshes.len() {
            warn!("draw of {geometry:?} skipped: geometry was never uploaded");
            return;
        }
        let depth_only = matches!(self.state.target, FramebufferId::Shadow(_));
        if depth_only != (program == Program::ShadowDepth) {
            warn!(
                "draw of {geometry:?} skipped: {program:?} cannot render into {:?}",
                self.state.target
            );
            return;
        }
        let draw = PendingDraw {
            key: PipelineKey {
                program,
                blend: self.state.blend,
                depth_test: self.state.depth_test,
            },
            geometry,
            uniforms: self
                .state
                .uniforms
                .get(&program)
                .copied()
                .unwrap_or_default(),
        };
        self.current_segment().draws.push(draw);
    }
}

fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Replace => None,
        BlendMode::AdditiveSum => {
            let sum = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: sum,
                alpha: sum,
            })
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: (3 * std::mem::size_of::<f32>()) as u64,
        shader_location: 1,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: (6 * std::mem::size_of::<f32>()) as u64,
        shader_location: 2,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: Program,
    blend: BlendMode,
    depth_test: DepthTest,
}

#[derive(Debug, Clone, Copy)]
struct PendingDraw {
    key: PipelineKey,
    geometry: GeometryHandle,
    uniforms: UniformSet,
}

#[derive(Debug)]
struct Segment {
    target: FramebufferId,
    clear: Option<(Vec4, f32)>,
    draws: Vec<PendingDraw>,
}

impl Segment {
    fn new(target: FramebufferId) -> Self {
        Self {
            target,
            clear: None,
            draws: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct ContextState {
    target: FramebufferId,
    blend: BlendMode,
    depth_test: DepthTest,
    program: Option<Program>,
    uniforms: HashMap<Program, UniformSet>,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            target: FramebufferId::Main,
            blend: BlendMode::Replace,
            depth_test: DepthTest::Disabled,
            program: None,
            uniforms: HashMap::new(),
        }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_geometry(device: &wgpu::Device, geometry: &Geometry, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: geometry.indices.len() as u32,
        }
    }
}

/// Depth texture rendered by the shadow pass and read by the lit pass.
struct ShadowTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sample_group: wgpu::BindGroup,
}

impl ShadowTarget {
    fn create(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        resolution: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sample_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });
        Self {
            _texture: texture,
            view,
            sample_group,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light_mvp: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    base_color: [f32; 4],
    specular: [f32; 4],
    emissive: [f32; 4],
    shadow: [i32; 4],
}

impl DrawUniforms {
    fn new(uniforms: &UniformSet, has_shadow_map: bool) -> Self {
        let normal = Mat3::from_mat4(uniforms.model).inverse().transpose();
        Self {
            model: uniforms.model.to_cols_array_2d(),
            view: uniforms.view.to_cols_array_2d(),
            projection: uniforms.projection.to_cols_array_2d(),
            light_mvp: uniforms.light_mvp.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            camera_position: uniforms.camera_position.extend(1.0).into(),
            light_position: uniforms.light_position.extend(1.0).into(),
            light_color: uniforms.light_color.extend(uniforms.light_intensity).into(),
            base_color: uniforms.base_color.extend(1.0).into(),
            specular: uniforms.specular.extend(1.0).into(),
            emissive: uniforms.emissive.extend(1.0).into(),
            shadow: [
                uniforms.shadow_class.as_uniform(),
                i32::from(has_shadow_map),
                0,
                0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::ShadowTechnique;
    use glam::{Mat4, Vec3};

    #[test]
    fn draw_uniforms_match_wgsl_layout() {
        // Four mat4, one mat3x4 and seven vec4.
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 4 * 64 + 48 + 7 * 16);
        assert_eq!(std::mem::size_of::<DrawUniforms>() % 16, 0);
    }

    #[test]
    fn draw_uniforms_pack_intensity_and_technique() {
        let uniforms = UniformSet {
            light_color: Vec3::new(1.0, 0.5, 0.25),
            light_intensity: 2500.0,
            shadow_class: ShadowTechnique::Pcf,
            model: Mat4::from_scale(Vec3::splat(2.0)),
            ..UniformSet::default()
        };
        let packed = DrawUniforms::new(&uniforms, true);
        assert_eq!(packed.light_color, [1.0, 0.5, 0.25, 2500.0]);
        assert_eq!(packed.shadow, [1, 1, 0, 0]);
        assert!((packed.normal[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn additive_blend_sums_source_and_destination() {
        assert!(blend_state(BlendMode::Replace).is_none());
        let blend = blend_state(BlendMode::AdditiveSum).unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.operation, wgpu::BlendOperation::Add);
    }
}
