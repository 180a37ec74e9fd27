use glam::{Vec3, Vec4};
use log::{debug, info};

use crate::camera::CameraParams;
use crate::config::FrameParams;
use crate::drawable::{Model, ModelDesc, ModelId};
use crate::error::SetupError;
use crate::geometry::Geometry;
use crate::light::{Light, LightId, LightSettings};
use crate::render::{
    BlendMode, DepthTest, FramebufferId, GeometryHandle, GraphicsContext, Program, Uniform,
};
use crate::scene::Scene;

/// Spin applied to animated models, in degrees per second.
pub const MODEL_SPIN_DEGREES_PER_SECOND: f32 = 10.0;

const SHADOW_CLEAR_COLOR: Vec4 = Vec4::ONE;
const MAX_DEPTH: f32 = 1.0;

/// Draw counts of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub lights: usize,
    pub marker_draws: usize,
    pub shadow_draws: usize,
    pub lit_draws: usize,
}

/// Forward renderer accumulating one lit pass per light.
pub struct Renderer {
    scene: Scene,
    camera: CameraParams,
    background: Vec4,
    marker_geometry: Option<GeometryHandle>,
}

impl Renderer {
    pub fn new(camera: CameraParams) -> Self {
        Self {
            scene: Scene::new(),
            camera,
            background: Vec4::new(0.0, 0.0, 0.0, 1.0),
            marker_geometry: None,
        }
    }

    pub fn with_background(mut self, background: Vec4) -> Self {
        self.background = background;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &CameraParams {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: CameraParams) {
        self.camera = camera;
    }

    /// Creates and registers a light, allocating its shadow framebuffer.
    ///
    /// Models registered earlier are not bound to the new light; register
    /// lights first.
    pub fn add_light<C>(&mut self, ctx: &mut C, settings: &LightSettings) -> Result<LightId, SetupError>
    where
        C: GraphicsContext + ?Sized,
    {
        if self.marker_geometry.is_none() {
            self.marker_geometry = Some(ctx.upload_geometry(&Geometry::cube())?);
        }
        let light = Light::new(self.scene.next_light_id(), settings, ctx)?;
        self.scene.add_light(light)
    }

    /// Uploads `geometry` and binds a lit drawable and a shadow caster of it
    /// to every registered light.
    pub fn add_model<C>(
        &mut self,
        ctx: &mut C,
        desc: ModelDesc,
        geometry: &Geometry,
    ) -> Result<ModelId, SetupError>
    where
        C: GraphicsContext + ?Sized,
    {
        let handle = ctx.upload_geometry(geometry)?;
        let material = desc.material;
        let model = self.scene.add_model(Model {
            name: desc.name,
            geometry: handle,
            transform: desc.transform,
            animated: desc.animated,
        });
        let lights: Vec<LightId> = self.scene.lights().iter().map(Light::id).collect();
        for light in &lights {
            self.scene.add_drawable_pair(model, *light, material);
        }
        info!(
            "registered model #{} with {} vertices for {} light(s)",
            model.index(),
            geometry.vertex_count(),
            lights.len()
        );
        Ok(model)
    }

    /// Checks the renderer is ready for its first frame.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.scene.lights().is_empty() {
            return Err(SetupError::NoLights);
        }
        Ok(())
    }

    /// Renders one frame.
    ///
    /// For every light in registration order: orbit it, clear its shadow
    /// map, draw its marker, render shadow casters into its shadow map and
    /// finally shade its lit drawables into the main framebuffer. The first
    /// light replaces the framebuffer contents, later lights add onto them.
    ///
    /// # Panics
    ///
    /// Panics when no light is registered; see [`Renderer::validate`].
    pub fn render<C>(
        &mut self,
        ctx: &mut C,
        time: f32,
        delta_time: f32,
        params: &FrameParams,
    ) -> FrameStats
    where
        C: GraphicsContext + ?Sized,
    {
        self.scene.animate_models(
            delta_time,
            MODEL_SPIN_DEGREES_PER_SECOND.to_radians(),
            params.model_translation,
        );

        ctx.bind_framebuffer(FramebufferId::Main);
        ctx.clear(self.background, MAX_DEPTH);
        ctx.set_depth_test(DepthTest::LessEqual);
        ctx.set_blend_mode(BlendMode::Replace);

        assert!(!self.scene.lights().is_empty(), "renderer has no lights");

        let mut stats = FrameStats {
            lights: self.scene.lights().len(),
            ..FrameStats::default()
        };

        for position in 0..self.scene.lights().len() {
            self.scene.light_at_mut(position).advance(delta_time);
            let light = &self.scene.lights()[position];

            if let Some(shadow_target) = light.shadow_framebuffer() {
                ctx.bind_framebuffer(shadow_target);
                ctx.clear(SHADOW_CLEAR_COLOR, MAX_DEPTH);
            }

            if let Some(marker) = self.marker_geometry {
                self.draw_marker(ctx, light, marker);
                stats.marker_draws += 1;
            }

            if let Some(shadow_target) = light.shadow_framebuffer() {
                stats.shadow_draws += self.shadow_pass(ctx, light, shadow_target);
            }

            ctx.set_blend_mode(BlendMode::for_light_position(position));
            stats.lit_draws += self.lit_pass(ctx, light, params);
            ctx.set_blend_mode(BlendMode::Replace);
        }

        debug!(
            "frame t={time:.3}s: {} light(s), {} shadow draw(s), {} lit draw(s)",
            stats.lights, stats.shadow_draws, stats.lit_draws
        );
        stats
    }

    fn draw_marker<C>(&self, ctx: &mut C, light: &Light, marker: GeometryHandle)
    where
        C: GraphicsContext + ?Sized,
    {
        ctx.bind_framebuffer(FramebufferId::Main);
        ctx.use_program(Program::Emissive);
        ctx.set_uniform(Uniform::Model(light.marker_transform().to_model_matrix()));
        ctx.set_uniform(Uniform::View(self.camera.view));
        ctx.set_uniform(Uniform::Projection(self.camera.projection));
        ctx.set_uniform(Uniform::Emissive(light.color()));
        ctx.draw_indexed(marker);
    }

    fn shadow_pass<C>(&self, ctx: &mut C, light: &Light, target: FramebufferId) -> usize
    where
        C: GraphicsContext + ?Sized,
    {
        ctx.bind_framebuffer(target);
        let mut draws = 0;
        for drawable in self.scene.shadow_casters_for(light.id()) {
            let Some(model) = self.scene.model(drawable.model) else {
                continue;
            };
            ctx.use_program(drawable.program);
            ctx.set_uniform(Uniform::LightMvp(light.light_space_matrix(&model.transform)));
            ctx.draw_indexed(model.geometry);
            draws += 1;
        }
        draws
    }

    fn lit_pass<C>(&self, ctx: &mut C, light: &Light, params: &FrameParams) -> usize
    where
        C: GraphicsContext + ?Sized,
    {
        ctx.bind_framebuffer(FramebufferId::Main);
        let mut draws = 0;
        for drawable in self.scene.lit_drawables_for(light.id()) {
            let Some(model) = self.scene.model(drawable.model) else {
                continue;
            };
            ctx.use_program(drawable.program);
            ctx.set_uniform(Uniform::Model(model.transform.to_model_matrix()));
            ctx.set_uniform(Uniform::View(self.camera.view));
            ctx.set_uniform(Uniform::Projection(self.camera.projection));
            ctx.set_uniform(Uniform::CameraPosition(self.camera.position));
            ctx.set_uniform(Uniform::LightMvp(light.light_space_matrix(&model.transform)));
            ctx.set_uniform(Uniform::LightPosition(light.position()));
            ctx.set_uniform(Uniform::LightColor(light.color()));
            ctx.set_uniform(Uniform::LightIntensity(light.intensity()));
            ctx.set_uniform(Uniform::ShadowClass(params.shadow_technique));
            ctx.set_uniform(Uniform::ShadowMap(light.shadow_map()));
            ctx.set_uniform(Uniform::BaseColor(drawable.material.base_color));
            ctx.set_uniform(Uniform::Specular(drawable.material.specular));
            ctx.draw_indexed(model.geometry);
            draws += 1;
        }
        draws
    }

    /// Current position of every light, in draw order.
    pub fn light_positions(&self) -> Vec<(LightId, Vec3)> {
        self.scene
            .lights()
            .iter()
            .map(|light| (light.id(), light.position()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{Drawable, Material};
    use crate::render::recording::{Command, DrawCall};
    use crate::render::{RecordingContext, ShadowMapId};
    use crate::shadow::ShadowTechnique;
    use crate::transform::Transform;

    fn directional(position: Vec3, speed: f32) -> LightSettings {
        LightSettings {
            position,
            orbit_speed_degrees: speed,
            ..LightSettings::default()
        }
    }

    fn two_light_renderer(ctx: &mut RecordingContext) -> (Renderer, LightId, LightId) {
        let mut renderer = Renderer::new(CameraParams::default());
        let first = renderer
            .add_light(ctx, &directional(Vec3::new(0.0, 80.0, 80.0), 10.0))
            .unwrap();
        let second = renderer
            .add_light(ctx, &directional(Vec3::new(90.0, 90.0, 0.0), 80.0))
            .unwrap();
        renderer
            .add_model(
                ctx,
                ModelDesc::new("statue")
                    .with_transform(Transform::default().with_scale(Vec3::splat(20.0)))
                    .animated(true),
                &Geometry::cube(),
            )
            .unwrap();
        renderer
            .add_model(ctx, ModelDesc::new("floor"), &Geometry::plane())
            .unwrap();
        (renderer, first, second)
    }

    fn shadow_target(renderer: &Renderer, light: LightId) -> FramebufferId {
        renderer
            .scene()
            .light(light)
            .and_then(Light::shadow_framebuffer)
            .unwrap()
    }

    #[test]
    fn registering_a_model_pairs_it_with_every_light() {
        let mut ctx = RecordingContext::new();
        let (renderer, first, second) = two_light_renderer(&mut ctx);
        let scene = renderer.scene();
        assert_eq!(scene.lit_drawables().len(), 4);
        assert_eq!(scene.shadow_casters().len(), 4);
        assert_eq!(scene.lit_drawables_for(first).count(), 2);
        assert_eq!(scene.shadow_casters_for(second).count(), 2);
        assert!(scene.audit().is_empty());
    }

    #[test]
    fn first_light_replaces_and_later_lights_add() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, _, _) = two_light_renderer(&mut ctx);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 1.0 / 60.0, &FrameParams::default());

        let lit: Vec<&DrawCall> = ctx
            .draws()
            .iter()
            .filter(|draw| draw.program == Program::Lit)
            .collect();
        assert_eq!(lit.len(), 4);
        assert!(lit[..2].iter().all(|draw| draw.blend == BlendMode::Replace));
        assert!(lit[2..].iter().all(|draw| draw.blend == BlendMode::AdditiveSum));
        assert!(lit.iter().all(|draw| draw.target == FramebufferId::Main));
        assert!(lit.iter().all(|draw| draw.depth_test == DepthTest::LessEqual));

        let markers: Vec<&DrawCall> = ctx
            .draws()
            .iter()
            .filter(|draw| draw.program == Program::Emissive)
            .collect();
        assert_eq!(markers.len(), 2);
        assert!(markers
            .iter()
            .all(|draw| draw.blend == BlendMode::Replace && draw.target == FramebufferId::Main));
    }

    #[test]
    fn blend_is_disabled_again_after_every_light() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, _, _) = two_light_renderer(&mut ctx);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 0.0, &FrameParams::default());
        let blend_changes: Vec<BlendMode> = ctx
            .commands()
            .iter()
            .filter_map(|command| match command {
                Command::SetBlendMode(mode) => Some(*mode),
                _ => None,
            })
            .collect();
        assert_eq!(
            blend_changes,
            vec![
                BlendMode::Replace,
                BlendMode::Replace,
                BlendMode::Replace,
                BlendMode::AdditiveSum,
                BlendMode::Replace,
            ]
        );
    }

    #[test]
    fn shadow_map_is_cleared_before_shadow_draws() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, first, _) = two_light_renderer(&mut ctx);
        let target = shadow_target(&renderer, first);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 0.0, &FrameParams::default());

        let commands = ctx.commands();
        let bind = commands
            .iter()
            .position(|c| *c == Command::BindFramebuffer(target))
            .unwrap();
        assert_eq!(
            commands[bind + 1],
            Command::Clear {
                color: Vec4::ONE,
                depth: 1.0
            }
        );
        let first_shadow_draw = commands
            .iter()
            .position(|c| matches!(c, Command::UseProgram(Program::ShadowDepth)))
            .unwrap();
        assert!(bind < first_shadow_draw);
        assert_eq!(ctx.bind_count(target), 1);
    }

    #[test]
    fn shadowless_light_never_binds_a_shadow_map() {
        let mut ctx = RecordingContext::new();
        let mut renderer = Renderer::new(CameraParams::default());
        let light = renderer
            .add_light(
                &mut ctx,
                &LightSettings {
                    has_shadow_map: false,
                    ..LightSettings::default()
                },
            )
            .unwrap();
        renderer
            .add_model(&mut ctx, ModelDesc::new("statue"), &Geometry::cube())
            .unwrap();
        let stats = renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());

        assert_eq!(stats.shadow_draws, 0);
        assert!(ctx
            .commands()
            .iter()
            .all(|c| !matches!(c, Command::BindFramebuffer(FramebufferId::Shadow(_)))));
        assert!(ctx.draws().iter().all(|d| d.program != Program::ShadowDepth));
        let lit: Vec<&DrawCall> = ctx.draws().iter().filter(|d| d.program == Program::Lit).collect();
        assert_eq!(lit.len(), 1);
        assert_eq!(lit[0].uniforms.shadow_map, None);
        assert!(renderer.scene().light(light).unwrap().shadow_map().is_none());
    }

    #[test]
    fn draws_happen_only_in_their_lights_iteration() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, first, second) = two_light_renderer(&mut ctx);
        let first_target = shadow_target(&renderer, first);
        let second_target = shadow_target(&renderer, second);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());

        let first_position = renderer.scene().light(first).unwrap().position();
        let second_position = renderer.scene().light(second).unwrap().position();

        // Iteration boundaries are the shadow map clears.
        let commands = ctx.commands();
        let boundary = commands
            .iter()
            .position(|c| *c == Command::BindFramebuffer(second_target))
            .unwrap();
        let mut lit_seen = 0;
        let mut light_position = None;
        let mut current_program = None;
        for (index, command) in commands.iter().enumerate() {
            match command {
                Command::UseProgram(program) => current_program = Some(*program),
                Command::SetUniform(Uniform::LightPosition(position)) => {
                    light_position = Some(*position)
                }
                Command::DrawIndexed(_) if current_program == Some(Program::Lit) => {
                    lit_seen += 1;
                    let expected = if index < boundary {
                        first_position
                    } else {
                        second_position
                    };
                    assert_eq!(light_position, Some(expected));
                }
                _ => {}
            }
        }
        assert_eq!(lit_seen, 4);

        assert_eq!(ctx.draws_into(first_target).count(), 2);
        assert_eq!(ctx.draws_into(second_target).count(), 2);
        let first_shadow_draws: Vec<usize> = ctx
            .draws()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.target == first_target)
            .map(|(i, _)| i)
            .collect();
        let second_shadow_draws: Vec<usize> = ctx
            .draws()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.target == second_target)
            .map(|(i, _)| i)
            .collect();
        assert!(first_shadow_draws.iter().max() < second_shadow_draws.iter().min());
    }

    #[test]
    fn shadow_and_lit_passes_share_the_light_space_matrix() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, first, _) = two_light_renderer(&mut ctx);
        let target = shadow_target(&renderer, first);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 0.25, &FrameParams::default());

        let light = renderer.scene().light(first).unwrap();
        let (_, statue) = renderer.scene().model_by_name("statue").unwrap();
        let expected = light.light_space_matrix(&statue.transform);
        let shadow_draw = ctx.draws_into(target).next().unwrap();
        assert_eq!(shadow_draw.uniforms.light_mvp, expected);
        let lit_draw = ctx
            .draws()
            .iter()
            .find(|d| d.program == Program::Lit && d.uniforms.light_mvp == expected);
        assert!(lit_draw.is_some());
    }

    #[test]
    fn shadow_class_reaches_every_lit_draw() {
        for light_count in 1..=4 {
            let mut ctx = RecordingContext::new();
            let mut renderer = Renderer::new(CameraParams::default());
            for index in 0..light_count {
                let angle = index as f32;
                renderer
                    .add_light(
                        &mut ctx,
                        &directional(Vec3::new(80.0 * angle.cos(), 80.0, 80.0 * angle.sin()), 10.0),
                    )
                    .unwrap();
            }
            renderer
                .add_model(&mut ctx, ModelDesc::new("caster"), &Geometry::cube())
                .unwrap();
            let params = FrameParams {
                shadow_technique: ShadowTechnique::Pcss,
                ..FrameParams::default()
            };
            renderer.render(&mut ctx, 0.0, 0.016, &params);

            let lit: Vec<&DrawCall> = ctx.draws().iter().filter(|d| d.program == Program::Lit).collect();
            assert_eq!(lit.len(), light_count);
            assert!(lit
                .iter()
                .all(|draw| draw.uniforms.shadow_class.as_uniform() == 2));
        }
    }

    #[test]
    fn lit_draws_sample_their_own_lights_shadow_map() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, first, second) = two_light_renderer(&mut ctx);
        ctx.reset_log();
        renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());
        let maps: Vec<Option<ShadowMapId>> = ctx
            .draws()
            .iter()
            .filter(|d| d.program == Program::Lit)
            .map(|d| d.uniforms.shadow_map)
            .collect();
        let first_map = renderer.scene().light(first).unwrap().shadow_map();
        let second_map = renderer.scene().light(second).unwrap().shadow_map();
        assert_eq!(maps, vec![first_map, first_map, second_map, second_map]);
    }

    #[test]
    fn drawables_bound_to_unknown_lights_are_skipped() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, _, _) = two_light_renderer(&mut ctx);
        let (statue, _) = renderer.scene().model_by_name("statue").unwrap();
        renderer
            .scene_mut()
            .add_drawable_pair(statue, LightId::new(99), Material::default());
        let stats = renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());
        assert_eq!(stats.lit_draws, 4);
        assert_eq!(stats.shadow_draws, 4);
        assert_eq!(renderer.scene().audit().len(), 2);
    }

    #[test]
    fn lit_drawable_without_caster_is_still_shaded() {
        let mut ctx = RecordingContext::new();
        let mut renderer = Renderer::new(CameraParams::default());
        let light = renderer.add_light(&mut ctx, &LightSettings::default()).unwrap();
        let handle = ctx.upload_geometry(&Geometry::plane()).unwrap();
        let floor = renderer.scene_mut().add_model(Model {
            name: "floor".to_string(),
            geometry: handle,
            transform: Transform::default(),
            animated: false,
        });
        renderer
            .scene_mut()
            .add_lit_drawable(Drawable::lit(floor, light, Material::default()));
        let stats = renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());
        assert_eq!(stats.lit_draws, 1);
        assert_eq!(stats.shadow_draws, 0);
        assert_eq!(renderer.scene().audit().len(), 1);
    }

    #[test]
    fn animated_models_follow_frame_translation() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, _, _) = two_light_renderer(&mut ctx);
        let params = FrameParams {
            model_translation: Vec3::new(5.0, 0.0, -3.0),
            ..FrameParams::default()
        };
        renderer.render(&mut ctx, 0.0, 1.0, &params);
        let (_, statue) = renderer.scene().model_by_name("statue").unwrap();
        assert_eq!(statue.transform.translate, Vec3::new(5.0, 0.0, -3.0));
        assert!((statue.transform.rotate.y - 10f32.to_radians()).abs() < 1e-6);
        let (_, floor) = renderer.scene().model_by_name("floor").unwrap();
        assert_eq!(floor.transform.translate, Vec3::ZERO);
    }

    #[test]
    fn validate_requires_a_light() {
        let renderer = Renderer::new(CameraParams::default());
        assert_eq!(renderer.validate(), Err(SetupError::NoLights));
    }

    #[test]
    #[should_panic(expected = "renderer has no lights")]
    fn rendering_without_lights_panics() {
        let mut ctx = RecordingContext::new();
        let mut renderer = Renderer::new(CameraParams::default());
        renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());
    }

    #[test]
    fn failed_shadow_allocation_stops_setup() {
        let mut ctx = RecordingContext::failing_shadow_allocation();
        let mut renderer = Renderer::new(CameraParams::default());
        let result = renderer.add_light(&mut ctx, &LightSettings::default());
        assert!(matches!(result, Err(SetupError::ShadowFramebuffer { .. })));
        assert!(renderer.scene().lights().is_empty());
    }

    #[test]
    fn lights_orbit_at_their_own_speed() {
        let mut ctx = RecordingContext::new();
        let (mut renderer, first, second) = two_light_renderer(&mut ctx);
        let frames = 540;
        for frame in 0..frames {
            let time = frame as f32 / 60.0;
            renderer.render(&mut ctx, time, 1.0 / 60.0, &FrameParams::default());
            ctx.reset_log();
        }
        let first = renderer.scene().light(first).unwrap().position();
        let second = renderer.scene().light(second).unwrap().position();
        assert!((first - Vec3::new(80.0, 80.0, 0.0)).length() < 0.05, "{first:?}");
        assert!((second - Vec3::new(90.0, 90.0, 0.0)).length() < 0.05, "{second:?}");
    }

    /// Single-pixel framebuffer that applies blend state to lit draws.
    struct PixelContext {
        inner: RecordingContext,
        pixel: f32,
    }

    impl GraphicsContext for PixelContext {
        fn create_shadow_framebuffer(&mut self, resolution: u32) -> Result<ShadowMapId, SetupError> {
            self.inner.create_shadow_framebuffer(resolution)
        }

        fn upload_geometry(&mut self, geometry: &Geometry) -> Result<GeometryHandle, SetupError> {
            self.inner.upload_geometry(geometry)
        }

        fn bind_framebuffer(&mut self, target: FramebufferId) {
            self.inner.bind_framebuffer(target);
        }

        fn clear(&mut self, color: Vec4, depth: f32) {
            self.inner.clear(color, depth);
            if self.inner.commands().iter().rev().nth(1)
                == Some(&Command::BindFramebuffer(FramebufferId::Main))
            {
                self.pixel = color.x;
            }
        }

        fn set_depth_test(&mut self, test: DepthTest) {
            self.inner.set_depth_test(test);
        }

        fn set_blend_mode(&mut self, mode: BlendMode) {
            self.inner.set_blend_mode(mode);
        }

        fn use_program(&mut self, program: Program) {
            self.inner.use_program(program);
        }

        fn set_uniform(&mut self, uniform: Uniform) {
            self.inner.set_uniform(uniform);
        }

        fn draw_indexed(&mut self, geometry: GeometryHandle) {
            self.inner.draw_indexed(geometry);
            let Some(draw) = self.inner.draws().last() else {
                return;
            };
            if draw.program != Program::Lit || draw.target != FramebufferId::Main {
                return;
            }
            let contribution = draw.uniforms.light_intensity;
            self.pixel = match draw.blend {
                BlendMode::Replace => contribution,
                BlendMode::AdditiveSum => self.pixel + contribution,
            };
        }
    }

    #[test]
    fn overlapping_lights_sum_their_contributions() {
        let mut ctx = PixelContext {
            inner: RecordingContext::new(),
            pixel: 0.0,
        };
        let mut renderer = Renderer::new(CameraParams::default());
        renderer
            .add_light(
                &mut ctx,
                &LightSettings {
                    intensity: 3.0,
                    ..directional(Vec3::new(0.0, 80.0, 80.0), 10.0)
                },
            )
            .unwrap();
        renderer
            .add_light(
                &mut ctx,
                &LightSettings {
                    intensity: 4.0,
                    ..directional(Vec3::new(90.0, 90.0, 0.0), 80.0)
                },
            )
            .unwrap();
        renderer
            .add_model(&mut ctx, ModelDesc::new("floor"), &Geometry::plane())
            .unwrap();

        renderer.render(&mut ctx, 0.0, 0.016, &FrameParams::default());
        assert_eq!(ctx.pixel, 7.0);

        // A second frame starts from the cleared background, not the old sum.
        renderer.render(&mut ctx, 0.016, 0.016, &FrameParams::default());
        assert_eq!(ctx.pixel, 7.0);
    }
}
