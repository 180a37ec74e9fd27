use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::config::{FrameParams, GeometrySource, ModelSettings, SceneDescription};
use crate::drawable::ModelDesc;
use crate::geometry::Geometry;
use crate::render::{GraphicsContext, RecordingContext};
use crate::renderer::{FrameStats, Renderer};

/// Frame step used by the headless mode.
pub const HEADLESS_FRAME_TIME: f32 = 1.0 / 60.0;

/// Loads the geometry of a model, resolving mesh paths against `base_dir`.
pub fn load_geometry(source: &GeometrySource, base_dir: &Path) -> Result<Geometry> {
    match source {
        GeometrySource::Shape(shape) => Ok(shape.geometry()),
        GeometrySource::Mesh(path) => {
            let path = base_dir.join(path);
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("unable to read mesh {}", path.display()))?;
            crate::load_obj_from_str(&contents)
                .with_context(|| format!("failed to parse OBJ mesh {}", path.display()))
        }
    }
}

/// Registers every light and then every model of `description`.
pub fn build_renderer<C>(
    ctx: &mut C,
    description: &SceneDescription,
    aspect: f32,
    base_dir: &Path,
) -> Result<Renderer>
where
    C: GraphicsContext + ?Sized,
{
    let mut renderer = Renderer::new(description.camera.params(aspect))
        .with_background(description.background);

    for (index, settings) in description.lights.iter().enumerate() {
        let id = renderer
            .add_light(ctx, settings)
            .with_context(|| format!("failed to create light {index}"))?;
        info!("registered {id} at {}", settings.position);
    }
    renderer.validate()?;

    for model in &description.models {
        add_model(ctx, &mut renderer, model, base_dir)?;
    }
    Ok(renderer)
}

fn add_model<C>(
    ctx: &mut C,
    renderer: &mut Renderer,
    model: &ModelSettings,
    base_dir: &Path,
) -> Result<()>
where
    C: GraphicsContext + ?Sized,
{
    let geometry = load_geometry(&model.source, base_dir)
        .with_context(|| format!("failed to load model `{}`", model.name))?;
    let desc = ModelDesc::new(model.name.clone())
        .with_transform(model.transform)
        .with_material(model.material)
        .animated(model.animated);
    renderer
        .add_model(ctx, desc, &geometry)
        .with_context(|| format!("failed to upload model `{}`", model.name))?;
    if let Some(offset) = model.offset {
        renderer.scene_mut().set_offset(model.name.clone(), offset);
    }
    Ok(())
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadlessReport {
    pub frames: u32,
    last: Option<FrameStats>,
    steady: bool,
}

impl HeadlessReport {
    fn record(&mut self, stats: FrameStats) {
        self.steady = match self.last {
            None => true,
            Some(previous) => self.steady && previous == stats,
        };
        self.last = Some(stats);
        self.frames += 1;
    }

    /// Draw counts of the last frame, if any frame was rendered.
    pub fn last(&self) -> Option<FrameStats> {
        self.last
    }

    /// True when every frame issued the same draws.
    pub fn is_steady(&self) -> bool {
        self.steady || self.last.is_none()
    }
}

/// Renders `frames` frames into a [`RecordingContext`].
pub fn run_headless(
    ctx: &mut RecordingContext,
    renderer: &mut Renderer,
    frames: u32,
    params: &FrameParams,
) -> HeadlessReport {
    let mut report = HeadlessReport::default();
    for frame in 0..frames {
        let time = frame as f32 * HEADLESS_FRAME_TIME;
        report.record(renderer.render(ctx, time, HEADLESS_FRAME_TIME, params));
        ctx.reset_log();
    }
    report
}

pub fn print_summary(renderer: &Renderer, report: &HeadlessReport, params: &FrameParams) {
    let scene = renderer.scene();
    println!(
        "Loaded scene with {} light(s) and {} model(s)",
        scene.lights().len(),
        scene.models().len()
    );
    for light in scene.lights() {
        let shadow = if light.has_shadow_map() {
            format!("{}px shadow map", light.shadow_resolution())
        } else {
            "no shadow map".to_string()
        };
        println!(" - {} {:?} ({shadow})", light.id(), light.kind());
    }
    for model in scene.models() {
        let animated = if model.animated { " (animated)" } else { "" };
        println!(" - model {}{animated}", model.name);
    }
    println!(
        "Drawables: {} lit, {} shadow",
        scene.lit_drawables().len(),
        scene.shadow_casters().len()
    );

    let defects = scene.audit();
    if defects.is_empty() {
        println!("Audit: no defects");
    } else {
        println!("Audit: {} defect(s)", defects.len());
        for defect in &defects {
            println!(" - {defect}");
        }
    }

    println!(
        "Rendered {} frame(s) with {} shadows",
        report.frames,
        params.shadow_technique
    );
    if let Some(last) = report.last() {
        println!(
            "Per frame: {} light pass(es), {} marker, {} shadow, {} lit draw(s){}",
            last.lights,
            last.marker_draws,
            last.shadow_draws,
            last.lit_draws,
            if report.is_steady() { "" } else { " (varied)" }
        );
    }

    println!("Final light positions:");
    for (id, position) in renderer.light_positions() {
        println!(
            " - {id} ({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
    }
}
