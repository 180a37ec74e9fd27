use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use shadowcaster::app::{build_renderer, print_summary, run_headless};
use shadowcaster::config::parse_vec3_text;
use shadowcaster::render::WgpuContext;
use shadowcaster::{
    CameraSettings, FrameParams, RecordingContext, Renderer, SceneDescription, ShadowTechnique,
};

const DEFAULT_FRAMES: u32 = 60;
const WINDOW_WIDTH: f64 = 1280.0;
const WINDOW_HEIGHT: f64 = 720.0;
const TRANSLATE_STEP: f32 = 2.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let setup = AppSetup::load(&options)?;

    if options.summary_only {
        run_headless_mode(&setup, options.frames)
    } else {
        let headless_setup = setup.clone();
        match run_interactive(setup) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
                    );
                    run_headless_mode(&headless_setup, options.frames)
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// Scene description plus the frame parameters after CLI overrides.
#[derive(Debug, Clone)]
struct AppSetup {
    description: SceneDescription,
    base_dir: PathBuf,
    params: FrameParams,
}

impl AppSetup {
    fn load(options: &CliOptions) -> Result<Self> {
        let (description, base_dir) = match &options.scene {
            Some(path) => {
                let xml = fs::read_to_string(path)
                    .with_context(|| format!("failed to read scene {}", path.display()))?;
                let description = SceneDescription::from_xml(&xml)
                    .with_context(|| format!("failed to parse scene {}", path.display()))?;
                let base_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (description, base_dir)
            }
            None => {
                info!("no scene file given; using the built-in demo scene");
                (SceneDescription::default(), PathBuf::from("."))
            }
        };

        let mut params = description.frame;
        if let Some(technique) = options.shadow {
            params.shadow_technique = technique;
        }
        if let Some(translation) = options.translate {
            params.model_translation = translation;
        }
        Ok(Self {
            description,
            base_dir,
            params,
        })
    }
}

fn run_headless_mode(setup: &AppSetup, frames: u32) -> Result<()> {
    let mut ctx = RecordingContext::new();
    let aspect = (WINDOW_WIDTH / WINDOW_HEIGHT) as f32;
    let mut renderer = build_renderer(&mut ctx, &setup.description, aspect, &setup.base_dir)
        .context("failed to build renderer")?;
    let report = run_headless(&mut ctx, &mut renderer, frames, &setup.params);
    print_summary(&renderer, &report, &setup.params);
    Ok(())
}

fn run_interactive(setup: AppSetup) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ShadowApp {
        setup: Some(setup),
        running: None,
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    if let Some(err) = app.last_error {
        return Err(err);
    }
    if let Some(running) = &app.running {
        running.print_final_state();
    }
    Ok(())
}

struct ShadowApp {
    setup: Option<AppSetup>,
    running: Option<RunningApp>,
    last_error: Option<anyhow::Error>,
}

struct RunningApp {
    ctx: WgpuContext,
    renderer: Renderer,
    camera: CameraSettings,
    params: FrameParams,
    start_time: Instant,
    last_frame: Instant,
    frames: u64,
}

impl ApplicationHandler for ShadowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(setup) = self.setup.take() else {
            return;
        };
        match RunningApp::start(event_loop, setup) {
            Ok(running) => {
                running.ctx.window().request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                self.last_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if id != running.ctx.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                running.ctx.resize(size);
                running
                    .renderer
                    .set_camera(running.camera.params(running.ctx.aspect()));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if running.handle_key(&event) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = running.redraw() {
                    self.last_error = Some(err);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

impl RunningApp {
    fn start(event_loop: &ActiveEventLoop, setup: AppSetup) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title("shadowcaster")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        let mut ctx = block_on(WgpuContext::new(Arc::clone(&window)))
            .map_err(|err| WindowInitError::from_error("GPU context", err))?;
        let aspect = ctx.aspect();
        let renderer = build_renderer(&mut ctx, &setup.description, aspect, &setup.base_dir)
            .context("failed to build renderer")?;
        for defect in renderer.scene().audit() {
            eprintln!("Scene defect: {defect}");
        }
        info!(
            "rendering {} light(s) with {} shadows",
            renderer.scene().lights().len(),
            setup.params.shadow_technique
        );

        let now = Instant::now();
        Ok(Self {
            ctx,
            renderer,
            camera: setup.description.camera,
            params: setup.params,
            start_time: now,
            last_frame: now,
            frames: 0,
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let time = now.duration_since(self.start_time).as_secs_f32();
        let delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.renderer
            .render(&mut self.ctx, time, delta_time, &self.params);
        match self.ctx.end_frame() {
            Ok(()) => self.frames += 1,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.ctx.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("surface timeout; retrying next frame");
            }
            Err(err) => warn!("failed to acquire surface texture: {err}"),
        }
        self.ctx.window().request_redraw();
        Ok(())
    }

    /// Applies a key press. Returns true when the app should exit.
    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed {
            return false;
        }
        let translation = &mut self.params.model_translation;
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => return true,
            Key::Named(NamedKey::ArrowLeft) => translation.x -= TRANSLATE_STEP,
            Key::Named(NamedKey::ArrowRight) => translation.x += TRANSLATE_STEP,
            Key::Named(NamedKey::ArrowUp) => translation.z -= TRANSLATE_STEP,
            Key::Named(NamedKey::ArrowDown) => translation.z += TRANSLATE_STEP,
            Key::Named(NamedKey::PageUp) => translation.y += TRANSLATE_STEP,
            Key::Named(NamedKey::PageDown) => translation.y -= TRANSLATE_STEP,
            Key::Character(text) => {
                let selected = match text.as_str() {
                    "1" => ShadowTechnique::Hard,
                    "2" => ShadowTechnique::Pcf,
                    "3" => ShadowTechnique::Pcss,
                    _ => return false,
                };
                self.params.shadow_technique = selected;
                info!("shadow technique set to {selected}");
            }
            _ => {}
        }
        false
    }

    fn print_final_state(&self) {
        println!("Rendered {} frame(s)", self.frames);
        println!("Final light positions:");
        for (id, position) in self.renderer.light_positions() {
            println!(
                " - {id} ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            );
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "Usage: shadowcaster [scene.xml] [--frames N] [--summary-only] [--shadow SM|PCF|PCSS] [--translate x,y,z]";

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    scene: Option<PathBuf>,
    frames: u32,
    summary_only: bool,
    shadow: Option<ShadowTechnique>,
    translate: Option<Vec3>,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            scene: None,
            frames: DEFAULT_FRAMES,
            summary_only: false,
            shadow: None,
            translate: None,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--frames" => {
                    let value = flag_value(&mut args, "--frames")?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count `{value}`"))?;
                }
                "--shadow" => {
                    let value = flag_value(&mut args, "--shadow")?;
                    options.shadow = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid shadow technique `{value}`"))?,
                    );
                }
                "--translate" => {
                    let value = flag_value(&mut args, "--translate")?;
                    options.translate = Some(
                        parse_vec3_text(&value)
                            .with_context(|| format!("invalid translation `{value}`"))?,
                    );
                }
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other if other.starts_with('-') => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                path => {
                    if options.scene.is_some() {
                        return Err(anyhow!("Only one scene file may be given. {USAGE}"));
                    }
                    options.scene = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}
