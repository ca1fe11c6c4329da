//! Application window and event loop management.

mod controls;
mod input;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use volprobe_core::{FrameInput, Options, RaymarchParams};
use volprobe_render::{save_image, FlyCamera, RenderEngine};
use winit::{event_loop::EventLoop, keyboard::KeyCode, window::Window};

use crate::error::{AppError, Result};
use crate::scene::Scene;

/// The volprobe application state.
pub struct App {
    pub(super) options: Options,
    pub(super) scene: Scene,
    pub(super) window: Option<Arc<Window>>,
    pub(super) engine: Option<RenderEngine>,
    pub(super) camera: FlyCamera,
    pub(super) params: RaymarchParams,
    pub(super) close_requested: bool,
    // Mouse look while the left button is held
    pub(super) mouse_pos: Option<(f64, f64)>,
    pub(super) left_mouse_down: bool,
    // Keys held for continuous camera and light movement
    pub(super) keys_down: HashSet<KeyCode>,
    pub(super) last_frame_time: Option<Instant>,
    pub(super) screenshot_pending: bool,
    pub(super) screenshot_counter: u32,
    // First fatal error, reported by `run` after the loop exits
    pub(super) error: Option<AppError>,
}

impl App {
    /// Builds the scene and initial parameters. The window is created on resume.
    pub fn new(options: Options) -> Result<Self> {
        let scene = Scene::build(&options)?;
        let frame = scene.initial_frame(&options);
        let camera = FlyCamera::new(
            &options.camera,
            options.window_width.max(1) as f32 / options.window_height.max(1) as f32,
        );
        Ok(Self {
            options,
            scene,
            window: None,
            engine: None,
            camera,
            params: frame.params,
            close_requested: false,
            mouse_pos: None,
            left_mouse_down: false,
            keys_down: HashSet::new(),
            last_frame_time: None,
            screenshot_pending: false,
            screenshot_counter: 0,
            error: None,
        })
    }

    /// The frame input for the current camera and parameters.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput::new(self.camera.matrices(), self.params)
    }

    /// Applies held keys for `dt` seconds.
    pub(super) fn update(&mut self, dt: f32) {
        for movement in controls::held_movements(&self.keys_down) {
            self.camera.process_movement(movement, dt);
        }
        self.params.light_pos += controls::light_delta(&self.keys_down, dt);
    }

    /// Renders one frame and handles a pending screenshot.
    pub(super) fn render(&mut self) -> Result<()> {
        let frame = self.frame_input();
        let Some(engine) = &mut self.engine else {
            return Ok(());
        };
        engine.render(&frame)?;

        if self.screenshot_pending {
            self.screenshot_pending = false;
            let filename = format!("screenshot_{:04}.png", self.screenshot_counter);
            self.screenshot_counter += 1;
            let pixels = engine.capture_frame(&frame)?;
            save_image(&filename, &pixels, frame.params.width, frame.params.height)?;
        }
        Ok(())
    }

    /// Records a fatal error and asks the event loop to stop.
    pub(super) fn fail(&mut self, error: AppError) {
        log::error!("{error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.close_requested = true;
    }
}

/// Opens a window and runs the demo until it is closed.
pub fn run(options: Options) -> Result<()> {
    let _ = env_logger::try_init();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(options)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
