use std::sync::Arc;
use std::time::Instant;

use pollster::FutureExt;
use volprobe_render::RenderEngine;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use super::controls::{self, KeyAction};
use super::App;
use crate::error::Result;

impl App {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("volprobe")
            .with_inner_size(LogicalSize::new(
                self.options.window_width,
                self.options.window_height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let mut engine = RenderEngine::new_windowed(window.clone(), &self.scene.desc()).block_on()?;
        engine.background = self.options.background_color;
        engine.show_lamp = self.options.show_lamp;

        self.resize(engine.width, engine.height);
        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.params = self.params.with_size(width, height);
        self.camera.set_aspect_ratio(width as f32 / height as f32);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
                self.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if let Some(last) = self.last_frame_time {
                    self.update(now.duration_since(last).as_secs_f32());
                }
                self.last_frame_time = Some(now);

                if let Err(e) = self.render() {
                    self.fail(e);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.left_mouse_down = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((x, y)) = self.mouse_pos {
                    if self.left_mouse_down {
                        self.camera
                            .process_mouse((position.x - x) as f32, (position.y - y) as f32);
                    }
                }
                self.mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !event.repeat {
                                match controls::apply_key_press(&mut self.params, code) {
                                    KeyAction::Quit => self.close_requested = true,
                                    KeyAction::Screenshot => {
                                        self.screenshot_pending = true;
                                        log::info!("Screenshot requested (F12)");
                                    }
                                    KeyAction::None => {}
                                }
                            }
                            self.keys_down.insert(code);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&code);
                        }
                    }
                }
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}
