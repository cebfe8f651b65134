//! Interactive window and input loop.
//!
//! Drives the scene renderer from a winit event loop: redraws continuously,
//! feeds mouse-look and fly-movement into the camera rig, and maps the
//! scene keys (digits for shader slots, `T` for temporal accumulation,
//! brackets for history weight, numpad +/- for the cloud layer).

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use crate::camera::{CameraRig, Movement, PITCH_DEFAULT, YAW_DEFAULT};
use crate::gpu::SceneRenderer;
use crate::types::{RendererConfig, SceneMode};

/// Keyboard speed boost multiplier while Ctrl is held.
const BOOST_FACTOR: f32 = 3.0;
/// History weight step per bracket key press.
const WEIGHT_STEP: f32 = 0.02;
/// Cloud layer shift per numpad key press, meters.
const CLOUD_STEP: f32 = 200.0;

#[derive(Default)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    boost: bool,
}

struct WindowState {
    window: Arc<Window>,
    scene: SceneRenderer,
    camera: CameraRig,
    held: HeldKeys,
    start_time: Instant,
    last_frame: Instant,
    mouse_look: bool,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let scene = SceneRenderer::new(window.as_ref(), size, config)?;
        let camera = CameraRig::new(Vec3::new(0.0, 2000.0, 0.0), YAW_DEFAULT, PITCH_DEFAULT);
        let now = Instant::now();
        Ok(Self {
            window,
            scene,
            camera,
            held: HeldKeys::default(),
            start_time: now,
            last_frame: now,
            mouse_look: false,
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.scene.size()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.scene.resize(new_size);
    }

    /// Handles a key event; returns true when the application should exit.
    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        let pressed = event.state == ElementState::Pressed;

        match code {
            KeyCode::KeyW => self.held.forward = pressed,
            KeyCode::KeyS => self.held.backward = pressed,
            KeyCode::KeyA => self.held.left = pressed,
            KeyCode::KeyD => self.held.right = pressed,
            KeyCode::Space => self.held.up = pressed,
            KeyCode::ShiftLeft => self.held.down = pressed,
            KeyCode::ControlLeft => self.held.boost = pressed,
            _ => {}
        }

        if !pressed || event.repeat {
            return false;
        }
        match code {
            KeyCode::Escape => return true,
            KeyCode::Digit1
            | KeyCode::Digit2
            | KeyCode::Digit3
            | KeyCode::Digit4
            | KeyCode::Digit5
            | KeyCode::Digit6
            | KeyCode::Digit7
            | KeyCode::Digit8 => {
                let digit = digit_value(code);
                if let Some(mode) = SceneMode::from_digit(digit) {
                    self.scene.set_mode(mode);
                }
            }
            KeyCode::KeyT => self.scene.toggle_temporal(),
            KeyCode::BracketLeft => self.scene.nudge_history_weight(-WEIGHT_STEP),
            KeyCode::BracketRight => self.scene.nudge_history_weight(WEIGHT_STEP),
            KeyCode::NumpadAdd => self.scene.shift_cloud_layer(CLOUD_STEP),
            KeyCode::NumpadSubtract => self.scene.shift_cloud_layer(-CLOUD_STEP),
            _ => {}
        }
        false
    }

    fn handle_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.mouse_look {
            // Screen y grows downward; looking up is a negative delta.
            self.camera.apply_mouse(delta.0 as f32, -delta.1 as f32);
        }
    }

    fn set_mouse_look(&mut self, enabled: bool) {
        let result = if enabled {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "cursor grab change failed");
        }
        self.window.set_cursor_visible(!enabled);
        self.mouse_look = enabled;
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let mut speed = self.scene.move_speed();
        if self.held.boost {
            speed *= BOOST_FACTOR;
        }
        let step = speed * dt;
        if self.held.forward {
            self.camera.advance(Movement::Forward, step);
        }
        if self.held.backward {
            self.camera.advance(Movement::Backward, step);
        }
        if self.held.right {
            self.camera.advance(Movement::Right, step);
        }
        if self.held.left {
            self.camera.advance(Movement::Left, step);
        }
        if self.held.up {
            self.camera.advance(Movement::Up, step);
        }
        if self.held.down {
            self.camera.advance(Movement::Down, step);
        }

        let snapshot = self.camera.snapshot();
        let time = self.start_time.elapsed().as_secs_f32();
        self.scene.render(&snapshot, time, self.window.inner_size())
    }
}

fn digit_value(code: KeyCode) -> u8 {
    match code {
        KeyCode::Digit1 => 1,
        KeyCode::Digit2 => 2,
        KeyCode::Digit3 => 3,
        KeyCode::Digit4 => 4,
        KeyCode::Digit5 => 5,
        KeyCode::Digit6 => 6,
        KeyCode::Digit7 => 7,
        KeyCode::Digit8 => 8,
        _ => 0,
    }
}

/// Opens the window and drives the event loop until exit.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("Overcast")
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), config)?;
    state.set_mouse_look(true);
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            // Drive redraws via vblank by waiting between events.
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            elwt.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            state.resize(new_size);
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if state.handle_key(&event) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button,
                            ..
                        } => {
                            // Holding the right button releases the cursor,
                            // letting it leave the window.
                            if button == MouseButton::Right {
                                state.set_mouse_look(button_state == ElementState::Released);
                            }
                        }
                        WindowEvent::ScaleFactorChanged {
                            mut inner_size_writer,
                            ..
                        } => {
                            // Keep the current logical size when the scale factor changes.
                            let _ = inner_size_writer.request_inner_size(state.size());
                        }
                        WindowEvent::RedrawRequested => match state.render_frame() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size());
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                tracing::error!("surface out of memory; exiting");
                                elwt.exit();
                            }
                            Err(wgpu::SurfaceError::Timeout) => {
                                tracing::warn!("surface timeout; retrying next frame");
                            }
                            Err(other) => {
                                tracing::warn!(error = ?other, "surface error; retrying next frame");
                            }
                        },
                        _ => {}
                    }
                }
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } => {
                    state.handle_mouse_motion(delta);
                }
                Event::AboutToWait => {
                    // Schedule the next frame once winit is about to wait for events again.
                    state.window().request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}
