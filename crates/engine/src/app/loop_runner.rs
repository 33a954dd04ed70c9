use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;
use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, ExternalError, OsError};
use winit::event::{
    DeviceEvent, ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use super::input::{ActionStates, EdgeTracker, KeyLatch};
use super::metrics::MetricsWindow;
use super::pacing::FramePacer;
use super::rendering::OverlayData;
use super::{
    InputAction, InputEdge, InputSnapshot, MetricsHandle, Renderer, Scene, SceneCommand,
    SceneHost,
};

pub const SLOW_FRAME_ENV_VAR: &str = "COURTYARD_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    /// Screen pixels per software-rendered pixel.
    pub pixel_ratio: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Holiday Courtyard".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            pixel_ratio: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    run_app_with_metrics(config, scene, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let renderer =
        Renderer::new(Arc::clone(&window), config.pixel_ratio).map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let now = Instant::now();
    let metrics_interval = if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    };
    let mut state = LoopState {
        host: SceneHost::new(scene),
        renderer,
        pacer: FramePacer::new(&config, now),
        metrics_window: MetricsWindow::new(metrics_interval, now),
        metrics_handle,
        input: InputCollector::default(),
        overlay_visible: false,
        applied_title: None,
        base_title: config.window_title.clone(),
    };

    state.host.load();
    info!(
        primitive_count = state.host.world().primitive_count(),
        buffer_width = state.renderer.viewport().width,
        buffer_height = state.renderer.viewport().height,
        "scene_loaded"
    );
    info!(
        target_tps = config.target_tps.max(1),
        fixed_dt_ms = state.pacer.fixed_dt().as_secs_f64() * 1000.0,
        max_ticks_per_frame = state.pacer.max_ticks_per_frame(),
        slow_frame_delay_ms = state.pacer.slow_frame_delay().as_millis() as u64,
        render_fps_cap = ?state.pacer.render_cap_fps(),
        pixel_ratio = config.pixel_ratio,
        "loop_config"
    );

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                state.on_window_event(event, &window, target);
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => state.input.add_mouse_motion(delta.0 as f32, delta.1 as f32),
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                state.host.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Everything the event loop closure owns between callbacks.
struct LoopState {
    host: SceneHost,
    renderer: Renderer,
    pacer: FramePacer,
    metrics_window: MetricsWindow,
    metrics_handle: MetricsHandle,
    input: InputCollector,
    overlay_visible: bool,
    applied_title: Option<String>,
    base_title: String,
}

impl LoopState {
    fn on_window_event(
        &mut self,
        event: WindowEvent,
        window: &Window,
        target: &EventLoopWindowTarget<()>,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                target.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height, target),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.resize(size.width, size.height, target);
            }
            WindowEvent::Focused(false) if self.input.pointer_captured => {
                release_pointer(window);
                self.input.mark_capture_lost();
                info!(reason = "focus_lost", "pointer_released");
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_input(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => self.input.handle_mouse_wheel(delta),
            WindowEvent::KeyboardInput { event, .. } => {
                match self.input.handle_keyboard_input(&event) {
                    EscapeOutcome::ReleasePointer => {
                        release_pointer(window);
                        info!(reason = "escape_key", "pointer_released");
                    }
                    EscapeOutcome::Quit => {
                        info!(reason = "escape_key", "shutdown_requested");
                        target.exit();
                    }
                    EscapeOutcome::None => {}
                }
            }
            WindowEvent::RedrawRequested => self.redraw(window, target),
            _ => {}
        }
    }

    fn resize(&mut self, width: u32, height: u32, target: &EventLoopWindowTarget<()>) {
        if let Err(error) = self.renderer.resize(width, height) {
            warn!(error = %error, "renderer_resize_failed");
            target.exit();
        }
    }

    fn redraw(&mut self, window: &Window, target: &EventLoopWindowTarget<()>) {
        if std::mem::take(&mut self.input.overlay_toggled) {
            self.overlay_visible = !self.overlay_visible;
            info!(overlay_visible = self.overlay_visible, "overlay_toggled");
        }
        let slow_frame_delay = self.pacer.slow_frame_delay();
        if !slow_frame_delay.is_zero() {
            thread::sleep(slow_frame_delay);
        }

        let frame_start = Instant::now();
        let step = self.pacer.begin_frame(frame_start);
        let fixed_dt_seconds = self.pacer.fixed_dt().as_secs_f32();
        for _ in 0..step.ticks {
            let snapshot = self.input.snapshot_for_tick();
            let command = self.host.update(fixed_dt_seconds, &snapshot);
            self.apply_command(command, window, target);
        }
        self.metrics_window.on_ticks(step.ticks);
        if !step.dropped_backlog.is_zero() {
            self.metrics_window.on_sim_clamp(step.dropped_backlog);
            warn!(
                dropped_backlog_ms = step.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.pacer.max_ticks_per_frame(),
                "sim_clamp_triggered"
            );
        }

        let present_wait = self.pacer.present_wait(Instant::now());
        if !present_wait.is_zero() {
            thread::sleep(present_wait);
        }
        self.host.render();
        let primitive_count = self.host.world().primitive_count();
        let overlay = self.overlay_visible.then(|| OverlayData {
            metrics: self.metrics_handle.snapshot(),
            render_fps_cap: self.pacer.render_cap_fps(),
            primitive_count,
        });
        if let Err(error) = self.renderer.render_world(self.host.world(), overlay.as_ref()) {
            warn!(error = %error, "renderer_draw_failed");
            target.exit();
        }
        self.pacer.mark_presented(Instant::now());

        let title = self.host.debug_title();
        if title != self.applied_title {
            window.set_title(title.as_deref().unwrap_or(&self.base_title));
            self.applied_title = title;
        }

        self.metrics_window.on_frame(step.frame_dt, primitive_count);
        if let Some(snapshot) = self.metrics_window.close_if_due(frame_start) {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_ms = snapshot.worst_frame_ms,
                sim_clamps = snapshot.sim_clamps,
                peak_primitives = snapshot.peak_primitives,
                "loop_metrics"
            );
        }
    }

    fn apply_command(
        &mut self,
        command: SceneCommand,
        window: &Window,
        target: &EventLoopWindowTarget<()>,
    ) {
        match command {
            SceneCommand::None => {}
            SceneCommand::CapturePointer => match grab_pointer(window) {
                Ok(()) => {
                    self.input.set_pointer_captured(true);
                    info!("pointer_captured");
                }
                Err(error) => {
                    warn!(error = %error, "pointer_capture_failed");
                    self.input.mark_capture_lost();
                }
            },
            SceneCommand::ReleasePointer => {
                release_pointer(window);
                self.input.set_pointer_captured(false);
                debug!("pointer_released_by_scene");
            }
            SceneCommand::Quit => {
                info!(reason = "scene_command", "shutdown_requested");
                target.exit();
            }
        }
    }
}

fn grab_pointer(window: &Window) -> Result<(), ExternalError> {
    window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))?;
    window.set_cursor_visible(false);
    Ok(())
}

fn release_pointer(window: &Window) {
    if let Err(error) = window.set_cursor_grab(CursorGrabMode::None) {
        warn!(error = %error, "pointer_release_failed");
    }
    window.set_cursor_visible(true);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeOutcome {
    None,
    ReleasePointer,
    Quit,
}

/// Raw window input folded into per-tick snapshots.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    actions: ActionStates,
    edges: EdgeTracker,
    escape: KeyLatch,
    overlay_key: KeyLatch,
    overlay_toggled: bool,
    zoom_in_key: KeyLatch,
    zoom_out_key: KeyLatch,
    pending_zoom_steps: i32,
    mouse_delta: Vec2,
    pointer_captured: bool,
    pointer_capture_lost: bool,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) -> EscapeOutcome {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return EscapeOutcome::None;
        };
        self.handle_key(code, key_event.state == ElementState::Pressed)
    }

    fn handle_key(&mut self, code: KeyCode, is_pressed: bool) -> EscapeOutcome {
        if let Some(action) = action_for_key(code) {
            self.actions.set(action, is_pressed);
        }
        if let Some(edge) = edge_for_key(code) {
            self.edges.handle(edge, is_pressed);
        }
        match code {
            KeyCode::F3 => self.overlay_toggled |= self.overlay_key.update(is_pressed),
            KeyCode::Equal | KeyCode::NumpadAdd | KeyCode::KeyI => {
                if self.zoom_in_key.update(is_pressed) {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
            }
            KeyCode::Minus | KeyCode::NumpadSubtract | KeyCode::KeyK => {
                if self.zoom_out_key.update(is_pressed) {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
            }
            KeyCode::Escape => return self.handle_escape(is_pressed),
            _ => {}
        }
        EscapeOutcome::None
    }

    /// Escape frees a captured pointer first and only quits once the pointer is free.
    fn handle_escape(&mut self, is_pressed: bool) -> EscapeOutcome {
        self.actions.set(InputAction::Quit, is_pressed);
        if !self.escape.update(is_pressed) {
            return EscapeOutcome::None;
        }
        if self.pointer_captured {
            self.mark_capture_lost();
            EscapeOutcome::ReleasePointer
        } else {
            self.quit_requested = true;
            EscapeOutcome::Quit
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.edges
                .handle(InputEdge::PrimaryClick, state == ElementState::Pressed);
        }
    }

    fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
            MouseScrollDelta::PixelDelta(position) if position.y > 0.0 => 1,
            MouseScrollDelta::PixelDelta(position) if position.y < 0.0 => -1,
            MouseScrollDelta::PixelDelta(_) => 0,
        };
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        if self.pointer_captured {
            self.mouse_delta += Vec2::new(dx, dy);
        }
    }

    fn set_pointer_captured(&mut self, captured: bool) {
        self.pointer_captured = captured;
        if !captured {
            self.mouse_delta = Vec2::ZERO;
        }
    }

    fn mark_capture_lost(&mut self) {
        self.set_pointer_captured(false);
        self.pointer_capture_lost = true;
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.actions,
            self.edges.take(),
            std::mem::take(&mut self.mouse_delta),
            self.pointer_captured,
            std::mem::take(&mut self.pointer_capture_lost),
            std::mem::take(&mut self.pending_zoom_steps),
        )
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveForward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveBack),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyJ => Some(InputAction::OrbitLeft),
        KeyCode::KeyL => Some(InputAction::OrbitRight),
        _ => None,
    }
}

fn edge_for_key(code: KeyCode) -> Option<InputEdge> {
    match code {
        KeyCode::Space => Some(InputEdge::Jump),
        KeyCode::KeyF => Some(InputEdge::ToggleFirstPerson),
        KeyCode::KeyB => Some(InputEdge::ToggleStorm),
        KeyCode::KeyG => Some(InputEdge::ToggleFireworks),
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(InputEdge::Slot1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(InputEdge::Slot2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(InputEdge::Slot3),
        KeyCode::KeyQ => Some(InputEdge::Holster),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn movement_keys_map_to_held_actions() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::KeyW, true);
        input.handle_key(KeyCode::ArrowLeft, true);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert!(input.snapshot_for_tick().is_down(InputAction::MoveForward));

        input.handle_key(KeyCode::KeyW, false);
        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveForward));
    }

    #[test]
    fn item_keys_are_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::Digit2, true);
        input.handle_key(KeyCode::Digit2, true);

        assert!(input.snapshot_for_tick().pressed(InputEdge::Slot2));
        assert!(!input.snapshot_for_tick().pressed(InputEdge::Slot2));

        input.handle_key(KeyCode::Digit2, false);
        input.handle_key(KeyCode::Digit2, true);
        assert!(input.snapshot_for_tick().pressed(InputEdge::Slot2));
    }

    #[test]
    fn left_click_is_edge_triggered() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);

        assert!(input.snapshot_for_tick().pressed(InputEdge::PrimaryClick));
        assert!(!input.snapshot_for_tick().pressed(InputEdge::PrimaryClick));
    }

    #[test]
    fn mouse_motion_only_accumulates_while_captured() {
        let mut input = InputCollector::default();
        input.add_mouse_motion(5.0, 5.0);
        assert_eq!(input.snapshot_for_tick().mouse_delta(), Vec2::ZERO);

        input.set_pointer_captured(true);
        input.add_mouse_motion(3.0, -1.0);
        input.add_mouse_motion(2.0, 4.0);
        let snapshot = input.snapshot_for_tick();
        assert_eq!(snapshot.mouse_delta(), Vec2::new(5.0, 3.0));
        assert!(snapshot.pointer_captured());
        assert_eq!(input.snapshot_for_tick().mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn escape_releases_capture_before_quitting() {
        let mut input = InputCollector::default();
        input.set_pointer_captured(true);

        assert_eq!(input.handle_key(KeyCode::Escape, true), EscapeOutcome::ReleasePointer);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.pointer_capture_lost());
        assert!(!snapshot.pointer_captured());
        assert!(!snapshot.quit_requested());
        assert!(!input.snapshot_for_tick().pointer_capture_lost());

        assert_eq!(input.handle_key(KeyCode::Escape, true), EscapeOutcome::None);
        input.handle_key(KeyCode::Escape, false);
        assert_eq!(input.handle_key(KeyCode::Escape, true), EscapeOutcome::Quit);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn zoom_keys_and_wheel_share_pending_steps() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::KeyI, true);
        input.handle_key(KeyCode::KeyI, true);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);

        input.handle_key(KeyCode::Minus, true);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -2.0));
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), -3);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 0);
    }

    #[test]
    fn pixel_wheel_delta_is_one_step_per_event() {
        let mut input = InputCollector::default();
        input.handle_mouse_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 3.0)));
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);
        input.handle_mouse_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -5.0)));
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), -1);
        input.handle_mouse_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 0.0)));
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 0);
    }

    #[test]
    fn overlay_toggle_fires_once_per_press() {
        let mut input = InputCollector::default();
        input.handle_key(KeyCode::F3, true);
        input.handle_key(KeyCode::F3, true);
        assert!(std::mem::take(&mut input.overlay_toggled));
        assert!(!input.overlay_toggled);
    }
}
