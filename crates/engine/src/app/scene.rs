use glam::Vec2;

use super::input::{ActionStates, EdgeStates, InputAction, InputEdge};
use super::rendering::{Camera3D, Color, Primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    CapturePointer,
    ReleasePointer,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    edges: EdgeStates,
    mouse_delta: Vec2,
    pointer_captured: bool,
    pointer_capture_lost: bool,
    zoom_delta_steps: i32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        edges: EdgeStates,
        mouse_delta: Vec2,
        pointer_captured: bool,
        pointer_capture_lost: bool,
        zoom_delta_steps: i32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            edges,
            mouse_delta,
            pointer_captured,
            pointer_capture_lost,
            zoom_delta_steps,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, edge: InputEdge) -> bool {
        self.edges.was_pressed(edge)
    }

    /// Raw pointer motion since the previous tick; always zero while the pointer is free.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    pub fn pointer_capture_lost(&self) -> bool {
        self.pointer_capture_lost
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pressed(mut self, edge: InputEdge) -> Self {
        self.edges.set(edge);
        self
    }

    pub fn with_mouse_delta(mut self, mouse_delta: Vec2) -> Self {
        self.mouse_delta = mouse_delta;
        self
    }

    pub fn with_pointer_captured(mut self, pointer_captured: bool) -> Self {
        self.pointer_captured = pointer_captured;
        self
    }

    pub fn with_pointer_capture_lost(mut self, pointer_capture_lost: bool) -> Self {
        self.pointer_capture_lost = pointer_capture_lost;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudSlot {
    pub label: &'static str,
    pub count: u32,
    pub selected: bool,
}

/// Screen-space overlay state written by the scene every render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudState {
    pub slots: Vec<HudSlot>,
    /// Filled fraction and label of the meter bar.
    pub meter: Option<(f32, String)>,
    pub status: Option<String>,
    pub banner: Option<String>,
    pub hint: Option<String>,
    pub vignette: f32,
    pub crosshair: bool,
}

impl HudState {
    pub fn clear(&mut self) {
        self.slots.clear();
        self.meter = None;
        self.status = None;
        self.banner = None;
        self.hint = None;
        self.vignette = 0.0;
        self.crosshair = false;
    }
}

#[derive(Debug, Clone)]
pub struct SceneWorld {
    camera: Camera3D,
    sky_color: Color,
    static_primitives: Vec<Primitive>,
    frame_primitives: Vec<Primitive>,
    hud: HudState,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            camera: Camera3D::default(),
            sky_color: [12, 16, 34, 255],
            static_primitives: Vec::new(),
            frame_primitives: Vec::new(),
            hud: HudState::default(),
        }
    }
}

impl SceneWorld {
    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera3D) {
        self.camera = camera;
    }

    pub fn sky_color(&self) -> Color {
        self.sky_color
    }

    pub fn set_sky_color(&mut self, color: Color) {
        self.sky_color = color;
    }

    /// Geometry that lives for the whole session.
    pub fn push_static(&mut self, primitive: Primitive) {
        self.static_primitives.push(primitive);
    }

    pub fn extend_static(&mut self, primitives: impl IntoIterator<Item = Primitive>) {
        self.static_primitives.extend(primitives);
    }

    /// Geometry drawn for the next frame only.
    pub fn push(&mut self, primitive: Primitive) {
        self.frame_primitives.push(primitive);
    }

    pub fn extend(&mut self, primitives: impl IntoIterator<Item = Primitive>) {
        self.frame_primitives.extend(primitives);
    }

    pub fn begin_frame(&mut self) {
        self.frame_primitives.clear();
        self.hud.clear();
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.static_primitives
            .iter()
            .chain(self.frame_primitives.iter())
    }

    pub fn primitive_count(&self) -> usize {
        self.static_primitives.len() + self.frame_primitives.len()
    }

    pub fn hud(&self) -> &HudState {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut HudState {
        &mut self.hud
    }

    pub fn clear(&mut self) {
        self.static_primitives.clear();
        self.frame_primitives.clear();
        self.hud.clear();
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &mut SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// Owns the running scene together with the world it draws into.
pub struct SceneHost {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneHost {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            return SceneCommand::None;
        }
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub fn render(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.world.begin_frame();
        self.scene.render(&mut self.world);
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}
