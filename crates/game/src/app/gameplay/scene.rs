use std::f32::consts::FRAC_PI_4;

use engine::{
    Camera3D, HudSlot, InputAction, InputEdge, InputSnapshot, MusicMode, Primitive, Projection,
    Scene, SceneCommand, SceneWorld, SoundBank, SoundId, Vec3,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use super::collision::CollisionWorld;
use super::effects::{FireworksShow, Snow, SpeakerLed, TreeLights, BASE_FLAKES};
use super::entities::{Crowd, Populations};
use super::events::{CourtyardEvent, CourtyardEventBus};
use super::intoxication::{CameraSway, IntoxicationController, MAX_LEVEL};
use super::items::{InventoryCounts, ItemSlot, ItemSystem, SLOT_LABELS};
use super::locomotion::Locomotion;
use super::player_body::PlayerBody;
use super::world_layout::{self, BUILDINGS, SKY_COLOR, STREET_LAMPS};

/// Horizontal distance of the default (50, 50, 50) vantage point.
const OVERVIEW_RADIUS: f32 = 70.71;
const OVERVIEW_HEIGHT: f32 = 50.0;
const OVERVIEW_VIEW_HEIGHT: f32 = 40.0;
const ORBIT_STEP: f32 = 0.02;
const ZOOM_STEP: f32 = 1.1;
const ZOOM_MIN: f32 = 0.5;
const ZOOM_MAX: f32 = 3.0;
const MAX_DISPATCH_ROUNDS: usize = 8;
const TICK_ORDER_TEXT: &str =
    "Entities>Decorations>Effects>Intoxication>CameraControls>Sway>Locomotion>PlayerBody>Items>EventDispatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickStage {
    Entities,
    Decorations,
    Effects,
    Intoxication,
    CameraControls,
    Sway,
    Locomotion,
    PlayerBody,
    Items,
    EventDispatch,
}

/// Tunables the scene is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CourtyardSettings {
    pub(crate) seed: u64,
    pub(crate) inventory: InventoryCounts,
    pub(crate) populations: Populations,
    pub(crate) snow_flakes: usize,
}

impl Default for CourtyardSettings {
    fn default() -> Self {
        Self {
            seed: 2026,
            inventory: InventoryCounts::default(),
            populations: Populations::default(),
            snow_flakes: BASE_FLAKES,
        }
    }
}

/// Orthographic camera circling the courtyard at a fixed elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OverviewCamera {
    pub(crate) azimuth: f32,
    pub(crate) zoom: f32,
}

impl Default for OverviewCamera {
    fn default() -> Self {
        Self {
            azimuth: FRAC_PI_4,
            zoom: 1.0,
        }
    }
}

impl OverviewCamera {
    fn update(&mut self, input: &InputSnapshot) {
        if input.is_down(InputAction::OrbitLeft) {
            self.azimuth -= ORBIT_STEP;
        }
        if input.is_down(InputAction::OrbitRight) {
            self.azimuth += ORBIT_STEP;
        }
        let steps = input.zoom_delta_steps();
        if steps != 0 {
            self.zoom = (self.zoom * ZOOM_STEP.powi(steps)).clamp(ZOOM_MIN, ZOOM_MAX);
        }
    }

    pub(crate) fn camera(&self) -> Camera3D {
        let position = Vec3::new(
            self.azimuth.sin() * OVERVIEW_RADIUS,
            OVERVIEW_HEIGHT,
            self.azimuth.cos() * OVERVIEW_RADIUS,
        );
        Camera3D::looking_at(
            position,
            Vec3::ZERO,
            Projection::Orthographic {
                view_height: OVERVIEW_VIEW_HEIGHT / self.zoom,
            },
        )
    }
}

pub(crate) struct CourtyardScene {
    settings: CourtyardSettings,
    rng: SmallRng,
    sounds: SoundBank,
    collision: CollisionWorld,
    crowd: Crowd,
    tree_lights: TreeLights,
    speaker_led: SpeakerLed,
    snow: Snow,
    show: FireworksShow,
    intoxication: IntoxicationController,
    locomotion: Locomotion,
    body: PlayerBody,
    items: ItemSystem,
    overview: OverviewCamera,
    events: CourtyardEventBus,
    last_tick_order: Vec<TickStage>,
    tick_count: u64,
}

impl CourtyardScene {
    pub(crate) fn new(settings: CourtyardSettings, sounds: SoundBank) -> Self {
        let mut rng = SmallRng::seed_from_u64(settings.seed);
        let mut collision = CollisionWorld::courtyard(&BUILDINGS);
        collision.add_street_lamps(&STREET_LAMPS);
        let crowd = Crowd::spawn(settings.populations, &mut rng);
        let tree_lights = TreeLights::new(&mut rng);
        let snow = Snow::new(settings.snow_flakes, &mut rng);
        Self {
            settings,
            rng,
            sounds,
            collision,
            crowd,
            tree_lights,
            speaker_led: SpeakerLed::default(),
            snow,
            show: FireworksShow::default(),
            intoxication: IntoxicationController::default(),
            locomotion: Locomotion::default(),
            body: PlayerBody::default(),
            items: ItemSystem::new(settings.inventory),
            overview: OverviewCamera::default(),
            events: CourtyardEventBus::default(),
            last_tick_order: Vec::with_capacity(10),
            tick_count: 0,
        }
    }

    /// Edge-triggered toggles and item keys. Runs before the simulation stages.
    fn route_input(&mut self, input: &InputSnapshot) -> SceneCommand {
        let mut command = SceneCommand::None;

        let capture_lost = input.pointer_capture_lost() && self.locomotion.is_active();
        if capture_lost {
            self.locomotion.on_capture_lost(&mut self.events);
        }

        // A capture loss owns the tick; re-entering would immediately grab the pointer again.
        if input.pressed(InputEdge::ToggleFirstPerson) && !capture_lost {
            if self.locomotion.is_active() {
                self.locomotion.deactivate(&mut self.events);
                command = SceneCommand::ReleasePointer;
            } else {
                self.locomotion.activate();
                self.sounds.set_music_mode(MusicMode::Positional);
                command = SceneCommand::CapturePointer;
            }
        }
        if input.pressed(InputEdge::ToggleStorm) {
            self.snow.toggle_storm(&mut self.rng, &mut self.events);
        }
        if input.pressed(InputEdge::ToggleFireworks) {
            self.show.toggle(&mut self.rng, &mut self.events);
        }

        if !self.locomotion.is_active() {
            return command;
        }
        if input.pointer_captured() {
            let delta = input.mouse_delta();
            self.locomotion.apply_mouse_delta(delta.x, delta.y);
        }
        if self.intoxication.is_passed_out() {
            return command;
        }

        let slot_keys = [InputEdge::Slot1, InputEdge::Slot2, InputEdge::Slot3];
        for (index, edge) in slot_keys.into_iter().enumerate() {
            if input.pressed(edge) {
                self.items.select_slot(index, &mut self.events);
            }
        }
        if input.pressed(InputEdge::Holster) {
            self.items.holster(&mut self.events);
        }
        if input.pressed(InputEdge::PrimaryClick) && input.pointer_captured() {
            self.items.use_current(
                self.locomotion.position(),
                self.locomotion.yaw(),
                &mut self.events,
            );
        }
        command
    }

    fn run_tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        self.last_tick_order.clear();
        let dt_ms = fixed_dt_seconds * 1000.0;
        let player_position = self.locomotion.position();

        self.crowd.update(&mut self.rng);
        self.last_tick_order.push(TickStage::Entities);

        self.tree_lights.update(fixed_dt_seconds);
        self.speaker_led.update();
        self.last_tick_order.push(TickStage::Decorations);

        self.snow.update(&mut self.rng);
        self.show.update(dt_ms, &mut self.rng, &mut self.events);
        self.last_tick_order.push(TickStage::Effects);

        self.intoxication.set_player_position(player_position);
        self.intoxication
            .update(dt_ms, &mut self.rng, &mut self.events);
        self.last_tick_order.push(TickStage::Intoxication);

        if !self.locomotion.is_active() {
            self.overview.update(input);
        }
        self.last_tick_order.push(TickStage::CameraControls);

        let sway = if self.locomotion.is_active() {
            self.intoxication.camera_sway()
        } else {
            CameraSway::ZERO
        };
        self.locomotion.set_sway(sway);
        self.last_tick_order.push(TickStage::Sway);

        self.locomotion.update(input, &self.collision);
        self.last_tick_order.push(TickStage::Locomotion);

        if self.locomotion.is_active() {
            let walking =
                self.locomotion.is_moving(input) && !self.intoxication.is_passed_out();
            self.body.set_walking(walking);
            self.body.update();
            self.update_footsteps(walking);
            self.last_tick_order.push(TickStage::PlayerBody);

            self.items
                .update(fixed_dt_seconds, &mut self.rng, &mut self.events);
            self.last_tick_order.push(TickStage::Items);
        }

        let dispatched = self.dispatch_events();
        self.last_tick_order.push(TickStage::EventDispatch);
        trace!(
            tick = self.tick_count,
            stages = self.last_tick_order.len(),
            events = dispatched,
            "tick_complete"
        );
    }

    fn update_footsteps(&mut self, walking: bool) {
        let looping = self.sounds.is_looping(SoundId::Footstep);
        if walking && !looping {
            self.events.emit(CourtyardEvent::StartLoop(SoundId::Footstep));
        } else if !walking && looping {
            self.events.emit(CourtyardEvent::StopLoop(SoundId::Footstep));
        }
    }

    /// Routes events until the bus stays empty; returns how many were handled.
    fn dispatch_events(&mut self) -> usize {
        let mut dispatched = 0;
        for _ in 0..MAX_DISPATCH_ROUNDS {
            if self.events.is_empty() {
                return dispatched;
            }
            let batch: Vec<CourtyardEvent> = self.events.drain().collect();
            dispatched += batch.len();
            for event in batch {
                self.dispatch(event);
            }
        }
        if !self.events.is_empty() {
            warn!(pending = self.events.len(), "event_dispatch_round_limit");
        }
        dispatched
    }

    fn dispatch(&mut self, event: CourtyardEvent) {
        match event {
            CourtyardEvent::DrinkConsumed => {
                self.intoxication.drink(&mut self.rng, &mut self.events);
            }
            CourtyardEvent::PassedOut => {
                self.locomotion.set_can_move(false);
                self.sounds.stop(SoundId::Footstep);
                info!(
                    hallucinations = self.intoxication.hallucinations().len(),
                    "player_frozen"
                );
            }
            CourtyardEvent::WokeUp => self.locomotion.set_can_move(true),
            CourtyardEvent::FirstPersonExited => {
                self.items.hide_all(&mut self.events);
                self.intoxication.reset();
                self.locomotion.set_can_move(true);
                self.body = PlayerBody::default();
                self.sounds.stop(SoundId::Footstep);
                self.sounds.set_music_mode(MusicMode::Global);
            }
            CourtyardEvent::PlaySound(id) => self.sounds.play(id),
            CourtyardEvent::StartLoop(id) => self.sounds.play_loop(id),
            CourtyardEvent::StopLoop(id) => self.sounds.stop(id),
            CourtyardEvent::ItemCountChanged { slot, count } => {
                debug!(slot = ?slot, count, "hud_slot_updated");
            }
        }
    }

    fn active_camera(&self) -> Camera3D {
        if self.locomotion.is_active() {
            self.locomotion.camera_pose()
        } else {
            self.overview.camera()
        }
    }

    fn render_hud(&self, world: &mut SceneWorld) {
        let hud = world.hud_mut();
        if self.show.is_active() {
            hud.banner = Some("HAPPY NEW YEAR 2026!".to_string());
        }
        if !self.locomotion.is_active() {
            hud.hint = Some("F WALK  B STORM  G FIREWORKS  J/L ORBIT  I/K ZOOM".to_string());
            return;
        }

        let counts = self.items.counts();
        let equipped = self.items.equipped();
        hud.slots = ItemSlot::ALL
            .iter()
            .map(|slot| HudSlot {
                label: SLOT_LABELS[slot.index()],
                count: counts.get(*slot),
                selected: equipped == Some(*slot),
            })
            .collect();
        hud.crosshair = !self.intoxication.is_passed_out();
        hud.vignette = self.intoxication.vignette_strength();
        if let Some(seconds) = self.intoxication.passed_out_seconds_left() {
            hud.status = Some(format!("PASSED OUT {seconds}"));
        } else if self.intoxication.level() > 0 {
            hud.meter = Some((
                f32::from(self.intoxication.level()) / f32::from(MAX_LEVEL),
                "DRUNK".to_string(),
            ));
        }
        hud.hint = Some("1/2/3 ITEMS  Q HOLSTER  CLICK USE  ESC EXIT".to_string());
    }

    fn push_bubbles(&self, camera: &Camera3D, out: &mut Vec<Primitive>) {
        for bubble in self.intoxication.bubbles() {
            let rise = bubble.rise();
            let local = Vec3::new((bubble.x - 0.5) * 1.6, -0.6 + rise * 1.4, -1.0);
            let alpha = ((1.0 - rise) * 230.0) as u8;
            out.push(Primitive::point(
                camera.from_view_space(local),
                bubble.size / 800.0,
                [255, 238, 136, alpha],
            ));
        }
    }
}

#[cfg(test)]
impl CourtyardScene {
    pub(crate) fn last_tick_order(&self) -> &[TickStage] {
        &self.last_tick_order
    }

    pub(crate) fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub(crate) fn intoxication(&self) -> &IntoxicationController {
        &self.intoxication
    }

    pub(crate) fn items(&self) -> &ItemSystem {
        &self.items
    }

    pub(crate) fn sounds(&self) -> &SoundBank {
        &self.sounds
    }

    pub(crate) fn snow(&self) -> &Snow {
        &self.snow
    }

    pub(crate) fn show(&self) -> &FireworksShow {
        &self.show
    }

    pub(crate) fn overview(&self) -> OverviewCamera {
        self.overview
    }

    pub(crate) fn collision(&self) -> &CollisionWorld {
        &self.collision
    }

}

impl Scene for CourtyardScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.set_sky_color(SKY_COLOR);
        world.extend_static(world_layout::build_static_primitives(&mut self.rng));
        world.set_camera(self.overview.camera());
        self.sounds.start_music();
        info!(
            scene = "courtyard",
            seed = self.settings.seed,
            entity_count = self.crowd.len(),
            colliders = self.collision.collider_count(),
            static_primitives = world.primitive_count(),
            "scene_loaded"
        );
        info!(scene = "courtyard", "sys: {}", TICK_ORDER_TEXT);
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let command = self.route_input(input);
        self.run_tick(fixed_dt_seconds, input);
        self.tick_count += 1;
        world.set_camera(self.active_camera());
        command
    }

    fn render(&mut self, world: &mut SceneWorld) {
        let camera = self.active_camera();
        world.set_camera(camera);

        let mut primitives = Vec::new();
        self.crowd.push_primitives(&mut primitives);
        self.tree_lights.push_primitives(&mut primitives);
        self.speaker_led.push_primitives(&mut primitives);
        self.snow.push_primitives(&mut primitives);
        self.show.push_primitives(&mut primitives);
        self.intoxication.push_primitives(&mut primitives);
        if self.locomotion.is_active() {
            self.body.push_primitives(&camera, &mut primitives);
            let hand = self.body.hand_position(&camera);
            self.items
                .push_primitives(hand, self.locomotion.yaw(), &mut primitives);
            self.push_bubbles(&camera, &mut primitives);
        } else {
            self.items.push_world_primitives(&mut primitives);
        }
        world.extend(primitives);

        self.render_hud(world);
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(
            scene = "courtyard",
            ticks = self.tick_count,
            primitives = world.primitive_count(),
            "scene_unload"
        );
        self.sounds.stop_all();
        self.events = CourtyardEventBus::default();
        self.last_tick_order.clear();
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let camera = world.camera();
        let mode = if self.locomotion.is_active() {
            "Walk"
        } else {
            "Overview"
        };
        Some(format!(
            "Holiday Courtyard | {} | Camera ({:.1}, {:.1}, {:.1}) | Drunk {} | Flakes {} | Bursts {}",
            mode,
            camera.position.x,
            camera.position.y,
            camera.position.z,
            self.intoxication.level(),
            self.snow.flake_count(),
            self.show.burst_count() + self.items.bursts().len(),
        ))
    }
}
