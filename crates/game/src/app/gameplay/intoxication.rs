//! Drunkenness level, the passed-out sub-state and the things the player sees
//! while it lasts.
//!
//! Countdowns are in milliseconds and are fed `fixed_dt * 1000` every tick.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use engine::{Color, Primitive, Vec3};
use rand::Rng;
use tracing::{debug, info};

use super::events::{CourtyardEvent, CourtyardEventBus};

pub(crate) const MAX_LEVEL: u8 = 5;
const DECAY_MS: f32 = 10_000.0;
const PASS_OUT_MS: f32 = 10_000.0;
const WAKE_LEVEL: u8 = 2;
const WAKE_DECAY_MS: f32 = 5_000.0;
const FALL_STEP: f32 = 0.02;
const SWAY_STEP: f32 = 0.02;
const SWAY_STEP_PER_LEVEL: f32 = 0.03;
const SWAY_INTENSITY_PER_LEVEL: f32 = 0.004;
const BUBBLE_CHANCE_PER_LEVEL: f32 = 0.03;
const BUBBLE_SIZES: [f32; 4] = [16.0, 24.0, 32.0, 40.0];
const VIGNETTE_PER_LEVEL: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwayMode {
    /// Added on top of the player's own yaw and pitch.
    Additive,
    /// `x` replaces the player's pitch.
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CameraSway {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) roll: f32,
    pub(crate) mode: SwayMode,
}

impl CameraSway {
    pub(crate) const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        roll: 0.0,
        mode: SwayMode::Additive,
    };
}

impl Default for CameraSway {
    fn default() -> Self {
        Self::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum HallucinationKind {
    Squirrel { radius: f32, speed: f32, hop_phase: f32 },
    Star { orbit_speed: f32, spin_speed: f32, spin: f32 },
    Bottle { float_phase: f32, spin_speed: f32, spin: f32 },
}

/// A decoration circling the spot where the player went down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hallucination {
    pub(crate) kind: HallucinationKind,
    pub(crate) angle: f32,
    pub(crate) base_y: f32,
    pub(crate) position: Vec3,
}

impl Hallucination {
    fn squirrel(index: usize, anchor: Vec3, rng: &mut impl Rng) -> Self {
        let angle = index as f32 / 5.0 * TAU;
        let radius = 1.5 + rng.gen::<f32>() * 1.5;
        let base_y = 4.0 + rng.gen::<f32>() * 2.0;
        Self {
            kind: HallucinationKind::Squirrel {
                radius,
                speed: 0.03 + rng.gen::<f32>() * 0.02,
                hop_phase: rng.gen::<f32>() * TAU,
            },
            angle,
            base_y,
            position: orbit_point(anchor, angle, radius, base_y),
        }
    }

    fn star(index: usize, anchor: Vec3, rng: &mut impl Rng) -> Self {
        let angle = index as f32 / 8.0 * TAU;
        let base_y = 6.0 + rng.gen::<f32>() * 2.0;
        Self {
            kind: HallucinationKind::Star {
                orbit_speed: 0.03 + rng.gen::<f32>() * 0.02,
                spin_speed: 0.1 + rng.gen::<f32>() * 0.1,
                spin: 0.0,
            },
            angle,
            base_y,
            position: orbit_point(anchor, angle, 2.0, base_y),
        }
    }

    fn bottle(index: usize, anchor: Vec3, rng: &mut impl Rng) -> Self {
        let angle = index as f32 / 4.0 * TAU + FRAC_PI_4;
        let base_y = 5.0 + rng.gen::<f32>() * 2.0;
        Self {
            kind: HallucinationKind::Bottle {
                float_phase: rng.gen::<f32>() * TAU,
                spin_speed: 0.02 + rng.gen::<f32>() * 0.03,
                spin: 0.0,
            },
            angle,
            base_y,
            position: orbit_point(anchor, angle, 2.5, base_y),
        }
    }

    fn update(&mut self, anchor: Vec3, elapsed_seconds: f32) {
        match &mut self.kind {
            HallucinationKind::Squirrel {
                radius,
                speed,
                hop_phase,
            } => {
                self.angle += *speed;
                *hop_phase += 0.12;
                let hop = hop_phase.sin().abs() * 1.5;
                self.position = orbit_point(anchor, self.angle, *radius, self.base_y + hop);
            }
            HallucinationKind::Star {
                orbit_speed,
                spin_speed,
                spin,
            } => {
                self.angle += *orbit_speed;
                *spin += *spin_speed;
                let bob = (elapsed_seconds * 2.0 + self.angle).sin() * 0.5;
                self.position = orbit_point(anchor, self.angle, 2.0, self.base_y + bob);
            }
            HallucinationKind::Bottle {
                float_phase,
                spin_speed,
                spin,
            } => {
                *float_phase += 0.03;
                self.angle += 0.008;
                *spin += *spin_speed;
                let bob = float_phase.sin() * 0.5;
                self.position = orbit_point(anchor, self.angle, 2.5, self.base_y + bob);
            }
        }
    }

    fn push_primitives(&self, out: &mut Vec<Primitive>) {
        match self.kind {
            HallucinationKind::Squirrel { .. } => {
                const FUR: Color = [139, 69, 19, 255];
                let facing = self.angle + PI;
                out.extend(Primitive::cuboid(
                    self.position + Vec3::new(0.0, 0.15, 0.0),
                    Vec3::new(0.15, 0.125, 0.2),
                    facing,
                    FUR,
                ));
                out.extend(Primitive::cuboid(
                    self.position + Vec3::new(0.0, 0.35, 0.0),
                    Vec3::new(0.075, 0.25, 0.075),
                    facing,
                    [101, 67, 33, 255],
                ));
                out.push(Primitive::point(self.position + Vec3::new(0.0, 0.3, 0.0), 0.2, FUR));
            }
            HallucinationKind::Star { spin, .. } => {
                const GOLD: Color = [255, 255, 0, 255];
                out.push(Primitive::point(self.position, 0.15, GOLD));
                for ray in 0..4 {
                    let angle = spin + ray as f32 * FRAC_PI_2;
                    let offset = Vec3::new(angle.cos() * 0.2, angle.sin() * 0.2, 0.0);
                    out.push(Primitive::point(self.position + offset, 0.1, GOLD));
                }
            }
            HallucinationKind::Bottle { spin, .. } => {
                out.extend(Primitive::cuboid(
                    self.position + Vec3::new(0.0, 0.175, 0.0),
                    Vec3::new(0.075, 0.175, 0.075),
                    spin,
                    [42, 138, 42, 180],
                ));
                out.extend(Primitive::cuboid(
                    self.position + Vec3::new(0.0, 0.425, 0.0),
                    Vec3::new(0.04, 0.075, 0.04),
                    spin,
                    [42, 138, 42, 180],
                ));
                out.push(Primitive::point(
                    self.position + Vec3::new(0.0, 0.54, 0.0),
                    0.06,
                    [139, 69, 19, 255],
                ));
            }
        }
    }
}

fn orbit_point(anchor: Vec3, angle: f32, radius: f32, y: f32) -> Vec3 {
    Vec3::new(anchor.x + angle.cos() * radius, y, anchor.z + angle.sin() * radius)
}

/// A rising HUD bubble. `x` is a horizontal screen fraction in [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bubble {
    pub(crate) x: f32,
    pub(crate) size: f32,
    pub(crate) age_seconds: f32,
    pub(crate) duration_seconds: f32,
}

impl Bubble {
    pub(crate) fn rise(&self) -> f32 {
        (self.age_seconds / self.duration_seconds).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct IntoxicationController {
    level: u8,
    decay_ms: f32,
    passed_out: bool,
    passed_out_ms: f32,
    passed_out_progress: f32,
    sway_phase: f32,
    elapsed_seconds: f32,
    player_position: Vec3,
    hallucinations: Vec<Hallucination>,
    bubbles: Vec<Bubble>,
}

impl IntoxicationController {
    pub(crate) fn level(&self) -> u8 {
        self.level
    }

    pub(crate) fn is_passed_out(&self) -> bool {
        self.passed_out
    }

    #[cfg(test)]
    pub(crate) fn passed_out_progress(&self) -> f32 {
        self.passed_out_progress
    }

    /// Whole seconds left on the pass-out countdown, rounded up.
    pub(crate) fn passed_out_seconds_left(&self) -> Option<u32> {
        self.passed_out
            .then(|| (self.passed_out_ms.max(0.0) / 1000.0).ceil() as u32)
    }

    pub(crate) fn hallucinations(&self) -> &[Hallucination] {
        &self.hallucinations
    }

    pub(crate) fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub(crate) fn set_player_position(&mut self, position: Vec3) {
        self.player_position = position;
    }

    pub(crate) fn drink(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        self.level = (self.level + 1).min(MAX_LEVEL);
        self.decay_ms = DECAY_MS;
        info!(level = self.level, "drink_consumed");
        if self.level == MAX_LEVEL && !self.passed_out {
            self.pass_out(rng, events);
        }
    }

    pub(crate) fn pass_out(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        if self.passed_out {
            return;
        }
        self.passed_out = true;
        self.passed_out_ms = PASS_OUT_MS;
        self.passed_out_progress = 0.0;

        let anchor = self.player_position;
        self.hallucinations.clear();
        self.hallucinations
            .extend((0..5).map(|index| Hallucination::squirrel(index, anchor, rng)));
        self.hallucinations
            .extend((0..8).map(|index| Hallucination::star(index, anchor, rng)));
        self.hallucinations
            .extend((0..4).map(|index| Hallucination::bottle(index, anchor, rng)));

        info!(x = anchor.x, z = anchor.z, "player_passed_out");
        events.emit(CourtyardEvent::PassedOut);
    }

    pub(crate) fn wake_up(&mut self, events: &mut CourtyardEventBus) {
        self.passed_out = false;
        self.level = WAKE_LEVEL;
        self.decay_ms = WAKE_DECAY_MS;
        self.passed_out_ms = 0.0;
        self.passed_out_progress = 0.0;
        self.hallucinations.clear();
        info!(level = self.level, "player_woke_up");
        events.emit(CourtyardEvent::WokeUp);
    }

    pub(crate) fn update(&mut self, dt_ms: f32, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        self.sway_phase += SWAY_STEP;
        self.elapsed_seconds += dt_ms / 1000.0;
        self.update_bubbles(dt_ms / 1000.0);

        if self.passed_out {
            self.passed_out_ms -= dt_ms;
            self.passed_out_progress = (self.passed_out_progress + FALL_STEP).min(1.0);
            let anchor = self.player_position;
            let elapsed = self.elapsed_seconds;
            for hallucination in &mut self.hallucinations {
                hallucination.update(anchor, elapsed);
            }
            if self.passed_out_ms <= 0.0 {
                self.wake_up(events);
            }
            return;
        }

        if self.decay_ms > 0.0 {
            self.decay_ms -= dt_ms;
            if rng.gen::<f32>() < BUBBLE_CHANCE_PER_LEVEL * f32::from(self.level) {
                self.spawn_bubble(rng);
            }
            if self.decay_ms <= 0.0 {
                self.level = self.level.saturating_sub(1);
                if self.level > 0 {
                    self.decay_ms = DECAY_MS;
                }
                debug!(level = self.level, "intoxication_decayed");
            }
        }

        if self.level > 0 {
            self.sway_phase += SWAY_STEP_PER_LEVEL * f32::from(self.level);
        }
    }

    fn spawn_bubble(&mut self, rng: &mut impl Rng) {
        if self.level == 0 {
            return;
        }
        self.bubbles.push(Bubble {
            x: rng.gen::<f32>(),
            size: BUBBLE_SIZES[rng.gen_range(0..BUBBLE_SIZES.len())],
            age_seconds: 0.0,
            duration_seconds: 4.0 + rng.gen::<f32>() * 3.0 - f32::from(self.level) * 0.3,
        });
    }

    fn update_bubbles(&mut self, dt_seconds: f32) {
        for bubble in &mut self.bubbles {
            bubble.age_seconds += dt_seconds;
        }
        self.bubbles
            .retain(|bubble| bubble.age_seconds < bubble.duration_seconds);
    }

    pub(crate) fn camera_sway(&self) -> CameraSway {
        if self.level == 0 {
            return CameraSway::ZERO;
        }
        if self.passed_out {
            return CameraSway {
                x: self.passed_out_progress * (FRAC_PI_2 - 0.2),
                y: (self.sway_phase * 0.5).sin() * 0.05,
                roll: (self.sway_phase * 0.3).sin() * 0.1,
                mode: SwayMode::Absolute,
            };
        }
        let intensity = f32::from(self.level) * SWAY_INTENSITY_PER_LEVEL;
        CameraSway {
            x: (self.sway_phase * 1.3).sin() * intensity,
            y: (self.sway_phase * 0.9).cos() * intensity * 0.5,
            roll: (self.sway_phase * 0.7).sin() * intensity * 0.4,
            mode: SwayMode::Additive,
        }
    }

    pub(crate) fn vignette_strength(&self) -> f32 {
        if self.passed_out {
            1.0
        } else {
            (f32::from(self.level) * VIGNETTE_PER_LEVEL).min(1.0)
        }
    }

    pub(crate) fn reset(&mut self) {
        let player_position = self.player_position;
        *self = Self {
            player_position,
            ..Self::default()
        };
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        for hallucination in &self.hallucinations {
            hallucination.push_primitives(out);
        }
    }
}
