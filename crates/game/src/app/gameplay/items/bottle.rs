use engine::{Primitive, SoundId, Vec3};
use rand::Rng;
use tracing::trace;

use super::particles::{Particle, ParticlePool};
use super::ItemEffect;
use crate::app::gameplay::events::{CourtyardEvent, CourtyardEventBus};

const OPENING_STEP: f32 = 0.025;
const DRINKING_STEP: f32 = 0.012;
const CORK_WOBBLE_END: f32 = 0.4;
const CORK_FLIGHT_END: f32 = 0.8;
const RAISE_END: f32 = 0.3;
const TILT_END: f32 = 0.8;
const CORK_REST_Y: f32 = 0.33;
const CORK_GRAVITY: f32 = 0.012;
const BUBBLE_COUNT: usize = 20;
const DRIP_CHANCE: f64 = 0.15;
const PARTICLE_GRAVITY: f32 = 0.002;
const PARTICLE_DECAY: f32 = 0.025;
const REST_TILT_X: f32 = 0.2;
const PARTICLE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BottleState {
    Idle,
    Opening,
    Opened,
    Drinking,
    Empty,
}

/// Hand-local transform of the bottle body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BottlePose {
    pub(crate) offset: Vec3,
    pub(crate) rot_x: f32,
    pub(crate) rot_z: f32,
}

impl BottlePose {
    const REST: Self = Self {
        offset: Vec3::ZERO,
        rot_x: REST_TILT_X,
        rot_z: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cork {
    pub(crate) position: Vec3,
    pub(crate) rot_z: f32,
    pub(crate) velocity: Vec3,
    pub(crate) flying: bool,
    pub(crate) visible: bool,
}

impl Cork {
    const SEATED: Self = Self {
        position: Vec3::new(0.0, CORK_REST_Y, 0.0),
        rot_z: 0.0,
        velocity: Vec3::ZERO,
        flying: false,
        visible: true,
    };
}

#[derive(Debug, Clone)]
pub(crate) struct Bottle {
    state: BottleState,
    progress: f32,
    consumed: bool,
    pose: BottlePose,
    cork: Cork,
    particles: ParticlePool,
}

impl Default for Bottle {
    fn default() -> Self {
        Self::new()
    }
}

impl Bottle {
    pub(crate) fn new() -> Self {
        Self {
            state: BottleState::Idle,
            progress: 0.0,
            consumed: false,
            pose: BottlePose::REST,
            cork: Cork::SEATED,
            particles: ParticlePool::with_capacity(PARTICLE_CAPACITY),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> BottleState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn progress(&self) -> f32 {
        self.progress
    }

    #[cfg(test)]
    pub(crate) fn pose(&self) -> BottlePose {
        self.pose
    }

    #[cfg(test)]
    pub(crate) fn cork(&self) -> Cork {
        self.cork
    }

    #[cfg(test)]
    pub(crate) fn particle_count(&self) -> usize {
        self.particles.live_count()
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Taking the bottle out again drops any half-finished gesture back to idle.
    pub(crate) fn activate(&mut self) {
        if !self.consumed {
            self.state = BottleState::Idle;
            self.pose = BottlePose::REST;
        }
    }

    pub(crate) fn deactivate(&mut self) {
        self.pose = BottlePose::REST;
    }

    pub(crate) fn use_item(&mut self) -> Option<ItemEffect> {
        if self.consumed {
            trace!("bottle_use_ignored_consumed");
            return None;
        }
        match self.state {
            BottleState::Idle => {
                self.state = BottleState::Opening;
                self.progress = 0.0;
                Some(ItemEffect::Sound(SoundId::Cork))
            }
            BottleState::Opened => {
                self.state = BottleState::Drinking;
                self.progress = 0.0;
                Some(ItemEffect::Sound(SoundId::Drink))
            }
            BottleState::Opening | BottleState::Drinking | BottleState::Empty => None,
        }
    }

    pub(crate) fn update(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        match self.state {
            BottleState::Opening => self.advance_opening(rng),
            BottleState::Drinking => {
                if self.advance_drinking(rng) {
                    events.emit(CourtyardEvent::DrinkConsumed);
                    return;
                }
            }
            BottleState::Idle | BottleState::Opened | BottleState::Empty => {}
        }
        self.particles.update();
    }

    fn advance_opening(&mut self, rng: &mut impl Rng) {
        self.progress += OPENING_STEP;
        let progress = self.progress;
        if progress < CORK_WOBBLE_END {
            self.cork.rot_z = (progress * 30.0).sin() * 0.15;
            self.cork.position.y = CORK_REST_Y + progress * 0.05;
        } else if progress < CORK_FLIGHT_END {
            if !self.cork.flying {
                self.cork.flying = true;
                self.cork.velocity = Vec3::new((rng.gen::<f32>() - 0.5) * 0.08, 0.25, 0.15);
                self.emit_bubbles(rng);
            }
            self.cork.position += self.cork.velocity;
            self.cork.velocity.y -= CORK_GRAVITY;
            self.cork.rot_z += 0.15;
        } else {
            self.state = BottleState::Opened;
            self.cork.visible = false;
        }
    }

    /// Returns true on the tick the last sip lands.
    fn advance_drinking(&mut self, rng: &mut impl Rng) -> bool {
        self.progress += DRINKING_STEP;
        let progress = self.progress;
        if progress < RAISE_END {
            self.pose.offset.y = progress * 0.3;
            self.pose.offset.z = -progress * 0.15;
        } else if progress < TILT_END {
            let tilt = (progress - RAISE_END) / (TILT_END - RAISE_END);
            self.pose.rot_x = REST_TILT_X - tilt * 2.5;
            self.pose.rot_z = tilt * 0.2;
            self.pose.offset.y = 0.09 + tilt * 0.1;
            self.pose.offset.z = -0.045 - tilt * 0.15;
            if rng.gen_bool(DRIP_CHANCE) {
                self.emit_drip(rng);
            }
        } else if progress >= 1.0 {
            self.state = BottleState::Empty;
            self.consumed = true;
            self.pose = BottlePose::REST;
            return true;
        }
        false
    }

    fn emit_bubbles(&mut self, rng: &mut impl Rng) {
        for _ in 0..BUBBLE_COUNT {
            self.particles.emit(Particle {
                position: self.cork.position,
                velocity: Vec3::new(
                    (rng.gen::<f32>() - 0.5) * 0.04,
                    0.03 + rng.gen::<f32>() * 0.08,
                    (rng.gen::<f32>() - 0.5) * 0.04,
                ),
                life: 1.0,
                gravity: PARTICLE_GRAVITY,
                decay: PARTICLE_DECAY,
                size: 0.008 + rng.gen::<f32>() * 0.015,
                color: [255, 255, 204, 180],
            });
        }
    }

    fn emit_drip(&mut self, rng: &mut impl Rng) {
        self.particles.emit(Particle {
            position: Vec3::new(0.0, 0.28, -0.02),
            velocity: Vec3::new((rng.gen::<f32>() - 0.5) * 0.01, -0.02, -0.01),
            life: 0.8,
            gravity: PARTICLE_GRAVITY,
            decay: PARTICLE_DECAY,
            size: 0.01,
            color: [255, 255, 170, 150],
        });
    }

    pub(crate) fn reset(&mut self) {
        self.consumed = false;
        self.state = BottleState::Idle;
        self.progress = 0.0;
        self.cork = Cork::SEATED;
        self.pose = BottlePose::REST;
        self.particles.clear();
    }

    /// Draws the bottle at `hand`, a world-space anchor in front of the camera.
    pub(crate) fn push_primitives(&self, hand: Vec3, yaw: f32, out: &mut Vec<Primitive>) {
        let body = hand + self.pose.offset;
        let lean = Vec3::new(0.0, 0.0, -self.pose.rot_x.sin() * 0.08);
        out.extend(Primitive::cuboid(
            body + Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(0.04, 0.1, 0.04),
            yaw,
            [20, 70, 30, 255],
        ));
        out.extend(Primitive::cuboid(
            body + lean + Vec3::new(0.0, 0.25, 0.0),
            Vec3::new(0.015, 0.05, 0.015),
            yaw,
            [255, 215, 0, 255],
        ));
        if self.cork.visible {
            out.push(Primitive::point(body + self.cork.position, 0.03, [205, 170, 120, 255]));
        }
        self.particles.push_primitives(body, out);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn run_until<F>(bottle: &mut Bottle, bus: &mut CourtyardEventBus, mut done: F) -> usize
    where
        F: FnMut(&Bottle) -> bool,
    {
        let mut rng = SmallRng::seed_from_u64(9);
        for tick in 1..=500 {
            bottle.update(&mut rng, bus);
            if done(bottle) {
                return tick;
            }
        }
        panic!("bottle never reached the expected state");
    }

    #[test]
    fn use_in_idle_starts_opening_with_cork_sound() {
        let mut bottle = Bottle::new();
        assert_eq!(bottle.use_item(), Some(ItemEffect::Sound(SoundId::Cork)));
        assert_eq!(bottle.state(), BottleState::Opening);
        assert_eq!(bottle.use_item(), None);
    }

    #[test]
    fn opening_pops_cork_and_reaches_opened() {
        let mut bottle = Bottle::new();
        let mut bus = CourtyardEventBus::default();
        bottle.use_item();

        run_until(&mut bottle, &mut bus, |bottle| bottle.cork().flying);
        assert_eq!(bottle.state(), BottleState::Opening);
        assert!(bottle.particle_count() > 0);
        assert!(bottle.progress() >= CORK_WOBBLE_END);

        run_until(&mut bottle, &mut bus, |bottle| bottle.state() == BottleState::Opened);
        assert!(bottle.progress() >= CORK_FLIGHT_END);
        assert!(!bottle.cork().visible);
        assert!(bus.is_empty());
    }

    #[test]
    fn drinking_empties_bottle_and_emits_once() {
        let mut bottle = Bottle::new();
        let mut bus = CourtyardEventBus::default();
        bottle.use_item();
        run_until(&mut bottle, &mut bus, |bottle| bottle.state() == BottleState::Opened);

        assert_eq!(bottle.use_item(), Some(ItemEffect::Sound(SoundId::Drink)));
        run_until(&mut bottle, &mut bus, |bottle| bottle.state() == BottleState::Empty);
        assert!(bottle.is_consumed());
        assert_eq!(bottle.pose(), BottlePose::REST);

        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..30 {
            bottle.update(&mut rng, &mut bus);
        }
        let drinks = bus
            .drain()
            .filter(|event| *event == CourtyardEvent::DrinkConsumed)
            .count();
        assert_eq!(drinks, 1);
        assert_eq!(bottle.use_item(), None);
    }

    #[test]
    fn drinking_tilts_bottle_toward_player() {
        let mut bottle = Bottle::new();
        let mut bus = CourtyardEventBus::default();
        bottle.state = BottleState::Drinking;
        bottle.progress = 0.55 - DRINKING_STEP;
        let mut rng = SmallRng::seed_from_u64(4);
        bottle.update(&mut rng, &mut bus);

        let pose = bottle.pose();
        assert!((pose.rot_x - (REST_TILT_X - 0.5 * 2.5)).abs() < 1e-4);
        assert!((pose.rot_z - 0.1).abs() < 1e-4);
    }

    #[test]
    fn reset_restores_a_fresh_bottle() {
        let mut bottle = Bottle::new();
        bottle.state = BottleState::Empty;
        bottle.consumed = true;
        bottle.cork.visible = false;

        bottle.reset();
        assert_eq!(bottle.state(), BottleState::Idle);
        assert!(!bottle.is_consumed());
        assert_eq!(bottle.cork(), Cork::SEATED);
        assert_eq!(bottle.particle_count(), 0);
    }

    #[test]
    fn activate_drops_opened_bottle_back_to_idle() {
        let mut bottle = Bottle::new();
        bottle.state = BottleState::Opened;
        bottle.activate();
        assert_eq!(bottle.state(), BottleState::Idle);

        bottle.state = BottleState::Empty;
        bottle.consumed = true;
        bottle.activate();
        assert_eq!(bottle.state(), BottleState::Empty);
    }
}
