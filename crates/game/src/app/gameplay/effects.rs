//! Weather and decoration that animate on their own: snow, the fireworks show,
//! tree lights and the speaker LED.

use std::f32::consts::TAU;

use engine::{shade, Primitive, SoundId, Vec3};
use rand::Rng;
use tracing::{debug, info};

use super::events::{CourtyardEvent, CourtyardEventBus};
use super::items::{Burst, BurstProfile, BURST_COLORS};
use super::world_layout::{SPEAKER_POSITION, TREE_LIGHT_COLORS};

pub(crate) const BASE_FLAKES: usize = 3_000;
pub(crate) const STORM_FLAKES: usize = 1_500;
pub(crate) const STORM_MULTIPLIER: f32 = 2.5;
const SNOW_SPREAD: f32 = 100.0;
const SNOW_CEILING: f32 = 50.0;
const FLAKE_SIZE: f32 = 0.3;
const FLAKE_COLOR: [u8; 4] = [255, 255, 255, 204];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Flake {
    pub(crate) position: Vec3,
    pub(crate) fall_speed: f32,
}

impl Flake {
    fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            position: Vec3::new(
                (rng.gen::<f32>() - 0.5) * SNOW_SPREAD,
                rng.gen::<f32>() * SNOW_CEILING,
                (rng.gen::<f32>() - 0.5) * SNOW_SPREAD,
            ),
            fall_speed: 0.02 + rng.gen::<f32>() * 0.03,
        }
    }

    fn update(&mut self, multiplier: f32, rng: &mut impl Rng) {
        self.position.y -= self.fall_speed * multiplier;
        self.position.x += (rng.gen::<f32>() - 0.5) * 0.05 * multiplier;
        if self.position.y < 0.0 {
            self.position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * SNOW_SPREAD,
                SNOW_CEILING,
                (rng.gen::<f32>() - 0.5) * SNOW_SPREAD,
            );
        }
    }
}

/// Steady snowfall plus an optional, faster storm layer.
#[derive(Debug, Clone)]
pub(crate) struct Snow {
    flakes: Vec<Flake>,
    storm: Option<Vec<Flake>>,
}

impl Snow {
    pub(crate) fn new(flake_count: usize, rng: &mut impl Rng) -> Self {
        Self {
            flakes: (0..flake_count).map(|_| Flake::spawn(rng)).collect(),
            storm: None,
        }
    }

    pub(crate) fn flake_count(&self) -> usize {
        self.flakes.len() + self.storm.as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn is_storm_active(&self) -> bool {
        self.storm.is_some()
    }

    pub(crate) fn flakes(&self) -> impl Iterator<Item = &Flake> {
        self.flakes.iter().chain(self.storm.iter().flatten())
    }

    pub(crate) fn toggle_storm(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) -> bool {
        if self.storm.take().is_some() {
            events.emit(CourtyardEvent::StopLoop(SoundId::Wind));
        } else {
            self.storm = Some((0..STORM_FLAKES).map(|_| Flake::spawn(rng)).collect());
            events.emit(CourtyardEvent::StartLoop(SoundId::Wind));
        }
        info!(active = self.is_storm_active(), flakes = self.flake_count(), "storm_toggled");
        self.is_storm_active()
    }

    pub(crate) fn update(&mut self, rng: &mut impl Rng) {
        for flake in &mut self.flakes {
            flake.update(1.0, rng);
        }
        for flake in self.storm.iter_mut().flatten() {
            flake.update(STORM_MULTIPLIER, rng);
        }
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        out.extend(
            self.flakes()
                .map(|flake| Primitive::point(flake.position, FLAKE_SIZE, FLAKE_COLOR)),
        );
    }
}

const SHOW_BURST: BurstProfile = BurstProfile {
    particle_count: 50,
    speed_min: 0.2,
    speed_span: 0.3,
    gravity: 0.01,
    decay: 0.015,
    size: 0.5,
};
const SHOW_INTERVAL_MIN_MS: f32 = 300.0;
const SHOW_INTERVAL_SPAN_MS: f32 = 500.0;

/// Bursts launched on a random cadence over the courtyard while enabled.
#[derive(Debug, Clone, Default)]
pub(crate) struct FireworksShow {
    active: bool,
    next_launch_ms: f32,
    bursts: Vec<Burst>,
    launched: u64,
}

impl FireworksShow {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn burst_count(&self) -> usize {
        self.bursts.len()
    }

    #[cfg(test)]
    pub(crate) fn launched(&self) -> u64 {
        self.launched
    }

    pub(crate) fn toggle(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) -> bool {
        if self.active {
            self.active = false;
            self.bursts.clear();
        } else {
            self.active = true;
            self.launch(rng, events);
        }
        info!(active = self.active, "fireworks_show_toggled");
        self.active
    }

    fn launch(&mut self, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        let origin = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 40.0,
            20.0 + rng.gen::<f32>() * 15.0,
            (rng.gen::<f32>() - 0.5) * 40.0,
        );
        let color = BURST_COLORS[rng.gen_range(0..BURST_COLORS.len())];
        self.bursts.push(Burst::new(origin, color, SHOW_BURST, rng));
        self.launched += 1;
        self.next_launch_ms = SHOW_INTERVAL_MIN_MS + rng.gen::<f32>() * SHOW_INTERVAL_SPAN_MS;
        debug!(launched = self.launched, height = origin.y, "show_firework_launched");
        events.emit(CourtyardEvent::PlaySound(SoundId::FireworkBoom));
    }

    pub(crate) fn update(&mut self, dt_ms: f32, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        self.bursts.retain_mut(Burst::update);
        if !self.active {
            return;
        }
        self.next_launch_ms -= dt_ms;
        if self.next_launch_ms <= 0.0 {
            self.launch(rng, events);
        }
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        for burst in &self.bursts {
            burst.push_primitives(out);
        }
    }
}

pub(crate) const TREE_LIGHT_COUNT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeLight {
    pub(crate) position: Vec3,
    pub(crate) phase: f32,
    pub(crate) color: [u8; 4],
}

/// Lights spiralling up the tree, twinkling from accumulated tick time.
#[derive(Debug, Clone)]
pub(crate) struct TreeLights {
    lights: Vec<TreeLight>,
    elapsed_seconds: f32,
}

impl TreeLights {
    pub(crate) fn new(rng: &mut impl Rng) -> Self {
        let lights = (0..TREE_LIGHT_COUNT)
            .map(|index| {
                let t = index as f32 / TREE_LIGHT_COUNT as f32;
                let angle = t * 4.0 * TAU;
                let height = 3.0 + t * 12.0;
                let radius = 5.0 - height / 15.0 * 4.0;
                TreeLight {
                    position: Vec3::new(angle.cos() * radius, height, angle.sin() * radius),
                    phase: rng.gen::<f32>() * TAU,
                    color: TREE_LIGHT_COLORS[index % TREE_LIGHT_COLORS.len()],
                }
            })
            .collect();
        Self {
            lights,
            elapsed_seconds: 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn lights(&self) -> &[TreeLight] {
        &self.lights
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        self.elapsed_seconds += dt_seconds;
    }

    pub(crate) fn intensity(&self, light: &TreeLight) -> f32 {
        0.5 + 0.5 * (self.elapsed_seconds * 3.0 + light.phase).sin()
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        out.extend(self.lights.iter().map(|light| {
            let color = shade(light.color, 0.3 + self.intensity(light) * 0.7);
            Primitive::point(light.position, 0.3, color)
        }));
    }
}

const LED_OFFSET: Vec3 = Vec3::new(0.3, 1.25, 0.26);
const LED_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SpeakerLed {
    phase: f32,
}

impl SpeakerLed {
    pub(crate) fn update(&mut self) {
        self.phase += LED_STEP;
    }

    pub(crate) fn pulse(&self) -> f32 {
        0.2 + self.phase.sin() * 0.1
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        let glow = (self.pulse() / 0.3).clamp(0.0, 1.0);
        out.push(Primitive::point(
            SPEAKER_POSITION + LED_OFFSET,
            0.05 + glow * 0.05,
            shade([0, 255, 0, 255], 0.4 + glow * 0.6),
        ));
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn flakes_respawn_at_the_ceiling() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut flake = Flake {
            position: Vec3::new(0.0, 0.01, 0.0),
            fall_speed: 0.02,
        };
        flake.update(1.0, &mut rng);
        assert_eq!(flake.position.y, SNOW_CEILING);
        assert!(flake.position.x.abs() <= SNOW_SPREAD / 2.0);
        assert!(flake.position.z.abs() <= SNOW_SPREAD / 2.0);
    }

    #[test]
    fn storm_flakes_fall_faster() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut calm = Flake {
            position: Vec3::new(0.0, 10.0, 0.0),
            fall_speed: 0.04,
        };
        let mut stormy = calm;
        calm.update(1.0, &mut rng);
        stormy.update(STORM_MULTIPLIER, &mut rng);
        assert!((calm.position.y - 9.96).abs() < 1e-5);
        assert!((stormy.position.y - 9.9).abs() < 1e-5);
    }

    #[test]
    fn storm_toggle_adds_and_removes_flakes() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut bus = CourtyardEventBus::default();
        let mut snow = Snow::new(BASE_FLAKES, &mut rng);
        assert_eq!(snow.flake_count(), 3_000);

        assert!(snow.toggle_storm(&mut rng, &mut bus));
        assert_eq!(snow.flake_count(), 4_500);
        snow.update(&mut rng);
        assert!(snow.flakes().all(|flake| (0.0..=SNOW_CEILING).contains(&flake.position.y)));

        assert!(!snow.toggle_storm(&mut rng, &mut bus));
        assert_eq!(snow.flake_count(), 3_000);
        assert_eq!(
            bus.drain().collect::<Vec<_>>(),
            vec![
                CourtyardEvent::StartLoop(SoundId::Wind),
                CourtyardEvent::StopLoop(SoundId::Wind),
            ]
        );
    }

    #[test]
    fn show_launches_immediately_then_on_cadence() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut bus = CourtyardEventBus::default();
        let mut show = FireworksShow::default();
        show.toggle(&mut rng, &mut bus);
        assert_eq!(show.launched(), 1);
        assert_eq!(show.burst_count(), 1);

        for _ in 0..17 {
            show.update(1000.0 / 60.0, &mut rng, &mut bus);
        }
        assert_eq!(show.launched(), 1);

        for _ in 0..60 {
            show.update(1000.0 / 60.0, &mut rng, &mut bus);
        }
        assert!(show.launched() >= 2);
        let booms = bus
            .drain()
            .filter(|event| *event == CourtyardEvent::PlaySound(SoundId::FireworkBoom))
            .count() as u64;
        assert_eq!(booms, show.launched());
    }

    #[test]
    fn disabling_show_clears_bursts() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut bus = CourtyardEventBus::default();
        let mut show = FireworksShow::default();
        show.toggle(&mut rng, &mut bus);
        show.toggle(&mut rng, &mut bus);
        assert!(!show.is_active());
        assert_eq!(show.burst_count(), 0);

        for _ in 0..120 {
            show.update(1000.0 / 60.0, &mut rng, &mut bus);
        }
        assert_eq!(show.launched(), 1);
    }

    #[test]
    fn tree_lights_spiral_upward_and_narrow() {
        let mut rng = SmallRng::seed_from_u64(6);
        let lights = TreeLights::new(&mut rng);
        assert_eq!(lights.lights().len(), TREE_LIGHT_COUNT);

        let first = lights.lights()[0].position;
        let last = lights.lights()[TREE_LIGHT_COUNT - 1].position;
        assert!((first.y - 3.0).abs() < 1e-6);
        assert!(last.y > first.y);
        let radius = |p: Vec3| (p.x * p.x + p.z * p.z).sqrt();
        assert!(radius(last) < radius(first));
    }

    #[test]
    fn tree_light_intensity_stays_in_unit_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut lights = TreeLights::new(&mut rng);
        for _ in 0..200 {
            lights.update(1.0 / 60.0);
            for light in lights.lights() {
                let intensity = lights.intensity(light);
                assert!((0.0..=1.0).contains(&intensity));
            }
        }
    }

    #[test]
    fn speaker_led_pulses_around_base() {
        let mut led = SpeakerLed::default();
        for _ in 0..100 {
            led.update();
            assert!((0.1..=0.3).contains(&led.pulse()));
        }
    }
}
