use std::f32::consts::{PI, TAU};

use engine::{Color, Primitive, Vec3};
use rand::Rng;

use super::particles::{Particle, ParticlePool};

const BURN_STEP: f32 = 0.0005;
const SPARK_TOP_Y: f32 = 0.3;
const SPARK_BOTTOM_Y: f32 = 0.1;
const SPARK_GRAVITY: f32 = 0.002;
const SPARK_DECAY: f32 = 0.05;
const SPARK_COLORS: [Color; 4] = [
    [255, 221, 68, 255],
    [255, 170, 0, 255],
    [255, 255, 255, 255],
    [255, 136, 0, 255],
];
const PARTICLE_CAPACITY: usize = 128;

/// A hand-held sparkler that burns down while it is out; `use` does nothing.
#[derive(Debug, Clone)]
pub(crate) struct Sparkler {
    active: bool,
    burn_progress: f32,
    light_intensity: f32,
    sparks: ParticlePool,
}

impl Default for Sparkler {
    fn default() -> Self {
        Self {
            active: false,
            burn_progress: 0.0,
            light_intensity: 0.0,
            sparks: ParticlePool::with_capacity(PARTICLE_CAPACITY),
        }
    }
}

impl Sparkler {
    pub(crate) fn activate(&mut self) {
        self.active = true;
        self.light_intensity = 1.0;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.light_intensity = 0.0;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn burn_progress(&self) -> f32 {
        self.burn_progress
    }

    #[cfg(test)]
    pub(crate) fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    #[cfg(test)]
    pub(crate) fn spark_count(&self) -> usize {
        self.sparks.live_count()
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.burn_progress >= 1.0
    }

    pub(crate) fn spark_point_y(&self) -> f32 {
        (SPARK_TOP_Y - self.burn_progress * 0.2).max(SPARK_BOTTOM_Y)
    }

    pub(crate) fn coating_scale(&self) -> f32 {
        (1.0 - self.burn_progress).max(0.0)
    }

    pub(crate) fn update(&mut self, rng: &mut impl Rng) {
        if !self.active {
            return;
        }
        self.burn_progress = (self.burn_progress + BURN_STEP).min(1.0);

        if self.burn_progress < 1.0 {
            self.emit_sparks(rng);
            self.light_intensity = 0.8 + rng.gen::<f32>() * 0.4;
        } else {
            self.light_intensity = 0.0;
        }
        self.sparks.update();
    }

    fn emit_sparks(&mut self, rng: &mut impl Rng) {
        let origin = Vec3::new(0.0, self.spark_point_y(), 0.0);
        for _ in 0..rng.gen_range(2..=4) {
            let speed = 0.02 + rng.gen::<f32>() * 0.04;
            let theta = rng.gen::<f32>() * TAU;
            let phi = rng.gen::<f32>() * PI;
            self.sparks.emit(Particle {
                position: origin,
                velocity: Vec3::new(
                    phi.sin() * theta.cos() * speed,
                    phi.sin() * theta.sin() * speed + 0.02,
                    phi.cos() * speed,
                ),
                life: 0.5 + rng.gen::<f32>() * 0.5,
                gravity: SPARK_GRAVITY,
                decay: SPARK_DECAY,
                size: 0.015 + rng.gen::<f32>() * 0.02,
                color: SPARK_COLORS[rng.gen_range(0..SPARK_COLORS.len())],
            });
        }
    }

    pub(crate) fn push_primitives(&self, hand: Vec3, yaw: f32, out: &mut Vec<Primitive>) {
        out.extend(Primitive::cuboid(
            hand + Vec3::new(0.0, 0.15, 0.0),
            Vec3::new(0.004, 0.15, 0.004),
            yaw,
            [102, 102, 102, 255],
        ));
        let coating = self.coating_scale();
        if coating > 0.0 {
            out.extend(Primitive::cuboid(
                hand + Vec3::new(0.0, 0.1 + coating * 0.1, 0.0),
                Vec3::new(0.008, 0.1 * coating, 0.008),
                yaw,
                [51, 51, 51, 255],
            ));
        }
        if self.light_intensity > 0.0 {
            let glow = (self.light_intensity * 200.0).min(255.0) as u8;
            out.push(Primitive::point(
                hand + Vec3::new(0.0, self.spark_point_y(), 0.0),
                0.04,
                [255, 170, 0, glow],
            ));
        }
        self.sparks.push_primitives(hand, out);
    }
}
