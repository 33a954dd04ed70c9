use std::f32::consts::{PI, TAU};

use engine::{Color, Primitive, Vec3};
use rand::Rng;

use super::particles::{Particle, ParticlePool};
use super::ItemEffect;

pub(crate) const FUSE_SECONDS: f32 = 1.5;
const PLACE_DISTANCE: f32 = 1.5;
const LAUNCH_ACCELERATION: f32 = 0.025;
const EXPLODE_HEIGHT_MIN: f32 = 18.0;
const EXPLODE_HEIGHT_SPAN: f32 = 5.0;
const TRAIL_CHANCE: f64 = 0.3;
const FLASH_INTENSITY: f32 = 3.0;
pub(crate) const FLASH_RANGE: f32 = 30.0;

pub(crate) const BURST_COLORS: [Color; 7] = [
    [255, 0, 0, 255],
    [0, 255, 0, 255],
    [255, 255, 0, 255],
    [255, 0, 255, 255],
    [0, 255, 255, 255],
    [255, 255, 255, 255],
    [255, 136, 0, 255],
];

/// The hand-held stack of mini-fireworks. Placing one hands it to the item system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MiniFirework {
    count: u32,
}

impl MiniFirework {
    pub(crate) fn new(count: u32) -> Self {
        Self { count }
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.count == 0
    }

    /// Drops a firework 1.5 units ahead of the player, on the ground.
    pub(crate) fn use_item(&mut self, player_position: Vec3, yaw: f32) -> Option<ItemEffect> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        Some(ItemEffect::PlaceFirework(Vec3::new(
            player_position.x - yaw.sin() * PLACE_DISTANCE,
            0.0,
            player_position.z - yaw.cos() * PLACE_DISTANCE,
        )))
    }

    pub(crate) fn push_primitives(&self, hand: Vec3, yaw: f32, out: &mut Vec<Primitive>) {
        out.extend(Primitive::cuboid(
            hand + Vec3::new(0.0, 0.075, 0.0),
            Vec3::new(0.03, 0.075, 0.03),
            yaw,
            [196, 30, 58, 255],
        ));
        out.push(Primitive::point(hand + Vec3::new(0.0, 0.17, 0.0), 0.03, [30, 144, 255, 255]));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FireworkPhase {
    Placed { fuse_seconds: f32 },
    Launching { velocity: f32, explode_height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FireworkStep {
    Waiting,
    Launched,
    Climbing,
    Exploded(Vec3),
}

/// A firework standing on the ground with a lit fuse, or climbing after launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlacedFirework {
    pub(crate) position: Vec3,
    pub(crate) phase: FireworkPhase,
    pub(crate) fuse_light: f32,
}

impl PlacedFirework {
    pub(crate) fn new(position: Vec3) -> Self {
        Self {
            position,
            phase: FireworkPhase::Placed {
                fuse_seconds: FUSE_SECONDS,
            },
            fuse_light: 0.5,
        }
    }

    pub(crate) fn update(
        &mut self,
        dt_seconds: f32,
        rng: &mut impl Rng,
        trail: &mut ParticlePool,
    ) -> FireworkStep {
        match &mut self.phase {
            FireworkPhase::Placed { fuse_seconds } => {
                *fuse_seconds -= dt_seconds;
                if *fuse_seconds > 0.0 {
                    self.fuse_light = 0.3 + rng.gen::<f32>() * 0.5;
                    return FireworkStep::Waiting;
                }
                self.fuse_light = 0.0;
                self.phase = FireworkPhase::Launching {
                    velocity: 0.0,
                    explode_height: EXPLODE_HEIGHT_MIN + rng.gen::<f32>() * EXPLODE_HEIGHT_SPAN,
                };
                FireworkStep::Launched
            }
            FireworkPhase::Launching {
                velocity,
                explode_height,
            } => {
                *velocity += LAUNCH_ACCELERATION;
                self.position.y += *velocity;
                if rng.gen_bool(TRAIL_CHANCE) {
                    trail.emit(trail_spark(self.position));
                }
                if self.position.y > *explode_height {
                    FireworkStep::Exploded(self.position)
                } else {
                    FireworkStep::Climbing
                }
            }
        }
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        out.extend(Primitive::cuboid(
            self.position + Vec3::new(0.0, 0.15, 0.0),
            Vec3::new(0.08, 0.15, 0.08),
            0.0,
            [196, 30, 58, 255],
        ));
        if self.fuse_light > 0.0 {
            out.push(Primitive::point(
                self.position + Vec3::new(0.0, 0.35, 0.0),
                0.08 + self.fuse_light * 0.1,
                [255, 102, 0, 255],
            ));
        }
    }
}

fn trail_spark(position: Vec3) -> Particle {
    Particle {
        position: position - Vec3::new(0.0, 0.2, 0.0),
        velocity: Vec3::new(0.0, -0.05, 0.0),
        life: 1.0,
        gravity: 0.0,
        decay: 0.05,
        size: 0.1,
        color: [255, 102, 0, 255],
    }
}

/// Shape of a spherical burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BurstProfile {
    pub(crate) particle_count: usize,
    pub(crate) speed_min: f32,
    pub(crate) speed_span: f32,
    pub(crate) gravity: f32,
    pub(crate) decay: f32,
    pub(crate) size: f32,
}

pub(crate) const ITEM_BURST: BurstProfile = BurstProfile {
    particle_count: 100,
    speed_min: 0.15,
    speed_span: 0.25,
    gravity: 0.004,
    decay: 0.015,
    size: 0.35,
};

/// A burst shares one life value across its particles, so it fades as a whole.
#[derive(Debug, Clone)]
pub(crate) struct Burst {
    pub(crate) origin: Vec3,
    pub(crate) color: Color,
    pub(crate) life: f32,
    decay: f32,
    gravity: f32,
    size: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
}

impl Burst {
    pub(crate) fn new(origin: Vec3, color: Color, profile: BurstProfile, rng: &mut impl Rng) -> Self {
        let velocities = (0..profile.particle_count)
            .map(|_| {
                let theta = rng.gen::<f32>() * TAU;
                let phi = rng.gen::<f32>() * PI;
                let speed = profile.speed_min + rng.gen::<f32>() * profile.speed_span;
                Vec3::new(
                    phi.sin() * theta.cos() * speed,
                    phi.sin() * theta.sin() * speed,
                    phi.cos() * speed,
                )
            })
            .collect();
        Self {
            origin,
            color,
            life: 1.0,
            decay: profile.decay,
            gravity: profile.gravity,
            size: profile.size,
            positions: vec![origin; profile.particle_count],
            velocities,
        }
    }

    #[cfg(test)]
    pub(crate) fn particle_count(&self) -> usize {
        self.positions.len()
    }

    /// Flash light of an item burst, fading with the particles.
    pub(crate) fn flash_intensity(&self) -> f32 {
        (self.life * FLASH_INTENSITY).max(0.0)
    }

    /// Advances one tick; false once the burst has faded out.
    pub(crate) fn update(&mut self) -> bool {
        for (position, velocity) in self.positions.iter_mut().zip(&mut self.velocities) {
            *position += *velocity;
            velocity.y -= self.gravity;
        }
        self.life -= self.decay;
        self.life > 0.0
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        let mut color = self.color;
        color[3] = (self.life.clamp(0.0, 1.0) * 255.0).round() as u8;
        out.extend(
            self.positions
                .iter()
                .map(|position| Primitive::point(*position, self.size, color)),
        );
    }
}
