use std::f32::consts::{FRAC_PI_2, PI, TAU};

use engine::{Color, Primitive, Vec2, Vec3};
use rand::Rng;

use super::world_layout::{CAR_COLORS, PEOPLE_COLORS, RINK_CENTER};

const WANDER_SPEED_MIN: f32 = 0.01;
const WANDER_SPEED_SPAN: f32 = 0.015;
const WANDER_ARRIVAL_DISTANCE: f32 = 0.5;
const WANDER_WAIT_MIN_SECONDS: f32 = 1.0;
const WANDER_WAIT_SPAN_SECONDS: f32 = 3.0;
const WANDER_WAIT_DECREMENT: f32 = 0.016;
const WALK_PHASE_STEP: f32 = 0.15;
const LIMB_SWING: f32 = 0.3;

const ORBIT_RADIUS_MIN: f32 = 2.0;
const ORBIT_RADIUS_SPAN: f32 = 4.0;
const ORBIT_SPEED_MIN: f32 = 0.005;
const ORBIT_SPEED_SPAN: f32 = 0.01;

const PATROL_BOUND: f32 = 35.0;
const PATROL_X_SPEED_MIN: f32 = 0.05;
const PATROL_Z_SPEED_MIN: f32 = 0.04;
const PATROL_SPEED_SPAN: f32 = 0.03;
const PATROL_X_LANE_Z: f32 = -20.0;
const PATROL_Z_LANE_X: f32 = -20.0;

const VALID_HALF_EXTENT: f32 = 17.5;
const ROAD_CLEARANCE: f32 = 4.0;
const RINK_CLEARANCE: f32 = 10.0;

/// Supplies fresh wander targets when a pedestrian arrives.
pub(crate) trait TargetSource {
    fn next_target(&mut self, rng: &mut dyn rand::RngCore) -> Vec2;
}

/// Open courtyard ground: off the roads and away from the rink.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CourtyardTargets;

impl CourtyardTargets {
    pub(crate) fn is_valid(position: Vec2) -> bool {
        (position.x + 20.0).abs() >= ROAD_CLEARANCE
            && (position.y + 20.0).abs() >= ROAD_CLEARANCE
            && position.distance(RINK_CENTER) >= RINK_CLEARANCE
    }
}

impl TargetSource for CourtyardTargets {
    fn next_target(&mut self, rng: &mut dyn rand::RngCore) -> Vec2 {
        loop {
            let candidate = Vec2::new(
                rng.gen_range(-VALID_HALF_EXTENT..VALID_HALF_EXTENT),
                rng.gen_range(-VALID_HALF_EXTENT..VALID_HALF_EXTENT),
            );
            if Self::is_valid(candidate) {
                return candidate;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatrolAxis {
    X,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MotionPolicy {
    Wander {
        target: Vec2,
        speed: f32,
        wait_seconds: f32,
    },
    Orbit {
        center: Vec2,
        radius: f32,
        angle: f32,
        angular_speed: f32,
        direction: f32,
    },
    Patrol {
        axis: PatrolAxis,
        bound: f32,
        speed: f32,
        direction: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MovingEntity {
    pub(crate) position: Vec3,
    pub(crate) facing: f32,
    pub(crate) policy: MotionPolicy,
    pub(crate) walk_phase: f32,
    pub(crate) limb_swing: f32,
    pub(crate) color: Color,
}

impl MovingEntity {
    pub(crate) fn pedestrian(position: Vec2, rng: &mut impl Rng) -> Self {
        Self {
            position: Vec3::new(position.x, 0.0, position.y),
            facing: 0.0,
            policy: MotionPolicy::Wander {
                target: position,
                speed: WANDER_SPEED_MIN + rng.gen::<f32>() * WANDER_SPEED_SPAN,
                wait_seconds: 0.0,
            },
            walk_phase: rng.gen::<f32>() * TAU,
            limb_swing: 0.0,
            color: PEOPLE_COLORS[rng.gen_range(0..PEOPLE_COLORS.len())],
        }
    }

    pub(crate) fn skater(center: Vec2, rng: &mut impl Rng) -> Self {
        let radius = ORBIT_RADIUS_MIN + rng.gen::<f32>() * ORBIT_RADIUS_SPAN;
        let angle = rng.gen::<f32>() * TAU;
        let angular_speed = ORBIT_SPEED_MIN + rng.gen::<f32>() * ORBIT_SPEED_SPAN;
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let mut skater = Self {
            position: Vec3::ZERO,
            facing: 0.0,
            policy: MotionPolicy::Orbit {
                center,
                radius,
                angle,
                angular_speed,
                direction,
            },
            walk_phase: 0.0,
            limb_swing: 0.0,
            color: PEOPLE_COLORS[rng.gen_range(0..PEOPLE_COLORS.len())],
        };
        skater.place_on_orbit();
        skater
    }

    pub(crate) fn car(axis: PatrolAxis, start: f32, rng: &mut impl Rng) -> Self {
        let (position, facing, speed_min) = match axis {
            PatrolAxis::X => (
                Vec3::new(start, 0.0, PATROL_X_LANE_Z),
                0.0,
                PATROL_X_SPEED_MIN,
            ),
            PatrolAxis::Z => (
                Vec3::new(PATROL_Z_LANE_X, 0.0, start),
                FRAC_PI_2,
                PATROL_Z_SPEED_MIN,
            ),
        };
        Self {
            position,
            facing,
            policy: MotionPolicy::Patrol {
                axis,
                bound: PATROL_BOUND,
                speed: speed_min + rng.gen::<f32>() * PATROL_SPEED_SPAN,
                direction: 1.0,
            },
            walk_phase: 0.0,
            limb_swing: 0.0,
            color: CAR_COLORS[rng.gen_range(0..CAR_COLORS.len())],
        }
    }

    pub(crate) fn update(&mut self, targets: &mut dyn TargetSource, rng: &mut dyn rand::RngCore) {
        match &mut self.policy {
            MotionPolicy::Wander {
                target,
                speed,
                wait_seconds,
            } => {
                if *wait_seconds > 0.0 {
                    *wait_seconds -= WANDER_WAIT_DECREMENT;
                    return;
                }
                let here = Vec2::new(self.position.x, self.position.z);
                let offset = *target - here;
                let distance = offset.length();
                if distance < WANDER_ARRIVAL_DISTANCE {
                    *wait_seconds =
                        WANDER_WAIT_MIN_SECONDS + rng.gen::<f32>() * WANDER_WAIT_SPAN_SECONDS;
                    *target = targets.next_target(rng);
                    return;
                }
                let step = offset / distance * *speed;
                self.position.x += step.x;
                self.position.z += step.y;
                self.facing = offset.x.atan2(offset.y);
                self.walk_phase += WALK_PHASE_STEP;
                self.limb_swing = self.walk_phase.sin() * LIMB_SWING;
            }
            MotionPolicy::Orbit {
                angle,
                angular_speed,
                direction,
                ..
            } => {
                *angle += *angular_speed * *direction;
                self.place_on_orbit();
            }
            MotionPolicy::Patrol {
                axis,
                bound,
                speed,
                direction,
            } => {
                let coordinate = match axis {
                    PatrolAxis::X => &mut self.position.x,
                    PatrolAxis::Z => &mut self.position.z,
                };
                *coordinate += *speed * *direction;
                if *coordinate > *bound {
                    *coordinate = *bound;
                    *direction = -1.0;
                } else if *coordinate < -*bound {
                    *coordinate = -*bound;
                    *direction = 1.0;
                } else {
                    return;
                }
                self.facing = match (*axis, *direction > 0.0) {
                    (PatrolAxis::X, true) => 0.0,
                    (PatrolAxis::X, false) => PI,
                    (PatrolAxis::Z, true) => FRAC_PI_2,
                    (PatrolAxis::Z, false) => -FRAC_PI_2,
                };
            }
        }
    }

    fn place_on_orbit(&mut self) {
        if let MotionPolicy::Orbit {
            center,
            radius,
            angle,
            direction,
            ..
        } = self.policy
        {
            self.position.x = center.x + angle.cos() * radius;
            self.position.z = center.y + angle.sin() * radius;
            self.facing = angle + if direction > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        }
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        match self.policy {
            MotionPolicy::Patrol { .. } => self.push_car(out),
            MotionPolicy::Wander { .. } | MotionPolicy::Orbit { .. } => self.push_figure(out),
        }
    }

    fn push_figure(&self, out: &mut Vec<Primitive>) {
        let base = self.position;
        out.extend(Primitive::cuboid(
            base + Vec3::new(0.0, 1.2, 0.0),
            Vec3::new(0.3, 0.4, 0.2),
            self.facing,
            self.color,
        ));
        out.extend(Primitive::cuboid(
            base + Vec3::new(0.0, 1.85, 0.0),
            Vec3::splat(0.22),
            self.facing,
            [240, 200, 170, 255],
        ));
        // Legs stride along the facing direction.
        let forward = Vec3::new(self.facing.sin(), 0.0, self.facing.cos());
        let side = Vec3::new(self.facing.cos(), 0.0, -self.facing.sin());
        for (offset, swing) in [(-0.15, self.limb_swing), (0.15, -self.limb_swing)] {
            out.extend(Primitive::cuboid(
                base + side * offset + forward * (swing * 0.4) + Vec3::new(0.0, 0.4, 0.0),
                Vec3::new(0.1, 0.4, 0.1),
                self.facing,
                [40, 40, 48, 255],
            ));
        }
    }

    fn push_car(&self, out: &mut Vec<Primitive>) {
        out.extend(Primitive::cuboid(
            self.position + Vec3::new(0.0, 0.6, 0.0),
            Vec3::new(1.0, 0.4, 0.6),
            self.facing,
            self.color,
        ));
        out.extend(Primitive::cuboid(
            self.position + Vec3::new(0.0, 1.2, 0.0),
            Vec3::new(0.6, 0.25, 0.55),
            self.facing,
            [150, 190, 220, 255],
        ));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Populations {
    pub(crate) pedestrians: usize,
    pub(crate) skaters: usize,
    pub(crate) x_cars: usize,
    pub(crate) z_cars: usize,
}

impl Default for Populations {
    fn default() -> Self {
        Self {
            pedestrians: 12,
            skaters: 6,
            x_cars: 3,
            z_cars: 2,
        }
    }
}

/// Every moving figure and vehicle in the courtyard.
#[derive(Debug, Clone, Default)]
pub(crate) struct Crowd {
    pub(crate) entities: Vec<MovingEntity>,
    targets: CourtyardTargets,
}

impl Crowd {
    pub(crate) fn spawn(populations: Populations, rng: &mut impl Rng) -> Self {
        let mut targets = CourtyardTargets;
        let mut entities = Vec::with_capacity(
            populations.pedestrians + populations.skaters + populations.x_cars + populations.z_cars,
        );
        for _ in 0..populations.pedestrians {
            let position = targets.next_target(rng);
            entities.push(MovingEntity::pedestrian(position, rng));
        }
        for _ in 0..populations.skaters {
            entities.push(MovingEntity::skater(RINK_CENTER, rng));
        }
        for index in 0..populations.x_cars {
            entities.push(MovingEntity::car(PatrolAxis::X, -30.0 + 25.0 * index as f32, rng));
        }
        for index in 0..populations.z_cars {
            entities.push(MovingEntity::car(PatrolAxis::Z, -25.0 + 30.0 * index as f32, rng));
        }
        Self { entities, targets }
    }

    pub(crate) fn update(&mut self, rng: &mut dyn rand::RngCore) {
        for entity in &mut self.entities {
            entity.update(&mut self.targets, rng);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn push_primitives(&self, out: &mut Vec<Primitive>) {
        for entity in &self.entities {
            entity.push_primitives(out);
        }
    }
}
