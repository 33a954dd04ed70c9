//! Authored courtyard layout and the static geometry built from it once at load.

use std::f32::consts::{FRAC_PI_4, TAU};

use engine::{shade, Color, Primitive, Vec2, Vec3};
use rand::Rng;

pub(crate) const YARD_SIZE: f32 = 60.0;
pub(crate) const RINK_CENTER: Vec2 = Vec2::new(12.0, 8.0);
pub(crate) const RINK_RADIUS: f32 = 8.0;
pub(crate) const ROAD_OFFSET: f32 = -20.0;
pub(crate) const ROAD_WIDTH: f32 = 6.0;
pub(crate) const SPEAKER_POSITION: Vec3 = Vec3::new(4.0, 0.0, 3.0);

pub(crate) const SNOW_COLOR: Color = [232, 238, 246, 255];
pub(crate) const ROAD_COLOR: Color = [58, 58, 66, 255];
pub(crate) const ICE_COLOR: Color = [170, 214, 236, 255];
pub(crate) const SKY_COLOR: Color = [10, 14, 36, 255];
pub(crate) const GOLD: Color = [255, 215, 0, 255];
pub(crate) const LAMP_GLOW: Color = [255, 255, 170, 255];

pub(crate) const PEOPLE_COLORS: [Color; 5] = [
    [196, 30, 58, 255],
    [30, 74, 110, 255],
    [46, 90, 62, 255],
    [139, 69, 19, 255],
    [74, 58, 106, 255],
];
pub(crate) const CAR_COLORS: [Color; 4] = [
    [196, 30, 58, 255],
    [30, 74, 110, 255],
    [46, 90, 62, 255],
    [218, 165, 32, 255],
];
pub(crate) const TREE_LIGHT_COLORS: [Color; 5] = [
    [255, 40, 40, 255],
    [40, 255, 80, 255],
    [60, 120, 255, 255],
    [255, 220, 40, 255],
    [255, 80, 255, 255],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Building {
    pub(crate) x: f32,
    pub(crate) z: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) depth: f32,
    pub(crate) floors: u32,
}

const fn building(x: f32, z: f32, width: f32, height: f32, depth: f32, floors: u32) -> Building {
    Building {
        x,
        z,
        width,
        height,
        depth,
        floors,
    }
}

pub(crate) const BUILDINGS: [Building; 8] = [
    building(-15.0, -27.0, 20.0, 15.0, 8.0, 5),
    building(10.0, -27.0, 15.0, 12.0, 8.0, 4),
    building(-27.0, -10.0, 8.0, 18.0, 15.0, 6),
    building(-27.0, 10.0, 8.0, 12.0, 12.0, 4),
    building(25.0, 0.0, 6.0, 10.0, 18.0, 3),
    building(25.0, 18.0, 6.0, 14.0, 10.0, 5),
    building(0.0, 27.0, 18.0, 12.0, 6.0, 4),
    building(-18.0, 27.0, 10.0, 9.0, 6.0, 3),
];

pub(crate) const STREET_LAMPS: [Vec2; 8] = [
    Vec2::new(-10.0, -10.0),
    Vec2::new(10.0, -10.0),
    Vec2::new(-10.0, 10.0),
    Vec2::new(10.0, 15.0),
    Vec2::new(-15.0, 0.0),
    Vec2::new(15.0, -5.0),
    Vec2::new(5.0, 20.0),
    Vec2::new(-5.0, -15.0),
];

/// (radius, height, center y) of each tree tier, bottom to top.
const TREE_TIERS: [(f32, f32, f32); 5] = [
    (5.0, 4.0, 4.0),
    (4.0, 4.0, 7.0),
    (3.0, 4.0, 10.0),
    (2.0, 3.0, 12.5),
    (1.0, 2.0, 14.5),
];
const TREE_DARK: Color = [20, 82, 36, 255];
const TRUNK: Color = [92, 58, 30, 255];
const WINDOW_LIT: Color = [255, 214, 120, 255];
const WINDOW_DARK: Color = [36, 40, 58, 255];
const WINDOW_SIZE: f32 = 1.2;
const WINDOW_GAP: f32 = 2.5;
const WINDOW_LIT_CHANCE: f64 = 0.6;
const RINK_SEGMENTS: usize = 24;

/// Everything that never moves: ground, roads, buildings, rink, tree body, lamps and props.
pub(crate) fn build_static_primitives(rng: &mut impl Rng) -> Vec<Primitive> {
    let mut primitives = Vec::new();
    let half_yard = YARD_SIZE * 0.5;

    primitives.push(Primitive::flat(0.0, 0.0, half_yard, half_yard, 0.0, SNOW_COLOR));
    primitives.push(Primitive::flat(
        0.0,
        ROAD_OFFSET,
        half_yard,
        ROAD_WIDTH * 0.5,
        0.01,
        ROAD_COLOR,
    ));
    primitives.push(Primitive::flat(
        ROAD_OFFSET,
        0.0,
        ROAD_WIDTH * 0.5,
        half_yard,
        0.015,
        ROAD_COLOR,
    ));

    for building in &BUILDINGS {
        push_building(&mut primitives, building, rng);
    }
    push_rink(&mut primitives);
    push_tree(&mut primitives);
    for lamp in &STREET_LAMPS {
        push_lamp(&mut primitives, *lamp);
    }
    push_festive_props(&mut primitives);

    primitives
}

fn push_building(primitives: &mut Vec<Primitive>, building: &Building, rng: &mut impl Rng) {
    let wall = shade([120, 96, 86, 255], 0.9 + 0.02 * building.floors as f32);
    let half = Vec3::new(building.width * 0.5, building.height * 0.5, building.depth * 0.5);
    primitives.extend(Primitive::cuboid(
        Vec3::new(building.x, half.y, building.z),
        half,
        0.0,
        wall,
    ));
    primitives.extend(Primitive::cuboid(
        Vec3::new(building.x, building.height + 0.25, building.z),
        Vec3::new(half.x + 0.25, 0.25, half.z + 0.25),
        0.0,
        SNOW_COLOR,
    ));

    let floor_height = building.height / building.floors as f32;
    let front_count = ((building.width - 2.0) / WINDOW_GAP).floor().max(0.0) as usize;
    let side_count = ((building.depth - 2.0) / WINDOW_GAP).floor().max(0.0) as usize;
    let half_w = WINDOW_SIZE * 0.5;
    let half_h = WINDOW_SIZE * 1.3 * 0.5;

    for floor in 0..building.floors {
        let y = floor_height * (floor as f32 + 0.5);
        for index in 0..front_count {
            let x = building.x - half.x + 1.5 + index as f32 * WINDOW_GAP;
            for (z, facing) in [(building.z + half.z + 0.01, 1.0), (building.z - half.z - 0.01, -1.0)] {
                let color = window_color(rng);
                primitives.push(wall_quad(
                    Vec3::new(x, y, z),
                    Vec3::new(half_w * facing, 0.0, 0.0),
                    half_h,
                    color,
                ));
            }
        }
        for index in 0..side_count {
            let z = building.z - half.z + 1.5 + index as f32 * WINDOW_GAP;
            for (x, facing) in [(building.x + half.x + 0.01, 1.0), (building.x - half.x - 0.01, -1.0)] {
                let color = window_color(rng);
                primitives.push(wall_quad(
                    Vec3::new(x, y, z),
                    Vec3::new(0.0, 0.0, -half_w * facing),
                    half_h,
                    color,
                ));
            }
        }
    }
}

fn window_color(rng: &mut impl Rng) -> Color {
    if rng.gen_bool(WINDOW_LIT_CHANCE) {
        WINDOW_LIT
    } else {
        WINDOW_DARK
    }
}

/// Vertical quad centered at `center`; `across` is the half-width vector pointing to the
/// viewer's right, so the quad faces along `across × up`.
fn wall_quad(center: Vec3, across: Vec3, half_height: f32, color: Color) -> Primitive {
    let up = Vec3::new(0.0, half_height, 0.0);
    Primitive::Quad {
        corners: [
            center - across - up,
            center + across - up,
            center + across + up,
            center - across + up,
        ],
        color,
    }
}

fn push_rink(primitives: &mut Vec<Primitive>) {
    let center = Vec3::new(RINK_CENTER.x, 0.02, RINK_CENTER.y);
    let step = TAU / RINK_SEGMENTS as f32;
    for segment in 0..RINK_SEGMENTS {
        let from = step * segment as f32;
        let to = from + step;
        let rim = |angle: f32| {
            center + Vec3::new(angle.cos() * RINK_RADIUS, 0.0, angle.sin() * RINK_RADIUS)
        };
        primitives.push(Primitive::Quad {
            corners: [center, rim(to), rim(from), rim(from)],
            color: ICE_COLOR,
        });

        let post = rim(from + step * 0.5);
        primitives.extend(Primitive::cuboid(
            Vec3::new(post.x, 0.3, post.z),
            Vec3::new(0.3, 0.3, 0.3),
            from,
            [139, 69, 19, 255],
        ));
    }

    for index in 0..4 {
        let angle = index as f32 / 4.0 * TAU;
        let base = Vec2::new(
            RINK_CENTER.x + angle.cos() * 10.0,
            RINK_CENTER.y + angle.sin() * 10.0,
        );
        push_pole(primitives, base, 5.0);
        primitives.push(Primitive::point(Vec3::new(base.x, 5.0, base.y), 0.8, LAMP_GLOW));
    }
}

fn push_tree(primitives: &mut Vec<Primitive>) {
    primitives.extend(Primitive::cuboid(
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.9, 1.0, 0.9),
        0.0,
        TRUNK,
    ));
    for (tier, (radius, height, y)) in TREE_TIERS.iter().enumerate() {
        // Two stacked boxes per tier give a stepped cone.
        let yaw = if tier % 2 == 0 { 0.0 } else { FRAC_PI_4 };
        primitives.extend(Primitive::cuboid(
            Vec3::new(0.0, y - height * 0.25, 0.0),
            Vec3::new(radius * 0.8, height * 0.25, radius * 0.8),
            yaw,
            TREE_DARK,
        ));
        primitives.extend(Primitive::cuboid(
            Vec3::new(0.0, y + height * 0.25, 0.0),
            Vec3::new(radius * 0.45, height * 0.25, radius * 0.45),
            yaw + FRAC_PI_4,
            shade(TREE_DARK, 1.15),
        ));
    }
    primitives.push(Primitive::point(Vec3::new(0.0, 16.0, 0.0), 1.6, GOLD));
}

fn push_pole(primitives: &mut Vec<Primitive>, base: Vec2, height: f32) {
    primitives.extend(Primitive::cuboid(
        Vec3::new(base.x, height * 0.5, base.y),
        Vec3::new(0.15, height * 0.5, 0.15),
        0.0,
        [42, 42, 42, 255],
    ));
}

fn push_lamp(primitives: &mut Vec<Primitive>, base: Vec2) {
    push_pole(primitives, base, 4.0);
    primitives.extend(Primitive::cuboid(
        Vec3::new(base.x + 0.5, 4.0, base.y),
        Vec3::new(0.6, 0.05, 0.05),
        0.0,
        [42, 42, 42, 255],
    ));
    primitives.push(Primitive::point(Vec3::new(base.x + 1.1, 3.7, base.y), 0.5, LAMP_GLOW));
}

fn push_festive_props(primitives: &mut Vec<Primitive>) {
    for (x, z, color) in [
        (-10.0, 5.0, [196, 30, 58, 255]),
        (-8.0, -8.0, [46, 90, 62, 255]),
    ] {
        primitives.extend(Primitive::cuboid(
            Vec3::new(x, 1.25, z),
            Vec3::new(2.0, 1.25, 1.5),
            0.0,
            [210, 190, 150, 255],
        ));
        primitives.extend(Primitive::cuboid(
            Vec3::new(x, 2.9, z),
            Vec3::new(2.4, 0.4, 1.9),
            0.0,
            color,
        ));
    }

    for (x, z) in [(-6.0, 8.0), (6.0, -6.0)] {
        primitives.extend(Primitive::cuboid(
            Vec3::new(x, 0.6, z),
            Vec3::new(1.5, 0.1, 0.4),
            0.0,
            [110, 70, 40, 255],
        ));
    }

    for (radius, y) in [(1.0, 1.0), (0.75, 2.3), (0.5, 3.2)] {
        primitives.extend(Primitive::cuboid(
            Vec3::new(-12.0, y, 12.0),
            Vec3::splat(radius * 0.85),
            0.0,
            SNOW_COLOR,
        ));
    }

    for index in 0..8 {
        let angle = index as f32 / 8.0 * TAU;
        let size = 0.5 + 0.1 * (index % 3) as f32;
        let color = TREE_LIGHT_COLORS[index % TREE_LIGHT_COLORS.len()];
        primitives.extend(Primitive::cuboid(
            Vec3::new(angle.cos() * 6.5, size * 0.5, angle.sin() * 6.5),
            Vec3::splat(size * 0.5),
            angle,
            color,
        ));
    }

    primitives.extend(Primitive::cuboid(
        SPEAKER_POSITION + Vec3::new(0.0, 0.7, 0.0),
        Vec3::new(0.4, 0.7, 0.25),
        0.0,
        [28, 28, 32, 255],
    ));
}
