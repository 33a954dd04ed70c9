use glam::{Quat, Vec3};

pub type Color = [u8; 4];

/// Unit-cube corners per face, wound counter-clockwise when seen from outside.
const CUBE_FACES: [([Vec3; 4], f32); 5] = [
    (
        [
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ],
        1.0,
    ),
    (
        [
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ],
        0.82,
    ),
    (
        [
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
        ],
        0.68,
    ),
    (
        [
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ],
        0.75,
    ),
    (
        [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ],
        0.6,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Single-sided planar quad; the front face follows counter-clockwise winding.
    Quad { corners: [Vec3; 4], color: Color },
    /// Screen-facing square whose edge is `size` world units.
    Point {
        position: Vec3,
        size: f32,
        color: Color,
    },
}

impl Primitive {
    pub fn point(position: Vec3, size: f32, color: Color) -> Self {
        Self::Point {
            position,
            size,
            color,
        }
    }

    /// Upward-facing rectangle at height `y`.
    pub fn flat(center_x: f32, center_z: f32, half_x: f32, half_z: f32, y: f32, color: Color) -> Self {
        Self::Quad {
            corners: [
                Vec3::new(center_x - half_x, y, center_z + half_z),
                Vec3::new(center_x + half_x, y, center_z + half_z),
                Vec3::new(center_x + half_x, y, center_z - half_z),
                Vec3::new(center_x - half_x, y, center_z - half_z),
            ],
            color,
        }
    }

    /// The five visible faces of a box turned by `yaw`; the bottom face is never drawn.
    pub fn cuboid(center: Vec3, half_extents: Vec3, yaw: f32, color: Color) -> [Primitive; 5] {
        let rotation = Quat::from_rotation_y(yaw);
        CUBE_FACES.map(|(unit_corners, brightness)| Primitive::Quad {
            corners: unit_corners.map(|corner| center + rotation * (corner * half_extents)),
            color: shade(color, brightness),
        })
    }

    pub fn normal(&self) -> Option<Vec3> {
        match self {
            Primitive::Quad { corners, .. } => {
                let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
                Some(normal.normalize_or_zero())
            }
            Primitive::Point { .. } => None,
        }
    }

    pub fn center(&self) -> Vec3 {
        match self {
            Primitive::Quad { corners, .. } => {
                (corners[0] + corners[1] + corners[2] + corners[3]) * 0.25
            }
            Primitive::Point { position, .. } => *position,
        }
    }
}

pub fn shade(color: Color, factor: f32) -> Color {
    let scale = |channel: u8| (channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

pub fn mix(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    [
        lerp(from[0], to[0]),
        lerp(from[1], to[1]),
        lerp(from[2], to[2]),
        lerp(from[3], to[3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_faces_point_away_from_center() {
        let center = Vec3::new(4.0, 2.0, -3.0);
        for face in Primitive::cuboid(center, Vec3::new(2.0, 2.0, 1.0), 0.7, [200, 10, 10, 255]) {
            let normal = face.normal().expect("quad normal");
            assert!(normal.dot(face.center() - center) > 0.0);
        }
    }

    #[test]
    fn flat_quad_faces_up() {
        let quad = Primitive::flat(12.0, 8.0, 8.0, 8.0, 0.05, [220, 240, 255, 255]);
        let normal = quad.normal().expect("quad normal");
        assert!((normal.y - 1.0).abs() < 0.0001);
        assert!((quad.center() - Vec3::new(12.0, 0.05, 8.0)).length() < 0.0001);
    }

    #[test]
    fn shade_keeps_alpha_and_clamps() {
        assert_eq!(shade([100, 200, 255, 128], 0.5), [50, 100, 128, 128]);
        assert_eq!(shade([100, 200, 255, 255], 2.0), [200, 255, 255, 255]);
    }

    #[test]
    fn mix_interpolates_each_channel() {
        assert_eq!(mix([0, 0, 0, 255], [200, 100, 50, 255], 0.5), [100, 50, 25, 255]);
        assert_eq!(mix([0, 0, 0, 0], [10, 10, 10, 10], 3.0), [10, 10, 10, 10]);
    }
}
