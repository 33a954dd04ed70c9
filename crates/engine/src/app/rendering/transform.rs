use glam::{EulerRot, Quat, Vec3};

pub const NEAR_PLANE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_y_radians: f32 },
    Orthographic { view_height: f32 },
}

/// Camera looking down its local -Z axis. Euler order is yaw (Y), then pitch (X), then roll (Z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub projection: Projection,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            projection: Projection::Perspective {
                fov_y_radians: 75f32.to_radians(),
            },
        }
    }
}

impl Camera3D {
    pub fn looking_at(position: Vec3, target: Vec3, projection: Projection) -> Self {
        let direction = target - position;
        let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
        Self {
            position,
            yaw: (-direction.x).atan2(-direction.z),
            pitch: direction.y.atan2(horizontal),
            roll: 0.0,
            projection,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll)
    }

    pub fn to_view_space(&self, world: Vec3) -> Vec3 {
        self.rotation().inverse() * (world - self.position)
    }

    /// Maps a point given in camera-local coordinates back into the world.
    pub fn from_view_space(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation() * local
    }
}

/// Screen-space result of projecting one point. `scale` is pixels per world unit at `depth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub scale: f32,
}

pub fn project_point(world: Vec3, camera: &Camera3D, viewport: Viewport) -> Option<Projected> {
    project_view(camera.to_view_space(world), camera, viewport)
}

pub(crate) fn project_view(view: Vec3, camera: &Camera3D, viewport: Viewport) -> Option<Projected> {
    let depth = -view.z;
    if depth < NEAR_PLANE {
        return None;
    }

    let half_width = viewport.width as f32 * 0.5;
    let half_height = viewport.height as f32 * 0.5;
    let scale = match camera.projection {
        Projection::Perspective { fov_y_radians } => {
            half_height / ((fov_y_radians * 0.5).tan() * depth)
        }
        Projection::Orthographic { view_height } => {
            half_height / (view_height * 0.5).max(f32::EPSILON)
        }
    };

    Some(Projected {
        x: half_width + view.x * scale,
        y: half_height - view.y * scale,
        depth,
        scale,
    })
}

/// Clips a convex view-space polygon against the near plane.
pub(crate) fn clip_to_near(polygon: &[Vec3]) -> Vec<Vec3> {
    let limit = -NEAR_PLANE;
    let inside = |point: &Vec3| point.z <= limit;
    let mut clipped = Vec::with_capacity(polygon.len() + 2);

    for (index, current) in polygon.iter().enumerate() {
        let previous = polygon[(index + polygon.len() - 1) % polygon.len()];
        match (inside(&previous), inside(current)) {
            (true, true) => clipped.push(*current),
            (true, false) => clipped.push(intersect_near(previous, *current, limit)),
            (false, true) => {
                clipped.push(intersect_near(previous, *current, limit));
                clipped.push(*current);
            }
            (false, false) => {}
        }
    }

    clipped
}

fn intersect_near(a: Vec3, b: Vec3, limit: f32) -> Vec3 {
    let t = (limit - a.z) / (b.z - a.z);
    a + (b - a) * t
}
