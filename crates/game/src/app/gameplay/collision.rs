use engine::Vec2;

/// Footprint padding added to every building on each side.
const BUILDING_INFLATE: f32 = 0.5;
const TREE_COLLIDER_RADIUS: f32 = 5.5;
const LAMP_COLLIDER_RADIUS: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Collider {
    Box {
        center: Vec2,
        half_width: f32,
        half_depth: f32,
    },
    Cylinder {
        center: Vec2,
        radius: f32,
    },
}

impl Collider {
    pub(crate) fn building(center_x: f32, center_z: f32, width: f32, depth: f32) -> Self {
        Self::Box {
            center: Vec2::new(center_x, center_z),
            half_width: width * 0.5 + BUILDING_INFLATE,
            half_depth: depth * 0.5 + BUILDING_INFLATE,
        }
    }

    pub(crate) fn cylinder(center_x: f32, center_z: f32, radius: f32) -> Self {
        Self::Cylinder {
            center: Vec2::new(center_x, center_z),
            radius,
        }
    }

    fn overlaps_circle(&self, x: f32, z: f32, radius: f32) -> bool {
        match *self {
            Collider::Box {
                center,
                half_width,
                half_depth,
            } => {
                (x - center.x).abs() < half_width + radius
                    && (z - center.y).abs() < half_depth + radius
            }
            Collider::Cylinder {
                center,
                radius: collider_radius,
            } => Vec2::new(x, z).distance(center) < collider_radius + radius,
        }
    }
}

/// Static obstacles in the ground plane. `Vec2::y` holds world z.
#[derive(Debug, Clone, Default)]
pub(crate) struct CollisionWorld {
    colliders: Vec<Collider>,
}

impl CollisionWorld {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Buildings and the tree; lamps are added separately once the lamp posts are placed.
    pub(crate) fn courtyard(buildings: &[super::world_layout::Building]) -> Self {
        let mut world = Self::new();
        world.add_colliders(
            buildings
                .iter()
                .map(|building| {
                    Collider::building(building.x, building.z, building.width, building.depth)
                }),
        );
        world.add_collider(Collider::cylinder(0.0, 0.0, TREE_COLLIDER_RADIUS));
        world
    }

    pub(crate) fn add_street_lamps(&mut self, lamp_positions: &[Vec2]) {
        self.add_colliders(
            lamp_positions
                .iter()
                .map(|lamp| Collider::cylinder(lamp.x, lamp.y, LAMP_COLLIDER_RADIUS)),
        );
    }

    pub(crate) fn add_collider(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    pub(crate) fn add_colliders(&mut self, colliders: impl IntoIterator<Item = Collider>) {
        self.colliders.extend(colliders);
    }

    pub(crate) fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub(crate) fn check_collision(&self, x: f32, z: f32, radius: f32) -> bool {
        self.colliders
            .iter()
            .any(|collider| collider.overlaps_circle(x, z, radius))
    }

    /// Full move, then x-only, then z-only, else stay put.
    pub(crate) fn resolve_collision(
        &self,
        old_x: f32,
        old_z: f32,
        new_x: f32,
        new_z: f32,
        radius: f32,
    ) -> (f32, f32) {
        if !self.check_collision(new_x, new_z, radius) {
            return (new_x, new_z);
        }
        if !self.check_collision(new_x, old_z, radius) {
            return (new_x, old_z);
        }
        if !self.check_collision(old_x, new_z, radius) {
            return (old_x, new_z);
        }
        (old_x, old_z)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::app::gameplay::world_layout::{BUILDINGS, STREET_LAMPS};

    fn single(collider: Collider) -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_collider(collider);
        world
    }

    fn reference_overlap(collider: &Collider, x: f32, z: f32, radius: f32) -> bool {
        match *collider {
            Collider::Box {
                center,
                half_width,
                half_depth,
            } => {
                x > center.x - half_width - radius
                    && x < center.x + half_width + radius
                    && z > center.y - half_depth - radius
                    && z < center.y + half_depth + radius
            }
            Collider::Cylinder {
                center,
                radius: collider_radius,
            } => {
                let dx = x - center.x;
                let dz = z - center.y;
                (dx * dx + dz * dz).sqrt() < collider_radius + radius
            }
        }
    }

    #[test]
    fn building_footprint_is_inflated() {
        let world = single(Collider::building(0.0, 0.0, 10.0, 10.0));
        assert!(world.check_collision(5.4, 0.0, 0.0));
        assert!(!world.check_collision(5.6, 0.0, 0.0));
    }

    #[test]
    fn box_and_cylinder_edges_are_strict() {
        let boxed = single(Collider::Box {
            center: Vec2::ZERO,
            half_width: 1.0,
            half_depth: 1.0,
        });
        assert!(!boxed.check_collision(1.5, 0.0, 0.5));
        assert!(boxed.check_collision(1.49, 0.0, 0.5));

        let cylinder = single(Collider::cylinder(0.0, 0.0, 1.0));
        assert!(!cylinder.check_collision(0.0, 1.5, 0.5));
        assert!(cylinder.check_collision(0.0, 1.49, 0.5));
    }

    #[test]
    fn check_collision_matches_brute_force_reference() {
        let colliders = [
            Collider::building(-3.0, 2.0, 4.0, 6.0),
            Collider::cylinder(5.0, -4.0, 1.5),
        ];
        let mut rng = SmallRng::seed_from_u64(7);
        for collider in &colliders {
            let world = single(*collider);
            for _ in 0..2_000 {
                let x = rng.gen_range(-12.0..12.0);
                let z = rng.gen_range(-12.0..12.0);
                let radius = rng.gen_range(0.0..2.0);
                assert_eq!(
                    world.check_collision(x, z, radius),
                    reference_overlap(collider, x, z, radius),
                    "collider {collider:?} at ({x}, {z}) r {radius}"
                );
            }
        }
    }

    #[test]
    fn resolve_returns_free_target_unchanged() {
        let world = single(Collider::cylinder(10.0, 10.0, 1.0));
        assert_eq!(world.resolve_collision(0.0, 0.0, 0.1, 0.2, 0.4), (0.1, 0.2));
    }

    #[test]
    fn resolve_slides_along_wall() {
        let world = single(Collider::Box {
            center: Vec2::ZERO,
            half_width: 5.0,
            half_depth: 5.0,
        });
        // Moving diagonally into the +z face: only the z-preserving move is free.
        let (x, z) = world.resolve_collision(1.0, 5.5, 1.1, 5.3, 0.4);
        assert_eq!((x, z), (1.1, 5.5));

        // Moving diagonally into the +x face: only the x-preserving move is free.
        let (x, z) = world.resolve_collision(5.5, 1.0, 5.3, 1.1, 0.4);
        assert_eq!((x, z), (5.5, 1.1));
    }

    #[test]
    fn resolve_stays_put_in_a_corner() {
        let mut world = CollisionWorld::new();
        world.add_colliders([
            Collider::Box {
                center: Vec2::new(0.0, 2.0),
                half_width: 5.0,
                half_depth: 1.0,
            },
            Collider::Box {
                center: Vec2::new(2.0, 0.0),
                half_width: 1.0,
                half_depth: 5.0,
            },
        ]);
        assert_eq!(world.resolve_collision(0.0, 0.0, 0.8, 0.8, 0.4), (0.0, 0.0));
    }

    #[test]
    fn courtyard_has_buildings_tree_and_lamps() {
        let mut world = CollisionWorld::courtyard(&BUILDINGS);
        assert_eq!(world.collider_count(), BUILDINGS.len() + 1);
        world.add_street_lamps(&STREET_LAMPS);
        assert_eq!(world.collider_count(), BUILDINGS.len() + 1 + STREET_LAMPS.len());

        assert!(world.check_collision(0.0, 5.8, 0.4));
        assert!(world.check_collision(-10.0, -10.0, 0.4));
        assert!(!world.check_collision(-5.0, 15.0, 0.4));
    }
}
