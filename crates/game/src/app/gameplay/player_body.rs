use engine::{Camera3D, Color, Primitive, Vec3};

const WALK_STEP: f32 = 0.18;
const LEG_SWING: f32 = 0.5;
const ARM_SWING: f32 = 0.08;
const SETTLE: f32 = 0.8;
const SLEEVE: Color = [178, 34, 34, 255];
const GLOVE: Color = [240, 200, 160, 255];
const TROUSERS: Color = [34, 34, 68, 255];
const SHOE: Color = [26, 26, 26, 255];

/// The player's own arms and legs, swinging while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PlayerBody {
    walking: bool,
    walk_phase: f32,
    leg_swing: f32,
    arm_swing: f32,
}

impl PlayerBody {
    pub(crate) fn set_walking(&mut self, walking: bool) {
        self.walking = walking;
    }

    #[cfg(test)]
    pub(crate) fn is_walking(&self) -> bool {
        self.walking
    }

    #[cfg(test)]
    pub(crate) fn leg_swing(&self) -> f32 {
        self.leg_swing
    }

    #[cfg(test)]
    pub(crate) fn arm_swing(&self) -> f32 {
        self.arm_swing
    }

    pub(crate) fn update(&mut self) {
        if self.walking {
            self.walk_phase += WALK_STEP;
            self.leg_swing = self.walk_phase.sin() * LEG_SWING;
            self.arm_swing = self.walk_phase.sin() * ARM_SWING;
        } else {
            self.leg_swing *= SETTLE;
            self.arm_swing *= SETTLE;
        }
    }

    /// Where hand-held items sit, in world space.
    pub(crate) fn hand_position(&self, camera: &Camera3D) -> Vec3 {
        camera.from_view_space(Vec3::new(0.32 - self.arm_swing * 0.5, -0.3, -0.55))
    }

    pub(crate) fn push_primitives(&self, camera: &Camera3D, out: &mut Vec<Primitive>) {
        for (side, x, sway) in [(-1.0, -0.35, 0.2), (1.0, 0.32, -0.15)] {
            let swing = sway + side * self.arm_swing;
            let elbow = camera.from_view_space(Vec3::new(x + swing * 0.3, -0.45, -0.5));
            out.extend(Primitive::cuboid(elbow, Vec3::new(0.06, 0.06, 0.06), camera.yaw, SLEEVE));
            let wrist = camera.from_view_space(Vec3::new(x, -0.38, -0.58));
            out.push(Primitive::point(wrist, 0.07, GLOVE));
        }

        let hips = camera.position - Vec3::new(0.0, 1.0, 0.0);
        let (sin, cos) = camera.yaw.sin_cos();
        let forward = Vec3::new(-sin, 0.0, -cos);
        let right = Vec3::new(cos, 0.0, -sin);
        for (side, swing) in [(-1.0, self.leg_swing), (1.0, -self.leg_swing)] {
            let hip = hips + right * (0.12 * side);
            let knee = hip + forward * (swing.sin() * 0.26) - Vec3::new(0.0, 0.26, 0.0);
            let foot = hip + forward * (swing.sin() * 0.5 + 0.04) - Vec3::new(0.0, 0.7, 0.0);
            out.extend(Primitive::cuboid(knee, Vec3::new(0.07, 0.2, 0.07), camera.yaw, TROUSERS));
            out.extend(Primitive::cuboid(foot, Vec3::new(0.07, 0.05, 0.11), camera.yaw, SHOE));
        }
    }
}
