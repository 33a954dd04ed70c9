use std::f32::consts::FRAC_PI_2;

use engine::{Camera3D, InputAction, InputEdge, InputSnapshot, Projection, Vec3};
use tracing::info;

use super::collision::CollisionWorld;
use super::events::{CourtyardEvent, CourtyardEventBus};
use super::intoxication::{CameraSway, SwayMode};

pub(crate) const SPAWN: Vec3 = Vec3::new(-5.0, 1.7, 15.0);
pub(crate) const PLAYER_RADIUS: f32 = 0.4;
const MOVE_SPEED: f32 = 0.12;
const JUMP_VELOCITY: f32 = 0.25;
const GRAVITY: f32 = 0.015;
const GROUND_HEIGHT: f32 = 1.7;
const YARD_LIMIT: f32 = 28.0;
const MOUSE_SENSITIVITY: f32 = 0.002;
const FIELD_OF_VIEW_DEGREES: f32 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocomotionState {
    Inactive,
    Active,
}

/// First-person walking: movement keys, mouse look, jump and gravity.
#[derive(Debug, Clone)]
pub(crate) struct Locomotion {
    state: LocomotionState,
    position: Vec3,
    vertical_velocity: f32,
    yaw: f32,
    pitch: f32,
    grounded: bool,
    can_move: bool,
    sway: CameraSway,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            state: LocomotionState::Inactive,
            position: SPAWN,
            vertical_velocity: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            grounded: true,
            can_move: true,
            sway: CameraSway::ZERO,
        }
    }
}

impl Locomotion {
    #[cfg(test)]
    pub(crate) fn state(&self) -> LocomotionState {
        self.state
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state == LocomotionState::Active
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.position
    }

    pub(crate) fn yaw(&self) -> f32 {
        self.yaw
    }

    #[cfg(test)]
    pub(crate) fn pitch(&self) -> f32 {
        self.pitch
    }

    #[cfg(test)]
    pub(crate) fn is_grounded(&self) -> bool {
        self.grounded
    }

    #[cfg(test)]
    pub(crate) fn can_move(&self) -> bool {
        self.can_move
    }

    pub(crate) fn set_can_move(&mut self, can_move: bool) {
        self.can_move = can_move;
    }

    pub(crate) fn set_sway(&mut self, sway: CameraSway) {
        self.sway = sway;
    }

    /// Resumes walking where the last session ended; the first session starts at [`SPAWN`].
    /// The caller asks the loop for pointer capture.
    pub(crate) fn activate(&mut self) {
        self.state = LocomotionState::Active;
        info!(x = self.position.x, z = self.position.z, "first_person_entered");
    }

    pub(crate) fn deactivate(&mut self, events: &mut CourtyardEventBus) {
        if self.state == LocomotionState::Inactive {
            return;
        }
        self.state = LocomotionState::Inactive;
        self.sway = CameraSway::ZERO;
        info!("first_person_exited");
        events.emit(CourtyardEvent::FirstPersonExited);
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: Vec3, yaw: f32) {
        self.position = position;
        self.yaw = yaw;
    }

    pub(crate) fn on_capture_lost(&mut self, events: &mut CourtyardEventBus) {
        self.deactivate(events);
    }

    pub(crate) fn apply_mouse_delta(&mut self, dx: f32, dy: f32) {
        if !self.is_active() {
            return;
        }
        self.yaw -= dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub(crate) fn is_moving(&self, input: &InputSnapshot) -> bool {
        [
            InputAction::MoveForward,
            InputAction::MoveBack,
            InputAction::MoveLeft,
            InputAction::MoveRight,
        ]
        .into_iter()
        .any(|action| input.is_down(action))
    }

    pub(crate) fn update(&mut self, input: &InputSnapshot, collision: &CollisionWorld) {
        if !self.is_active() || !self.can_move {
            return;
        }

        let (sin, cos) = self.yaw.sin_cos();
        let mut delta_x = 0.0;
        let mut delta_z = 0.0;
        if input.is_down(InputAction::MoveForward) {
            delta_x -= sin * MOVE_SPEED;
            delta_z -= cos * MOVE_SPEED;
        }
        if input.is_down(InputAction::MoveBack) {
            delta_x += sin * MOVE_SPEED;
            delta_z += cos * MOVE_SPEED;
        }
        if input.is_down(InputAction::MoveLeft) {
            delta_x -= cos * MOVE_SPEED;
            delta_z += sin * MOVE_SPEED;
        }
        if input.is_down(InputAction::MoveRight) {
            delta_x += cos * MOVE_SPEED;
            delta_z -= sin * MOVE_SPEED;
        }

        let (x, z) = collision.resolve_collision(
            self.position.x,
            self.position.z,
            self.position.x + delta_x,
            self.position.z + delta_z,
            PLAYER_RADIUS,
        );
        self.position.x = x.clamp(-YARD_LIMIT, YARD_LIMIT);
        self.position.z = z.clamp(-YARD_LIMIT, YARD_LIMIT);

        if input.pressed(InputEdge::Jump) && self.grounded {
            self.vertical_velocity = JUMP_VELOCITY;
            self.grounded = false;
        }
        self.vertical_velocity -= GRAVITY;
        self.position.y += self.vertical_velocity;
        if self.position.y <= GROUND_HEIGHT {
            self.position.y = GROUND_HEIGHT;
            self.vertical_velocity = 0.0;
            self.grounded = true;
        }
    }

    pub(crate) fn camera_pose(&self) -> Camera3D {
        let pitch = match self.sway.mode {
            SwayMode::Additive => self.pitch + self.sway.x,
            SwayMode::Absolute => self.sway.x,
        };
        Camera3D {
            position: self.position,
            yaw: self.yaw + self.sway.y,
            pitch,
            roll: self.sway.roll,
            projection: Projection::Perspective {
                fov_y_radians: FIELD_OF_VIEW_DEGREES.to_radians(),
            },
        }
    }
}
