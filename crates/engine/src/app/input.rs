/// Held-state actions, sampled every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    OrbitLeft,
    OrbitRight,
    Quit,
}

const ACTION_COUNT: usize = 7;

/// Press edges: true for exactly one tick after the key goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEdge {
    Jump,
    PrimaryClick,
    ToggleFirstPerson,
    ToggleStorm,
    ToggleFireworks,
    Slot1,
    Slot2,
    Slot3,
    Holster,
}

const EDGE_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeStates {
    pressed: [bool; EDGE_COUNT],
}

impl EdgeStates {
    pub fn set(&mut self, edge: InputEdge) {
        self.pressed[edge.index()] = true;
    }

    pub fn was_pressed(&self, edge: InputEdge) -> bool {
        self.pressed[edge.index()]
    }

    pub fn any(&self) -> bool {
        self.pressed.iter().any(|pressed| *pressed)
    }
}

/// Turns raw key state changes into one-tick press edges.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EdgeTracker {
    held: [bool; EDGE_COUNT],
    pending: EdgeStates,
}

impl EdgeTracker {
    pub(crate) fn handle(&mut self, edge: InputEdge, is_pressed: bool) {
        let held = &mut self.held[edge.index()];
        if is_pressed && !*held {
            self.pending.set(edge);
        }
        *held = is_pressed;
    }

    pub(crate) fn take(&mut self) -> EdgeStates {
        std::mem::take(&mut self.pending)
    }
}

/// A single key whose repeats collapse into one press.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeyLatch {
    down: bool,
}

impl KeyLatch {
    /// Records the key state; true only on the press that follows a release.
    pub(crate) fn update(&mut self, is_pressed: bool) -> bool {
        let pressed_now = is_pressed && !self.down;
        self.down = is_pressed;
        pressed_now
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::OrbitLeft => 4,
            InputAction::OrbitRight => 5,
            InputAction::Quit => 6,
        }
    }
}

impl InputEdge {
    const fn index(self) -> usize {
        match self {
            InputEdge::Jump => 0,
            InputEdge::PrimaryClick => 1,
            InputEdge::ToggleFirstPerson => 2,
            InputEdge::ToggleStorm => 3,
            InputEdge::ToggleFireworks => 4,
            InputEdge::Slot1 => 5,
            InputEdge::Slot2 => 6,
            InputEdge::Slot3 => 7,
            InputEdge::Holster => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_states_track_each_edge_independently() {
        let mut edges = EdgeStates::default();
        assert!(!edges.any());

        edges.set(InputEdge::Slot2);
        assert!(edges.was_pressed(InputEdge::Slot2));
        assert!(!edges.was_pressed(InputEdge::Slot1));
        assert!(edges.any());
    }

    #[test]
    fn held_key_produces_a_single_edge() {
        let mut tracker = EdgeTracker::default();
        tracker.handle(InputEdge::Jump, true);
        tracker.handle(InputEdge::Jump, true);
        assert!(tracker.take().was_pressed(InputEdge::Jump));

        tracker.handle(InputEdge::Jump, true);
        assert!(!tracker.take().was_pressed(InputEdge::Jump));

        tracker.handle(InputEdge::Jump, false);
        tracker.handle(InputEdge::Jump, true);
        assert!(tracker.take().was_pressed(InputEdge::Jump));
    }

    #[test]
    fn key_latch_ignores_auto_repeat() {
        let mut latch = KeyLatch::default();
        assert!(latch.update(true));
        assert!(!latch.update(true));
        assert!(!latch.update(false));
        assert!(latch.update(true));
    }

    #[test]
    fn action_states_release_clears_held_flag() {
        let mut actions = ActionStates::default();
        actions.set(InputAction::MoveLeft, true);
        assert!(actions.is_down(InputAction::MoveLeft));

        actions.set(InputAction::MoveLeft, false);
        assert!(!actions.is_down(InputAction::MoveLeft));
    }
}
