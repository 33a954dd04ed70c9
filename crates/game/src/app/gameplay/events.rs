use engine::SoundId;

use super::items::ItemSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CourtyardEvent {
    DrinkConsumed,
    PassedOut,
    WokeUp,
    FirstPersonExited,
    PlaySound(SoundId),
    StartLoop(SoundId),
    StopLoop(SoundId),
    ItemCountChanged { slot: ItemSlot, count: u32 },
}

/// Queue of events raised during a tick, drained by the frame driver.
#[derive(Debug, Default, Clone)]
pub(crate) struct CourtyardEventBus {
    pending: Vec<CourtyardEvent>,
}

impl CourtyardEventBus {
    pub(crate) fn emit(&mut self, event: CourtyardEvent) {
        self.pending.push(event);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, CourtyardEvent> {
        self.pending.drain(..)
    }
}
