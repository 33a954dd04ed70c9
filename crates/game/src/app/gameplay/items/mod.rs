//! Hand-held items and the inventory that owns them.
//!
//! Slot 0 is the champagne bottle, slot 1 the sparkler, slot 2 the mini-fireworks.
//! Every deferred action (firework fuse, bottle refill) is a countdown advanced by
//! [`ItemSystem::update`], so the whole system is driven by the fixed tick alone.

mod bottle;
mod firework;
mod particles;
mod sparkler;

use engine::{Primitive, SoundId, Vec3};
use rand::Rng;
use tracing::{debug, info, trace};

pub(crate) use firework::{Burst, BurstProfile, BURST_COLORS};

use super::events::{CourtyardEvent, CourtyardEventBus};
use bottle::Bottle;
use firework::{FireworkStep, MiniFirework, PlacedFirework, FLASH_RANGE, ITEM_BURST};
use particles::ParticlePool;
use sparkler::Sparkler;

pub(crate) const SLOT_COUNT: usize = 3;
pub(crate) const SLOT_LABELS: [&str; SLOT_COUNT] = ["CHAMPAGNE", "SPARKLER", "FIREWORK"];
const BOTTLE_RESET_SECONDS: f32 = 0.5;
const TRAIL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ItemEffect {
    Sound(SoundId),
    PlaceFirework(Vec3),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemSlot {
    Champagne,
    Sparkler,
    Firework,
}

impl ItemSlot {
    pub(crate) const ALL: [ItemSlot; SLOT_COUNT] =
        [ItemSlot::Champagne, ItemSlot::Sparkler, ItemSlot::Firework];

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            ItemSlot::Champagne => 0,
            ItemSlot::Sparkler => 1,
            ItemSlot::Firework => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InventoryCounts {
    counts: [u32; SLOT_COUNT],
}

impl InventoryCounts {
    pub(crate) fn new(champagne: u32, sparkler: u32, firework: u32) -> Self {
        Self {
            counts: [champagne, sparkler, firework],
        }
    }

    pub(crate) fn get(&self, slot: ItemSlot) -> u32 {
        self.counts[slot.index()]
    }

    fn set(&mut self, slot: ItemSlot, count: u32) {
        self.counts[slot.index()] = count;
    }
}

impl Default for InventoryCounts {
    fn default() -> Self {
        Self::new(10, 1, 3)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ItemSystem {
    equipped: Option<ItemSlot>,
    counts: InventoryCounts,
    bottle: Bottle,
    sparkler: Sparkler,
    fireworks: MiniFirework,
    placed: Vec<PlacedFirework>,
    bursts: Vec<Burst>,
    trail: ParticlePool,
    bottle_reset_seconds: Option<f32>,
}

impl ItemSystem {
    pub(crate) fn new(counts: InventoryCounts) -> Self {
        Self {
            equipped: None,
            counts,
            bottle: Bottle::new(),
            sparkler: Sparkler::default(),
            fireworks: MiniFirework::new(counts.get(ItemSlot::Firework)),
            placed: Vec::new(),
            bursts: Vec::new(),
            trail: ParticlePool::with_capacity(TRAIL_CAPACITY),
            bottle_reset_seconds: None,
        }
    }

    pub(crate) fn equipped(&self) -> Option<ItemSlot> {
        self.equipped
    }

    pub(crate) fn counts(&self) -> InventoryCounts {
        self.counts
    }

    #[cfg(test)]
    pub(crate) fn bottle(&self) -> &Bottle {
        &self.bottle
    }

    #[cfg(test)]
    pub(crate) fn sparkler(&self) -> &Sparkler {
        &self.sparkler
    }

    #[cfg(test)]
    pub(crate) fn placed_fireworks(&self) -> &[PlacedFirework] {
        &self.placed
    }

    pub(crate) fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    #[cfg(test)]
    pub(crate) fn pending_bottle_reset(&self) -> Option<f32> {
        self.bottle_reset_seconds
    }

    /// Out-of-range slots and empty slots leave the current selection alone.
    pub(crate) fn select_slot(&mut self, index: usize, events: &mut CourtyardEventBus) {
        let Some(slot) = ItemSlot::from_index(index) else {
            trace!(index, "item_select_ignored_out_of_range");
            return;
        };
        if self.counts.get(slot) == 0 {
            trace!(slot = ?slot, "item_select_ignored_empty");
            return;
        }
        self.unequip(events);
        self.equipped = Some(slot);
        match slot {
            ItemSlot::Champagne => self.bottle.activate(),
            ItemSlot::Sparkler => {
                self.sparkler.activate();
                if !self.sparkler.is_consumed() {
                    events.emit(CourtyardEvent::StartLoop(SoundId::Sparkler));
                }
            }
            ItemSlot::Firework => {}
        }
        debug!(slot = ?slot, "item_equipped");
    }

    pub(crate) fn holster(&mut self, events: &mut CourtyardEventBus) {
        self.unequip(events);
    }

    /// Puts everything away when the player leaves first-person.
    pub(crate) fn hide_all(&mut self, events: &mut CourtyardEventBus) {
        self.unequip(events);
    }

    fn unequip(&mut self, events: &mut CourtyardEventBus) {
        let Some(slot) = self.equipped.take() else {
            return;
        };
        match slot {
            ItemSlot::Champagne => self.bottle.deactivate(),
            ItemSlot::Sparkler => {
                self.sparkler.deactivate();
                events.emit(CourtyardEvent::StopLoop(SoundId::Sparkler));
            }
            ItemSlot::Firework => {}
        }
    }

    pub(crate) fn use_current(&mut self, player_position: Vec3, yaw: f32, events: &mut CourtyardEventBus) {
        let Some(slot) = self.equipped else {
            return;
        };
        let effect = match slot {
            ItemSlot::Champagne => self.bottle.use_item(),
            ItemSlot::Sparkler => None,
            ItemSlot::Firework => self.fireworks.use_item(player_position, yaw),
        };
        match effect {
            Some(ItemEffect::Sound(sound)) => events.emit(CourtyardEvent::PlaySound(sound)),
            Some(ItemEffect::PlaceFirework(position)) => {
                self.placed.push(PlacedFirework::new(position));
                self.set_count(ItemSlot::Firework, self.fireworks.count(), events);
                debug!(x = position.x, z = position.z, "firework_placed");
                if self.fireworks.is_consumed() {
                    self.equipped = None;
                }
            }
            None => {}
        }
    }

    pub(crate) fn update(&mut self, dt_seconds: f32, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        if let Some(remaining) = self.bottle_reset_seconds.as_mut() {
            *remaining -= dt_seconds;
            if *remaining <= 0.0 {
                self.bottle_reset_seconds = None;
                self.bottle.reset();
            }
        }

        // A gesture started before switching away still plays out.
        let mut local = CourtyardEventBus::default();
        self.bottle.update(rng, &mut local);
        for event in local.drain() {
            if event == CourtyardEvent::DrinkConsumed {
                self.on_drink_consumed(events);
            }
            events.emit(event);
        }

        if self.equipped == Some(ItemSlot::Sparkler) {
            self.sparkler.update(rng);
            if self.sparkler.is_consumed() {
                self.set_count(ItemSlot::Sparkler, 0, events);
                self.unequip(events);
                info!("sparkler_burnt_out");
            }
        }

        self.update_fireworks(dt_seconds, rng, events);
    }

    fn on_drink_consumed(&mut self, events: &mut CourtyardEventBus) {
        let remaining = self.counts.get(ItemSlot::Champagne).saturating_sub(1);
        self.set_count(ItemSlot::Champagne, remaining, events);
        if remaining > 0 {
            self.bottle_reset_seconds = Some(BOTTLE_RESET_SECONDS);
        } else if self.equipped == Some(ItemSlot::Champagne) {
            self.unequip(events);
        }
    }

    fn update_fireworks(&mut self, dt_seconds: f32, rng: &mut impl Rng, events: &mut CourtyardEventBus) {
        let mut index = 0;
        while index < self.placed.len() {
            match self.placed[index].update(dt_seconds, rng, &mut self.trail) {
                FireworkStep::Launched => {
                    events.emit(CourtyardEvent::PlaySound(SoundId::FireworkLaunch));
                    index += 1;
                }
                FireworkStep::Exploded(at) => {
                    self.placed.swap_remove(index);
                    let color = BURST_COLORS[rng.gen_range(0..BURST_COLORS.len())];
                    self.bursts.push(Burst::new(at, color, ITEM_BURST, rng));
                    events.emit(CourtyardEvent::PlaySound(SoundId::FireworkBoom));
                    debug!(height = at.y, "firework_exploded");
                }
                FireworkStep::Waiting | FireworkStep::Climbing => index += 1,
            }
        }
        self.trail.update();
        self.bursts.retain_mut(Burst::update);
    }

    fn set_count(&mut self, slot: ItemSlot, count: u32, events: &mut CourtyardEventBus) {
        self.counts.set(slot, count);
        events.emit(CourtyardEvent::ItemCountChanged { slot, count });
        info!(slot = ?slot, count, "item_count_changed");
    }

    /// Hand-held item at `hand`, plus everything the items left in the world.
    pub(crate) fn push_primitives(&self, hand: Vec3, yaw: f32, out: &mut Vec<Primitive>) {
        match self.equipped {
            Some(ItemSlot::Champagne) => self.bottle.push_primitives(hand, yaw, out),
            Some(ItemSlot::Sparkler) => self.sparkler.push_primitives(hand, yaw, out),
            Some(ItemSlot::Firework) => self.fireworks.push_primitives(hand, yaw, out),
            None => {}
        }
        self.push_world_primitives(out);
    }

    pub(crate) fn push_world_primitives(&self, out: &mut Vec<Primitive>) {
        for firework in &self.placed {
            firework.push_primitives(out);
        }
        self.trail.push_primitives(Vec3::ZERO, out);
        for burst in &self.bursts {
            burst.push_primitives(out);
            let flash = burst.flash_intensity();
            if flash > 0.0 {
                let mut glow = burst.color;
                glow[3] = (flash / 3.0 * 120.0) as u8;
                out.push(Primitive::point(burst.origin, FLASH_RANGE * 0.1 * flash / 3.0, glow));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::bottle::BottleState;
    use super::firework::FireworkPhase;
    use super::*;

    const TICK: f32 = 1.0 / 60.0;

    fn system() -> (ItemSystem, CourtyardEventBus, SmallRng) {
        (
            ItemSystem::new(InventoryCounts::default()),
            CourtyardEventBus::default(),
            SmallRng::seed_from_u64(21),
        )
    }

    fn drain(bus: &mut CourtyardEventBus) -> Vec<CourtyardEvent> {
        bus.drain().collect()
    }

    fn finish_drink(items: &mut ItemSystem, bus: &mut CourtyardEventBus, rng: &mut SmallRng) {
        items.use_current(Vec3::ZERO, 0.0, bus);
        while items.bottle().state() != BottleState::Opened {
            items.update(TICK, rng, bus);
        }
        items.use_current(Vec3::ZERO, 0.0, bus);
        while items.bottle().state() != BottleState::Empty {
            items.update(TICK, rng, bus);
        }
    }

    #[test]
    fn default_counts_match_inventory() {
        let counts = InventoryCounts::default();
        assert_eq!(counts.get(ItemSlot::Champagne), 10);
        assert_eq!(counts.get(ItemSlot::Sparkler), 1);
        assert_eq!(counts.get(ItemSlot::Firework), 3);
    }

    #[test]
    fn out_of_range_and_empty_slots_are_noops() {
        let (mut items, mut bus, _) = system();
        items.select_slot(1, &mut bus);
        drain(&mut bus);

        items.select_slot(7, &mut bus);
        assert_eq!(items.equipped(), Some(ItemSlot::Sparkler));

        let mut empty = ItemSystem::new(InventoryCounts::new(0, 1, 3));
        empty.select_slot(0, &mut bus);
        assert_eq!(empty.equipped(), None);
        assert!(bus.is_empty());
    }

    #[test]
    fn switching_slots_deactivates_previous_item() {
        let (mut items, mut bus, _) = system();
        items.select_slot(1, &mut bus);
        assert!(items.sparkler().is_active());
        assert_eq!(drain(&mut bus), vec![CourtyardEvent::StartLoop(SoundId::Sparkler)]);

        items.select_slot(0, &mut bus);
        assert!(!items.sparkler().is_active());
        assert_eq!(items.equipped(), Some(ItemSlot::Champagne));
        assert_eq!(drain(&mut bus), vec![CourtyardEvent::StopLoop(SoundId::Sparkler)]);

        items.holster(&mut bus);
        assert_eq!(items.equipped(), None);
    }

    #[test]
    fn using_bottle_requests_cork_then_drink_sounds() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(0, &mut bus);
        finish_drink(&mut items, &mut bus, &mut rng);

        let events = drain(&mut bus);
        assert_eq!(events[0], CourtyardEvent::PlaySound(SoundId::Cork));
        assert!(events.contains(&CourtyardEvent::PlaySound(SoundId::Drink)));
        assert!(events.contains(&CourtyardEvent::ItemCountChanged {
            slot: ItemSlot::Champagne,
            count: 9,
        }));
        assert_eq!(
            events
                .iter()
                .filter(|event| **event == CourtyardEvent::DrinkConsumed)
                .count(),
            1
        );
    }

    #[test]
    fn drink_finishes_after_switching_to_another_slot() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(0, &mut bus);
        items.use_current(Vec3::ZERO, 0.0, &mut bus);
        while items.bottle().state() != BottleState::Opened {
            items.update(TICK, &mut rng, &mut bus);
        }
        items.use_current(Vec3::ZERO, 0.0, &mut bus);
        items.update(TICK, &mut rng, &mut bus);
        assert_eq!(items.bottle().state(), BottleState::Drinking);
        drain(&mut bus);

        items.select_slot(1, &mut bus);
        for _ in 0..600 {
            items.update(TICK, &mut rng, &mut bus);
        }

        let events = drain(&mut bus);
        let drinks = events
            .iter()
            .filter(|event| **event == CourtyardEvent::DrinkConsumed)
            .count();
        assert_eq!(drinks, 1);
        assert_eq!(items.counts().get(ItemSlot::Champagne), 9);
        assert_eq!(items.equipped(), Some(ItemSlot::Sparkler));
        assert_eq!(items.bottle().state(), BottleState::Idle);
    }

    #[test]
    fn last_bottle_finished_in_background_keeps_current_item() {
        let (mut items, mut bus, mut rng) = system();
        items.counts = InventoryCounts::new(1, 1, 3);
        items.select_slot(0, &mut bus);
        items.use_current(Vec3::ZERO, 0.0, &mut bus);
        while items.bottle().state() != BottleState::Opened {
            items.update(TICK, &mut rng, &mut bus);
        }
        items.use_current(Vec3::ZERO, 0.0, &mut bus);
        items.select_slot(2, &mut bus);
        while items.counts().get(ItemSlot::Champagne) > 0 {
            items.update(TICK, &mut rng, &mut bus);
        }
        assert_eq!(items.equipped(), Some(ItemSlot::Firework));
        assert!(items.pending_bottle_reset().is_none());
    }

    #[test]
    fn bottle_resets_after_half_a_second() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(0, &mut bus);
        finish_drink(&mut items, &mut bus, &mut rng);
        assert!(items.pending_bottle_reset().is_some());

        for _ in 0..29 {
            items.update(TICK, &mut rng, &mut bus);
        }
        assert_eq!(items.bottle().state(), BottleState::Empty);

        for _ in 0..2 {
            items.update(TICK, &mut rng, &mut bus);
        }
        assert_eq!(items.bottle().state(), BottleState::Idle);
        assert!(!items.bottle().is_consumed());
        assert_eq!(items.pending_bottle_reset(), None);
    }

    #[test]
    fn last_bottle_unequips_without_reset() {
        let mut items = ItemSystem::new(InventoryCounts::new(1, 1, 3));
        let mut bus = CourtyardEventBus::default();
        let mut rng = SmallRng::seed_from_u64(5);
        items.select_slot(0, &mut bus);
        finish_drink(&mut items, &mut bus, &mut rng);

        assert_eq!(items.counts().get(ItemSlot::Champagne), 0);
        assert_eq!(items.equipped(), None);
        assert_eq!(items.pending_bottle_reset(), None);
        items.select_slot(0, &mut bus);
        assert_eq!(items.equipped(), None);
    }

    #[test]
    fn sparkler_burns_out_and_empties_slot() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(1, &mut bus);
        drain(&mut bus);

        for _ in 0..2_100 {
            items.update(TICK, &mut rng, &mut bus);
            if items.equipped().is_none() {
                break;
            }
        }
        assert_eq!(items.equipped(), None);
        assert_eq!(items.counts().get(ItemSlot::Sparkler), 0);
        let events = drain(&mut bus);
        assert!(events.contains(&CourtyardEvent::StopLoop(SoundId::Sparkler)));
        assert!(events.contains(&CourtyardEvent::ItemCountChanged {
            slot: ItemSlot::Sparkler,
            count: 0,
        }));
    }

    #[test]
    fn fireworks_place_launch_and_explode() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(2, &mut bus);
        items.use_current(Vec3::new(0.0, 1.7, 0.0), 0.0, &mut bus);
        assert_eq!(items.placed_fireworks().len(), 1);
        assert_eq!(items.counts().get(ItemSlot::Firework), 2);
        assert_eq!(items.placed_fireworks()[0].position, Vec3::new(0.0, 0.0, -1.5));

        let mut launched = false;
        let mut exploded = false;
        for _ in 0..400 {
            items.update(TICK, &mut rng, &mut bus);
            for event in bus.drain() {
                match event {
                    CourtyardEvent::PlaySound(SoundId::FireworkLaunch) => launched = true,
                    CourtyardEvent::PlaySound(SoundId::FireworkBoom) => exploded = true,
                    _ => {}
                }
            }
            if exploded {
                break;
            }
        }
        assert!(launched && exploded);
        assert!(items.placed_fireworks().is_empty());
        assert_eq!(items.bursts().len(), 1);
        assert_eq!(items.bursts()[0].particle_count(), 100);
    }

    #[test]
    fn last_firework_unequips_the_stack() {
        let mut items = ItemSystem::new(InventoryCounts::new(10, 1, 1));
        let mut bus = CourtyardEventBus::default();
        items.select_slot(2, &mut bus);
        items.use_current(Vec3::ZERO, 0.0, &mut bus);

        assert_eq!(items.counts().get(ItemSlot::Firework), 0);
        assert_eq!(items.equipped(), None);
        items.select_slot(2, &mut bus);
        assert_eq!(items.equipped(), None);
    }

    #[test]
    fn placed_fireworks_keep_flying_after_holster() {
        let (mut items, mut bus, mut rng) = system();
        items.select_slot(2, &mut bus);
        items.use_current(Vec3::ZERO, 0.0, &mut bus);
        items.hide_all(&mut bus);

        for _ in 0..120 {
            items.update(TICK, &mut rng, &mut bus);
        }
        assert!(matches!(
            items.placed_fireworks()[0].phase,
            FireworkPhase::Launching { .. }
        ));
    }
}
