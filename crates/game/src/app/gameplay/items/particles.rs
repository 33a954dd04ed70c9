use engine::{Color, Primitive, Vec3};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Particle {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) life: f32,
    pub(crate) gravity: f32,
    pub(crate) decay: f32,
    pub(crate) size: f32,
    pub(crate) color: Color,
}

impl Particle {
    /// Integrates one tick and reports whether the particle is still alive.
    fn step(&mut self) -> bool {
        self.position += self.velocity;
        self.velocity.y -= self.gravity;
        self.life -= self.decay;
        self.life > 0.0
    }
}

/// Fixed-capacity slab; freed slots are reused and emissions past capacity are dropped.
#[derive(Debug, Clone)]
pub(crate) struct ParticlePool {
    slots: Vec<Option<Particle>>,
    free: Vec<usize>,
    capacity: usize,
    dropped: u64,
}

impl ParticlePool {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    pub(crate) fn emit(&mut self, particle: Particle) -> bool {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(particle);
            return true;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(Some(particle));
            return true;
        }
        self.dropped = self.dropped.saturating_add(1);
        if self.dropped.is_power_of_two() {
            trace!(dropped = self.dropped, capacity = self.capacity, "particle_pool_full");
        }
        false
    }

    pub(crate) fn update(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(particle) = slot {
                if !particle.step() {
                    *slot = None;
                    self.free.push(index);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[cfg(test)]
    pub(crate) fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().flatten()
    }

    /// Particles as camera-facing points; `origin` shifts hand-held pools into world space.
    pub(crate) fn push_primitives(&self, origin: Vec3, out: &mut Vec<Primitive>) {
        out.extend(self.iter().map(|particle| {
            let mut color = particle.color;
            color[3] = (particle.life.clamp(0.0, 1.0) * 255.0).round() as u8;
            Primitive::point(origin + particle.position, particle.size, color)
        }));
    }
}
