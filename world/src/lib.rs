#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative particle store for Circlefall.

use std::collections::VecDeque;

use circlefall_core::{AdmissionMode, Command, Event, Particle, ParticleId, ParticleSeed};

/// Upper bound on the slots reserved up front; larger stores grow on demand.
const PREALLOCATED_PARTICLES: usize = 1_024;

/// Bounded, insertion-ordered collection of particles, oldest first.
#[derive(Debug)]
pub struct ParticleStore {
    particles: VecDeque<Particle>,
    capacity: usize,
    mode: AdmissionMode,
    next_id: u64,
}

impl ParticleStore {
    /// Creates an empty store enforcing the provided capacity and admission mode.
    #[must_use]
    pub fn new(capacity: usize, mode: AdmissionMode) -> Self {
        Self {
            particles: VecDeque::with_capacity(capacity.min(PREALLOCATED_PARTICLES)),
            capacity,
            mode,
            next_id: 0,
        }
    }

    /// Admits a particle built from `seed`, evicting the oldest entries first in live-trim mode.
    ///
    /// Blocking stores refuse the particle while full, and a store with zero
    /// capacity refuses every particle.
    pub fn spawn(&mut self, seed: ParticleSeed) -> SpawnOutcome {
        if self.capacity == 0 {
            return SpawnOutcome::Refused;
        }

        let mut evicted = Vec::new();
        match self.mode {
            AdmissionMode::Blocking => {
                if self.is_full() {
                    return SpawnOutcome::Refused;
                }
            }
            AdmissionMode::LiveTrim => self.evict_down_to(self.capacity - 1, &mut evicted),
        }

        let id = ParticleId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.particles.push_back(Particle::from_seed(id, seed));
        SpawnOutcome::Admitted { id, evicted }
    }

    /// Adopts a new capacity, returning the identifiers evicted to honour it.
    ///
    /// Only live-trim stores evict; a blocking store keeps its surplus and
    /// refuses spawns until enough particles are gone.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<ParticleId> {
        self.capacity = capacity;
        let mut evicted = Vec::new();
        if self.mode == AdmissionMode::LiveTrim {
            self.evict_down_to(capacity, &mut evicted);
        }
        evicted
    }

    fn evict_down_to(&mut self, len: usize, evicted: &mut Vec<ParticleId>) {
        while self.particles.len() > len {
            if let Some(particle) = self.particles.pop_front() {
                evicted.push(particle.id());
            }
        }
    }

    /// Number of particles currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Reports whether the store holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Capacity currently enforced.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admission mode the store was created with.
    #[must_use]
    pub const fn mode(&self) -> AdmissionMode {
        self.mode
    }

    /// Reports whether another spawn would exceed the capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Iterates over the stored particles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Mutable access to particle kinematics in store order.
    ///
    /// Membership cannot be altered through the returned slice.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.particles.make_contiguous()
    }
}

/// Result of a spawn request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The particle joined the store.
    Admitted {
        /// Identifier assigned to the new particle.
        id: ParticleId,
        /// Particles evicted to make room, oldest first.
        evicted: Vec<ParticleId>,
    },
    /// The store was full (blocking) or had zero capacity.
    Refused,
}

/// Applies the provided command to the store, reporting the outcome as events.
pub fn apply(store: &mut ParticleStore, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnParticle { seed } => match store.spawn(seed) {
            SpawnOutcome::Admitted { id, evicted } => {
                if !evicted.is_empty() {
                    out_events.push(Event::ParticlesEvicted { ids: evicted });
                }
                out_events.push(Event::ParticleSpawned { id });
            }
            SpawnOutcome::Refused => out_events.push(Event::SpawnRefused),
        },
        Command::SetCapacity { capacity } => {
            let from = store.capacity();
            if from == capacity {
                return;
            }
            let evicted = store.set_capacity(capacity);
            out_events.push(Event::CapacityChanged { from, to: capacity });
            if !evicted.is_empty() {
                out_events.push(Event::ParticlesEvicted { ids: evicted });
            }
        }
    }
}

/// Query functions that provide read-only access to the store.
pub mod query {
    use std::collections::VecDeque;

    use super::ParticleStore;
    use circlefall_core::{Particle, ParticleColor, ParticleId};

    /// Captures a read-only view of the particles in store order.
    #[must_use]
    pub fn particle_view(store: &ParticleStore) -> ParticleView<'_> {
        ParticleView {
            particles: &store.particles,
        }
    }

    /// Borrowed, read-only view of the store contents handed to renderers.
    #[derive(Clone, Copy, Debug)]
    pub struct ParticleView<'a> {
        particles: &'a VecDeque<Particle>,
    }

    impl<'a> ParticleView<'a> {
        /// Iterator over the particles, oldest first.
        pub fn iter(&self) -> impl Iterator<Item = ParticleSnapshot> + 'a {
            self.particles.iter().map(ParticleSnapshot::from)
        }

        /// Number of particles in the view.
        #[must_use]
        pub fn len(&self) -> usize {
            self.particles.len()
        }

        /// Reports whether the view is empty.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.particles.is_empty()
        }

        /// Copies the view so it can outlive the borrow of the store.
        #[must_use]
        pub fn to_vec(&self) -> Vec<ParticleSnapshot> {
            self.iter().collect()
        }
    }

    /// Immutable representation of a single particle's presentable state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ParticleSnapshot {
        /// Identifier assigned on admission.
        pub id: ParticleId,
        /// Horizontal position of the centre.
        pub x: f32,
        /// Vertical position of the centre.
        pub y: f32,
        /// Radius of the body.
        pub radius: f32,
        /// Display payload.
        pub color: ParticleColor,
    }

    impl From<&Particle> for ParticleSnapshot {
        fn from(particle: &Particle) -> Self {
            Self {
                id: particle.id(),
                x: particle.x,
                y: particle.y,
                radius: particle.radius(),
                color: particle.color(),
            }
        }
    }
}
