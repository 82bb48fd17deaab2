//! Pooled particle system and the per-frame stage pipeline
//!
//! The system owns a fixed-capacity pool of [`Particle`] slots, the ordered
//! list of live slots (oldest first), a free list, named emitters and an
//! ordered list of [`Stage`]s:
//!
//! - [`Updater`]s run particle-major: for each live particle, every updater
//!   of a consecutive run is applied in registration order
//! - [`Pass`]es run once over the whole pool (pairwise collisions, fluid
//!   forces) at their position in the pipeline
//!
//! After every stage has run, particles that were killed or outlived their
//! lifetime are reaped back into the free list. Pool bookkeeping is only
//! touched by `acquire`, `release` and the reap step, so a panicking stage
//! can never leave a slot both free and live.
//!
//! Pool exhaustion policy: at capacity, `acquire` evicts the oldest live
//! particle and reuses its slot.

use std::collections::{BTreeMap, VecDeque};

use rand_pcg::Pcg64;
use tracing::{debug, trace};

use crate::error::{PsimError, Result};
use crate::simulation::emitter::Emitter;
use crate::simulation::physics::kinetic_energy;
use crate::simulation::states::Particle;

/// Recommended per-frame cap on `dt`, applied by drivers after stalls
pub const MAX_DT: f64 = 1.0 / 30.0;

/// Clamp a raw frame delta to `[0, max_dt]`
#[inline]
pub fn clamp_dt(dt: f64, max_dt: f64) -> f64 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max_dt)
}

/// Stream constant for the system RNG
const RNG_STREAM: u128 = 0x0a02_bdbf_7bb3_c0a7;

// =========================================================================================
// Stage traits
// =========================================================================================

/// Read access to every other live particle while one particle is mutated
///
/// Handed to each [`Updater`] call. The particle being updated is not part of
/// `others()`.
pub struct SystemView<'a> {
    before: &'a [Particle],
    after: &'a [Particle],
    pub time: f64, // simulation time at the start of this frame
    pub rng: &'a mut Pcg64,
}

impl<'a> SystemView<'a> {
    pub fn new(before: &'a [Particle], after: &'a [Particle], time: f64, rng: &'a mut Pcg64) -> Self {
        Self {
            before,
            after,
            time,
            rng,
        }
    }

    /// Every other live particle, in slot order
    pub fn others(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.before
            .iter()
            .chain(self.after.iter())
            .filter(|p| p.alive)
    }
}

/// Per-particle behavior, applied to every live particle once per frame
///
/// Implemented for any `FnMut(&mut Particle, f64, &mut SystemView)`, so
/// behaviors compose as a list of closures.
pub trait Updater {
    fn update(&mut self, p: &mut Particle, dt: f64, sys: &mut SystemView<'_>);
}

impl<F> Updater for F
where
    F: FnMut(&mut Particle, f64, &mut SystemView<'_>),
{
    fn update(&mut self, p: &mut Particle, dt: f64, sys: &mut SystemView<'_>) {
        self(p, dt, sys)
    }
}

/// Frame data handed to whole-system passes
pub struct FrameContext<'a> {
    pub dt: f64,
    pub time: f64,
    pub rng: &'a mut Pcg64,
}

/// Whole-system stage run once per frame
///
/// `particles` is the full pool; implementations must skip slots with
/// `alive == false`.
pub trait Pass {
    fn apply(&mut self, particles: &mut [Particle], ctx: &mut FrameContext<'_>);
}

pub enum Stage {
    Each(Box<dyn Updater + Send>),
    Pass(Box<dyn Pass + Send>),
}

// =========================================================================================
// Particle system
// =========================================================================================

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStats {
    pub live: usize,
    pub free: usize,
    pub capacity: usize,
    pub evicted: u64,
    pub kinetic_energy: f64,
    pub time: f64,
    pub frame: u64,
}

pub struct ParticleSystem {
    slots: Vec<Particle>,    // allocated pool slots, grows up to max_particles
    live: VecDeque<usize>,   // live slots, oldest first
    free: Vec<usize>,        // released slots ready for reuse
    max_particles: usize,
    next_id: u64,
    stages: Vec<Stage>,
    emitters: BTreeMap<String, Emitter>,
    rng: Pcg64,
    time: f64,
    frame: u64,
    evicted: u64,
}

impl ParticleSystem {
    /// Create an empty system with room for `max_particles`
    pub fn new(max_particles: usize, seed: u64) -> Result<Self> {
        if max_particles == 0 {
            return Err(PsimError::ZeroCapacity);
        }
        Ok(Self {
            slots: Vec::with_capacity(max_particles),
            live: VecDeque::with_capacity(max_particles),
            free: Vec::new(),
            max_particles,
            next_id: 0,
            stages: Vec::new(),
            emitters: BTreeMap::new(),
            rng: Pcg64::new(seed as u128, RNG_STREAM),
            time: 0.0,
            frame: 0,
            evicted: 0,
        })
    }

    // stages ===============================================================================

    /// Append a per-particle updater
    pub fn add_updater<U>(&mut self, updater: U)
    where
        U: Updater + Send + 'static,
    {
        self.stages.push(Stage::Each(Box::new(updater)));
    }

    /// Append a whole-system pass
    pub fn add_pass<P>(&mut self, pass: P)
    where
        P: Pass + Send + 'static,
    {
        self.stages.push(Stage::Pass(Box::new(pass)));
    }

    pub fn with_updater(mut self, updater: impl Updater + Send + 'static) -> Self {
        self.add_updater(updater);
        self
    }

    pub fn with_pass(mut self, pass: impl Pass + Send + 'static) -> Self {
        self.add_pass(pass);
        self
    }

    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn clear_stages(&mut self) {
        self.stages.clear();
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    // emitters =============================================================================

    pub fn add_emitter(&mut self, name: impl Into<String>, emitter: Emitter) {
        self.emitters.insert(name.into(), emitter);
    }

    pub fn remove_emitter(&mut self, name: &str) -> Option<Emitter> {
        self.emitters.remove(name)
    }

    pub fn emitter_mut(&mut self, name: &str) -> Option<&mut Emitter> {
        self.emitters.get_mut(name)
    }

    /// Spawn a burst of `count` particles from a named emitter
    pub fn emit(&mut self, name: &str, count: usize) -> Result<()> {
        let emitter = self
            .emitters
            .get(name)
            .cloned()
            .ok_or_else(|| PsimError::UnknownEmitter(name.to_string()))?;
        for _ in 0..count {
            self.spawn_from(&emitter);
        }
        Ok(())
    }

    fn spawn_from(&mut self, emitter: &Emitter) {
        let slot = self.acquire().slot;
        emitter.spawn_into(&mut self.slots[slot], &mut self.rng);
    }

    fn run_emitters(&mut self, dt: f64) {
        if self.emitters.is_empty() {
            return;
        }
        let mut due = Vec::new();
        for (name, emitter) in self.emitters.iter_mut() {
            let n = emitter.due(dt);
            if n > 0 {
                due.push((name.clone(), n));
            }
        }
        for (name, n) in due {
            if let Some(emitter) = self.emitters.get(&name).cloned() {
                for _ in 0..n {
                    self.spawn_from(&emitter);
                }
            }
        }
    }

    // pool =================================================================================

    /// Hand out a reset, alive particle
    ///
    /// Reuses a free slot, otherwise grows the pool; at capacity the oldest
    /// live particle is evicted and its slot reused.
    pub fn acquire(&mut self) -> &mut Particle {
        let slot = if let Some(slot) = self.free.pop() {
            slot
        } else if self.slots.len() < self.max_particles {
            let slot = self.slots.len();
            self.slots.push(Particle::new(slot));
            slot
        } else {
            // live is never empty here: every allocated slot is either free or live
            let slot = self.live.pop_front().unwrap_or(0);
            self.evicted += 1;
            debug!(slot, id = self.slots[slot].id, "pool full, evicting oldest particle");
            slot
        };

        let id = self.next_id;
        self.next_id += 1;
        self.live.push_back(slot);

        let p = &mut self.slots[slot];
        p.reset(id);
        p
    }

    /// Kill a particle and return its slot to the pool immediately
    ///
    /// Returns false if the slot is not live.
    pub fn release(&mut self, slot: usize) -> bool {
        let Some(pos) = self.live.iter().position(|&s| s == slot) else {
            return false;
        };
        self.live.remove(pos);
        self.slots[slot].alive = false;
        self.free.push(slot);
        true
    }

    /// Release every live particle
    pub fn clear(&mut self) {
        while let Some(slot) = self.live.pop_front() {
            self.slots[slot].alive = false;
            self.free.push(slot);
        }
    }

    fn reap(&mut self) {
        let Self { live, slots, free, .. } = self;
        let before = live.len();
        live.retain(|&slot| {
            let p = &mut slots[slot];
            if p.alive && !p.expired() {
                return true;
            }
            p.alive = false;
            free.push(slot);
            false
        });
        let reaped = before - live.len();
        if reaped > 0 {
            trace!(reaped, "reaped dead particles");
        }
    }

    // frame ================================================================================

    /// Advance the simulation by `dt` seconds
    ///
    /// Emitters spawn first, then stages run in registration order, then dead
    /// particles are reaped. A particle that is alive when its per-particle
    /// pass starts goes through every updater of that run, even if one of
    /// them kills it.
    pub fn update(&mut self, dt: f64) {
        self.run_emitters(dt);

        let order: Vec<usize> = self.live.iter().copied().collect();
        let Self {
            stages,
            slots,
            rng,
            time,
            ..
        } = self;

        let mut i = 0;
        while i < stages.len() {
            if let Stage::Pass(pass) = &mut stages[i] {
                let mut ctx = FrameContext {
                    dt,
                    time: *time,
                    rng: &mut *rng,
                };
                pass.apply(slots, &mut ctx);
                i += 1;
                continue;
            }

            // fuse the run of consecutive updaters into one particle-major loop
            let mut end = i;
            while end < stages.len() && matches!(stages[end], Stage::Each(_)) {
                end += 1;
            }
            let run = &mut stages[i..end];

            for &slot in &order {
                if !slots[slot].alive {
                    continue;
                }
                let (before, rest) = slots.split_at_mut(slot);
                let Some((p, after)) = rest.split_first_mut() else {
                    continue;
                };
                let mut view = SystemView::new(before, after, *time, &mut *rng);
                for stage in run.iter_mut() {
                    if let Stage::Each(updater) = stage {
                        updater.update(p, dt, &mut view);
                    }
                }
            }
            i = end;
        }

        self.reap();
        self.time += dt;
        self.frame += 1;
    }

    // accessors ============================================================================

    /// Live particles, oldest first
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.live
            .iter()
            .map(move |&slot| &self.slots[slot])
            .filter(|p| p.alive)
    }

    /// Live particles, mutable, in slot order
    pub fn particles_mut(&mut self) -> impl Iterator<Item = &mut Particle> + '_ {
        self.slots.iter_mut().filter(|p| p.alive)
    }

    /// Full pool including dead slots
    pub fn slots(&self) -> &[Particle] {
        &self.slots
    }

    pub fn particle(&self, slot: usize) -> Option<&Particle> {
        self.slots.get(slot).filter(|p| p.alive)
    }

    pub fn particle_mut(&mut self, slot: usize) -> Option<&mut Particle> {
        self.slots.get_mut(slot).filter(|p| p.alive)
    }

    /// Slots currently in the live list, oldest first
    pub fn live_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.live.iter().copied()
    }

    /// Occupied slots, including particles killed since the last reap
    ///
    /// Between a kill and the end of the next `update` this can exceed
    /// `particles().count()`; it always satisfies
    /// `live_count() + free_count() == capacity()`.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Released slots plus never-allocated capacity
    pub fn free_count(&self) -> usize {
        self.free.len() + (self.max_particles - self.slots.len())
    }

    pub fn capacity(&self) -> usize {
        self.max_particles
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn rng(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }

    pub fn stats(&self) -> SystemStats {
        SystemStats {
            live: self.live_count(),
            free: self.free_count(),
            capacity: self.max_particles,
            evicted: self.evicted,
            kinetic_energy: self.particles().map(kinetic_energy).sum(),
            time: self.time,
            frame: self.frame,
        }
    }
}
