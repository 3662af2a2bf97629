//! Spawn scheduling: weighted entry selection on a timed state machine.
//!
//! Each [`Spawner`] entity carries its own explicit `Idle -> Warming ->
//! Running -> Stopped` machine; one central system advances all of them every
//! frame. Suspension between cycles is a `Timer`, never a blocked thread, so
//! any number of spawners share the frame clock and one pool registry.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use crate::common::tunables::Tunables;

use super::catalog::PrototypeCatalog;
use super::config::{MIN_WEIGHT, SpawnerConfig};
use super::lifetime::AutoReturn;
use super::messages::Spawned;
use super::placement;
use super::pool::{self, PoolRegistry};

/// Externally supplied "is this point blocked" capability, consulted by
/// rejection sampling when the spawner's config enables avoidance.
#[derive(Component)]
pub struct OccupancyProbe(Box<dyn Fn(Vec2) -> bool + Send + Sync>);

impl OccupancyProbe {
    pub fn new(probe: impl Fn(Vec2) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(probe))
    }

    pub fn is_occupied(&self, point: Vec2) -> bool {
        (self.0)(point)
    }
}

/// Externally supplied "has this spawner been seen yet" capability.
///
/// Polled every tick until it first reports true, then latched for good:
/// losing visibility later never pauses the spawner again.
#[derive(Component)]
pub struct VisibilityGate {
    probe: Box<dyn Fn() -> bool + Send + Sync>,
    latched: bool,
}

impl VisibilityGate {
    pub fn new(probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self { probe: Box::new(probe), latched: false }
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    fn poll(&mut self) -> bool {
        if !self.latched && (self.probe)() {
            self.latched = true;
        }
        self.latched
    }
}

/// Public view of a spawner's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerPhase {
    Idle,
    Warming,
    Running,
    Stopped,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Warming,
    Running { entry: usize, wait: Timer },
    Stopped,
}

#[derive(Component)]
pub struct Spawner {
    config: SpawnerConfig,
    rng: ChaCha8Rng,
    phase: Phase,
    /// Which entries have had their one-shot initial delay spent.
    delayed_once: Vec<bool>,
    warmed: bool,
}

impl Spawner {
    pub fn new(mut config: SpawnerConfig) -> Self {
        config.sanitize();
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let delayed_once = vec![false; config.entries.len()];
        let phase = if config.auto_start { Phase::Warming } else { Phase::Idle };
        Self { config, rng, phase, delayed_once, warmed: false }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn phase(&self) -> SpawnerPhase {
        match self.phase {
            Phase::Idle => SpawnerPhase::Idle,
            Phase::Warming => SpawnerPhase::Warming,
            Phase::Running { .. } => SpawnerPhase::Running,
            Phase::Stopped => SpawnerPhase::Stopped,
        }
    }

    /// Begin (or restart) spawning. Idempotent: any in-flight cycle is
    /// dropped and a fresh one starts from pool warming, so a restart can
    /// never leave an orphaned cycle behind.
    pub fn start(&mut self) {
        self.phase = Phase::Warming;
    }

    /// Cancel the pending wait. Already-spawned instances keep their own
    /// lifecycle.
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    /// Weighted pick over the ordered entry list: draw in `[0, total)`, walk
    /// the list accumulating clamped weights, first entry whose cumulative
    /// weight reaches the draw wins. Ties break by list order.
    pub(crate) fn pick_entry(&mut self) -> Option<usize> {
        if self.config.entries.is_empty() {
            return None;
        }
        let total: f32 = self.config.entries.iter().map(|e| e.weight.max(MIN_WEIGHT)).sum();
        let draw = self.rng.random_range(0.0..total);
        let mut acc = 0.0;
        for (i, entry) in self.config.entries.iter().enumerate() {
            acc += entry.weight.max(MIN_WEIGHT);
            if acc >= draw {
                return Some(i);
            }
        }
        Some(self.config.entries.len() - 1)
    }

    /// Arm the wait for one cycle of `entry`, spending the entry's initial
    /// delay if this is its first selection.
    pub(crate) fn begin_cycle(&mut self, entry: usize) {
        let e = &self.config.entries[entry];
        let mut wait = if e.max_interval > e.min_interval {
            self.rng.random_range(e.min_interval..e.max_interval)
        } else {
            e.min_interval
        };
        if !self.delayed_once[entry] {
            self.delayed_once[entry] = true;
            wait += e.initial_delay;
        }
        self.phase = Phase::Running { entry, wait: Timer::from_seconds(wait, TimerMode::Once) };
    }

    /// Tick the pending wait; returns the entry whose cycle fires this frame.
    fn advance_wait(&mut self, delta: Duration) -> Option<usize> {
        let Phase::Running { entry, wait } = &mut self.phase else {
            return None;
        };
        wait.tick(delta);
        wait.is_finished().then_some(*entry)
    }
}

/// Pre-create every configured pool. Order-independent: `create_pool` is
/// idempotent, so entries sharing a prototype warm once.
fn warm_pools(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    catalog: &PrototypeCatalog,
    config: &SpawnerConfig,
) {
    for entry in &config.entries {
        let Some(proto) = entry.prototype else { continue };
        if entry.use_pool {
            pool::create_pool(commands, registry, catalog, proto, entry.pool_size);
        }
    }
}

/// Central sweep advancing every spawner's state machine one frame.
pub fn tick_spawners(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    catalog: Res<PrototypeCatalog>,
    mut spawned: MessageWriter<Spawned>,
    mut q: Query<(
        Entity,
        &Transform,
        &mut Spawner,
        Option<&mut VisibilityGate>,
        Option<&OccupancyProbe>,
    )>,
) {
    for (spawner_entity, transform, mut spawner, gate, probe) in &mut q {
        match spawner.phase() {
            SpawnerPhase::Idle | SpawnerPhase::Stopped => {}
            SpawnerPhase::Warming => {
                if !spawner.warmed {
                    warm_pools(&mut commands, &mut registry, &catalog, &spawner.config);
                    spawner.warmed = true;
                }
                if let Some(mut gate) = gate
                    && !gate.poll()
                {
                    continue;
                }
                match spawner.pick_entry() {
                    Some(entry) => spawner.begin_cycle(entry),
                    None => {
                        debug!("spawner {spawner_entity:?} has no entries; stopping");
                        spawner.stop();
                    }
                }
            }
            SpawnerPhase::Running => {
                let Some(entry) = spawner.advance_wait(time.delta()) else {
                    continue;
                };
                spawn_one(
                    &mut commands,
                    &mut registry,
                    &catalog,
                    &tunables,
                    &mut spawned,
                    spawner_entity,
                    transform,
                    &mut spawner,
                    entry,
                    probe,
                );
                if spawner.config.loop_forever {
                    match spawner.pick_entry() {
                        Some(next) => spawner.begin_cycle(next),
                        None => spawner.stop(),
                    }
                } else {
                    spawner.stop();
                }
            }
        }
    }
}

/// One spawn cycle: placement, acquisition, lifecycle attach, notification.
/// A missing prototype or exhausted placement skips the cycle; the caller
/// schedules the next one either way.
fn spawn_one(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    catalog: &PrototypeCatalog,
    tunables: &Tunables,
    spawned: &mut MessageWriter<Spawned>,
    spawner_entity: Entity,
    spawner_tf: &Transform,
    spawner: &mut Spawner,
    entry_idx: usize,
    probe: Option<&OccupancyProbe>,
) {
    let entry = spawner.config.entries[entry_idx].clone();
    let Some(proto) = entry.prototype else {
        debug!("entry '{}' has no prototype; skipping this cycle", entry.id);
        return;
    };

    let shape = spawner.config.shape;
    let position = match (spawner.config.avoidance, probe) {
        (Some(avoidance), Some(probe)) => placement::sample_clear(
            shape,
            spawner_tf,
            entry.spawn_offset,
            avoidance.max_attempts,
            |p| probe.is_occupied(p),
            &mut spawner.rng,
        ),
        _ => Some(placement::compute_position(
            shape,
            spawner_tf,
            entry.spawn_offset,
            &mut spawner.rng,
        )),
    };
    let Some(position) = position else {
        debug!("entry '{}': every placement attempt was occupied; skipping this cycle", entry.id);
        return;
    };

    let transform = Transform::from_translation(position.extend(tunables.instance_z));
    let acquired = if entry.use_pool {
        pool::acquire(commands, registry, catalog, proto, transform)
    } else {
        pool::spawn_fresh(commands, registry, catalog, proto, transform)
    };
    let Some(entity) = acquired else { return };

    commands.entity(entity).insert(AutoReturn::from_entry(&entry));
    spawned.write(Spawned {
        entity,
        prototype: proto,
        position,
        rotation: 0.0,
        spawner: spawner_entity,
    });
}
