//! Pooled instance registry: create, hand out, recycle.
//!
//! Producers (lifetime sweep, contact handler, external requests) only flip
//! `InstanceState` to `PendingReturn`. [`return_to_pool_commit`] is the single
//! writer that re-establishes the inactive invariants and mutates buckets:
//!
//! Invariant: inactive instances must be
//! - hidden
//! - velocity = 0 (when they have one)
//! - collide with nothing (filters empty)
//!
//! Accounting invariant per bucket: `live + free == created` for every
//! engine-created instance, once deferred commands are applied.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use std::collections::VecDeque;

use super::catalog::{PrototypeCatalog, PrototypeDef, PrototypeId};
use super::messages::ReturnRequest;

/// Marker + back-reference carried by every engine-created instance.
/// The back-reference, not the caller's word, decides return routing.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledInstance {
    pub prototype: PrototypeId,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

#[derive(Debug, Default)]
struct PoolBucket {
    free: VecDeque<Entity>,
    live: usize,
    created: usize,
}

/// Point-in-time counters for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub free: usize,
    pub live: usize,
    pub created: usize,
}

/// Per-prototype buckets of inactive instances. Explicitly inserted by the
/// plugin and explicitly torn down; never a process-wide global. Buckets grow
/// without bound and are never evicted while the plugin runs.
#[derive(Resource, Debug)]
pub struct PoolRegistry {
    buckets: HashMap<PrototypeId, PoolBucket>,
    default_warm: usize,
}

impl PoolRegistry {
    pub fn new(default_warm: usize) -> Self {
        Self { buckets: HashMap::default(), default_warm }
    }

    pub fn has_pool(&self, proto: PrototypeId) -> bool {
        self.buckets.contains_key(&proto)
    }

    pub fn pool_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn stats(&self, proto: PrototypeId) -> Option<PoolStats> {
        self.buckets.get(&proto).map(|b| PoolStats {
            free: b.free.len(),
            live: b.live,
            created: b.created,
        })
    }

    /// Drop all bookkeeping. Instances themselves are despawned by [`teardown`].
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    fn release(&mut self, proto: PrototypeId, entity: Entity) {
        let bucket = self.buckets.entry(proto).or_default();
        bucket.free.push_back(entity);
        bucket.live = bucket.live.saturating_sub(1);
    }

    fn discard(&mut self, proto: PrototypeId) {
        if let Some(bucket) = self.buckets.get_mut(&proto) {
            bucket.live = bucket.live.saturating_sub(1);
            bucket.created = bucket.created.saturating_sub(1);
        }
    }
}

fn create_instance(commands: &mut Commands, proto: PrototypeId, def: &PrototypeDef) -> Entity {
    let mut ec = commands.spawn((
        Name::new(def.name),
        PooledInstance { prototype: proto },
        InstanceState::Inactive,
        Transform::default(),
        Visibility::Hidden,
    ));
    (def.build)(&mut ec);
    if let Some(layers) = def.active_layers {
        // Present from birth, but filters stay empty until activation.
        ec.insert((
            CollisionLayers::new(layers.memberships, LayerMask::NONE),
            CollisionEventsEnabled,
        ));
    }
    ec.id()
}

fn activate(commands: &mut Commands, entity: Entity, def: &PrototypeDef, transform: Transform) {
    let mut ec = commands.entity(entity);
    ec.insert((InstanceState::Active, transform, Visibility::Visible));
    if let Some(layers) = def.active_layers {
        ec.insert(layers);
    }
    if let Some(on_acquire) = def.on_acquire {
        on_acquire(&mut ec);
    }
}

/// Pre-warm a bucket. Idempotent: a prototype that already has a bucket is
/// left untouched, whatever size it was warmed with.
pub fn create_pool(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    catalog: &PrototypeCatalog,
    proto: PrototypeId,
    initial_size: usize,
) {
    if registry.buckets.contains_key(&proto) {
        return;
    }
    let Some(def) = catalog.get(proto) else {
        debug_assert!(false, "create_pool for unregistered prototype {proto:?}");
        warn!("create_pool: prototype {proto:?} is not in the catalog; skipping");
        return;
    };
    let mut bucket = PoolBucket::default();
    for _ in 0..initial_size {
        let entity = create_instance(commands, proto, def);
        bucket.free.push_back(entity);
        bucket.created += 1;
    }
    registry.buckets.insert(proto, bucket);
}

/// Hand out an instance: reuse a free one when possible, create otherwise.
/// An empty bucket auto-grows (a capacity fact, not an error). An
/// unseen prototype gets a small warm bucket first (the registry's
/// `default_warm`). Returns `None` only when the catalog cannot build the
/// prototype at all.
pub fn acquire(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    catalog: &PrototypeCatalog,
    proto: PrototypeId,
    transform: Transform,
) -> Option<Entity> {
    let Some(def) = catalog.get(proto) else {
        debug_assert!(false, "acquire for unregistered prototype {proto:?}");
        warn!("acquire: prototype {proto:?} is not in the catalog; skipping spawn");
        return None;
    };
    if !registry.buckets.contains_key(&proto) {
        let warm = registry.default_warm;
        create_pool(commands, registry, catalog, proto, warm);
    }
    let bucket = registry.buckets.get_mut(&proto).expect("bucket exists after create_pool");
    let entity = match bucket.free.pop_front() {
        Some(entity) => entity,
        None => {
            let entity = create_instance(commands, proto, def);
            bucket.created += 1;
            entity
        }
    };
    bucket.live += 1;
    activate(commands, entity, def, transform);
    Some(entity)
}

/// The `use_pool = false` path: always instantiate, never dequeue. The
/// instance still carries its back-reference and is tracked, so a later
/// return folds it into the bucket without leaking.
pub fn spawn_fresh(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    catalog: &PrototypeCatalog,
    proto: PrototypeId,
    transform: Transform,
) -> Option<Entity> {
    let Some(def) = catalog.get(proto) else {
        debug_assert!(false, "spawn_fresh for unregistered prototype {proto:?}");
        warn!("spawn_fresh: prototype {proto:?} is not in the catalog; skipping spawn");
        return None;
    };
    let entity = create_instance(commands, proto, def);
    let bucket = registry.buckets.entry(proto).or_default();
    bucket.created += 1;
    bucket.live += 1;
    activate(commands, entity, def, transform);
    Some(entity)
}

/// Consume external return requests.
///
/// The instance's own back-reference decides routing; a request naming an
/// entity this registry never created is disposed of instead of adopted.
pub fn apply_return_requests(
    mut commands: Commands,
    mut reader: MessageReader<ReturnRequest>,
    mut q: Query<(&PooledInstance, &mut InstanceState)>,
) {
    for req in reader.read() {
        match q.get_mut(req.entity) {
            Ok((instance, mut state)) => {
                if instance.prototype != req.prototype {
                    warn!(
                        "return request names prototype {:?} but the instance belongs to {:?}; using the back-reference",
                        req.prototype, instance.prototype
                    );
                }
                // Already inactive or pending: double return, no-op.
                if *state == InstanceState::Active {
                    *state = InstanceState::PendingReturn;
                }
            }
            Err(_) => {
                if let Ok(mut ec) = commands.get_entity(req.entity) {
                    warn!("return request for non-pooled entity {:?}; disposing of it", req.entity);
                    ec.despawn();
                }
            }
        }
    }
}

/// Commit pending returns: re-establish the inactive invariants and push the
/// instance back onto its bucket, creating the bucket lazily for a
/// first-seen prototype. Instances whose prototype the catalog no longer
/// knows are despawned, never resurrected without an owning pool.
pub fn return_to_pool_commit(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    catalog: Res<PrototypeCatalog>,
    mut q: Query<(
        Entity,
        &PooledInstance,
        &mut InstanceState,
        &mut Visibility,
        Option<&mut LinearVelocity>,
        Option<&mut CollisionLayers>,
    )>,
) {
    for (entity, instance, mut state, mut vis, vel, layers) in &mut q {
        if *state != InstanceState::PendingReturn {
            continue;
        }
        if !catalog.contains(instance.prototype) {
            warn!("returning instance of unknown prototype {:?}; disposing of it", instance.prototype);
            registry.discard(instance.prototype);
            commands.entity(entity).despawn();
            continue;
        }

        *state = InstanceState::Inactive;
        *vis = Visibility::Hidden;
        if let Some(mut vel) = vel {
            vel.0 = Vec2::ZERO;
        }
        if let Some(mut layers) = layers {
            layers.filters = LayerMask::NONE;
        }

        registry.release(instance.prototype, entity);
    }
}

/// Explicit teardown: despawn every pooled instance and clear all buckets.
/// Wired to `OnExit(GameState::InGame)`; also callable directly.
pub fn teardown(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    q: Query<Entity, With<PooledInstance>>,
) {
    for entity in &q {
        commands.entity(entity).despawn();
    }
    registry.clear();
}
