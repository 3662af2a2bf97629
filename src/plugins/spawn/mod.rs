//! Spawn engine plugin: pooled instances + procedural spawn scheduling.
//!
//! # Data flow
//! ```text
//!   Update (variable dt)
//! ┌──────────────────────────────────────────────────────────────┐
//! │ (A) tick_spawners: one state machine per Spawner entity      │
//! │     wait → weighted pick → placement (± avoidance)           │
//! │     → pool acquire → attach AutoReturn → Spawned message     │
//! │                                                              │
//! │ (B) auto_return_sweep: expired countdowns → PendingReturn    │
//! │ (C) apply_return_requests: external recycles → PendingReturn │
//! │ (D) return_to_pool_commit: inactive invariants + bucket push │
//! └──────────────────────────────────────────────────────────────┘
//!   FixedPostUpdate (after narrow phase)
//! ┌──────────────────────────────────────────────────────────────┐
//! │ (E) return_on_contact: CollisionStart → PendingReturn        │
//! └──────────────────────────────────────────────────────────────┘
//!
//! Feedback loop:
//!   commit pushes the instance back onto its prototype's bucket
//!   acquire pops it on a later cycle
//! ```
//!
//! Producers only flip `InstanceState`; `return_to_pool_commit` is the single
//! writer that re-establishes the inactive invariants and mutates buckets.
//! Every resource here is inserted by this plugin and torn down on state
//! exit; nothing is ambient global state.

pub mod catalog;
pub mod config;
pub mod lifetime;
pub mod messages;
pub mod placement;
pub mod pool;
pub mod scheduler;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub struct SpawnEnginePlugin;

/// Maintain engine message buffers.
///
/// Messages are double-buffered; `update()` advances buffers.
fn update_engine_messages(
    mut spawned: ResMut<Messages<messages::Spawned>>,
    mut returns: ResMut<Messages<messages::ReturnRequest>>,
) {
    spawned.update();
    returns.update();
}

impl Plugin for SpawnEnginePlugin {
    fn build(&self, app: &mut App) {
        let warm = app.world().resource::<Tunables>().default_pool_warm;
        app.insert_resource(pool::PoolRegistry::new(warm))
            .init_resource::<catalog::PrototypeCatalog>();

        // Message storage for notifications and external return requests.
        app.init_resource::<Messages<messages::Spawned>>();
        app.init_resource::<Messages<messages::ReturnRequest>>();
        app.add_systems(PostUpdate, update_engine_messages);

        // Update-phase pipeline: schedule -> sweep -> requests -> commit
        app.add_systems(
            Update,
            scheduler::tick_spawners.run_if(in_state(GameState::InGame)),
        );
        app.add_systems(
            Update,
            (
                lifetime::auto_return_sweep.after(scheduler::tick_spawners),
                pool::apply_return_requests.after(lifetime::auto_return_sweep),
                pool::return_to_pool_commit.after(pool::apply_return_requests),
            )
                .run_if(in_state(GameState::InGame)),
        );

        // Fixed collision pipeline: contact returns need the narrow phase.
        app.add_systems(
            FixedPostUpdate,
            lifetime::return_on_contact
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );

        app.add_systems(OnExit(GameState::InGame), pool::teardown);
    }
}
