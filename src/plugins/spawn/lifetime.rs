//! Auto-return lifecycle: countdown and contact-driven recycling.
//!
//! Policy lives in one plain value component swept by a central system; there
//! is no per-instance dispatch. Both paths only flip `Active ->
//! PendingReturn`, so firing twice (or racing an external return) is
//! harmless.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use super::config::SpawnEntry;
use super::pool::{InstanceState, PooledInstance};

/// Per-instance lifecycle policy, attached at acquisition.
#[derive(Component, Debug)]
pub struct AutoReturn {
    /// Countdown until the instance returns on its own; `None` disables it.
    pub lifetime: Option<Timer>,
    /// Return on the instance's first physics contact.
    pub return_on_contact: bool,
}

impl AutoReturn {
    pub fn from_entry(entry: &SpawnEntry) -> Self {
        Self {
            lifetime: entry
                .lifetime
                .map(|secs| Timer::from_seconds(secs, TimerMode::Once)),
            return_on_contact: entry.return_on_contact,
        }
    }
}

/// Tick every countdown; expired instances are marked for return.
pub fn auto_return_sweep(
    time: Res<Time>,
    mut q: Query<(&mut AutoReturn, &mut InstanceState), With<PooledInstance>>,
) {
    for (mut auto, mut state) in &mut q {
        if *state != InstanceState::Active {
            continue;
        }
        let Some(timer) = auto.lifetime.as_mut() else {
            continue;
        };
        timer.tick(time.delta());
        if timer.is_finished() {
            *state = InstanceState::PendingReturn;
        }
    }
}

/// First contact sends a contact-returning instance home.
pub fn return_on_contact(
    mut started: MessageReader<CollisionStart>,
    mut q: Query<(&AutoReturn, &mut InstanceState), With<PooledInstance>>,
) {
    for ev in started.read() {
        for collider in [ev.collider1, ev.collider2] {
            let Ok((auto, mut state)) = q.get_mut(collider) else {
                continue;
            };
            if auto.return_on_contact && *state == InstanceState::Active {
                *state = InstanceState::PendingReturn;
            }
        }
    }
}
