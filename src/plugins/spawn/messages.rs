//! Engine boundary messages.
//!
//! Producers create *intent*; consumer systems apply it. Collaborators never
//! touch the pool resource directly.

use bevy::prelude::*;

use super::catalog::PrototypeId;

/// Notification: an instance was placed this frame.
#[derive(Message, Clone, Copy, Debug)]
pub struct Spawned {
    pub entity: Entity,
    pub prototype: PrototypeId,
    pub position: Vec2,
    pub rotation: f32,
    pub spawner: Entity,
}

/// Ask the engine to recycle an instance ahead of its own lifecycle.
/// Any collaborator (a collision handler, a pickup system) may write this.
#[derive(Message, Clone, Copy, Debug)]
pub struct ReturnRequest {
    pub prototype: PrototypeId,
    pub entity: Entity,
}
