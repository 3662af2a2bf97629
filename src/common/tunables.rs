//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    /// Warm size for a pool bucket created implicitly by an acquire.
    pub default_pool_warm: usize,
    /// Z layer spawned instances are placed on.
    pub instance_z: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self { pixels_per_meter: 20.0, default_pool_warm: 5, instance_z: 1.0 }
    }
}
