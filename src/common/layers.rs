use avian2d::prelude::*;

/// Collision layers shared by the arena and the spawn engine.
#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Obstacle,
    Spawned,
}
