//! Prototype catalog: the factory the pool registry instantiates through.
//!
//! Collaborators register a [`PrototypeDef`] per spawnable kind. The hooks are
//! plain `fn` pointers resolved at compile time; there is no name-based
//! component probing anywhere in the engine. A lookup miss is a wiring bug and
//! fails loudly in development builds (see `pool::acquire`).

use avian2d::prelude::*;
use bevy::ecs::system::EntityCommands;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity of a spawnable kind. Pools and instances are keyed by id
/// equality; definitions are never compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrototypeId(pub u32);

/// Everything the registry needs to build and hand out one kind of instance.
#[derive(Clone, Copy)]
pub struct PrototypeDef {
    /// Display name, used for entity `Name`s and log lines.
    pub name: &'static str,
    /// Assembles the kind-specific bundle on a freshly created instance.
    /// Collision layers are owned by `active_layers`, not by this hook.
    pub build: fn(&mut EntityCommands),
    /// Layers an active instance collides on; `None` for non-colliding kinds.
    /// Inactive instances keep the memberships but collide with nothing.
    pub active_layers: Option<CollisionLayers>,
    /// Re-arm hook run every time an instance is handed out, pooled or fresh.
    pub on_acquire: Option<fn(&mut EntityCommands)>,
}

#[derive(Resource, Default)]
pub struct PrototypeCatalog {
    defs: HashMap<PrototypeId, PrototypeDef>,
}

impl PrototypeCatalog {
    pub fn register(&mut self, id: PrototypeId, def: PrototypeDef) {
        if self.defs.insert(id, def).is_some() {
            warn!("prototype {id:?} registered twice; last registration wins");
        }
    }

    pub fn get(&self, id: PrototypeId) -> Option<&PrototypeDef> {
        self.defs.get(&id)
    }

    pub fn contains(&self, id: PrototypeId) -> bool {
        self.defs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
