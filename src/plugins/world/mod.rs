//! World plugin: the demo arena the spawn engine runs in.
//!
//! Everything here is a *consumer* of the spawn engine: it registers the demo
//! prototypes, lays out walls and obstacle pillars, supplies the occupancy
//! probe derived from that layout, and drops two spawner entities into the
//! arena.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::spawn::catalog::{PrototypeCatalog, PrototypeDef, PrototypeId};
use crate::plugins::spawn::config::{AvoidanceConfig, SpawnEntry, SpawnShape, SpawnerConfig};
use crate::plugins::spawn::scheduler::{OccupancyProbe, Spawner};

pub const CRYSTAL: PrototypeId = PrototypeId(1);
pub const SLIME: PrototypeId = PrototypeId(2);

const TILE: i32 = 64;
const HALF_W: i32 = TILE * 16;
const HALF_H: i32 = TILE * 9;

/// Obstacle pillars the crystal spawner must keep clear of: (x, y, radius).
const PILLARS: [(f32, f32, f32); 3] = [
    (-320.0, 0.0, 48.0),
    (256.0, 128.0, 40.0),
    (64.0, -192.0, 56.0),
];

/// Clearance kept between a spawn point and a pillar edge.
const PILLAR_CLEARANCE: f32 = 24.0;

pub fn plugin(app: &mut App) {
    app.add_systems(
        OnEnter(GameState::InGame),
        (register_prototypes, spawn_arena, spawn_spawners).chain(),
    );
}

/// A recyclable pickup. `value` is re-armed by the prototype's acquire hook,
/// so a collected-and-recycled crystal is worth full value again.
#[derive(Component, Debug, Clone, Copy)]
pub struct Collectible {
    pub value: u32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Slime;

fn crystal_def() -> PrototypeDef {
    PrototypeDef {
        name: "Crystal",
        build: |ec| {
            ec.insert((
                Collectible { value: 5 },
                Sprite {
                    color: Color::srgb(0.45, 0.85, 0.95),
                    custom_size: Some(Vec2::splat(18.0)),
                    ..default()
                },
                RigidBody::Static,
                Collider::circle(9.0),
            ));
        },
        active_layers: Some(CollisionLayers::new(Layer::Spawned, [Layer::World])),
        on_acquire: Some(|ec| {
            ec.insert(Collectible { value: 5 });
        }),
    }
}

fn slime_def() -> PrototypeDef {
    PrototypeDef {
        name: "Slime",
        build: |ec| {
            ec.insert((
                Slime,
                Sprite {
                    color: Color::srgb(0.35, 0.8, 0.35),
                    custom_size: Some(Vec2::splat(24.0)),
                    ..default()
                },
                RigidBody::Dynamic,
                Collider::circle(12.0),
                LinearVelocity(Vec2::ZERO),
            ));
        },
        active_layers: Some(CollisionLayers::new(
            Layer::Spawned,
            [Layer::World, Layer::Obstacle, Layer::Spawned],
        )),
        on_acquire: None,
    }
}

fn register_prototypes(mut catalog: ResMut<PrototypeCatalog>) {
    catalog.register(CRYSTAL, crystal_def());
    catalog.register(SLIME, slime_def());
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;

    let wall_layers = CollisionLayers::new(Layer::World, [Layer::Spawned]);

    let mut spawn_wall = |name: String, pos: Vec3, size: Vec2| {
        commands.spawn((
            Name::new(name),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    spawn_wall(
        "WallTop".into(),
        Vec3::new(0.0, HALF_H as f32 + thickness * 0.5, 0.0),
        Vec2::new(HALF_W as f32 * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallBottom".into(),
        Vec3::new(0.0, -HALF_H as f32 - thickness * 0.5, 0.0),
        Vec2::new(HALF_W as f32 * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallLeft".into(),
        Vec3::new(-HALF_W as f32 - thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H as f32 * 2.0),
    );
    spawn_wall(
        "WallRight".into(),
        Vec3::new(HALF_W as f32 + thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H as f32 * 2.0),
    );

    let pillar_layers = CollisionLayers::new(Layer::Obstacle, [Layer::Spawned]);
    for (i, (x, y, r)) in PILLARS.into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Pillar{i}")),
            Sprite {
                color: Color::srgb(0.4, 0.36, 0.3),
                custom_size: Some(Vec2::splat(r * 2.0)),
                ..default()
            },
            Transform::from_xyz(x, y, 0.5),
            RigidBody::Static,
            Collider::circle(r),
            pillar_layers,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Occupancy probe derived from the static pillar layout.
fn pillar_occupied(point: Vec2) -> bool {
    PILLARS.iter().any(|&(x, y, r)| {
        let keep_out = r + PILLAR_CLEARANCE;
        point.distance_squared(Vec2::new(x, y)) < keep_out * keep_out
    })
}

fn spawn_spawners(mut commands: Commands) {
    // Crystal field: rectangle area over most of the arena, steering clear
    // of the pillars. Crystals sit still and expire on their own.
    let crystal_config = SpawnerConfig {
        entries: vec![SpawnEntry {
            id: "crystal".into(),
            prototype: Some(CRYSTAL),
            weight: 1.0,
            min_interval: 0.8,
            max_interval: 1.6,
            initial_delay: 0.5,
            pool_size: 12,
            spawn_offset: Vec2::ZERO,
            use_pool: true,
            lifetime: Some(6.0),
            return_on_contact: false,
        }],
        shape: SpawnShape::Rectangle { width: 1400.0, height: 800.0 },
        avoidance: Some(AvoidanceConfig { max_attempts: 8 }),
        ..default()
    };
    commands.spawn((
        Name::new("CrystalSpawner"),
        Spawner::new(crystal_config),
        OccupancyProbe::new(pillar_occupied),
        Transform::from_xyz(0.0, 0.0, 0.0),
        DespawnOnExit(GameState::InGame),
    ));

    // Slime ring: weighted table on an annulus around the arena center.
    // Slimes bounce home on their first contact; the occasional crystal
    // drop shares the table at a quarter of the weight.
    let slime_config = SpawnerConfig {
        entries: vec![
            SpawnEntry {
                id: "slime".into(),
                prototype: Some(SLIME),
                weight: 3.0,
                min_interval: 1.5,
                max_interval: 3.0,
                initial_delay: 0.0,
                pool_size: 8,
                spawn_offset: Vec2::ZERO,
                use_pool: true,
                lifetime: Some(8.0),
                return_on_contact: true,
            },
            SpawnEntry {
                id: "ring-crystal".into(),
                prototype: Some(CRYSTAL),
                weight: 1.0,
                min_interval: 1.5,
                max_interval: 3.0,
                initial_delay: 0.0,
                pool_size: 12,
                spawn_offset: Vec2::ZERO,
                use_pool: true,
                lifetime: Some(6.0),
                return_on_contact: false,
            },
        ],
        shape: SpawnShape::Annulus { r_min: 220.0, r_max: 420.0 },
        ..default()
    };
    commands.spawn((
        Name::new("SlimeSpawner"),
        Spawner::new(slime_config),
        Transform::from_xyz(0.0, 0.0, 0.0),
        DespawnOnExit(GameState::InGame),
    ));
}
