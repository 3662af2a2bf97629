//! Declarative spawner configuration.
//!
//! Everything here deserializes from RON, but where the data files live is
//! the caller's business. Invalid values never crash the engine: `sanitize`
//! clamps them to the nearest legal value and logs the correction.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::PrototypeId;

/// Smallest weight an entry can carry; non-positive weights clamp to this.
pub const MIN_WEIGHT: f32 = 1e-4;
/// Minimum gap between annulus radii, keeping the radicand positive.
pub const RADIUS_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum SpawnShape {
    #[default]
    Point,
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Annulus { r_min: f32, r_max: f32 },
}

impl SpawnShape {
    /// Clamp degenerate dimensions in place; returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = *self;
        match self {
            Self::Point => {}
            Self::Rectangle { width, height } => {
                *width = width.max(0.0);
                *height = height.max(0.0);
            }
            Self::Circle { radius } => {
                *radius = radius.max(0.0);
            }
            Self::Annulus { r_min, r_max } => {
                *r_min = r_min.max(0.0);
                *r_max = r_max.max(*r_min + RADIUS_EPSILON);
            }
        }
        *self != before
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub id: String,
    /// `None` means the entry can be picked but never produces an instance.
    #[serde(default)]
    pub prototype: Option<PrototypeId>,
    /// Relative pick probability; clamped to at least [`MIN_WEIGHT`].
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default = "default_min_interval")]
    pub min_interval: f32,
    #[serde(default = "default_max_interval")]
    pub max_interval: f32,
    /// Extra wait added to this entry's first cycle only.
    #[serde(default)]
    pub initial_delay: f32,
    /// Bucket warm size for this entry's prototype.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// World-space offset added to the sampled position.
    #[serde(default)]
    pub spawn_offset: Vec2,
    /// `false` always instantiates a fresh instance instead of reusing one.
    #[serde(default = "default_true")]
    pub use_pool: bool,
    /// Seconds until the instance returns on its own; `None` disables the countdown.
    #[serde(default = "default_lifetime")]
    pub lifetime: Option<f32>,
    /// Return to the pool on the instance's first physics contact.
    #[serde(default = "default_true")]
    pub return_on_contact: bool,
}

impl SpawnEntry {
    pub fn sanitize(&mut self) {
        if self.weight < MIN_WEIGHT {
            warn!("entry '{}': weight {} clamped to {MIN_WEIGHT}", self.id, self.weight);
            self.weight = MIN_WEIGHT;
        }
        if self.min_interval < 0.0 {
            warn!("entry '{}': negative min_interval clamped to 0", self.id);
            self.min_interval = 0.0;
        }
        if self.max_interval < self.min_interval {
            warn!(
                "entry '{}': max_interval {} below min_interval {}; using min_interval",
                self.id, self.max_interval, self.min_interval
            );
            self.max_interval = self.min_interval;
        }
        if self.initial_delay < 0.0 {
            warn!("entry '{}': negative initial_delay clamped to 0", self.id);
            self.initial_delay = 0.0;
        }
        if let Some(lifetime) = self.lifetime
            && lifetime < 0.0
        {
            warn!("entry '{}': negative lifetime clamped to 0", self.id);
            self.lifetime = Some(0.0);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidanceConfig {
    /// Placement draws before the cycle gives up. At least 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    #[serde(default)]
    pub entries: Vec<SpawnEntry>,
    /// One placement shape per spawner, shared by all entries.
    #[serde(default)]
    pub shape: SpawnShape,
    #[serde(default)]
    pub avoidance: Option<AvoidanceConfig>,
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// `false` stops the spawner after its first successful cycle.
    #[serde(default = "default_true")]
    pub loop_forever: bool,
    /// Fixed seed for a reproducible draw sequence; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            shape: SpawnShape::Point,
            avoidance: None,
            auto_start: true,
            loop_forever: true,
            seed: None,
        }
    }
}

impl SpawnerConfig {
    pub fn sanitize(&mut self) {
        if self.shape.sanitize() {
            warn!("spawn shape had degenerate dimensions; clamped to {:?}", self.shape);
        }
        for entry in &mut self.entries {
            entry.sanitize();
        }
        if let Some(avoidance) = &mut self.avoidance
            && avoidance.max_attempts == 0
        {
            warn!("avoidance max_attempts of 0 clamped to 1");
            avoidance.max_attempts = 1;
        }
    }

    /// Parse and sanitize a RON document.
    pub fn from_ron(source: &str) -> Result<Self, SpawnConfigError> {
        let mut config: Self = ron::from_str(source)?;
        config.sanitize();
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum SpawnConfigError {
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

fn default_weight() -> f32 {
    1.0
}
fn default_min_interval() -> f32 {
    1.0
}
fn default_max_interval() -> f32 {
    2.0
}
fn default_pool_size() -> usize {
    8
}
fn default_lifetime() -> Option<f32> {
    Some(5.0)
}
fn default_max_attempts() -> u32 {
    8
}
fn default_true() -> bool {
    true
}
