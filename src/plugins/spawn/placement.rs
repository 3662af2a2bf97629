//! Pure geometric placement sampling.
//!
//! All shapes sample uniformly *per unit area*. For the disk and annulus that
//! requires the square-root correction: radii drawn linearly would pile up
//! samples near the center.

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

use super::config::{RADIUS_EPSILON, SpawnShape};

/// Draw a point in the shape's local frame, centered on the origin.
pub fn sample_local(shape: SpawnShape, rng: &mut impl Rng) -> Vec2 {
    match shape {
        SpawnShape::Point => Vec2::ZERO,
        SpawnShape::Rectangle { width, height } => Vec2::new(
            (rng.random::<f32>() - 0.5) * width,
            (rng.random::<f32>() - 0.5) * height,
        ),
        SpawnShape::Circle { radius } => {
            let angle = rng.random::<f32>() * TAU;
            let r = rng.random::<f32>().sqrt() * radius;
            Vec2::new(angle.cos(), angle.sin()) * r
        }
        SpawnShape::Annulus { r_min, r_max } => {
            let angle = rng.random::<f32>() * TAU;
            // Guard the radicand even if the config slipped through unsanitized.
            let r_max = r_max.max(r_min + RADIUS_EPSILON);
            let r = (rng.random::<f32>() * (r_max * r_max - r_min * r_min) + r_min * r_min).sqrt();
            Vec2::new(angle.cos(), angle.sin()) * r
        }
    }
}

/// Map a local sample into world space through the spawner's transform, then
/// apply the entry's world-space offset.
pub fn compute_position(
    shape: SpawnShape,
    spawner: &Transform,
    offset: Vec2,
    rng: &mut impl Rng,
) -> Vec2 {
    let local = sample_local(shape, rng);
    spawner.transform_point(local.extend(0.0)).truncate() + offset
}

/// Rejection sampling against an occupancy predicate.
///
/// Up to `max_attempts` independent draws; the first unoccupied candidate is
/// accepted. `None` means the caller gets no placement this cycle: a skip,
/// not an error.
pub fn sample_clear(
    shape: SpawnShape,
    spawner: &Transform,
    offset: Vec2,
    max_attempts: u32,
    mut occupied: impl FnMut(Vec2) -> bool,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    for _ in 0..max_attempts {
        let candidate = compute_position(shape, spawner, offset, rng);
        if !occupied(candidate) {
            return Some(candidate);
        }
    }
    None
}
