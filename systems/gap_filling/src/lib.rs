#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gap filling: inserts bridging platforms wherever two consecutive platforms
//! are further apart than a player can jump.
//!
//! A gap of length `d` receives `n = ceil(d / jump)` evenly interpolated
//! platforms, where `jump` is the effective maximum jump (maximum jump minus
//! the safety margin). Each segment is then `d / (n + 1)`, strictly shorter
//! than `jump`, and the jitter applied to the inserted platforms is capped so
//! that no jittered segment can exceed `jump` either. Vertical jitter is also
//! capped below half a segment's rise, so inserted platforms keep their order.

use std::f32::consts::SQRT_2;

use ascent_core::{
    stream_rng, Part, PlatformSpawner, PrefabSink, SpawnBoundaries, RNG_STREAM_GAP_FILL,
};
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tuning for [`PlatformGapFiller`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillConfig {
    /// Longest distance a player can cover between two platforms.
    pub max_jump_distance: f32,
    /// Margin subtracted from the maximum jump before testing gaps.
    pub jump_safety_margin: f32,
    /// Gaps shorter than this are never filled.
    pub minimum_gap_to_fill: f32,
    /// Largest horizontal offset applied to an inserted platform.
    pub horizontal_jitter: f32,
    /// Largest vertical offset applied to an inserted platform.
    pub vertical_jitter: f32,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            max_jump_distance: 4.0,
            jump_safety_margin: 0.5,
            minimum_gap_to_fill: 2.0,
            horizontal_jitter: 1.0,
            vertical_jitter: 0.25,
        }
    }
}

impl GapFillConfig {
    /// Maximum jump once the safety margin is taken off.
    #[must_use]
    pub fn effective_max_jump(&self) -> f32 {
        self.max_jump_distance - self.jump_safety_margin
    }
}

/// Post-processor that bridges unreachable gaps in a run of platforms.
#[derive(Debug)]
pub struct PlatformGapFiller {
    config: GapFillConfig,
    rng: ChaCha8Rng,
}

impl PlatformGapFiller {
    /// Creates a filler drawing jitter from the gap-fill stream of `seed`.
    #[must_use]
    pub fn new(config: GapFillConfig, seed: u64) -> Self {
        Self {
            config,
            rng: stream_rng(seed, RNG_STREAM_GAP_FILL),
        }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> GapFillConfig {
        self.config
    }

    /// Sorts `platforms` by height and bridges every gap that is too long.
    ///
    /// Inserted platforms are realized through `spawner` using variants of
    /// `part` and merged into `platforms`, which stays in ascending order.
    /// Returns the positions of the inserted platforms.
    pub fn fill_gaps_in_part<S>(
        &mut self,
        platforms: &mut Vec<Vec2>,
        part: &Part,
        spawner: &mut S,
        sink: &mut dyn PrefabSink,
    ) -> Vec<Vec2>
    where
        S: PlatformSpawner + ?Sized,
    {
        platforms.sort_by(|a, b| a.y.total_cmp(&b.y));

        let jump = self.config.effective_max_jump();
        if !jump.is_finite() || jump <= 0.0 {
            tracing::warn!(jump, "effective jump is not positive, gap filling skipped");
            return Vec::new();
        }

        let boundaries = spawner.spawn_boundaries();
        let mut inserted = Vec::new();
        let mut remaining = std::mem::take(platforms).into_iter();
        let Some(mut previous) = remaining.next() else {
            return inserted;
        };
        platforms.push(previous);

        for next in remaining {
            let distance = previous.distance(next);
            if distance > jump && distance > self.config.minimum_gap_to_fill {
                let bridge = self.bridge(previous, next, jump, boundaries);
                for target in bridge {
                    match spawner.spawn_platform_near(target, part, sink) {
                        Some(position) => {
                            platforms.push(position);
                            inserted.push(position);
                        }
                        None => tracing::warn!(part = %part.name, "bridging platform not spawned"),
                    }
                }
            }
            platforms.push(next);
            previous = next;
        }

        if !inserted.is_empty() {
            tracing::debug!(part = %part.name, inserted = inserted.len(), "gaps filled");
        }
        inserted
    }

    fn bridge(
        &mut self,
        from: Vec2,
        to: Vec2,
        jump: f32,
        boundaries: SpawnBoundaries,
    ) -> Vec<Vec2> {
        let distance = from.distance(to);
        let count = (distance / jump).ceil() as u32;
        let slots = count as f32 + 1.0;
        let segment = distance / slots;
        let radius = ((jump - segment) * 0.5).max(0.0) / SQRT_2;
        let rise = (to.y - from.y).abs() / slots;

        let horizontal = self.config.horizontal_jitter.max(0.0).min(radius);
        let vertical = self
            .config
            .vertical_jitter
            .max(0.0)
            .min(radius)
            .min(rise * 0.45);

        (1..=count)
            .map(|slot| {
                let base = from.lerp(to, slot as f32 / slots);
                let x = base.x + jitter(&mut self.rng, horizontal);
                let y = base.y + jitter(&mut self.rng, vertical);
                Vec2::new(boundaries.clamp_x(x), y)
            })
            .collect()
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    rng.gen_range(-magnitude..=magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn effective_jump_subtracts_margin() {
        assert_eq!(GapFillConfig::default().effective_max_jump(), 3.5);
    }

    #[test]
    fn jitter_stays_within_magnitude() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(jitter(&mut rng, 0.0), 0.0);
        for _ in 0..100 {
            assert!(jitter(&mut rng, 0.3).abs() <= 0.3);
        }
    }
}
