#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Chunk cleanup: discards chunks that fell far below the camera.

use ascent_core::{Event, HeightChunk};

/// Default multiple of the generation distance kept below the camera.
pub const DEFAULT_CLEANUP_DISTANCE_FACTOR: f32 = 1.5;

/// Evicts chunks whose upper edge lies below the cleanup threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkCleanupManager {
    factor: f32,
}

impl Default for ChunkCleanupManager {
    fn default() -> Self {
        Self::new(DEFAULT_CLEANUP_DISTANCE_FACTOR)
    }
}

impl ChunkCleanupManager {
    /// Creates a manager keeping `factor * generation_distance` of history.
    ///
    /// Non-finite or negative factors fall back to the default.
    #[must_use]
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() && factor >= 0.0 {
            factor
        } else {
            tracing::warn!(factor, "invalid cleanup factor, using default");
            DEFAULT_CLEANUP_DISTANCE_FACTOR
        };
        Self { factor }
    }

    /// Multiple of the generation distance kept below the camera.
    #[must_use]
    pub const fn factor(&self) -> f32 {
        self.factor
    }

    /// Height below which whole chunks are evicted.
    #[must_use]
    pub fn threshold(&self, camera_y: f32, generation_distance: f32) -> f32 {
        camera_y - self.factor * generation_distance
    }

    /// Removes every chunk that ends below the threshold.
    ///
    /// Survivors keep their order. Returns the number of evicted chunks.
    pub fn cleanup_old_chunks(
        &self,
        chunks: &mut Vec<HeightChunk>,
        camera_y: f32,
        generation_distance: f32,
        out: &mut Vec<Event>,
    ) -> usize {
        let threshold = self.threshold(camera_y, generation_distance);
        let mut evicted = 0;

        for index in (0..chunks.len()).rev() {
            if chunks[index].end_y() >= threshold {
                continue;
            }
            let chunk = chunks.remove(index);
            tracing::debug!(
                chunk = chunk.id().get(),
                end_y = chunk.end_y(),
                threshold,
                "chunk evicted"
            );
            out.push(Event::ChunkEvicted {
                chunk: chunk.id(),
                start_y: chunk.start_y(),
                end_y: chunk.end_y(),
            });
            evicted += 1;
        }

        evicted
    }
}
