#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Part progression: cycles through the authored Parts and tracks how far
//! the live Part has been generated.
//!
//! Exactly one [`PartGenerationState`] is live at a time. It moves from
//! in-progress to complete when its platform target is met and is replaced
//! when the next Part starts. The catalog is cyclic, so the sequence never
//! terminates.

use std::sync::Arc;

use ascent_core::{stream_rng, Part, PartProgress, SizeMode, RNG_STREAM_PARTS};
use ascent_system_content_scheduling::ContentQueue;
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Policy used to pick the Part that follows the current one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartSelection {
    /// Strict cycling through the catalog in authored order.
    #[default]
    RoundRobin,
    /// Cycling in authored order, skipping Parts whose `min_height` lies above
    /// the start height. Falls back to plain cycling when no Part qualifies.
    HeightGated,
}

/// Runtime progress of the live Part.
#[derive(Clone, Debug, PartialEq)]
pub struct PartGenerationState {
    part: Arc<Part>,
    part_index: usize,
    start_y: f32,
    current_y: f32,
    platforms_generated: u32,
    platforms_needed: u32,
    complete: bool,
    content: ContentQueue,
}

impl PartGenerationState {
    /// Part being generated.
    #[must_use]
    pub fn part(&self) -> &Arc<Part> {
        &self.part
    }

    /// Catalog index of the Part.
    #[must_use]
    pub const fn part_index(&self) -> usize {
        self.part_index
    }

    /// Height at which the Part started.
    #[must_use]
    pub const fn start_y(&self) -> f32 {
        self.start_y
    }

    /// Height of the Part's most recent platform.
    #[must_use]
    pub const fn current_y(&self) -> f32 {
        self.current_y
    }

    /// Platforms realized so far.
    #[must_use]
    pub const fn platforms_generated(&self) -> u32 {
        self.platforms_generated
    }

    /// Platform target fixed when the Part started.
    #[must_use]
    pub const fn platforms_needed(&self) -> u32 {
        self.platforms_needed
    }

    /// Whether the platform target was met.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Platform counters as a progress value.
    #[must_use]
    pub const fn progress(&self) -> PartProgress {
        PartProgress::new(self.platforms_generated, self.platforms_needed)
    }

    /// Content queued for the Part.
    #[must_use]
    pub fn content(&self) -> &ContentQueue {
        &self.content
    }

    /// Mutable access to the Part's content queue.
    pub fn content_mut(&mut self) -> &mut ContentQueue {
        &mut self.content
    }
}

/// Owns progression through the authored Part catalog.
#[derive(Debug)]
pub struct PartManager {
    parts: Vec<Arc<Part>>,
    selection: PartSelection,
    cursor: Option<usize>,
    state: Option<PartGenerationState>,
    rng: ChaCha8Rng,
}

impl PartManager {
    /// Creates a manager over `parts`; no Part is live until one is started.
    #[must_use]
    pub fn new(parts: Vec<Part>, selection: PartSelection, seed: u64) -> Self {
        Self {
            parts: parts.into_iter().map(Arc::new).collect(),
            selection,
            cursor: None,
            state: None,
            rng: stream_rng(seed, RNG_STREAM_PARTS),
        }
    }

    /// Number of Parts in the catalog, valid or not.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Catalog entry at `index`, valid or not.
    #[must_use]
    pub fn part(&self, index: usize) -> Option<&Arc<Part>> {
        self.parts.get(index)
    }

    /// Live Part state, if any.
    #[must_use]
    pub fn state(&self) -> Option<&PartGenerationState> {
        self.state.as_ref()
    }

    /// Mutable access to the live Part state.
    pub fn state_mut(&mut self) -> Option<&mut PartGenerationState> {
        self.state.as_mut()
    }

    /// Starts the first Part of the catalog at height zero.
    pub fn start_first_part(&mut self) -> Option<&PartGenerationState> {
        self.start_at(0, 0.0)
    }

    /// Starts the Part following the current one at `start_y`.
    ///
    /// The catalog index advances even when the selected Part turns out to be
    /// invalid, so a broken entry costs one attempt rather than stalling the
    /// sequence.
    pub fn start_next_part(&mut self, start_y: f32) -> Option<&PartGenerationState> {
        let candidate = self.cursor.map_or(0, |cursor| cursor.wrapping_add(1));
        let index = match self.selection {
            PartSelection::RoundRobin => candidate,
            PartSelection::HeightGated => self.height_gated_index(candidate, start_y),
        };
        self.start_at(index, start_y)
    }

    /// Records a realized platform for the live Part.
    ///
    /// Returns `true` when this platform completed the Part.
    pub fn on_platform_generated(&mut self, position: Vec2) -> bool {
        let Some(state) = self.state.as_mut() else {
            tracing::warn!("platform reported without a live part");
            return false;
        };

        if state.complete {
            tracing::warn!(part = %state.part.name, "platform reported after part completion");
            return false;
        }

        state.platforms_generated += 1;
        state.current_y = position.y;
        if state.platforms_generated >= state.platforms_needed {
            state.complete = true;
            tracing::debug!(
                part = %state.part.name,
                platforms = state.platforms_generated,
                end_y = state.current_y,
                "part complete"
            );
            return true;
        }
        false
    }

    /// Whether a new Part must be started before more platforms are generated.
    #[must_use]
    pub fn needs_new_part(&self) -> bool {
        self.state.as_ref().map_or(true, |state| state.complete)
    }

    /// Whether the live Part still needs platforms.
    #[must_use]
    pub fn needs_more_platforms(&self) -> bool {
        self.state.as_ref().map_or(false, |state| {
            !state.complete && state.platforms_generated < state.platforms_needed
        })
    }

    fn start_at(&mut self, index: usize, start_y: f32) -> Option<&PartGenerationState> {
        if self.parts.is_empty() {
            tracing::error!("cannot start a part: catalog is empty");
            self.state = None;
            return None;
        }

        let index = index % self.parts.len();
        self.cursor = Some(index);

        if let Some(previous) = &self.state {
            if !previous.content.is_drained() {
                tracing::warn!(part = %previous.part.name, "replacing part with undrained content");
            }
        }

        let part = Arc::clone(&self.parts[index]);
        if let Err(error) = part.validate() {
            tracing::warn!(%error, index, "selected part is invalid");
            self.state = None;
            return None;
        }

        let platforms_needed = platforms_needed(&part, &mut self.rng);
        let content = ContentQueue::for_part(&part, &mut self.rng);
        tracing::debug!(
            part = %part.name,
            index,
            start_y,
            platforms_needed,
            queued = content.total(),
            "part started"
        );

        self.state = Some(PartGenerationState {
            part,
            part_index: index,
            start_y,
            current_y: start_y,
            platforms_generated: 0,
            platforms_needed,
            complete: false,
            content,
        });
        self.state.as_ref()
    }

    fn height_gated_index(&self, candidate: usize, start_y: f32) -> usize {
        let count = self.parts.len();
        if count == 0 {
            return candidate;
        }

        (0..count)
            .map(|offset| candidate.wrapping_add(offset) % count)
            .find(|index| self.parts[*index].min_height <= start_y)
            .unwrap_or(candidate)
    }
}

fn platforms_needed<R: Rng + ?Sized>(part: &Part, rng: &mut R) -> u32 {
    match part.size_mode {
        SizeMode::Count => {
            let jitter: i64 = rng.gen_range(-1..=1);
            let needed = (i64::from(part.platform_count) + jitter).max(1);
            u32::try_from(needed).unwrap_or(u32::MAX)
        }
        SizeMode::Length => {
            let average = part.spacing.average();
            if average <= 0.0 || !part.length.is_finite() {
                return 1;
            }
            ((part.length / average).ceil() as u32).max(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascent_core::{PlatformVariant, SpacingRange};
    use rand::SeedableRng;

    #[test]
    fn count_mode_jitters_by_at_most_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let part = Part {
            platform_count: 6,
            ..Part::default()
        };
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let _ = seen.insert(platforms_needed(&part, &mut rng));
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[test]
    fn count_mode_never_drops_below_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let part = Part {
            platform_count: 0,
            ..Part::default()
        };
        for _ in 0..50 {
            assert!(platforms_needed(&part, &mut rng) >= 1);
        }
    }

    #[test]
    fn count_mode_saturates_at_the_largest_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let part = Part {
            platform_count: u32::MAX,
            ..Part::default()
        };
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let _ = seen.insert(platforms_needed(&part, &mut rng));
        }
        assert_eq!(
            seen.into_iter().collect::<Vec<_>>(),
            vec![u32::MAX - 1, u32::MAX]
        );
    }

    #[test]
    fn length_mode_covers_the_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let part = Part {
            size_mode: SizeMode::Length,
            length: 10.0,
            spacing: SpacingRange::new(2.0, 4.0),
            platform_variants: vec![PlatformVariant::new("ledge", 1.0)],
            ..Part::default()
        };
        assert_eq!(platforms_needed(&part, &mut rng), 4);
    }
}
