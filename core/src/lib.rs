#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ascent level generator.
//!
//! This crate defines the authored catalog data ([`Part`] and
//! [`ContentSpawnRule`]), the runtime records produced while streaming the
//! course ([`HeightChunk`], [`ContentPlacement`]), and the narrow traits the
//! generator uses to reach into its host ([`PlatformSpawner`],
//! [`PrefabSink`], [`BoundaryProvider`], [`CameraHeight`]). Systems never
//! talk to a game engine directly: they compute positions, hand
//! [`SpawnRequest`] values to the host, and report what they did through
//! [`Event`] values.

mod catalog;
mod chunk;
mod seed;

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use catalog::{
    validate_catalog, CatalogError, ChainRule, ChainSpacing, ContentCategory, ContentSpawnRule,
    CountRange, FlipMode, Part, PlatformVariant, Positioning, PrefabVariant, SizeMode,
    SpacingRange,
};
pub use chunk::{ChunkId, HeightChunk};
pub use seed::{
    derive_labeled_seed, stream_rng, RNG_STREAM_CONTENT, RNG_STREAM_GAP_FILL, RNG_STREAM_PARTS,
    RNG_STREAM_PLATFORMS, RNG_STREAM_SPACING,
};

/// Vertical clearance placed between a platform and content released above it.
pub const CONTENT_CLEARANCE: f32 = 1.0;

/// Identifier of an authored prefab-like payload the host knows how to materialize.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(String);

impl PrefabId {
    /// Creates a new prefab identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reports whether the identifier is blank and therefore cannot be materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrefabId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Horizontal world-space interval in which objects may be spawned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnBoundaries {
    left: f32,
    right: f32,
}

impl SpawnBoundaries {
    /// Creates boundaries from two edges, ordering them if necessary.
    #[must_use]
    pub fn new(left: f32, right: f32) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
        }
    }

    /// Left edge of the spawnable interval.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.left
    }

    /// Right edge of the spawnable interval.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.right
    }

    /// Distance between both edges.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Midpoint between both edges.
    #[must_use]
    pub fn center(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Clamps a horizontal coordinate into the interval.
    #[must_use]
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.left, self.right)
    }

    /// Shrinks the interval by `margin` on both sides.
    ///
    /// Collapses to the centre when the interval is narrower than twice the margin.
    #[must_use]
    pub fn inset(&self, margin: f32) -> Self {
        let margin = margin.max(0.0);
        if self.width() <= margin * 2.0 {
            let center = self.center();
            return Self {
                left: center,
                right: center,
            };
        }

        Self {
            left: self.left + margin,
            right: self.right - margin,
        }
    }

    /// Draws a uniformly distributed horizontal coordinate inside the interval.
    pub fn sample_x<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.width() <= f32::EPSILON {
            return self.left;
        }
        rng.gen_range(self.left..self.right)
    }
}

/// Completion ratio of the Part currently being generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartProgress {
    generated: u32,
    needed: u32,
}

impl PartProgress {
    /// Captures the platform counters of a Part.
    #[must_use]
    pub const fn new(generated: u32, needed: u32) -> Self {
        Self { generated, needed }
    }

    /// Platforms realized so far for the Part.
    #[must_use]
    pub const fn generated(&self) -> u32 {
        self.generated
    }

    /// Platforms the Part requires before it completes.
    #[must_use]
    pub const fn needed(&self) -> u32 {
        self.needed
    }

    /// Fraction of the Part completed, in `0.0..=1.0`.
    ///
    /// A Part that needs no platforms is considered complete.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.needed == 0 {
            return 1.0;
        }
        (self.generated as f32 / self.needed as f32).clamp(0.0, 1.0)
    }
}

/// Broad classification of an object the generator asks the host to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnKind {
    /// A platform realized for the current Part.
    Platform,
    /// Auxiliary content released from a content rule.
    Content(ContentCategory),
}

/// Borrowed description of a single object to materialize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest<'a> {
    /// Kind of object being requested.
    pub kind: SpawnKind,
    /// Payload the host should materialize.
    pub prefab: &'a PrefabId,
    /// World-space position of the object.
    pub position: Vec2,
    /// Whether the object is mirrored horizontally.
    pub flip_x: bool,
}

/// Owned copy of a [`SpawnRequest`], useful for headless hosts and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRecord {
    /// Kind of object that was requested.
    pub kind: SpawnKind,
    /// Payload that was requested.
    pub prefab: PrefabId,
    /// World-space position of the object.
    pub position: Vec2,
    /// Whether the object is mirrored horizontally.
    pub flip_x: bool,
}

impl From<&SpawnRequest<'_>> for SpawnRecord {
    fn from(request: &SpawnRequest<'_>) -> Self {
        Self {
            kind: request.kind,
            prefab: request.prefab.clone(),
            position: request.position,
            flip_x: request.flip_x,
        }
    }
}

/// Host hook that materializes a payload at a world position.
pub trait PrefabSink {
    /// Creates the requested object inside the host world.
    fn instantiate(&mut self, request: &SpawnRequest<'_>);
}

impl PrefabSink for Vec<SpawnRecord> {
    fn instantiate(&mut self, request: &SpawnRequest<'_>) {
        self.push(SpawnRecord::from(request));
    }
}

/// Host query that reports the camera- and wall-aware horizontal spawn range.
pub trait BoundaryProvider {
    /// Current spawn boundaries.
    fn spawn_boundaries(&self) -> SpawnBoundaries;
}

impl BoundaryProvider for SpawnBoundaries {
    fn spawn_boundaries(&self) -> SpawnBoundaries {
        *self
    }
}

/// Host query that reports the current camera height.
pub trait CameraHeight {
    /// World-space height of the camera.
    fn camera_height(&self) -> f32;
}

impl<F> CameraHeight for F
where
    F: Fn() -> f32,
{
    fn camera_height(&self) -> f32 {
        self()
    }
}

/// Collaborator that realizes platforms for the generator.
pub trait PlatformSpawner {
    /// Horizontal bounds platforms and content must stay within.
    fn spawn_boundaries(&self) -> SpawnBoundaries;

    /// Selects a platform variant of `part` and realizes it at height `y`.
    ///
    /// Returns the realized position, or `None` when the Part offers no
    /// usable variant.
    fn spawn_platform_at(
        &mut self,
        y: f32,
        part: &Part,
        sink: &mut dyn PrefabSink,
    ) -> Option<Vec2>;

    /// Realizes a platform of `part` as close as possible to `position`.
    fn spawn_platform_near(
        &mut self,
        position: Vec2,
        part: &Part,
        sink: &mut dyn PrefabSink,
    ) -> Option<Vec2>;
}

/// Record of one content release, either a single object or a whole chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentPlacement {
    /// Category of the released content.
    pub category: ContentCategory,
    /// Payload that was materialized.
    pub prefab: PrefabId,
    /// Positions of every materialized instance.
    pub positions: Vec<Vec2>,
    /// Flip decision shared by every instance.
    pub flip_x: bool,
    /// Whether the release was a chain.
    pub chained: bool,
    /// Whether the release came from a pre-part rule.
    pub before_part: bool,
}

impl fmt::Display for ContentPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let height = self.positions.first().map_or(0.0, |position| position.y);
        write!(
            f,
            "{} `{}` x{} at y={height:.2}",
            self.category,
            self.prefab,
            self.positions.len()
        )?;
        if self.chained {
            f.write_str(" chain")?;
        }
        if self.flip_x {
            f.write_str(" flipped")?;
        }
        if self.before_part {
            f.write_str(" (pre-part)")?;
        }
        Ok(())
    }
}

/// Safety limit that cut a chunk short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationCap {
    /// The chunk reached its maximum platform count.
    Platforms,
    /// The chunk reached its maximum number of generation loop iterations.
    Loops,
}

/// Events emitted by the generator while streaming the course.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A Part became the active Part.
    PartStarted {
        /// Catalog index of the Part.
        part_index: usize,
        /// Authored name of the Part.
        name: String,
        /// Height at which the Part begins.
        start_y: f32,
        /// Platforms the Part will generate.
        platforms_needed: u32,
    },
    /// The active Part reached its platform target.
    PartCompleted {
        /// Catalog index of the Part.
        part_index: usize,
        /// Authored name of the Part.
        name: String,
        /// Height of the Part's last platform.
        end_y: f32,
    },
    /// A platform was realized for the active Part.
    PlatformSpawned {
        /// Chunk that owns the platform.
        chunk: ChunkId,
        /// Realized platform position.
        position: Vec2,
    },
    /// A platform was inserted to bridge an unreachable gap.
    PlatformInserted {
        /// Chunk that owns the platform.
        chunk: ChunkId,
        /// Realized platform position.
        position: Vec2,
    },
    /// Content was released into the world.
    ContentReleased {
        /// Chunk that was being populated.
        chunk: ChunkId,
        /// Description of what was spawned.
        placement: ContentPlacement,
    },
    /// A chunk finished populating.
    ChunkGenerated {
        /// Identifier of the chunk.
        chunk: ChunkId,
        /// Lower edge of the chunk.
        start_y: f32,
        /// Upper edge of the chunk.
        end_y: f32,
        /// Number of platforms the chunk holds.
        platforms: usize,
    },
    /// A chunk fell far enough behind the camera to be discarded.
    ChunkEvicted {
        /// Identifier of the chunk.
        chunk: ChunkId,
        /// Lower edge of the chunk.
        start_y: f32,
        /// Upper edge of the chunk.
        end_y: f32,
    },
    /// A safety cap stopped a chunk early.
    GenerationCapReached {
        /// Chunk that was cut short.
        chunk: ChunkId,
        /// Cap that tripped.
        cap: GenerationCap,
    },
    /// The generator stopped producing content.
    GeneratorDisabled {
        /// Human-readable reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn boundaries_order_their_edges() {
        let bounds = SpawnBoundaries::new(4.0, -4.0);
        assert_eq!(bounds.left(), -4.0);
        assert_eq!(bounds.right(), 4.0);
        assert_eq!(bounds.width(), 8.0);
    }

    #[test]
    fn inset_collapses_narrow_boundaries() {
        let bounds = SpawnBoundaries::new(-1.0, 1.0).inset(2.0);
        assert_eq!(bounds.left(), 0.0);
        assert_eq!(bounds.right(), 0.0);
    }

    #[test]
    fn sampled_coordinates_stay_inside() {
        let bounds = SpawnBoundaries::new(-3.0, 5.0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..256 {
            let x = bounds.sample_x(&mut rng);
            assert!((-3.0..=5.0).contains(&x));
        }
    }

    #[test]
    fn progress_of_empty_part_is_complete() {
        assert_eq!(PartProgress::new(0, 0).fraction(), 1.0);
        assert_eq!(PartProgress::new(1, 4).fraction(), 0.25);
    }

    #[test]
    fn recording_sink_copies_requests() {
        let prefab = PrefabId::new("ledge");
        let mut sink: Vec<SpawnRecord> = Vec::new();
        sink.instantiate(&SpawnRequest {
            kind: SpawnKind::Platform,
            prefab: &prefab,
            position: Vec2::new(1.0, 2.0),
            flip_x: false,
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].prefab, prefab);
    }

    #[test]
    fn placement_description_mentions_chain_and_flip() {
        let placement = ContentPlacement {
            category: ContentCategory::Enemy,
            prefab: PrefabId::new("bat"),
            positions: vec![Vec2::new(0.0, 3.0), Vec2::new(1.0, 3.0)],
            flip_x: true,
            chained: true,
            before_part: false,
        };
        assert_eq!(placement.to_string(), "enemy `bat` x2 at y=3.00 chain flipped");
    }
}
