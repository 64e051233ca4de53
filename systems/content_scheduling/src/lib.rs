#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Content scheduling: expands a Part's content rules into a queue and
//! releases it progressively while the Part's platforms are generated.
//!
//! Releases are proportional to Part progress. After `generated` of `needed`
//! platforms, `floor(generated * total / needed)` queued items are expected to
//! be out; every call releases the shortfall, earliest items first. Whatever
//! is left when the Part completes is flushed with
//! [`ContentSpawner::spawn_remaining_content`], so a queue never loses items.

use ascent_core::{
    stream_rng, ChainRule, ChainSpacing, ContentPlacement, ContentSpawnRule, Part, PartProgress,
    PlatformSpawner, Positioning, PrefabId, PrefabSink, PrefabVariant, SpawnBoundaries, SpawnKind,
    SpawnRequest, CONTENT_CLEARANCE, RNG_STREAM_CONTENT,
};
use ascent_system_selection::select_weighted;
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Queued instance of a content rule awaiting release.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentSpawnItem {
    rule: ContentSpawnRule,
    is_chain: bool,
    has_spawned: bool,
}

impl ContentSpawnItem {
    fn new(rule: &ContentSpawnRule) -> Self {
        Self {
            rule: rule.clone(),
            is_chain: rule.is_chain(),
            has_spawned: false,
        }
    }

    /// Rule the item was expanded from.
    #[must_use]
    pub fn rule(&self) -> &ContentSpawnRule {
        &self.rule
    }

    /// Whether the item stands for a whole chain.
    #[must_use]
    pub const fn is_chain(&self) -> bool {
        self.is_chain
    }

    /// Whether the item was released. Never reverts once set.
    #[must_use]
    pub const fn has_spawned(&self) -> bool {
        self.has_spawned
    }
}

/// Content queue owned by a single Part generation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentQueue {
    items: Vec<ContentSpawnItem>,
    pre_part: Vec<ContentSpawnItem>,
}

impl ContentQueue {
    /// Expands the valid content rules of `part` into queue items.
    ///
    /// A chained rule contributes one item for the whole chain; any other rule
    /// contributes [`ContentSpawnRule::random_count`] items. Rules flagged
    /// `spawn_before_part` contribute a single item that is kept apart and
    /// released with [`ContentSpawner::spawn_pre_part_content`].
    pub fn for_part<R: Rng + ?Sized>(part: &Part, rng: &mut R) -> Self {
        let mut queue = Self::default();
        for rule in part.valid_content_rules() {
            if rule.spawn_before_part {
                queue.pre_part.push(ContentSpawnItem::new(rule));
                continue;
            }

            let copies = if rule.is_chain() {
                1
            } else {
                rule.random_count(rng)
            };
            for _ in 0..copies {
                queue.items.push(ContentSpawnItem::new(rule));
            }
        }
        queue
    }

    /// Items spread across the Part, in release order.
    #[must_use]
    pub fn items(&self) -> &[ContentSpawnItem] {
        &self.items
    }

    /// Items released right after the Part's first platform.
    #[must_use]
    pub fn pre_part_items(&self) -> &[ContentSpawnItem] {
        &self.pre_part
    }

    /// Number of items spread across the Part.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Number of spread items already released.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.items.iter().filter(|item| item.has_spawned).count()
    }

    /// Reports whether every item, pre-part ones included, was released.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.items
            .iter()
            .chain(self.pre_part.iter())
            .all(|item| item.has_spawned)
    }

    fn next_unspawned(&self) -> Option<usize> {
        self.items.iter().position(|item| !item.has_spawned)
    }
}

/// Reference point content is released against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentAnchor {
    /// Height of the most recent platform.
    pub height: f32,
    /// Horizontal position of the most recent platform.
    pub platform_x: f32,
}

impl ContentAnchor {
    /// Anchors content to the platform at `position`.
    #[must_use]
    pub const fn at_platform(position: Vec2) -> Self {
        Self {
            height: position.y,
            platform_x: position.x,
        }
    }
}

/// Materializes queued content through the host's prefab sink.
#[derive(Debug)]
pub struct ContentSpawner {
    rng: ChaCha8Rng,
    boundaries: Option<SpawnBoundaries>,
}

impl ContentSpawner {
    /// Creates a spawner drawing from the content stream of `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: stream_rng(seed, RNG_STREAM_CONTENT),
            boundaries: None,
        }
    }

    /// Caches the spawn boundaries reported by `spawner`.
    ///
    /// Called once before generation starts and again whenever the host's
    /// boundaries may have moved.
    pub fn initialize<S>(&mut self, spawner: &S)
    where
        S: PlatformSpawner + ?Sized,
    {
        self.boundaries = Some(spawner.spawn_boundaries());
    }

    /// Boundaries cached by the last [`ContentSpawner::initialize`] call.
    #[must_use]
    pub const fn boundaries(&self) -> Option<SpawnBoundaries> {
        self.boundaries
    }

    /// Releases the items that are due at `progress`.
    ///
    /// Returns the number of items released.
    pub fn spawn_content_based_on_progress(
        &mut self,
        queue: &mut ContentQueue,
        progress: PartProgress,
        anchor: ContentAnchor,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<ContentPlacement>,
    ) -> usize {
        let total = queue.total();
        if total == 0 {
            return 0;
        }

        let expected = expected_releases(progress, total);
        let due = expected.saturating_sub(queue.spawned());
        let mut released = 0;
        for _ in 0..due {
            let Some(index) = queue.next_unspawned() else {
                break;
            };
            self.release(&mut queue.items[index], anchor, false, sink, out);
            released += 1;
        }
        released
    }

    /// Releases every item that has not been released yet.
    pub fn spawn_remaining_content(
        &mut self,
        queue: &mut ContentQueue,
        anchor: ContentAnchor,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<ContentPlacement>,
    ) -> usize {
        let mut released = 0;
        for item in queue.items.iter_mut().chain(queue.pre_part.iter_mut()) {
            if item.has_spawned {
                continue;
            }
            let before_part = item.rule.spawn_before_part;
            self.release(item, anchor, before_part, sink, out);
            released += 1;
        }
        released
    }

    /// Releases the Part's pre-part content above its first platform.
    pub fn spawn_pre_part_content(
        &mut self,
        queue: &mut ContentQueue,
        anchor: ContentAnchor,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<ContentPlacement>,
    ) -> usize {
        let mut released = 0;
        for item in queue.pre_part.iter_mut().filter(|item| !item.has_spawned) {
            self.release(item, anchor, true, sink, out);
            released += 1;
        }
        released
    }

    fn release(
        &mut self,
        item: &mut ContentSpawnItem,
        anchor: ContentAnchor,
        before_part: bool,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<ContentPlacement>,
    ) {
        // Marked first so a failed placement still drains the queue.
        item.has_spawned = true;

        let rule = &item.rule;
        let Some(prefab) = self.resolve_prefab(rule) else {
            tracing::warn!(category = %rule.category, "content rule has no selectable prefab");
            return;
        };

        let boundaries = self.boundaries.unwrap_or_else(|| {
            tracing::warn!("content spawner used before initialization");
            SpawnBoundaries::new(anchor.platform_x, anchor.platform_x)
        });
        let flip_x = rule.flip.resolve(&mut self.rng);
        let y = anchor.height + CONTENT_CLEARANCE;

        let positions = match &rule.chain {
            Some(chain) => {
                let length = chain.random_chain_length(&mut self.rng);
                chain_offsets(chain, length, boundaries, &mut self.rng)
                    .into_iter()
                    .map(|x| Vec2::new(x, y))
                    .collect()
            }
            None => {
                let x = match rule.positioning {
                    Positioning::OverPlatform => boundaries.clamp_x(anchor.platform_x),
                    Positioning::RandomAcrossScreen => boundaries.sample_x(&mut self.rng),
                };
                vec![Vec2::new(x, y)]
            }
        };

        for position in &positions {
            sink.instantiate(&SpawnRequest {
                kind: SpawnKind::Content(rule.category),
                prefab: &prefab,
                position: *position,
                flip_x,
            });
        }

        out.push(ContentPlacement {
            category: rule.category,
            prefab,
            positions,
            flip_x,
            chained: item.is_chain,
            before_part,
        });
    }

    fn resolve_prefab(&mut self, rule: &ContentSpawnRule) -> Option<PrefabId> {
        let usable = rule
            .variants
            .iter()
            .filter(|variant| !variant.prefab.is_empty());
        if let Some(variant) = select_weighted(
            usable,
            |variant: &PrefabVariant| variant.weight,
            &mut self.rng,
        ) {
            return Some(variant.prefab.clone());
        }

        (!rule.prefab.is_empty()).then(|| rule.prefab.clone())
    }
}

fn expected_releases(progress: PartProgress, total: usize) -> usize {
    if progress.needed() == 0 {
        return total;
    }
    let generated = u64::from(progress.generated().min(progress.needed()));
    let expected = generated * total as u64 / u64::from(progress.needed());
    expected as usize
}

fn chain_offsets<R: Rng + ?Sized>(
    chain: &ChainRule,
    length: u32,
    boundaries: SpawnBoundaries,
    rng: &mut R,
) -> Vec<f32> {
    let count = length as usize;
    match chain.spacing {
        ChainSpacing::Even => {
            let step = boundaries.width() / (length as f32 + 1.0);
            (1..=count)
                .map(|slot| boundaries.left() + step * slot as f32)
                .collect()
        }
        ChainSpacing::Custom => {
            let gap = chain.gap.max(0.0);
            let start = boundaries.center() - gap * (length as f32 - 1.0) * 0.5;
            (0..count)
                .map(|slot| boundaries.clamp_x(start + gap * slot as f32))
                .collect()
        }
        ChainSpacing::Random => {
            let min_gap = chain.min_gap.max(0.0);
            let max_gap = chain.max_gap.max(min_gap);
            let mut cursor = boundaries.left();
            (0..count)
                .map(|_| {
                    let gap = if max_gap > min_gap {
                        rng.gen_range(min_gap..=max_gap)
                    } else {
                        min_gap
                    };
                    cursor += gap;
                    boundaries.clamp_x(cursor)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn expected_releases_floor_the_share() {
        assert_eq!(expected_releases(PartProgress::new(0, 4), 6), 0);
        assert_eq!(expected_releases(PartProgress::new(1, 4), 6), 1);
        assert_eq!(expected_releases(PartProgress::new(2, 4), 6), 3);
        assert_eq!(expected_releases(PartProgress::new(4, 4), 6), 6);
        assert_eq!(expected_releases(PartProgress::new(0, 0), 6), 6);
    }

    #[test]
    fn even_chains_divide_the_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chain = ChainRule::default();
        let offsets = chain_offsets(&chain, 3, SpawnBoundaries::new(0.0, 8.0), &mut rng);
        assert_eq!(offsets, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn custom_chains_are_centred() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chain = ChainRule {
            spacing: ChainSpacing::Custom,
            gap: 1.5,
            ..ChainRule::default()
        };
        let offsets = chain_offsets(&chain, 3, SpawnBoundaries::new(-5.0, 5.0), &mut rng);
        assert_eq!(offsets, vec![-1.5, 0.0, 1.5]);
    }

    #[test]
    fn random_chains_advance_and_stay_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let chain = ChainRule {
            spacing: ChainSpacing::Random,
            min_gap: 1.0,
            max_gap: 3.0,
            ..ChainRule::default()
        };
        let bounds = SpawnBoundaries::new(0.0, 6.0);
        let offsets = chain_offsets(&chain, 5, bounds, &mut rng);
        assert_eq!(offsets.len(), 5);
        assert!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(offsets.iter().all(|x| (0.0..=6.0).contains(x)));
    }
}
