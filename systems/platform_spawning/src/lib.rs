#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Default platform spawner that picks weighted Part variants inside host boundaries.

use ascent_core::{
    stream_rng, BoundaryProvider, Part, PlatformSpawner, PlatformVariant, PrefabSink,
    SpawnBoundaries, SpawnKind, SpawnRequest, RNG_STREAM_PLATFORMS,
};
use ascent_system_selection::select_weighted;
use glam::Vec2;
use rand_chacha::ChaCha8Rng;

/// Platform spawner that delegates boundary queries to the host.
///
/// Each platform is a weighted pick among the Part's variants, placed at a
/// uniformly random horizontal position that keeps the whole platform inside
/// the boundaries.
#[derive(Debug)]
pub struct VariantPlatformSpawner<B> {
    boundaries: B,
    rng: ChaCha8Rng,
}

impl<B> VariantPlatformSpawner<B>
where
    B: BoundaryProvider,
{
    /// Creates a spawner drawing from the platform stream of `seed`.
    #[must_use]
    pub fn new(boundaries: B, seed: u64) -> Self {
        Self {
            boundaries,
            rng: stream_rng(seed, RNG_STREAM_PLATFORMS),
        }
    }

    /// Boundary provider backing the spawner.
    #[must_use]
    pub fn boundary_provider(&self) -> &B {
        &self.boundaries
    }

    /// Mutable access to the boundary provider, e.g. to follow walls as they move.
    pub fn boundary_provider_mut(&mut self) -> &mut B {
        &mut self.boundaries
    }

    fn select_variant<'p>(&mut self, part: &'p Part) -> Option<&'p PlatformVariant> {
        let usable = part
            .platform_variants
            .iter()
            .filter(|variant| variant.is_selectable());
        let selected = select_weighted(
            usable,
            |variant: &PlatformVariant| variant.weight,
            &mut self.rng,
        );
        if selected.is_none() {
            tracing::warn!(part = %part.name, "no selectable platform variant");
        }
        selected
    }

    fn materialize(
        variant: &PlatformVariant,
        position: Vec2,
        sink: &mut dyn PrefabSink,
    ) -> Vec2 {
        sink.instantiate(&SpawnRequest {
            kind: SpawnKind::Platform,
            prefab: &variant.prefab,
            position,
            flip_x: false,
        });
        position
    }
}

impl<B> PlatformSpawner for VariantPlatformSpawner<B>
where
    B: BoundaryProvider,
{
    fn spawn_boundaries(&self) -> SpawnBoundaries {
        self.boundaries.spawn_boundaries()
    }

    fn spawn_platform_at(
        &mut self,
        y: f32,
        part: &Part,
        sink: &mut dyn PrefabSink,
    ) -> Option<Vec2> {
        let variant = self.select_variant(part)?;
        let usable = self.spawn_boundaries().inset(variant.half_width);
        let x = usable.sample_x(&mut self.rng);
        Some(Self::materialize(variant, Vec2::new(x, y), sink))
    }

    fn spawn_platform_near(
        &mut self,
        position: Vec2,
        part: &Part,
        sink: &mut dyn PrefabSink,
    ) -> Option<Vec2> {
        let variant = self.select_variant(part)?;
        let usable = self.spawn_boundaries().inset(variant.half_width);
        let x = usable.clamp_x(position.x);
        Some(Self::materialize(variant, Vec2::new(x, position.y), sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascent_core::{PlatformVariant, SpawnRecord};

    fn part(variants: Vec<PlatformVariant>) -> Part {
        Part {
            name: "test".into(),
            platform_variants: variants,
            ..Part::default()
        }
    }

    #[test]
    fn platforms_fit_inside_boundaries() {
        let mut spawner = VariantPlatformSpawner::new(SpawnBoundaries::new(-5.0, 5.0), 11);
        let mut variant = PlatformVariant::new("wide", 1.0);
        variant.half_width = 2.0;
        let part = part(vec![variant]);
        let mut sink: Vec<SpawnRecord> = Vec::new();

        for step in 0..200 {
            let position = spawner
                .spawn_platform_at(step as f32, &part, &mut sink)
                .expect("platform");
            assert!((-3.0..=3.0).contains(&position.x), "x = {}", position.x);
            assert_eq!(position.y, step as f32);
        }
        assert_eq!(sink.len(), 200);
        assert!(sink.iter().all(|record| record.kind == SpawnKind::Platform));
    }

    #[test]
    fn unusable_variants_produce_no_platform() {
        let mut spawner = VariantPlatformSpawner::new(SpawnBoundaries::new(-5.0, 5.0), 11);
        let part = part(vec![
            PlatformVariant::new("ledge", 0.0),
            PlatformVariant::new("", 3.0),
        ]);
        let mut sink: Vec<SpawnRecord> = Vec::new();

        assert_eq!(spawner.spawn_platform_at(4.0, &part, &mut sink), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn explicit_positions_are_clamped() {
        let mut spawner = VariantPlatformSpawner::new(SpawnBoundaries::new(-5.0, 5.0), 3);
        let part = part(vec![PlatformVariant::new("ledge", 1.0)]);
        let mut sink: Vec<SpawnRecord> = Vec::new();

        let placed = spawner
            .spawn_platform_near(Vec2::new(12.0, 7.5), &part, &mut sink)
            .expect("platform");
        assert_eq!(placed, Vec2::new(4.0, 7.5));
        assert_eq!(sink[0].position, placed);
    }
}
