#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative streaming state for the Ascent level generator.
//!
//! [`LevelGenerator`] owns the chunk list, the live Part and the content
//! spawner. Hosts call [`LevelGenerator::init`] once and then
//! [`LevelGenerator::tick`] from their frame loop; everything the generator
//! does is reported through [`Event`] values and materialized through the
//! host's [`PrefabSink`].

mod config;

use std::time::Duration;

use ascent_core::{
    validate_catalog, CameraHeight, CatalogError, ChunkId, Event, HeightChunk, Part,
    PlatformSpawner, PrefabSink,
};
use ascent_system_chunk_cleanup::ChunkCleanupManager;
use ascent_system_chunk_population::{ChunkContentGenerator, PopulationReport};
use ascent_system_content_scheduling::ContentSpawner;
use ascent_system_gap_filling::PlatformGapFiller;
use ascent_system_part_progression::{PartGenerationState, PartManager};
use glam::Vec2;
use thiserror::Error;

pub use config::{Catalog, ConfigError, GeneratorConfig, DEFAULT_CATALOG};

/// Reasons the generator refuses to start.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The Part catalog cannot drive generation.
    #[error("part catalog is unusable")]
    Catalog(#[from] CatalogError),
    /// The generator settings are out of range.
    #[error("generator settings are invalid")]
    Config(#[from] ConfigError),
}

/// Timer-driven generator that keeps content streamed ahead of the camera.
#[derive(Debug)]
pub struct LevelGenerator<S, C> {
    config: GeneratorConfig,
    catalog_check: Result<usize, CatalogError>,
    spawner: S,
    camera: C,
    parts: PartManager,
    population: ChunkContentGenerator,
    content: ContentSpawner,
    cleanup: ChunkCleanupManager,
    gap_filler: Option<PlatformGapFiller>,
    chunks: Vec<HeightChunk>,
    next_chunk: ChunkId,
    highest_generated_y: f32,
    last_platform: Option<(Vec2, usize)>,
    accumulator: Duration,
    initialized: bool,
    enabled: bool,
}

impl<S, C> LevelGenerator<S, C>
where
    S: PlatformSpawner,
    C: CameraHeight,
{
    /// Creates a generator over `parts`, realizing platforms through
    /// `spawner` and following `camera`.
    ///
    /// Nothing is generated until [`LevelGenerator::init`] runs.
    #[must_use]
    pub fn new(config: GeneratorConfig, parts: Vec<Part>, spawner: S, camera: C) -> Self {
        let seed = config.seed;
        let catalog_check = validate_catalog(&parts);
        Self {
            catalog_check,
            spawner,
            camera,
            parts: PartManager::new(parts, config.part_selection, seed),
            population: ChunkContentGenerator::new(config.limits(), seed),
            content: ContentSpawner::new(seed),
            cleanup: ChunkCleanupManager::new(config.cleanup_distance_factor),
            gap_filler: config
                .gap_fill
                .map(|gap_fill| PlatformGapFiller::new(gap_fill, seed)),
            chunks: Vec::new(),
            next_chunk: ChunkId::new(0),
            highest_generated_y: 0.0,
            last_platform: None,
            accumulator: Duration::ZERO,
            initialized: false,
            enabled: true,
            config,
        }
    }

    /// Creates a generator from a loaded catalog.
    #[must_use]
    pub fn from_catalog(catalog: Catalog, spawner: S, camera: C) -> Self {
        Self::new(catalog.generator, catalog.parts, spawner, camera)
    }

    /// Validates the catalog, starts the first Part and eagerly generates
    /// the initial chunks.
    ///
    /// On failure the generator disables itself and reports why. Calling
    /// `init` again after a successful start does nothing.
    pub fn init(
        &mut self,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) -> Result<(), GeneratorError> {
        if self.initialized {
            return Ok(());
        }

        if let Err(error) = self.config.validate() {
            self.disable(error.to_string(), out);
            return Err(error.into());
        }
        if let Err(error) = self.catalog_check.clone() {
            self.disable(error.to_string(), out);
            return Err(error.into());
        }

        self.content.initialize(&self.spawner);
        if !self.start_first_valid_part(out) {
            let error = CatalogError::NoValidParts;
            self.disable(error.to_string(), out);
            return Err(error.into());
        }

        self.initialized = true;
        for _ in 0..self.config.initial_chunks {
            if self.generate_chunk(sink, out).part_unavailable {
                break;
            }
        }

        tracing::info!(
            chunks = self.chunks.len(),
            highest = self.highest_generated_y,
            "level generator started"
        );
        Ok(())
    }

    /// Advances the check timer by `dt` and generates ahead of the camera
    /// when the check interval elapsed.
    ///
    /// Returns the number of chunks generated.
    pub fn tick(
        &mut self,
        dt: Duration,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) -> usize {
        if !self.enabled || !self.initialized {
            self.accumulator = Duration::ZERO;
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < self.config.check_interval() {
            return 0;
        }
        self.accumulator = Duration::ZERO;

        self.generate_ahead(sink, out)
    }

    /// Runs one generation check immediately.
    ///
    /// Generates chunks until `camera + generation_distance` is covered or
    /// `max_chunks_per_frame` chunks were produced, then evicts chunks that
    /// fell behind the camera. Returns the number of chunks generated.
    pub fn generate_ahead(
        &mut self,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) -> usize {
        if !self.enabled || !self.initialized {
            return 0;
        }

        let camera_y = self.camera.camera_height();
        let required = camera_y + self.config.generation_distance;
        let mut generated = 0;

        while self.highest_generated_y < required
            && generated < self.config.max_chunks_per_frame
        {
            let report = self.generate_chunk(sink, out);
            generated += 1;
            if report.part_unavailable {
                break;
            }
        }

        let _ = self.cleanup.cleanup_old_chunks(
            &mut self.chunks,
            camera_y,
            self.config.generation_distance,
            out,
        );
        generated
    }

    /// Enables or disables future generation.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Settings the generator runs with.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Platform spawner used to realize platforms.
    #[must_use]
    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Mutable access to the platform spawner.
    ///
    /// Call [`LevelGenerator::refresh_boundaries`] afterwards if the spawn
    /// boundaries changed.
    pub fn spawner_mut(&mut self) -> &mut S {
        &mut self.spawner
    }

    /// Re-reads the spawn boundaries used for content placement.
    pub fn refresh_boundaries(&mut self) {
        self.content.initialize(&self.spawner);
    }

    fn start_first_valid_part(&mut self, out: &mut Vec<Event>) -> bool {
        let attempts = self.parts.part_count();
        let mut started = self.parts.start_first_part().is_some();
        for _ in 1..attempts {
            if started {
                break;
            }
            started = self.parts.start_next_part(0.0).is_some();
        }

        let Some(state) = self.parts.state() else {
            return false;
        };
        out.push(Event::PartStarted {
            part_index: state.part_index(),
            name: state.part().name.clone(),
            start_y: state.start_y(),
            platforms_needed: state.platforms_needed(),
        });
        started
    }

    fn generate_chunk(
        &mut self,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) -> PopulationReport {
        let mut chunk = HeightChunk::new(
            self.next_chunk,
            self.highest_generated_y,
            self.config.chunk_height,
        );
        self.next_chunk = self.next_chunk.next();

        let owner = self.parts.state().map(PartGenerationState::part_index);
        let mark = out.len();
        let report = self.population.populate_chunk(
            &mut chunk,
            &mut self.parts,
            &mut self.content,
            &mut self.spawner,
            sink,
            out,
        );
        let owners = platform_owners(owner, &out[mark..]);
        if let (Some(last), Some(owner)) = (chunk.platforms().last(), owners.last()) {
            let top = (*last, *owner);
            self.fill_gaps(&mut chunk, &owners, sink, out);
            self.last_platform = Some(top);
        }
        self.highest_generated_y = chunk.end_y();

        tracing::debug!(
            chunk = chunk.id().get(),
            start_y = chunk.start_y(),
            end_y = chunk.end_y(),
            platforms = chunk.platforms().len(),
            "chunk generated"
        );
        out.push(Event::ChunkGenerated {
            chunk: chunk.id(),
            start_y: chunk.start_y(),
            end_y: chunk.end_y(),
            platforms: chunk.platforms().len(),
        });
        self.chunks.push(chunk);
        report
    }

    /// Bridges unreachable gaps in `chunk`, each with the Part that owns the
    /// gap's lower platform.
    fn fill_gaps(
        &mut self,
        chunk: &mut HeightChunk,
        owners: &[usize],
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) {
        let Some(filler) = self.gap_filler.as_mut() else {
            return;
        };
        if owners.len() != chunk.platforms().len() {
            tracing::warn!(chunk = chunk.id().get(), "platform owners unknown, gaps left as is");
            return;
        }

        // The previous chunk's top platform joins the run so the seam is checked too.
        let seam = self.last_platform;
        let run: Vec<(Vec2, usize)> = seam
            .into_iter()
            .chain(chunk.platforms().iter().copied().zip(owners.iter().copied()))
            .collect();

        let mut filled = Vec::with_capacity(run.len());
        let mut inserted = Vec::new();
        let mut start = 0;
        while start < run.len() {
            let owner = run[start].1;
            let end = run[start..]
                .iter()
                .position(|(_, candidate)| *candidate != owner)
                .map_or(run.len(), |offset| start + offset);
            let upper = run.get(end).map(|(position, _)| *position);
            let mut segment: Vec<Vec2> = run[start..end]
                .iter()
                .map(|(position, _)| *position)
                .chain(upper)
                .collect();
            if let Some(part) = self.parts.part(owner) {
                inserted.extend(filler.fill_gaps_in_part(
                    &mut segment,
                    part,
                    &mut self.spawner,
                    sink,
                ));
            }
            if upper.is_some() {
                let _ = segment.pop();
            }
            filled.extend(segment);
            start = end;
        }
        if inserted.is_empty() {
            return;
        }
        if seam.is_some() {
            let _ = filled.remove(0);
        }

        // Seam bridges at or below the chunk's lower edge belong to the previous chunk.
        let start_y = chunk.start_y();
        let previous = self
            .chunks
            .last_mut()
            .filter(|previous| previous.end_y() >= start_y);
        let previous_id = previous.as_ref().map(|previous| previous.id());
        if let Some(previous) = previous {
            let split = filled.partition_point(|position| position.y <= start_y);
            previous.platforms_mut().extend(filled.drain(..split));
        }
        *chunk.platforms_mut() = filled;

        for position in inserted {
            let owner = match previous_id {
                Some(id) if position.y <= start_y => id,
                _ => chunk.id(),
            };
            out.push(Event::PlatformInserted {
                chunk: owner,
                position,
            });
        }
    }

    fn disable(&mut self, reason: String, out: &mut Vec<Event>) {
        tracing::error!(%reason, "level generator disabled");
        self.enabled = false;
        out.push(Event::GeneratorDisabled { reason });
    }
}

/// Catalog index of the Part that realized each platform reported in `events`.
fn platform_owners(mut owner: Option<usize>, events: &[Event]) -> Vec<usize> {
    let mut owners = Vec::new();
    for event in events {
        match event {
            Event::PartStarted { part_index, .. } => owner = Some(*part_index),
            Event::PlatformSpawned { .. } => owners.extend(owner),
            _ => {}
        }
    }
    owners
}

/// Query functions that provide read-only access to the generator state.
pub mod query {
    use ascent_core::HeightChunk;

    use super::{LevelGenerator, PartGenerationState};

    /// Chunks currently kept alive, lowest first.
    #[must_use]
    pub fn chunks<S, C>(generator: &LevelGenerator<S, C>) -> &[HeightChunk] {
        &generator.chunks
    }

    /// Upper edge of the highest generated chunk.
    #[must_use]
    pub fn highest_generated_y<S, C>(generator: &LevelGenerator<S, C>) -> f32 {
        generator.highest_generated_y
    }

    /// State of the Part being generated, if any.
    #[must_use]
    pub fn live_part<S, C>(generator: &LevelGenerator<S, C>) -> Option<&PartGenerationState> {
        generator.parts.state()
    }

    /// Whether the generator will act on future ticks.
    #[must_use]
    pub fn is_enabled<S, C>(generator: &LevelGenerator<S, C>) -> bool {
        generator.enabled && generator.initialized
    }

    /// Total number of platforms held by live chunks.
    #[must_use]
    pub fn platform_count<S, C>(generator: &LevelGenerator<S, C>) -> usize {
        generator
            .chunks
            .iter()
            .map(|chunk| chunk.platforms().len())
            .sum()
    }
}
