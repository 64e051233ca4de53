#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Chunk population: fills one fixed-height chunk with the live Part's
//! platforms and releases the Part's content as it goes.

use std::sync::Arc;

use ascent_core::{
    stream_rng, ContentPlacement, Event, GenerationCap, HeightChunk, PlatformSpawner, PrefabSink,
    RNG_STREAM_SPACING,
};
use ascent_system_content_scheduling::{ContentAnchor, ContentSpawner};
use ascent_system_part_progression::{PartGenerationState, PartManager};
use glam::Vec2;
use rand_chacha::ChaCha8Rng;

/// Default upper bound on platforms realized in a single chunk.
pub const MAX_PLATFORMS_PER_CHUNK: usize = 64;
/// Default upper bound on generation loop iterations for a single chunk.
pub const MAX_GENERATION_LOOPS: usize = 256;

/// Safety caps that keep misconfigured catalogs from looping forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationLimits {
    /// Maximum number of platforms per chunk.
    pub max_platforms_per_chunk: usize,
    /// Maximum number of loop iterations per chunk.
    pub max_generation_loops: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_platforms_per_chunk: MAX_PLATFORMS_PER_CHUNK,
            max_generation_loops: MAX_GENERATION_LOOPS,
        }
    }
}

/// Summary of a single [`ChunkContentGenerator::populate_chunk`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Platforms realized in the chunk.
    pub platforms: usize,
    /// Cap that stopped the chunk early, if any.
    pub cap: Option<GenerationCap>,
    /// Set when no Part could be started and the chunk was abandoned.
    pub part_unavailable: bool,
}

/// Fills chunks with platforms and content.
///
/// The generation cursor survives between chunks: a platform that would land
/// above a chunk's upper edge is deferred, spacing included, to the next
/// chunk, which lets Parts straddle chunk boundaries.
#[derive(Debug)]
pub struct ChunkContentGenerator {
    limits: GenerationLimits,
    rng: ChaCha8Rng,
    current_y: f32,
    deferred_spacing: Option<f32>,
    placements: Vec<ContentPlacement>,
}

impl ChunkContentGenerator {
    /// Creates a generator drawing spacings from the spacing stream of `seed`.
    #[must_use]
    pub fn new(limits: GenerationLimits, seed: u64) -> Self {
        Self {
            limits,
            rng: stream_rng(seed, RNG_STREAM_SPACING),
            current_y: 0.0,
            deferred_spacing: None,
            placements: Vec::new(),
        }
    }

    /// Height of the most recently generated platform.
    #[must_use]
    pub const fn current_y(&self) -> f32 {
        self.current_y
    }

    /// Limits applied to every chunk.
    #[must_use]
    pub const fn limits(&self) -> GenerationLimits {
        self.limits
    }

    /// Populates `chunk` in place.
    #[allow(clippy::too_many_arguments)]
    pub fn populate_chunk<S>(
        &mut self,
        chunk: &mut HeightChunk,
        parts: &mut PartManager,
        content: &mut ContentSpawner,
        spawner: &mut S,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) -> PopulationReport
    where
        S: PlatformSpawner + ?Sized,
    {
        let mut report = PopulationReport::default();
        let mut loops = 0;

        while self.current_y < chunk.end_y() {
            if loops >= self.limits.max_generation_loops {
                report.cap = Some(GenerationCap::Loops);
                break;
            }
            if chunk.platforms().len() >= self.limits.max_platforms_per_chunk {
                report.cap = Some(GenerationCap::Platforms);
                break;
            }
            loops += 1;

            if parts.needs_new_part() {
                let Some(state) = start_next_valid_part(parts, self.current_y) else {
                    tracing::warn!(chunk = chunk.id().get(), "no part available, chunk abandoned");
                    report.part_unavailable = true;
                    break;
                };
                out.push(Event::PartStarted {
                    part_index: state.part_index(),
                    name: state.part().name.clone(),
                    start_y: state.start_y(),
                    platforms_needed: state.platforms_needed(),
                });
            }

            if !parts.needs_more_platforms() {
                continue;
            }
            let Some(part) = parts.state().map(|state| Arc::clone(state.part())) else {
                break;
            };

            let spacing = match self.deferred_spacing.take() {
                Some(spacing) => spacing,
                None => part.spacing.sample(&mut self.rng),
            };
            let candidate = self.current_y + spacing;
            if candidate > chunk.end_y() {
                self.deferred_spacing = Some(spacing);
                break;
            }

            let Some(position) = spawner.spawn_platform_at(candidate, &part, sink) else {
                tracing::warn!(part = %part.name, y = candidate, "platform spawn failed");
                self.current_y = candidate;
                continue;
            };

            self.current_y = position.y;
            chunk.record_platform(position);
            out.push(Event::PlatformSpawned {
                chunk: chunk.id(),
                position,
            });

            let completed = parts.on_platform_generated(position);
            self.release_content(chunk, parts, content, position, completed, sink, out);
        }

        if report.cap.is_some() || report.part_unavailable {
            // The next chunk starts at this chunk's upper edge.
            self.current_y = self.current_y.max(chunk.end_y());
            self.deferred_spacing = None;
        }
        if let Some(cap) = report.cap {
            tracing::warn!(chunk = chunk.id().get(), ?cap, "chunk generation capped");
            out.push(Event::GenerationCapReached {
                chunk: chunk.id(),
                cap,
            });
        }

        report.platforms = chunk.platforms().len();
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn release_content(
        &mut self,
        chunk: &mut HeightChunk,
        parts: &mut PartManager,
        content: &mut ContentSpawner,
        position: Vec2,
        completed: bool,
        sink: &mut dyn PrefabSink,
        out: &mut Vec<Event>,
    ) {
        let Some(state) = parts.state_mut() else {
            return;
        };

        let anchor = ContentAnchor::at_platform(position);
        let progress = state.progress();
        self.placements.clear();

        if progress.generated() == 1 {
            let _ = content.spawn_pre_part_content(
                state.content_mut(),
                anchor,
                sink,
                &mut self.placements,
            );
        }
        let _ = content.spawn_content_based_on_progress(
            state.content_mut(),
            progress,
            anchor,
            sink,
            &mut self.placements,
        );
        if completed {
            let _ = content.spawn_remaining_content(
                state.content_mut(),
                anchor,
                sink,
                &mut self.placements,
            );
        }

        for placement in self.placements.drain(..) {
            chunk.record_content(placement.to_string());
            out.push(Event::ContentReleased {
                chunk: chunk.id(),
                placement,
            });
        }

        if completed {
            out.push(Event::PartCompleted {
                part_index: state.part_index(),
                name: state.part().name.clone(),
                end_y: state.current_y(),
            });
        }
    }
}

/// Starts the next Part, stepping over catalog entries that fail validation.
fn start_next_valid_part(parts: &mut PartManager, start_y: f32) -> Option<&PartGenerationState> {
    for _ in 0..parts.part_count().max(1) {
        if parts.start_next_part(start_y).is_some() {
            break;
        }
    }
    parts.state()
}
