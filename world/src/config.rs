//! Generator settings and authored catalog loading.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use ascent_core::Part;
use ascent_system_chunk_cleanup::DEFAULT_CLEANUP_DISTANCE_FACTOR;
use ascent_system_chunk_population::{
    GenerationLimits, MAX_GENERATION_LOOPS, MAX_PLATFORMS_PER_CHUNK,
};
use ascent_system_gap_filling::GapFillConfig;
use ascent_system_part_progression::PartSelection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog shipped with the generator.
pub const DEFAULT_CATALOG: &str = include_str!("../catalog/default.toml");

const DEFAULT_SEED: u64 = 0x5eed_a5c3_17d0_0001;

/// Problems encountered while loading or checking generator settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The catalog file could not be read.
    #[error("failed to read catalog at {}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog is not valid TOML or does not match the expected layout.
    #[error("failed to parse catalog")]
    Parse(#[from] toml::de::Error),
    /// A generator setting is out of range.
    #[error("invalid generator setting `{field}`: {reason}")]
    InvalidSetting {
        /// Name of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Driver tuning, read from the `[generator]` table of a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Height of every chunk.
    pub chunk_height: f32,
    /// Content kept generated above the camera.
    pub generation_distance: f32,
    /// Chunks generated per check at most.
    pub max_chunks_per_frame: usize,
    /// Milliseconds between two generation checks.
    pub check_interval_ms: u64,
    /// Chunks generated eagerly at start-up.
    pub initial_chunks: usize,
    /// Multiple of `generation_distance` kept below the camera.
    pub cleanup_distance_factor: f32,
    /// Base seed every random stream is derived from.
    pub seed: u64,
    /// Policy for choosing the next Part.
    pub part_selection: PartSelection,
    /// Platform cap per chunk.
    pub max_platforms_per_chunk: usize,
    /// Loop cap per chunk.
    pub max_generation_loops: usize,
    /// Enables gap filling when present.
    pub gap_fill: Option<GapFillConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            chunk_height: 20.0,
            generation_distance: 30.0,
            max_chunks_per_frame: 2,
            check_interval_ms: 100,
            initial_chunks: 3,
            cleanup_distance_factor: DEFAULT_CLEANUP_DISTANCE_FACTOR,
            seed: DEFAULT_SEED,
            part_selection: PartSelection::RoundRobin,
            max_platforms_per_chunk: MAX_PLATFORMS_PER_CHUNK,
            max_generation_loops: MAX_GENERATION_LOOPS,
            gap_fill: None,
        }
    }
}

impl GeneratorConfig {
    /// Interval between two generation checks.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Per-chunk safety caps.
    #[must_use]
    pub const fn limits(&self) -> GenerationLimits {
        GenerationLimits {
            max_platforms_per_chunk: self.max_platforms_per_chunk,
            max_generation_loops: self.max_generation_loops,
        }
    }

    /// Rejects settings the driver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chunk_height.is_finite() || self.chunk_height <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "chunk_height",
                reason: "must be a positive number",
            });
        }
        if !self.generation_distance.is_finite() || self.generation_distance < 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "generation_distance",
                reason: "must be a non-negative number",
            });
        }
        if self.max_chunks_per_frame == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_chunks_per_frame",
                reason: "must be at least 1",
            });
        }
        if self.max_platforms_per_chunk == 0 || self.max_generation_loops == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_platforms_per_chunk",
                reason: "generation caps must be at least 1",
            });
        }
        Ok(())
    }
}

/// Authored catalog: generator settings plus the Parts to cycle through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Driver tuning.
    pub generator: GeneratorConfig,
    /// Parts in authored order.
    pub parts: Vec<Part>,
}

impl Catalog {
    /// Parses a catalog from TOML text and checks its generator settings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let catalog: Self = toml::from_str(contents)?;
        catalog.generator.validate()?;
        Ok(catalog)
    }

    /// Reads and parses the catalog at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Catalog shipped with the generator.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CATALOG)
    }
}
