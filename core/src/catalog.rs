//! Authored Part templates and the content rules attached to them.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PrefabId;

/// Configuration problems detected while validating authored catalog data.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CatalogError {
    /// The catalog holds no Parts at all.
    #[error("part catalog is empty")]
    EmptyCatalog,
    /// A Part cannot produce platforms.
    #[error("part `{part}` has no platform variants")]
    NoPlatformVariants {
        /// Name of the offending Part.
        part: String,
    },
    /// Every platform variant of a Part has an empty prefab or a weight that
    /// can never win a selection.
    #[error("part `{part}` has no selectable platform variant")]
    NoSelectableVariant {
        /// Name of the offending Part.
        part: String,
    },
    /// A Part's spacing range is empty, negative or non-finite.
    #[error("part `{part}` has an invalid spacing range {min}..={max}")]
    InvalidSpacing {
        /// Name of the offending Part.
        part: String,
        /// Authored minimum spacing.
        min: f32,
        /// Authored maximum spacing.
        max: f32,
    },
    /// A content rule references no payload.
    #[error("content rule #{rule} of part `{part}` has no prefab")]
    EmptyRulePrefab {
        /// Name of the Part owning the rule.
        part: String,
        /// Position of the rule within the Part.
        rule: usize,
    },
    /// A chained content rule has a negative or non-finite gap.
    #[error("content rule #{rule} of part `{part}` has an invalid chain gap")]
    InvalidChain {
        /// Name of the Part owning the rule.
        part: String,
        /// Position of the rule within the Part.
        rule: usize,
    },
    /// Every Part in the catalog failed validation.
    #[error("no part in the catalog passed validation")]
    NoValidParts,
}

/// How a Part decides how many platforms it generates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    /// The Part generates roughly `platform_count` platforms.
    #[default]
    Count,
    /// The Part generates enough platforms to cover `length` world units.
    Length,
}

/// Inclusive range of vertical distances between consecutive platforms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpacingRange {
    /// Smallest allowed spacing.
    pub min: f32,
    /// Largest allowed spacing.
    pub max: f32,
}

impl SpacingRange {
    /// Creates a spacing range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws a spacing uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    /// Mean of the range.
    #[must_use]
    pub fn average(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.max >= self.min
    }
}

impl Default for SpacingRange {
    fn default() -> Self {
        Self { min: 2.0, max: 3.0 }
    }
}

/// Inclusive range of spawn counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Smallest count.
    pub min: u32,
    /// Largest count.
    pub max: u32,
}

impl CountRange {
    /// Creates a count range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draws a count uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

/// Platform prefab a Part may pick from, with its relative weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformVariant {
    /// Payload materialized for the platform.
    pub prefab: PrefabId,
    /// Relative selection weight; entries with weight `<= 0` are never picked.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Half of the platform's horizontal extent, used to keep it inside the bounds.
    #[serde(default = "default_half_width")]
    pub half_width: f32,
}

impl PlatformVariant {
    /// Creates a variant with the default half width.
    #[must_use]
    pub fn new(prefab: impl Into<PrefabId>, weight: f32) -> Self {
        Self {
            prefab: prefab.into(),
            weight,
            half_width: default_half_width(),
        }
    }

    /// Whether weighted selection can ever pick the variant.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.prefab.is_empty() && self.weight.is_finite() && self.weight > 0.0
    }
}

/// Alternative payload for a content rule, with its relative weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefabVariant {
    /// Payload materialized when the variant is picked.
    pub prefab: PrefabId,
    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl PrefabVariant {
    /// Creates a weighted payload.
    #[must_use]
    pub fn new(prefab: impl Into<PrefabId>, weight: f32) -> Self {
        Self {
            prefab: prefab.into(),
            weight,
        }
    }
}

/// Category of auxiliary content attached to a Part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    /// Hostile actor.
    #[default]
    Enemy,
    /// Collectible that benefits the player.
    PowerUp,
    /// Static hazard.
    Obstacle,
    /// Purely cosmetic object.
    Decoration,
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Enemy => "enemy",
            Self::PowerUp => "power-up",
            Self::Obstacle => "obstacle",
            Self::Decoration => "decoration",
        };
        f.write_str(label)
    }
}

/// Horizontal placement strategy of released content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    /// Content is placed above the most recent platform.
    OverPlatform,
    /// Content is placed anywhere between the spawn boundaries.
    #[default]
    RandomAcrossScreen,
}

/// Horizontal mirroring policy of released content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    /// Never mirrored.
    #[default]
    None,
    /// Always mirrored.
    Fixed,
    /// Mirrored on a fair coin toss.
    Random,
}

impl FlipMode {
    /// Resolves the policy into a concrete flip decision.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> bool {
        match self {
            Self::None => false,
            Self::Fixed => true,
            Self::Random => rng.gen_bool(0.5),
        }
    }
}

/// How the members of a chain are spread horizontally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainSpacing {
    /// Members divide the spawn width into equal gaps.
    #[default]
    Even,
    /// Members are `gap` units apart, centred in the spawn width.
    Custom,
    /// Each gap is drawn from `min_gap..=max_gap`.
    Random,
}

/// Chain parameters of a content rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRule {
    /// Smallest number of chain members.
    pub min_length: u32,
    /// Largest number of chain members.
    pub max_length: u32,
    /// Spacing strategy.
    pub spacing: ChainSpacing,
    /// Gap used by [`ChainSpacing::Custom`].
    pub gap: f32,
    /// Smallest gap used by [`ChainSpacing::Random`].
    pub min_gap: f32,
    /// Largest gap used by [`ChainSpacing::Random`].
    pub max_gap: f32,
}

impl ChainRule {
    /// Draws the number of chain members.
    pub fn random_chain_length<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        CountRange::new(self.min_length, self.max_length)
            .sample(rng)
            .max(1)
    }

    fn has_valid_gaps(&self) -> bool {
        [self.gap, self.min_gap, self.max_gap]
            .iter()
            .all(|gap| gap.is_finite() && *gap >= 0.0)
    }
}

impl Default for ChainRule {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 4,
            spacing: ChainSpacing::Even,
            gap: 1.0,
            min_gap: 0.5,
            max_gap: 1.5,
        }
    }
}

/// Authored description of auxiliary objects attached to a Part.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSpawnRule {
    /// Category of the content.
    pub category: ContentCategory,
    /// Payload materialized when no weighted variant applies.
    pub prefab: PrefabId,
    /// Optional weighted alternatives to `prefab`.
    pub variants: Vec<PrefabVariant>,
    /// Number of individual items queued for a non-chained rule.
    pub count: CountRange,
    /// Horizontal placement strategy.
    pub positioning: Positioning,
    /// Mirroring policy.
    pub flip: FlipMode,
    /// Present when the rule spawns a whole chain as a single queued item.
    pub chain: Option<ChainRule>,
    /// Releases the content right after the Part's first platform instead of
    /// spreading it across the Part.
    pub spawn_before_part: bool,
}

impl ContentSpawnRule {
    /// Creates a single-item rule for `prefab`.
    #[must_use]
    pub fn new(category: ContentCategory, prefab: impl Into<PrefabId>) -> Self {
        Self {
            category,
            prefab: prefab.into(),
            ..Self::default()
        }
    }

    /// Reports whether the rule spawns chains.
    #[must_use]
    pub fn is_chain(&self) -> bool {
        self.chain.is_some()
    }

    /// Draws how many individual items the rule contributes.
    pub fn random_count<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.count.sample(rng)
    }

    /// Checks that the rule can materialize something.
    pub fn validate(&self, part: &str, rule: usize) -> Result<(), CatalogError> {
        let has_variant = self
            .variants
            .iter()
            .any(|variant| {
                !variant.prefab.is_empty() && variant.weight.is_finite() && variant.weight > 0.0
            });
        if self.prefab.is_empty() && !has_variant {
            return Err(CatalogError::EmptyRulePrefab {
                part: part.to_owned(),
                rule,
            });
        }
        if self.chain.as_ref().is_some_and(|chain| !chain.has_valid_gaps()) {
            return Err(CatalogError::InvalidChain {
                part: part.to_owned(),
                rule,
            });
        }
        Ok(())
    }
}

/// Authored template describing a run of platforms and the content attached to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Part {
    /// Display name.
    pub name: String,
    /// How the platform target is computed.
    pub size_mode: SizeMode,
    /// Platform target in [`SizeMode::Count`].
    pub platform_count: u32,
    /// Vertical length target in [`SizeMode::Length`].
    pub length: f32,
    /// Vertical distance between consecutive platforms.
    pub spacing: SpacingRange,
    /// Weighted platform prefabs.
    pub platform_variants: Vec<PlatformVariant>,
    /// Content attached to the Part.
    pub content_rules: Vec<ContentSpawnRule>,
    /// Lowest height at which height-gated selection may pick the Part.
    pub min_height: f32,
    /// Difficulty scalar reported to hosts.
    pub difficulty: f32,
}

impl Default for Part {
    fn default() -> Self {
        Self {
            name: String::from("part"),
            size_mode: SizeMode::Count,
            platform_count: 5,
            length: 15.0,
            spacing: SpacingRange::default(),
            platform_variants: Vec::new(),
            content_rules: Vec::new(),
            min_height: 0.0,
            difficulty: 1.0,
        }
    }
}

impl Part {
    /// Checks that the Part can produce platforms.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.platform_variants.is_empty() {
            return Err(CatalogError::NoPlatformVariants {
                part: self.name.clone(),
            });
        }
        if !self.platform_variants.iter().any(PlatformVariant::is_selectable) {
            return Err(CatalogError::NoSelectableVariant {
                part: self.name.clone(),
            });
        }

        if !self.spacing.is_valid() {
            return Err(CatalogError::InvalidSpacing {
                part: self.name.clone(),
                min: self.spacing.min,
                max: self.spacing.max,
            });
        }

        Ok(())
    }

    /// Content rules that passed validation; the others are logged and skipped.
    pub fn valid_content_rules(&self) -> impl Iterator<Item = &ContentSpawnRule> + '_ {
        self.content_rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| match rule.validate(&self.name, index) {
                Ok(()) => Some(rule),
                Err(error) => {
                    tracing::warn!(%error, "skipping content rule");
                    None
                }
            })
    }
}

/// Validates every Part, logging the invalid ones.
///
/// Returns the number of usable Parts.
pub fn validate_catalog(parts: &[Part]) -> Result<usize, CatalogError> {
    if parts.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }

    let mut valid = 0;
    for part in parts {
        match part.validate() {
            Ok(()) => valid += 1,
            Err(error) => tracing::warn!(%error, "part will be skipped"),
        }
    }

    if valid == 0 {
        return Err(CatalogError::NoValidParts);
    }
    Ok(valid)
}

fn default_weight() -> f32 {
    1.0
}

fn default_half_width() -> f32 {
    1.0
}
