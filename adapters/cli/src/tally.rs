//! Headless prefab sink that counts what the generator asked for.

use std::{collections::BTreeMap, fmt};

use ascent_core::{PrefabSink, SpawnKind, SpawnRequest};

/// Tallies materialization requests by kind and prefab.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    platforms: usize,
    content: BTreeMap<String, usize>,
}

impl PrefabSink for Tally {
    fn instantiate(&mut self, request: &SpawnRequest<'_>) {
        match request.kind {
            SpawnKind::Platform => self.platforms += 1,
            SpawnKind::Content(category) => {
                let key = format!("{category} `{}`", request.prefab);
                *self.content.entry(key).or_default() += 1;
            }
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} platforms spawned", self.platforms)?;
        for (key, count) in &self.content {
            write!(f, "\n  {count:>5} x {key}")?;
        }
        Ok(())
    }
}
