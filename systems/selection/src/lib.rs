#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted random selection shared by platform, enemy and power-up variant picks.

use rand::Rng;

/// Candidate payload paired with its relative weight.
///
/// Entries without a payload, or with a weight that is not strictly positive,
/// never win a selection.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedEntry<T> {
    payload: Option<T>,
    weight: f32,
}

impl<T> WeightedEntry<T> {
    /// Creates an entry carrying `payload`.
    #[must_use]
    pub const fn new(payload: T, weight: f32) -> Self {
        Self {
            payload: Some(payload),
            weight,
        }
    }

    /// Creates an entry without payload, which selection always skips.
    #[must_use]
    pub const fn empty(weight: f32) -> Self {
        Self {
            payload: None,
            weight,
        }
    }

    /// Payload carried by the entry.
    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Relative weight of the entry.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }
}

/// Picks one of `items` with probability proportional to `weight`.
///
/// Items whose weight is `<= 0` or not finite are ignored. Returns `None`
/// when nothing remains.
pub fn select_weighted<'a, T, I, W, R>(items: I, weight: W, rng: &mut R) -> Option<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    W: Fn(&T) -> f32,
    R: Rng + ?Sized,
{
    let candidates = items
        .into_iter()
        .map(|item| (item, weight(item)))
        .collect();
    pick(candidates, rng)
}

/// Picks the payload of one of `entries`, skipping empty payloads.
pub fn select_entry<'a, T, R>(entries: &'a [WeightedEntry<T>], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let candidates = entries
        .iter()
        .filter_map(|entry| entry.payload().map(|payload| (payload, entry.weight())))
        .collect();
    pick(candidates, rng)
}

fn pick<'a, T, R>(mut candidates: Vec<(&'a T, f32)>, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    candidates.retain(|(_, weight)| weight.is_finite() && *weight > 0.0);
    let (fallback, _) = *candidates.last()?;

    let total: f32 = candidates.iter().map(|(_, weight)| weight).sum();
    let draw = rng.gen::<f32>() * total;

    let mut cumulative = 0.0;
    for (item, weight) in &candidates {
        cumulative += weight;
        if cumulative >= draw {
            return Some(*item);
        }
    }

    // Rounding can leave the draw a hair above the accumulated total.
    Some(fallback)
}
