use crate::error::PrepError;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Anything that can be grouped by class key.
pub trait Keyed {
    fn class_key(&self) -> &str;
}

/// An item of the sampling pool. Identity is the source path: two items with
/// the same path are the same item.
pub trait PoolItem: Keyed {
    fn source_path(&self) -> &Path;
    /// Proxy for image quality; larger is better.
    fn quality_signal(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    Balanced,
    Quality,
    Random,
}

impl SamplingStrategy {
    pub const ALL: [SamplingStrategy; 3] = [
        SamplingStrategy::Balanced,
        SamplingStrategy::Quality,
        SamplingStrategy::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingStrategy::Balanced => "balanced",
            SamplingStrategy::Quality => "quality",
            SamplingStrategy::Random => "random",
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SamplingStrategy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(SamplingStrategy::Balanced),
            "quality" => Ok(SamplingStrategy::Quality),
            "random" => Ok(SamplingStrategy::Random),
            _ => Err(PrepError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Selects at most `target_size` items from `pool`. Returns fewer when the pool
/// is smaller than the target.
pub fn select_sample<T, R>(
    pool: &[T],
    target_size: usize,
    strategy: SamplingStrategy,
    rng: &mut R,
) -> Vec<T>
where
    T: PoolItem + Clone,
    R: Rng + ?Sized,
{
    let pool = dedup_by_path(pool);
    let selected = match strategy {
        SamplingStrategy::Balanced => balanced_sample(&pool, target_size, rng),
        SamplingStrategy::Quality => quality_sample(&pool, target_size),
        SamplingStrategy::Random => random_sample(&pool, target_size, rng),
    };
    debug!(
        "{strategy} sampling selected {} of {} (target {target_size})",
        selected.len(),
        pool.len()
    );
    selected
}

/// Groups items by class key. Groups come out in ascending key order so that a
/// seeded run visits them in the same order every time.
pub fn group_by_key<T: Keyed + Clone>(items: &[T]) -> BTreeMap<String, Vec<T>> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        groups
            .entry(item.class_key().to_string())
            .or_default()
            .push(item.clone());
    }
    groups
}

fn dedup_by_path<T: PoolItem + Clone>(pool: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    pool.iter()
        .filter(|item| seen.insert(item.source_path().to_path_buf()))
        .cloned()
        .collect()
}

fn balanced_sample<T, R>(pool: &[T], target_size: usize, rng: &mut R) -> Vec<T>
where
    T: PoolItem + Clone,
    R: Rng + ?Sized,
{
    let groups = group_by_key(pool);
    if groups.is_empty() || target_size == 0 {
        return Vec::new();
    }

    let per_group = (target_size / groups.len()).max(1);
    let mut selected: Vec<T> = Vec::new();
    for (key, members) in &groups {
        let count = per_group.min(members.len());
        debug!("class {key}: {count} of {} selected", members.len());
        selected.extend(members.choose_multiple(rng, count).cloned());
    }

    if selected.len() < target_size {
        let taken: HashSet<_> = selected
            .iter()
            .map(|item| item.source_path().to_path_buf())
            .collect();
        let remaining: Vec<&T> = pool
            .iter()
            .filter(|item| !taken.contains(item.source_path()))
            .collect();
        let missing = (target_size - selected.len()).min(remaining.len());
        selected.extend(
            remaining
                .choose_multiple(rng, missing)
                .map(|item| (*item).clone()),
        );
    } else if selected.len() > target_size {
        selected = selected
            .choose_multiple(rng, target_size)
            .cloned()
            .collect();
    }

    selected
}

fn quality_sample<T: PoolItem + Clone>(pool: &[T], target_size: usize) -> Vec<T> {
    let mut ranked: Vec<&T> = pool.iter().collect();
    // Stable sort keeps encounter order among equal signals.
    ranked.sort_by(|a, b| b.quality_signal().cmp(&a.quality_signal()));
    ranked.into_iter().take(target_size).cloned().collect()
}

fn random_sample<T, R>(pool: &[T], target_size: usize, rng: &mut R) -> Vec<T>
where
    T: PoolItem + Clone,
    R: Rng + ?Sized,
{
    let count = target_size.min(pool.len());
    pool.choose_multiple(rng, count).cloned().collect()
}
