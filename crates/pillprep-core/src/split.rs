use crate::error::{PrepError, PrepResult};
use crate::model::Split;
use crate::sample::{group_by_key, Keyed};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const RATIO_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, val: f64, test: f64) -> PrepResult<Self> {
        let ratios = Self { train, val, test };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn validate(&self) -> PrepResult<()> {
        for (name, r) in [("train", self.train), ("val", self.val), ("test", self.test)] {
            if !(0.0..=1.0).contains(&r) {
                return Err(PrepError::config(format!(
                    "{name} ratio must be within [0, 1], got {r}"
                )));
            }
        }
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(PrepError::config(format!(
                "split ratios must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitAssignment<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

impl<T> SplitAssignment<T> {
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Split, &T)> + '_ {
        Split::ALL
            .into_iter()
            .flat_map(move |split| self.get(split).iter().map(move |item| (split, item)))
    }
}

/// Partitions `items` per class key. Flooring remainders land in `test`.
pub fn stratified_split<T, R>(items: &[T], ratios: &SplitRatios, rng: &mut R) -> SplitAssignment<T>
where
    T: Keyed + Clone,
    R: Rng + ?Sized,
{
    let mut train = Vec::new();
    let mut val = Vec::new();
    let mut test = Vec::new();

    for (_, mut group) in group_by_key(items) {
        group.shuffle(rng);

        let n = group.len();
        let train_end = ((n as f64 * ratios.train).floor() as usize).min(n);
        let val_end = (train_end + (n as f64 * ratios.val).floor() as usize).min(n);

        let mut rest = group.split_off(train_end);
        let tail = rest.split_off(val_end - train_end);
        train.extend(group);
        val.extend(rest);
        test.extend(tail);
    }

    train.shuffle(rng);
    val.shuffle(rng);
    test.shuffle(rng);

    SplitAssignment { train, val, test }
}
