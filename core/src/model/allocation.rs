use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::channel::Channel;
use crate::prelude::{PlanError, PlanResult};

/// Spend per channel id. Always replaced wholesale by engine operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation(BTreeMap<String, f64>);

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every channel at its baseline `current_spend`.
    pub fn baseline(channels: &[Channel]) -> Self {
        Self(
            channels
                .iter()
                .map(|channel| (channel.id.clone(), channel.current_spend))
                .collect(),
        )
    }

    /// Every channel at its `min_spend`.
    pub fn minimums(channels: &[Channel]) -> Self {
        Self(
            channels
                .iter()
                .map(|channel| (channel.id.clone(), channel.min_spend))
                .collect(),
        )
    }

    pub fn set(&mut self, id: impl Into<String>, spend: f64) -> PlanResult<()> {
        let id = id.into();
        if spend.is_nan() || spend < 0.0 {
            return Err(PlanError::InvalidSpend {
                channel: Some(id),
                spend,
            });
        }
        self.0.insert(id, spend);
        Ok(())
    }

    pub fn with(mut self, id: impl Into<String>, spend: f64) -> PlanResult<Self> {
        self.set(id, spend)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    /// Spend for `id`, treating a missing entry as no spend.
    pub fn spend_of(&self, id: &str) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, spend)| (id.as_str(), *spend))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Allocation {
    type Item = (&'a String, &'a f64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
