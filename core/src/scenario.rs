//! Named allocations kept for later comparison or reload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::evaluator::PredictionResult;
use crate::model::Allocation;
use crate::prelude::{PlanError, PlanResult};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: u64,
    pub name: String,
    pub allocation: Allocation,
    pub total_budget: f64,
    pub predicted_roi: f64,
    pub predicted_incremental: f64,
    pub created_at: u64,
}

/// Spend difference for one channel between two scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDelta {
    pub id: String,
    pub left: f64,
    pub right: f64,
    pub delta: f64,
}

/// `right - left` for every headline figure and every channel either scenario funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub left: u64,
    pub right: u64,
    pub budget_delta: f64,
    pub roi_delta: f64,
    pub incremental_delta: f64,
    pub channels: Vec<ChannelDelta>,
}

impl ScenarioComparison {
    pub fn between(left: &Scenario, right: &Scenario) -> Self {
        let ids: BTreeSet<&str> = left
            .allocation
            .iter()
            .chain(right.allocation.iter())
            .map(|(id, _)| id)
            .collect();

        let channels = ids
            .into_iter()
            .map(|id| {
                let (l, r) = (left.allocation.spend_of(id), right.allocation.spend_of(id));
                ChannelDelta {
                    id: id.to_string(),
                    left: l,
                    right: r,
                    delta: r - l,
                }
            })
            .collect();

        Self {
            left: left.id,
            right: right.id,
            budget_delta: right.total_budget - left.total_budget,
            roi_delta: right.predicted_roi - left.predicted_roi,
            incremental_delta: right.predicted_incremental - left.predicted_incremental,
            channels,
        }
    }
}

/// Storage boundary for scenarios. The engine never calls this itself.
pub trait ScenarioStore {
    fn save(&mut self, name: &str, allocation: &Allocation, metrics: &PredictionResult) -> Scenario;
    fn list(&self) -> Vec<Scenario>;
    fn load(&self, id: u64) -> PlanResult<Scenario>;
    fn delete(&mut self, id: u64) -> PlanResult<Scenario>;

    fn compare(&self, left: u64, right: u64) -> PlanResult<ScenarioComparison> {
        Ok(ScenarioComparison::between(&self.load(left)?, &self.load(right)?))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryScenarioStore {
    next_id: u64,
    scenarios: Vec<Scenario>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut store: Self = serde_json::from_str(json)?;
        let highest = store.scenarios.iter().map(|s| s.id + 1).max().unwrap_or(0);
        store.next_id = store.next_id.max(highest);
        Ok(store)
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn save(&mut self, name: &str, allocation: &Allocation, metrics: &PredictionResult) -> Scenario {
        let scenario = Scenario {
            id: self.next_id,
            name: name.to_string(),
            allocation: allocation.clone(),
            total_budget: metrics.total_spend,
            predicted_roi: metrics.total_roi,
            predicted_incremental: metrics.total_incremental,
            created_at: now_secs(),
        };
        self.next_id += 1;
        self.scenarios.push(scenario.clone());
        scenario
    }

    fn list(&self) -> Vec<Scenario> {
        self.scenarios.clone()
    }

    fn load(&self, id: u64) -> PlanResult<Scenario> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.id == id)
            .cloned()
            .ok_or(PlanError::ScenarioNotFound(id))
    }

    fn delete(&mut self, id: u64) -> PlanResult<Scenario> {
        let index = self
            .scenarios
            .iter()
            .position(|scenario| scenario.id == id)
            .ok_or(PlanError::ScenarioNotFound(id))?;
        Ok(self.scenarios.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(spend: f64, incremental: f64) -> PredictionResult {
        PredictionResult {
            total_spend: spend,
            total_incremental: incremental,
            total_roi: incremental / spend,
        }
    }

    fn allocation(pairs: &[(&str, f64)]) -> Allocation {
        let mut allocation = Allocation::new();
        for (id, spend) in pairs {
            allocation.set(*id, *spend).unwrap();
        }
        allocation
    }

    #[test]
    fn save_list_load_delete() {
        let mut store = InMemoryScenarioStore::new();
        let first = store.save("baseline", &allocation(&[("tv", 100.0)]), &metrics(100.0, 300.0));
        let second = store.save("push", &allocation(&[("tv", 200.0)]), &metrics(200.0, 500.0));

        assert_ne!(first.id, second.id);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.load(second.id).unwrap().name, "push");
        assert_eq!(store.load(first.id).unwrap().predicted_roi, 3.0);

        assert_eq!(store.delete(first.id).unwrap().name, "baseline");
        assert_eq!(store.load(first.id), Err(PlanError::ScenarioNotFound(first.id)));
        assert!(store.delete(first.id).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn compare_reports_right_minus_left() {
        let mut store = InMemoryScenarioStore::new();
        let left = store.save(
            "left",
            &allocation(&[("tv", 100.0), ("search", 50.0)]),
            &metrics(150.0, 300.0),
        );
        let right = store.save(
            "right",
            &allocation(&[("tv", 80.0), ("social", 20.0)]),
            &metrics(100.0, 400.0),
        );

        let comparison = store.compare(left.id, right.id).unwrap();
        assert_eq!(comparison.budget_delta, -50.0);
        assert_eq!(comparison.incremental_delta, 100.0);
        assert_eq!(comparison.roi_delta, 2.0);
        let ids: Vec<_> = comparison.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["search", "social", "tv"]);
        assert_eq!(comparison.channels[0].delta, -50.0);
        assert_eq!(comparison.channels[2].delta, -20.0);
    }

    #[test]
    fn json_round_trip_keeps_ids_unique() {
        let mut store = InMemoryScenarioStore::new();
        store.save("one", &allocation(&[("tv", 1.0)]), &metrics(1.0, 2.0));
        let json = store.to_json().unwrap();

        let mut restored = InMemoryScenarioStore::from_json(&json).unwrap();
        assert_eq!(restored.list(), store.list());
        let next = restored.save("two", &allocation(&[("tv", 2.0)]), &metrics(2.0, 2.0));
        assert_eq!(next.id, 1);
    }
}
