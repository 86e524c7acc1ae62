use anyhow::Context;
use budgetcore::engine::evaluator::{self, ChannelPrediction, PredictionResult};
use budgetcore::engine::optimizer::{AllocationOptimizer, OptimizationResult};
use budgetcore::engine::{redistribute, LockSet};
use budgetcore::model::{channel, Allocation, Channel};
use budgetcore::prelude::{Objective, PlanResult};
use budgetcore::scenario::{InMemoryScenarioStore, Scenario, ScenarioComparison, ScenarioStore};
use budgetcore::telemetry::{LogManager, Metrics, MetricsRecorder};
use serde::Serialize;

use crate::workflow::config::PlanConfig;

/// Summary of a one-shot optimization run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub objective: Objective,
    pub total_budget: f64,
    pub baseline: PredictionResult,
    pub optimized: PredictionResult,
    pub improvement_percent: f64,
    pub allocation: Allocation,
    pub breakdown: Vec<ChannelPrediction>,
    pub comparison: ScenarioComparison,
}

/// Caller-side state around the engine: catalog, working allocation, locks and scenarios.
///
/// The working allocation is only ever replaced as a whole, and only after the
/// engine call producing its successor has succeeded.
pub struct PlanningSession {
    channels: Vec<Channel>,
    working: Allocation,
    locks: LockSet,
    total_budget: f64,
    optimizer: AllocationOptimizer,
    scenarios: InMemoryScenarioStore,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl PlanningSession {
    pub fn new(config: &PlanConfig) -> anyhow::Result<Self> {
        let channels = config.build_channels()?;
        let optimizer = AllocationOptimizer::new(config.increment).context("configuring optimizer")?;
        let mut session = Self {
            working: Allocation::baseline(&channels),
            channels,
            locks: LockSet::new(),
            total_budget: config.total_budget,
            optimizer,
            scenarios: InMemoryScenarioStore::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("session"),
        };
        for id in &config.locked {
            session
                .lock(id)
                .with_context(|| format!("locking channel {id} from config"))?;
        }
        Ok(session)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn working(&self) -> &Allocation {
        &self.working
    }

    pub fn locks(&self) -> &LockSet {
        &self.locks
    }

    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    fn track<T>(&self, result: PlanResult<T>) -> PlanResult<T> {
        if let Err(err) = &result {
            self.metrics.record_error();
            self.logger.notice(&format!("engine call failed: {err}"));
        }
        result
    }

    pub fn evaluate(&self, allocation: &Allocation) -> PlanResult<PredictionResult> {
        self.metrics.record_evaluation();
        self.track(evaluator::evaluate(allocation, &self.channels))
    }

    pub fn prediction(&self) -> PlanResult<PredictionResult> {
        self.evaluate(&self.working)
    }

    pub fn breakdown(&self) -> PlanResult<Vec<ChannelPrediction>> {
        self.track(evaluator::breakdown(&self.working, &self.channels))
    }

    /// Validates `allocation` against the catalog, then swaps it in.
    pub fn replace_allocation(&mut self, allocation: Allocation) -> PlanResult<PredictionResult> {
        let prediction = self.evaluate(&allocation)?;
        self.working = allocation;
        Ok(prediction)
    }

    pub fn set_spend(&mut self, id: &str, spend: f64) -> PlanResult<PredictionResult> {
        self.track(channel::find(&self.channels, id).map(|_| ()))?;
        let mut next = self.working.clone();
        self.track(next.set(id, spend))?;
        self.replace_allocation(next)
    }

    pub fn reset_to_baseline(&mut self) -> PlanResult<PredictionResult> {
        self.replace_allocation(Allocation::baseline(&self.channels))
    }

    /// Runs the optimizer against the working allocation without applying the result.
    pub fn optimize(&self, objective: Objective, total_budget: f64) -> PlanResult<OptimizationResult> {
        self.metrics.record_optimization();
        self.track(
            self.optimizer
                .optimize(&self.channels, &self.working, total_budget, objective),
        )
    }

    pub fn apply(&mut self, result: &OptimizationResult) -> PlanResult<PredictionResult> {
        self.replace_allocation(result.allocation.clone())
    }

    /// Splits the budget around the session locks and applies the outcome.
    pub fn redistribute(&mut self, total_budget: f64) -> PlanResult<PredictionResult> {
        self.metrics.record_redistribution();
        let next = self.track(redistribute(
            &self.channels,
            &self.working,
            &self.locks,
            total_budget,
        ))?;
        self.replace_allocation(next)
    }

    pub fn lock(&mut self, id: &str) -> PlanResult<bool> {
        self.track(channel::find(&self.channels, id))?;
        Ok(self.locks.lock(id))
    }

    pub fn unlock(&mut self, id: &str) -> PlanResult<bool> {
        self.track(channel::find(&self.channels, id))?;
        Ok(self.locks.unlock(id))
    }

    pub fn toggle_lock(&mut self, id: &str) -> PlanResult<bool> {
        self.track(channel::find(&self.channels, id))?;
        Ok(self.locks.toggle(id))
    }

    pub fn save_scenario(&mut self, name: &str) -> PlanResult<Scenario> {
        let prediction = self.prediction()?;
        let scenario = self.scenarios.save(name, &self.working, &prediction);
        self.logger
            .record(&format!("saved scenario {} ({})", scenario.id, scenario.name));
        Ok(scenario)
    }

    pub fn list_scenarios(&self) -> Vec<Scenario> {
        self.scenarios.list()
    }

    pub fn scenario(&self, id: u64) -> PlanResult<Scenario> {
        self.track(self.scenarios.load(id))
    }

    /// Makes a stored scenario the working allocation.
    pub fn load_scenario(&mut self, id: u64) -> PlanResult<Scenario> {
        let scenario = self.scenario(id)?;
        self.replace_allocation(scenario.allocation.clone())?;
        Ok(scenario)
    }

    pub fn delete_scenario(&mut self, id: u64) -> PlanResult<Scenario> {
        let result = self.scenarios.delete(id);
        self.track(result)
    }

    pub fn compare_scenarios(&self, left: u64, right: u64) -> PlanResult<ScenarioComparison> {
        self.track(self.scenarios.compare(left, right))
    }

    pub fn export_scenarios(&self) -> anyhow::Result<String> {
        self.scenarios.to_json().context("serializing scenarios")
    }

    /// Baseline scenario, optimization, apply, optimized scenario.
    pub fn execute(&mut self, objective: Objective) -> anyhow::Result<PlanReport> {
        let baseline = self.prediction().context("evaluating working allocation")?;
        let before = self.save_scenario("baseline").context("saving baseline scenario")?;

        let result = self
            .optimize(objective, self.total_budget)
            .with_context(|| format!("optimizing for {objective}"))?;
        self.apply(&result).context("applying optimized allocation")?;
        let after = self
            .save_scenario(&format!("optimized {objective}"))
            .context("saving optimized scenario")?;

        Ok(PlanReport {
            objective,
            total_budget: self.total_budget,
            baseline,
            optimized: result.prediction,
            improvement_percent: result.improvement_percent,
            allocation: result.allocation,
            breakdown: self.breakdown().context("building channel breakdown")?,
            comparison: self
                .compare_scenarios(before.id, after.id)
                .context("comparing scenarios")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetcore::prelude::PlanError;

    fn session() -> PlanningSession {
        let cfg = PlanConfig::from_args(680_000.0, "roi", 10_000.0, Vec::new());
        PlanningSession::new(&cfg).unwrap()
    }

    #[test]
    fn session_executes_plan() {
        let mut session = session();
        let report = session.execute(Objective::Incremental).unwrap();
        assert!(report.optimized.total_spend <= report.total_budget);
        assert!(report.improvement_percent >= 0.0);
        assert_eq!(session.working(), &report.allocation);
        assert_eq!(session.list_scenarios().len(), 2);
        assert_eq!(report.breakdown.len(), session.channels().len());
    }

    #[test]
    fn optimize_leaves_working_allocation_alone() {
        let session = session();
        let before = session.working().clone();
        session.optimize(Objective::Efficiency, 680_000.0).unwrap();
        assert_eq!(session.working(), &before);
        assert_eq!(session.metrics().optimizations, 1);
    }

    #[test]
    fn failed_edit_keeps_previous_allocation() {
        let mut session = session();
        let before = session.working().clone();
        assert!(session.set_spend("tv", -10.0).is_err());
        assert_eq!(
            session.set_spend("radio", 10.0),
            Err(PlanError::UnknownChannel("radio".into()))
        );
        assert_eq!(session.working(), &before);
        assert_eq!(session.metrics().errors, 2);
    }

    #[test]
    fn redistribute_respects_session_locks() {
        let mut session = session();
        assert!(session.lock("tv").unwrap());
        session.redistribute(600_000.0).unwrap();
        assert_eq!(session.working().spend_of("tv"), 200_000.0);
        assert_eq!(session.working().spend_of("digital"), 100_000.0);
        assert_eq!(session.working().total(), 600_000.0);
    }

    #[test]
    fn redistribute_with_all_locked_keeps_allocation() {
        let mut session = session();
        let ids: Vec<String> = session.channels().iter().map(|c| c.id.clone()).collect();
        for id in &ids {
            session.lock(id).unwrap();
        }
        let before = session.working().clone();
        assert!(matches!(
            session.redistribute(1_000_000.0),
            Err(PlanError::EmptyChannelSet { .. })
        ));
        assert_eq!(session.working(), &before);
    }

    #[test]
    fn scenarios_reload_into_working_allocation() {
        let mut session = session();
        let saved = session.save_scenario("start").unwrap();
        session.set_spend("tv", 300_000.0).unwrap();
        session.load_scenario(saved.id).unwrap();
        assert_eq!(session.working().spend_of("tv"), 200_000.0);
        assert!(session.load_scenario(99).is_err());
    }

    #[test]
    fn lock_rejects_unknown_channel() {
        let mut session = session();
        assert!(session.lock("radio").is_err());
        assert!(session.toggle_lock("search").unwrap());
        assert!(session.unlock("search").unwrap());
    }
}
