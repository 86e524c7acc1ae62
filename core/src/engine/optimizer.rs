use serde::{Deserialize, Serialize};

use crate::engine::evaluator::{evaluate, PredictionResult};
use crate::model::{Allocation, Channel};
use crate::prelude::{AllocationStrategy, Objective, PlanError, PlanResult};
use crate::telemetry::log::LogManager;

/// Default spend added per greedy step.
pub const DEFAULT_INCREMENT: f64 = 10_000.0;

/// Fresh allocation proposed by the optimizer together with its evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub objective: Objective,
    pub allocation: Allocation,
    pub prediction: PredictionResult,
    pub improvement_percent: f64,
}

fn validate_increment(increment: f64) -> PlanResult<f64> {
    if increment.is_finite() && increment > 0.0 {
        Ok(increment)
    } else {
        Err(PlanError::InvalidIncrement(increment))
    }
}

/// Greedy marginal-value search shared by the `roi` and `incremental` objectives.
///
/// Starts every channel at `min_spend` and repeatedly hands one increment to the
/// channel with the strictly largest positive marginal value. Ties go to the
/// channel that comes first in catalog order.
pub struct GreedyStrategy {
    objective: Objective,
    increment: f64,
    logger: LogManager,
}

impl GreedyStrategy {
    pub fn incremental(increment: f64) -> PlanResult<Self> {
        Self::with_objective(Objective::Incremental, increment)
    }

    pub fn roi(increment: f64) -> PlanResult<Self> {
        Self::with_objective(Objective::Roi, increment)
    }

    fn with_objective(objective: Objective, increment: f64) -> PlanResult<Self> {
        Ok(Self {
            objective,
            increment: validate_increment(increment)?,
            logger: LogManager::new("greedy"),
        })
    }

    /// Gain from advancing `channel` one increment past `spend`.
    pub fn marginal_value(&self, channel: &Channel, spend: f64) -> PlanResult<f64> {
        let now = channel.lookup(spend)?.incremental;
        let next = channel.lookup(spend + self.increment)?.incremental;
        let delta = next - now;
        Ok(match self.objective {
            Objective::Incremental => delta,
            _ => delta / self.increment,
        })
    }
}

impl AllocationStrategy for GreedyStrategy {
    fn objective(&self) -> Objective {
        self.objective
    }

    fn allocate(&self, channels: &[Channel], total_budget: f64) -> PlanResult<Allocation> {
        let mut spends: Vec<f64> = channels.iter().map(|channel| channel.min_spend).collect();
        let mut remaining = total_budget - spends.iter().sum::<f64>();

        if remaining <= 0.0 {
            self.logger.notice(&format!(
                "budget {:.2} does not cover channel minimums, returning minimum allocation",
                total_budget
            ));
            return Ok(Allocation::minimums(channels));
        }

        let mut steps = 0usize;
        while remaining > self.increment {
            let mut best: Option<(usize, f64)> = None;
            for (index, channel) in channels.iter().enumerate() {
                if spends[index] >= channel.max_spend {
                    continue;
                }
                let value = self.marginal_value(channel, spends[index])?;
                if value > 0.0 && best.map_or(true, |(_, top)| value > top) {
                    best = Some((index, value));
                }
            }

            let Some((index, value)) = best else {
                break;
            };
            let next = spends[index] + self.increment;
            if next > channels[index].max_spend {
                break;
            }

            spends[index] = next;
            remaining -= self.increment;
            steps += 1;
            self.logger.trace_step(&format!(
                "step {} -> {} at {:.2} (marginal {:.4}, remaining {:.2})",
                steps, channels[index].id, next, value, remaining
            ));
        }

        self.logger.record(&format!(
            "{} search placed {} increments, {:.2} unplaced",
            self.objective, steps, remaining
        ));

        let mut allocation = Allocation::new();
        for (channel, spend) in channels.iter().zip(spends) {
            allocation.set(channel.id.clone(), spend)?;
        }
        Ok(allocation)
    }
}

/// Closed-form split of the budget in proportion to baseline efficiency.
///
/// Each share is clamped to the channel bounds afterwards; the clamped total
/// is not reconciled with the budget.
pub struct EfficiencyStrategy {
    logger: LogManager,
}

impl EfficiencyStrategy {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("efficiency"),
        }
    }
}

impl Default for EfficiencyStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStrategy for EfficiencyStrategy {
    fn objective(&self) -> Objective {
        Objective::Efficiency
    }

    fn allocate(&self, channels: &[Channel], total_budget: f64) -> PlanResult<Allocation> {
        let total_efficiency: f64 = channels.iter().map(Channel::baseline_efficiency).sum();

        let mut allocation = Allocation::new();
        for channel in channels {
            let target = if total_efficiency > 0.0 {
                total_budget * (channel.baseline_efficiency() / total_efficiency)
            } else {
                0.0
            };
            allocation.set(channel.id.clone(), channel.clamp(target))?;
        }

        self.logger.record(&format!(
            "proportional split of {:.2} allocated {:.2}",
            total_budget,
            allocation.total()
        ));
        Ok(allocation)
    }
}

/// Entry point that picks the strategy for an objective and scores the result.
pub struct AllocationOptimizer {
    increment: f64,
    logger: LogManager,
}

impl AllocationOptimizer {
    pub fn new(increment: f64) -> PlanResult<Self> {
        Ok(Self {
            increment: validate_increment(increment)?,
            logger: LogManager::new("optimizer"),
        })
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn strategy(&self, objective: Objective) -> PlanResult<Box<dyn AllocationStrategy>> {
        Ok(match objective {
            Objective::Roi => Box::new(GreedyStrategy::roi(self.increment)?),
            Objective::Incremental => Box::new(GreedyStrategy::incremental(self.increment)?),
            Objective::Efficiency => Box::new(EfficiencyStrategy::new()),
        })
    }

    /// Produces a new allocation for `objective` and its improvement over `current`.
    pub fn optimize(
        &self,
        channels: &[Channel],
        current: &Allocation,
        total_budget: f64,
        objective: Objective,
    ) -> PlanResult<OptimizationResult> {
        let baseline = evaluate(current, channels)?.metric(objective);
        if baseline == 0.0 {
            return Err(PlanError::DegenerateBaseline(objective));
        }

        let allocation = self.strategy(objective)?.allocate(channels, total_budget)?;
        let prediction = evaluate(&allocation, channels)?;
        let improvement_percent = (prediction.metric(objective) - baseline) / baseline * 100.0;

        self.logger.record(&format!(
            "{} optimization: spend {:.2}, incremental {:.2}, improvement {:.2}%",
            objective, prediction.total_spend, prediction.total_incremental, improvement_percent
        ));

        Ok(OptimizationResult {
            objective,
            allocation,
            prediction,
            improvement_percent,
        })
    }

    /// Same as [`optimize`](Self::optimize) with the objective given by name.
    pub fn optimize_named(
        &self,
        channels: &[Channel],
        current: &Allocation,
        total_budget: f64,
        objective: &str,
    ) -> PlanResult<OptimizationResult> {
        self.optimize(channels, current, total_budget, objective.parse()?)
    }
}

impl Default for AllocationOptimizer {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            logger: LogManager::new("optimizer"),
        }
    }
}
