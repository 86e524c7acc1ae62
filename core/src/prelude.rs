use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Allocation, Channel};

/// Quantity the optimizer tries to maximize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Blended return on spend across all channels.
    Roi,
    /// Total incremental outcome.
    Incremental,
    /// Proportional split on baseline efficiency.
    Efficiency,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Roi, Objective::Incremental, Objective::Efficiency];

    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Roi => "roi",
            Objective::Incremental => "incremental",
            Objective::Efficiency => "efficiency",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = PlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Objective::ALL
            .into_iter()
            .find(|objective| objective.as_str() == normalized)
            .ok_or_else(|| PlanError::UnknownObjective(value.to_string()))
    }
}

/// Common error type for every engine operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(
        "invalid spend {}{}",
        .spend,
        .channel.as_ref().map(|id| format!(" for channel {id}")).unwrap_or_default()
    )]
    InvalidSpend { channel: Option<String>, spend: f64 },
    #[error("unknown objective: {0}")]
    UnknownObjective(String),
    #[error("baseline {0} is zero, improvement is undefined")]
    DegenerateBaseline(Objective),
    #[error("no unlocked channels to place remaining budget {remainder}")]
    EmptyChannelSet { remainder: f64 },
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("invalid bounds for channel {channel}: [{min}, {max}]")]
    InvalidBounds { channel: String, min: f64, max: f64 },
    #[error("invalid response curve: {0}")]
    InvalidCurve(String),
    #[error("invalid allocation increment: {0}")]
    InvalidIncrement(f64),
    #[error("scenario {0} not found")]
    ScenarioNotFound(u64),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// A way of turning a catalog and a budget into a fresh allocation.
pub trait AllocationStrategy {
    fn objective(&self) -> Objective;
    fn allocate(&self, channels: &[Channel], total_budget: f64) -> PlanResult<Allocation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_parses_known_names_case_insensitively() {
        assert_eq!("roi".parse::<Objective>().unwrap(), Objective::Roi);
        assert_eq!(" Incremental ".parse::<Objective>().unwrap(), Objective::Incremental);
        assert_eq!("EFFICIENCY".parse::<Objective>().unwrap(), Objective::Efficiency);
    }

    #[test]
    fn objective_rejects_unknown_names() {
        let err = "reach".parse::<Objective>().unwrap_err();
        assert_eq!(err, PlanError::UnknownObjective("reach".into()));
    }

    #[test]
    fn objective_display_round_trips() {
        for objective in Objective::ALL {
            assert_eq!(objective.to_string().parse::<Objective>().unwrap(), objective);
        }
    }
}
