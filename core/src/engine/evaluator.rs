use serde::{Deserialize, Serialize};

use crate::math::stats::StatsHelper;
use crate::model::channel::{self, Channel};
use crate::model::Allocation;
use crate::prelude::{Objective, PlanResult};

/// Aggregate metrics predicted for one allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub total_spend: f64,
    pub total_incremental: f64,
    pub total_roi: f64,
}

impl PredictionResult {
    /// The figure an objective is judged by.
    pub fn metric(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Incremental => self.total_incremental,
            Objective::Roi | Objective::Efficiency => self.total_roi,
        }
    }
}

/// Row of the what-if table for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPrediction {
    pub id: String,
    pub spend: f64,
    pub incremental: f64,
    pub roi: f64,
    pub change_percent: Option<f64>,
}

/// Totals spend and looked-up incremental outcome over every entry of `allocation`.
pub fn evaluate(allocation: &Allocation, channels: &[Channel]) -> PlanResult<PredictionResult> {
    let mut total_spend = 0.0;
    let mut total_incremental = 0.0;

    for (id, spend) in allocation.iter() {
        let point = channel::find(channels, id)?.lookup(spend)?;
        total_incremental += point.incremental;
        total_spend += spend;
    }

    Ok(PredictionResult {
        total_spend,
        total_incremental,
        total_roi: StatsHelper::ratio_or_zero(total_incremental, total_spend),
    })
}

/// Per-channel view in catalog order; channels missing from the allocation show zero spend.
pub fn breakdown(allocation: &Allocation, channels: &[Channel]) -> PlanResult<Vec<ChannelPrediction>> {
    channels
        .iter()
        .map(|channel| {
            let spend = allocation.spend_of(&channel.id);
            let point = channel.lookup(spend)?;
            Ok(ChannelPrediction {
                id: channel.id.clone(),
                spend,
                incremental: point.incremental,
                roi: point.roi,
                change_percent: StatsHelper::percent_change(channel.current_spend, spend),
            })
        })
        .collect()
}
