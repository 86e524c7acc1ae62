use budgetcore::engine::evaluator::{ChannelPrediction, PredictionResult};
use budgetcore::model::Allocation;
use budgetcore::prelude::{Objective, PlanResult};
use budgetcore::telemetry::Metrics;
use serde::{Deserialize, Serialize};

use crate::workflow::session::PlanningSession;

/// Everything a front end needs to redraw the planning screen.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub total_budget: f64,
    pub allocation: Allocation,
    pub prediction: PredictionResult,
    pub channels: Vec<ChannelPrediction>,
    pub locked: Vec<String>,
    pub metrics: Metrics,
}

impl SessionView {
    pub fn capture(session: &PlanningSession) -> PlanResult<Self> {
        Ok(Self {
            total_budget: session.total_budget(),
            allocation: session.working().clone(),
            prediction: session.prediction()?,
            channels: session.breakdown()?,
            locked: session.locks().iter().map(str::to_string).collect(),
            metrics: session.metrics(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub total_budget: Option<f64>,
    pub objective: String,
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub objective: Objective,
    pub allocation: Allocation,
    pub prediction: PredictionResult,
    pub improvement_percent: f64,
    pub applied: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedistributeRequest {
    pub total_budget: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpendRequest {
    pub spend: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveScenarioRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LockResponse {
    pub id: String,
    pub locked: bool,
    pub changed: bool,
}
