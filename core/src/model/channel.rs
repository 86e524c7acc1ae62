use serde::{Deserialize, Serialize};

use crate::model::curve::{CurvePoint, ResponseCurve};
use crate::prelude::{PlanError, PlanResult};

/// A marketing channel with its bounds, baseline metrics and response curve.
///
/// Channels are read-only inputs to the engine; nothing in this crate mutates
/// one after it has been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub min_spend: f64,
    pub max_spend: f64,
    pub current_spend: f64,
    pub current_roi: f64,
    pub current_incremental: f64,
    pub curve: ResponseCurve,
}

impl Channel {
    /// Builds a channel whose baseline metrics are read off its own curve.
    pub fn from_curve(
        id: impl Into<String>,
        min_spend: f64,
        max_spend: f64,
        current_spend: f64,
        curve: ResponseCurve,
    ) -> PlanResult<Self> {
        let id = id.into();
        let baseline = *curve.lookup(current_spend).map_err(|err| attach(err, &id))?;
        let channel = Self {
            name: id.clone(),
            id,
            color: None,
            min_spend,
            max_spend,
            current_spend,
            current_roi: baseline.roi,
            current_incremental: baseline.incremental,
            curve,
        };
        channel.validate()?;
        Ok(channel)
    }

    pub fn validate(&self) -> PlanResult<()> {
        let valid = self.min_spend.is_finite()
            && self.max_spend.is_finite()
            && self.min_spend >= 0.0
            && self.min_spend <= self.max_spend;
        if !valid {
            return Err(PlanError::InvalidBounds {
                channel: self.id.clone(),
                min: self.min_spend,
                max: self.max_spend,
            });
        }
        if self.current_spend.is_nan() || self.current_spend < 0.0 {
            return Err(PlanError::InvalidSpend {
                channel: Some(self.id.clone()),
                spend: self.current_spend,
            });
        }
        Ok(())
    }

    /// Curve lookup with the channel id attached to any error.
    pub fn lookup(&self, spend: f64) -> PlanResult<&CurvePoint> {
        self.curve.lookup(spend).map_err(|err| attach(err, &self.id))
    }

    pub fn clamp(&self, spend: f64) -> f64 {
        spend.max(self.min_spend).min(self.max_spend)
    }

    /// Baseline incremental outcome per unit of baseline spend, 0 without spend.
    pub fn baseline_efficiency(&self) -> f64 {
        if self.current_spend > 0.0 {
            self.current_incremental / self.current_spend
        } else {
            0.0
        }
    }
}

fn attach(err: PlanError, id: &str) -> PlanError {
    match err {
        PlanError::InvalidSpend { channel: None, spend } => PlanError::InvalidSpend {
            channel: Some(id.to_string()),
            spend,
        },
        other => other,
    }
}

/// Finds a channel by id in a catalog slice.
pub fn find<'a>(channels: &'a [Channel], id: &str) -> PlanResult<&'a Channel> {
    channels
        .iter()
        .find(|channel| channel.id == id)
        .ok_or_else(|| PlanError::UnknownChannel(id.to_string()))
}
