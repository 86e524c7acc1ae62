use serde::{Deserialize, Serialize};

use crate::prelude::{PlanError, PlanResult};

/// Allowed drift of a sample's spend from `i * step`, relative to `step`.
const SPACING_TOLERANCE: f64 = 1e-6;

/// One tabulated sample of a channel's response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub spend: f64,
    pub roi: f64,
    pub incremental: f64,
}

impl CurvePoint {
    pub fn new(spend: f64, roi: f64, incremental: f64) -> Self {
        Self {
            spend,
            roi,
            incremental,
        }
    }
}

/// Immutable spend-to-outcome table sampled every `step` units of spend.
///
/// Point `i` describes spend `i * step` and `incremental` never decreases
/// along the table. Lookups return the
/// nearest sample at or below the requested spend and saturate at the last
/// point instead of extrapolating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurve")]
pub struct ResponseCurve {
    step: f64,
    points: Vec<CurvePoint>,
}

#[derive(Deserialize)]
struct RawCurve {
    step: f64,
    points: Vec<CurvePoint>,
}

impl TryFrom<RawCurve> for ResponseCurve {
    type Error = PlanError;

    fn try_from(raw: RawCurve) -> Result<Self, Self::Error> {
        ResponseCurve::new(raw.step, raw.points)
    }
}

impl ResponseCurve {
    pub fn new(step: f64, points: Vec<CurvePoint>) -> PlanResult<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(PlanError::InvalidCurve(format!("step must be positive, got {step}")));
        }
        if points.is_empty() {
            return Err(PlanError::InvalidCurve("curve has no points".into()));
        }
        let tolerance = step * SPACING_TOLERANCE;
        if let Some((index, point)) = points
            .iter()
            .enumerate()
            .find(|(index, point)| (point.spend - *index as f64 * step).abs() > tolerance)
        {
            return Err(PlanError::InvalidCurve(format!(
                "point {index} at spend {} does not sit on step {step}",
                point.spend
            )));
        }
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].incremental < pair[0].incremental)
        {
            return Err(PlanError::InvalidCurve(format!(
                "incremental decreases at point {}",
                index + 1
            )));
        }
        Ok(Self { step, points })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Step-wise lookup: `points[floor(spend / step)]`, clamped to the table.
    pub fn lookup(&self, spend: f64) -> PlanResult<&CurvePoint> {
        if spend.is_nan() || spend < 0.0 {
            return Err(PlanError::InvalidSpend {
                channel: None,
                spend,
            });
        }
        let last = self.points.len() - 1;
        let index = (spend / self.step).floor();
        let index = if index >= last as f64 {
            last
        } else {
            index as usize
        };
        Ok(&self.points[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_curve() -> ResponseCurve {
        let points = (0..=5)
            .map(|i| {
                let spend = i as f64 * 10_000.0;
                CurvePoint::new(spend, 2.0, spend * 2.0)
            })
            .collect();
        ResponseCurve::new(10_000.0, points).unwrap()
    }

    #[test]
    fn lookup_uses_nearest_lower_sample() {
        let curve = linear_curve();
        assert_eq!(curve.lookup(0.0).unwrap().incremental, 0.0);
        assert_eq!(curve.lookup(19_999.0).unwrap().incremental, 20_000.0);
        assert_eq!(curve.lookup(20_000.0).unwrap().incremental, 40_000.0);
    }

    #[test]
    fn lookup_saturates_at_last_point() {
        let curve = linear_curve();
        assert_eq!(curve.lookup(1_000_000.0).unwrap().spend, 50_000.0);
        assert_eq!(curve.lookup(f64::INFINITY).unwrap().spend, 50_000.0);
    }

    #[test]
    fn lookup_rejects_negative_spend() {
        let curve = linear_curve();
        assert!(matches!(
            curve.lookup(-1.0),
            Err(PlanError::InvalidSpend { channel: None, .. })
        ));
        assert!(curve.lookup(f64::NAN).is_err());
    }

    #[test]
    fn lookup_is_monotone_for_non_decreasing_samples() {
        let curve = linear_curve();
        let mut previous = 0.0;
        for spend in (0..80).map(|i| i as f64 * 1_250.0) {
            let incremental = curve.lookup(spend).unwrap().incremental;
            assert!(incremental >= previous);
            previous = incremental;
        }
    }

    #[test]
    fn construction_validates_shape() {
        assert!(ResponseCurve::new(0.0, vec![CurvePoint::new(0.0, 0.0, 0.0)]).is_err());
        assert!(ResponseCurve::new(1.0, Vec::new()).is_err());
        let unordered = vec![CurvePoint::new(10.0, 1.0, 10.0), CurvePoint::new(0.0, 0.0, 0.0)];
        assert!(matches!(
            ResponseCurve::new(10.0, unordered),
            Err(PlanError::InvalidCurve(_))
        ));
    }

    #[test]
    fn points_off_the_step_grid_are_rejected() {
        let points = vec![
            CurvePoint::new(0.0, 0.0, 0.0),
            CurvePoint::new(8_000.0, 2.0, 16_000.0),
            CurvePoint::new(16_000.0, 2.0, 32_000.0),
        ];
        assert!(matches!(
            ResponseCurve::new(10_000.0, points.clone()),
            Err(PlanError::InvalidCurve(_))
        ));
        let curve = ResponseCurve::new(8_000.0, points).unwrap();
        assert_eq!(curve.lookup(16_000.0).unwrap().spend, 16_000.0);

        let shifted = vec![CurvePoint::new(500.0, 2.0, 1_000.0)];
        assert!(ResponseCurve::new(8_000.0, shifted).is_err());
    }

    #[test]
    fn falling_incremental_is_rejected() {
        let points = vec![
            CurvePoint::new(0.0, 0.0, 0.0),
            CurvePoint::new(8_000.0, 2.0, 16_000.0),
            CurvePoint::new(16_000.0, 2.0, 32_000.0),
            CurvePoint::new(24_000.0, 1.0, 24_000.0),
        ];
        let err = ResponseCurve::new(8_000.0, points).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidCurve("incremental decreases at point 3".into())
        );
    }

    #[test]
    fn deserialization_runs_validation() {
        let bad = r#"{"step": 1000.0, "points": []}"#;
        assert!(serde_json::from_str::<ResponseCurve>(bad).is_err());

        let good = r#"{"step": 1000.0, "points": [{"spend": 0.0, "roi": 0.0, "incremental": 0.0}]}"#;
        let curve: ResponseCurve = serde_json::from_str(good).unwrap();
        assert_eq!(curve.len(), 1);
    }
}
