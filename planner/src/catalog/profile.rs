use anyhow::Context;
use budgetcore::model::{Channel, CurvePoint, ResponseCurve};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters for a synthetic diminishing-returns curve:
/// `incremental(s) = s * max(floor, base - ln(s / scale + 1) * decay)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveProfile {
    pub step: f64,
    pub base: f64,
    pub decay: f64,
    pub floor: f64,
    pub scale: f64,
    pub headroom: f64,
    pub jitter: f64,
    pub seed: u64,
}

impl Default for CurveProfile {
    fn default() -> Self {
        Self {
            step: 10_000.0,
            base: 5.5,
            decay: 0.8,
            floor: 0.5,
            scale: 10_000.0,
            headroom: 1.2,
            jitter: 0.0,
            seed: 0,
        }
    }
}

impl CurveProfile {
    fn roi_factor(&self, spend: f64) -> f64 {
        (self.base - (spend / self.scale + 1.0).ln() * self.decay).max(self.floor)
    }
}

/// Samples the profile every `step` from zero up to `max_spend * headroom`.
///
/// Jitter is multiplicative and seeded; samples never fall below their predecessor.
pub fn build_response_curve(profile: &CurveProfile, max_spend: f64) -> anyhow::Result<ResponseCurve> {
    anyhow::ensure!(
        profile.step.is_finite() && profile.step > 0.0,
        "curve step must be positive, got {}",
        profile.step
    );
    let span = (max_spend.max(profile.step) * profile.headroom.max(1.0) / profile.step).ceil();
    anyhow::ensure!(span.is_finite(), "curve span overflow for max spend {}", max_spend);
    let sample_count = (span as usize)
        .checked_add(1)
        .context("overflow computing curve sample count")?;

    let mut rng = StdRng::seed_from_u64(profile.seed);
    let mut points = Vec::with_capacity(sample_count);
    let mut previous = 0.0_f64;

    for index in 0..sample_count {
        let spend = index as f64 * profile.step;
        let mut incremental = spend * profile.roi_factor(spend);
        if profile.jitter > 0.0 {
            incremental *= 1.0 + rng.gen_range(-profile.jitter..profile.jitter);
        }
        incremental = incremental.max(previous);
        previous = incremental;

        let roi = if spend > 0.0 { incremental / spend } else { 0.0 };
        points.push(CurvePoint::new(spend, roi, incremental));
    }

    ResponseCurve::new(profile.step, points).context("building response curve")
}

/// Catalog entry: bounds, baseline and either tabulated points or a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub min_spend: f64,
    pub max_spend: f64,
    pub current_spend: f64,
    #[serde(default)]
    pub current_roi: Option<f64>,
    #[serde(default)]
    pub current_incremental: Option<f64>,
    #[serde(default)]
    pub profile: CurveProfile,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<CurvePoint>,
}

impl ChannelEntry {
    /// Spacing of tabulated points, read from the first gap. A single point
    /// falls back to the profile step.
    fn tabulated_step(&self) -> f64 {
        match self.points.as_slice() {
            [first, second, ..] => second.spend - first.spend,
            _ => self.profile.step,
        }
    }

    pub fn build(&self) -> anyhow::Result<Channel> {
        let curve = if self.points.is_empty() {
            build_response_curve(&self.profile, self.max_spend)
        } else {
            ResponseCurve::new(self.tabulated_step(), self.points.clone())
                .context("validating tabulated curve points")
        }
        .with_context(|| format!("curve for channel {}", self.id))?;

        let mut channel = Channel::from_curve(
            self.id.clone(),
            self.min_spend,
            self.max_spend,
            self.current_spend,
            curve,
        )
        .with_context(|| format!("building channel {}", self.id))?;

        if let Some(name) = &self.name {
            channel.name = name.clone();
        }
        channel.color = self.color.clone();
        if let Some(roi) = self.current_roi {
            channel.current_roi = roi;
        }
        if let Some(incremental) = self.current_incremental {
            channel.current_incremental = incremental;
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_curve_follows_log_decay_formula() {
        let curve = build_response_curve(&CurveProfile::default(), 500_000.0).unwrap();
        assert!(curve.len() >= 61);
        let point = curve.lookup(50_000.0).unwrap();
        let expected = 50_000.0 * (5.5 - (6.0_f64).ln() * 0.8);
        assert!((point.incremental - expected).abs() < 1e-6);
        assert!((point.roi - expected / 50_000.0).abs() < 1e-12);
        assert_eq!(curve.lookup(0.0).unwrap().roi, 0.0);
    }

    #[test]
    fn jittered_curves_are_seeded_and_monotone() {
        let profile = CurveProfile {
            step: 8_000.0,
            jitter: 0.2,
            seed: 7,
            ..Default::default()
        };
        let first = build_response_curve(&profile, 400_000.0).unwrap();
        let second = build_response_curve(&profile, 400_000.0).unwrap();
        assert_eq!(first, second);
        assert!(first
            .points()
            .windows(2)
            .all(|pair| pair[1].incremental >= pair[0].incremental));
    }

    #[test]
    fn channel_entry_overrides_baseline_metrics() {
        let entry = ChannelEntry {
            id: "tv".into(),
            name: Some("Television".into()),
            color: Some("#1f77b4".into()),
            min_spend: 50_000.0,
            max_spend: 500_000.0,
            current_spend: 200_000.0,
            current_roi: Some(2.5),
            current_incremental: None,
            profile: CurveProfile::default(),
            points: Vec::new(),
        };
        let channel = entry.build().unwrap();
        assert_eq!(channel.name, "Television");
        assert_eq!(channel.current_roi, 2.5);
        let looked_up = channel.lookup(200_000.0).unwrap().incremental;
        assert_eq!(channel.current_incremental, looked_up);
    }

    fn tabulated_entry(points: Vec<CurvePoint>) -> ChannelEntry {
        ChannelEntry {
            id: "radio".into(),
            name: None,
            color: None,
            min_spend: 0.0,
            max_spend: 24_000.0,
            current_spend: 8_000.0,
            current_roi: None,
            current_incremental: None,
            profile: CurveProfile::default(),
            points,
        }
    }

    #[test]
    fn tabulated_points_set_their_own_step() {
        let entry = tabulated_entry(vec![
            CurvePoint::new(0.0, 0.0, 0.0),
            CurvePoint::new(8_000.0, 2.0, 16_000.0),
            CurvePoint::new(16_000.0, 2.0, 32_000.0),
            CurvePoint::new(24_000.0, 2.0, 48_000.0),
        ]);
        let channel = entry.build().unwrap();
        assert_eq!(channel.curve.step(), 8_000.0);
        assert_eq!(channel.lookup(16_000.0).unwrap().spend, 16_000.0);
        assert_eq!(channel.current_incremental, 16_000.0);
    }

    #[test]
    fn uneven_or_falling_tabulated_points_are_rejected() {
        let uneven = tabulated_entry(vec![
            CurvePoint::new(0.0, 0.0, 0.0),
            CurvePoint::new(8_000.0, 2.0, 16_000.0),
            CurvePoint::new(20_000.0, 2.0, 40_000.0),
        ]);
        assert!(uneven.build().is_err());

        let falling = tabulated_entry(vec![
            CurvePoint::new(0.0, 0.0, 0.0),
            CurvePoint::new(8_000.0, 2.0, 16_000.0),
            CurvePoint::new(16_000.0, 2.0, 32_000.0),
            CurvePoint::new(24_000.0, 1.0, 24_000.0),
        ]);
        assert!(falling.build().is_err());
    }

    #[test]
    fn zero_step_profile_is_rejected() {
        let profile = CurveProfile {
            step: 0.0,
            ..Default::default()
        };
        assert!(build_response_curve(&profile, 100_000.0).is_err());
    }
}
