use anyhow::Context;
use budgetcore::engine::optimizer::DEFAULT_INCREMENT;
use budgetcore::model::Channel;
use budgetcore::prelude::Objective;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::catalog::{build_channels, default_catalog, ChannelEntry};

fn default_objective() -> String {
    Objective::Roi.to_string()
}

fn default_increment() -> f64 {
    DEFAULT_INCREMENT
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanConfig {
    pub total_budget: f64,
    #[serde(default = "default_objective")]
    pub objective: String,
    #[serde(default = "default_increment")]
    pub increment: f64,
    #[serde(default)]
    pub locked: Vec<String>,
    #[serde(default)]
    pub optimize_delay_ms: u64,
    #[serde(default = "default_catalog")]
    pub channels: Vec<ChannelEntry>,
}

impl PlanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading plan config {}", path_ref.display()))?;
        let config: PlanConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing plan config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(total_budget: f64, objective: &str, increment: f64, locked: Vec<String>) -> Self {
        Self {
            total_budget,
            objective: objective.to_string(),
            increment,
            locked,
            optimize_delay_ms: 0,
            channels: default_catalog(),
        }
    }

    /// Command-line values take precedence over the plan file; locks are added.
    pub fn with_overrides(
        mut self,
        total_budget: Option<f64>,
        objective: Option<&str>,
        increment: Option<f64>,
        locked: &[String],
    ) -> Self {
        if let Some(budget) = total_budget {
            self.total_budget = budget;
        }
        if let Some(objective) = objective {
            self.objective = objective.to_string();
        }
        if let Some(increment) = increment {
            self.increment = increment;
        }
        self.locked.extend(locked.iter().cloned());
        self
    }

    pub fn objective(&self) -> anyhow::Result<Objective> {
        self.objective
            .parse()
            .with_context(|| format!("objective in plan config: {}", self.objective))
    }

    pub fn build_channels(&self) -> anyhow::Result<Vec<Channel>> {
        build_channels(&self.channels).context("building channel catalog")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_uses_default_catalog() {
        let cfg = PlanConfig::from_args(900_000.0, "incremental", 10_000.0, vec!["tv".into()]);
        assert_eq!(cfg.objective().unwrap(), Objective::Incremental);
        assert_eq!(cfg.build_channels().unwrap().len(), 5);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"total_budget: 550000\n\
              objective: incremental\n\
              locked: [b]\n\
              channels:\n  \
                - id: a\n    min_spend: 50000\n    max_spend: 500000\n    current_spend: 100000\n  \
                - id: b\n    min_spend: 30000\n    max_spend: 400000\n    current_spend: 50000\n    profile:\n      step: 8000\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = PlanConfig::load(&path).unwrap();
        assert_eq!(cfg.total_budget, 550_000.0);
        assert_eq!(cfg.increment, DEFAULT_INCREMENT);
        assert_eq!(cfg.locked, vec!["b".to_string()]);
        let channels = cfg.build_channels().unwrap();
        assert_eq!(channels[1].curve.step(), 8_000.0);
    }

    #[test]
    fn overrides_replace_plan_file_values() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"total_budget: 550000\nincrement: 5000\nlocked: [tv]\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = PlanConfig::load(&path)
            .unwrap()
            .with_overrides(None, Some("efficiency"), Some(20_000.0), &["print".to_string()]);
        assert_eq!(cfg.total_budget, 550_000.0);
        assert_eq!(cfg.increment, 20_000.0);
        assert_eq!(cfg.objective().unwrap(), Objective::Efficiency);
        assert_eq!(cfg.locked, vec!["tv".to_string(), "print".to_string()]);

        let kept = PlanConfig::load(&path)
            .unwrap()
            .with_overrides(Some(700_000.0), None, None, &[]);
        assert_eq!(kept.total_budget, 700_000.0);
        assert_eq!(kept.increment, 5_000.0);
    }

    #[test]
    fn tabulated_channels_load_from_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"total_budget: 50000\n\
              channels:\n  \
                - id: radio\n    min_spend: 0\n    max_spend: 24000\n    current_spend: 8000\n    points:\n      \
                    - {spend: 0, roi: 0, incremental: 0}\n      \
                    - {spend: 8000, roi: 2, incremental: 16000}\n      \
                    - {spend: 16000, roi: 2, incremental: 32000}\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let channels = PlanConfig::load(&path).unwrap().build_channels().unwrap();
        assert_eq!(channels[0].curve.step(), 8_000.0);
        assert_eq!(channels[0].lookup(16_000.0).unwrap().incremental, 32_000.0);
    }

    #[test]
    fn unknown_objective_fails_to_resolve() {
        let cfg = PlanConfig::from_args(1.0, "reach", 10_000.0, Vec::new());
        assert!(cfg.objective().is_err());
    }
}
