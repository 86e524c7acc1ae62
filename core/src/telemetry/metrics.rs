use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters for engine calls made through a planning session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub evaluations: usize,
    pub optimizations: usize,
    pub redistributions: usize,
    pub errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_evaluation(&self) {
        self.update(|metrics| metrics.evaluations += 1);
    }

    pub fn record_optimization(&self) {
        self.update(|metrics| metrics.optimizations += 1);
    }

    pub fn record_redistribution(&self) {
        self.update(|metrics| metrics.redistributions += 1);
    }

    pub fn record_error(&self) {
        self.update(|metrics| metrics.errors += 1);
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Metrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_each_kind() {
        let recorder = MetricsRecorder::new();
        recorder.record_evaluation();
        recorder.record_evaluation();
        recorder.record_optimization();
        recorder.record_error();
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.evaluations, 2);
        assert_eq!(snapshot.optimizations, 1);
        assert_eq!(snapshot.redistributions, 0);
        assert_eq!(snapshot.errors, 1);
    }
}
