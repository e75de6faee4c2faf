//! Wall-clock timings attached to a [`ComparisonReport`](super::ComparisonReport).
//!
//! `Comparison::run` records the stages `referenceMudensity`,
//! `evaluationMudensity`, `difference` and `gamma`, in that order.
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Milliseconds spent in one named comparison stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    /// Stage name, e.g. `gamma`.
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Stage timings of one comparison in execution order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    /// Whole run including side preparation, so at least the sum of `stages`.
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    /// Append a stage measured elsewhere.
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Run `f`, record its duration under `label`, and pass its output through.
    pub fn time<T>(&mut self, label: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.push(label, elapsed_ms(start));
        out
    }

    /// First stage recorded under `label`.
    pub fn stage(&self, label: &str) -> Option<&StageTiming> {
        self.stages.iter().find(|s| s.label == label)
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_records_stage_and_returns_value() {
        let mut timing = TimingBreakdown::default();
        let v = timing.time("square", || 7 * 7);
        assert_eq!(v, 49);
        assert_eq!(timing.stages.len(), 1);
        assert!(timing.stage("square").unwrap().elapsed_ms >= 0.0);
        assert!(timing.stage("missing").is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let mut timing = TimingBreakdown::with_total(2.5);
        timing.push("gamma", 1.0);
        let json = serde_json::to_string(&timing).unwrap();
        assert!(json.contains("\"totalMs\":2.5"));
        assert!(json.contains("\"elapsedMs\":1.0"));
    }
}
