use super::TimingBreakdown;
use crate::gamma::{GammaResult, GammaSummary};
use crate::grid::DensityGrid;
use serde::Serialize;

/// Full output of one reference/evaluation comparison.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub reference_label: String,
    pub evaluation_label: String,
    /// Control points that contributed on each side after masking and filtering.
    pub reference_control_points: usize,
    pub evaluation_control_points: usize,
    pub reference: DensityGrid,
    pub evaluation: DensityGrid,
    /// `evaluation - reference`
    pub difference: DensityGrid,
    pub max_abs_difference: f32,
    pub gamma: GammaResult,
    pub timing: TimingBreakdown,
}

impl ComparisonReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            reference_label: self.reference_label.clone(),
            evaluation_label: self.evaluation_label.clone(),
            reference_control_points: self.reference_control_points,
            evaluation_control_points: self.evaluation_control_points,
            max_abs_difference: self.max_abs_difference,
            gamma: self.gamma.summary.clone(),
            timing: self.timing.clone(),
        }
    }
}

/// Grid-free digest of a [`ComparisonReport`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub reference_label: String,
    pub evaluation_label: String,
    pub reference_control_points: usize,
    pub evaluation_control_points: usize,
    pub max_abs_difference: f32,
    pub gamma: GammaSummary,
    pub timing: TimingBreakdown,
}
