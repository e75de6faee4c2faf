//! Report data model returned by the comparison workflow.
//!
//! `ComparisonReport` carries every grid a comparison produced together with
//! the gamma summary and a per-stage `TimingBreakdown`; `ReportSummary` is
//! the same without the grids, for batch logs and CLI output.

pub mod report;
pub mod timing;

pub use report::{ComparisonReport, ReportSummary};
pub use timing::{StageTiming, TimingBreakdown};
