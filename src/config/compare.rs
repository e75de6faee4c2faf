//! Runtime configuration of the `mudensity_compare` tool.
//!
//! ```json
//! {
//!   "reference": { "label": "plan", "deliveries": ["plan.json"] },
//!   "evaluation": {
//!     "label": "logfile",
//!     "deliveries": ["log_a.json", "log_b.json"],
//!     "gantryMask": { "angles": [90], "tolerance": 3 }
//!   },
//!   "gamma": { "dosePercentThreshold": 2, "distanceMmThreshold": 0.5 },
//!   "output": { "reportJson": "out/report.json" }
//! }
//! ```
use crate::cache::CacheConfig;
use crate::comparison::ComparisonInput;
use crate::delivery::GantryMask;
use crate::gamma::GammaOptions;
use crate::io::load_deliveries;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareToolConfig {
    pub reference: SideConfig,
    pub evaluation: SideConfig,
    #[serde(default)]
    pub gamma: GammaOptions,
    #[serde(default)]
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideConfig {
    #[serde(default)]
    pub label: Option<String>,
    pub deliveries: Vec<PathBuf>,
    #[serde(default)]
    pub gantry_mask: Option<GantryMask>,
}

impl SideConfig {
    /// Load the listed delivery files; relative paths resolve against `base`.
    pub fn load(&self, base: &Path, default_label: &str) -> Result<ComparisonInput, String> {
        let paths: Vec<PathBuf> = self.deliveries.iter().map(|p| base.join(p)).collect();
        let deliveries = load_deliveries(&paths)?;
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| default_label.to_string());
        Ok(ComparisonInput {
            label,
            deliveries,
            gantry_mask: self.gantry_mask.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub report_json: PathBuf,
    /// Include the four grids in the report; otherwise only the summary.
    pub include_grids: bool,
    /// Fail the run when the gamma pass fraction is below this value.
    pub min_pass_fraction: Option<f64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_json: PathBuf::from("mudensity_report.json"),
            include_grids: false,
            min_pass_fraction: None,
        }
    }
}

pub fn load_config(path: &Path) -> Result<CompareToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub(crate) fn parse_config(data: &str) -> Result<CompareToolConfig, serde_json::Error> {
    serde_json::from_str(data)
}
