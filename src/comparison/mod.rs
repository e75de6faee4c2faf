//! Reference vs evaluation comparison workflow.
//!
//! Stages per run
//! - prepare each side: apply its gantry mask, filter idle control points,
//!   drop records left empty;
//! - accumulate the MU density of each side (summing all its deliveries);
//! - difference `evaluation - reference`;
//! - gamma of evaluation against reference.
//!
//! A side without deliveries, or whose deliveries have no control point left
//! after masking, fails with [`QaError::EmptyInput`]. Runs share nothing but
//! the read-only grid space and the optional [`QaCache`], so
//! [`Comparison::compare_batch`] executes jobs in parallel.
pub mod input;

pub use input::{ComparisonInput, ComparisonJob};

use crate::cache::QaCache;
use crate::delivery::DeliveryRecord;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{ComparisonReport, TimingBreakdown};
use crate::error::{QaError, QaResult};
use crate::fluence::mudensity;
use crate::gamma::{GammaComparator, GammaOptions, GammaResult};
use crate::grid::{DensityGrid, GridSpace};
use log::debug;
use rayon::prelude::*;
use std::time::Instant;

pub struct Comparison<'a> {
    comparator: GammaComparator<'a>,
    cache: Option<QaCache>,
}

impl Comparison<'static> {
    /// Comparison on the standard grid space.
    pub fn standard(gamma_options: GammaOptions) -> QaResult<Self> {
        Self::new(GridSpace::standard(), gamma_options)
    }
}

impl<'a> Comparison<'a> {
    pub fn new(space: &'a GridSpace, gamma_options: GammaOptions) -> QaResult<Self> {
        Ok(Self {
            comparator: GammaComparator::new(space, gamma_options)?,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: QaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn space(&self) -> &GridSpace {
        self.comparator.space()
    }

    pub fn gamma_options(&self) -> &GammaOptions {
        self.comparator.options()
    }

    pub fn cache(&self) -> Option<&QaCache> {
        self.cache.as_ref()
    }

    pub fn run(
        &self,
        reference: &ComparisonInput,
        evaluation: &ComparisonInput,
    ) -> QaResult<ComparisonReport> {
        let total_start = Instant::now();
        let mut timing = TimingBreakdown::default();

        let reference_records = prepare_side(reference, "reference")?;
        let evaluation_records = prepare_side(evaluation, "evaluation")?;

        let reference_grid = timing.time("referenceMudensity", || {
            self.side_mudensity(&reference_records)
        })?;
        let evaluation_grid = timing.time("evaluationMudensity", || {
            self.side_mudensity(&evaluation_records)
        })?;
        let difference = timing.time("difference", || evaluation_grid.difference(&reference_grid))?;
        let gamma = timing.time("gamma", || self.gamma(&reference_grid, &evaluation_grid))?;

        timing.total_ms = elapsed_ms(total_start);
        debug!(
            "Comparison: {} vs {}: pass {:.2}% over {} cells, max |diff| {:.3} MU ({:.1} ms)",
            reference.label,
            evaluation.label,
            gamma.summary.pass_fraction * 100.0,
            gamma.summary.evaluated,
            difference.max_abs(),
            timing.total_ms
        );

        Ok(ComparisonReport {
            reference_label: reference.label.clone(),
            evaluation_label: evaluation.label.clone(),
            reference_control_points: control_point_count(&reference_records),
            evaluation_control_points: control_point_count(&evaluation_records),
            max_abs_difference: difference.max_abs(),
            reference: reference_grid,
            evaluation: evaluation_grid,
            difference,
            gamma,
            timing,
        })
    }

    pub fn run_job(&self, job: &ComparisonJob) -> QaResult<ComparisonReport> {
        self.run(&job.reference, &job.evaluation)
    }

    /// Run independent jobs in parallel; results keep the order of `jobs`.
    pub fn compare_batch(&self, jobs: &[ComparisonJob]) -> Vec<QaResult<ComparisonReport>> {
        debug!("Comparison: batch of {} jobs", jobs.len());
        jobs.par_iter().map(|job| self.run_job(job)).collect()
    }

    fn side_mudensity(&self, records: &[DeliveryRecord]) -> QaResult<DensityGrid> {
        let space = self.comparator.space();
        let mut total = space.zeros();
        for record in records {
            match &self.cache {
                Some(cache) => {
                    let grid = cache.mudensity.mudensity(record, space)?;
                    total.accumulate(grid.as_ref())?;
                }
                None => total.accumulate(&mudensity(record, space)?)?,
            }
        }
        Ok(total)
    }

    fn gamma(&self, reference: &DensityGrid, evaluation: &DensityGrid) -> QaResult<GammaResult> {
        match &self.cache {
            Some(cache) => {
                let result = cache.gamma.gamma(&self.comparator, reference, evaluation)?;
                Ok(GammaResult::clone(&result))
            }
            None => self.comparator.compare(reference, evaluation),
        }
    }
}

fn prepare_side(input: &ComparisonInput, side: &str) -> QaResult<Vec<DeliveryRecord>> {
    if input.deliveries.is_empty() {
        return Err(QaError::empty_input(format!(
            "{side} '{}' has no deliveries",
            input.label
        )));
    }
    let records = input.prepared();
    if records.is_empty() {
        return Err(QaError::empty_input(format!(
            "{side} '{}' has no control points left after masking",
            input.label
        )));
    }
    debug!(
        "Comparison: {side} '{}' uses {}/{} deliveries, {} control points",
        input.label,
        records.len(),
        input.deliveries.len(),
        control_point_count(&records)
    );
    Ok(records)
}

fn control_point_count(records: &[DeliveryRecord]) -> usize {
    records.iter().map(DeliveryRecord::len).sum()
}
