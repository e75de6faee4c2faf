//! Per-control-point monitor-unit increments.
use crate::error::{QaError, QaResult};

use super::DeliveryRecord;

/// Incremental MU attributable to each control point.
///
/// The first entry is `monitor_units[0]` (masking may have removed the true
/// zero origin), the rest are consecutive differences. A negative increment
/// means the record was built without validation upstream and fails with
/// [`QaError::Order`].
pub fn metersets(record: &DeliveryRecord) -> QaResult<Vec<f64>> {
    metersets_from_monitor_units(record.monitor_units())
}

pub(crate) fn metersets_from_monitor_units(mu: &[f64]) -> QaResult<Vec<f64>> {
    let mut out = Vec::with_capacity(mu.len());
    let mut prev = 0.0;
    for (i, &m) in mu.iter().enumerate() {
        let delta = if i == 0 { m } else { m - prev };
        if delta < 0.0 || !delta.is_finite() {
            return Err(QaError::order(format!(
                "negative meterset {delta} at control point {i}"
            )));
        }
        out.push(delta);
        prev = m;
    }
    Ok(out)
}
