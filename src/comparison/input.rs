use crate::delivery::{DeliveryRecord, GantryMask};

/// One side of a comparison: a labelled set of deliveries and an optional
/// gantry mask applied to each of them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComparisonInput {
    pub label: String,
    pub deliveries: Vec<DeliveryRecord>,
    pub gantry_mask: Option<GantryMask>,
}

impl ComparisonInput {
    pub fn new(label: impl Into<String>, deliveries: Vec<DeliveryRecord>) -> Self {
        Self {
            label: label.into(),
            deliveries,
            gantry_mask: None,
        }
    }

    pub fn with_gantry_mask(mut self, mask: GantryMask) -> Self {
        self.gantry_mask = Some(mask);
        self
    }

    /// Deliveries after masking and control-point filtering; records left
    /// without control points are dropped. A masked record only carries the
    /// MU delivered inside the mask windows.
    pub fn prepared(&self) -> Vec<DeliveryRecord> {
        self.deliveries
            .iter()
            .map(|record| match &self.gantry_mask {
                Some(mask) => mask.masked_delivery(record),
                None => record.clone(),
            })
            .map(|record| record.filter_control_points())
            .filter(|record| !record.is_empty())
            .collect()
    }
}

/// Reference and evaluation inputs of one comparison.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComparisonJob {
    pub reference: ComparisonInput,
    pub evaluation: ComparisonInput,
}

impl ComparisonJob {
    pub fn new(reference: ComparisonInput, evaluation: ComparisonInput) -> Self {
        Self {
            reference,
            evaluation,
        }
    }
}
