#![doc = include_str!("../README.md")]

// Core data model and computations
pub mod angle;
pub mod delivery;
pub mod error;
pub mod fluence;
pub mod gamma;
pub mod grid;

// Workflow, memoisation and reports
pub mod cache;
pub mod comparison;
pub mod diagnostics;

// Tooling surface used by the binary
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::comparison::{Comparison, ComparisonInput, ComparisonJob};
pub use crate::delivery::{metersets, DeliveryRecord, GantryMask};
pub use crate::diagnostics::{ComparisonReport, ReportSummary};
pub use crate::error::{QaError, QaResult};
pub use crate::fluence::{mudensity, mudensity_batch, segment_mudensities};
pub use crate::gamma::{gamma, GammaComparator, GammaOptions, GammaResult, GammaSummary};
pub use crate::grid::{DensityGrid, GridGeometry, GridSpace};

// --- Prelude ---------------------------------------------------------------

/// Common imports for building and comparing deliveries.
pub mod prelude {
    pub use crate::cache::QaCache;
    pub use crate::grid::{GridView, GridViewMut};
    pub use crate::{
        Comparison, ComparisonInput, DeliveryRecord, DensityGrid, GammaOptions, GantryMask,
        GridSpace, QaError, QaResult,
    };
}
