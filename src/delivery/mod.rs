//! Delivery records and the pure views derived from them.
//!
//! - [`record`] – the immutable control-point record and its validation.
//! - [`gantry`] – angle-proximity masking and per-angle segment split.
//! - [`meterset`] – per-control-point MU increments.
//!
//! Masking and meterset extraction are independent pure functions; callers
//! compose them (`metersets(&mask.mask(&record))`) instead of sharing state.
pub mod gantry;
pub mod meterset;
pub mod record;

pub use self::gantry::{
    gantry_tolerance_from_angles, mask, GantryMask, DERIVED_TOLERANCE_MARGIN_DEG,
    UNBOUNDED_TOLERANCE_DEG,
};
pub use self::meterset::metersets;
pub use self::record::{ControlPoint, DeliveryRecord, JawPair, LeafPair};
