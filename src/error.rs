//! Error kinds surfaced by the delivery/fluence/gamma core.
//!
//! All failures are local and synchronous: they are raised where a record is
//! constructed or a computation is requested and handed back to the caller
//! untouched. Nothing in the core retries or logs-and-continues.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QaError {
    /// Component sequences (or grids) disagree in length/shape.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Monitor units decrease, are non-finite, or a derived meterset is negative.
    #[error("Order error: {0}")]
    Order(String),

    /// A workflow step required at least one usable control point.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Invalid mask or gamma configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl QaError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub(crate) fn order(msg: impl Into<String>) -> Self {
        Self::Order(msg.into())
    }

    pub(crate) fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type QaResult<T> = Result<T, QaError>;
