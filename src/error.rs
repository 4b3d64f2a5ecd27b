//! Error types for the matching engine.

use std::io;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::command::{OrderId, RejectReason, Side};

/// Errors surfaced by engine operations.
///
/// Every variant except `Inconsistent` is raised before the book is touched,
/// so a failed call leaves the book exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("order {0} is already resting")]
    DuplicateOrderId(OrderId),

    #[error("invalid price: {0} (must be positive)")]
    InvalidPrice(Decimal),

    #[error("invalid volume: must be positive")]
    InvalidVolume,

    #[error("order capacity exhausted ({capacity} orders resting)")]
    CapacityExhausted { capacity: u32 },

    #[error("{side} level at {price} would exceed the maximum total volume")]
    VolumeOverflow { side: Side, price: Decimal },

    #[error("book inconsistent: {0}")]
    Inconsistent(String),
}

/// Errors reading a replay command file.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {action} is missing `{field}`")]
    MissingField {
        row: usize,
        action: &'static str,
        field: &'static str,
    },

    #[error("row {row}: cannot parse price {value:?}")]
    BadPrice { row: usize, value: String },
}

/// Errors loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("order_capacity {requested} exceeds the maximum of {max}")]
    CapacityTooLarge { requested: u32, max: u32 },
}

impl EngineError {
    /// Reject reason reported on the event stream, if this error rejects an order.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            EngineError::DuplicateOrderId(_) => Some(RejectReason::DuplicateOrderId),
            EngineError::InvalidPrice(_) => Some(RejectReason::InvalidPrice),
            EngineError::InvalidVolume => Some(RejectReason::InvalidVolume),
            EngineError::CapacityExhausted { .. } => Some(RejectReason::CapacityExhausted),
            EngineError::VolumeOverflow { .. } => Some(RejectReason::VolumeOverflow),
            EngineError::Inconsistent(_) => None,
        }
    }
}
