//! Command and Event types for the matching engine.
//!
//! Commands are inputs from an order-entry producer.
//! Events are what the engine reports back for each command.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Client-assigned order identifier, unique among resting orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// Place a new limit order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub side: Side,
    /// Limit price, must be positive
    pub price: Decimal,
    /// Order volume, must be positive
    pub volume: u64,
}

/// Cancel a resting order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelOrder {
    pub order_id: OrderId,
}

/// Move a resting order to a new price (loses time priority)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModifyPrice {
    pub order_id: OrderId,
    pub new_price: Decimal,
}

/// Change the remaining volume of a resting order in place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModifyVolume {
    pub order_id: OrderId,
    /// New remaining volume; 0 cancels the order
    pub new_volume: u64,
}

/// Input commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Place(PlaceOrder),
    Cancel(CancelOrder),
    ModifyPrice(ModifyPrice),
    ModifyVolume(ModifyVolume),
}

// ============================================================================
// Output Events
// ============================================================================

/// A trade was executed.
///
/// Always priced at the resting order's limit price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Engine-wide trade sequence number, strictly increasing
    pub seq: u64,
    /// Execution price
    pub price: Decimal,
    /// Executed volume
    pub volume: u64,
    /// Passive order that was resting in the book
    pub resting_order_id: OrderId,
    /// Aggressive order that triggered the match
    pub incoming_order_id: OrderId,
    /// Side of the incoming order
    pub incoming_side: Side,
}

/// Order (or its remainder) is now resting in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderAccepted {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    /// Volume left resting after any immediate matching
    pub volume: u64,
}

/// Order was removed from the book by a cancel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderCanceled {
    pub order_id: OrderId,
    /// Remaining volume that was canceled
    pub canceled_volume: u64,
}

/// Resting order's volume was changed in place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderModified {
    pub order_id: OrderId,
    pub new_volume: u64,
}

/// Order was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderRejected {
    pub order_id: OrderId,
    pub reason: RejectReason,
}

/// Reasons for order rejection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RejectReason {
    /// Order ID already resting
    DuplicateOrderId = 0,
    /// Price is zero or negative
    InvalidPrice = 1,
    /// Volume is zero
    InvalidVolume = 2,
    /// Arena is full
    CapacityExhausted = 3,
    /// Resting volume at the order's level would overflow
    VolumeOverflow = 4,
}

/// Output events from the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    Trade(TradeEvent),
    Accepted(OrderAccepted),
    Canceled(OrderCanceled),
    Modified(OrderModified),
    Rejected(OrderRejected),
}
