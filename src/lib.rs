//! # lob-kernel
//!
//! A single-instrument limit order book with price-time priority matching.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the order book exclusively (no locks)
//! - **Price-Time Priority**: Best price first, oldest first within a price;
//!   trades execute at the resting order's price
//! - **Arena Allocation**: Orders live in a pre-allocated slab and are linked
//!   into their price level by `u32` index, giving O(1) cancel from any
//!   queue position without reference counting
//! - **All-or-nothing Operations**: Every call validates before it mutates
//!
//! ## Architecture
//!
//! ```text
//! [Producer] --> [SPSC Ring Buffer] --> [Engine Thread (Pinned)]
//!                                               |
//!                                 MatchingEngine: OrderBook + Arena
//!                                   bids/asks: BookSide -> PriceLevel
//!                                   OrderIndex: id -> (side, price, slot)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lob_kernel::{MatchingEngine, OrderId, Side};
//! use rust_decimal::Decimal;
//!
//! let mut engine = MatchingEngine::new(1_000);
//! engine.place(OrderId(1), Decimal::from(10), 5, Side::Buy).unwrap();
//! let trades = engine.place(OrderId(2), Decimal::from(10), 3, Side::Sell).unwrap();
//!
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].volume, 3);
//! assert_eq!(engine.get_resting_volume(Decimal::from(10), Side::Buy), 2);
//! ```

pub mod arena;
pub mod book_side;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod matching;
pub mod order_book;
pub mod order_index;
pub mod price_level;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use book_side::BookSide;
pub use command::{
    CancelOrder, Command, ModifyPrice, ModifyVolume, OrderAccepted, OrderCanceled, OrderId,
    OrderModified, OrderRejected, OutputEvent, PlaceOrder, RejectReason, Side, TradeEvent,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, EngineError, FeedError};
pub use matching::{MatchingEngine, RestingOrder};
pub use order_book::OrderBook;
pub use order_index::{OrderIndex, OrderLocation};
pub use price_level::PriceLevel;
