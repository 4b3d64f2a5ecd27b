//! Order Book - The central limit order book data structure.
//!
//! Holds the bid and ask [`BookSide`]s and the [`OrderIndex`]. Every path
//! that links or unlinks an order touches the level and the index in the
//! same method, so the two never disagree about which orders are resting.

use rust_decimal::Decimal;

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::book_side::BookSide;
use crate::command::{OrderId, Side};
use crate::error::EngineError;
use crate::order_index::{OrderIndex, OrderLocation};

pub struct OrderBook {
    /// Bid price levels (buy orders)
    pub bids: BookSide,
    /// Ask price levels (sell orders)
    pub asks: BookSide,
    /// Order lookup: OrderId -> OrderLocation
    index: OrderIndex,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            index: OrderIndex::new(),
        }
    }

    /// Create a new order book with pre-allocated index capacity
    pub fn with_capacity(orders: usize) -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            index: OrderIndex::with_capacity(orders),
        }
    }

    // ========================================================================
    // Side Access
    // ========================================================================

    #[inline]
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    pub fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Get the best bid price (highest buy price)
    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    /// Get the best ask price (lowest sell price)
    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Rest an allocated, populated node in the book.
    ///
    /// The node's `order_id`, `side`, `price` and `volume` must be set.
    ///
    /// # Returns
    /// `true` if the order was added, `false` if its id is already resting
    /// (nothing is modified in that case).
    pub fn add_order(&mut self, arena: &mut Arena, arena_index: ArenaIndex) -> bool {
        let node = arena.get(arena_index);
        debug_assert!(node.volume > 0, "resting order must have volume");
        let (order_id, side, price) = (node.order_id, node.side, node.price);

        let location = OrderLocation {
            arena_index,
            side,
            price,
        };
        if !self.index.insert(order_id, location) {
            return false;
        }

        self.side_mut(side)
            .level_at(price)
            .push_back(arena, arena_index);

        true
    }

    /// Unlink an order from its level and the index.
    ///
    /// Evicts the level if it became empty. The arena node is NOT freed.
    ///
    /// # Returns
    /// The removed order's location, or `None` if not resting
    pub fn remove_order(&mut self, arena: &mut Arena, order_id: OrderId) -> Option<OrderLocation> {
        let location = self.index.remove(order_id)?;
        let book_side = self.side_mut(location.side);

        if let Some(level) = book_side.level_mut(location.price) {
            if level.remove(arena, location.arena_index) {
                book_side.evict_if_empty(location.price);
            }
        }

        Some(location)
    }

    /// Set a resting order's volume in place (no requeue).
    ///
    /// # Returns
    /// `false` if the order is not resting.
    pub fn set_volume(&mut self, arena: &mut Arena, order_id: OrderId, new_volume: u64) -> bool {
        debug_assert!(new_volume > 0, "zero volume must go through remove_order");
        let Some(location) = self.index.get(order_id).copied() else {
            return false;
        };
        match self.side_mut(location.side).level_mut(location.price) {
            Some(level) => {
                level.adjust_volume(arena, location.arena_index, new_volume);
                true
            }
            None => false,
        }
    }

    /// Look up an order by ID.
    #[inline]
    pub fn get_order(&self, order_id: OrderId) -> Option<&OrderLocation> {
        self.index.get(order_id)
    }

    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.index.contains(order_id)
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the total number of resting orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Clear all levels and index entries.
    ///
    /// Arena nodes are not touched; the caller owns their release.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.index.clear();
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Get (total volume, order count) at a price level
    pub fn depth_at(&self, side: Side, price: Decimal) -> (u64, u32) {
        self.side(side)
            .level(price)
            .map(|l| (l.total_volume, l.count))
            .unwrap_or((0, 0))
    }

    /// Verify the structural invariants of the book.
    ///
    /// Checks that no level is empty, every level's total and count match
    /// its queue, queue links are symmetric, every queued order has positive
    /// volume and agrees with its level on side and price, and the index
    /// holds exactly the queued orders with matching locations.
    pub fn audit(&self, arena: &Arena) -> Result<(), EngineError> {
        let mut queued = 0usize;

        for book_side in [&self.bids, &self.asks] {
            for level in book_side.iter_best_first() {
                if level.is_empty() {
                    return Err(inconsistent(format!(
                        "empty {} level at {} retained",
                        book_side.side(),
                        level.price
                    )));
                }

                let mut count = 0u32;
                let mut total = 0u64;
                let mut prev = NULL_INDEX;
                for idx in level.iter(arena) {
                    let node = arena.get(idx);
                    if node.prev != prev {
                        return Err(inconsistent(format!(
                            "broken back link at order {}",
                            node.order_id
                        )));
                    }
                    if node.volume == 0 {
                        return Err(inconsistent(format!(
                            "order {} rests with zero volume",
                            node.order_id
                        )));
                    }
                    if node.side != book_side.side() || node.price != level.price {
                        return Err(inconsistent(format!(
                            "order {} ({} @ {}) queued in {} level {}",
                            node.order_id,
                            node.side,
                            node.price,
                            book_side.side(),
                            level.price
                        )));
                    }
                    let expected = OrderLocation {
                        arena_index: idx,
                        side: node.side,
                        price: node.price,
                    };
                    match self.index.get(node.order_id) {
                        Some(location) if *location == expected => {}
                        Some(location) => {
                            return Err(inconsistent(format!(
                                "index entry for order {} points at {:?}",
                                node.order_id, location
                            )))
                        }
                        None => {
                            return Err(inconsistent(format!(
                                "order {} queued but not indexed",
                                node.order_id
                            )))
                        }
                    }
                    count += 1;
                    total += node.volume;
                    prev = idx;
                }

                if level.tail != prev {
                    return Err(inconsistent(format!("tail mismatch at level {}", level.price)));
                }
                if count != level.count || total != level.total_volume {
                    return Err(inconsistent(format!(
                        "level {} reports {} orders / {} volume, queue holds {} / {}",
                        level.price, level.count, level.total_volume, count, total
                    )));
                }
                queued += count as usize;
            }
        }

        if queued != self.index.len() {
            return Err(inconsistent(format!(
                "{} orders queued but {} indexed",
                queued,
                self.index.len()
            )));
        }

        Ok(())
    }
}

fn inconsistent(message: String) -> EngineError {
    EngineError::Inconsistent(message)
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.index.len())
            .finish()
    }
}
