//! Matching Engine - Core order matching algorithm.
//!
//! Implements the cross/rest algorithm:
//! 1. CROSSING: Match the incoming order against the opposite side, best
//!    price first and oldest first within a price, trading at the resting
//!    order's price
//! 2. RESTING: Place remaining volume in the book
//!
//! Every operation validates its inputs and reserves any arena slot it needs
//! before the first mutation, so a rejected call leaves the book untouched.

use log::{debug, trace};
use rust_decimal::Decimal;

use crate::arena::{Arena, ArenaIndex, OrderNode};
use crate::command::{OrderId, Side, TradeEvent};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::order_book::OrderBook;

/// Snapshot of a resting order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    /// Remaining volume
    pub volume: u64,
    /// Arrival sequence; lower is older within a level
    pub seq: u64,
}

impl From<&OrderNode> for RestingOrder {
    fn from(node: &OrderNode) -> Self {
        Self {
            order_id: node.order_id,
            side: node.side,
            price: node.price,
            volume: node.volume,
            seq: node.seq,
        }
    }
}

/// The matching engine core
pub struct MatchingEngine {
    /// Memory arena for order nodes
    pub arena: Arena,
    /// The limit order book
    pub book: OrderBook,
    /// Last arrival sequence handed out
    order_seq: u64,
    /// Last trade sequence handed out
    trade_seq: u64,
}

impl MatchingEngine {
    /// Create a new matching engine with the specified order capacity
    pub fn new(capacity: u32) -> Self {
        Self::with_config(EngineConfig::with_capacity(capacity))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            arena: Arena::new(config.order_capacity),
            book: OrderBook::with_capacity(config.index_capacity),
            order_seq: 0,
            trade_seq: 0,
        }
    }

    /// Place a limit order.
    ///
    /// # Algorithm
    /// 1. Validate price, volume, id uniqueness and room at the order's own
    ///    level; reserve an arena slot
    /// 2. Cross against the opposite side while marketable
    /// 3. If volume remains, rest the order in the book
    ///
    /// # Returns
    /// Trades generated by this order, in execution order
    pub fn place(
        &mut self,
        order_id: OrderId,
        price: Decimal,
        volume: u64,
        side: Side,
    ) -> Result<Vec<TradeEvent>, EngineError> {
        if price <= Decimal::ZERO {
            debug!("reject {order_id}: non-positive price {price}");
            return Err(EngineError::InvalidPrice(price));
        }
        if volume == 0 {
            debug!("reject {order_id}: zero volume");
            return Err(EngineError::InvalidVolume);
        }
        if self.book.contains_order(order_id) {
            debug!("reject {order_id}: duplicate id");
            return Err(EngineError::DuplicateOrderId(order_id));
        }
        // An own-side level at `price` means the order cannot cross, so it
        // would rest there with its full volume
        self.check_level_room(side, price, 0, volume)?;
        let Some(arena_idx) = self.arena.alloc() else {
            debug!("reject {order_id}: arena full");
            return Err(EngineError::CapacityExhausted {
                capacity: self.arena.capacity(),
            });
        };

        let seq = self.next_order_seq();
        *self.arena.get_mut(arena_idx) = OrderNode::new(order_id, side, price, volume, seq);

        let mut trades = Vec::new();
        self.match_and_rest(arena_idx, &mut trades);
        Ok(trades)
    }

    /// Cancel a resting order.
    ///
    /// Unknown ids are ignored: late cancels racing a fill are normal.
    ///
    /// # Returns
    /// The canceled remaining volume, or `None` if the id was not resting
    pub fn cancel(&mut self, order_id: OrderId) -> Option<u64> {
        let location = self.book.remove_order(&mut self.arena, order_id)?;
        let canceled = self.arena.get(location.arena_index).volume;
        self.arena.free(location.arena_index);
        debug!("canceled {order_id}: {canceled} @ {}", location.price);
        Some(canceled)
    }

    /// Move a resting order to `new_price`.
    ///
    /// The order leaves its level, loses time priority, and is re-run through
    /// the full cross/rest pipeline with its remaining volume, so it may trade
    /// immediately. This holds even when `new_price` equals the old price.
    /// Unknown ids are a no-op.
    pub fn modify_price(
        &mut self,
        order_id: OrderId,
        new_price: Decimal,
    ) -> Result<Vec<TradeEvent>, EngineError> {
        let Some(&location) = self.book.get_order(order_id) else {
            return Ok(Vec::new());
        };
        if new_price <= Decimal::ZERO {
            debug!("reject modify {order_id}: non-positive price {new_price}");
            return Err(EngineError::InvalidPrice(new_price));
        }
        let volume = self.arena.get(location.arena_index).volume;
        let leaving = if location.price == new_price { volume } else { 0 };
        self.check_level_room(location.side, new_price, leaving, volume)?;

        self.book.remove_order(&mut self.arena, order_id);
        debug!("reprice {order_id}: {} -> {new_price}", location.price);

        let seq = self.next_order_seq();
        let node = self.arena.get_mut(location.arena_index);
        node.price = new_price;
        node.seq = seq;

        // Reuses the order's own slot, so this cannot run out of capacity
        let mut trades = Vec::new();
        self.match_and_rest(location.arena_index, &mut trades);
        Ok(trades)
    }

    /// Set a resting order's remaining volume in place.
    ///
    /// Keeps time priority whether the volume goes up or down and never
    /// triggers matching. A volume of 0 cancels the order.
    ///
    /// # Returns
    /// `Ok(false)` if the id was not resting
    pub fn modify_volume(
        &mut self,
        order_id: OrderId,
        new_volume: u64,
    ) -> Result<bool, EngineError> {
        if new_volume == 0 {
            return Ok(self.cancel(order_id).is_some());
        }
        let Some(&location) = self.book.get_order(order_id) else {
            return Ok(false);
        };
        let current = self.arena.get(location.arena_index).volume;
        self.check_level_room(location.side, location.price, current, new_volume)?;

        let changed = self.book.set_volume(&mut self.arena, order_id, new_volume);
        if changed {
            debug!("resize {order_id}: volume -> {new_volume}");
        }
        Ok(changed)
    }

    /// Aggregate resting volume at exactly `price` on `side` (0 if none).
    #[inline]
    pub fn get_resting_volume(&self, price: Decimal, side: Side) -> u64 {
        self.book.side(side).total_volume_at(price)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Cross the (unlinked) node at `taker_idx`, then rest what is left.
    ///
    /// The slot is released if the order fills completely.
    ///
    /// # Returns
    /// Whether the order is now resting
    fn match_and_rest(&mut self, taker_idx: ArenaIndex, trades: &mut Vec<TradeEvent>) -> bool {
        let taker = *self.arena.get(taker_idx);
        let remaining = self.cross(&taker, trades);

        if remaining == 0 {
            self.arena.free(taker_idx);
            trace!("{} filled on entry", taker.order_id);
            return false;
        }

        self.arena.get_mut(taker_idx).volume = remaining;
        let added = self.book.add_order(&mut self.arena, taker_idx);
        debug_assert!(added, "id uniqueness is checked before matching");
        trace!(
            "rest {} {} {} @ {}",
            taker.order_id,
            taker.side,
            remaining,
            taker.price
        );
        added
    }

    /// Match an incoming order against the opposite side.
    ///
    /// # Returns
    /// Remaining volume after matching
    fn cross(&mut self, taker: &OrderNode, trades: &mut Vec<TradeEvent>) -> u64 {
        let maker_side = taker.side.opposite();
        let mut remaining = taker.volume;

        while remaining > 0 {
            let book_side = self.book.side_mut(maker_side);
            if !book_side.is_marketable(taker.price) {
                break;
            }
            let Some(level) = book_side.best_mut() else {
                break;
            };

            // Head of the best level: oldest order at the best price
            let maker_idx = level.peek_head();
            let maker = *self.arena.get(maker_idx);
            let trade_volume = remaining.min(maker.volume);

            let maker_left = level.fill_head(&mut self.arena, trade_volume);
            remaining -= trade_volume;

            self.trade_seq += 1;
            let trade = TradeEvent {
                seq: self.trade_seq,
                price: maker.price,
                volume: trade_volume,
                resting_order_id: maker.order_id,
                incoming_order_id: taker.order_id,
                incoming_side: taker.side,
            };
            trace!(
                "trade #{}: {} x {} resting {} incoming {}",
                trade.seq,
                trade.volume,
                trade.price,
                trade.resting_order_id,
                trade.incoming_order_id
            );
            trades.push(trade);

            if maker_left == 0 {
                self.book.remove_order(&mut self.arena, maker.order_id);
                self.arena.free(maker_idx);
            }
        }

        remaining
    }

    /// Fail unless the level at `price` on `side` can take `volume` more
    /// once `leaving` units already queued there are taken out.
    fn check_level_room(
        &self,
        side: Side,
        price: Decimal,
        leaving: u64,
        volume: u64,
    ) -> Result<(), EngineError> {
        let kept = self.book.side(side).total_volume_at(price) - leaving;
        if kept.checked_add(volume).is_none() {
            debug!("reject: {side} level {price} holds {kept}, cannot add {volume}");
            return Err(EngineError::VolumeOverflow { side, price });
        }
        Ok(())
    }

    #[inline]
    fn next_order_seq(&mut self) -> u64 {
        self.order_seq += 1;
        self.order_seq
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.best_ask()
    }

    #[inline]
    pub fn spread(&self) -> Option<Decimal> {
        self.book.spread()
    }

    /// Get total resting order count
    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Look up a resting order.
    pub fn order(&self, order_id: OrderId) -> Option<RestingOrder> {
        self.book
            .get_order(order_id)
            .map(|location| RestingOrder::from(self.arena.get(location.arena_index)))
    }

    /// Resting orders at one price in time priority (oldest first).
    pub fn queue_at(&self, side: Side, price: Decimal) -> Vec<RestingOrder> {
        self.book
            .side(side)
            .level(price)
            .map(|level| {
                level
                    .iter(&self.arena)
                    .map(|idx| RestingOrder::from(self.arena.get(idx)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Top `levels` price levels on `side` as `(price, volume)`, best first.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<(Decimal, u64)> {
        self.book.side(side).depth(levels)
    }

    /// Verify book/index consistency.
    pub fn audit(&self) -> Result<(), EngineError> {
        self.book.audit(&self.arena)?;
        if self.arena.allocated() as usize != self.book.order_count() {
            return Err(EngineError::Inconsistent(format!(
                "{} arena slots in use for {} resting orders",
                self.arena.allocated(),
                self.book.order_count()
            )));
        }
        Ok(())
    }

    /// Warm up the engine (pre-fault memory pages)
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Compute a hash of the full book state (for determinism testing).
    ///
    /// Covers every level on both sides in priority order, every resting
    /// order's id and volume, and the trade sequence.
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        for book_side in [&self.book.bids, &self.book.asks] {
            book_side.len().hash(&mut hasher);
            for level in book_side.iter_best_first() {
                level.price.hash(&mut hasher);
                level.total_volume.hash(&mut hasher);
                for idx in level.iter(&self.arena) {
                    let node = self.arena.get(idx);
                    node.order_id.hash(&mut hasher);
                    node.volume.hash(&mut hasher);
                }
            }
        }
        self.trade_seq.hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(1000)
    }

    fn place(
        engine: &mut MatchingEngine,
        id: u64,
        side: Side,
        price: Decimal,
        volume: u64,
    ) -> Vec<TradeEvent> {
        engine
            .place(OrderId(id), price, volume, side)
            .expect("order should be accepted")
    }

    #[test]
    fn test_place_bid_no_match() {
        let mut engine = engine();

        let trades = place(&mut engine, 1, Side::Buy, dec!(100), 100);

        assert!(trades.is_empty());
        assert_eq!(engine.best_bid(), Some(dec!(100)));
        assert_eq!(engine.best_ask(), None);
        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.get_resting_volume(dec!(100), Side::Buy), 100);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_full_match() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(100), 100);
        let trades = place(&mut engine, 2, Side::Buy, dec!(100), 100);

        assert_eq!(trades.len(), 1);
        let t = trades[0];
        assert_eq!(t.price, dec!(100));
        assert_eq!(t.volume, 100);
        assert_eq!(t.resting_order_id, OrderId(1));
        assert_eq!(t.incoming_order_id, OrderId(2));
        assert_eq!(t.incoming_side, Side::Buy);

        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
        assert!(engine.arena.is_empty());
    }

    #[test]
    fn test_partial_match_incoming_rests() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(100), 50);
        let trades = place(&mut engine, 2, Side::Buy, dec!(100), 100);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].volume, 50);

        let resting = engine.order(OrderId(2)).unwrap();
        assert_eq!(resting.volume, 50);
        assert_eq!(resting.side, Side::Buy);
        assert_eq!(engine.best_ask(), None);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_partial_match_resting_remains() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(100), 100);
        place(&mut engine, 2, Side::Buy, dec!(100), 30);

        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.order(OrderId(1)).unwrap().volume, 70);
        assert_eq!(engine.book.depth_at(Side::Sell, dec!(100)), (70, 1));
        assert!(engine.order(OrderId(2)).is_none());
    }

    #[test]
    fn test_match_multiple_levels() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(100.00), 50);
        place(&mut engine, 2, Side::Sell, dec!(100.10), 50);
        place(&mut engine, 3, Side::Sell, dec!(100.20), 50);

        let trades = place(&mut engine, 4, Side::Buy, dec!(100.20), 120);

        let fills: Vec<_> = trades.iter().map(|t| (t.price, t.volume)).collect();
        assert_eq!(
            fills,
            vec![(dec!(100.00), 50), (dec!(100.10), 50), (dec!(100.20), 20)]
        );
        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.best_ask(), Some(dec!(100.20)));
        assert_eq!(engine.get_resting_volume(dec!(100.20), Side::Sell), 30);
    }

    #[test]
    fn test_trade_at_resting_price() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Buy, dec!(10), 5);
        let trades = place(&mut engine, 2, Side::Sell, dec!(9), 5);

        assert_eq!(trades[0].price, dec!(10));
    }

    #[test]
    fn test_non_crossing_orders_both_rest() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Buy, dec!(99), 5);
        let trades = place(&mut engine, 2, Side::Sell, dec!(100), 5);

        assert!(trades.is_empty());
        assert_eq!(engine.spread(), Some(dec!(1)));
    }

    #[test]
    fn test_fifo_order_priority() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(100), 100);
        place(&mut engine, 2, Side::Sell, dec!(100), 100);
        place(&mut engine, 3, Side::Sell, dec!(100), 100);

        let trades = place(&mut engine, 4, Side::Buy, dec!(100), 200);

        let makers: Vec<_> = trades.iter().map(|t| t.resting_order_id).collect();
        assert_eq!(makers, vec![OrderId(1), OrderId(2)]);
        assert_eq!(engine.order_count(), 1);
        assert!(engine.order(OrderId(3)).is_some());
    }

    #[test]
    fn test_price_priority_beats_arrival() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Buy, dec!(98), 10);
        place(&mut engine, 2, Side::Buy, dec!(100), 10);
        place(&mut engine, 3, Side::Buy, dec!(99), 10);

        let trades = place(&mut engine, 4, Side::Sell, dec!(98), 25);

        let fills: Vec<_> = trades.iter().map(|t| (t.resting_order_id, t.price)).collect();
        assert_eq!(
            fills,
            vec![
                (OrderId(2), dec!(100)),
                (OrderId(3), dec!(99)),
                (OrderId(1), dec!(98)),
            ]
        );
    }

    #[test]
    fn test_trade_sequence_increases() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Sell, dec!(10), 1);
        place(&mut engine, 2, Side::Sell, dec!(10), 1);
        let first = place(&mut engine, 3, Side::Buy, dec!(10), 1);
        let second = place(&mut engine, 4, Side::Buy, dec!(10), 1);

        assert_eq!(first[0].seq, 1);
        assert_eq!(second[0].seq, 2);
    }

    #[test]
    fn test_rejections_leave_book_untouched() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), 5);
        let before = engine.state_hash();

        assert_eq!(
            engine.place(OrderId(1), dec!(11), 5, Side::Sell),
            Err(EngineError::DuplicateOrderId(OrderId(1)))
        );
        assert_eq!(
            engine.place(OrderId(2), dec!(0), 5, Side::Sell),
            Err(EngineError::InvalidPrice(dec!(0)))
        );
        assert_eq!(
            engine.place(OrderId(3), dec!(-1), 5, Side::Sell),
            Err(EngineError::InvalidPrice(dec!(-1)))
        );
        assert_eq!(
            engine.place(OrderId(4), dec!(10), 0, Side::Sell),
            Err(EngineError::InvalidVolume)
        );

        assert_eq!(engine.state_hash(), before);
        assert_eq!(engine.order(OrderId(1)).unwrap().volume, 5);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_capacity_exhausted_before_matching() {
        let mut engine = MatchingEngine::new(1);
        place(&mut engine, 1, Side::Sell, dec!(10), 5);
        let before = engine.state_hash();

        // Would cross, but no slot is free: nothing may trade
        assert_eq!(
            engine.place(OrderId(2), dec!(10), 5, Side::Buy),
            Err(EngineError::CapacityExhausted { capacity: 1 })
        );
        assert_eq!(engine.state_hash(), before);
        assert_eq!(engine.get_resting_volume(dec!(10), Side::Sell), 5);
    }

    #[test]
    fn test_cancel_order() {
        let mut engine = engine();

        place(&mut engine, 1, Side::Buy, dec!(100), 100);
        assert_eq!(engine.cancel(OrderId(1)), Some(100));

        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.best_bid(), None);
        assert!(engine.arena.is_empty());
        assert_eq!(engine.cancel(OrderId(1)), None);
    }

    #[test]
    fn test_cancel_keeps_neighbours_in_order() {
        let mut engine = engine();
        for id in 1..=3 {
            place(&mut engine, id, Side::Sell, dec!(5), 10);
        }

        engine.cancel(OrderId(2));

        let queue: Vec<_> = engine
            .queue_at(Side::Sell, dec!(5))
            .iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(queue, vec![OrderId(1), OrderId(3)]);
        assert_eq!(engine.get_resting_volume(dec!(5), Side::Sell), 20);
    }

    #[test]
    fn test_modify_price_loses_priority() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), 5);
        place(&mut engine, 2, Side::Buy, dec!(10), 5);

        let trades = engine.modify_price(OrderId(1), dec!(10)).unwrap();
        assert!(trades.is_empty());

        let queue: Vec<_> = engine
            .queue_at(Side::Buy, dec!(10))
            .iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(queue, vec![OrderId(2), OrderId(1)]);
    }

    #[test]
    fn test_modify_price_moves_level() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Sell, dec!(20), 4);

        engine.modify_price(OrderId(1), dec!(21)).unwrap();

        assert_eq!(engine.get_resting_volume(dec!(20), Side::Sell), 0);
        assert_eq!(engine.get_resting_volume(dec!(21), Side::Sell), 4);
        assert_eq!(engine.book.ask_levels(), 1);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_modify_price_crosses() {
        let mut engine = engine();
        place(&mut engine, 5, Side::Sell, dec!(15), 1);
        place(&mut engine, 4, Side::Buy, dec!(5), 3);

        let trades = engine.modify_price(OrderId(4), dec!(20)).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(15));
        assert_eq!(trades[0].resting_order_id, OrderId(5));
        assert_eq!(trades[0].incoming_order_id, OrderId(4));
        // Remainder rests at the new price
        assert_eq!(engine.get_resting_volume(dec!(20), Side::Buy), 2);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_modify_price_invalid_or_unknown() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), 5);

        assert_eq!(engine.modify_price(OrderId(9), dec!(12)), Ok(Vec::new()));
        assert_eq!(
            engine.modify_price(OrderId(1), dec!(0)),
            Err(EngineError::InvalidPrice(dec!(0)))
        );
        assert_eq!(engine.get_resting_volume(dec!(10), Side::Buy), 5);
    }

    #[test]
    fn test_modify_volume_keeps_priority_and_never_matches() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), 5);
        place(&mut engine, 2, Side::Buy, dec!(10), 5);

        assert_eq!(engine.modify_volume(OrderId(1), 50), Ok(true));
        assert_eq!(engine.get_resting_volume(dec!(10), Side::Buy), 55);

        let trades = place(&mut engine, 3, Side::Sell, dec!(10), 50);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].resting_order_id, OrderId(1));
        assert_eq!(engine.order(OrderId(1)), None);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn test_modify_volume_zero_cancels() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Sell, dec!(10), 5);

        assert_eq!(engine.modify_volume(OrderId(1), 0), Ok(true));
        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.book.ask_levels(), 0);
        assert_eq!(engine.modify_volume(OrderId(1), 0), Ok(false));
        assert_eq!(engine.modify_volume(OrderId(1), 3), Ok(false));
    }

    #[test]
    fn test_place_rejects_level_volume_overflow() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Sell, dec!(1), u64::MAX / 2);
        place(&mut engine, 2, Side::Sell, dec!(1), u64::MAX / 2);
        let before = engine.state_hash();

        assert_eq!(
            engine.place(OrderId(3), dec!(1), 10, Side::Sell),
            Err(EngineError::VolumeOverflow {
                side: Side::Sell,
                price: dec!(1),
            })
        );
        assert_eq!(engine.state_hash(), before);
        assert!(engine.order(OrderId(3)).is_none());
        assert!(engine.audit().is_ok());

        // Another price on the same side is unaffected
        place(&mut engine, 3, Side::Sell, dec!(2), 10);
    }

    #[test]
    fn test_modify_volume_rejects_level_volume_overflow() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), 5);
        place(&mut engine, 2, Side::Buy, dec!(10), 5);
        let before = engine.state_hash();

        assert!(matches!(
            engine.modify_volume(OrderId(2), u64::MAX),
            Err(EngineError::VolumeOverflow { .. })
        ));
        assert_eq!(engine.state_hash(), before);
        assert!(engine.audit().is_ok());

        // The order's own volume is replaced, not added on top
        assert_eq!(engine.modify_volume(OrderId(2), u64::MAX - 5), Ok(true));
        assert_eq!(engine.get_resting_volume(dec!(10), Side::Buy), u64::MAX);
    }

    #[test]
    fn test_modify_price_rejects_level_volume_overflow() {
        let mut engine = engine();
        place(&mut engine, 1, Side::Buy, dec!(10), u64::MAX - 1);
        place(&mut engine, 2, Side::Buy, dec!(9), 2);
        let before = engine.state_hash();

        assert!(matches!(
            engine.modify_price(OrderId(2), dec!(10)),
            Err(EngineError::VolumeOverflow { .. })
        ));
        assert_eq!(engine.state_hash(), before);
        assert_eq!(engine.order(OrderId(2)).map(|o| o.price), Some(dec!(9)));
        assert!(engine.audit().is_ok());

        // Repricing a full level's only order to its own price still works
        assert_eq!(engine.modify_price(OrderId(1), dec!(10)), Ok(Vec::new()));
    }

    #[test]
    fn test_state_hash_tracks_queue_order() {
        let mut a = engine();
        let mut b = engine();
        place(&mut a, 1, Side::Buy, dec!(10), 5);
        place(&mut a, 2, Side::Buy, dec!(10), 5);
        place(&mut b, 2, Side::Buy, dec!(10), 5);
        place(&mut b, 1, Side::Buy, dec!(10), 5);

        assert_ne!(a.state_hash(), b.state_hash());
    }
}
