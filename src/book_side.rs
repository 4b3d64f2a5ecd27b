//! Book Side - price-ordered index of price levels for one side of the book.
//!
//! Levels live in a `BTreeMap` keyed by price. The side a `BookSide` was
//! built for decides which end of the map is "best": the highest key for
//! bids, the lowest key for asks.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::command::Side;
use crate::price_level::PriceLevel;

/// All resting price levels on one side of the book.
#[derive(Clone, Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// The best level: highest price for bids, lowest for asks.
    #[inline]
    pub fn best(&self) -> Option<&PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        }
    }

    #[inline]
    pub fn best_mut(&mut self) -> Option<&mut PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values_mut().next_back(),
            Side::Sell => self.levels.values_mut().next(),
        }
    }

    #[inline]
    pub fn best_price(&self) -> Option<Decimal> {
        self.best().map(|level| level.price)
    }

    /// Whether this side's `price` is at least as good as `other`.
    ///
    /// For bids that means higher or equal, for asks lower or equal.
    #[inline]
    pub fn at_least_as_good(&self, price: Decimal, other: Decimal) -> bool {
        match self.side {
            Side::Buy => price >= other,
            Side::Sell => price <= other,
        }
    }

    /// Whether an opposite-side order limited at `incoming_price` can trade
    /// against this side's best level.
    ///
    /// An incoming buy crosses asks priced at or below it; an incoming sell
    /// crosses bids priced at or above it.
    #[inline]
    pub fn is_marketable(&self, incoming_price: Decimal) -> bool {
        self.best_price()
            .is_some_and(|best| self.at_least_as_good(best, incoming_price))
    }

    #[inline]
    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    #[inline]
    pub fn level_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Get or lazily create the level at `price`.
    #[inline]
    pub fn level_at(&mut self, price: Decimal) -> &mut PriceLevel {
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
    }

    /// Drop the level at `price` if its queue is empty.
    ///
    /// # Returns
    /// `true` if a level was evicted.
    pub fn evict_if_empty(&mut self, price: Decimal) -> bool {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
            true
        } else {
            false
        }
    }

    /// Aggregate resting volume at exactly `price` (0 if no level).
    #[inline]
    pub fn total_volume_at(&self, price: Decimal) -> u64 {
        self.levels.get(&price).map_or(0, |level| level.total_volume)
    }

    /// Levels from best to worst.
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Top `n` levels as `(price, total_volume)`, best first.
    pub fn depth(&self, n: usize) -> Vec<(Decimal, u64)> {
        self.iter_best_first()
            .take(n)
            .map(|level| (level.price, level.total_volume))
            .collect()
    }

    /// Number of price levels
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
