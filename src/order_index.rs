//! Order Index - id to location lookup for cancel and modify.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::arena::ArenaIndex;
use crate::command::{OrderId, Side};

/// Where a resting order lives.
///
/// The index never owns the order: `arena_index` is a handle into the arena,
/// and `side`/`price` name the level holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLocation {
    /// Index in the arena
    pub arena_index: ArenaIndex,
    /// Book side (needed for cancel to find correct book side)
    pub side: Side,
    /// Price level (needed for cancel to find the PriceLevel)
    pub price: Decimal,
}

/// Mapping from OrderId to OrderLocation, one entry per resting order.
#[derive(Clone, Debug, Default)]
pub struct OrderIndex {
    entries: FxHashMap<OrderId, OrderLocation>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Register a resting order.
    ///
    /// # Returns
    /// `false` (and leaves the index untouched) if the id is already present.
    #[inline]
    pub fn insert(&mut self, order_id: OrderId, location: OrderLocation) -> bool {
        match self.entries.entry(order_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(location);
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, order_id: OrderId) -> Option<&OrderLocation> {
        self.entries.get(&order_id)
    }

    #[inline]
    pub fn remove(&mut self, order_id: OrderId) -> Option<OrderLocation> {
        self.entries.remove(&order_id)
    }

    #[inline]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.entries.contains_key(&order_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OrderId, &OrderLocation)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
