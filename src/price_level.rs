//! Price Level - A FIFO queue of orders at a single price point.
//!
//! Implements a doubly-linked list using arena indices for O(1)
//! insertion, removal from head, and removal from arbitrary position.

use rust_decimal::Decimal;

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};

/// A queue of orders at a specific price level.
///
/// Orders are processed in FIFO order (price-time priority).
/// `total_volume` always equals the sum of the members' remaining volume.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    /// Price shared by every order in the queue
    pub price: Decimal,
    /// Index of the oldest order (highest priority, first to match)
    pub head: ArenaIndex,
    /// Index of the newest order (last to match)
    pub tail: ArenaIndex,
    /// Total remaining volume across all orders at this level
    pub total_volume: u64,
    /// Number of orders at this level
    pub count: u32,
}

impl PriceLevel {
    /// Create a new empty price level
    #[inline]
    pub const fn new(price: Decimal) -> Self {
        Self {
            price,
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_volume: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append an order to the tail of the queue (newest order).
    ///
    /// The caller guarantees `total_volume` stays within `u64`.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn push_back(&mut self, arena: &mut Arena, index: ArenaIndex) {
        debug_assert_eq!(arena.get(index).price, self.price, "order priced off-level");
        let volume = arena.get(index).volume;

        if self.tail == NULL_INDEX {
            // Empty list: new node becomes both head and tail
            debug_assert!(self.head == NULL_INDEX);
            self.head = index;
            self.tail = index;
            arena.get_mut(index).prev = NULL_INDEX;
            arena.get_mut(index).next = NULL_INDEX;
        } else {
            arena.get_mut(self.tail).next = index;
            arena.get_mut(index).prev = self.tail;
            arena.get_mut(index).next = NULL_INDEX;
            self.tail = index;
        }

        self.count += 1;
        self.total_volume += volume;
    }

    /// Remove and return the head order (oldest/highest priority).
    ///
    /// The order is NOT freed from the arena; caller must do that.
    #[inline]
    pub fn pop_front(&mut self, arena: &mut Arena) -> Option<ArenaIndex> {
        if self.head == NULL_INDEX {
            return None;
        }
        let index = self.head;
        self.remove(arena, index);
        Some(index)
    }

    /// Remove an order from anywhere in the queue.
    ///
    /// Handles all edge cases:
    /// - Only node in level (head == tail)
    /// - Removing head
    /// - Removing tail
    /// - Removing from middle
    ///
    /// The order must be a member of this level.
    ///
    /// # Returns
    /// `true` if the level is now empty, `false` otherwise.
    /// The order is NOT freed from the arena; caller must do that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn remove(&mut self, arena: &mut Arena, index: ArenaIndex) -> bool {
        let node = arena.get(index);
        let prev_idx = node.prev;
        let next_idx = node.next;
        let volume = node.volume;
        debug_assert_eq!(node.price, self.price, "order is not a member of this level");
        debug_assert!(self.count > 0, "remove from empty level");

        if prev_idx == NULL_INDEX && next_idx == NULL_INDEX {
            debug_assert!(self.head == index && self.tail == index);
            self.head = NULL_INDEX;
            self.tail = NULL_INDEX;
        } else if prev_idx == NULL_INDEX {
            debug_assert!(self.head == index);
            self.head = next_idx;
            arena.get_mut(next_idx).prev = NULL_INDEX;
        } else if next_idx == NULL_INDEX {
            debug_assert!(self.tail == index);
            self.tail = prev_idx;
            arena.get_mut(prev_idx).next = NULL_INDEX;
        } else {
            arena.get_mut(prev_idx).next = next_idx;
            arena.get_mut(next_idx).prev = prev_idx;
        }

        self.count -= 1;
        self.total_volume -= volume;

        // Clear the removed node's linkage
        arena.get_mut(index).prev = NULL_INDEX;
        arena.get_mut(index).next = NULL_INDEX;

        self.count == 0
    }

    /// Peek at the head order without removing it.
    ///
    /// # Returns
    /// Index of the head order, or `NULL_INDEX` if empty.
    #[inline]
    pub const fn peek_head(&self) -> ArenaIndex {
        self.head
    }

    /// Set a member's remaining volume, keeping its queue position.
    ///
    /// `total_volume` moves by the difference, up or down.
    #[inline]
    pub fn adjust_volume(&mut self, arena: &mut Arena, index: ArenaIndex, new_volume: u64) {
        let node = arena.get_mut(index);
        debug_assert_eq!(node.price, self.price, "order is not a member of this level");
        let old_volume = node.volume;
        node.volume = new_volume;

        if new_volume >= old_volume {
            self.total_volume += new_volume - old_volume;
        } else {
            debug_assert!(self.total_volume >= old_volume - new_volume);
            self.total_volume -= old_volume - new_volume;
        }
    }

    /// Take `volume` off the head order after a trade.
    ///
    /// # Returns
    /// The head order's remaining volume.
    #[inline]
    pub fn fill_head(&mut self, arena: &mut Arena, volume: u64) -> u64 {
        let head = self.head;
        debug_assert!(head != NULL_INDEX, "fill on empty level");
        let remaining = arena.get(head).volume - volume;
        self.adjust_volume(arena, head, remaining);
        remaining
    }

    /// Walk the queue from head (oldest) to tail (newest).
    pub fn iter<'a>(&self, arena: &'a Arena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

/// Iterator over the arena indices of a level's queue, in time priority.
pub struct LevelIter<'a> {
    arena: &'a Arena,
    cursor: ArenaIndex,
}

impl Iterator for LevelIter<'_> {
    type Item = ArenaIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let index = self.cursor;
        self.cursor = self.arena.get(index).next;
        Some(index)
    }
}
