//! Arena Allocator - O(1) slab allocator with cache-line aligned order nodes.
//!
//! The arena pre-allocates a contiguous block of nodes at startup. Price
//! levels and the order index refer to nodes by `u32` index only, so an
//! order's storage never moves while it sits in the book and no node is
//! ever reachable through two owners.

use std::fmt;

use rust_decimal::Decimal;

use crate::command::{OrderId, Side};

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Type alias for arena indices - our "compressed pointers"
pub type ArenaIndex = u32;

/// A single order in the book - one cache line.
///
/// # Memory Layout
///
/// | Field      | Type    | Offset | Size |
/// |------------|---------|--------|------|
/// | price      | Decimal | 0      | 16   |
/// | order_id   | u64     | 16     | 8    |
/// | volume     | u64     | 24     | 8    |
/// | seq        | u64     | 32     | 8    |
/// | next       | u32     | 40     | 4    |
/// | prev       | u32     | 44     | 4    |
/// | side       | u8      | 48     | 1    |
/// | (padding)  | -       | 49     | 15   |
/// | **Total**  |         |        | 64   |
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct OrderNode {
    // === Hot Data (frequently accessed during matching) ===

    /// Limit price
    pub price: Decimal,

    /// External order ID
    pub order_id: OrderId,

    /// Remaining volume to fill
    pub volume: u64,

    /// Arrival sequence number (time priority)
    pub seq: u64,

    // === Linkage (FIFO queue pointers within a PriceLevel) ===

    /// Index of next (younger) order at same price level
    pub next: ArenaIndex,

    /// Index of previous (older) order (enables O(1) cancel)
    pub prev: ArenaIndex,

    /// Book side the order rests on
    pub side: Side,
}

// Compile-time assertion: OrderNode must fit in one cache line
const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 64,
    "OrderNode must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<OrderNode>() == 64,
    "OrderNode must be 64-byte aligned"
);

impl OrderNode {
    /// Create a new unlinked order node
    #[inline]
    pub fn new(order_id: OrderId, side: Side, price: Decimal, volume: u64, seq: u64) -> Self {
        Self {
            price,
            order_id,
            volume,
            seq,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            side,
        }
    }

    /// Create an empty node (for the free list)
    #[inline]
    pub const fn empty() -> Self {
        Self {
            price: Decimal::ZERO,
            order_id: OrderId(0),
            volume: 0,
            seq: 0,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            side: Side::Buy,
        }
    }

    /// Reset the node for reuse (when returning to free list)
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// True when the node is not linked to any neighbour.
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.prev == NULL_INDEX && self.next == NULL_INDEX
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order_id", &self.order_id)
            .field("side", &self.side)
            .field("price", &self.price)
            .field("volume", &self.volume)
            .field("seq", &self.seq)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Pre-allocated memory pool with O(1) allocation and deallocation.
///
/// Uses a free list threaded through the `next` field of unused nodes.
pub struct Arena {
    /// Contiguous block of pre-allocated nodes
    nodes: Vec<OrderNode>,

    /// Head of the free list (index of first available node)
    free_head: ArenaIndex,

    /// Number of currently allocated nodes
    allocated_count: u32,

    /// Total capacity
    capacity: u32,
}

impl Arena {
    /// Create a new arena with the specified capacity.
    ///
    /// # Panics
    /// Panics if capacity is `u32::MAX` (reserved for `NULL_INDEX`).
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NULL_INDEX, "Capacity must be less than NULL_INDEX");

        let mut nodes = vec![OrderNode::empty(); capacity as usize];

        // Thread the free list through all nodes
        for i in 0..capacity.saturating_sub(1) {
            nodes[i as usize].next = i + 1;
        }

        Self {
            nodes,
            free_head: if capacity > 0 { 0 } else { NULL_INDEX },
            allocated_count: 0,
            capacity,
        }
    }

    /// Allocate a node from the arena.
    ///
    /// Returns `None` if the arena is full.
    #[inline]
    pub fn alloc(&mut self) -> Option<ArenaIndex> {
        if self.free_head == NULL_INDEX {
            return None;
        }

        let index = self.free_head;
        self.free_head = self.nodes[index as usize].next;
        self.allocated_count += 1;

        self.nodes[index as usize].next = NULL_INDEX;
        self.nodes[index as usize].prev = NULL_INDEX;

        Some(index)
    }

    /// Free a node back to the arena.
    ///
    /// The caller must ensure the index is allocated and already unlinked
    /// from its price level.
    #[inline]
    pub fn free(&mut self, index: ArenaIndex) {
        debug_assert!(index < self.capacity, "Index out of bounds");
        debug_assert!(self.allocated_count > 0, "Double free detected");

        self.nodes[index as usize].reset();
        self.nodes[index as usize].next = self.free_head;
        self.free_head = index;
        self.allocated_count -= 1;
    }

    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        debug_assert!(index < self.capacity, "Index out of bounds");
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        debug_assert!(index < self.capacity, "Index out of bounds");
        &mut self.nodes[index as usize]
    }

    /// Returns the number of currently allocated nodes.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated_count
    }

    /// Returns the total capacity of the arena.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_head == NULL_INDEX
    }

    /// Pre-fault all memory pages (warm-up routine).
    ///
    /// Walks through all nodes to force the OS to map virtual pages
    /// to physical RAM, preventing page faults in the hot path.
    pub fn warm_up(&mut self) {
        for node in &mut self.nodes {
            let seq = node.seq;
            // Volatile write to prevent the loop being optimised away
            unsafe {
                std::ptr::write_volatile(&mut node.seq, seq);
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("allocated", &self.allocated_count)
            .field("free_head", &self.free_head)
            .finish()
    }
}
