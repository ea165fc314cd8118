//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a single price level: the FIFO queue of orders resting at one
// exact price, and the fill algorithm that consumes it.
//
// Orders live in a shared slab arena owned by the order book. Each level keeps the
// head/tail of an intrusive doubly linked list of arena slots, which gives O(1) append
// and O(1) stable removal: removing an order never changes the relative order of the
// remaining ones.
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | OrderArena    | Slab of order nodes plus an OrderId -> slot index                         |
// | PriceLevel    | FIFO queue of orders at one price with incremental volume accounting      |
// | LevelIter     | Head-to-tail iterator over the resident orders                            |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                               | Return Type             |
// |-----------------------|-------------------------------------------|-------------------------|
// | add_order             | Appends an order at the tail              | OrderId                 |
// | delete_order          | Stable removal of a resident order        | Option<Order>           |
// | fill                  | Fills an incoming order from the head     | Vec<Match>              |
// | orders                | FIFO iterator over resident orders        | LevelIter               |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use chrono::Utc;
use slab::Slab;
use uuid::Uuid;

use crate::domain::models::types::{Match, Order, OrderId, Price, Quantity, Side};

#[derive(Debug)]
struct OrderNode {
    order: Order,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Storage for every resting order of a book.
///
/// Slots are only handed out to price levels; callers address orders by [`OrderId`].
#[derive(Debug, Default)]
pub struct OrderArena {
    nodes: Slab<OrderNode>,
    index: HashMap<OrderId, usize>,
}

impl OrderArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena with room for `capacity` orders.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the order with the given id.
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.index
            .get(&order_id)
            .map(|&slot| &self.nodes[slot].order)
    }

    /// Returns true if an order with the given id is stored.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no order is stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, order: Order) -> usize {
        let order_id = order.id;
        let slot = self.nodes.insert(OrderNode {
            order,
            prev: None,
            next: None,
        });
        self.index.insert(order_id, slot);
        slot
    }

    fn slot(&self, order_id: OrderId) -> Option<usize> {
        self.index.get(&order_id).copied()
    }

    fn remove(&mut self, slot: usize) -> Order {
        let node = self.nodes.remove(slot);
        self.index.remove(&node.order.id);
        node.order
    }
}

/// All orders resting at one exact price on one side, in arrival order.
///
/// The level only holds slot indices into an [`OrderArena`]; the orders
/// themselves live in the arena.
#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    side: Side,
    head: Option<usize>,
    tail: Option<usize>,
    total_volume: Quantity,
    order_count: usize,
}

impl PriceLevel {
    /// Creates an empty level.
    ///
    /// # Arguments
    /// * `side` - The book side owning the level
    /// * `price` - The price for this level
    pub fn new(side: Side, price: Price) -> Self {
        Self {
            price,
            side,
            head: None,
            tail: None,
            total_volume: 0,
            order_count: 0,
        }
    }

    /// The price for this level.
    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// The book side owning this level.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Sum of the remaining sizes of all resident orders.
    #[inline]
    pub fn total_volume(&self) -> Quantity {
        self.total_volume
    }

    /// Number of resident orders.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Returns true if this price level has no orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Returns the next order to be matched without removing it.
    pub fn front<'a>(&self, arena: &'a OrderArena) -> Option<&'a Order> {
        self.head.map(|slot| &arena.nodes[slot].order)
    }

    /// Iterates the resident orders from earliest to latest arrival.
    pub fn orders<'a>(&self, arena: &'a OrderArena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }

    /// Appends an order to the tail of the level, preserving time priority.
    ///
    /// The order's level reference is set to this level and its size is added
    /// to the level volume.
    ///
    /// # Returns
    /// The id under which the order is now stored in `arena`
    pub fn add_order(&mut self, arena: &mut OrderArena, mut order: Order) -> OrderId {
        debug_assert_eq!(order.side, self.side, "order side does not match level side");
        debug_assert!(!arena.contains(order.id), "order {} already stored", order.id);

        order.level = Some(self.price);
        let order_id = order.id;
        let size = order.size;
        let slot = arena.insert(order);

        match self.tail {
            Some(tail) => {
                arena.nodes[tail].next = Some(slot);
                arena.nodes[slot].prev = Some(tail);
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.total_volume += size;
        self.order_count += 1;
        order_id
    }

    /// Removes a resident order without disturbing the order of the others.
    ///
    /// # Returns
    /// * `Some(Order)` - The removed order, with its level reference cleared
    /// * `None` - If the order does not rest at this level
    pub fn delete_order(&mut self, arena: &mut OrderArena, order_id: OrderId) -> Option<Order> {
        let slot = arena.slot(order_id)?;
        let node = &arena.nodes[slot];
        if node.order.side != self.side || node.order.level != Some(self.price) {
            return None;
        }

        self.unlink(arena, slot);
        let mut order = arena.remove(slot);
        order.level = None;
        self.total_volume -= order.size;
        self.order_count -= 1;
        Some(order)
    }

    /// Fills `incoming` against the resident orders, earliest arrival first.
    ///
    /// Each pairing consumes the smaller of the two remaining sizes and yields
    /// one [`Match`] at this level's price. The walk stops as soon as the
    /// incoming order is filled. Residents left with no size are detached once
    /// the walk is over.
    ///
    /// # Returns
    /// The matches in the order they were produced (empty for an empty level)
    pub fn fill(&mut self, arena: &mut OrderArena, incoming: &mut Order) -> Vec<Match> {
        debug_assert_ne!(incoming.side, self.side, "incoming order on the resting side");

        let mut matches = Vec::new();
        let mut exhausted = Vec::new();
        let mut cursor = self.head;

        while let Some(slot) = cursor {
            if incoming.is_filled() {
                break;
            }
            let node = &mut arena.nodes[slot];
            cursor = node.next;

            let resident = &mut node.order;
            let size_filled = resident.size.min(incoming.size);
            resident.size -= size_filled;
            incoming.size -= size_filled;
            self.total_volume -= size_filled;

            matches.push(self.record_match(resident, incoming, size_filled));
            if resident.is_filled() {
                exhausted.push(resident.id);
            }
        }

        for order_id in exhausted {
            self.delete_order(arena, order_id);
        }
        matches
    }

    fn record_match(&self, resident: &Order, incoming: &Order, size_filled: Quantity) -> Match {
        let (bid, ask) = match resident.side {
            Side::Bid => (resident, incoming),
            Side::Ask => (incoming, resident),
        };
        Match {
            id: Uuid::new_v4(),
            bid_order_id: bid.id,
            ask_order_id: ask.id,
            size_filled,
            price: self.price,
            taker_side: incoming.side,
            bid_remaining: bid.size,
            ask_remaining: ask.size,
            executed_at: Utc::now(),
        }
    }

    fn unlink(&mut self, arena: &mut OrderArena, slot: usize) {
        let (prev, next) = {
            let node = &arena.nodes[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => arena.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => arena.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut arena.nodes[slot];
        node.prev = None;
        node.next = None;
    }

    /// Drops every resident order from `arena`, leaving the level empty.
    pub(crate) fn clear(&mut self, arena: &mut OrderArena) {
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            cursor = arena.nodes[slot].next;
            arena.remove(slot);
        }
        self.head = None;
        self.tail = None;
        self.total_volume = 0;
        self.order_count = 0;
    }
}

/// Iterator over the orders of a level, head to tail.
pub struct LevelIter<'a> {
    arena: &'a OrderArena,
    cursor: Option<usize>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = &self.arena.nodes[slot];
        self.cursor = node.next;
        Some(&node.order)
    }
}
