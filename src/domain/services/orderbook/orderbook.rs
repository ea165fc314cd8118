//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a limit order book for a single trading instrument.
// It maintains bid and ask price levels in price-time priority (FIFO) order.
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | OrderBook     | Main order book structure managing bids and asks                          |
// | PriceLevel    | Groups orders at the same price level (see price_level.rs)                |
// | OrderArena    | Shared storage of every resting order, indexed by OrderId                 |
//
// Each side is a single BTreeMap keyed by price, which is both the O(log n) level lookup
// and the sorted traversal order. There is no second structure to keep in sync.
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                               | Return Type             |
// |-----------------------|-------------------------------------------|-------------------------|
// | upsert_level          | Gets or creates the level at a price      | &mut PriceLevel         |
// | remove_level          | Drops a level from the book               | Option<PriceLevel>      |
// | best_side_view        | Levels sorted by matching priority        | Vec<&PriceLevel>        |
// | total_volume          | Volume resting on a side                  | Quantity                |
// | add_order             | Rests an order at a price                 | OrderId                 |
// | remove_order          | Removes a resting order by id             | Option<Order>           |
// | fill_level            | Fills an incoming order at one level      | Vec<Match>              |
// | best_bid / best_ask   | Top of book prices                        | Option<Price>           |
// | spread                | Best ask minus best bid                   | Option<Price>           |
//--------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::models::types::{Match, Order, OrderId, Price, Quantity, Side};
use crate::domain::services::orderbook::price_level::{OrderArena, PriceLevel};

/// The order book for one instrument.
#[derive(Debug)]
pub struct OrderBook {
    /// Bid levels keyed by price; iterated in reverse for priority
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels keyed by price; iterated forward for priority
    asks: BTreeMap<Price, PriceLevel>,
    /// Storage of every resting order on both sides
    arena: OrderArena,
    /// Identifier for the instrument this order book manages
    instrument_id: Uuid,
}

impl OrderBook {
    /// Creates a new empty order book for a specific instrument.
    ///
    /// # Arguments
    /// * `instrument_id` - The unique identifier of the instrument this order book will manage
    pub fn new(instrument_id: Uuid) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            arena: OrderArena::new(),
            instrument_id,
        }
    }

    #[inline]
    fn levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    fn levels_and_arena_mut(&mut self, side: Side) -> (&mut BTreeMap<Price, PriceLevel>, &mut OrderArena) {
        match side {
            Side::Bid => (&mut self.bids, &mut self.arena),
            Side::Ask => (&mut self.asks, &mut self.arena),
        }
    }

    fn upsert_in(levels: &mut BTreeMap<Price, PriceLevel>, side: Side, price: Price) -> &mut PriceLevel {
        levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(side, price))
    }

    /// Returns the level at `price` on `side`, creating and registering it if absent.
    ///
    /// A newly created level is empty; the caller must rest an order in it or
    /// remove it before the book is observed again.
    pub fn upsert_level(&mut self, side: Side, price: Price) -> &mut PriceLevel {
        Self::upsert_in(self.levels_and_arena_mut(side).0, side, price)
    }

    /// Removes the level at `price` on `side`.
    ///
    /// Called once a level has become empty. Any order still resident is
    /// dropped together with the level.
    ///
    /// # Returns
    /// * `Some(PriceLevel)` - The removed (now empty) level
    /// * `None` - If no level exists at that price
    pub fn remove_level(&mut self, side: Side, price: Price) -> Option<PriceLevel> {
        let (levels, arena) = self.levels_and_arena_mut(side);
        let mut level = levels.remove(&price)?;
        debug_assert!(level.is_empty(), "removing non-empty level at {}", price);
        if !level.is_empty() {
            level.clear(arena);
        }
        Some(level)
    }

    /// Returns the levels of `side` sorted by matching priority: ascending prices
    /// for asks (cheapest first), descending prices for bids (richest first).
    pub fn best_side_view(&self, side: Side) -> Vec<&PriceLevel> {
        match side {
            Side::Bid => self.bids.values().rev().collect(),
            Side::Ask => self.asks.values().collect(),
        }
    }

    /// Sum of the volume of every level on `side`.
    ///
    /// The matching engine keeps this sum within `Quantity::MAX` by rejecting
    /// limit orders that would overflow it.
    pub fn total_volume(&self, side: Side) -> Quantity {
        self.levels(side).values().map(PriceLevel::total_volume).sum()
    }

    /// Rests `order` at `price` on its own side, registering the level if needed.
    ///
    /// # Returns
    /// The id of the resting order
    pub fn add_order(&mut self, price: Price, order: Order) -> OrderId {
        let side = order.side;
        let (levels, arena) = self.levels_and_arena_mut(side);
        Self::upsert_in(levels, side, price).add_order(arena, order)
    }

    /// Removes a resting order, following its level back-reference, and drops
    /// the level if it became empty.
    ///
    /// # Returns
    /// * `Some(Order)` - The removed order
    /// * `None` - If no order with that id rests in the book
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, price) = {
            let order = self.arena.get(order_id)?;
            (order.side, order.level_price()?)
        };
        let (levels, arena) = self.levels_and_arena_mut(side);
        let level = levels.get_mut(&price)?;
        let order = level.delete_order(arena, order_id)?;
        if level.is_empty() {
            levels.remove(&price);
        }
        Some(order)
    }

    /// Fills `incoming` against the level at `price` on `side`.
    ///
    /// The level is left in place even when emptied; removing it is up to the caller.
    pub fn fill_level(&mut self, side: Side, price: Price, incoming: &mut Order) -> Vec<Match> {
        let (levels, arena) = self.levels_and_arena_mut(side);
        match levels.get_mut(&price) {
            Some(level) => level.fill(arena, incoming),
            None => Vec::new(),
        }
    }

    /// Returns the level at `price` on `side`.
    pub fn level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        self.levels(side).get(&price)
    }

    /// Returns a resting order by id.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.arena.get(order_id)
    }

    /// Returns the orders at a price level in FIFO order (empty if no level).
    pub fn orders_at_price(&self, side: Side, price: Price) -> Vec<&Order> {
        self.level(side, price)
            .map(|level| level.orders(&self.arena).collect())
            .unwrap_or_default()
    }

    /// Returns the number of orders at a specific price level.
    pub fn order_count_at_price(&self, side: Side, price: Price) -> usize {
        self.level(side, price).map_or(0, PriceLevel::order_count)
    }

    /// Returns the total volume at a specific price level.
    pub fn volume_at_price(&self, side: Side, price: Price) -> Option<Quantity> {
        self.level(side, price).map(PriceLevel::total_volume)
    }

    /// Returns the next order to be matched on `side` without removing it.
    pub fn peek_best_order(&self, side: Side) -> Option<&Order> {
        self.best_side_view(side)
            .first()
            .and_then(|level| level.front(&self.arena))
    }

    /// Returns the best bid price (highest).
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Returns the best ask price (lowest).
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Returns the spread between the best ask and best bid.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Number of price levels on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    /// Number of orders resting on both sides.
    pub fn resting_order_count(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if neither side has a resting order.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Returns the instrument ID this order book manages.
    pub fn instrument_id(&self) -> Uuid {
        self.instrument_id
    }
}
