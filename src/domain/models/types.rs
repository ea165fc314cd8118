//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine:
// the order value object, the trade fill record and the arrival sequencing source.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Side of an order.                                                |
// | STRUCTS            | Order, Match, SequenceGenerator.                                 |
// | HELPERS            | Fixed-point tick <-> decimal conversion for display.             |
// | TESTS              | Contains unit tests for the defined types.                       |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price expressed in integer ticks.
pub type Price = i64;

/// Quantity expressed in integer lots.
pub type Quantity = u64;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                 |
// |---------------|---------------------------------------------|
// | Side          | Represents the side of an order (Bid/Ask).  |
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order (Buy or Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// A buy order.
    Bid,
    /// A sell order.
    Ask,
}

impl Side {
    /// Returns the side an order on `self` matches against.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name               | Description                                          |
// |--------------------|------------------------------------------------------|
// | OrderId            | Unique order identity, equal to its arrival token.   |
// | SequenceGenerator  | Strictly increasing arrival token source.            |
// | Order              | A resting or incoming trading intent.                |
// | Match              | Record of one bilateral fill.                        |
//--------------------------------------------------------------------------------------------------

/// Identity of an order inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of arrival tokens.
///
/// Tokens start at 1 and never repeat for a given generator. The engine worker owns
/// its own generator so sequence assignment is deterministic per book; free-standing
/// callers use [`SequenceGenerator::global`].
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

static GLOBAL_SEQUENCE: SequenceGenerator = SequenceGenerator::new();

impl SequenceGenerator {
    /// Creates a generator whose first token is 1.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first token is `first`.
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Process-wide generator used by [`Order::new`].
    pub fn global() -> &'static SequenceGenerator {
        &GLOBAL_SEQUENCE
    }

    /// Returns the next token.
    #[inline]
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A single trading intent.
///
/// `size` is the remaining quantity and is only mutated by the matching path.
/// `level` is a non-owning back-reference to the price of the level the order
/// currently rests at; it is `None` for incoming, filled and canceled orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, equal to the arrival sequence.
    pub id: OrderId,
    /// Side of the order.
    pub side: Side,
    /// Remaining quantity.
    pub size: Quantity,
    /// Quantity at submission.
    pub original_size: Quantity,
    /// Arrival token establishing time priority.
    pub sequence: u64,
    /// Wall clock time of creation (informational only).
    pub created_at: DateTime<Utc>,
    pub(crate) level: Option<Price>,
}

impl Order {
    /// Creates an order stamped with the next token of the global generator.
    ///
    /// # Arguments
    /// * `side` - Side of the order
    /// * `size` - Quantity in lots
    pub fn new(side: Side, size: Quantity) -> Self {
        Self::with_sequence(side, size, SequenceGenerator::global().next())
    }

    /// Creates an order with an arrival token supplied by an external sequencing source.
    pub fn with_sequence(side: Side, size: Quantity, sequence: u64) -> Self {
        Self {
            id: OrderId(sequence),
            side,
            size,
            original_size: size,
            sequence,
            created_at: Utc::now(),
            level: None,
        }
    }

    /// Returns true once the order has no remaining quantity.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.size == 0
    }

    /// Returns true while the order sits in a price level.
    #[inline]
    pub fn is_resting(&self) -> bool {
        self.level.is_some()
    }

    /// Price of the level the order rests at, if any.
    #[inline]
    pub fn level_price(&self) -> Option<Price> {
        self.level
    }

    /// Quantity executed so far.
    pub fn filled_size(&self) -> Quantity {
        self.original_size - self.size
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[size: {}]", self.size)
    }
}

/// Record of one bilateral size transfer between a bid and an ask.
///
/// The price is always the resting level's price, never the incoming order's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Unique identifier of the fill.
    pub id: Uuid,
    /// Bid order involved.
    pub bid_order_id: OrderId,
    /// Ask order involved.
    pub ask_order_id: OrderId,
    /// Quantity transferred.
    pub size_filled: Quantity,
    /// Execution price (resting side).
    pub price: Price,
    /// Side of the incoming order.
    pub taker_side: Side,
    /// Bid remaining size after the fill.
    pub bid_remaining: Quantity,
    /// Ask remaining size after the fill.
    pub ask_remaining: Quantity,
    /// Time of execution.
    pub executed_at: DateTime<Utc>,
}

impl Match {
    /// Id of the order that was resting in the book.
    pub fn maker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Bid => self.ask_order_id,
            Side::Ask => self.bid_order_id,
        }
    }

    /// Id of the incoming order.
    pub fn taker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Bid => self.bid_order_id,
            Side::Ask => self.ask_order_id,
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  HELPERS
//--------------------------------------------------------------------------------------------------

/// Converts integer ticks to a decimal with `scale` fractional digits.
pub fn ticks_to_decimal(ticks: i64, scale: u32) -> Decimal {
    Decimal::new(ticks, scale)
}

/// Converts a quantity in lots to a decimal with `scale` fractional digits.
///
/// Every `Quantity` is representable, including values above `i64::MAX`.
pub fn quantity_to_decimal(lots: Quantity, scale: u32) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(lots), scale)
}

/// Converts a decimal to integer ticks at `scale` fractional digits.
///
/// Returns `None` when the value is not representable exactly at that scale
/// or does not fit in an `i64`.
pub fn decimal_to_ticks(value: Decimal, scale: u32) -> Option<i64> {
    let scaled = value.checked_mul(Decimal::from(10_i64.checked_pow(scale)?))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_i64()
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
// | Name                          | Description                                      |
// |-------------------------------|--------------------------------------------------|
// | test_order_creation           | New orders are unfilled and not resting.         |
// | test_sequence_monotonic       | Tokens strictly increase.                        |
// | test_match_roles              | Maker/taker resolution from the taker side.      |
// | test_tick_conversion          | Decimal boundary conversion.                     |
// | test_quantity_conversion      | Lots above i64::MAX keep their value.            |
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_creation() {
        let order = Order::new(Side::Bid, 10);
        assert_eq!(order.size, 10);
        assert_eq!(order.original_size, 10);
        assert_eq!(order.id, OrderId(order.sequence));
        assert!(!order.is_filled());
        assert!(!order.is_resting());
        assert_eq!(order.to_string(), "[size: 10]");

        let empty = Order::with_sequence(Side::Ask, 0, 42);
        assert!(empty.is_filled());
        assert_eq!(empty.id, OrderId(42));
    }

    #[test]
    fn test_sequence_monotonic() {
        let first = Order::new(Side::Bid, 1);
        let second = Order::new(Side::Ask, 1);
        assert!(second.sequence > first.sequence);

        let local = SequenceGenerator::starting_at(7);
        assert_eq!(local.next(), 7);
        assert_eq!(local.next(), 8);
    }

    #[test]
    fn test_match_roles() {
        let fill = Match {
            id: Uuid::new_v4(),
            bid_order_id: OrderId(1),
            ask_order_id: OrderId(2),
            size_filled: 3,
            price: 100,
            taker_side: Side::Ask,
            bid_remaining: 0,
            ask_remaining: 4,
            executed_at: Utc::now(),
        };
        assert_eq!(fill.maker_order_id(), OrderId(1));
        assert_eq!(fill.taker_order_id(), OrderId(2));
        assert_eq!(Side::Bid.opposite(), Side::Ask);
    }

    #[test]
    fn test_tick_conversion() {
        assert_eq!(ticks_to_decimal(10_050, 2), dec!(100.50));
        assert_eq!(decimal_to_ticks(dec!(100.50), 2), Some(10_050));
        assert_eq!(decimal_to_ticks(dec!(100.505), 2), None);
        assert_eq!(decimal_to_ticks(dec!(7), 0), Some(7));
    }

    #[test]
    fn test_quantity_conversion() {
        assert_eq!(quantity_to_decimal(1_500, 3), dec!(1.500));
        assert_eq!(quantity_to_decimal(7, 0), dec!(7));
        assert_eq!(quantity_to_decimal(Quantity::MAX, 0), Decimal::from(Quantity::MAX));
        assert!(quantity_to_decimal(Quantity::MAX, 2) > Decimal::from(i64::MAX));
    }
}
