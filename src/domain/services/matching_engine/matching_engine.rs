//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching engine logic for placing, executing and
// canceling orders. The matching engine follows price-time priority.
//
// | Component                | Description                                                |
// |--------------------------|------------------------------------------------------------|
// | MatchingEngine           | Main engine for processing and matching orders             |
// | Placement                | Outcome of placing a limit order                           |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Return Type            |
// |-------------------------|---------------------------------------------------|------------------------|
// | place_limit_order       | Rests a limit order at its price                  | Result<Placement>      |
// | place_market_order      | Executes a market order against the other side    | Result<Vec<Match>>     |
// | cancel_order            | Removes a resting order                           | Result<Order>          |
// | depth                   | Aggregated view of the book                       | DepthSnapshot          |
//--------------------------------------------------------------------------------------------------

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::models::types::{Match, Order, OrderId, Price, Side};
use crate::domain::services::matching_engine::{MatchingError, MatchingResult};
use crate::domain::services::orderbook::depth::DepthSnapshot;
use crate::domain::services::orderbook::orderbook::OrderBook;

/// Outcome of [`MatchingEngine::place_limit_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Id of the placed order
    pub order_id: OrderId,
    /// Fills produced while crossing (always empty unless crossing is enabled)
    pub matches: Vec<Match>,
    /// Whether a remainder of the order now rests in the book
    pub resting: bool,
}

/// The core matching engine for one instrument.
///
/// # Price-Time Priority
///
/// * Better prices are matched first (higher bids, lower asks)
/// * At the same price level, orders are matched in arrival order (FIFO)
/// * Every fill executes at the resting order's price
///
/// # Limit orders
///
/// By default a limit order only rests at its price, even when that price
/// crosses the opposite side. With `cross_limit_orders` enabled the marketable
/// part is executed first, up to the limit price, and only the remainder rests.
///
/// All mutations take `&mut self`; callers serialize access, either by owning the
/// engine on one thread ([`super::EngineWorker`]) or behind a lock
/// ([`super::SharedMatchingEngine`]).
#[derive(Debug)]
pub struct MatchingEngine {
    /// The order book for the instrument this engine is managing
    order_book: OrderBook,

    /// Whether marketable limit orders cross on placement
    cross_limit_orders: bool,
}

impl MatchingEngine {
    /// Creates a matching engine that rests limit orders without crossing.
    ///
    /// # Arguments
    ///
    /// * `instrument_id` - The unique identifier of the instrument this engine will manage
    pub fn new(instrument_id: Uuid) -> Self {
        Self {
            order_book: OrderBook::new(instrument_id),
            cross_limit_orders: false,
        }
    }

    /// Creates a matching engine from its configuration.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            order_book: OrderBook::new(config.instrument_id),
            cross_limit_orders: config.cross_limit_orders,
        }
    }

    /// Places a limit order at `price`.
    ///
    /// The order is appended to the level at `price` on its own side, creating the
    /// level if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder` if the size or price is not positive, if the order
    /// already rests somewhere, if its id is already used by a resting order, or
    /// if resting it could push the volume of its side past `Quantity::MAX`.
    pub fn place_limit_order(&mut self, price: Price, mut order: Order) -> MatchingResult<Placement> {
        self.validate(&order)?;
        if price <= 0 {
            warn!(order_id = %order.id, price, "rejected limit order with non-positive price");
            return Err(MatchingError::InvalidOrder(format!(
                "limit price must be positive, got {}",
                price
            )));
        }

        let resting_volume = self.order_book.total_volume(order.side);
        if resting_volume.checked_add(order.size).is_none() {
            warn!(
                order_id = %order.id,
                size = order.size,
                resting_volume,
                "rejected limit order overflowing side volume"
            );
            return Err(MatchingError::InvalidOrder(format!(
                "size {} overflows the {} side volume {}",
                order.size, order.side, resting_volume
            )));
        }

        let order_id = order.id;
        let matches = if self.cross_limit_orders {
            self.sweep(&mut order, Some(price))
        } else {
            Vec::new()
        };

        if order.is_filled() {
            debug!(order_id = %order_id, fills = matches.len(), "limit order filled on placement");
            return Ok(Placement {
                order_id,
                matches,
                resting: false,
            });
        }

        let side = order.side;
        let size = order.size;
        self.order_book.add_order(price, order);
        debug!(order_id = %order_id, %side, price, size, "limit order resting");

        Ok(Placement {
            order_id,
            matches,
            resting: true,
        })
    }

    /// Executes a market order against the opposite side of the book.
    ///
    /// Levels are consumed best price first, and within a level in arrival order.
    /// Levels left empty are removed. The order's `size` is reduced in place.
    ///
    /// # Returns
    ///
    /// Every fill produced, in price-then-time order
    ///
    /// # Errors
    ///
    /// * `InsufficientLiquidity` if the order is larger than the opposite side's
    ///   total volume; nothing is executed in that case
    /// * `InvalidOrder` if the size is zero or the order is resting
    pub fn place_market_order(&mut self, order: &mut Order) -> MatchingResult<Vec<Match>> {
        self.validate(order)?;

        let available = self.order_book.total_volume(order.side.opposite());
        if order.size > available {
            warn!(
                order_id = %order.id,
                requested = order.size,
                available,
                "rejected market order for insufficient liquidity"
            );
            return Err(MatchingError::InsufficientLiquidity {
                requested: order.size,
                available,
            });
        }

        let requested = order.size;
        let matches = self.sweep(order, None);
        debug_assert!(order.is_filled(), "market order left unfilled after liquidity check");
        debug!(order_id = %order.id, requested, fills = matches.len(), "market order executed");
        Ok(matches)
    }

    /// Cancels a resting order.
    ///
    /// The order's level is dropped if it becomes empty.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotResting` if the order is not in the book (already filled,
    /// already canceled or never placed)
    pub fn cancel_order(&mut self, order_id: OrderId) -> MatchingResult<Order> {
        match self.order_book.remove_order(order_id) {
            Some(order) => {
                info!(order_id = %order_id, side = %order.side, remaining = order.size, "order canceled");
                Ok(order)
            }
            None => {
                warn!(order_id = %order_id, "cancel rejected, order not resting");
                Err(MatchingError::OrderNotResting(order_id))
            }
        }
    }

    /// Walks the opposite side best price first, filling `order` until it is filled
    /// or, when `limit` is given, the next level is beyond the limit.
    fn sweep(&mut self, order: &mut Order, limit: Option<Price>) -> Vec<Match> {
        let opposite = order.side.opposite();
        let prices: Vec<Price> = self
            .order_book
            .best_side_view(opposite)
            .iter()
            .map(|level| level.price())
            .collect();

        let mut matches = Vec::new();
        for price in prices {
            if order.is_filled() {
                break;
            }
            if let Some(limit) = limit {
                let acceptable = match order.side {
                    Side::Bid => price <= limit,
                    Side::Ask => price >= limit,
                };
                if !acceptable {
                    break;
                }
            }

            matches.extend(self.order_book.fill_level(opposite, price, order));

            if self
                .order_book
                .level(opposite, price)
                .is_some_and(|level| level.is_empty())
            {
                self.order_book.remove_level(opposite, price);
                debug!(side = %opposite, price, "price level exhausted");
            }
        }
        matches
    }

    fn validate(&self, order: &Order) -> MatchingResult<()> {
        if order.size == 0 {
            warn!(order_id = %order.id, "rejected order with zero size");
            return Err(MatchingError::InvalidOrder("order size must be positive".to_string()));
        }
        if order.is_resting() || self.order_book.order(order.id).is_some() {
            warn!(order_id = %order.id, "rejected order already resting");
            return Err(MatchingError::InvalidOrder(format!(
                "order {} is already resting",
                order.id
            )));
        }
        Ok(())
    }

    /// Returns up to `limit` aggregated levels per side.
    pub fn depth(&self, limit: usize) -> DepthSnapshot {
        DepthSnapshot::capture(&self.order_book, limit)
    }

    /// Returns a resting order by id.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.order_book.order(order_id)
    }

    /// Gets the current state of the order book.
    pub fn order_book(&self) -> &OrderBook {
        &self.order_book
    }

    /// Gets the instrument ID this engine is managing.
    pub fn instrument_id(&self) -> Uuid {
        self.order_book.instrument_id()
    }

    /// Whether marketable limit orders cross on placement.
    pub fn crosses_limit_orders(&self) -> bool {
        self.cross_limit_orders
    }
}
