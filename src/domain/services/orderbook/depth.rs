//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Aggregated, point-in-time views of the order book for market-data consumers.
//
// | Component                | Description                                                |
// |--------------------------|------------------------------------------------------------|
// | DepthLevel               | Aggregated volume information at a specific price          |
// | DepthSnapshot            | Immutable point-in-time view of order book depth           |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::types::{Price, Quantity, Side};
use crate::domain::services::orderbook::orderbook::OrderBook;
use crate::domain::services::orderbook::price_level::PriceLevel;

/// Represents an aggregated price level in the depth view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The price for this level
    pub price: Price,
    /// Total volume at this price level
    pub volume: Quantity,
    /// Number of orders at this price level
    pub order_count: usize,
}

impl From<&PriceLevel> for DepthLevel {
    fn from(level: &PriceLevel) -> Self {
        Self {
            price: level.price(),
            volume: level.total_volume(),
            order_count: level.order_count(),
        }
    }
}

/// An immutable snapshot of order book depth at a specific point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid price levels ordered by price descending (best bids first)
    pub bids: Vec<DepthLevel>,
    /// Ask price levels ordered by price ascending (best asks first)
    pub asks: Vec<DepthLevel>,
    /// Timestamp when this snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Instrument ID this depth snapshot belongs to
    pub instrument_id: Uuid,
}

impl DepthSnapshot {
    /// Captures up to `limit` levels per side of `book`.
    pub fn capture(book: &OrderBook, limit: usize) -> Self {
        let levels = |side: Side| -> Vec<DepthLevel> {
            book.best_side_view(side)
                .into_iter()
                .take(limit)
                .map(DepthLevel::from)
                .collect()
        };
        Self {
            bids: levels(Side::Bid),
            asks: levels(Side::Ask),
            timestamp: Utc::now(),
            instrument_id: book.instrument_id(),
        }
    }

    /// Returns the best bid price if available
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    /// Returns the best ask price if available
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    /// Returns the current spread (best ask - best bid)
    #[inline]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }
}
