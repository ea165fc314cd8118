use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::models::types::{Match, Order, OrderId, Price};
use crate::domain::services::matching_engine::matching_engine::{MatchingEngine, Placement};
use crate::domain::services::matching_engine::MatchingResult;
use crate::domain::services::orderbook::depth::DepthSnapshot;

/// A matching engine guarded by a single lock, shareable across threads.
///
/// Every call holds the lock for the whole operation, so book invariants hold
/// between calls. Prefer [`super::EngineWorker`] on hot paths.
#[derive(Debug, Clone)]
pub struct SharedMatchingEngine(Arc<Mutex<MatchingEngine>>);

impl SharedMatchingEngine {
    /// Wraps an engine.
    pub fn new(engine: MatchingEngine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    /// Places a limit order (acquires the lock)
    pub fn place_limit_order(&self, price: Price, order: Order) -> MatchingResult<Placement> {
        self.0.lock().place_limit_order(price, order)
    }

    /// Executes a market order (acquires the lock)
    pub fn place_market_order(&self, order: &mut Order) -> MatchingResult<Vec<Match>> {
        self.0.lock().place_market_order(order)
    }

    /// Cancels a resting order (acquires the lock)
    pub fn cancel_order(&self, order_id: OrderId) -> MatchingResult<Order> {
        self.0.lock().cancel_order(order_id)
    }

    /// Takes a depth snapshot (acquires the lock)
    pub fn depth(&self, limit: usize) -> DepthSnapshot {
        self.0.lock().depth(limit)
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut MatchingEngine) -> R) -> R {
        f(&mut self.0.lock())
    }
}
