use thiserror::Error;

use crate::domain::models::types::{OrderId, Quantity};

pub mod engine_worker;
pub mod matching_engine;
pub mod shared;

/// Re-export key types for convenience
pub use self::engine_worker::{EngineClient, EngineWorker};
pub use self::matching_engine::{MatchingEngine, Placement};
pub use self::shared::SharedMatchingEngine;

/// Errors that can occur during matching engine operations.
///
/// Every variant is a recoverable business condition; the engine stays usable
/// after returning any of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// A market order asked for more than the opposite side holds.
    #[error("Not enough volume [{available}] for market order [size: {requested}]")]
    InsufficientLiquidity {
        requested: Quantity,
        available: Quantity,
    },

    /// Cancel targeted an order that is not resting (filled, canceled or unknown).
    #[error("Order {0} is not resting in the book")]
    OrderNotResting(OrderId),

    /// The order failed input validation.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// The engine worker can no longer be reached.
    #[error("Matching engine worker unavailable: {0}")]
    WorkerUnavailable(String),
}

/// Type alias for Result with MatchingError
pub type MatchingResult<T> = Result<T, MatchingError>;
