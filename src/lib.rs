// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::{ConfigError, EngineConfig};
pub use domain::models::types::{
    decimal_to_ticks, quantity_to_decimal, ticks_to_decimal, Match, Order, OrderId, Price, Quantity, SequenceGenerator, Side,
};
pub use domain::services::matching_engine::{
    EngineClient, EngineWorker, MatchingEngine, MatchingError, MatchingResult, Placement, SharedMatchingEngine,
};
pub use domain::services::orderbook::{DepthLevel, DepthSnapshot, OrderArena, OrderBook, PriceLevel};
