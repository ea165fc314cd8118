pub mod depth;
pub mod orderbook;
pub mod price_level;

pub use self::depth::{DepthLevel, DepthSnapshot};
pub use self::orderbook::OrderBook;
pub use self::price_level::{LevelIter, OrderArena, PriceLevel};
