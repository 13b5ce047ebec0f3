pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, SignalKind};
pub use error::CoreError;
pub use structs::{
    ensure_ordered, AssetBalance, EnrichedBalance, OrderFill, PriceBar, Signal, TradeRecord,
};
