//! # Meridian Strategy Library
//!
//! The decision logic of the bot: indicator math, the crossover signal rules and
//! the hour-of-day profile selector.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O, no clocks read internally, no exchange knowledge. Depends only
//!   on `core-types` and `configuration`.
//! - **Stateless evaluation:** a strategy is handed the full bar history on every call and
//!   recomputes from scratch, so nothing needs to survive a restart.
//!
//! ## Public API
//!
//! - `Strategy`: the trait the engine evaluates.
//! - `MACrossover`: the moving-average crossover strategy with an oscillator filter.
//! - `IndicatorSeries` / `IndicatorValue`: role-keyed indicator columns with an explicit
//!   warm-up state.
//! - `StrategySelector` / `TradingMode`: wall-clock profile switching.

pub mod error;
pub mod indicators;
pub mod ma_crossover;
pub mod selector;

pub use error::StrategyError;
pub use indicators::{IndicatorPoint, IndicatorSeries, IndicatorValue};
pub use ma_crossover::{evaluate_history, generate_signal, signal_at, MACrossover};
pub use selector::{StrategySelector, TradingMode};

use core_types::{PriceBar, Signal};

/// The core trait the engine uses to turn market history into a decision.
///
/// `Send + Sync` lets the engine hold strategies behind shared pointers.
pub trait Strategy: Send + Sync {
    /// Evaluates the most recent bar of `bars` (ordered oldest first).
    ///
    /// Insufficient or warming-up history is not an error; it yields a HOLD
    /// signal whose reason says so.
    fn evaluate(&self, bars: &[PriceBar]) -> Result<Signal, StrategyError>;
}
