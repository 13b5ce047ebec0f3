//! Pre-trade risk checks.
//!
//! Three independent gates, each a pure function of data the engine has already
//! fetched: the portfolio floor (gates buys only), the per-symbol crash check and
//! the canary-asset check (both halt analysis of the symbol for the cycle).

pub mod error;
pub mod gate;

pub use error::RiskError;
pub use gate::{
    last_change_pct, portfolio_value, CanaryCheck, CrashCheck, PortfolioCheck, RiskGate,
    RiskVerdict,
};
