//! # Meridian Executor Crate
//!
//! Turns trade decisions into exchange orders and derives position state from
//! the trade ledger.
//!
//! ## Architectural Principles
//!
//! - **Stateless positions:** `resolve_position` is a pure function over the ledger
//!   history. Nothing about open positions is kept in memory between cycles.
//! - **Execution Abstraction:** the `Executor` trait hides whether orders go to the
//!   exchange or are only logged (dry run).
//!
//! ## Public API
//!
//! - `Executor` / `LimitOrderExecutor`: offset limit orders rounded to exchange filters.
//! - `OrderRequest` / `ExecutionOutcome`: the executor's input and result.
//! - `PositionState` / `resolve_position`: OPEN/CLOSED reconstruction.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod exchange;
pub mod position;

// Re-export the key components to provide a clean, public-facing API.
pub use error::ExecutorError;
pub use exchange::{limit_price, ExecutionOutcome, Executor, LimitOrderExecutor, OrderRequest};
pub use position::{resolve_position, PositionState};
