use crate::error::ExecutorError;
use api_client::{ApiClient, ApiError};
use async_trait::async_trait;
use core_types::{OrderFill, OrderSide};
use rust_decimal::Decimal;
use std::sync::Arc;

/// What the engine wants traded, before exchange rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Market price the limit price is derived from.
    pub reference_price: Decimal,
}

/// The result of an execution attempt that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Filled(OrderFill),
    /// Nothing was traded; state must stay untouched.
    Skipped { reason: String },
}

/// Buys are placed just below the reference price, sells just above it.
pub fn limit_price(side: OrderSide, reference_price: Decimal, offset: Decimal) -> Decimal {
    match side {
        OrderSide::Buy => reference_price * (Decimal::ONE - offset),
        OrderSide::Sell => reference_price * (Decimal::ONE + offset),
    }
}

/// A generic trait for an execution engine.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Places `order` and reports the aggregated fill, if any.
    ///
    /// Outcomes that leave nothing traded but are not failures of the exchange
    /// call (zero quantity after rounding, no fills, dry run) are `Skipped`.
    async fn execute(&self, order: &OrderRequest) -> Result<ExecutionOutcome, ExecutorError>;
}

/// Places GTC limit orders offset from the reference price, rounded to the
/// symbol's exchange filters.
pub struct LimitOrderExecutor {
    api_client: Arc<dyn ApiClient>,
    limit_offset: Decimal,
    dry_run: bool,
}

impl LimitOrderExecutor {
    pub fn new(api_client: Arc<dyn ApiClient>, limit_offset: Decimal, dry_run: bool) -> Self {
        Self { api_client, limit_offset, dry_run }
    }
}

#[async_trait]
impl Executor for LimitOrderExecutor {
    async fn execute(&self, order: &OrderRequest) -> Result<ExecutionOutcome, ExecutorError> {
        if order.quantity <= Decimal::ZERO || order.reference_price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidOrder(format!(
                "quantity {} and reference price {} must be positive",
                order.quantity, order.reference_price
            )));
        }

        let filters = self.api_client.symbol_filters(&order.symbol)?;
        let raw_price = limit_price(order.side, order.reference_price, self.limit_offset);
        let price = filters.round_price(raw_price);
        let quantity = filters.round_quantity(order.quantity);
        tracing::debug!(
            symbol = %order.symbol,
            side = %order.side,
            raw_price = %raw_price,
            %price,
            raw_quantity = %order.quantity,
            %quantity,
            "Rounded order to exchange filters."
        );

        if quantity.is_zero() {
            tracing::warn!(symbol = %order.symbol, "Quantity is zero after rounding. Skipping order.");
            return Ok(ExecutionOutcome::Skipped {
                reason: "quantity is zero after rounding".to_string(),
            });
        }

        if self.dry_run {
            tracing::info!(
                symbol = %order.symbol,
                side = %order.side,
                %quantity,
                %price,
                "DRY RUN: would place LIMIT order."
            );
            return Ok(ExecutionOutcome::Skipped { reason: "dry run".to_string() });
        }

        match self
            .api_client
            .place_limit_order(&order.symbol, order.side, quantity, price)
            .await
        {
            Ok(fill) => Ok(ExecutionOutcome::Filled(fill)),
            Err(ApiError::Unfilled(order_id)) => {
                tracing::warn!(symbol = %order.symbol, %order_id, "Order reported no fills.");
                Ok(ExecutionOutcome::Skipped { reason: format!("order {order_id} not filled") })
            }
            Err(e) => Err(e.into()),
        }
    }
}
