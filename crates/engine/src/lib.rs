//! # Meridian Engine Crate
//!
//! The cycle orchestrator. Once per interval it synchronizes with the exchange
//! clock, runs scheduled tasks (the daily summary) and then walks every configured
//! symbol through the pipeline:
//!
//! `CANARY -> FETCH -> CRASH -> SIGNAL -> RESOLVE_POSITION -> DECIDE -> EXECUTE`
//!
//! Everything runs sequentially on one task; there is no overlap between cycles.

use crate::decision::decide;
use crate::valuation::{enrich_balances, take_snapshot};
use alerter::Notifier;
use api_client::ApiClient;
use chrono::{DateTime, Duration, Utc};
use configuration::{Config, StrategyProfile};
use core_types::{ensure_ordered, OrderSide, TradeRecord};
use executor::{resolve_position, ExecutionOutcome, Executor, OrderRequest};
use ledger::{DailyBalanceLog, LedgerStore};
use risk::{RiskGate, RiskVerdict};
use rust_decimal::Decimal;
use std::sync::Arc;
use strategies::{MACrossover, Strategy, StrategySelector};

pub mod decision;
pub mod error;
pub mod valuation;

pub use decision::{Decision, SymbolOutcome};
pub use error::EngineError;
pub use valuation::PortfolioSnapshot;

/// The base asset of `symbol`, i.e. the symbol with the quote currency removed.
pub fn base_asset<'a>(symbol: &'a str, quote_currency: &str) -> &'a str {
    symbol.strip_suffix(quote_currency).unwrap_or(symbol)
}

/// The central orchestrator for the live trading application.
pub struct TradingEngine {
    config: Config,

    api_client: Arc<dyn ApiClient>,
    executor: Arc<dyn Executor>,
    ledger: Arc<dyn LedgerStore>,
    daily_balances: DailyBalanceLog,
    notifier: Arc<dyn Notifier>,

    risk_gate: RiskGate,
    selector: StrategySelector,

    last_summary_at: Option<DateTime<Utc>>,
}

impl TradingEngine {
    /// Creates a new `TradingEngine` instance with all its required components.
    pub fn new(
        config: Config,
        api_client: Arc<dyn ApiClient>,
        executor: Arc<dyn Executor>,
        ledger: Arc<dyn LedgerStore>,
        daily_balances: DailyBalanceLog,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, EngineError> {
        if config.trading.products.is_empty() {
            return Err(EngineError::Configuration(
                "no products configured".to_string(),
            ));
        }
        let risk_gate = RiskGate::new(config.risk_management.clone())?;
        let selector =
            StrategySelector::new(config.trading_windows.clone(), config.strategies.clone());

        Ok(Self {
            config,
            api_client,
            executor,
            ledger,
            daily_balances,
            notifier,
            risk_gate,
            selector,
            last_summary_at: None,
        })
    }

    /// Loads exchange filters for every configured product.
    pub async fn init(&self) -> Result<(), EngineError> {
        tracing::info!(products = ?self.config.trading.products, "Initializing trading engine...");
        self.api_client
            .load_symbol_filters(&self.config.trading.products)
            .await?;
        Ok(())
    }

    /// The main loop. Returns `Ok` on Ctrl-C and `Err` on any fatal cycle error,
    /// after the operator has been notified.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.init().await?;
        let interval = std::time::Duration::from_secs(self.config.trading.cycle_interval_secs);

        loop {
            match self.run_cycle(Utc::now()).await {
                Ok(outcomes) => tracing::info!(
                    symbols = outcomes.len(),
                    sleep_secs = interval.as_secs(),
                    "Full cycle complete."
                ),
                Err(e) if e.is_clock_skew() => tracing::warn!(
                    error = %e,
                    "TIMESTAMP ERROR: clock drift despite resync. Pausing before retry."
                ),
                Err(e) => {
                    tracing::error!(error = %e, "A critical error occurred in the main loop.");
                    self.notifier.notify_error(&e.to_string()).await;
                    return Err(e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received. Stopping engine.");
                    return Ok(());
                }
            }
        }
    }

    /// One full cycle: time sync, scheduled tasks, strategy cycle.
    pub async fn run_cycle(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, SymbolOutcome)>, EngineError> {
        match self.api_client.sync_time().await {
            Ok(offset_ms) => tracing::debug!(offset_ms, "Time synchronized."),
            Err(e) => tracing::warn!(error = %e, "Could not sync time with exchange server."),
        }
        self.run_scheduled_tasks(now).await;
        self.run_strategy_cycle(now).await
    }

    fn summary_due(&self, now: DateTime<Utc>) -> bool {
        let every = Duration::hours(self.config.trading.daily_summary_interval_hours as i64);
        self.last_summary_at.is_none_or(|last| now - last >= every)
    }

    /// Sends the daily summary when due. Failures are logged and retried next cycle.
    pub async fn run_scheduled_tasks(&mut self, now: DateTime<Utc>) {
        if !self.summary_due(now) {
            return;
        }
        tracing::info!("Performing daily task: sending status notification.");
        match self.send_daily_summary(now).await {
            Ok(()) => self.last_summary_at = Some(now),
            Err(e) => tracing::warn!(error = %e, "Failed to send daily notification."),
        }
    }

    async fn send_daily_summary(&self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let quote = self.config.trading.quote_currency.as_str();
        let snapshot = take_snapshot(self.api_client.as_ref(), quote).await?;
        let records = self.ledger.read_all()?;
        let balances = enrich_balances(self.api_client.as_ref(), &snapshot, &records, quote).await;

        let today = now.date_naive();
        let previous = self
            .daily_balances
            .previous_day_value(today)?
            .unwrap_or_default();
        self.notifier
            .notify_daily_summary(snapshot.total_value, previous, &balances)
            .await;

        if !self.daily_balances.has_logged_today(today)? {
            self.daily_balances.log_daily_balance(today, snapshot.total_value)?;
        }
        Ok(())
    }

    /// Picks the profile for `now` and processes every product in order.
    pub async fn run_strategy_cycle(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, SymbolOutcome)>, EngineError> {
        let (mode, profile) = self.selector.select(now);
        let Some(profile) = profile else {
            tracing::info!(%mode, "In STOPPED trading window. Pausing until the next hour.");
            return Ok(Vec::new());
        };
        tracing::info!(%mode, granularity = %profile.granularity, "Selected trading window.");

        let snapshot =
            take_snapshot(self.api_client.as_ref(), &self.config.trading.quote_currency).await?;
        let portfolio = self.risk_gate.check_portfolio(snapshot.total_value);

        let products = &self.config.trading.products;
        let pause = std::time::Duration::from_secs(self.config.trading.symbol_pause_secs);
        let mut outcomes = Vec::with_capacity(products.len());
        for (i, symbol) in products.iter().enumerate() {
            let outcome = self.process_symbol(symbol, profile, portfolio.safe).await?;
            outcomes.push((symbol.clone(), outcome));
            if i + 1 < products.len() {
                tokio::time::sleep(pause).await;
            }
        }
        Ok(outcomes)
    }

    /// Runs the full per-symbol pipeline.
    pub async fn process_symbol(
        &self,
        symbol: &str,
        profile: &StrategyProfile,
        portfolio_safe: bool,
    ) -> Result<SymbolOutcome, EngineError> {
        if self.risk_gate.guards_symbol(symbol) && !self.canary_is_safe().await? {
            tracing::warn!(
                symbol,
                asset = %self.risk_gate.params().canary_asset,
                "CANARY FAILSAFE: all trading in this asset is paused."
            );
            return Ok(SymbolOutcome::CanaryHalted);
        }

        tracing::info!(symbol, granularity = %profile.granularity, "Analyzing symbol.");
        let lookback = Duration::hours(self.config.api.kline_lookback_hours);
        let bars = match self
            .api_client
            .fetch_recent_klines(symbol, &profile.granularity, lookback)
            .await
        {
            Ok(bars) => bars,
            Err(e) if e.is_clock_skew() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Error fetching historical data. Skipping symbol.");
                return Ok(SymbolOutcome::Skipped(format!("market data unavailable: {e}")));
            }
        };
        if let Err(e) = ensure_ordered(&bars) {
            tracing::error!(symbol, error = %e, "Exchange returned unordered bars. Skipping symbol.");
            return Ok(SymbolOutcome::Skipped(e.to_string()));
        }

        let crash = self.risk_gate.check_crash(symbol, &bars);
        if crash.crash {
            return Ok(SymbolOutcome::CrashDetected);
        }

        let strategy = MACrossover::new(profile.clone(), symbol.to_string())?;
        let signal = strategy.evaluate(&bars)?;

        let records = self.ledger.read_all()?;
        let position = resolve_position(&records, symbol);

        let verdict = RiskVerdict {
            portfolio_safe,
            asset_halted: false,
            crash_detected: crash.crash,
        };
        let decision = decide(signal.kind, &position, &verdict);
        tracing::info!(
            symbol,
            signal = %signal.kind,
            reason = %signal.reason,
            position = %position,
            verdict = ?verdict,
            decision = ?decision,
            "Signal evaluated."
        );

        let trade = match decision {
            Decision::Buy => self.execute_buy(symbol).await?,
            Decision::Sell => match position.entry() {
                Some(entry) => self.execute_sell(symbol, entry).await?,
                None => None,
            },
            Decision::Noop => None,
        };

        Ok(SymbolOutcome::Evaluated { signal, decision, trade })
    }

    /// Canary check. An unreadable balance or price fails closed.
    async fn canary_is_safe(&self) -> Result<bool, EngineError> {
        let asset = self.risk_gate.params().canary_asset.clone();
        let balance = match self.api_client.get_asset_balance(&asset).await {
            Ok(balance) => balance,
            Err(e) if e.is_clock_skew() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(%asset, error = %e, "Error fetching canary balance.");
                return Ok(false);
            }
        };
        let symbol = format!("{}{}", asset, self.config.trading.quote_currency);
        let price = self.api_client.get_current_price(&symbol).await;
        Ok(self.risk_gate.check_canary(balance, price).safe)
    }

    async fn execute_buy(&self, symbol: &str) -> Result<Option<TradeRecord>, EngineError> {
        let Some(price) = self.current_price(symbol).await else {
            return Ok(None);
        };
        let order = OrderRequest {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            quantity: self.config.trading.trade_amount / price,
            reference_price: price,
        };
        self.submit(order, None).await
    }

    async fn execute_sell(
        &self,
        symbol: &str,
        entry: &TradeRecord,
    ) -> Result<Option<TradeRecord>, EngineError> {
        let base = base_asset(symbol, &self.config.trading.quote_currency);
        let balance = match self.api_client.get_asset_balance(base).await {
            Ok(balance) => balance,
            Err(e) if e.is_clock_skew() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(symbol, asset = base, error = %e, "Error fetching balance. Skipping sell.");
                return Ok(None);
            }
        };
        if balance <= Decimal::ZERO {
            tracing::warn!(symbol, asset = base, "No free balance to sell. Skipping sell.");
            return Ok(None);
        }
        let Some(price) = self.current_price(symbol).await else {
            return Ok(None);
        };
        let order = OrderRequest {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            quantity: balance,
            reference_price: price,
        };
        self.submit(order, Some(entry)).await
    }

    async fn current_price(&self, symbol: &str) -> Option<Decimal> {
        match self.api_client.get_current_price(symbol).await {
            Some(price) if price > Decimal::ZERO => Some(price),
            _ => {
                tracing::warn!(symbol, "Current price unavailable. Skipping order.");
                None
            }
        }
    }

    /// Executes `order` and appends exactly one ledger row on a fill. `entry` is
    /// the BUY being closed by a sell; realized P&L is its cost against the sale.
    async fn submit(
        &self,
        order: OrderRequest,
        entry: Option<&TradeRecord>,
    ) -> Result<Option<TradeRecord>, EngineError> {
        match self.executor.execute(&order).await {
            Ok(ExecutionOutcome::Filled(fill)) => {
                let pnl = entry.map_or(Decimal::ZERO, |e| fill.cost - e.cost);
                let record = fill.into_record(Utc::now(), pnl);
                self.ledger.append(&record)?;
                Ok(Some(record))
            }
            Ok(ExecutionOutcome::Skipped { reason }) => {
                tracing::info!(symbol = %order.symbol, side = %order.side, %reason, "Order not executed.");
                Ok(None)
            }
            Err(e) if e.is_clock_skew() => Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    symbol = %order.symbol,
                    side = %order.side,
                    error = %e,
                    "Order failed. Not retrying this cycle."
                );
                Ok(None)
            }
        }
    }
}
