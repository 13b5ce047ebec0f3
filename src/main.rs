use alerter::{DisabledNotifier, Notifier, TelegramAlerter};
use anyhow::Context;
use api_client::{ApiClient, BinanceClient};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{init_logging, load_config, Config};
use engine::TradingEngine;
use executor::{resolve_position, LimitOrderExecutor, PositionState};
use ledger::{CsvTradeLedger, DailyBalanceLog, LedgerStore, LedgerSummary};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the Meridian trading bot.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; credentials may come from the real environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = init_logging(&config.logging).context("failed to initialise logging")?;

    match cli.command {
        Commands::Run(args) => handle_run(config, args).await,
        Commands::CheckKeys => handle_check_keys(config).await,
        Commands::Report => handle_report(config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A single-account spot trading bot for Binance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop until Ctrl-C or a fatal error.
    Run(RunArgs),
    /// Verify the API credentials with a signed account request.
    CheckKeys,
    /// Print realized P&L and open positions from the trade ledger.
    Report,
}

#[derive(Parser)]
struct RunArgs {
    /// Evaluate everything but log orders instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_run(config: Config, args: RunArgs) -> anyhow::Result<()> {
    tracing::info!(
        products = ?config.trading.products,
        dry_run = args.dry_run,
        "Starting Meridian trading bot."
    );

    let api_client: Arc<dyn ApiClient> =
        Arc::new(BinanceClient::new(&config.api).context("failed to build the exchange client")?);
    let executor = Arc::new(LimitOrderExecutor::new(
        api_client.clone(),
        config.trading.limit_order_offset,
        args.dry_run,
    ));
    let ledger = Arc::new(CsvTradeLedger::new(&config.ledger.trade_log_path));
    let daily_balances = DailyBalanceLog::new(&config.ledger.daily_balance_path);

    let notifier: Arc<dyn Notifier> = match TelegramAlerter::new(
        &config.telegram,
        config.trading.notification_balance_threshold,
        &config.trading.quote_currency,
    ) {
        Some(alerter) => Arc::new(alerter),
        None => {
            tracing::warn!("Telegram credentials not set. Notifications are disabled.");
            Arc::new(DisabledNotifier)
        }
    };

    let mut engine = TradingEngine::new(
        config,
        api_client,
        executor,
        ledger,
        daily_balances,
        notifier,
    )?;
    engine.run().await?;

    tracing::info!("Meridian stopped.");
    Ok(())
}

async fn handle_check_keys(config: Config) -> anyhow::Result<()> {
    let client = BinanceClient::new(&config.api).context("failed to build the exchange client")?;
    let offset_ms = client.sync_time().await.context("could not reach the exchange")?;
    let balances = client
        .get_account_balances()
        .await
        .context("signed account request failed; check the API key and secret")?;

    println!("API keys are valid (clock offset {offset_ms} ms).");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Asset", "Free"]);
    for balance in &balances {
        table.add_row(vec![balance.asset.clone(), balance.free.normalize().to_string()]);
    }
    println!("{table}");
    Ok(())
}

fn handle_report(config: Config) -> anyhow::Result<()> {
    let ledger = CsvTradeLedger::new(&config.ledger.trade_log_path);
    let records = ledger
        .read_all()
        .with_context(|| format!("failed to read {}", ledger.path().display()))?;
    let summary = LedgerSummary::from_records(&records);

    let mut totals = Table::new();
    totals.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    totals.add_row(vec!["Trades".to_string(), summary.total_trades.to_string()]);
    totals.add_row(vec!["Buys / Sells".to_string(), format!("{} / {}", summary.buys, summary.sells)]);
    totals.add_row(vec![
        "Realized P&L".to_string(),
        format!("{} {}", summary.realized_pnl.round_dp(2), config.trading.quote_currency),
    ]);
    totals.add_row(vec!["Win rate".to_string(), format!("{}%", summary.win_rate_pct().round_dp(2))]);
    totals.add_row(vec!["Commission paid".to_string(), summary.total_commission.normalize().to_string()]);
    println!("{totals}");

    let symbols: BTreeSet<&str> = config
        .trading
        .products
        .iter()
        .map(String::as_str)
        .chain(records.iter().map(|r| r.symbol.as_str()))
        .collect();

    let mut positions = Table::new();
    positions
        .load_preset(UTF8_FULL)
        .set_header(vec!["Symbol", "Position", "Entry price", "Quantity", "Cost"]);
    for symbol in symbols {
        let row = match resolve_position(&records, symbol) {
            PositionState::Open(entry) => vec![
                symbol.to_string(),
                "OPEN".to_string(),
                entry.fill_price.normalize().to_string(),
                entry.quantity.normalize().to_string(),
                entry.cost.round_dp(2).to_string(),
            ],
            PositionState::Closed => vec![
                symbol.to_string(),
                "CLOSED".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ],
        };
        positions.add_row(row);
    }
    println!("{positions}");
    Ok(())
}
