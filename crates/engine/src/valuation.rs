use api_client::{ApiClient, ApiError};
use core_types::{AssetBalance, EnrichedBalance, TradeRecord};
use executor::resolve_position;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Balances and prices fetched once, valued in the quote currency.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub balances: Vec<AssetBalance>,
    /// Price per asset in the quote currency; assets with no price are absent.
    pub prices: HashMap<String, Decimal>,
    pub total_value: Decimal,
}

pub async fn take_snapshot(
    api: &dyn ApiClient,
    quote_currency: &str,
) -> Result<PortfolioSnapshot, ApiError> {
    let balances = api.get_account_balances().await?;
    let mut prices = HashMap::new();
    for balance in balances.iter().filter(|b| b.asset != quote_currency) {
        let symbol = format!("{}{}", balance.asset, quote_currency);
        if let Some(price) = api.get_current_price(&symbol).await {
            prices.insert(balance.asset.clone(), price);
        }
    }
    let total_value = risk::portfolio_value(&balances, quote_currency, &prices);
    tracing::debug!(total_value = %total_value.round_dp(2), assets = balances.len(), "Portfolio snapshot taken.");
    Ok(PortfolioSnapshot { balances, prices, total_value })
}

/// Values one holding. `entry_cost` is the cost of the open BUY, if any;
/// `change_24h_pct` is the ticker's 24h price change.
pub fn enrich_balance(
    balance: &AssetBalance,
    price: Option<Decimal>,
    entry_cost: Option<Decimal>,
    change_24h_pct: Option<Decimal>,
    quote_currency: &str,
) -> EnrichedBalance {
    let mut enriched = EnrichedBalance {
        asset: balance.asset.clone(),
        quantity: balance.free,
        usd_value: Decimal::ZERO,
        unrealized_pnl: Decimal::ZERO,
        unrealized_pnl_pct: Decimal::ZERO,
        change_24h: Decimal::ZERO,
        change_24h_pct: Decimal::ZERO,
    };

    if balance.asset == quote_currency {
        enriched.usd_value = balance.free;
        return enriched;
    }
    let Some(price) = price else {
        return enriched;
    };
    enriched.usd_value = balance.free * price;

    if let Some(cost) = entry_cost {
        enriched.unrealized_pnl = enriched.usd_value - cost;
        if cost > Decimal::ZERO {
            enriched.unrealized_pnl_pct = enriched.unrealized_pnl / cost * dec!(100);
        }
    }

    if let Some(pct) = change_24h_pct {
        let factor = Decimal::ONE + pct / dec!(100);
        if !factor.is_zero() {
            enriched.change_24h = enriched.usd_value - enriched.usd_value / factor;
        }
        enriched.change_24h_pct = pct;
    }
    enriched
}

/// Enriches every balance of `snapshot`, quote currency first.
pub async fn enrich_balances(
    api: &dyn ApiClient,
    snapshot: &PortfolioSnapshot,
    records: &[TradeRecord],
    quote_currency: &str,
) -> Vec<EnrichedBalance> {
    let mut enriched = Vec::with_capacity(snapshot.balances.len());
    for balance in &snapshot.balances {
        let symbol = format!("{}{}", balance.asset, quote_currency);
        let price = snapshot.prices.get(&balance.asset).copied();
        let change = if price.is_some() {
            api.get_24hr_change_pct(&symbol).await
        } else {
            None
        };
        let entry_cost = resolve_position(records, &symbol).entry().map(|r| r.cost);
        enriched.push(enrich_balance(balance, price, entry_cost, change, quote_currency));
    }
    enriched.sort_by_key(|b| b.asset != quote_currency);
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(asset: &str, free: Decimal) -> AssetBalance {
        AssetBalance { asset: asset.to_string(), free }
    }

    #[test]
    fn quote_currency_is_valued_at_face() {
        let e = enrich_balance(&holding("USDT", dec!(120)), None, None, None, "USDT");
        assert_eq!(e.usd_value, dec!(120));
    }

    #[test]
    fn unpriced_asset_is_worth_nothing() {
        let e = enrich_balance(&holding("XYZ", dec!(5)), None, Some(dec!(10)), Some(dec!(3)), "USDT");
        assert_eq!(e.usd_value, Decimal::ZERO);
        assert_eq!(e.unrealized_pnl, Decimal::ZERO);
    }

    #[test]
    fn unrealized_pnl_is_measured_against_entry_cost() {
        let e = enrich_balance(&holding("ETH", dec!(0.01)), Some(dec!(2000)), Some(dec!(15)), None, "USDT");
        assert_eq!(e.usd_value, dec!(20));
        assert_eq!(e.unrealized_pnl, dec!(5));
        assert_eq!(e.unrealized_pnl_pct.round_dp(4), dec!(33.3333));
    }

    #[test]
    fn day_change_is_backed_out_of_the_percentage() {
        let e = enrich_balance(&holding("SOL", dec!(1)), Some(dec!(110)), None, Some(dec!(10)), "USDT");
        assert_eq!(e.change_24h, dec!(10));
        assert_eq!(e.change_24h_pct, dec!(10));
    }

    #[test]
    fn total_wipeout_percentage_does_not_divide_by_zero() {
        let e = enrich_balance(&holding("SOL", dec!(1)), Some(dec!(1)), None, Some(dec!(-100)), "USDT");
        assert_eq!(e.change_24h, Decimal::ZERO);
        assert_eq!(e.change_24h_pct, dec!(-100));
    }
}
