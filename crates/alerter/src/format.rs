use core_types::EnrichedBalance;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Inside a MarkdownV2 pre block only the backtick and backslash need escaping.
fn escape_pre(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}

fn signed(value: Decimal) -> &'static str {
    if value >= Decimal::ZERO { "+" } else { "" }
}

/// Percent change from `previous` to `current`; zero when there is no previous value.
pub fn change_pct(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        (current - previous) / previous * dec!(100)
    } else {
        Decimal::ZERO
    }
}

pub fn format_error(message: &str) -> String {
    format!(
        "🚨 *BOT ERROR* 🚨\nThe bot has encountered a fatal error\\.\n```\n{}\n```",
        escape_pre(message)
    )
}

/// Balances worth showing in the summary: above `threshold`, excluding the quote
/// currency, most valuable first.
pub fn breakdown<'a>(
    balances: &'a [EnrichedBalance],
    threshold: Decimal,
    quote_currency: &str,
) -> Vec<&'a EnrichedBalance> {
    let mut shown: Vec<&EnrichedBalance> = balances
        .iter()
        .filter(|b| b.usd_value > threshold && b.asset != quote_currency)
        .collect();
    shown.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
    shown
}

pub fn format_daily_summary(
    current: Decimal,
    previous: Decimal,
    balances: &[EnrichedBalance],
    threshold: Decimal,
    quote_currency: &str,
) -> String {
    let change = current - previous;
    let pct = change_pct(current, previous);
    let sign = signed(change);

    let mut text = format!(
        "*Daily Portfolio Summary*\n```\nCurrent:  ${:.2}\nPrevious: ${:.2}\nChange:   {}${:.2} ({}{:.2}%)\n```",
        current, previous, sign, change, sign, pct
    );

    let lines: Vec<String> = breakdown(balances, threshold, quote_currency)
        .into_iter()
        .flat_map(|b| {
            let sign = signed(b.change_24h);
            [
                format!("{}: ${:.2} ({:.6} {})", b.asset, b.usd_value, b.quantity, b.asset),
                format!("Change: {}${:.2} ({}{:.2}%)", sign, b.change_24h, sign, b.change_24h_pct),
            ]
        })
        .collect();

    if !lines.is_empty() {
        text.push_str("\n*Coin Breakdown \\(24h Change\\)*\n```\n");
        text.push_str(&escape_pre(&lines.join("\n")));
        text.push_str("\n```");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(asset: &str, usd_value: Decimal, change: Decimal, change_pct: Decimal) -> EnrichedBalance {
        EnrichedBalance {
            asset: asset.to_string(),
            quantity: dec!(1.5),
            usd_value,
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_pct: Decimal::ZERO,
            change_24h: change,
            change_24h_pct: change_pct,
        }
    }

    #[test]
    fn error_text_escapes_only_pre_block_specials() {
        let text = format_error("bad `code` in C:\\path (-1013)");
        assert!(text.contains("bad \\`code\\` in C:\\\\path (-1013)"));
    }

    #[test]
    fn change_pct_without_previous_is_zero() {
        assert_eq!(change_pct(dec!(250), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(change_pct(dec!(220), dec!(200)), dec!(10));
    }

    #[test]
    fn breakdown_filters_quote_and_small_balances() {
        let balances = vec![
            balance("USDT", dec!(500), dec!(0), dec!(0)),
            balance("ETH", dec!(30), dec!(1), dec!(3.4)),
            balance("SHIB", dec!(0.5), dec!(0), dec!(0)),
            balance("BTC", dec!(80), dec!(-2), dec!(-2.4)),
        ];
        let shown: Vec<&str> = breakdown(&balances, dec!(1), "USDT")
            .into_iter()
            .map(|b| b.asset.as_str())
            .collect();
        assert_eq!(shown, vec!["BTC", "ETH"]);
    }

    #[test]
    fn summary_reports_signed_change() {
        let balances = vec![balance("BTC", dec!(80), dec!(-2), dec!(-2.4))];
        let text = format_daily_summary(dec!(220), dec!(200), &balances, Decimal::ZERO, "USDT");
        assert!(text.contains("Current:  $220.00"));
        assert!(text.contains("Change:   +$20.00 (+10.00%)"));
        assert!(text.contains("BTC: $80.00 (1.500000 BTC)"));
        assert!(text.contains("Change: $-2.00 (-2.40%)"));
    }

    #[test]
    fn summary_without_holdings_has_no_breakdown() {
        let text = format_daily_summary(dec!(200), dec!(200), &[], Decimal::ZERO, "USDT");
        assert!(!text.contains("Coin Breakdown"));
    }
}
