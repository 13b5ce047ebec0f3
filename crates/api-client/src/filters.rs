use rust_decimal::Decimal;

/// Exchange precision rules for one symbol (`PRICE_FILTER` and `LOT_SIZE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFilters {
    pub tick_size: Decimal,
    pub step_size: Decimal,
}

impl SymbolFilters {
    /// Rounds a price down to the nearest valid tick.
    pub fn round_price(&self, price: Decimal) -> Decimal {
        floor_to_increment(price, self.tick_size)
    }

    /// Rounds a quantity down to the nearest valid step. May return zero.
    pub fn round_quantity(&self, quantity: Decimal) -> Decimal {
        floor_to_increment(quantity, self.step_size)
    }
}

fn floor_to_increment(value: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return value;
    }
    ((value / increment).floor() * increment).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filters() -> SymbolFilters {
        SymbolFilters { tick_size: dec!(0.01000000), step_size: dec!(0.00010000) }
    }

    #[test]
    fn prices_round_down_to_tick() {
        assert_eq!(filters().round_price(dec!(3012.3456)), dec!(3012.34));
        assert_eq!(filters().round_price(dec!(3012.34)), dec!(3012.34));
    }

    #[test]
    fn quantities_round_down_to_step() {
        assert_eq!(filters().round_quantity(dec!(0.0049837)), dec!(0.0049));
    }

    #[test]
    fn tiny_quantities_round_to_zero() {
        assert!(filters().round_quantity(dec!(0.00009)).is_zero());
    }

    #[test]
    fn zero_increment_leaves_value_untouched() {
        let f = SymbolFilters { tick_size: Decimal::ZERO, step_size: Decimal::ZERO };
        assert_eq!(f.round_price(dec!(1.23456)), dec!(1.23456));
    }
}
