//! Trading cursor: the price, amount and side the user is about to submit.

use rust_decimal::Decimal;

use crate::market::MarketDescriptor;
use crate::precision;
use crate::side::Side;

/// Mutable session state for one selected market.
///
/// Invariants, maintained by the functions in [`crate::precision`]:
/// - `price` is a positive multiple of the market's price step;
/// - `amount` is a multiple of the amount step and never below `min_amount`;
/// - both multipliers are powers of ten, at least one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradingCursor {
    pub(crate) price: Decimal,
    pub(crate) amount: Decimal,
    pub(crate) price_multiplier: Decimal,
    pub(crate) amount_multiplier: Decimal,
    pub(crate) min_amount: Decimal,
    pub(crate) side: Side,
}

impl TradingCursor {
    /// A cursor reset to `last_price` and the minimum amount, on the buy side.
    pub fn new(market: &MarketDescriptor, last_price: Decimal) -> Self {
        let mut cursor = Self {
            price: market.price_step,
            amount: market.amount_step,
            price_multiplier: Decimal::ONE,
            amount_multiplier: Decimal::ONE,
            min_amount: market.amount_step,
            side: Side::Buy,
        };
        precision::reset_cursor(&mut cursor, market, last_price);
        cursor
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price_multiplier(&self) -> Decimal {
        self.price_multiplier
    }

    pub fn amount_multiplier(&self) -> Decimal {
        self.amount_multiplier
    }

    /// Minimum tradable amount at the last observed price.
    pub fn min_amount(&self) -> Decimal {
        self.min_amount
    }

    /// Price increment applied by one up/down step.
    pub fn effective_price_step(&self, market: &MarketDescriptor) -> Decimal {
        self.price_multiplier * market.price_step
    }

    /// Order value in quote currency.
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }

    /// Flip between buy and sell.
    pub fn toggle_side(&mut self) {
        self.side = self.side.opposite();
    }

    pub fn set_side(&mut self, side: Side) {
        self.side = side;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market() -> MarketDescriptor {
        MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.001), dec!(10)).unwrap()
    }

    #[test]
    fn new_starts_at_last_price_and_minimum() {
        let c = TradingCursor::new(&market(), dec!(100));
        assert_eq!(c.price(), dec!(100));
        assert_eq!(c.amount(), dec!(0.101));
        assert_eq!(c.min_amount(), dec!(0.101));
        assert_eq!(c.price_multiplier(), Decimal::ONE);
        assert_eq!(c.side(), Side::Buy);
    }

    #[test]
    fn toggle_side_flips() {
        let mut c = TradingCursor::new(&market(), dec!(100));
        c.toggle_side();
        assert_eq!(c.side(), Side::Sell);
        c.toggle_side();
        assert_eq!(c.side(), Side::Buy);
    }

    #[test]
    fn notional_is_price_times_amount() {
        let c = TradingCursor::new(&market(), dec!(100));
        assert_eq!(c.notional(), dec!(10.1));
    }

    #[test]
    fn zero_last_price_falls_back_to_one_tick() {
        let c = TradingCursor::new(&market(), Decimal::ZERO);
        assert_eq!(c.price(), dec!(0.01));
        assert_eq!(c.amount(), dec!(0.001));
    }
}
