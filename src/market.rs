//! Market descriptor: the per-symbol precision rules of an exchange.

use std::fmt;

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Trading rules for one symbol, fetched once per symbol selection.
///
/// `price_step` and `amount_step` are the smallest increments the exchange
/// accepts. `min_notional` is the smallest order value in quote currency,
/// zero when the exchange does not publish one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketDescriptor {
    /// Unified symbol, `BASE/QUOTE`.
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub price_step: Decimal,
    pub amount_step: Decimal,
    pub min_notional: Decimal,
}

impl MarketDescriptor {
    /// Build a descriptor, rejecting non-positive steps and negative notionals.
    pub fn new(
        base: &str,
        quote: &str,
        price_step: Decimal,
        amount_step: Decimal,
        min_notional: Decimal,
    ) -> Result<Self, ValidationError> {
        let market = Self {
            symbol: unified_symbol(base, quote),
            base: base.to_string(),
            quote: quote.to_string(),
            price_step,
            amount_step,
            min_notional,
        };
        market.validate()?;
        Ok(market)
    }

    /// Check the step and notional invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.price_step <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveStep("price"));
        }
        if self.amount_step <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveStep("amount"));
        }
        if self.min_notional < Decimal::ZERO {
            return Err(ValidationError::NegativeNotional);
        }
        Ok(())
    }
}

impl fmt::Display for MarketDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (tick {}, lot {}, min notional {})",
            self.symbol, self.price_step, self.amount_step, self.min_notional
        )
    }
}

/// Join base and quote assets into the unified `BASE/QUOTE` form.
pub fn unified_symbol(base: &str, quote: &str) -> String {
    format!("{base}/{quote}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_builds_unified_symbol() {
        let m = MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.00001), dec!(5)).unwrap();
        assert_eq!(m.symbol, "BTC/USDT");
        assert_eq!(m.base, "BTC");
        assert_eq!(m.quote, "USDT");
    }

    #[test]
    fn rejects_zero_steps() {
        assert_eq!(
            MarketDescriptor::new("BTC", "USDT", dec!(0), dec!(0.001), dec!(5)),
            Err(ValidationError::NonPositiveStep("price"))
        );
        assert_eq!(
            MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(-1), dec!(5)),
            Err(ValidationError::NonPositiveStep("amount"))
        );
    }

    #[test]
    fn rejects_negative_notional() {
        assert_eq!(
            MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.001), dec!(-1)),
            Err(ValidationError::NegativeNotional)
        );
    }

    #[test]
    fn zero_notional_is_allowed() {
        assert!(MarketDescriptor::new("ETH", "BTC", dec!(0.00001), dec!(0.001), dec!(0)).is_ok());
    }
}
