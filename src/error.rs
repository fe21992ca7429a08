//! Validation errors for cursor state and order submission.

use rust_decimal::Decimal;

/// Local precondition failures. These never reach an exchange.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Amount is smaller than the minimum tradable quantity.
    #[error("amount {amount} is below the minimum {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    /// Price must be greater than zero for limit orders.
    #[error("price must be greater than zero")]
    NonPositivePrice,

    /// A market step (price or amount increment) must be greater than zero.
    #[error("{0} step must be greater than zero")]
    NonPositiveStep(&'static str),

    /// Minimum notional cannot be negative.
    #[error("minimum notional must not be negative")]
    NegativeNotional,

    /// Nothing is selected (empty list, no market loaded).
    #[error("nothing selected")]
    EmptySelection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display() {
        assert_eq!(
            ValidationError::BelowMinimum {
                amount: dec!(0.05),
                minimum: dec!(0.101),
            }
            .to_string(),
            "amount 0.05 is below the minimum 0.101"
        );
        assert_eq!(
            ValidationError::NonPositivePrice.to_string(),
            "price must be greater than zero"
        );
        assert_eq!(
            ValidationError::NonPositiveStep("price").to_string(),
            "price step must be greater than zero"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(ValidationError::EmptySelection);
        assert!(err.to_string().contains("selected"));
    }
}
