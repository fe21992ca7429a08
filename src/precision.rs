//! Quantization and step arithmetic over exchange price/amount increments.
//!
//! All functions are pure apart from the [`TradingCursor`] they are handed.
//! Values are [`Decimal`], so a step of `0.01` is exactly one hundredth and
//! repeated stepping never drifts.
//!
//! Rounding rules:
//! - [`quantize`] rounds to the nearest step, ties away from zero, and never
//!   returns less than one step;
//! - [`compute_minimum_amount`] rounds up, then adds one step of headroom.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::cursor::TradingCursor;
use crate::error::ValidationError;
use crate::market::MarketDescriptor;

const TEN: Decimal = Decimal::TEN;

/// Amount steps moved by one `step_amount` call.
pub const AMOUNT_STEP_FACTOR: Decimal = Decimal::TEN;

/// Direction of a price or amount adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Price-step granularity change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rescale {
    /// Multiply the price-step multiplier by 10.
    Coarser,
    /// Multiply the price-step multiplier by 0.1, never below 1.
    Finer,
}

/// Snap `value` to the closest multiple of `step`.
///
/// Ties round away from zero. The result is never smaller than one `step`.
/// A non-positive `step` leaves `value` untouched.
pub fn quantize(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    let units = match value.checked_div(step) {
        Some(ratio) => ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        None => return step,
    };
    units.checked_mul(step).unwrap_or(step).max(step)
}

/// Smallest amount whose value at `last_price` covers `min_notional`.
///
/// `ceil(min_notional / last_price / amount_step) * amount_step + amount_step`
/// when both `last_price` and `min_notional` are positive, otherwise one
/// amount step.
pub fn compute_minimum_amount(
    min_notional: Decimal,
    last_price: Decimal,
    amount_step: Decimal,
) -> Decimal {
    if amount_step <= Decimal::ZERO
        || last_price <= Decimal::ZERO
        || min_notional <= Decimal::ZERO
    {
        return amount_step;
    }
    let units = min_notional
        .checked_div(last_price)
        .and_then(|base| base.checked_div(amount_step))
        .map(|units| units.ceil());
    match units
        .and_then(|u| u.checked_mul(amount_step))
        .and_then(|a| a.checked_add(amount_step))
    {
        Some(amount) => amount,
        None => amount_step,
    }
}

/// Move the price by one effective step, snapped to the market tick.
///
/// Moving down never goes below one tick. A step too large to represent
/// leaves the price unchanged.
pub fn step_price(cursor: &mut TradingCursor, market: &MarketDescriptor, direction: Direction) {
    let Some(delta) = cursor.price_multiplier.checked_mul(market.price_step) else {
        return;
    };
    let raw = match direction {
        Direction::Up => cursor.price.checked_add(delta),
        Direction::Down => cursor.price.checked_sub(delta),
    };
    if let Some(raw) = raw {
        cursor.price = quantize(raw, market.price_step);
    }
}

/// Move the amount by ten amount steps (times the amount multiplier).
///
/// Moving down never goes below the cursor's minimum amount.
pub fn step_amount(cursor: &mut TradingCursor, market: &MarketDescriptor, direction: Direction) {
    let delta = AMOUNT_STEP_FACTOR * market.amount_step * cursor.amount_multiplier;
    cursor.amount = match direction {
        Direction::Up => quantize(cursor.amount.saturating_add(delta), market.amount_step),
        Direction::Down => {
            quantize(cursor.amount - delta, market.amount_step).max(cursor.min_amount)
        }
    };
}

/// Change the granularity of [`step_price`] without touching the price.
pub fn rescale_precision(cursor: &mut TradingCursor, rescale: Rescale) {
    cursor.price_multiplier = match rescale {
        Rescale::Coarser => cursor
            .price_multiplier
            .checked_mul(TEN)
            .unwrap_or(cursor.price_multiplier),
        Rescale::Finer => (cursor.price_multiplier / TEN).max(Decimal::ONE),
    };
}

/// Price back to `last_price`, amount back to the minimum, multipliers back to 1.
///
/// The side is left as it was. A non-positive `last_price` falls back to
/// one tick.
pub fn reset_cursor(cursor: &mut TradingCursor, market: &MarketDescriptor, last_price: Decimal) {
    cursor.price = if last_price > Decimal::ZERO {
        quantize(last_price, market.price_step)
    } else {
        market.price_step
    };
    cursor.min_amount =
        compute_minimum_amount(market.min_notional, last_price, market.amount_step);
    cursor.amount = cursor.min_amount;
    cursor.price_multiplier = Decimal::ONE;
    cursor.amount_multiplier = Decimal::ONE;
}

/// Recompute the minimum amount after a new last price was observed.
///
/// If the amount fell below the new minimum it is raised to it; otherwise
/// the amount is kept. Returns the new minimum.
pub fn observe_last_price(
    cursor: &mut TradingCursor,
    market: &MarketDescriptor,
    last_price: Decimal,
) -> Decimal {
    cursor.min_amount =
        compute_minimum_amount(market.min_notional, last_price, market.amount_step);
    if cursor.amount < cursor.min_amount {
        cursor.amount = cursor.min_amount;
    }
    cursor.min_amount
}

/// Order preconditions checked before anything is sent to an exchange.
pub fn check_order(
    price: Decimal,
    amount: Decimal,
    minimum: Decimal,
) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice);
    }
    if amount < minimum || amount <= Decimal::ZERO {
        return Err(ValidationError::BelowMinimum { amount, minimum });
    }
    Ok(())
}
