//! # quicktrade
//!
//! Precision arithmetic for manual limit-order entry against crypto exchanges.
//!
//! Exchanges accept prices and amounts only in fixed increments (the *tick*
//! and the *lot*), and reject orders whose value is below a minimum notional.
//! This crate holds the pure rules for keeping an order-entry cursor valid
//! under those constraints. It does no I/O.
//!
//! ## Quick Start
//!
//! ```
//! use quicktrade::{Direction, MarketDescriptor, Rescale, TradingCursor, precision};
//! use rust_decimal_macros::dec;
//!
//! let market = MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.001), dec!(10)).unwrap();
//! let mut cursor = TradingCursor::new(&market, dec!(100));
//!
//! // 10 USDT at 100 needs 0.1 BTC, plus one lot of headroom
//! assert_eq!(cursor.amount(), dec!(0.101));
//!
//! precision::step_price(&mut cursor, &market, Direction::Up);
//! assert_eq!(cursor.price(), dec!(100.01));
//!
//! precision::rescale_precision(&mut cursor, Rescale::Coarser);
//! precision::step_price(&mut cursor, &market, Direction::Up);
//! assert_eq!(cursor.price(), dec!(100.11));
//! ```
//!
//! ## Rounding
//!
//! | Operation | Rule |
//! |-----------|------|
//! | [`quantize`] | nearest multiple, ties away from zero, at least one step |
//! | [`compute_minimum_amount`] | ceiling, plus one amount step |
//!
//! ```
//! use quicktrade::quantize;
//! use rust_decimal_macros::dec;
//!
//! assert_eq!(quantize(dec!(100.005), dec!(0.01)), dec!(100.01));
//! assert_eq!(quantize(dec!(0.001), dec!(0.01)), dec!(0.01));
//! ```

pub mod cursor;
pub mod error;
pub mod market;
pub mod precision;
pub mod side;

pub use cursor::TradingCursor;
pub use error::ValidationError;
pub use market::{MarketDescriptor, unified_symbol};
pub use precision::{
    Direction, Rescale, check_order, compute_minimum_amount, quantize, rescale_precision,
    reset_cursor, step_amount, step_price,
};
pub use side::{ParseSideError, Side};
