//! Shared primitives: money and currency.

pub mod money;

pub use money::{Currency, Money, MoneyError};
