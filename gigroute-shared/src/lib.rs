pub mod money;

pub use money::{format_money, CurrencyCode, MoneyError};
