use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while parsing monetary identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Invalid currency code: {0:?} (expected three letters, e.g. EUR)")]
    InvalidCurrency(String),
}

/// An ISO 4217 style currency code, always stored upper-case.
///
/// Deserialization goes through [`CurrencyCode::parse`], so a malformed code
/// never makes it into a settlement input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Result<Self, MoneyError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display prefix used on settlement sheets
    pub fn symbol(&self) -> String {
        match self.0.as_str() {
            "EUR" => "€".to_string(),
            "USD" => "$".to_string(),
            "GBP" => "£".to_string(),
            other => format!("{} ", other),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Format an amount for display: symbol prefix, thousands separators, two decimals.
///
/// `format_money(dec!(1234567.891), &eur)` gives `€1,234,567.89`; losses keep
/// their sign in front of the symbol (`-€1,150.00`).
pub fn format_money(amount: Decimal, currency: &CurrencyCode) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{}", sign, currency.symbol(), grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_parse_normalises_case() {
        assert_eq!(code("eur").as_str(), "EUR");
        assert_eq!(code(" usd ").as_str(), "USD");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        assert!(CurrencyCode::parse("EURO").is_err());
        assert!(CurrencyCode::parse("E1R").is_err());
        assert!(CurrencyCode::parse("").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(ok, code("GBP"));
        assert!(serde_json::from_str::<CurrencyCode>("\"pounds\"").is_err());
    }

    #[test]
    fn test_format_money_symbols() {
        assert_eq!(format_money(dec!(1234.56), &code("EUR")), "€1,234.56");
        assert_eq!(format_money(dec!(999.99), &code("USD")), "$999.99");
        assert_eq!(format_money(dec!(500), &code("GBP")), "£500.00");
        assert_eq!(format_money(dec!(750.5), &code("CHF")), "CHF 750.50");
        assert_eq!(format_money(dec!(100), &code("JPY")), "JPY 100.00");
    }

    #[test]
    fn test_format_money_grouping_and_sign() {
        assert_eq!(format_money(dec!(1234567.891), &code("EUR")), "€1,234,567.89");
        assert_eq!(format_money(dec!(0), &code("EUR")), "€0.00");
        assert_eq!(format_money(dec!(-1150), &code("EUR")), "-€1,150.00");
        assert_eq!(format_money(dec!(-0.001), &code("EUR")), "€0.00");
    }
}
