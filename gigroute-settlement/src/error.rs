use gigroute_shared::{CurrencyCode, MoneyError};
use rust_decimal::Decimal;

/// Input validation failures.
///
/// Raised before any arithmetic runs; each variant names the field or rule
/// that was violated so the caller can show it as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettlementError {
    #[error("tickets sold ({tickets_sold}) cannot exceed venue capacity ({capacity})")]
    CapacityExceeded { tickets_sold: u64, capacity: u32 },

    #[error("invalid currency code {0:?}")]
    InvalidCurrency(String),

    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange { field: &'static str, value: Decimal },

    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount { field: String, value: Decimal },

    #[error("{field} must be greater than zero, got {value}")]
    NonPositivePrice { field: String, value: Decimal },

    #[error("tier {tier:?} sold {sold} tickets but only {available} were available")]
    TierOversold { tier: String, sold: u32, available: u32 },

    #[error("expense {line:?} is in {found}, settlement currency is {expected}")]
    CurrencyMismatch {
        line: String,
        expected: CurrencyCode,
        found: String,
    },

    #[error("{0} is required to settle this show")]
    MissingField(&'static str),

    #[error("amount too large while computing {step}")]
    Overflow { step: &'static str },
}

impl SettlementError {
    /// The input field the error refers to
    pub fn field(&self) -> &str {
        match self {
            SettlementError::CapacityExceeded { .. } => "tickets_sold",
            SettlementError::InvalidCurrency(_) => "currency",
            SettlementError::PercentOutOfRange { field, .. } => *field,
            SettlementError::NegativeAmount { field, .. } => field.as_str(),
            SettlementError::NonPositivePrice { field, .. } => field.as_str(),
            SettlementError::TierOversold { .. } => "tiers",
            SettlementError::CurrencyMismatch { .. } => "promoter_expenses",
            SettlementError::MissingField(field) => *field,
            SettlementError::Overflow { step } => *step,
        }
    }
}

impl From<MoneyError> for SettlementError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::InvalidCurrency(code) => SettlementError::InvalidCurrency(code),
        }
    }
}

pub type SettlementResult<T> = Result<T, SettlementError>;
