use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Industry-standard promoter cost buckets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    VenueFee,
    Production,
    Marketing,
    Insurance,
    Security,
    Catering,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::VenueFee,
        ExpenseCategory::Production,
        ExpenseCategory::Marketing,
        ExpenseCategory::Insurance,
        ExpenseCategory::Security,
        ExpenseCategory::Catering,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::VenueFee => "venue_fee",
            ExpenseCategory::Production => "production",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Insurance => "insurance",
            ExpenseCategory::Security => "security",
            ExpenseCategory::Catering => "catering",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| CoreError::UnknownVariant {
                field: "expense category",
                value: s.to_string(),
            })
    }
}

/// A costed line item the promoter carries for one stop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoterExpense {
    pub id: Uuid,
    pub tour_stop_id: Uuid,
    pub label: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub currency: String,
}

impl PromoterExpense {
    pub fn new(
        tour_stop_id: Uuid,
        label: impl Into<String>,
        category: ExpenseCategory,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tour_stop_id,
            label: label.into(),
            category,
            amount,
            currency: currency.into(),
        }
    }
}
