use gigroute_core::ExpenseCategory;
use gigroute_shared::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side of the versus deal paid the artist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Flat guarantee, also used when both sides are equal
    Guarantee,
    /// Door-deal percentage strictly above the guarantee
    DoorDeal,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Guarantee => "guarantee",
            PaymentType::DoorDeal => "door_deal",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierLine {
    pub name: String,
    pub price: Decimal,
    pub sold: u32,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseLine {
    pub label: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
}

/// Full settlement breakdown for one show.
///
/// All amounts are exact (no rounding) and in `currency`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settlement {
    pub currency: CurrencyCode,

    // Box office
    pub capacity: u32,
    pub tickets_sold: u32,
    /// Percentage of capacity sold, one decimal place
    pub fill_rate: Decimal,
    /// Flat price, or weighted average for tiered shows
    pub ticket_price: Decimal,
    pub tiers: Vec<TierLine>,
    pub gbor: Decimal,
    pub ticket_fee_percent: Decimal,
    pub ticketing_fees: Decimal,
    pub nbor: Decimal,

    // Deal
    pub guaranteed_fee: Decimal,
    pub door_deal_percent: Decimal,
    pub door_deal_payout: Decimal,
    pub artist_payment: Decimal,
    pub payment_type: PaymentType,

    // Promoter
    pub expenses: Vec<ExpenseLine>,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Decimal>,
    pub total_promoter_expenses: Decimal,
    pub promoter_net: Decimal,

    /// Attendance at which the door deal first beats the guarantee
    pub split_point_tickets: Option<u32>,
    /// Attendance at which the promoter stops losing money
    pub break_even_tickets: Option<u32>,
}

impl Settlement {
    pub fn is_loss(&self) -> bool {
        self.promoter_net.is_sign_negative() && !self.promoter_net.is_zero()
    }

    /// What the artist earned over the flat guarantee
    pub fn artist_bonus(&self) -> Decimal {
        self.artist_payment - self.guaranteed_fee
    }
}
