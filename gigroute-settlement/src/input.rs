use gigroute_core::{ExpenseCategory, PromoterExpense, TourStop};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::SettlementConfig;
use crate::error::{SettlementError, SettlementResult};

/// How the night's tickets were priced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BoxOffice {
    /// One price for the whole house
    Flat { ticket_price: Decimal, tickets_sold: u32 },
    /// Several price categories, each with its own sales
    Tiered { tiers: Vec<TierSales> },
}

impl BoxOffice {
    pub fn tickets_sold(&self) -> u64 {
        match self {
            BoxOffice::Flat { tickets_sold, .. } => u64::from(*tickets_sold),
            BoxOffice::Tiered { tiers } => tiers.iter().map(|t| u64::from(t.sold)).sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierSales {
    pub name: String,
    pub price: Decimal,
    pub sold: u32,
    #[serde(default)]
    pub quantity_available: Option<u32>,
}

/// One promoter cost line as submitted for settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseInput {
    pub label: String,
    #[serde(default = "default_category")]
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub currency: String,
}

fn default_category() -> ExpenseCategory {
    ExpenseCategory::Other
}

/// Everything the calculator needs, as plain values.
///
/// Nothing here is validated on construction; [`crate::SettlementCalculator`]
/// checks every field before doing any arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementInput {
    pub box_office: BoxOffice,
    pub capacity: u32,
    pub ticket_fee_percent: Decimal,
    pub guaranteed_fee: Decimal,
    pub door_deal_percent: Decimal,
    #[serde(default)]
    pub promoter_expenses: Vec<ExpenseInput>,
    pub currency: String,
}

impl SettlementInput {
    /// Single-price show with no expenses yet
    pub fn flat(
        ticket_price: Decimal,
        tickets_sold: u32,
        capacity: u32,
        ticket_fee_percent: Decimal,
        guaranteed_fee: Decimal,
        door_deal_percent: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            box_office: BoxOffice::Flat { ticket_price, tickets_sold },
            capacity,
            ticket_fee_percent,
            guaranteed_fee,
            door_deal_percent,
            promoter_expenses: Vec::new(),
            currency: currency.into(),
        }
    }

    pub fn with_expense(
        mut self,
        label: impl Into<String>,
        category: ExpenseCategory,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        self.promoter_expenses.push(ExpenseInput {
            label: label.into(),
            category,
            amount,
            currency: currency.into(),
        });
        self
    }

    pub fn tickets_sold(&self) -> u64 {
        self.box_office.tickets_sold()
    }

    /// Assemble calculator input from a stored stop and its expense rows.
    ///
    /// Tiers take precedence over the flat price. Missing guarantee and
    /// door-deal default to zero; missing fee and currency come from config.
    pub fn from_tour_stop(
        stop: &TourStop,
        expenses: &[PromoterExpense],
        config: &SettlementConfig,
    ) -> SettlementResult<Self> {
        let capacity = stop.capacity().ok_or(SettlementError::MissingField("capacity"))?;

        let box_office = if stop.has_tiers() {
            BoxOffice::Tiered {
                tiers: stop
                    .sorted_tiers()
                    .into_iter()
                    .map(|t| TierSales {
                        name: t.name.clone(),
                        price: t.price,
                        sold: t.sold,
                        quantity_available: t.quantity_available,
                    })
                    .collect(),
            }
        } else {
            BoxOffice::Flat {
                ticket_price: stop.ticket_price.ok_or(SettlementError::MissingField("ticket_price"))?,
                tickets_sold: stop.tickets_sold,
            }
        };

        Ok(Self {
            box_office,
            capacity,
            ticket_fee_percent: stop.ticket_fee_percent.unwrap_or(config.default_ticket_fee_percent),
            guaranteed_fee: stop.guarantee.unwrap_or(Decimal::ZERO),
            door_deal_percent: stop.door_deal_percent.unwrap_or(Decimal::ZERO),
            promoter_expenses: expenses
                .iter()
                .map(|e| ExpenseInput {
                    label: e.label.clone(),
                    category: e.category,
                    amount: e.amount,
                    currency: e.currency.clone(),
                })
                .collect(),
            currency: stop
                .currency
                .clone()
                .unwrap_or_else(|| config.default_currency.clone()),
        })
    }
}
