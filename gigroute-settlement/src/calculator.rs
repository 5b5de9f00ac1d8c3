use gigroute_core::{ExpenseCategory, PromoterExpense, TourStop};
use gigroute_shared::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{SettlementError, SettlementResult};
use crate::input::{BoxOffice, ExpenseInput, SettlementInput};
use crate::models::{ExpenseLine, PaymentType, Settlement, TierLine};
use crate::projection::AttendanceModel;

/// Defaults applied when a stored stop leaves a deal term blank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementConfig {
    /// Box-office/platform cut assumed when none was negotiated
    #[serde(default = "default_ticket_fee_percent")]
    pub default_ticket_fee_percent: Decimal,

    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_ticket_fee_percent() -> Decimal {
    Decimal::from(5)
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            default_ticket_fee_percent: default_ticket_fee_percent(),
            default_currency: default_currency(),
        }
    }
}

/// Turns box-office and expense figures into a settlement breakdown.
///
/// Stateless apart from its defaults. The same input always yields the
/// same [`Settlement`], so it is safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct SettlementCalculator {
    config: SettlementConfig,
}

impl SettlementCalculator {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Build calculator input from stored records using this calculator's defaults
    pub fn input_for(
        &self,
        stop: &TourStop,
        expenses: &[PromoterExpense],
    ) -> SettlementResult<SettlementInput> {
        SettlementInput::from_tour_stop(stop, expenses, &self.config)
    }

    /// Validate everything, then compute in order:
    /// GBOR, fees, NBOR, door deal, artist payment, expenses, promoter net.
    pub fn calculate(&self, input: &SettlementInput) -> SettlementResult<Settlement> {
        let currency = validate(input)?;

        let box_office = tally_box_office(&input.box_office)?;

        let fee_rate = input.ticket_fee_percent / Decimal::ONE_HUNDRED;
        let ticketing_fees = mul(box_office.gbor, fee_rate, "ticketing_fees")?;
        let nbor = sub(box_office.gbor, ticketing_fees, "nbor")?;

        let door_rate = input.door_deal_percent / Decimal::ONE_HUNDRED;
        let door_deal_payout = mul(nbor, door_rate, "door_deal_payout")?;

        let (artist_payment, payment_type) = versus(input.guaranteed_fee, door_deal_payout);

        let expenses = tally_expenses(&input.promoter_expenses)?;

        let promoter_net = sub(
            sub(nbor, artist_payment, "promoter_net")?,
            expenses.total,
            "promoter_net",
        )?;

        let fill_rate = fill_rate(box_office.tickets_sold, input.capacity)?;

        let model = AttendanceModel {
            ticket_price: box_office.ticket_price,
            fee_rate,
            door_rate,
            guaranteed_fee: input.guaranteed_fee,
            expenses: expenses.total,
        };

        Ok(Settlement {
            currency,
            capacity: input.capacity,
            tickets_sold: box_office.tickets_sold,
            fill_rate,
            ticket_price: box_office.ticket_price,
            tiers: box_office.tiers,
            gbor: box_office.gbor,
            ticket_fee_percent: input.ticket_fee_percent,
            ticketing_fees,
            nbor,
            guaranteed_fee: input.guaranteed_fee,
            door_deal_percent: input.door_deal_percent,
            door_deal_payout,
            artist_payment,
            payment_type,
            expenses: expenses.lines,
            expenses_by_category: expenses.by_category,
            total_promoter_expenses: expenses.total,
            promoter_net,
            split_point_tickets: model.split_point(input.capacity),
            break_even_tickets: model.break_even(input.capacity),
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate(input: &SettlementInput) -> SettlementResult<CurrencyCode> {
    // 1. Capacity first: an oversold house is reported whatever else is wrong
    let tickets_sold = input.tickets_sold();
    if tickets_sold > u64::from(input.capacity) {
        return Err(SettlementError::CapacityExceeded {
            tickets_sold,
            capacity: input.capacity,
        });
    }

    // 2. Currency
    let currency = CurrencyCode::parse(&input.currency)?;

    // 3. Percentages
    check_percent("ticket_fee_percent", input.ticket_fee_percent)?;
    check_percent("door_deal_percent", input.door_deal_percent)?;

    // 4. Amounts
    check_non_negative("guaranteed_fee".to_string(), input.guaranteed_fee)?;
    match &input.box_office {
        BoxOffice::Flat { ticket_price, .. } => {
            check_positive("ticket_price".to_string(), *ticket_price)?;
        }
        BoxOffice::Tiered { tiers } => {
            if tiers.is_empty() {
                return Err(SettlementError::MissingField("tiers"));
            }
            for tier in tiers {
                check_positive(format!("tiers[{}].price", tier.name), tier.price)?;
            }
        }
    }
    for expense in &input.promoter_expenses {
        check_non_negative(format!("promoter_expenses[{}].amount", expense.label), expense.amount)?;
    }

    // 5. Tier quotas
    if let BoxOffice::Tiered { tiers } = &input.box_office {
        for tier in tiers {
            if let Some(available) = tier.quantity_available {
                if tier.sold > available {
                    return Err(SettlementError::TierOversold {
                        tier: tier.name.clone(),
                        sold: tier.sold,
                        available,
                    });
                }
            }
        }
    }

    // 6. Expense currencies: never summed across currencies
    for expense in &input.promoter_expenses {
        let matches = CurrencyCode::parse(&expense.currency)
            .map(|code| code == currency)
            .unwrap_or(false);
        if !matches {
            return Err(SettlementError::CurrencyMismatch {
                line: expense.label.clone(),
                expected: currency.clone(),
                found: expense.currency.clone(),
            });
        }
    }

    Ok(currency)
}

fn check_percent(field: &'static str, value: Decimal) -> SettlementResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(SettlementError::PercentOutOfRange { field, value });
    }
    Ok(())
}

fn check_non_negative(field: String, value: Decimal) -> SettlementResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(SettlementError::NegativeAmount { field, value });
    }
    Ok(())
}

fn check_positive(field: String, value: Decimal) -> SettlementResult<()> {
    if value <= Decimal::ZERO {
        return Err(SettlementError::NonPositivePrice { field, value });
    }
    Ok(())
}

// ============================================================================
// Arithmetic
// ============================================================================

struct BoxOfficeTally {
    tickets_sold: u32,
    gbor: Decimal,
    ticket_price: Decimal,
    tiers: Vec<TierLine>,
}

struct ExpenseTally {
    lines: Vec<ExpenseLine>,
    by_category: BTreeMap<ExpenseCategory, Decimal>,
    total: Decimal,
}

fn tally_box_office(box_office: &BoxOffice) -> SettlementResult<BoxOfficeTally> {
    match box_office {
        BoxOffice::Flat { ticket_price, tickets_sold } => Ok(BoxOfficeTally {
            tickets_sold: *tickets_sold,
            gbor: mul(*ticket_price, Decimal::from(*tickets_sold), "gbor")?,
            ticket_price: *ticket_price,
            tiers: Vec::new(),
        }),
        BoxOffice::Tiered { tiers } => {
            let mut gbor = Decimal::ZERO;
            let mut tickets_sold: u32 = 0;
            let mut lines = Vec::with_capacity(tiers.len());

            for tier in tiers {
                let revenue = mul(tier.price, Decimal::from(tier.sold), "gbor")?;
                gbor = add(gbor, revenue, "gbor")?;
                tickets_sold = tickets_sold
                    .checked_add(tier.sold)
                    .ok_or(SettlementError::Overflow { step: "tickets_sold" })?;
                lines.push(TierLine {
                    name: tier.name.clone(),
                    price: tier.price,
                    sold: tier.sold,
                    revenue,
                });
            }

            let ticket_price = if tickets_sold == 0 {
                Decimal::ZERO
            } else {
                gbor.checked_div(Decimal::from(tickets_sold))
                    .ok_or(SettlementError::Overflow { step: "ticket_price" })?
            };

            Ok(BoxOfficeTally {
                tickets_sold,
                gbor,
                ticket_price,
                tiers: lines,
            })
        }
    }
}

fn tally_expenses(expenses: &[ExpenseInput]) -> SettlementResult<ExpenseTally> {
    let mut by_category = BTreeMap::new();
    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(expenses.len());

    for expense in expenses {
        total = add(total, expense.amount, "total_promoter_expenses")?;
        let bucket = by_category.entry(expense.category).or_insert(Decimal::ZERO);
        *bucket = add(*bucket, expense.amount, "total_promoter_expenses")?;
        lines.push(ExpenseLine {
            label: expense.label.clone(),
            category: expense.category,
            amount: expense.amount,
        });
    }

    Ok(ExpenseTally {
        lines,
        by_category,
        total,
    })
}

/// Guarantee wins ties; the door deal must be strictly larger
pub(crate) fn versus(guaranteed_fee: Decimal, door_deal_payout: Decimal) -> (Decimal, PaymentType) {
    if door_deal_payout > guaranteed_fee {
        (door_deal_payout, PaymentType::DoorDeal)
    } else {
        (guaranteed_fee, PaymentType::Guarantee)
    }
}

fn fill_rate(tickets_sold: u32, capacity: u32) -> SettlementResult<Decimal> {
    if capacity == 0 {
        return Ok(Decimal::ZERO);
    }
    let pct = mul(Decimal::from(tickets_sold), Decimal::ONE_HUNDRED, "fill_rate")?
        .checked_div(Decimal::from(capacity))
        .ok_or(SettlementError::Overflow { step: "fill_rate" })?;
    Ok(pct.round_dp(1))
}

fn mul(a: Decimal, b: Decimal, step: &'static str) -> SettlementResult<Decimal> {
    a.checked_mul(b).ok_or(SettlementError::Overflow { step })
}

fn add(a: Decimal, b: Decimal, step: &'static str) -> SettlementResult<Decimal> {
    a.checked_add(b).ok_or(SettlementError::Overflow { step })
}

fn sub(a: Decimal, b: Decimal, step: &'static str) -> SettlementResult<Decimal> {
    a.checked_sub(b).ok_or(SettlementError::Overflow { step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TierSales;
    use rust_decimal_macros::dec;

    fn base_input() -> SettlementInput {
        SettlementInput::flat(dec!(30), 200, 250, dec!(10), dec!(2000), dec!(80), "EUR")
            .with_expense("security", ExpenseCategory::Security, dec!(500), "EUR")
    }

    #[test]
    fn test_tie_goes_to_guarantee() {
        // NBOR 2500 * 80% = 2000, exactly the guarantee
        let input = SettlementInput::flat(dec!(25), 100, 100, dec!(0), dec!(2000), dec!(80), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.door_deal_payout, dec!(2000));
        assert_eq!(s.artist_payment, dec!(2000));
        assert_eq!(s.payment_type, PaymentType::Guarantee);
    }

    #[test]
    fn test_zero_door_deal_pays_guarantee() {
        let input = SettlementInput::flat(dec!(30), 200, 250, dec!(10), dec!(2000), dec!(0), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.door_deal_payout, Decimal::ZERO);
        assert_eq!(s.artist_payment, dec!(2000));
        assert_eq!(s.payment_type, PaymentType::Guarantee);
        assert_eq!(s.split_point_tickets, None);
    }

    #[test]
    fn test_zero_guarantee_with_empty_house() {
        let input = SettlementInput::flat(dec!(30), 0, 250, dec!(10), dec!(0), dec!(80), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.gbor, Decimal::ZERO);
        assert_eq!(s.artist_payment, Decimal::ZERO);
        assert_eq!(s.payment_type, PaymentType::Guarantee);
        assert_eq!(s.promoter_net, Decimal::ZERO);
        assert_eq!(s.fill_rate, Decimal::ZERO);
    }

    #[test]
    fn test_full_fee_leaves_zero_nbor() {
        let input = SettlementInput::flat(dec!(30), 200, 250, dec!(100), dec!(500), dec!(80), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.ticketing_fees, dec!(6000));
        assert_eq!(s.nbor, Decimal::ZERO);
        assert_eq!(s.promoter_net, dec!(-500));
    }

    #[test]
    fn test_capacity_checked_before_everything_else() {
        let mut input = SettlementInput::flat(dec!(-5), 300, 200, dec!(150), dec!(-1), dec!(101), "euros");
        input = input.with_expense("catering", ExpenseCategory::Catering, dec!(10), "USD");

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(
            err,
            SettlementError::CapacityExceeded { tickets_sold: 300, capacity: 200 }
        );
    }

    #[test]
    fn test_rejects_malformed_currency() {
        let mut input = base_input();
        input.currency = "EURO".to_string();

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err, SettlementError::InvalidCurrency("EURO".to_string()));
    }

    #[test]
    fn test_rejects_negative_door_deal_percent() {
        let mut input = base_input();
        input.door_deal_percent = dec!(-1);

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err.field(), "door_deal_percent");
    }

    #[test]
    fn test_rejects_negative_guarantee() {
        let mut input = base_input();
        input.guaranteed_fee = dec!(-0.01);

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert!(matches!(err, SettlementError::NegativeAmount { ref field, .. } if field == "guaranteed_fee"));
    }

    #[test]
    fn test_rejects_zero_ticket_price() {
        let mut input = base_input();
        input.box_office = BoxOffice::Flat { ticket_price: Decimal::ZERO, tickets_sold: 10 };

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err.field(), "ticket_price");
    }

    #[test]
    fn test_rejects_negative_expense_line() {
        let input = base_input().with_expense("refund", ExpenseCategory::Other, dec!(-50), "EUR");

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err.field(), "promoter_expenses[refund].amount");
    }

    #[test]
    fn test_expense_currency_compared_case_insensitively() {
        let input = base_input().with_expense("catering", ExpenseCategory::Catering, dec!(100), "eur");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.total_promoter_expenses, dec!(600));
    }

    #[test]
    fn test_expenses_grouped_by_category() {
        let input = base_input()
            .with_expense("stewards", ExpenseCategory::Security, dec!(250), "EUR")
            .with_expense("posters", ExpenseCategory::Marketing, dec!(80), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.expenses.len(), 3);
        assert_eq!(s.expenses[2].label, "posters");
        assert_eq!(s.expenses_by_category[&ExpenseCategory::Security], dec!(750));
        assert_eq!(s.expenses_by_category[&ExpenseCategory::Marketing], dec!(80));
        assert!(!s.expenses_by_category.contains_key(&ExpenseCategory::Catering));
        assert_eq!(s.total_promoter_expenses, dec!(830));
    }

    #[test]
    fn test_tiered_box_office() {
        let input = SettlementInput {
            box_office: BoxOffice::Tiered {
                tiers: vec![
                    TierSales { name: "Pit".into(), price: dec!(40), sold: 300, quantity_available: Some(300) },
                    TierSales { name: "Seated".into(), price: dec!(30), sold: 100, quantity_available: None },
                ],
            },
            capacity: 500,
            ticket_fee_percent: dec!(5),
            guaranteed_fee: dec!(3000),
            door_deal_percent: dec!(70),
            promoter_expenses: Vec::new(),
            currency: "GBP".into(),
        };
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        // 300 * 40 + 100 * 30
        assert_eq!(s.gbor, dec!(15000));
        assert_eq!(s.tickets_sold, 400);
        assert_eq!(s.ticket_price, dec!(37.5));
        assert_eq!(s.tiers.len(), 2);
        assert_eq!(s.tiers[0].revenue, dec!(12000));
        assert_eq!(s.nbor, dec!(14250));
        assert_eq!(s.door_deal_payout, dec!(9975));
        assert_eq!(s.payment_type, PaymentType::DoorDeal);
        assert_eq!(s.fill_rate, dec!(80));
    }

    #[test]
    fn test_tier_oversold() {
        let input = SettlementInput {
            box_office: BoxOffice::Tiered {
                tiers: vec![TierSales { name: "VIP".into(), price: dec!(90), sold: 60, quantity_available: Some(50) }],
            },
            capacity: 500,
            ticket_fee_percent: dec!(5),
            guaranteed_fee: dec!(0),
            door_deal_percent: dec!(70),
            promoter_expenses: Vec::new(),
            currency: "EUR".into(),
        };

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(
            err,
            SettlementError::TierOversold { tier: "VIP".into(), sold: 60, available: 50 }
        );
    }

    #[test]
    fn test_empty_tier_list_rejected() {
        let mut input = base_input();
        input.box_office = BoxOffice::Tiered { tiers: Vec::new() };

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err, SettlementError::MissingField("tiers"));
    }

    #[test]
    fn test_fill_rate_rounded_to_one_place() {
        let input = SettlementInput::flat(dec!(20), 1, 3, dec!(0), dec!(0), dec!(0), "EUR");
        let s = SettlementCalculator::default().calculate(&input).unwrap();

        assert_eq!(s.fill_rate, dec!(33.3));
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let input = SettlementInput::flat(Decimal::MAX, 10, 10, dec!(0), dec!(0), dec!(0), "EUR");

        let err = SettlementCalculator::default().calculate(&input).unwrap_err();
        assert_eq!(err, SettlementError::Overflow { step: "gbor" });
    }

    #[test]
    fn test_input_for_uses_configured_defaults() {
        use chrono::NaiveDate;
        use gigroute_core::VenueRef;
        use uuid::Uuid;

        let mut stop = TourStop::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 1, 9).unwrap());
        stop.venue = Some(VenueRef { id: None, name: "Paradiso".into(), city: None, country: None, capacity: Some(1500) });
        stop.ticket_price = Some(dec!(28));
        stop.tickets_sold = 1200;

        let calculator = SettlementCalculator::new(SettlementConfig {
            default_ticket_fee_percent: dec!(7.5),
            default_currency: "CHF".into(),
        });
        let input = calculator.input_for(&stop, &[]).unwrap();
        let s = calculator.calculate(&input).unwrap();

        assert_eq!(s.currency.as_str(), "CHF");
        assert_eq!(s.ticket_fee_percent, dec!(7.5));
        assert_eq!(s.ticketing_fees, dec!(2520));
    }
}
