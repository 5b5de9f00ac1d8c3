use gigroute_shared::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{SettlementError, SettlementResult};
use crate::export::SettlementSheet;
use crate::models::Settlement;

fn add(total: &mut Decimal, amount: Decimal, step: &'static str) -> SettlementResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or(SettlementError::Overflow { step })?;
    Ok(())
}

/// Running totals for every stop settled in one currency
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrencyTotals {
    pub stops: u32,
    pub tickets_sold: u64,
    pub capacity: u64,
    /// Tickets sold over capacity across these stops, one decimal place
    pub fill_rate: Decimal,
    pub gbor: Decimal,
    pub ticketing_fees: Decimal,
    pub nbor: Decimal,
    pub artist_payments: Decimal,
    pub promoter_expenses: Decimal,
    pub promoter_net: Decimal,
    /// Stops where the promoter lost money
    pub loss_making_stops: u32,
}

impl CurrencyTotals {
    fn absorb(&mut self, s: &Settlement) -> SettlementResult<()> {
        add(&mut self.gbor, s.gbor, "gbor")?;
        add(&mut self.ticketing_fees, s.ticketing_fees, "ticketing_fees")?;
        add(&mut self.nbor, s.nbor, "nbor")?;
        add(&mut self.artist_payments, s.artist_payment, "artist_payment")?;
        add(&mut self.promoter_expenses, s.total_promoter_expenses, "total_promoter_expenses")?;
        add(&mut self.promoter_net, s.promoter_net, "promoter_net")?;

        self.stops += 1;
        self.tickets_sold += u64::from(s.tickets_sold);
        self.capacity += u64::from(s.capacity);
        if s.is_loss() {
            self.loss_making_stops += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> SettlementResult<()> {
        if self.capacity == 0 {
            self.fill_rate = Decimal::ZERO;
            return Ok(());
        }
        let pct = Decimal::from(self.tickets_sold)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|sold| sold.checked_div(Decimal::from(self.capacity)))
            .ok_or(SettlementError::Overflow { step: "fill_rate" })?;
        self.fill_rate = pct.round_dp(1);
        Ok(())
    }
}

/// Tour-level roll-up.
///
/// Amounts in different currencies are never added together; each
/// currency gets its own bucket. A bucket whose totals no longer fit in a
/// `Decimal` fails the roll-up with [`SettlementError::Overflow`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TourSummary {
    pub by_currency: BTreeMap<CurrencyCode, CurrencyTotals>,
}

impl TourSummary {
    pub fn from_settlements<'a>(
        settlements: impl IntoIterator<Item = &'a Settlement>,
    ) -> SettlementResult<Self> {
        let mut by_currency: BTreeMap<CurrencyCode, CurrencyTotals> = BTreeMap::new();
        for s in settlements {
            by_currency.entry(s.currency.clone()).or_default().absorb(s)?;
        }
        for totals in by_currency.values_mut() {
            totals.finish()?;
        }
        Ok(Self { by_currency })
    }

    pub fn stops(&self) -> u32 {
        self.by_currency.values().map(|t| t.stops).sum()
    }

    pub fn is_single_currency(&self) -> bool {
        self.by_currency.len() <= 1
    }
}

/// A stop left out of the tour report, with the reason it could not be settled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedStop {
    pub tour_stop_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TourReport {
    pub tour_id: Uuid,
    pub stops: Vec<SettlementSheet>,
    pub skipped: Vec<SkippedStop>,
    pub summary: TourSummary,
}

impl TourReport {
    pub fn new(
        tour_id: Uuid,
        stops: Vec<SettlementSheet>,
        skipped: Vec<SkippedStop>,
    ) -> SettlementResult<Self> {
        let summary = TourSummary::from_settlements(stops.iter().map(|sheet| &sheet.settlement))?;
        Ok(Self {
            tour_id,
            stops,
            skipped,
            summary,
        })
    }
}
