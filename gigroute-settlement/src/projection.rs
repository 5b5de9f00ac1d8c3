//! Attendance projections for the settlement sheet.
//!
//! Both figures answer "how many tickets would it take", using the night's
//! own deal terms and (average) ticket price. Door-deal payout and promoter
//! net are both non-decreasing in attendance, so a bisection over
//! `0..=capacity` finds the first attendance that satisfies each condition.
//!
//! An attendance whose figures do not fit in a `Decimal` counts as not
//! satisfying the condition. Near the `Decimal` limits a projection can
//! therefore come back `None` even though the night itself settled; the
//! settlement amounts are unaffected.

use rust_decimal::Decimal;

use crate::calculator::versus;

pub(crate) struct AttendanceModel {
    pub ticket_price: Decimal,
    pub fee_rate: Decimal,
    pub door_rate: Decimal,
    pub guaranteed_fee: Decimal,
    pub expenses: Decimal,
}

impl AttendanceModel {
    fn nbor_at(&self, tickets: u32) -> Option<Decimal> {
        let gross = self.ticket_price.checked_mul(Decimal::from(tickets))?;
        gross.checked_sub(gross.checked_mul(self.fee_rate)?)
    }

    fn door_deal_at(&self, tickets: u32) -> Option<Decimal> {
        self.nbor_at(tickets)?.checked_mul(self.door_rate)
    }

    fn promoter_net_at(&self, tickets: u32) -> Option<Decimal> {
        let nbor = self.nbor_at(tickets)?;
        let (artist_payment, _) = versus(self.guaranteed_fee, nbor.checked_mul(self.door_rate)?);
        nbor.checked_sub(artist_payment)?.checked_sub(self.expenses)
    }

    /// First attendance where the door deal strictly beats the guarantee
    pub fn split_point(&self, capacity: u32) -> Option<u32> {
        first_reaching(capacity, |tickets| {
            self.door_deal_at(tickets)
                .is_some_and(|payout| payout > self.guaranteed_fee)
        })
    }

    /// First attendance where the promoter no longer makes a loss
    pub fn break_even(&self, capacity: u32) -> Option<u32> {
        first_reaching(capacity, |tickets| {
            self.promoter_net_at(tickets)
                .is_some_and(|net| net >= Decimal::ZERO)
        })
    }
}

/// Smallest `n` in `0..=capacity` with `reached(n)`, for a monotone predicate
fn first_reaching(capacity: u32, reached: impl Fn(u32) -> bool) -> Option<u32> {
    if !reached(capacity) {
        return None;
    }

    let (mut lo, mut hi) = (0u32, capacity);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if reached(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}
