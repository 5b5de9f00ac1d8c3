use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Booking workflow of a single date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TourStopStatus {
    /// Date placeholder, not yet negotiated
    Draft,
    /// Under negotiation with the venue or promoter
    Pending,
    /// Contract signed
    Confirmed,
    /// Show happened, box office is final
    #[serde(alias = "performed")]
    Played,
    /// Financial settlement signed off
    Settled,
    Canceled,
    /// Moved to another date; the original entry stays frozen
    Rescheduled,
}

impl TourStopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStopStatus::Draft => "draft",
            TourStopStatus::Pending => "pending",
            TourStopStatus::Confirmed => "confirmed",
            TourStopStatus::Played => "played",
            TourStopStatus::Settled => "settled",
            TourStopStatus::Canceled => "canceled",
            TourStopStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn can_transition_to(&self, target: TourStopStatus) -> bool {
        use TourStopStatus::*;
        let allowed: &[TourStopStatus] = match self {
            Draft => &[Pending, Confirmed, Canceled, Rescheduled],
            Pending => &[Confirmed, Canceled, Rescheduled],
            Confirmed => &[Played, Canceled, Rescheduled],
            Played => &[Settled, Canceled],
            Settled | Canceled | Rescheduled => &[],
        };
        allowed.contains(&target)
    }

    /// Box office figures are only final once the show has been played
    pub fn allows_settlement(&self) -> bool {
        matches!(self, TourStopStatus::Played | TourStopStatus::Settled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TourStopStatus::Settled | TourStopStatus::Canceled | TourStopStatus::Rescheduled
        )
    }
}

impl fmt::Display for TourStopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TourStopStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(TourStopStatus::Draft),
            "pending" => Ok(TourStopStatus::Pending),
            "confirmed" => Ok(TourStopStatus::Confirmed),
            "played" | "performed" => Ok(TourStopStatus::Played),
            "settled" => Ok(TourStopStatus::Settled),
            "canceled" | "cancelled" => Ok(TourStopStatus::Canceled),
            "rescheduled" => Ok(TourStopStatus::Rescheduled),
            _ => Err(CoreError::UnknownVariant {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Venue data carried on a stop for settlement sheets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueRef {
    pub id: Option<Uuid>,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub capacity: Option<u32>,
}

/// A ticket price category (pit, seated, VIP...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketTier {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    /// `None` means unlimited
    pub quantity_available: Option<u32>,
    pub sold: u32,
    pub sort_order: i32,
}

impl TicketTier {
    pub fn new(name: impl Into<String>, price: Decimal, quantity_available: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            quantity_available,
            sold: 0,
            sort_order: 0,
        }
    }

    /// `None` when the product does not fit in a `Decimal`
    pub fn revenue(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.sold))
    }

    pub fn is_sold_out(&self) -> bool {
        matches!(self.quantity_available, Some(q) if self.sold >= q)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.quantity_available.map(|q| q.saturating_sub(self.sold))
    }
}

/// One concert date, as stored.
///
/// Monetary fields are optional because stops are created long before the
/// deal is finalised; settlement input assembly decides which gaps are fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourStop {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub tour_id: Option<Uuid>,
    pub band_id: Option<Uuid>,
    pub venue: Option<VenueRef>,
    pub date: NaiveDate,

    // Deal
    pub ticket_price: Option<Decimal>,
    pub ticket_fee_percent: Option<Decimal>,
    pub currency: Option<String>,
    pub guarantee: Option<Decimal>,
    pub door_deal_percent: Option<Decimal>,

    // Box office
    pub tickets_sold: u32,
    pub tiers: Vec<TicketTier>,

    pub status: TourStopStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub played_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourStop {
    pub fn new(organization_id: Uuid, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            tour_id: None,
            band_id: None,
            venue: None,
            date,
            ticket_price: None,
            ticket_fee_percent: None,
            currency: None,
            guarantee: None,
            door_deal_percent: None,
            tickets_sold: 0,
            tiers: Vec::new(),
            status: TourStopStatus::Draft,
            confirmed_at: None,
            played_at: None,
            settled_at: None,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn capacity(&self) -> Option<u32> {
        self.venue.as_ref().and_then(|v| v.capacity)
    }

    pub fn has_tiers(&self) -> bool {
        !self.tiers.is_empty()
    }

    /// Tiers in display order
    pub fn sorted_tiers(&self) -> Vec<&TicketTier> {
        let mut tiers: Vec<&TicketTier> = self.tiers.iter().collect();
        tiers.sort_by_key(|t| t.sort_order);
        tiers
    }

    /// Move through the workflow, stamping the matching timestamp
    pub fn transition_to(&mut self, target: TourStopStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        let now = Utc::now();
        match target {
            TourStopStatus::Confirmed => self.confirmed_at = Some(now),
            TourStopStatus::Played => self.played_at = Some(now),
            TourStopStatus::Settled => self.settled_at = Some(now),
            TourStopStatus::Canceled => self.canceled_at = Some(now),
            _ => {}
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    pub fn confirm(&mut self) -> CoreResult<()> {
        self.transition_to(TourStopStatus::Confirmed)
    }

    pub fn mark_played(&mut self) -> CoreResult<()> {
        self.transition_to(TourStopStatus::Played)
    }

    pub fn settle(&mut self) -> CoreResult<()> {
        self.transition_to(TourStopStatus::Settled)
    }

    pub fn cancel(&mut self) -> CoreResult<()> {
        self.transition_to(TourStopStatus::Canceled)
    }
}
