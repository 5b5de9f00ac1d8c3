use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{PromoterExpense, TourStop, TourStopStatus};

/// Repository trait for tour stop data access.
///
/// Every lookup is scoped to an organization; a stop belonging to another
/// tenant is reported as absent.
#[async_trait]
pub trait TourStopRepository: Send + Sync {
    async fn get_tour_stop(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TourStop>, Box<dyn std::error::Error + Send + Sync>>;

    /// Stops of a tour, ordered by date
    async fn list_tour_stops(
        &self,
        organization_id: Uuid,
        tour_id: Uuid,
    ) -> Result<Vec<TourStop>, Box<dyn std::error::Error + Send + Sync>>;

    /// Expense lines of a stop, in entry order
    async fn list_promoter_expenses(
        &self,
        tour_stop_id: Uuid,
    ) -> Result<Vec<PromoterExpense>, Box<dyn std::error::Error + Send + Sync>>;

    /// Move a stop from `from` to `to` in one step.
    ///
    /// Returns `false` and writes nothing when the stop does not exist or is
    /// no longer in `from`, so two concurrent transitions cannot both win.
    async fn transition_status(
        &self,
        id: Uuid,
        from: TourStopStatus,
        to: TourStopStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
