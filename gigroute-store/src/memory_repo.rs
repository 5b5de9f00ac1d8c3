use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gigroute_core::{PromoterExpense, TourStop, TourStopRepository, TourStopStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local repository for tests and local runs without Postgres
#[derive(Default)]
pub struct MemoryTourStopRepository {
    stops: RwLock<HashMap<Uuid, TourStop>>,
    expenses: RwLock<Vec<PromoterExpense>>,
}

impl MemoryTourStopRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_tour_stop(&self, stop: TourStop) {
        self.stops.write().await.insert(stop.id, stop);
    }

    pub async fn insert_expense(&self, expense: PromoterExpense) {
        self.expenses.write().await.push(expense);
    }
}

#[async_trait]
impl TourStopRepository for MemoryTourStopRepository {
    async fn get_tour_stop(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TourStop>, Box<dyn std::error::Error + Send + Sync>> {
        let stops = self.stops.read().await;
        Ok(stops
            .get(&id)
            .filter(|s| s.organization_id == organization_id)
            .cloned())
    }

    async fn list_tour_stops(
        &self,
        organization_id: Uuid,
        tour_id: Uuid,
    ) -> Result<Vec<TourStop>, Box<dyn std::error::Error + Send + Sync>> {
        let stops = self.stops.read().await;
        let mut found: Vec<TourStop> = stops
            .values()
            .filter(|s| s.organization_id == organization_id && s.tour_id == Some(tour_id))
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.date, s.created_at));
        Ok(found)
    }

    async fn list_promoter_expenses(
        &self,
        tour_stop_id: Uuid,
    ) -> Result<Vec<PromoterExpense>, Box<dyn std::error::Error + Send + Sync>> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .iter()
            .filter(|e| e.tour_stop_id == tour_stop_id)
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TourStopStatus,
        to: TourStopStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut stops = self.stops.write().await;
        let Some(stop) = stops.get_mut(&id).filter(|s| s.status == from) else {
            return Ok(false);
        };

        match to {
            TourStopStatus::Confirmed => stop.confirmed_at = Some(changed_at),
            TourStopStatus::Played => stop.played_at = Some(changed_at),
            TourStopStatus::Settled => stop.settled_at = Some(changed_at),
            TourStopStatus::Canceled => stop.canceled_at = Some(changed_at),
            _ => {}
        }
        stop.status = to;
        stop.updated_at = changed_at;
        Ok(true)
    }
}
