use gigroute_core::{TourStop, TourStopRepository, TourStopStatus};
use std::sync::Arc;
use uuid::Uuid;

use crate::calculator::SettlementCalculator;
use crate::error::SettlementError;
use crate::export::SettlementSheet;
use crate::tour::{SkippedStop, TourReport};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Tour stop {0} not found")]
    NotFound(Uuid),
    #[error("Tour stop {id} is {status} and cannot be settled")]
    NotSettleable { id: Uuid, status: TourStopStatus },
    #[error(transparent)]
    Invalid(#[from] SettlementError),
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ServiceError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ServiceError::Repository(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Loads tour stops, gates them on their status and runs the calculator
pub struct SettlementService {
    repo: Arc<dyn TourStopRepository>,
    calculator: SettlementCalculator,
}

impl SettlementService {
    pub fn new(repo: Arc<dyn TourStopRepository>, calculator: SettlementCalculator) -> Self {
        Self { repo, calculator }
    }

    pub fn calculator(&self) -> &SettlementCalculator {
        &self.calculator
    }

    /// Compute the sheet of a played or already settled stop without changing it
    pub async fn preview(&self, organization_id: Uuid, tour_stop_id: Uuid) -> ServiceResult<SettlementSheet> {
        let stop = self.load(organization_id, tour_stop_id).await?;
        if !stop.status.allows_settlement() {
            return Err(ServiceError::NotSettleable {
                id: stop.id,
                status: stop.status,
            });
        }
        self.compute(&stop).await
    }

    /// Compute the sheet and move the stop from played to settled.
    ///
    /// Nothing is written when the computation fails. Concurrent calls for
    /// the same stop settle it once; the others get `NotSettleable`.
    pub async fn settle(&self, organization_id: Uuid, tour_stop_id: Uuid) -> ServiceResult<SettlementSheet> {
        let mut stop = self.load(organization_id, tour_stop_id).await?;
        if stop.status != TourStopStatus::Played {
            tracing::warn!(tour_stop_id = %stop.id, status = %stop.status, "Refusing to settle");
            return Err(ServiceError::NotSettleable {
                id: stop.id,
                status: stop.status,
            });
        }

        let sheet = self.compute(&stop).await?;

        let played = stop.status;
        stop.settle()
            .map_err(|_| ServiceError::NotSettleable { id: stop.id, status: played })?;
        let moved = self
            .repo
            .transition_status(stop.id, played, stop.status, stop.updated_at)
            .await?;
        if !moved {
            // Someone else settled or changed the stop since it was loaded
            let current = self.load(organization_id, tour_stop_id).await?;
            tracing::warn!(tour_stop_id = %current.id, status = %current.status, "Lost settlement race");
            return Err(ServiceError::NotSettleable {
                id: current.id,
                status: current.status,
            });
        }

        let sheet = SettlementSheet {
            status: stop.status,
            ..sheet
        };
        tracing::info!(tour_stop_id = %stop.id, "Tour stop settled: {}", sheet.headline());

        Ok(sheet)
    }

    /// Settle every eligible stop of a tour in memory and roll the results up.
    ///
    /// Stops that are not played yet or whose data does not validate are
    /// listed as skipped rather than failing the whole report.
    pub async fn tour_report(&self, organization_id: Uuid, tour_id: Uuid) -> ServiceResult<TourReport> {
        let stops = self.repo.list_tour_stops(organization_id, tour_id).await?;

        let mut sheets = Vec::with_capacity(stops.len());
        let mut skipped = Vec::new();

        for stop in stops {
            if !stop.status.allows_settlement() {
                skipped.push(SkippedStop {
                    tour_stop_id: stop.id,
                    reason: format!("status is {}", stop.status),
                });
                continue;
            }

            match self.compute(&stop).await {
                Ok(sheet) => sheets.push(sheet),
                Err(ServiceError::Invalid(err)) => {
                    tracing::debug!(tour_stop_id = %stop.id, error = %err, "Skipping stop in tour report");
                    skipped.push(SkippedStop {
                        tour_stop_id: stop.id,
                        reason: err.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        tracing::info!(
            %tour_id,
            settled = sheets.len(),
            skipped = skipped.len(),
            "Built tour settlement report"
        );

        Ok(TourReport::new(tour_id, sheets, skipped)?)
    }

    async fn load(&self, organization_id: Uuid, tour_stop_id: Uuid) -> ServiceResult<TourStop> {
        self.repo
            .get_tour_stop(organization_id, tour_stop_id)
            .await?
            .ok_or(ServiceError::NotFound(tour_stop_id))
    }

    async fn compute(&self, stop: &TourStop) -> ServiceResult<SettlementSheet> {
        let expenses = self.repo.list_promoter_expenses(stop.id).await?;
        let input = self.calculator.input_for(stop, &expenses)?;
        let settlement = self.calculator.calculate(&input)?;
        Ok(SettlementSheet::new(stop, settlement))
    }
}
