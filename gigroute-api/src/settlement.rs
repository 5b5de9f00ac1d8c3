use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use gigroute_settlement::{
    CsvExporter, Settlement, SettlementExporter, SettlementInput, SettlementSheet, TourReport,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::ManagerClaims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settlements/calculate", post(calculate))
        .route("/tour-stops/{id}/settlement", get(get_settlement))
        .route("/tour-stops/{id}/settlement/csv", get(get_settlement_csv))
        .route("/tour-stops/{id}/settle", post(settle_tour_stop))
        .route("/tours/{id}/settlement-report", get(get_tour_report))
        .route("/tours/{id}/settlement-report/csv", get(get_tour_report_csv))
}

/// POST /v1/settlements/calculate
///
/// What-if calculation on raw figures; nothing is loaded or stored.
async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<SettlementInput>, JsonRejection>,
) -> Result<Json<Settlement>, AppError> {
    let Json(input) = payload?;
    let settlement = state.settlements.calculator().calculate(&input)?;
    Ok(Json(settlement))
}

/// GET /v1/tour-stops/{id}/settlement
async fn get_settlement(
    State(state): State<AppState>,
    Extension(claims): Extension<ManagerClaims>,
    Path(tour_stop_id): Path<Uuid>,
) -> Result<Json<SettlementSheet>, AppError> {
    let sheet = state.settlements.preview(claims.organization_id, tour_stop_id).await?;
    Ok(Json(sheet))
}

/// GET /v1/tour-stops/{id}/settlement/csv
async fn get_settlement_csv(
    State(state): State<AppState>,
    Extension(claims): Extension<ManagerClaims>,
    Path(tour_stop_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let sheet = state.settlements.preview(claims.organization_id, tour_stop_id).await?;
    let exporter = CsvExporter;
    let body = exporter.export_sheet(&sheet)?;
    Ok(download(&exporter, format!("settlement-{}-{}", sheet.date, tour_stop_id), body))
}

/// POST /v1/tour-stops/{id}/settle
async fn settle_tour_stop(
    State(state): State<AppState>,
    Extension(claims): Extension<ManagerClaims>,
    Path(tour_stop_id): Path<Uuid>,
) -> Result<Json<SettlementSheet>, AppError> {
    tracing::info!(user = %claims.sub, %tour_stop_id, "Settlement requested");
    let sheet = state.settlements.settle(claims.organization_id, tour_stop_id).await?;
    Ok(Json(sheet))
}

/// GET /v1/tours/{id}/settlement-report
async fn get_tour_report(
    State(state): State<AppState>,
    Extension(claims): Extension<ManagerClaims>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<TourReport>, AppError> {
    let report = state.settlements.tour_report(claims.organization_id, tour_id).await?;
    Ok(Json(report))
}

/// GET /v1/tours/{id}/settlement-report/csv
async fn get_tour_report_csv(
    State(state): State<AppState>,
    Extension(claims): Extension<ManagerClaims>,
    Path(tour_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let report = state.settlements.tour_report(claims.organization_id, tour_id).await?;
    let exporter = CsvExporter;
    let body = exporter.export_tour(&report)?;
    Ok(download(&exporter, format!("tour-settlement-{}", tour_id), body))
}

fn download(exporter: &dyn SettlementExporter, stem: String, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}.{}\"", stem, exporter.file_extension());
    (
        [
            (header::CONTENT_TYPE, exporter.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
