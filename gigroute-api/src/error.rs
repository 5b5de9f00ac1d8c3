use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gigroute_settlement::{ExportError, ServiceError, SettlementError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(SettlementError),
    MalformedBody(JsonRejection),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string(), "field": err.field() }),
            ),
            AppError::MalformedBody(rejection) => {
                let detail = rejection.body_text();
                let status = match rejection {
                    JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
                    other => other.status(),
                };
                (status, json!({ "error": detail, "field": rejected_field(&detail) }))
            },
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        AppError::ValidationError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection)
    }
}

/// Field path from an axum deserialization message, e.g.
/// "Failed to deserialize the JSON body into the target type: guaranteed_fee: invalid value ..."
fn rejected_field(detail: &str) -> &str {
    detail
        .split_once("target type: ")
        .and_then(|(_, rest)| rest.split_once(": "))
        .map(|(path, _)| path)
        .filter(|path| !path.is_empty() && !path.contains(' '))
        .unwrap_or("body")
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            ServiceError::NotSettleable { .. } => AppError::ConflictError(err.to_string()),
            ServiceError::Invalid(inner) => AppError::ValidationError(inner),
            ServiceError::Repository(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::InternalServerError(format!("Export failed: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
