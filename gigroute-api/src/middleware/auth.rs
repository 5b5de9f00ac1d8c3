use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::StatusCode,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

/// Roles allowed to see and sign off money figures
const SETTLEMENT_ROLES: [&str; 2] = ["MANAGER", "ADMIN"];

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ManagerClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Tenant every lookup is scoped to
    pub organization_id: Uuid,
    pub exp: usize,
}

impl ManagerClaims {
    pub fn can_settle(&self) -> bool {
        SETTLEMENT_ROLES.contains(&self.role.as_str())
    }
}

// ============================================================================
// Manager Authentication Middleware
// ============================================================================

pub async fn manager_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<ManagerClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Check role is MANAGER or ADMIN
    if !token_data.claims.can_settle() {
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
