/// Emergency access endpoints
///
/// Link creation requires the owner's bearer token; redemption is public and
/// authorised solely by the secret embedded in the link.
use crate::{
    auth::AuthContext,
    context::AppContext,
    emergency::{AccessLink, HealthSnapshot},
    error::ApiResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

/// Build emergency access routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/family/:id/emergency-access", post(generate_access_link))
        .route("/family/:id/emergency-access/:secret", get(access_health_info))
}

/// Generate an emergency access link for a family member
async fn generate_access_link(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<AccessLink>)> {
    let link = ctx
        .emergency_manager
        .issue_access_link(&id, &auth.owner_id)
        .await?;

    Ok((StatusCode::CREATED, Json(link)))
}

/// Read emergency health information through an access link
async fn access_health_info(
    State(ctx): State<AppContext>,
    Path((id, secret)): Path<(String, String)>,
) -> ApiResult<Json<HealthSnapshot>> {
    let snapshot = ctx.emergency_manager.redeem(&id, &secret).await?;
    Ok(Json(snapshot))
}
