use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use sl_common::api::UpdateMatchStatusRequest;
use sl_common::MatchRecord;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn contact(
    State(state): State<SharedState>,
    Path(match_id): Path<Uuid>,
    auth: AuthUser,
) -> Result<Json<MatchRecord>, ApiError> {
    let record = state.lifecycle.contact(match_id).await?;
    info!(%match_id, caller = %auth.subject, "worker contacted");
    Ok(Json(record))
}

pub async fn update_status(
    State(state): State<SharedState>,
    Path(match_id): Path<Uuid>,
    auth: AuthUser,
    Json(request): Json<UpdateMatchStatusRequest>,
) -> Result<Json<MatchRecord>, ApiError> {
    let record = state.lifecycle.transition(match_id, request.status).await?;
    info!(%match_id, status = %record.status, caller = %auth.subject, "match status changed");
    Ok(Json(record))
}
