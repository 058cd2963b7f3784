use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use sl_common::MatchRecord;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

/// Matches offered to a worker, newest first.
pub async fn list_worker_matches(
    State(state): State<SharedState>,
    Path(worker_id): Path<Uuid>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    let matches = state.directory.list_worker_matches(worker_id).await?;
    Ok(Json(matches))
}
