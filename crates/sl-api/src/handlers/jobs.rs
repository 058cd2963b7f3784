use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use sl_common::api::{FindMatchesRequest, FindMatchesResponse};
use sl_common::{EmployerProfile, JobCriteria, MatchRecord};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::{AppState, SharedState};

/// Rank the worker pool for a freshly created job and persist the shortlist.
///
/// Runs for the same job are serialized. A repeat request inside the dedup
/// window gets the previous result back and writes nothing.
pub async fn find_matches(
    State(state): State<SharedState>,
    Path(job_id): Path<Uuid>,
    auth: AuthUser,
    Json(request): Json<FindMatchesRequest>,
) -> Result<Json<FindMatchesResponse>, ApiError> {
    let (criteria, employer) = request.into_criteria()?;

    let gate = state.job_gates.entry(job_id).or_default().clone();
    let result = {
        let _running = gate.lock().await;
        run_or_reuse(&state, job_id, &criteria, &employer, &auth.subject).await
    };

    // Drop the gate once no other request for this job holds a handle to it.
    state
        .job_gates
        .remove_if(&job_id, |_, held| Arc::strong_count(held) <= 2);

    result.map(Json)
}

async fn run_or_reuse(
    state: &AppState,
    job_id: Uuid,
    criteria: &JobCriteria,
    employer: &EmployerProfile,
    caller: &str,
) -> Result<FindMatchesResponse, ApiError> {
    let key = job_id.to_string();
    if let Some(previous) = state.recent_runs.get(&key) {
        info!(%job_id, caller, "reusing recent matching run");
        return Ok(previous);
    }

    let suggested_workers = state
        .orchestrator
        .find_matching_workers(job_id, criteria, employer)
        .await?;

    let response = FindMatchesResponse {
        job_id,
        suggested_workers,
    };

    let ttl = state.config.match_dedup_ttl;
    if !ttl.is_zero() {
        state.recent_runs.put(key, response.clone(), ttl);
    }

    Ok(response)
}

pub async fn list_job_matches(
    State(state): State<SharedState>,
    Path(job_id): Path<Uuid>,
    _auth: AuthUser,
) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    let matches = state.directory.list_job_matches(job_id).await?;
    Ok(Json(matches))
}
