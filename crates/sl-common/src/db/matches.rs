use std::str::FromStr;

use chrono::{DateTime, Utc};
use deadpool_postgres::{GenericClient, PoolError};
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;
use uuid::Uuid;

use super::{util::timed, PgPool};
use crate::{MatchRecord, MatchStatus, NewMatch};

#[derive(Debug, thiserror::Error)]
pub enum MatchStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map match row: {0}")]
    Mapping(String),
    #[error("match not found: {0}")]
    NotFound(Uuid),
    #[error("match {match_id} is {actual}, expected {expected}")]
    StatusConflict {
        match_id: Uuid,
        expected: MatchStatus,
        actual: MatchStatus,
    },
}

const MATCH_COLUMNS: &str = "id, request_id, worker_id, score, status, matched_at, \
     shortlisted_at, contacted_at, hired_at, rejected_at";

/// Column stamped when a match enters `status`. `suggested` only has `matched_at`,
/// which is written on insert.
fn status_timestamp_column(status: MatchStatus) -> Option<&'static str> {
    match status {
        MatchStatus::Suggested => None,
        MatchStatus::Shortlisted => Some("shortlisted_at"),
        MatchStatus::Contacted => Some("contacted_at"),
        MatchStatus::Hired => Some("hired_at"),
        MatchStatus::Rejected => Some("rejected_at"),
    }
}

fn map_match_row(row: &Row) -> Result<MatchRecord, MatchStorageError> {
    let status: String = row.try_get("status")?;
    let status = MatchStatus::from_str(&status)
        .map_err(|_| MatchStorageError::Mapping(format!("unknown match status {status:?}")))?;

    Ok(MatchRecord {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        worker_id: row.try_get("worker_id")?,
        score: row.try_get("score")?,
        status,
        matched_at: row.try_get("matched_at")?,
        shortlisted_at: row.try_get("shortlisted_at")?,
        contacted_at: row.try_get("contacted_at")?,
        hired_at: row.try_get("hired_at")?,
        rejected_at: row.try_get("rejected_at")?,
    })
}

/// One row per (job, worker): a repeat insert refreshes the score and keeps
/// the stored id, status and timestamps.
async fn insert_match_row(
    client: &impl GenericClient,
    new_match: &NewMatch,
) -> Result<MatchRecord, MatchStorageError> {
    let sql = format!(
        "INSERT INTO skilllink.matches (id, request_id, worker_id, score, status, matched_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (request_id, worker_id) DO UPDATE SET score = EXCLUDED.score
         RETURNING {MATCH_COLUMNS}"
    );
    let id = Uuid::new_v4();
    let status = new_match.status.to_string();
    let matched_at = Utc::now();

    let row = timed(
        "matches.insert",
        client.query_one(
            sql.as_str(),
            &[
                &id,
                &new_match.request_id,
                &new_match.worker_id,
                &new_match.score,
                &status,
                &matched_at,
            ],
        ),
    )
    .await?;

    map_match_row(&row)
}

#[instrument(skip(pool, new_match), fields(worker_id = %new_match.worker_id))]
pub async fn insert_match(
    pool: &PgPool,
    new_match: &NewMatch,
) -> Result<MatchRecord, MatchStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    let record = insert_match_row(&tx, new_match).await?;
    tx.commit().await?;
    Ok(record)
}

/// Insert every row in one transaction. Any failure rolls the batch back.
#[instrument(skip(pool, new_matches), fields(count = new_matches.len()))]
pub async fn insert_matches(
    pool: &PgPool,
    new_matches: &[NewMatch],
) -> Result<Vec<MatchRecord>, MatchStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let mut records = Vec::with_capacity(new_matches.len());
    for new_match in new_matches {
        records.push(insert_match_row(&tx, new_match).await?);
    }

    tx.commit().await?;
    Ok(records)
}

#[instrument(skip(pool))]
pub async fn fetch_match(
    pool: &PgPool,
    match_id: Uuid,
) -> Result<Option<MatchRecord>, MatchStorageError> {
    let client = pool.get().await?;
    let sql = format!("SELECT {MATCH_COLUMNS} FROM skilllink.matches WHERE id = $1");

    let row = timed("matches.fetch", client.query_opt(sql.as_str(), &[&match_id])).await?;
    row.as_ref().map(map_match_row).transpose()
}

/// Compare-and-set on `status`: the row only changes while it still holds
/// `expected`.
#[instrument(skip(pool))]
pub async fn update_match_status(
    pool: &PgPool,
    match_id: Uuid,
    expected: MatchStatus,
    status: MatchStatus,
    stamped_at: DateTime<Utc>,
) -> Result<MatchRecord, MatchStorageError> {
    let client = pool.get().await?;
    let status_text = status.to_string();
    let expected_text = expected.to_string();

    let row = match status_timestamp_column(status) {
        Some(column) => {
            let sql = format!(
                "UPDATE skilllink.matches SET status = $2, {column} = $4
                  WHERE id = $1 AND status = $3 RETURNING {MATCH_COLUMNS}"
            );
            timed(
                "matches.update_status",
                client.query_opt(
                    sql.as_str(),
                    &[&match_id, &status_text, &expected_text, &stamped_at],
                ),
            )
            .await?
        }
        None => {
            let sql = format!(
                "UPDATE skilllink.matches SET status = $2
                  WHERE id = $1 AND status = $3 RETURNING {MATCH_COLUMNS}"
            );
            timed(
                "matches.update_status",
                client.query_opt(sql.as_str(), &[&match_id, &status_text, &expected_text]),
            )
            .await?
        }
    };

    if let Some(row) = row {
        return map_match_row(&row);
    }

    // Nothing updated: either the match is gone or someone moved it first.
    let current = timed(
        "matches.current_status",
        client.query_opt(
            "SELECT status FROM skilllink.matches WHERE id = $1",
            &[&match_id],
        ),
    )
    .await?;
    let current = current.ok_or(MatchStorageError::NotFound(match_id))?;
    let actual: String = current.try_get("status")?;
    let actual = MatchStatus::from_str(&actual)
        .map_err(|_| MatchStorageError::Mapping(format!("unknown match status {actual:?}")))?;

    Err(MatchStorageError::StatusConflict {
        match_id,
        expected,
        actual,
    })
}

#[instrument(skip(pool))]
pub async fn list_matches_for_job(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<MatchRecord>, MatchStorageError> {
    let client = pool.get().await?;
    let sql = format!(
        "SELECT {MATCH_COLUMNS} FROM skilllink.matches
          WHERE request_id = $1
          ORDER BY score DESC, worker_id ASC"
    );

    let rows = timed("matches.list_for_job", client.query(sql.as_str(), &[&job_id])).await?;
    rows.iter().map(map_match_row).collect()
}

#[instrument(skip(pool))]
pub async fn list_matches_for_worker(
    pool: &PgPool,
    worker_id: Uuid,
) -> Result<Vec<MatchRecord>, MatchStorageError> {
    let client = pool.get().await?;
    let sql = format!(
        "SELECT {MATCH_COLUMNS} FROM skilllink.matches
          WHERE worker_id = $1
          ORDER BY matched_at DESC, id ASC"
    );

    let rows = timed(
        "matches.list_for_worker",
        client.query(sql.as_str(), &[&worker_id]),
    )
    .await?;
    rows.iter().map(map_match_row).collect()
}
