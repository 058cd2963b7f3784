use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{matches, workers, MatchStorageError, PgPool, WorkerFetchError};
use crate::{
    directory::{DirectoryError, ProfileDirectory},
    MatchRecord, MatchStatus, NewMatch, WorkerCandidate,
};

impl From<WorkerFetchError> for DirectoryError {
    fn from(err: WorkerFetchError) -> Self {
        match err {
            WorkerFetchError::Pool(e) => DirectoryError::Pool(e),
            WorkerFetchError::Postgres(e) => DirectoryError::Postgres(e),
            WorkerFetchError::Mapping(msg) => DirectoryError::Mapping(msg),
        }
    }
}

impl From<MatchStorageError> for DirectoryError {
    fn from(err: MatchStorageError) -> Self {
        match err {
            MatchStorageError::Pool(e) => DirectoryError::Pool(e),
            MatchStorageError::Postgres(e) => DirectoryError::Postgres(e),
            MatchStorageError::Mapping(msg) => DirectoryError::Mapping(msg),
            MatchStorageError::NotFound(id) => DirectoryError::MatchNotFound(id),
            MatchStorageError::StatusConflict {
                match_id,
                expected,
                actual,
            } => DirectoryError::StatusConflict {
                match_id,
                expected,
                actual,
            },
        }
    }
}

/// `ProfileDirectory` backed by the `skilllink` PostgreSQL schema.
#[derive(Clone)]
pub struct PgProfileDirectory {
    pool: PgPool,
}

impl PgProfileDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn list_available_workers(&self) -> Result<Vec<WorkerCandidate>, DirectoryError> {
        Ok(workers::fetch_available_workers(&self.pool).await?)
    }

    async fn create_match(&self, new_match: &NewMatch) -> Result<MatchRecord, DirectoryError> {
        Ok(matches::insert_match(&self.pool, new_match).await?)
    }

    async fn create_matches(
        &self,
        new_matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, DirectoryError> {
        Ok(matches::insert_matches(&self.pool, new_matches).await?)
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, DirectoryError> {
        Ok(matches::fetch_match(&self.pool, match_id).await?)
    }

    async fn update_match_status(
        &self,
        match_id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        stamped_at: DateTime<Utc>,
    ) -> Result<MatchRecord, DirectoryError> {
        let record = matches::update_match_status(
            &self.pool,
            match_id,
            expected,
            status,
            stamped_at,
        )
        .await?;
        Ok(record)
    }

    async fn list_job_matches(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, DirectoryError> {
        Ok(matches::list_matches_for_job(&self.pool, job_id).await?)
    }

    async fn list_worker_matches(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<MatchRecord>, DirectoryError> {
        Ok(matches::list_matches_for_worker(&self.pool, worker_id).await?)
    }
}
