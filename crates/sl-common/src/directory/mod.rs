//! Profile directory seam: where candidate workers come from and where match
//! records are written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use uuid::Uuid;

use crate::{MatchRecord, MatchStatus, NewMatch, WorkerCandidate};

pub mod memory;

pub use memory::InMemoryDirectory;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map directory row: {0}")]
    Mapping(String),
    #[error("match not found: {0}")]
    MatchNotFound(Uuid),
    #[error("match {match_id} is {actual}, expected {expected}")]
    StatusConflict {
        match_id: Uuid,
        expected: MatchStatus,
        actual: MatchStatus,
    },
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Workers whose availability is `available`.
    async fn list_available_workers(&self) -> Result<Vec<WorkerCandidate>, DirectoryError>;

    async fn create_match(&self, new_match: &NewMatch) -> Result<MatchRecord, DirectoryError>;

    /// Write every record or none of them. Results keep the input order.
    async fn create_matches(
        &self,
        new_matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, DirectoryError>;

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, DirectoryError>;

    /// Move a match from `expected` to `status`. Fails with `StatusConflict`
    /// when the stored status is no longer `expected`.
    async fn update_match_status(
        &self,
        match_id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        stamped_at: DateTime<Utc>,
    ) -> Result<MatchRecord, DirectoryError>;

    /// Matches for a job, best score first.
    async fn list_job_matches(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, DirectoryError>;

    /// Matches for a worker, newest first.
    async fn list_worker_matches(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<MatchRecord>, DirectoryError>;
}
