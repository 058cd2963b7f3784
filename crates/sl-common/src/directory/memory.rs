use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{DirectoryError, ProfileDirectory};
use crate::{Availability, MatchRecord, MatchStatus, NewMatch, WorkerCandidate};

/// Process-local directory used by tests and local runs without PostgreSQL.
///
/// `fail_candidate_fetch` and `limit_match_writes` inject upstream failures.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    workers: Vec<WorkerCandidate>,
    matches: Vec<MatchRecord>,
    fail_fetch: bool,
    // Remaining successful writes; `None` means unlimited.
    write_budget: Option<usize>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: Vec<WorkerCandidate>) -> Self {
        let directory = Self::default();
        directory.lock().workers = workers;
        directory
    }

    pub fn fail_candidate_fetch(&self, fail: bool) {
        self.lock().fail_fetch = fail;
    }

    /// Allow only `budget` more match writes before every write fails.
    pub fn limit_match_writes(&self, budget: Option<usize>) {
        self.lock().write_budget = budget;
    }

    pub fn matches(&self) -> Vec<MatchRecord> {
        self.lock().matches.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn new_record(new_match: &NewMatch, at: DateTime<Utc>) -> MatchRecord {
    MatchRecord {
        id: Uuid::new_v4(),
        request_id: new_match.request_id,
        worker_id: new_match.worker_id,
        score: new_match.score,
        status: new_match.status,
        matched_at: at,
        shortlisted_at: None,
        contacted_at: None,
        hired_at: None,
        rejected_at: None,
    }
}

/// Same (job, worker) pair: refresh the score and keep the existing record.
fn upsert(matches: &mut Vec<MatchRecord>, new_match: &NewMatch, at: DateTime<Utc>) -> MatchRecord {
    let existing = matches
        .iter_mut()
        .find(|m| m.request_id == new_match.request_id && m.worker_id == new_match.worker_id);
    if let Some(record) = existing {
        record.score = new_match.score;
        return record.clone();
    }

    let record = new_record(new_match, at);
    matches.push(record.clone());
    record
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn list_available_workers(&self) -> Result<Vec<WorkerCandidate>, DirectoryError> {
        let state = self.lock();
        if state.fail_fetch {
            return Err(DirectoryError::Unavailable("worker pool fetch failed".into()));
        }

        Ok(state
            .workers
            .iter()
            .filter(|w| w.availability == Availability::Available)
            .cloned()
            .collect())
    }

    async fn create_match(&self, new_match: &NewMatch) -> Result<MatchRecord, DirectoryError> {
        let mut state = self.lock();
        if let Some(remaining) = state.write_budget.as_mut() {
            if *remaining == 0 {
                return Err(DirectoryError::Unavailable("match write rejected".into()));
            }
            *remaining -= 1;
        }

        Ok(upsert(&mut state.matches, new_match, Utc::now()))
    }

    async fn create_matches(
        &self,
        new_matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, DirectoryError> {
        let mut state = self.lock();
        if let Some(remaining) = state.write_budget.as_mut() {
            if *remaining < new_matches.len() {
                return Err(DirectoryError::Unavailable("match batch rejected".into()));
            }
            *remaining -= new_matches.len();
        }

        let now = Utc::now();
        Ok(new_matches
            .iter()
            .map(|m| upsert(&mut state.matches, m, now))
            .collect())
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, DirectoryError> {
        Ok(self
            .lock()
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .cloned())
    }

    async fn update_match_status(
        &self,
        match_id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        stamped_at: DateTime<Utc>,
    ) -> Result<MatchRecord, DirectoryError> {
        let mut state = self.lock();
        let record = state
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(DirectoryError::MatchNotFound(match_id))?;

        if record.status != expected {
            return Err(DirectoryError::StatusConflict {
                match_id,
                expected,
                actual: record.status,
            });
        }

        record.stamp(status, stamped_at);
        Ok(record.clone())
    }

    async fn list_job_matches(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, DirectoryError> {
        let mut matches: Vec<_> = self
            .lock()
            .matches
            .iter()
            .filter(|m| m.request_id == job_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        Ok(matches)
    }

    async fn list_worker_matches(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<MatchRecord>, DirectoryError> {
        let mut matches: Vec<_> = self
            .lock()
            .matches
            .iter()
            .filter(|m| m.worker_id == worker_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
        Ok(matches)
    }
}
