use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    directory::{DirectoryError, ProfileDirectory},
    MatchRecord, MatchStatus,
};

impl MatchStatus {
    fn stage(self) -> u8 {
        match self {
            MatchStatus::Suggested => 0,
            MatchStatus::Shortlisted => 1,
            MatchStatus::Contacted => 2,
            MatchStatus::Hired => 3,
            MatchStatus::Rejected => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Hired | MatchStatus::Rejected)
    }

    /// Forward-only along suggested -> shortlisted -> contacted -> hired
    /// (stages may be skipped); any open match may be rejected. Staying in
    /// the same status is always allowed.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }

        match next {
            MatchStatus::Rejected => true,
            MatchStatus::Suggested => false,
            _ => next.stage() > self.stage(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("match not found: {0}")]
    NotFound(Uuid),
    #[error("cannot move match from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Status changes on existing match records, driven by employer actions.
pub struct MatchLifecycle {
    directory: Arc<dyn ProfileDirectory>,
}

impl MatchLifecycle {
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { directory }
    }

    #[instrument(skip(self), fields(next = %next))]
    pub async fn transition(
        &self,
        match_id: Uuid,
        next: MatchStatus,
    ) -> Result<MatchRecord, LifecycleError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let current = self
                .directory
                .get_match(match_id)
                .await?
                .ok_or(LifecycleError::NotFound(match_id))?;

            if current.status == next {
                return Ok(current);
            }
            if !current.status.can_transition_to(next) {
                return Err(LifecycleError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }

            let result = self
                .directory
                .update_match_status(match_id, current.status, next, Utc::now())
                .await;

            match result {
                Ok(updated) => {
                    info!(from = %current.status, "match status updated");
                    return Ok(updated);
                }
                // Another writer moved the match first; re-validate against its new status.
                Err(DirectoryError::StatusConflict { actual, .. }) => {
                    if attempts >= MAX_TRANSITION_ATTEMPTS {
                        return Err(LifecycleError::InvalidTransition {
                            from: actual,
                            to: next,
                        });
                    }
                }
                Err(DirectoryError::MatchNotFound(id)) => return Err(LifecycleError::NotFound(id)),
                Err(other) => return Err(LifecycleError::Directory(other)),
            }
        }
    }

    pub async fn contact(&self, match_id: Uuid) -> Result<MatchRecord, LifecycleError> {
        self.transition(match_id, MatchStatus::Contacted).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::{directory::InMemoryDirectory, NewMatch, WorkerCandidate};

    #[test]
    fn transitions_only_move_forward() {
        use MatchStatus::*;

        assert!(Suggested.can_transition_to(Shortlisted));
        assert!(Suggested.can_transition_to(Contacted));
        assert!(Shortlisted.can_transition_to(Hired));
        assert!(Contacted.can_transition_to(Rejected));
        assert!(!Contacted.can_transition_to(Shortlisted));
        assert!(!Shortlisted.can_transition_to(Suggested));
        assert!(!Hired.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Contacted));
        assert!(Hired.can_transition_to(Hired));
    }

    async fn seeded() -> (Arc<InMemoryDirectory>, MatchRecord) {
        let directory = Arc::new(InMemoryDirectory::new());
        let record = directory
            .create_match(&NewMatch {
                request_id: Uuid::new_v4(),
                worker_id: Uuid::new_v4(),
                score: 0.72,
                status: MatchStatus::Suggested,
            })
            .await
            .unwrap();
        (directory, record)
    }

    #[tokio::test]
    async fn contact_stamps_contacted_at() {
        let (directory, record) = seeded().await;
        let lifecycle = MatchLifecycle::new(directory);

        let updated = lifecycle.contact(record.id).await.unwrap();

        assert_eq!(updated.status, MatchStatus::Contacted);
        assert!(updated.contacted_at.is_some());
        assert!(updated.hired_at.is_none());
    }

    #[tokio::test]
    async fn terminal_states_refuse_changes() {
        let (directory, record) = seeded().await;
        let lifecycle = MatchLifecycle::new(directory);

        lifecycle
            .transition(record.id, MatchStatus::Hired)
            .await
            .unwrap();
        let err = lifecycle
            .transition(record.id, MatchStatus::Rejected)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: MatchStatus::Hired,
                to: MatchStatus::Rejected
            }
        ));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let lifecycle = MatchLifecycle::new(Arc::new(InMemoryDirectory::new()));
        let missing = Uuid::new_v4();

        let err = lifecycle.contact(missing).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn repeating_the_current_status_is_a_no_op() {
        let (directory, record) = seeded().await;
        let lifecycle = MatchLifecycle::new(directory);

        let first = lifecycle.contact(record.id).await.unwrap();
        let second = lifecycle.contact(record.id).await.unwrap();
        assert_eq!(first.contacted_at, second.contacted_at);
    }

    /// Suspends after every read so concurrent transitions interleave.
    struct YieldingDirectory(Arc<InMemoryDirectory>);

    #[async_trait]
    impl ProfileDirectory for YieldingDirectory {
        async fn list_available_workers(&self) -> Result<Vec<WorkerCandidate>, DirectoryError> {
            self.0.list_available_workers().await
        }

        async fn create_match(&self, new_match: &NewMatch) -> Result<MatchRecord, DirectoryError> {
            self.0.create_match(new_match).await
        }

        async fn create_matches(
            &self,
            new_matches: &[NewMatch],
        ) -> Result<Vec<MatchRecord>, DirectoryError> {
            self.0.create_matches(new_matches).await
        }

        async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, DirectoryError> {
            let record = self.0.get_match(match_id).await;
            tokio::task::yield_now().await;
            record
        }

        async fn update_match_status(
            &self,
            match_id: Uuid,
            expected: MatchStatus,
            status: MatchStatus,
            stamped_at: DateTime<Utc>,
        ) -> Result<MatchRecord, DirectoryError> {
            self.0
                .update_match_status(match_id, expected, status, stamped_at)
                .await
        }

        async fn list_job_matches(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, DirectoryError> {
            self.0.list_job_matches(job_id).await
        }

        async fn list_worker_matches(
            &self,
            worker_id: Uuid,
        ) -> Result<Vec<MatchRecord>, DirectoryError> {
            self.0.list_worker_matches(worker_id).await
        }
    }

    #[tokio::test]
    async fn racing_hire_and_reject_leave_one_terminal_state() {
        let (directory, record) = seeded().await;
        let lifecycle = MatchLifecycle::new(Arc::new(YieldingDirectory(directory.clone())));
        lifecycle.contact(record.id).await.unwrap();

        let (hire, reject) = tokio::join!(
            lifecycle.transition(record.id, MatchStatus::Hired),
            lifecycle.transition(record.id, MatchStatus::Rejected),
        );

        assert!(hire.is_ok() != reject.is_ok(), "exactly one writer wins");
        let loser = if hire.is_ok() { reject } else { hire };
        assert!(matches!(
            loser.unwrap_err(),
            LifecycleError::InvalidTransition { .. }
        ));

        let stored = directory.matches();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].status.is_terminal());
        assert!(stored[0].hired_at.is_some() != stored[0].rejected_at.is_some());
    }

    #[tokio::test]
    async fn racing_forward_moves_both_land() {
        let (directory, record) = seeded().await;
        let lifecycle = MatchLifecycle::new(Arc::new(YieldingDirectory(directory.clone())));

        let (shortlist, contact) = tokio::join!(
            lifecycle.transition(record.id, MatchStatus::Shortlisted),
            lifecycle.contact(record.id),
        );

        // The loser re-reads and moves on if the order still allows it.
        assert!(contact.is_ok());
        if let Err(err) = shortlist {
            assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
        }
        assert_eq!(directory.matches()[0].status, MatchStatus::Contacted);
    }
}
