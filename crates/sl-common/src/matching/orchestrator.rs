use std::{cmp::Ordering, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::scoring::{worker_distance_km, MatchScore, ScoringEngine};
use crate::{
    api::match_response::SuggestedWorker,
    directory::{DirectoryError, ProfileDirectory},
    run_id, EmployerProfile, JobCriteria, MatchRecord, MatchStatus, NewMatch, WorkerCandidate,
};

/// How match writes behave when one of them fails.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersistencePolicy {
    /// Write each record independently; failed writes drop that candidate.
    #[default]
    BestEffort,
    /// Write all records in one transaction or fail the run.
    AllOrNothing,
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum composite score (0-100) for a candidate to be kept.
    pub min_score: f64,
    pub top_n: usize,
    pub persistence: PersistencePolicy,
    pub deadline: Duration,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            top_n: 10,
            persistence: PersistencePolicy::default(),
            deadline: Duration::from_millis(5000),
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            min_score: env_parse("SL_MATCH_MIN_SCORE").unwrap_or(defaults.min_score),
            top_n: env_parse::<usize>("SL_MATCH_TOP_N")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.top_n),
            persistence: std::env::var("SL_MATCH_PERSISTENCE_POLICY")
                .ok()
                .and_then(|raw| PersistencePolicy::from_str(raw.trim()).ok())
                .unwrap_or(defaults.persistence),
            deadline: env_parse::<u64>("SL_MATCH_DEADLINE_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.deadline),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("failed to fetch candidate pool: {0}")]
    CandidatePool(#[source] DirectoryError),
    #[error("failed to persist match records: {0}")]
    Persistence(#[source] DirectoryError),
    #[error("matching run exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub worker: WorkerCandidate,
    pub score: MatchScore,
    pub distance_km: Option<f64>,
}

impl RankedCandidate {
    fn to_new_match(&self, job_id: Uuid) -> NewMatch {
        NewMatch {
            request_id: job_id,
            worker_id: self.worker.id,
            score: (self.score.total / 100.0).clamp(0.0, 1.0),
            status: MatchStatus::Suggested,
        }
    }

    fn into_suggested(self, record: &MatchRecord) -> SuggestedWorker {
        SuggestedWorker {
            worker_id: self.worker.id,
            match_id: record.id,
            score: self.score.total.round().max(0.0) as u32,
            name: self.worker.display_name,
            photo_url: self.worker.photo_url,
            bio: self.worker.bio,
            skills: self.worker.skill_tags,
            rate_per_hour: self.worker.suggested_rate,
            distance_km: self.distance_km,
            trustrank: self.worker.trustrank,
        }
    }
}

/// Turns one job's criteria into a persisted, ranked shortlist.
pub struct MatchingOrchestrator {
    directory: Arc<dyn ProfileDirectory>,
    engine: ScoringEngine,
    config: MatchingConfig,
}

impl MatchingOrchestrator {
    pub fn new(directory: Arc<dyn ProfileDirectory>, config: MatchingConfig) -> Self {
        Self::with_engine(directory, ScoringEngine::default(), config)
    }

    pub fn with_engine(
        directory: Arc<dyn ProfileDirectory>,
        engine: ScoringEngine,
        config: MatchingConfig,
    ) -> Self {
        Self {
            directory,
            engine,
            config,
        }
    }

    /// Score, threshold, sort (score desc, then worker id asc) and truncate.
    pub fn rank_candidates(
        &self,
        workers: Vec<WorkerCandidate>,
        criteria: &JobCriteria,
        employer: &EmployerProfile,
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<_> = workers
            .into_iter()
            .filter_map(|worker| {
                let score = self.engine.calculate_match_score(&worker, criteria, employer);
                if !score.total.is_finite() || score.total < self.config.min_score {
                    return None;
                }
                let distance_km = worker_distance_km(&worker, criteria);
                Some(RankedCandidate {
                    worker,
                    score,
                    distance_km,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.worker.id.cmp(&b.worker.id))
        });
        ranked.truncate(self.config.top_n);

        ranked
    }

    /// Rank the available worker pool for `job_id` and persist a `suggested`
    /// match for each survivor. Bounded by `MatchingConfig::deadline`.
    #[instrument(skip_all, fields(job_id = %job_id, run_id = tracing::field::Empty))]
    pub async fn find_matching_workers(
        &self,
        job_id: Uuid,
        criteria: &JobCriteria,
        employer: &EmployerProfile,
    ) -> Result<Vec<SuggestedWorker>, MatchingError> {
        let deadline = self.config.deadline;
        timeout(deadline, self.run(job_id, criteria, employer))
            .await
            .map_err(|_| MatchingError::DeadlineExceeded(deadline))?
    }

    async fn run(
        &self,
        job_id: Uuid,
        criteria: &JobCriteria,
        employer: &EmployerProfile,
    ) -> Result<Vec<SuggestedWorker>, MatchingError> {
        let run_id = run_id::generate();
        tracing::Span::current().record("run_id", run_id.as_str());

        let workers = self
            .directory
            .list_available_workers()
            .await
            .map_err(MatchingError::CandidatePool)?;
        let pool_size = workers.len();

        let ranked = self.rank_candidates(workers, criteria, employer);
        if ranked.is_empty() {
            info!(pool_size, "no candidate cleared the minimum score");
            return Ok(Vec::new());
        }

        let suggested = match self.config.persistence {
            PersistencePolicy::BestEffort => self.persist_best_effort(job_id, ranked).await,
            PersistencePolicy::AllOrNothing => self.persist_all(job_id, ranked).await?,
        };

        info!(
            pool_size,
            suggested = suggested.len(),
            policy = %self.config.persistence,
            "matching run completed"
        );

        Ok(suggested)
    }

    async fn persist_best_effort(
        &self,
        job_id: Uuid,
        ranked: Vec<RankedCandidate>,
    ) -> Vec<SuggestedWorker> {
        let mut suggested = Vec::with_capacity(ranked.len());

        for candidate in ranked {
            match self
                .directory
                .create_match(&candidate.to_new_match(job_id))
                .await
            {
                Ok(record) => suggested.push(candidate.into_suggested(&record)),
                Err(err) => {
                    warn!(
                        worker_id = %candidate.worker.id,
                        error = %err,
                        "failed to persist match; dropping candidate"
                    );
                }
            }
        }

        suggested
    }

    async fn persist_all(
        &self,
        job_id: Uuid,
        ranked: Vec<RankedCandidate>,
    ) -> Result<Vec<SuggestedWorker>, MatchingError> {
        let new_matches: Vec<_> = ranked.iter().map(|c| c.to_new_match(job_id)).collect();
        let records = self
            .directory
            .create_matches(&new_matches)
            .await
            .map_err(MatchingError::Persistence)?;

        Ok(ranked
            .into_iter()
            .zip(records.iter())
            .map(|(candidate, record)| candidate.into_suggested(record))
            .collect())
    }
}
