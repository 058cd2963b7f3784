use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ranked worker returned to the job creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedWorker {
    pub worker_id: Uuid,
    pub match_id: Uuid,
    /// Composite score rounded to an integer on the 0-100 scale.
    pub score: u32,
    pub name: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub rate_per_hour: Option<f64>,
    pub distance_km: Option<f64>,
    pub trustrank: f64,
}

/// Response body of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub job_id: Uuid,
    pub suggested_workers: Vec<SuggestedWorker>,
}
