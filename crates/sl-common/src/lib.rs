pub mod api;
pub mod cache;
pub mod db;
pub mod directory;
pub mod geo;
pub mod logging;
pub mod matching;
pub mod run_id;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

pub use geo::Coordinates;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Busy,
    Inactive,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Suggested,
    Shortlisted,
    Contacted,
    Hired,
    Rejected,
}

// Commonly used data models for matching functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerCandidate {
    pub id: Uuid,
    pub display_name: String,
    pub skill_tags: Vec<String>,
    pub location: Option<Coordinates>,
    pub location_city: Option<String>,
    pub suggested_rate: Option<f64>,
    pub trustrank: f64,
    pub availability: Availability,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCriteria {
    pub required_skills: Vec<String>,
    pub location: Option<Coordinates>,
    #[serde(default = "default_radius_km")]
    pub max_radius_km: f64,
    pub max_rate: Option<f64>,
    /// Carried with the criteria; the scorer does not enforce it.
    pub min_trustrank: Option<f64>,
}

fn default_radius_km() -> f64 {
    geo::DEFAULT_SEARCH_RADIUS_KM
}

impl Default for JobCriteria {
    fn default() -> Self {
        Self {
            required_skills: Vec::new(),
            location: None,
            max_radius_km: default_radius_km(),
            max_rate: None,
            min_trustrank: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerProfile {
    pub location_city: Option<String>,
}

/// A persisted job <-> worker association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub request_id: Uuid,
    pub worker_id: Uuid,
    /// Composite score / 100, in [0, 1].
    pub score: f64,
    pub status: MatchStatus,
    pub matched_at: DateTime<Utc>,
    pub shortlisted_at: Option<DateTime<Utc>>,
    pub contacted_at: Option<DateTime<Utc>>,
    pub hired_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Move the record to `status` and stamp the matching timestamp column.
    pub fn stamp(&mut self, status: MatchStatus, at: DateTime<Utc>) {
        self.status = status;
        match status {
            MatchStatus::Suggested => {}
            MatchStatus::Shortlisted => self.shortlisted_at = Some(at),
            MatchStatus::Contacted => self.contacted_at = Some(at),
            MatchStatus::Hired => self.hired_at = Some(at),
            MatchStatus::Rejected => self.rejected_at = Some(at),
        }
    }
}

/// Insert payload for a new match record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub request_id: Uuid,
    pub worker_id: Uuid,
    pub score: f64,
    pub status: MatchStatus,
}
