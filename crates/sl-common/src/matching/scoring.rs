use std::collections::HashSet;

use super::weights::Weights;
use crate::{
    geo::{format_distance, DEFAULT_SEARCH_RADIUS_KM},
    Availability, EmployerProfile, JobCriteria, WorkerCandidate,
};

const NEUTRAL_RATE_SCORE: f64 = 0.5;
const CITY_MISMATCH_SCORE: f64 = 0.5;
const MAX_TRUSTRANK: f64 = 5.0;
const SKILL_BREADTH_CAP: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct FactorScore {
    /// Normalized sub-score in [0, 1].
    pub score: f64,
    /// Contribution to the composite: score * weight * 100.
    pub weighted: f64,
    pub status: &'static str,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct MatchScore {
    /// Composite on the 0-100 scale.
    pub total: f64,
    pub skills: FactorScore,
    pub distance: FactorScore,
    pub trust: FactorScore,
    pub rate: FactorScore,
    pub availability: FactorScore,
}

pub fn calculate_match_score(
    worker: &WorkerCandidate,
    criteria: &JobCriteria,
    employer: &EmployerProfile,
) -> MatchScore {
    ScoringEngine::default().calculate_match_score(worker, criteria, employer)
}

/// Distance between the job site and the worker, when both sides carry coordinates.
pub fn worker_distance_km(worker: &WorkerCandidate, criteria: &JobCriteria) -> Option<f64> {
    match (criteria.location, worker.location) {
        (Some(job), Some(home)) => Some(job.distance_km(&home)),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: Weights,
}

struct RawScore {
    score: f64,
    status: &'static str,
    details: String,
}

impl ScoringEngine {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn calculate_match_score(
        &self,
        worker: &WorkerCandidate,
        criteria: &JobCriteria,
        employer: &EmployerProfile,
    ) -> MatchScore {
        let weights = self.weights;

        let skills = weigh(self.score_skills(worker, criteria), weights.skills);
        let distance = weigh(
            self.score_distance(worker, criteria, employer),
            weights.distance,
        );
        let trust = weigh(self.score_trust(worker), weights.trust);
        let rate = weigh(self.score_rate(worker, criteria), weights.rate);
        let availability = weigh(self.score_availability(worker), weights.availability);

        let total = skills.weighted
            + distance.weighted
            + trust.weighted
            + rate.weighted
            + availability.weighted;

        MatchScore {
            total,
            skills,
            distance,
            trust,
            rate,
            availability,
        }
    }

    fn score_skills(&self, worker: &WorkerCandidate, criteria: &JobCriteria) -> RawScore {
        let required: HashSet<String> = criteria
            .required_skills
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        if required.is_empty() {
            return RawScore {
                score: 1.0,
                status: "PERFECT_MATCH",
                details: "no required skills".into(),
            };
        }

        let possessed: HashSet<String> = worker
            .skill_tags
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let covered = required.intersection(&possessed).count();

        let coverage = covered as f64 / required.len() as f64;
        let breadth = (worker.skill_tags.len() as f64 / 10.0).min(SKILL_BREADTH_CAP);
        let score = (coverage + breadth).min(1.0);

        RawScore {
            score,
            status: status_from_score(score),
            details: format!(
                "required {}/{} covered, breadth bonus {:.2}",
                covered,
                required.len(),
                breadth
            ),
        }
    }

    fn score_distance(
        &self,
        worker: &WorkerCandidate,
        criteria: &JobCriteria,
        employer: &EmployerProfile,
    ) -> RawScore {
        if let Some(distance) = worker_distance_km(worker, criteria) {
            let radius = if criteria.max_radius_km > 0.0 {
                criteria.max_radius_km
            } else {
                DEFAULT_SEARCH_RADIUS_KM
            };

            if !distance.is_finite() || distance > radius {
                return RawScore {
                    score: 0.0,
                    status: "MISS",
                    details: format!(
                        "outside radius: {} > {}",
                        format_distance(distance),
                        format_distance(radius)
                    ),
                };
            }

            let score = (-distance / (radius / 3.0)).exp();
            return RawScore {
                score,
                status: status_from_score(score),
                details: format!(
                    "{} away within {}",
                    format_distance(distance),
                    format_distance(radius)
                ),
            };
        }

        match (
            worker.location_city.as_deref(),
            employer.location_city.as_deref(),
        ) {
            (Some(worker_city), Some(employer_city)) => {
                if worker_city.to_lowercase() == employer_city.to_lowercase() {
                    RawScore {
                        score: 1.0,
                        status: "PERFECT_MATCH",
                        details: format!("same city: {}", worker_city),
                    }
                } else {
                    // Inconsistent city strings can still mean the same metro area.
                    RawScore {
                        score: CITY_MISMATCH_SCORE,
                        status: "PARTIAL_MATCH",
                        details: format!("city differs: {} vs {}", worker_city, employer_city),
                    }
                }
            }
            _ => RawScore {
                score: 0.0,
                status: "UNKNOWN",
                details: "no coordinates or city to compare".into(),
            },
        }
    }

    fn score_trust(&self, worker: &WorkerCandidate) -> RawScore {
        let score = (worker.trustrank / MAX_TRUSTRANK).clamp(0.0, 1.0);

        RawScore {
            score,
            status: status_from_score(score),
            details: format!("trustrank {:.1}/{:.0}", worker.trustrank, MAX_TRUSTRANK),
        }
    }

    fn score_rate(&self, worker: &WorkerCandidate, criteria: &JobCriteria) -> RawScore {
        let worker_rate = worker.suggested_rate.filter(|r| *r > 0.0);
        let max_rate = criteria.max_rate.filter(|r| *r > 0.0);

        let (Some(rate), Some(max)) = (worker_rate, max_rate) else {
            return RawScore {
                score: NEUTRAL_RATE_SCORE,
                status: "UNKNOWN",
                details: "rate or budget unknown, neutral score".into(),
            };
        };

        let (score, status, label) = if rate <= max * 0.8 {
            (1.0, "PERFECT_MATCH", "well under budget")
        } else if rate <= max {
            (0.7, "MATCH", "within budget")
        } else if rate <= max * 1.2 {
            (0.4, "PARTIAL_MATCH", "slightly over budget")
        } else {
            (0.1, "MISS", "over budget")
        };

        RawScore {
            score,
            status,
            details: format!("{}: {:.0} vs max {:.0}", label, rate, max),
        }
    }

    fn score_availability(&self, worker: &WorkerCandidate) -> RawScore {
        if worker.availability == Availability::Available {
            RawScore {
                score: 1.0,
                status: "PERFECT_MATCH",
                details: "available".into(),
            }
        } else {
            RawScore {
                score: 0.0,
                status: "MISS",
                details: format!("availability: {}", worker.availability),
            }
        }
    }
}

fn weigh(raw: RawScore, weight: f64) -> FactorScore {
    FactorScore {
        weighted: raw.score * weight * 100.0,
        score: raw.score,
        status: raw.status,
        details: raw.details,
    }
}

fn status_from_score(score: f64) -> &'static str {
    if score >= 0.9 {
        "PERFECT_MATCH"
    } else if score >= 0.7 {
        "MATCH"
    } else if score >= 0.4 {
        "PARTIAL_MATCH"
    } else {
        "MISS"
    }
}
