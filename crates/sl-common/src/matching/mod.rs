pub mod lifecycle;
pub mod orchestrator;
pub mod scoring;
pub mod weights;

pub use lifecycle::{LifecycleError, MatchLifecycle};
pub use orchestrator::{MatchingConfig, MatchingError, MatchingOrchestrator, PersistencePolicy};
pub use scoring::{calculate_match_score, MatchScore, ScoringEngine};
