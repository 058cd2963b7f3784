pub mod health;
pub mod jobs;
pub mod matches;
pub mod workers;
