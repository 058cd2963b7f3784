pub mod directory;
pub mod matches;
pub mod migrations;
pub mod pool;
pub mod util;
pub mod workers;

pub use directory::PgProfileDirectory;
pub use matches::{
    fetch_match, insert_match, insert_matches, list_matches_for_job, list_matches_for_worker,
    update_match_status, MatchStorageError,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool, DEFAULT_POOL_MAX_SIZE};
pub use workers::{fetch_available_workers, WorkerFetchError};
