use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const BOOTSTRAP: &str = "CREATE SCHEMA IF NOT EXISTS skilllink;
CREATE TABLE IF NOT EXISTS skilllink.schema_migrations (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);";

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "worker profiles and matches",
        sql: r#"
CREATE TABLE IF NOT EXISTS skilllink.worker_profiles (
    id UUID PRIMARY KEY,
    display_name TEXT NOT NULL,
    photo_url TEXT,
    bio_generated TEXT,
    location_city TEXT,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    suggested_rate DOUBLE PRECISION,
    availability_status TEXT NOT NULL DEFAULT 'available'
        CHECK (availability_status IN ('available', 'busy', 'inactive')),
    trustrank DOUBLE PRECISION NOT NULL DEFAULT 0,
    skill_tags TEXT[] NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS skilllink.matches (
    id UUID PRIMARY KEY,
    request_id UUID NOT NULL,
    worker_id UUID NOT NULL REFERENCES skilllink.worker_profiles(id),
    score DOUBLE PRECISION NOT NULL CHECK (score >= 0.0 AND score <= 1.0),
    status TEXT NOT NULL DEFAULT 'suggested'
        CHECK (status IN ('suggested', 'shortlisted', 'contacted', 'hired', 'rejected')),
    matched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    shortlisted_at TIMESTAMPTZ,
    contacted_at TIMESTAMPTZ,
    hired_at TIMESTAMPTZ,
    rejected_at TIMESTAMPTZ
);
"#,
    },
    Migration {
        id: 2,
        description: "lookup indexes for availability and match listings",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_worker_profiles_available
    ON skilllink.worker_profiles(id)
    WHERE availability_status = 'available';
CREATE INDEX IF NOT EXISTS idx_matches_request_score
    ON skilllink.matches(request_id, score DESC);
CREATE INDEX IF NOT EXISTS idx_matches_worker_matched_at
    ON skilllink.matches(worker_id, matched_at DESC);
"#,
    },
    Migration {
        id: 3,
        description: "one match per job and worker",
        sql: r#"
DELETE FROM skilllink.matches newer
    USING skilllink.matches older
    WHERE newer.request_id = older.request_id
      AND newer.worker_id = older.worker_id
      AND (newer.matched_at, newer.id) > (older.matched_at, older.id);
CREATE UNIQUE INDEX IF NOT EXISTS uq_matches_request_worker
    ON skilllink.matches(request_id, worker_id);
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client.batch_execute(BOOTSTRAP).await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM skilllink.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO skilllink.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
