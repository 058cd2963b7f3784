use std::str::FromStr;

use deadpool_postgres::PoolError;
use tokio_postgres::{Error as PgError, Row};
use tracing::{debug, instrument};

use super::{util::timed, PgPool};
use crate::{Availability, Coordinates, WorkerCandidate};

#[derive(Debug, thiserror::Error)]
pub enum WorkerFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map worker row: {0}")]
    Mapping(String),
}

const AVAILABLE_WORKERS_SQL: &str = "SELECT id, display_name, photo_url, bio_generated,
        location_city, latitude, longitude, suggested_rate,
        availability_status, trustrank, skill_tags
   FROM skilllink.worker_profiles
  WHERE availability_status = 'available'
  ORDER BY id";

#[instrument(skip(pool))]
pub async fn fetch_available_workers(
    pool: &PgPool,
) -> Result<Vec<WorkerCandidate>, WorkerFetchError> {
    let client = pool.get().await?;
    let rows = timed(
        "workers.fetch_available",
        client.query(AVAILABLE_WORKERS_SQL, &[]),
    )
    .await?;

    let workers = rows
        .iter()
        .map(map_worker_row)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = workers.len(), "fetched available workers");

    Ok(workers)
}

fn map_worker_row(row: &Row) -> Result<WorkerCandidate, WorkerFetchError> {
    let availability: String = row.try_get("availability_status")?;
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;

    Ok(WorkerCandidate {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        skill_tags: row.try_get("skill_tags")?,
        location: coordinates_from_columns(latitude, longitude),
        location_city: row.try_get("location_city")?,
        suggested_rate: row.try_get("suggested_rate")?,
        trustrank: row.try_get("trustrank")?,
        availability: parse_availability(&availability)?,
        photo_url: row.try_get("photo_url")?,
        bio: row.try_get("bio_generated")?,
    })
}

fn coordinates_from_columns(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid),
        _ => None,
    }
}

fn parse_availability(raw: &str) -> Result<Availability, WorkerFetchError> {
    Availability::from_str(raw)
        .map_err(|_| WorkerFetchError::Mapping(format!("unknown availability_status {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_need_both_columns_in_range() {
        assert_eq!(
            coordinates_from_columns(Some(19.0), Some(72.8)),
            Some(Coordinates::new(19.0, 72.8))
        );
        assert_eq!(coordinates_from_columns(Some(19.0), None), None);
        assert_eq!(coordinates_from_columns(Some(190.0), Some(72.8)), None);
    }

    #[test]
    fn availability_column_is_parsed_strictly() {
        assert_eq!(parse_availability("busy").unwrap(), Availability::Busy);
        assert!(matches!(
            parse_availability("on_leave"),
            Err(WorkerFetchError::Mapping(_))
        ));
    }
}
