use serde::Deserialize;

use crate::{
    geo::{city_coordinates, Coordinates, DEFAULT_SEARCH_RADIUS_KM, MAX_SEARCH_RADIUS_KM},
    EmployerProfile, JobCriteria, MatchStatus,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RequestValidationError {
    #[error("latitude and longitude must be provided together")]
    PartialCoordinates,
    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    CoordinatesOutOfRange { lat: f64, lng: f64 },
    #[error("{field} must be a finite, non-negative number")]
    InvalidNumber { field: &'static str },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Body of `POST /api/jobs/:job_id/matches`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindMatchesRequest {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub location: JobLocation,
    #[serde(default)]
    pub max_radius_km: Option<f64>,
    #[serde(default)]
    pub max_rate: Option<f64>,
    #[serde(default)]
    pub min_trustrank: Option<f64>,
    #[serde(default)]
    pub employer: EmployerProfile,
}

impl FindMatchesRequest {
    /// Validate the body and resolve it into scoring criteria.
    ///
    /// Jobs without coordinates fall back to the city table; an unknown city
    /// leaves the location empty so scoring uses the city comparison.
    pub fn into_criteria(self) -> Result<(JobCriteria, EmployerProfile), RequestValidationError> {
        let location = match (self.location.lat, self.location.lng) {
            (Some(lat), Some(lng)) => {
                let coords = Coordinates::new(lat, lng);
                if !coords.is_valid() {
                    return Err(RequestValidationError::CoordinatesOutOfRange { lat, lng });
                }
                Some(coords)
            }
            (None, None) => self.location.city.as_deref().and_then(city_coordinates),
            _ => return Err(RequestValidationError::PartialCoordinates),
        };

        let max_radius_km = match self.max_radius_km {
            Some(radius) if !radius.is_finite() || radius < 0.0 => {
                return Err(RequestValidationError::InvalidNumber {
                    field: "max_radius_km",
                })
            }
            Some(radius) if radius > 0.0 => radius.min(MAX_SEARCH_RADIUS_KM),
            _ => DEFAULT_SEARCH_RADIUS_KM,
        };

        if let Some(rate) = self.max_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(RequestValidationError::InvalidNumber { field: "max_rate" });
            }
        }

        let mut employer = self.employer;
        if employer.location_city.is_none() {
            employer.location_city = self.location.city;
        }

        let criteria = JobCriteria {
            required_skills: self.required_skills,
            location,
            max_radius_km,
            max_rate: self.max_rate,
            min_trustrank: self.min_trustrank,
        };

        Ok((criteria, employer))
    }
}

/// Body of `PATCH /api/matches/:id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMatchStatusRequest {
    pub status: MatchStatus,
}
