//! Great-circle distance helpers and the static city fallback table.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 50.0;
pub const MAX_SEARCH_RADIUS_KM: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

// Approximate centres for major Indian cities, keyed by lowercase name.
const CITY_TABLE: &[(&str, f64, f64)] = &[
    ("hyderabad", 17.385, 78.4867),
    ("bengaluru", 12.9716, 77.5946),
    ("bangalore", 12.9716, 77.5946),
    ("mumbai", 19.076, 72.8777),
    ("delhi", 28.7041, 77.1025),
    ("chennai", 13.0827, 80.2707),
    ("kolkata", 22.5726, 88.3639),
    ("pune", 18.5204, 73.8567),
    ("ahmedabad", 23.0225, 72.5714),
    ("jaipur", 26.9124, 75.7873),
    ("lucknow", 26.8467, 80.9462),
    ("kanpur", 26.4499, 80.3319),
    ("nagpur", 21.1458, 79.0882),
    ("indore", 22.7196, 75.8577),
    ("bhopal", 23.2599, 77.4126),
];

/// Haversine distance in kilometres, rounded to one decimal place.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    // Rounding can push `a` just past 1.0 for near-antipodal points.
    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

pub fn within_radius(lat1: f64, lng1: f64, lat2: f64, lng2: f64, radius_km: f64) -> bool {
    distance_km(lat1, lng1, lat2, lng2) <= radius_km
}

/// Fallback lookup for job or profile locations that arrive without coordinates.
/// Unknown names yield `None`.
pub fn city_coordinates(name: &str) -> Option<Coordinates> {
    let normalized = name.trim().to_lowercase();
    CITY_TABLE
        .iter()
        .find(|(city, _, _)| *city == normalized)
        .map(|(_, lat, lng)| Coordinates::new(*lat, *lng))
}

pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{}m", (distance_km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", distance_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUMBAI: Coordinates = Coordinates::new(19.076, 72.8777);
    const PUNE: Coordinates = Coordinates::new(18.5204, 73.8567);

    #[test]
    fn distance_is_symmetric_and_zero_on_identity() {
        let there = MUMBAI.distance_km(&PUNE);
        let back = PUNE.distance_km(&MUMBAI);
        assert_eq!(there, back);
        assert_eq!(MUMBAI.distance_km(&MUMBAI), 0.0);
    }

    #[test]
    fn mumbai_to_pune_is_about_120_km() {
        let d = MUMBAI.distance_km(&PUNE);
        assert!(d > 110.0 && d < 130.0, "unexpected distance {d}");
        // one decimal place
        assert_eq!((d * 10.0).round() / 10.0, d);
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let job = Coordinates::new(-45.14, 72.8777);
        let worker = Coordinates::new(45.14, -107.1223);

        let d = job.distance_km(&worker);
        assert!(d.is_finite(), "distance was {d}");
        assert!(d > 20_000.0 && d <= 20_015.1, "unexpected distance {d}");
        assert!(!within_radius(job.lat, job.lng, worker.lat, worker.lng, 50.0));
    }

    #[test]
    fn within_radius_is_inclusive() {
        let d = MUMBAI.distance_km(&PUNE);
        assert!(within_radius(MUMBAI.lat, MUMBAI.lng, PUNE.lat, PUNE.lng, d));
        assert!(!within_radius(
            MUMBAI.lat,
            MUMBAI.lng,
            PUNE.lat,
            PUNE.lng,
            d - 0.1
        ));
    }

    #[test]
    fn city_lookup_trims_and_ignores_case() {
        assert_eq!(city_coordinates("  MUMBAI "), Some(MUMBAI));
        assert_eq!(city_coordinates("Bangalore"), city_coordinates("bengaluru"));
        assert_eq!(city_coordinates("Atlantis"), None);
    }

    #[test]
    fn formats_short_and_long_distances() {
        assert_eq!(format_distance(0.85), "850m");
        assert_eq!(format_distance(12.34), "12.3km");
    }

    #[test]
    fn validates_coordinate_ranges() {
        assert!(MUMBAI.is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
    }
}
