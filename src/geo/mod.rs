pub mod distance_matrix;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::location::GeoPoint;

pub use distance_matrix::DistanceMatrixClient;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Transport failure, timeout, non-2xx or an unreadable response.
    #[error("upstream: {0}")]
    Upstream(String),

    /// The service answered but had no usable route.
    #[error("no usable route: {0}")]
    Unavailable(String),
}

/// Maps two points to a travel distance in meters.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    async fn distance_meters(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<f64, ResolveError>;
}

/// Great-circle distance, for running without a routing service.
#[derive(Debug, Default, Clone, Copy)]
pub struct StraightLineResolver;

#[async_trait]
impl DistanceResolver for StraightLineResolver {
    async fn distance_meters(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<f64, ResolveError> {
        Ok(haversine_m(origin, destination).round())
    }
}

pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_M * central_angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 22.33,
            lng: 114.14,
        };
        assert!(haversine_m(&p, &p) < 1e-6);
    }

    #[test]
    fn one_hundredth_degree_of_latitude_is_about_1112_m() {
        let a = GeoPoint {
            lat: 22.33,
            lng: 114.14,
        };
        let b = GeoPoint {
            lat: 22.32,
            lng: 114.14,
        };
        assert!((haversine_m(&a, &b) - 1112.0).abs() < 2.0);
    }

    #[tokio::test]
    async fn straight_line_resolver_rounds_to_whole_meters() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let meters = StraightLineResolver
            .distance_meters(&london, &paris)
            .await
            .unwrap();

        assert_eq!(meters.fract(), 0.0);
        assert!((meters - 343_000.0).abs() < 5_000.0);
    }
}
