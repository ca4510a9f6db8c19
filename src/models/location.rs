use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// `lat,lng` as routing services expect it in query strings.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Place-order request body. Each point is `[lat, lng]` as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub origin: Vec<String>,
    pub destination: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

impl TryFrom<Location> for Route {
    type Error = AppError;

    fn try_from(location: Location) -> Result<Self, Self::Error> {
        Ok(Self {
            origin: parse_point("origin", &location.origin)?,
            destination: parse_point("destination", &location.destination)?,
        })
    }
}

fn parse_point(field: &str, raw: &[String]) -> Result<GeoPoint, AppError> {
    let [lat, lng] = raw else {
        return Err(AppError::BadRequest(format!(
            "{field} must have exactly 2 coordinates, got {}",
            raw.len()
        )));
    };

    let lat = parse_coordinate(field, "latitude", lat, 90.0)?;
    let lng = parse_coordinate(field, "longitude", lng, 180.0)?;

    Ok(GeoPoint { lat, lng })
}

fn parse_coordinate(field: &str, axis: &str, raw: &str, bound: f64) -> Result<f64, AppError> {
    let value = raw
        .parse::<f64>()
        .map_err(|err| AppError::BadRequest(format!("{field} {axis} {raw:?}: {err}")))?;

    if !value.is_finite() || value.abs() > bound {
        return Err(AppError::BadRequest(format!(
            "{field} {axis} {value} outside [-{bound}, {bound}]"
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(origin: &[&str], destination: &[&str]) -> Location {
        Location {
            origin: origin.iter().map(|s| s.to_string()).collect(),
            destination: destination.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parses_decimal_degree_strings() {
        let route = Route::try_from(location(&["22.33", "114.14"], &["22.32", "114.14"])).unwrap();

        assert_eq!(route.origin, GeoPoint { lat: 22.33, lng: 114.14 });
        assert_eq!(route.destination.to_query_value(), "22.32,114.14");
    }

    #[test]
    fn rejects_missing_component() {
        let err = Route::try_from(location(&["22.33"], &["22.32", "114.14"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_extra_component() {
        let err =
            Route::try_from(location(&["22.33", "114.14", "1"], &["22.32", "114.14"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_unparseable_and_out_of_range() {
        assert!(Route::try_from(location(&["north", "114.14"], &["22.32", "114.14"])).is_err());
        assert!(Route::try_from(location(&["91", "114.14"], &["22.32", "114.14"])).is_err());
        assert!(Route::try_from(location(&["22.33", "114.14"], &["22.32", "-180.5"])).is_err());
        assert!(Route::try_from(location(&["NaN", "114.14"], &["22.32", "114.14"])).is_err());
    }

    #[test]
    fn rejects_padded_coordinates() {
        let err = Route::try_from(location(&[" 22.33 ", "114.14"], &["22.32", "114.14"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
