use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{DistanceResolver, ResolveError};
use crate::models::location::GeoPoint;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Client for a Google Distance Matrix compatible endpoint.
#[derive(Clone)]
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DistanceMatrixClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ResolveError::Upstream(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl DistanceResolver for DistanceMatrixClient {
    async fn distance_meters(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<f64, ResolveError> {
        let origins = origin.to_query_value();
        let destinations = destination.to_query_value();

        // Errors are stripped of their URL so the api key never reaches logs.
        let response: DistanceMatrixResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("departure_time", "now"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| ResolveError::Upstream(err.without_url().to_string()))?
            .error_for_status()
            .map_err(|err| ResolveError::Upstream(err.without_url().to_string()))?
            .json()
            .await
            .map_err(|err| ResolveError::Upstream(err.without_url().to_string()))?;

        let meters = response.first_distance()?;
        debug!(%origins, %destinations, meters, "distance resolved");
        Ok(meters)
    }
}

#[derive(Debug, Deserialize)]
pub struct DistanceMatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default)]
    pub distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: f64,
}

impl DistanceMatrixResponse {
    /// Distance of the first element of the first row. A zero or missing
    /// distance counts as no route.
    pub fn first_distance(&self) -> Result<f64, ResolveError> {
        if self.status != "OK" {
            return Err(ResolveError::Upstream(format!(
                "status {}: {}",
                self.status,
                self.error_message.as_deref().unwrap_or("no message")
            )));
        }

        let element = self
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| ResolveError::Unavailable("empty distance matrix".to_string()))?;

        if element.status != "OK" {
            return Err(ResolveError::Unavailable(format!(
                "element status {}",
                element.status
            )));
        }

        match element.distance.as_ref().map(|d| d.value) {
            Some(meters) if meters.is_finite() && meters > 0.0 => Ok(meters),
            Some(meters) => Err(ResolveError::Unavailable(format!("distance {meters}m"))),
            None => Err(ResolveError::Unavailable("element has no distance".to_string())),
        }
    }
}
