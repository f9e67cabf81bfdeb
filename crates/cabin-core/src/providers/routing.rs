//! OSRM driving-route lookup.

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, Router};
use crate::config;
use crate::state::{LatLng, RouteGeometry};

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

/// GeoJSON geometry with `[lng, lat]` coordinate pairs.
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Router backed by an OSRM instance.
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    /// Create a router against the default public instance.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, config::OSRM_URL)
    }

    /// Create a router against a specific instance.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn geometry_to_route(geometry: OsrmGeometry) -> RouteGeometry {
    // OSRM emits [lng, lat]; RouteGeometry stores lat/lng.
    RouteGeometry::new(
        geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| LatLng::new(lat, lng))
            .collect(),
    )
}

#[async_trait]
impl Router for OsrmRouter {
    async fn route(&self, start: LatLng, end: LatLng) -> Result<RouteGeometry, ProviderError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, start.lng, start.lat, end.lng, end.lat
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: OsrmResponse = response.json().await?;
        if body.code != "Ok" {
            return Err(ProviderError::NoRoute(body.code));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("code Ok but no routes".into()))?;

        Ok(geometry_to_route(route.geometry))
    }
}
