//! Network collaborators: geocoding, routing, media index, weather, and the
//! backend location sink.
//!
//! Each collaborator sits behind a dyn-safe async trait so controllers can be
//! tested without the network. The shipped implementations talk HTTP with a
//! shared [`reqwest::Client`] and a bounded per-request timeout; a stuck call
//! fails instead of starving its worker family forever.

mod geocode;
mod location_sink;
mod media_index;
mod routing;
mod weather;

pub use geocode::{GeocodeQuery, NominatimGeocoder, Place};
pub use location_sink::{ChargingRedirect, ChargingStation, HttpLocationSink, LocationUpdate};
pub use media_index::{HttpMediaIndex, PlaylistEntry, StreamInfo};
pub use routing::OsrmRouter;
pub use weather::{weather_code_to_info, OpenMeteoWeather, WeatherReport};

use async_trait::async_trait;
use thiserror::Error;

use crate::config;
use crate::state::{LatLng, RouteGeometry};

/// Errors from any network collaborator.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Geocoding returned no results.
    #[error("location not found")]
    NotFound,

    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status code.
    #[error("provider returned status {0}")]
    Status(u16),

    /// Response body did not match the expected shape.
    #[error("malformed provider response: {0}")]
    Decode(String),

    /// Routing provider reported it could not produce a route.
    #[error("no route: {0}")]
    NoRoute(String),
}

/// Forward geocoding: free-text query to a coordinate.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a query to the best matching place.
    ///
    /// Returns [`ProviderError::NotFound`] when the provider has no match.
    async fn search(&self, query: &GeocodeQuery) -> Result<Place, ProviderError>;
}

/// Driving-route computation between two coordinates.
#[async_trait]
pub trait Router: Send + Sync {
    /// Compute a route from `start` to `end`.
    async fn route(&self, start: LatLng, end: LatLng) -> Result<RouteGeometry, ProviderError>;
}

/// Playlist listing and stream resolution.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// List the entries of a playlist source.
    async fn fetch_playlist(&self, source_url: &str) -> Result<Vec<PlaylistEntry>, ProviderError>;

    /// Resolve a playlist entry to a playable stream.
    async fn resolve_stream(&self, entry_url: &str) -> Result<StreamInfo, ProviderError>;
}

/// Current-conditions weather lookup for the fixed dashboard coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the current weather report.
    async fn current(&self) -> Result<WeatherReport, ProviderError>;
}

/// Backend persistence sink for periodic location/battery reports.
#[async_trait]
pub trait LocationSink: Send + Sync {
    /// Push one location report. The backend may answer with a charging
    /// redirect when the battery is low; that policy lives server-side.
    async fn push(&self, update: &LocationUpdate)
        -> Result<Option<ChargingRedirect>, ProviderError>;
}

/// Build the HTTP client shared by all provider implementations.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config::HTTP_USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
