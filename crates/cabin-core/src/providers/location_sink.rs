//! Backend location sink: periodic position/battery reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LocationSink, ProviderError};
use crate::config;

/// One location report pushed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationUpdate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Battery charge, 0-100 percent.
    #[serde(rename = "batteryLevel")]
    pub battery_level: f64,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

/// Charging station suggested by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargingStation {
    /// Station latitude.
    pub lat: f64,
    /// Station longitude.
    pub lon: f64,
    /// Display name.
    pub name: String,
}

/// Backend advice to reroute to a charging station.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingRedirect {
    /// Suggested station.
    pub station: ChargingStation,
}

#[derive(Debug, Deserialize)]
struct SinkReply {
    #[serde(rename = "redirectToChargingStation", default)]
    redirect_to_charging_station: bool,
    #[serde(default)]
    station: Option<ChargingStation>,
}

/// Location sink backed by the dashboard backend's REST endpoint.
pub struct HttpLocationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLocationSink {
    /// Create a sink against the default backend endpoint.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, config::LOCATION_SINK_URL)
    }

    /// Create a sink against a specific endpoint.
    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl LocationSink for HttpLocationSink {
    async fn push(
        &self,
        update: &LocationUpdate,
    ) -> Result<Option<ChargingRedirect>, ProviderError> {
        let response = self.client.post(&self.endpoint).json(update).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        // The backend answers with a body only when it has advice to give.
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        let reply: SinkReply = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        match (reply.redirect_to_charging_station, reply.station) {
            (true, Some(station)) => Ok(Some(ChargingRedirect { station })),
            _ => Ok(None),
        }
    }
}
