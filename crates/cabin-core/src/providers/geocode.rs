//! Nominatim forward geocoding.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Geocoder, ProviderError};
use crate::config;
use crate::state::LatLng;

/// A geocoding request.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    /// Free-text search query.
    pub query: String,
    /// Last known live position. When present the search is bounded to a
    /// box around it so nearby results win.
    pub bias: Option<LatLng>,
}

/// Best match returned by the geocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Resolved coordinate.
    pub position: LatLng,
    /// Human-readable place name.
    pub display_name: String,
}

/// Nominatim search response entry. `lat`/`lon` arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Geocoder backed by a Nominatim instance.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a geocoder against the default public instance.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, config::NOMINATIM_URL)
    }

    /// Create a geocoder against a specific instance.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Format the `viewbox` parameter for a bias box around `center`:
/// `left,top,right,bottom` at [`config::GEOCODE_BIAS_DEG`] degrees half-width.
fn viewbox_around(center: LatLng) -> String {
    let d = config::GEOCODE_BIAS_DEG;
    format!(
        "{},{},{},{}",
        center.lng - d,
        center.lat + d,
        center.lng + d,
        center.lat - d
    )
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &GeocodeQuery) -> Result<Place, ProviderError> {
        let url = format!("{}/search", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("q", query.query.as_str()),
            ("format", "json"),
            ("limit", "1"),
        ]);
        if let Some(bias) = query.bias {
            request = request.query(&[("viewbox", viewbox_around(bias).as_str()), ("bounded", "1")]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let first = places.into_iter().next().ok_or(ProviderError::NotFound)?;

        let lat = first
            .lat
            .parse::<f64>()
            .map_err(|e| ProviderError::Decode(format!("bad latitude '{}': {e}", first.lat)))?;
        let lng = first
            .lon
            .parse::<f64>()
            .map_err(|e| ProviderError::Decode(format!("bad longitude '{}': {e}", first.lon)))?;

        Ok(Place {
            position: LatLng::new(lat, lng),
            display_name: first.display_name,
        })
    }
}
