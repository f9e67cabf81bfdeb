//! Value types held by the state store.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Create a coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Metadata for the currently displayed media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Track title.
    pub title: String,
    /// Track artist or uploader.
    pub artist: String,
}

impl MediaInfo {
    /// Create media metadata.
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// Playback progress of the active stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaProgress {
    /// Position within the track, milliseconds.
    pub position_ms: u64,
    /// Total track length, milliseconds.
    pub duration_ms: u64,
}

/// Ordered path from a routing provider.
///
/// Immutable once built; a new route result replaces the whole geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    points: Vec<LatLng>,
}

impl RouteGeometry {
    /// Build a geometry from an ordered point sequence.
    pub fn new(points: Vec<LatLng>) -> Self {
        Self { points }
    }

    /// Number of points in the route.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the route has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, if within the route.
    pub fn point(&self, index: usize) -> Option<LatLng> {
        self.points.get(index).copied()
    }

    /// All points in order.
    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    /// Serialize as a GeoJSON LineString (`[lng, lat]` coordinate order).
    pub fn to_geojson(&self) -> String {
        let coordinates: Vec<[f64; 2]> = self.points.iter().map(|p| [p.lng, p.lat]).collect();
        serde_json::json!({
            "type": "LineString",
            "coordinates": coordinates,
        })
        .to_string()
    }
}

/// Snapshot of every shared vehicle/session attribute.
///
/// Created once at startup and mutated through [`super::StateStore`] for the
/// process lifetime. Each field has exactly one writer role even though many
/// components read it.
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// Air conditioning on/off.
    pub ac_on: bool,
    /// Air conditioning auto mode.
    pub ac_auto: bool,
    /// Fan speed, 0-100.
    pub fan_speed: u8,
    /// Cabin temperature setpoint, 16-32 degrees C.
    pub cabin_temp: i32,
    /// Battery charge, 0-100 percent.
    pub battery_pct: f64,
    /// Current speed, km/h.
    pub speed_kmh: f64,
    /// Last known position. `(0, 0)` means no fix yet.
    pub location: LatLng,
    /// Currently displayed media metadata.
    pub current_media: MediaInfo,
    /// Playback progress of the active stream.
    pub media_progress: MediaProgress,
    /// Custom start marker, if one has been searched.
    pub start_marker: Option<LatLng>,
    /// Destination marker, if one has been searched.
    pub dest_marker: Option<LatLng>,
    /// Active route geometry, replaced wholesale on each route result.
    pub route: Option<Arc<RouteGeometry>>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            ac_on: false,
            ac_auto: true,
            fan_speed: 50,
            cabin_temp: 27,
            battery_pct: 27.0,
            speed_kmh: 0.0,
            location: LatLng::new(0.0, 0.0),
            current_media: MediaInfo::new("Not Playing", "No Artist"),
            media_progress: MediaProgress::default(),
            start_marker: None,
            dest_marker: None,
            route: None,
        }
    }
}

impl VehicleState {
    /// Whether a GPS fix has been received yet.
    pub fn has_fix(&self) -> bool {
        self.location.lat != 0.0 || self.location.lng != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_startup_state() {
        let state = VehicleState::default();
        assert!(!state.ac_on);
        assert!(state.ac_auto);
        assert_eq!(state.fan_speed, 50);
        assert_eq!(state.cabin_temp, 27);
        assert_eq!(state.battery_pct, 27.0);
        assert_eq!(state.current_media, MediaInfo::new("Not Playing", "No Artist"));
        assert!(!state.has_fix());
    }

    #[test]
    fn test_route_geojson_swaps_coordinate_order() {
        let route = RouteGeometry::new(vec![LatLng::new(28.5, 77.3), LatLng::new(28.6, 77.4)]);
        let geojson = route.to_geojson();
        let parsed: serde_json::Value = serde_json::from_str(&geojson).unwrap();
        assert_eq!(parsed["type"], "LineString");
        assert_eq!(parsed["coordinates"][0][0], 77.3);
        assert_eq!(parsed["coordinates"][0][1], 28.5);
    }

    #[test]
    fn test_route_point_lookup() {
        let route = RouteGeometry::new(vec![LatLng::new(1.0, 2.0)]);
        assert_eq!(route.len(), 1);
        assert_eq!(route.point(0), Some(LatLng::new(1.0, 2.0)));
        assert_eq!(route.point(1), None);
    }
}
