//! Outbound map rendering surface and view status messages.
//!
//! The renderer is external; the core reaches it through the fixed
//! [`MapSurface`] function set. Calls are one-way and fire-and-forget.

use tokio::sync::mpsc;

/// Fixed command surface of the external map renderer.
pub trait MapSurface {
    /// Center the map on its initial position.
    fn initialize_map(&self, lat: f64, lng: f64);
    /// Place the start marker.
    fn set_start_marker(&self, lat: f64, lng: f64);
    /// Place the destination marker.
    fn set_destination_marker(&self, lat: f64, lng: f64);
    /// Draw a route from a GeoJSON LineString.
    fn draw_route(&self, geojson: &str);
    /// Move the vehicle position marker.
    fn update_user_position(&self, lat: f64, lng: f64);
    /// Remove markers, route, and position.
    fn clear_map(&self);
    /// Switch between light and dark tiles.
    fn toggle_theme(&self);
    /// Switch between 2D and tilted view.
    fn toggle_view(&self);
    /// Enter turn-by-turn presentation.
    fn start_navigation(&self);
}

/// Map surface that formats each call as a `mapApi.*` JavaScript statement
/// and hands it to a channel, for a webview host to evaluate.
#[derive(Clone)]
pub struct JsMapChannel {
    tx: mpsc::UnboundedSender<String>,
}

impl JsMapChannel {
    /// Create a channel-backed surface and the receiver draining its calls.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn run_js(&self, script: String) {
        // Fire-and-forget; a torn-down host just drops the call.
        let _ = self.tx.send(script);
    }
}

impl MapSurface for JsMapChannel {
    fn initialize_map(&self, lat: f64, lng: f64) {
        self.run_js(format!("mapApi.initializeMap({lat}, {lng});"));
    }

    fn set_start_marker(&self, lat: f64, lng: f64) {
        self.run_js(format!("mapApi.setStartMarker({lat}, {lng});"));
    }

    fn set_destination_marker(&self, lat: f64, lng: f64) {
        self.run_js(format!("mapApi.setDestinationMarker({lat}, {lng});"));
    }

    fn draw_route(&self, geojson: &str) {
        self.run_js(format!("mapApi.drawRoute({geojson});"));
    }

    fn update_user_position(&self, lat: f64, lng: f64) {
        self.run_js(format!("mapApi.updateUserPosition({lat}, {lng});"));
    }

    fn clear_map(&self) {
        self.run_js("mapApi.clearMap();".to_string());
    }

    fn toggle_theme(&self) {
        self.run_js("mapApi.toggleTheme();".to_string());
    }

    fn toggle_view(&self) {
        self.run_js("mapApi.toggleView();".to_string());
    }

    fn start_navigation(&self) {
        self.run_js("mapApi.startNavigation();".to_string());
    }
}

/// Severity of a transient view status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Neutral progress information.
    Info,
    /// Operation completed.
    Success,
    /// Operation failed; nothing was changed.
    Error,
}

/// Transient message surfaced to the requesting view only.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Message severity.
    pub level: StatusLevel,
    /// Display text.
    pub message: String,
}

impl Status {
    /// Neutral progress message.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    /// Completion message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
        }
    }

    /// Failure message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_js_channel_formats_map_api_calls() {
        let (surface, mut rx) = JsMapChannel::new();
        surface.initialize_map(28.5432, 77.3327);
        surface.set_start_marker(28.5, 77.3);
        surface.clear_map();

        assert_eq!(rx.try_recv().unwrap(), "mapApi.initializeMap(28.5432, 77.3327);");
        assert_eq!(rx.try_recv().unwrap(), "mapApi.setStartMarker(28.5, 77.3);");
        assert_eq!(rx.try_recv().unwrap(), "mapApi.clearMap();");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (surface, rx) = JsMapChannel::new();
        drop(rx);
        surface.toggle_theme();
    }
}
