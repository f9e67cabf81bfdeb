//! Timing, simulation, and endpoint configuration.
//!
//! The stride/interval pair defines the simulated ground speed; change them
//! together or the reported speed no longer matches the cursor advance.

use std::time::Duration;

/// Interval between simulation steps.
pub const SIM_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Route points consumed per simulation step.
pub const SIM_STRIDE: usize = 5;

/// Speed published while the simulation is driving the position.
pub const SIM_SPEED_KMH: f64 = 45.0;

/// Battery percentage drained per simulation step.
pub const BATTERY_DECAY_PCT: f64 = 0.1;

/// Interval between media progress polls.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between location pushes to the backend sink.
pub const LOCATION_SINK_INTERVAL: Duration = Duration::from_secs(5);

/// Half-width in degrees of the geocode bias box around the live position.
pub const GEOCODE_BIAS_DEG: f64 = 1.0;

/// Initial map center, shown before the first GPS fix.
pub const MAP_INIT_LAT: f64 = 28.5432;
/// Initial map center longitude.
pub const MAP_INIT_LNG: f64 = 77.3327;

/// Fixed coordinates the weather widget reports for.
pub const WEATHER_LAT: f64 = 28.4595;
/// Weather widget longitude.
pub const WEATHER_LNG: f64 = 77.0266;

/// Playlist loaded by the media controller at startup.
pub const DEFAULT_PLAYLIST_URL: &str =
    "https://music.youtube.com/playlist?list=RDCLAK5uy_kpxnNxJpPZjLKbL9WgvrPuErWkUxMP6x4";

/// Nominatim geocoding endpoint.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// OSRM routing endpoint.
pub const OSRM_URL: &str = "http://router.project-osrm.org";

/// Open-Meteo forecast endpoint.
pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";

/// Backend location sink endpoint.
pub const LOCATION_SINK_URL: &str = "http://127.0.0.1:8000/api/location/update";

/// Media index service endpoint (playlist and stream resolution).
pub const MEDIA_INDEX_URL: &str = "http://127.0.0.1:8000/api/media";

/// Per-request timeout for all provider HTTP calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with provider requests.
pub const HTTP_USER_AGENT: &str = "Cabin/0.1";
