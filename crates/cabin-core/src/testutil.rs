//! In-process provider fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::providers::{
    ChargingRedirect, GeocodeQuery, Geocoder, LocationSink, LocationUpdate, MediaIndex, Place,
    PlaylistEntry, ProviderError, Router, StreamInfo, WeatherProvider, WeatherReport,
};
use crate::state::{LatLng, RouteGeometry};

/// Install a subscriber so `RUST_LOG=debug cargo test` shows traces.
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

enum CannedGeocode {
    Place(Place),
    NotFound,
    Fail,
}

/// Geocoder with per-query canned answers. Unknown queries resolve to a
/// synthetic place so tests that only care about the flow need no setup.
#[derive(Default)]
pub struct MockGeocoder {
    canned: Mutex<HashMap<String, CannedGeocode>>,
    /// Queries received, in order.
    pub queries: Mutex<Vec<GeocodeQuery>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(self, query: &str, lat: f64, lng: f64, name: &str) -> Self {
        self.canned.lock().unwrap().insert(
            query.to_string(),
            CannedGeocode::Place(Place {
                position: LatLng::new(lat, lng),
                display_name: name.to_string(),
            }),
        );
        self
    }

    pub fn not_found(self, query: &str) -> Self {
        self.canned
            .lock()
            .unwrap()
            .insert(query.to_string(), CannedGeocode::NotFound);
        self
    }

    pub fn failing(self, query: &str) -> Self {
        self.canned
            .lock()
            .unwrap()
            .insert(query.to_string(), CannedGeocode::Fail);
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(&self, query: &GeocodeQuery) -> Result<Place, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());
        match self.canned.lock().unwrap().get(&query.query) {
            Some(CannedGeocode::Place(place)) => Ok(place.clone()),
            Some(CannedGeocode::NotFound) => Err(ProviderError::NotFound),
            Some(CannedGeocode::Fail) => Err(ProviderError::Status(500)),
            None => Ok(Place {
                position: LatLng::new(1.0, 2.0),
                display_name: format!("{} result", query.query),
            }),
        }
    }
}

/// Router returning a fixed straight-line geometry, or failing.
pub struct MockRouter {
    points: usize,
    fail: bool,
    /// Endpoint pairs received, in order.
    pub calls: Mutex<Vec<(LatLng, LatLng)>>,
}

impl MockRouter {
    /// Route of `points` coordinates along the (0, n) line.
    pub fn with_points(points: usize) -> Self {
        Self {
            points,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            points: 0,
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Router for MockRouter {
    async fn route(&self, start: LatLng, end: LatLng) -> Result<RouteGeometry, ProviderError> {
        self.calls.lock().unwrap().push((start, end));
        if self.fail {
            return Err(ProviderError::NoRoute("NoRoute".into()));
        }
        Ok(RouteGeometry::new(
            (0..self.points).map(|i| LatLng::new(0.0, i as f64)).collect(),
        ))
    }
}

enum CannedStream {
    Info(StreamInfo),
    Fail,
}

/// Media index with a canned playlist and per-URL stream answers. Unknown
/// entries resolve to a playable synthetic stream.
pub struct MockMedia {
    playlist: Mutex<Vec<PlaylistEntry>>,
    streams: Mutex<HashMap<String, CannedStream>>,
    delay: Option<Duration>,
}

fn entry(title: &str, artist: &str, url: Option<&str>) -> PlaylistEntry {
    PlaylistEntry {
        title: Some(title.to_string()),
        uploader: Some(artist.to_string()),
        url: url.map(str::to_string),
    }
}

impl Default for MockMedia {
    fn default() -> Self {
        Self {
            playlist: Mutex::new(vec![
                entry("Track A", "Artist A", Some("ref-a")),
                entry("Track B", "Artist B", Some("ref-b")),
                entry("Track C", "Artist C", Some("ref-c")),
            ]),
            streams: Mutex::new(HashMap::new()),
            delay: None,
        }
    }
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(entries: Vec<PlaylistEntry>) -> Self {
        Self {
            playlist: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Delay every request, for cross-family concurrency tests.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn stream_without_url(self, entry_url: &str) -> Self {
        self.streams.lock().unwrap().insert(
            entry_url.to_string(),
            CannedStream::Info(StreamInfo::default()),
        );
        self
    }

    pub fn stream_failing(self, entry_url: &str) -> Self {
        self.streams
            .lock()
            .unwrap()
            .insert(entry_url.to_string(), CannedStream::Fail);
        self
    }
}

#[async_trait]
impl MediaIndex for MockMedia {
    async fn fetch_playlist(&self, _source_url: &str) -> Result<Vec<PlaylistEntry>, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.playlist.lock().unwrap().clone())
    }

    async fn resolve_stream(&self, entry_url: &str) -> Result<StreamInfo, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.streams.lock().unwrap().get(entry_url) {
            Some(CannedStream::Info(info)) => Ok(info.clone()),
            Some(CannedStream::Fail) => Err(ProviderError::Status(500)),
            None => Ok(StreamInfo {
                url: Some(format!("http://streams.test/{entry_url}")),
                title: Some(format!("{entry_url} title")),
                uploader: Some(format!("{entry_url} artist")),
            }),
        }
    }
}

/// Weather provider with a fixed report, or failing.
pub struct MockWeather {
    fail: bool,
}

impl MockWeather {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current(&self) -> Result<WeatherReport, ProviderError> {
        if self.fail {
            return Err(ProviderError::Status(503));
        }
        Ok(WeatherReport {
            temperature_c: 31.0,
            code: 0,
        })
    }
}

/// Location sink recording every update; answers with a redirect when armed.
#[derive(Default)]
pub struct MockLocationSink {
    /// Updates received, in order.
    pub updates: Mutex<Vec<LocationUpdate>>,
    redirect: Mutex<Option<ChargingRedirect>>,
}

impl MockLocationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redirect(redirect: ChargingRedirect) -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            redirect: Mutex::new(Some(redirect)),
        }
    }
}

#[async_trait]
impl LocationSink for MockLocationSink {
    async fn push(
        &self,
        update: &LocationUpdate,
    ) -> Result<Option<ChargingRedirect>, ProviderError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(self.redirect.lock().unwrap().clone())
    }
}

/// Default provider set: everything succeeds.
pub fn test_providers() -> crate::worker::TaskProviders {
    crate::worker::TaskProviders {
        geocoder: Arc::new(MockGeocoder::new()),
        router: Arc::new(MockRouter::with_points(7)),
        media: Arc::new(MockMedia::new()),
        weather: Arc::new(MockWeather::new()),
    }
}
