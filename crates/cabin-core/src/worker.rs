//! Background worker tasks for blocking provider I/O.
//!
//! One worker task per task family; requests within a family run strictly
//! sequentially, families run concurrently. Every submission is stamped with
//! a monotonically increasing sequence number and a correlation tag, and
//! produces exactly one [`TaskOutcome`] on the interactive context's outcome
//! channel, in submission order within its family.
//!
//! There is no cancellation: a caller that loses interest keeps its latest
//! sequence number and drops older outcomes on arrival.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::providers::{
    GeocodeQuery, Geocoder, MediaIndex, Place, PlaylistEntry, ProviderError, Router, StreamInfo,
    WeatherProvider, WeatherReport,
};
use crate::state::{LatLng, RouteGeometry};

/// Which endpoint a geocode request resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// Custom start location.
    Start,
    /// Destination.
    Dest,
}

/// Correlation tag echoed back with the outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTag {
    /// Geocode search for one endpoint.
    Search(SearchKind),
    /// Route computation.
    Route,
    /// Playlist fetch.
    Playlist,
    /// Stream resolution.
    Stream,
    /// Weather fetch.
    Weather,
}

/// Successful payload of a completed task.
#[derive(Debug)]
pub enum TaskOutput {
    /// Geocode result.
    Geocode(Place),
    /// Computed route.
    Route(RouteGeometry),
    /// Playlist entries.
    Playlist(Vec<PlaylistEntry>),
    /// Resolved stream.
    Stream(StreamInfo),
    /// Weather report.
    Weather(WeatherReport),
}

/// Completion message posted back to the interactive context.
#[derive(Debug)]
pub struct TaskOutcome {
    /// Sequence number assigned at submission, for staleness checks.
    pub seq: u64,
    /// Correlation tag from the submission.
    pub tag: TaskTag,
    /// Task result.
    pub result: Result<TaskOutput, ProviderError>,
}

/// Providers the worker pool dispatches to.
pub struct TaskProviders {
    /// Geocoding collaborator.
    pub geocoder: Arc<dyn Geocoder>,
    /// Routing collaborator.
    pub router: Arc<dyn Router>,
    /// Playlist/stream collaborator.
    pub media: Arc<dyn MediaIndex>,
    /// Weather collaborator.
    pub weather: Arc<dyn WeatherProvider>,
}

struct GeocodeJob {
    seq: u64,
    kind: SearchKind,
    query: GeocodeQuery,
}

struct RouteJob {
    seq: u64,
    start: LatLng,
    end: LatLng,
}

struct PlaylistJob {
    seq: u64,
    source_url: String,
}

struct StreamJob {
    seq: u64,
    entry_url: String,
}

struct WeatherJob {
    seq: u64,
}

/// Handle for submitting work to the per-family worker tasks.
pub struct WorkerPool {
    geocode_tx: mpsc::UnboundedSender<GeocodeJob>,
    route_tx: mpsc::UnboundedSender<RouteJob>,
    playlist_tx: mpsc::UnboundedSender<PlaylistJob>,
    stream_tx: mpsc::UnboundedSender<StreamJob>,
    weather_tx: mpsc::UnboundedSender<WeatherJob>,
    next_seq: u64,
}

impl WorkerPool {
    /// Spawn one worker task per family. Completed outcomes are posted to
    /// `outcomes`; the workers exit when the pool and the receiver are gone.
    pub fn spawn(providers: TaskProviders, outcomes: mpsc::UnboundedSender<TaskOutcome>) -> Self {
        let (geocode_tx, geocode_rx) = mpsc::unbounded_channel();
        let (route_tx, route_rx) = mpsc::unbounded_channel();
        let (playlist_tx, playlist_rx) = mpsc::unbounded_channel();
        let (stream_tx, stream_rx) = mpsc::unbounded_channel();
        let (weather_tx, weather_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_geocode_worker(
            geocode_rx,
            providers.geocoder,
            outcomes.clone(),
        ));
        tokio::spawn(run_route_worker(route_rx, providers.router, outcomes.clone()));
        tokio::spawn(run_playlist_worker(
            playlist_rx,
            Arc::clone(&providers.media),
            outcomes.clone(),
        ));
        tokio::spawn(run_stream_worker(stream_rx, providers.media, outcomes.clone()));
        tokio::spawn(run_weather_worker(weather_rx, providers.weather, outcomes));

        Self {
            geocode_tx,
            route_tx,
            playlist_tx,
            stream_tx,
            weather_tx,
            next_seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Queue a geocode search tagged with the endpoint it resolves.
    pub fn submit_geocode(&mut self, kind: SearchKind, query: GeocodeQuery) -> u64 {
        let seq = self.next_seq();
        let _ = self.geocode_tx.send(GeocodeJob { seq, kind, query });
        seq
    }

    /// Queue a route computation.
    pub fn submit_route(&mut self, start: LatLng, end: LatLng) -> u64 {
        let seq = self.next_seq();
        let _ = self.route_tx.send(RouteJob { seq, start, end });
        seq
    }

    /// Queue a playlist fetch.
    pub fn submit_fetch_playlist(&mut self, source_url: impl Into<String>) -> u64 {
        let seq = self.next_seq();
        let _ = self.playlist_tx.send(PlaylistJob {
            seq,
            source_url: source_url.into(),
        });
        seq
    }

    /// Queue a stream resolution.
    pub fn submit_resolve_stream(&mut self, entry_url: impl Into<String>) -> u64 {
        let seq = self.next_seq();
        let _ = self.stream_tx.send(StreamJob {
            seq,
            entry_url: entry_url.into(),
        });
        seq
    }

    /// Queue a weather fetch.
    pub fn submit_fetch_weather(&mut self) -> u64 {
        let seq = self.next_seq();
        let _ = self.weather_tx.send(WeatherJob { seq });
        seq
    }
}

async fn run_geocode_worker(
    mut rx: mpsc::UnboundedReceiver<GeocodeJob>,
    geocoder: Arc<dyn Geocoder>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    while let Some(job) = rx.recv().await {
        let result = geocoder.search(&job.query).await.map(TaskOutput::Geocode);
        let outcome = TaskOutcome {
            seq: job.seq,
            tag: TaskTag::Search(job.kind),
            result,
        };
        if out.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!("geocode worker stopped");
}

async fn run_route_worker(
    mut rx: mpsc::UnboundedReceiver<RouteJob>,
    router: Arc<dyn Router>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    while let Some(job) = rx.recv().await {
        let result = router.route(job.start, job.end).await.map(TaskOutput::Route);
        let outcome = TaskOutcome {
            seq: job.seq,
            tag: TaskTag::Route,
            result,
        };
        if out.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!("route worker stopped");
}

async fn run_playlist_worker(
    mut rx: mpsc::UnboundedReceiver<PlaylistJob>,
    media: Arc<dyn MediaIndex>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    while let Some(job) = rx.recv().await {
        let result = media
            .fetch_playlist(&job.source_url)
            .await
            .map(TaskOutput::Playlist);
        let outcome = TaskOutcome {
            seq: job.seq,
            tag: TaskTag::Playlist,
            result,
        };
        if out.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!("playlist worker stopped");
}

async fn run_stream_worker(
    mut rx: mpsc::UnboundedReceiver<StreamJob>,
    media: Arc<dyn MediaIndex>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    while let Some(job) = rx.recv().await {
        let result = media
            .resolve_stream(&job.entry_url)
            .await
            .map(TaskOutput::Stream);
        let outcome = TaskOutcome {
            seq: job.seq,
            tag: TaskTag::Stream,
            result,
        };
        if out.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!("stream worker stopped");
}

async fn run_weather_worker(
    mut rx: mpsc::UnboundedReceiver<WeatherJob>,
    weather: Arc<dyn WeatherProvider>,
    out: mpsc::UnboundedSender<TaskOutcome>,
) {
    while let Some(job) = rx.recv().await {
        let result = weather.current().await.map(TaskOutput::Weather);
        let outcome = TaskOutcome {
            seq: job.seq,
            tag: TaskTag::Weather,
            result,
        };
        if out.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!("weather worker stopped");
}
