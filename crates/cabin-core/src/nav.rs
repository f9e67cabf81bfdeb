//! Navigation: search, routing, and simulated route playback.
//!
//! The controller consumes geocode/route outcomes from the worker pool,
//! keeps the route geometry and simulation cursor, and walks the route at a
//! fixed stride while simulating speed and battery drain.

use std::sync::Arc;

use crate::config;
use crate::providers::{GeocodeQuery, ProviderError};
use crate::state::{LatLng, RouteGeometry, StateError, StateStore};
use crate::surface::{MapSurface, Status};
use crate::worker::{SearchKind, TaskOutcome, TaskOutput, TaskTag, WorkerPool};

/// Navigation controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// No endpoints, no route.
    Idle,
    /// At least one geocode request in flight.
    Searching,
    /// Route geometry available.
    RouteReady,
    /// Route playback running.
    Simulating,
}

/// Callback receiving transient status messages for the requesting view.
pub type StatusSink = Box<dyn FnMut(Status)>;

/// Consumes search/route requests, owns the route geometry and the
/// simulation cursor. Lives on the interactive context.
pub struct NavigationController {
    state: NavState,
    surface: Box<dyn MapSurface>,
    on_status: StatusSink,
    use_custom_start: bool,
    live_location: Option<LatLng>,
    pending_start: Option<u64>,
    pending_dest: Option<u64>,
    pending_route: Option<u64>,
    route: Option<Arc<RouteGeometry>>,
    cursor: usize,
}

impl NavigationController {
    /// Create a controller driving `surface`, reporting through `on_status`.
    pub fn new(surface: Box<dyn MapSurface>, on_status: StatusSink) -> Self {
        Self {
            state: NavState::Idle,
            surface,
            on_status,
            use_custom_start: false,
            live_location: None,
            pending_start: None,
            pending_dest: None,
            pending_route: None,
            route: None,
            cursor: 0,
        }
    }

    /// Current controller state.
    pub fn state(&self) -> NavState {
        self.state
    }

    /// Whether the simulation stepper is running.
    pub fn is_simulating(&self) -> bool {
        self.state == NavState::Simulating
    }

    /// Current simulation cursor, for diagnostics.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The map surface this controller drives.
    pub fn surface(&self) -> &dyn MapSurface {
        self.surface.as_ref()
    }

    /// Enable or disable routing from the custom start marker instead of the
    /// live position.
    pub fn set_use_custom_start(&mut self, enabled: bool) {
        self.use_custom_start = enabled;
    }

    fn status(&mut self, status: Status) {
        (self.on_status)(status);
    }

    /// Live GPS feed from the renderer bridge. Updates the store's location
    /// and speed fields directly.
    pub fn on_location_fix(
        &mut self,
        store: &mut StateStore,
        lat: f64,
        lng: f64,
        speed_kmh: f64,
    ) -> Result<(), StateError> {
        let pos = LatLng::new(lat, lng);
        store.set_location(pos)?;
        store.set_speed_kmh(speed_kmh)?;
        self.live_location = Some(pos);
        Ok(())
    }

    /// Dispatch a geocode search for one endpoint. The request is bounded to
    /// a box around the live position when a fix exists.
    pub fn search(&mut self, workers: &mut WorkerPool, kind: SearchKind, query: &str) {
        if self.state == NavState::Simulating {
            self.status(Status::error("Stop the simulation before searching."));
            return;
        }
        let query = query.trim();
        if query.is_empty() {
            self.status(Status::error("Enter a location to search."));
            return;
        }

        let seq = workers.submit_geocode(
            kind,
            GeocodeQuery {
                query: query.to_string(),
                bias: self.live_location,
            },
        );
        match kind {
            SearchKind::Start => self.pending_start = Some(seq),
            SearchKind::Dest => self.pending_dest = Some(seq),
        }
        self.state = NavState::Searching;
        self.status(Status::info("Searching..."));
    }

    fn pending_for(&mut self, kind: SearchKind) -> &mut Option<u64> {
        match kind {
            SearchKind::Start => &mut self.pending_start,
            SearchKind::Dest => &mut self.pending_dest,
        }
    }

    /// Fall back to the state implied by what we still hold.
    fn settle_state(&mut self) {
        if self.state == NavState::Simulating {
            return;
        }
        let searching = self.pending_start.is_some() || self.pending_dest.is_some();
        self.state = if searching {
            NavState::Searching
        } else if self.route.is_some() {
            NavState::RouteReady
        } else {
            NavState::Idle
        };
    }

    /// Apply a geocode or route outcome. Outcomes older than the latest
    /// request of the same tag are dropped without effect.
    pub fn on_task(
        &mut self,
        store: &mut StateStore,
        workers: &mut WorkerPool,
        outcome: TaskOutcome,
    ) -> Result<(), StateError> {
        match outcome.tag {
            TaskTag::Search(kind) => {
                if *self.pending_for(kind) != Some(outcome.seq) {
                    tracing::debug!(seq = outcome.seq, ?kind, "dropping stale geocode result");
                    return Ok(());
                }
                *self.pending_for(kind) = None;
                match outcome.result {
                    Ok(TaskOutput::Geocode(place)) => {
                        self.apply_place(store, workers, kind, place)?
                    }
                    Ok(_) => tracing::warn!("geocode outcome carried wrong payload"),
                    Err(ProviderError::NotFound) => {
                        self.status(Status::error("Location not found."));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "geocode failed");
                        self.status(Status::error(format!("Search Error: {e}")));
                    }
                }
                self.settle_state();
            }
            TaskTag::Route => {
                if self.pending_route != Some(outcome.seq) {
                    tracing::debug!(seq = outcome.seq, "dropping stale route result");
                    return Ok(());
                }
                self.pending_route = None;
                match outcome.result {
                    Ok(TaskOutput::Route(geometry)) if !geometry.is_empty() => {
                        let geometry = Arc::new(geometry);
                        self.route = Some(Arc::clone(&geometry));
                        self.cursor = 0;
                        store.set_route(Some(Arc::clone(&geometry)));
                        self.surface.draw_route(&geometry.to_geojson());
                        self.state = NavState::RouteReady;
                        self.status(Status::success("Route drawn on map."));
                    }
                    Ok(TaskOutput::Route(_)) => {
                        self.status(Status::error("Could not find a route."));
                        self.settle_state();
                    }
                    Ok(_) => tracing::warn!("route outcome carried wrong payload"),
                    Err(e) => {
                        tracing::warn!(error = %e, "routing failed");
                        self.status(Status::error(format!("Routing Error: {e}")));
                        self.settle_state();
                    }
                }
            }
            _ => tracing::warn!(tag = ?outcome.tag, "outcome routed to wrong controller"),
        }
        Ok(())
    }

    fn apply_place(
        &mut self,
        store: &mut StateStore,
        workers: &mut WorkerPool,
        kind: SearchKind,
        place: crate::providers::Place,
    ) -> Result<(), StateError> {
        let pos = place.position;
        let short: String = place.display_name.chars().take(30).collect();
        match kind {
            SearchKind::Start => {
                store.set_start_marker(Some(pos))?;
                self.surface.set_start_marker(pos.lat, pos.lng);
                self.status(Status::success(format!("Start set: {short}...")));
            }
            SearchKind::Dest => {
                store.set_dest_marker(Some(pos))?;
                self.surface.set_destination_marker(pos.lat, pos.lng);
                self.status(Status::success(format!("Destination set: {short}...")));
            }
        }
        self.maybe_request_route(store, workers);
        Ok(())
    }

    /// Dispatch routing once both endpoints are known. The start endpoint is
    /// the custom marker only when custom start is enabled; otherwise the
    /// live position.
    fn maybe_request_route(&mut self, store: &StateStore, workers: &mut WorkerPool) {
        let vehicle = store.vehicle();
        let start = if self.use_custom_start {
            vehicle.start_marker.or(self.live_location)
        } else {
            self.live_location
        };
        if let (Some(start), Some(dest)) = (start, vehicle.dest_marker) {
            self.pending_route = Some(workers.submit_route(start, dest));
        }
    }

    /// Begin route playback from the first point. Requires a non-empty route.
    pub fn start_simulation(&mut self) {
        let has_route = self.route.as_ref().map(|r| !r.is_empty()).unwrap_or(false);
        if !has_route {
            self.status(Status::error("Draw a route to start."));
            return;
        }
        if self.state == NavState::Simulating {
            return;
        }
        self.cursor = 0;
        self.state = NavState::Simulating;
        self.status(Status::info("Simulation started."));
    }

    /// Stop route playback, keeping the route.
    pub fn stop_simulation(&mut self) {
        if self.state == NavState::Simulating {
            self.state = NavState::RouteReady;
            self.status(Status::info("Simulation stopped."));
        }
    }

    /// One simulation step: publish the point at the cursor as the live
    /// position, apply simulated speed and battery drain, advance the cursor
    /// by the stride. Past the end of the route the simulation halts and no
    /// further position updates occur.
    pub fn step_simulation(&mut self, store: &mut StateStore) -> Result<(), StateError> {
        if self.state != NavState::Simulating {
            return Ok(());
        }
        let route = match &self.route {
            Some(route) => Arc::clone(route),
            None => {
                self.stop_simulation();
                return Ok(());
            }
        };
        if self.cursor >= route.len() {
            self.state = NavState::RouteReady;
            self.status(Status::success("Simulation finished."));
            return Ok(());
        }

        if let Some(point) = route.point(self.cursor) {
            store.set_location(point)?;
            self.surface.update_user_position(point.lat, point.lng);
        }
        store.set_speed_kmh(config::SIM_SPEED_KMH)?;

        let drained = (store.vehicle().battery_pct - config::BATTERY_DECAY_PCT).max(0.0);
        // One decimal of precision, matching the battery display.
        store.set_battery_pct((drained * 10.0).round() / 10.0)?;

        self.cursor = (self.cursor + config::SIM_STRIDE).min(route.len());
        Ok(())
    }

    /// Wipe markers, route, and cursor; stop playback; return to idle.
    pub fn clear(&mut self, store: &mut StateStore) -> Result<(), StateError> {
        self.state = NavState::Idle;
        self.route = None;
        self.cursor = 0;
        self.pending_start = None;
        self.pending_dest = None;
        self.pending_route = None;
        store.set_start_marker(None)?;
        store.set_dest_marker(None)?;
        store.set_route(None);
        store.notify_map_cleared();
        self.surface.clear_map();
        self.status(Status::success("Map cleared."));
        Ok(())
    }
}
