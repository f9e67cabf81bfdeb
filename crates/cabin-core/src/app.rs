//! Dashboard event loop tying the store, controllers, and workers together.
//!
//! [`Dashboard`] owns the state store and both controllers on a single
//! interactive context. UI intents arrive as [`UiCommand`] messages, worker
//! results as [`TaskOutcome`] messages, and periodic work (simulation steps,
//! progress polls, location reports) runs off timers inside one `select!`
//! loop. The `run` future is not `Send`; drive it on a current-thread
//! runtime or inside a `LocalSet`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::interval;

use crate::config;
use crate::media::{MediaController, PlaybackDevice};
use crate::nav::{NavigationController, StatusSink};
use crate::providers::{ChargingRedirect, LocationSink, LocationUpdate, WeatherReport};
use crate::spectator::Spectator;
use crate::state::StateStore;
use crate::surface::{MapSurface, Status};
use crate::worker::{SearchKind, TaskOutcome, TaskOutput, TaskProviders, TaskTag, WorkerPool};

/// UI intent delivered to the dashboard loop.
#[derive(Debug, Clone)]
pub enum UiCommand {
    /// Geocode a free-text query for one route endpoint.
    Search {
        /// Which endpoint the result applies to.
        kind: SearchKind,
        /// Free-text location query.
        query: String,
    },
    /// Use the start marker instead of the live position as route origin.
    SetCustomStart(bool),
    /// Begin route playback.
    StartSimulation,
    /// Halt route playback, keeping the route.
    StopSimulation,
    /// Remove markers, route, and any running simulation.
    ClearMap,
    /// Toggle playback, resolving the current track first if needed.
    PlayPause,
    /// Advance to the next playlist entry.
    NextTrack,
    /// Go back to the previous playlist entry.
    PreviousTrack,
    /// Switch air conditioning on or off.
    SetAcOn(bool),
    /// Switch climate auto mode on or off.
    SetAcAuto(bool),
    /// Set fan speed, 0 to 100.
    SetFanSpeed(u8),
    /// Set cabin temperature in whole degrees, 16 to 32.
    SetCabinTemp(i32),
    /// Live GPS fix from the host.
    LocationFix {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
        /// Reported ground speed in km/h.
        speed_kmh: f64,
    },
    /// Switch the map between light and dark tiles.
    ToggleTheme,
    /// Switch the map between 2D and tilted view.
    ToggleView,
    /// Enter turn-by-turn presentation.
    StartNavigation,
    /// Stop the dashboard loop.
    Shutdown,
}

/// Callback receiving weather reports as they arrive.
pub type WeatherSink = Box<dyn FnMut(WeatherReport)>;

/// The dashboard core: state store, controllers, and the event loop.
pub struct Dashboard {
    store: StateStore,
    nav: NavigationController,
    media: MediaController,
    workers: WorkerPool,
    sink: Arc<dyn LocationSink>,
    outcomes: mpsc::UnboundedReceiver<TaskOutcome>,
    commands: mpsc::UnboundedReceiver<UiCommand>,
    redirect_tx: mpsc::UnboundedSender<ChargingRedirect>,
    redirects: mpsc::UnboundedReceiver<ChargingRedirect>,
    on_status: Rc<RefCell<StatusSink>>,
    on_weather: WeatherSink,
}

impl Dashboard {
    /// Build the dashboard, spawning the worker task families.
    ///
    /// Returns the dashboard and the sender UI code uses to submit
    /// [`UiCommand`]s. The playlist fetch is dispatched immediately; the
    /// weather fetch is dispatched when [`run`](Self::run) starts.
    pub fn new(
        providers: TaskProviders,
        device: Box<dyn PlaybackDevice>,
        sink: Arc<dyn LocationSink>,
        surface: Box<dyn MapSurface>,
        on_status: StatusSink,
        on_weather: WeatherSink,
    ) -> (Self, mpsc::UnboundedSender<UiCommand>) {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (redirect_tx, redirects) = mpsc::unbounded_channel();

        let mut workers = WorkerPool::spawn(providers, outcome_tx);
        let media = MediaController::new(device, &mut workers);

        let on_status: Rc<RefCell<StatusSink>> = Rc::new(RefCell::new(on_status));
        let nav_status = Rc::clone(&on_status);
        let nav = NavigationController::new(
            surface,
            Box::new(move |status| (nav_status.borrow_mut())(status)),
        );

        let dashboard = Self {
            store: StateStore::new(),
            nav,
            media,
            workers,
            sink,
            outcomes,
            commands,
            redirect_tx,
            redirects,
            on_status,
            on_weather,
        };
        (dashboard, command_tx)
    }

    /// Current vehicle and session state.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Mirror map state onto an additional read-only surface.
    pub fn attach_spectator(&mut self, surface: Rc<dyn MapSurface>) -> Spectator {
        Spectator::attach(&mut self.store, surface)
    }

    fn status(&self, status: Status) {
        (self.on_status.borrow_mut())(status);
    }

    /// Drive the dashboard until a [`UiCommand::Shutdown`] arrives or the
    /// command channel closes.
    pub async fn run(&mut self) {
        self.nav
            .surface()
            .initialize_map(config::MAP_INIT_LAT, config::MAP_INIT_LNG);
        self.workers.submit_fetch_weather();

        let mut sim_tick = interval(config::SIM_TICK_INTERVAL);
        let mut progress_tick = interval(config::PROGRESS_POLL_INTERVAL);
        let mut sink_tick = interval(config::LOCATION_SINK_INTERVAL);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    None | Some(UiCommand::Shutdown) => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(outcome) = self.outcomes.recv() => self.handle_outcome(outcome),
                Some(redirect) = self.redirects.recv() => {
                    tracing::warn!(station = %redirect.station.name, "charging redirect received");
                    self.status(Status::error(format!(
                        "Battery low. Nearest charging station: {}.",
                        redirect.station.name
                    )));
                },
                _ = sim_tick.tick() => {
                    if let Err(e) = self.nav.step_simulation(&mut self.store) {
                        tracing::warn!(error = %e, "simulation step rejected");
                    }
                },
                _ = progress_tick.tick() => self.media.poll_progress(&mut self.store),
                _ = sink_tick.tick() => self.push_location(),
            }
        }
        tracing::info!("dashboard loop stopped");
    }

    fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::Search { kind, query } => {
                self.nav.search(&mut self.workers, kind, &query);
            }
            UiCommand::SetCustomStart(enabled) => self.nav.set_use_custom_start(enabled),
            UiCommand::StartSimulation => self.nav.start_simulation(),
            UiCommand::StopSimulation => self.nav.stop_simulation(),
            UiCommand::ClearMap => {
                if let Err(e) = self.nav.clear(&mut self.store) {
                    tracing::warn!(error = %e, "map clear rejected");
                }
            }
            UiCommand::PlayPause => self.media.play_pause(&mut self.workers),
            UiCommand::NextTrack => self.media.next(&mut self.workers),
            UiCommand::PreviousTrack => self.media.previous(&mut self.workers),
            UiCommand::SetAcOn(on) => self.store.set_ac_on(on),
            UiCommand::SetAcAuto(auto) => self.store.set_ac_auto(auto),
            UiCommand::SetFanSpeed(speed) => {
                if let Err(e) = self.store.set_fan_speed(speed) {
                    self.status(Status::error(e.to_string()));
                }
            }
            UiCommand::SetCabinTemp(temp) => {
                if let Err(e) = self.store.set_cabin_temp(temp) {
                    self.status(Status::error(e.to_string()));
                }
            }
            UiCommand::LocationFix { lat, lng, speed_kmh } => {
                if let Err(e) = self.nav.on_location_fix(&mut self.store, lat, lng, speed_kmh) {
                    tracing::warn!(error = %e, "location fix rejected");
                }
            }
            UiCommand::ToggleTheme => self.nav.surface().toggle_theme(),
            UiCommand::ToggleView => self.nav.surface().toggle_view(),
            UiCommand::StartNavigation => self.nav.surface().start_navigation(),
            // Shutdown is consumed by the loop before dispatch.
            UiCommand::Shutdown => {}
        }
    }

    fn handle_outcome(&mut self, outcome: TaskOutcome) {
        match outcome.tag {
            TaskTag::Search(_) | TaskTag::Route => {
                if let Err(e) = self.nav.on_task(&mut self.store, &mut self.workers, outcome) {
                    tracing::warn!(error = %e, "navigation result rejected");
                }
            }
            TaskTag::Playlist | TaskTag::Stream => {
                self.media.on_task(&mut self.store, &mut self.workers, outcome);
            }
            TaskTag::Weather => match outcome.result {
                Ok(TaskOutput::Weather(report)) => (self.on_weather)(report),
                Ok(_) => tracing::warn!("weather outcome carried wrong payload"),
                Err(e) => tracing::warn!(error = %e, "weather fetch failed"),
            },
        }
    }

    /// Report position and battery to the backend. The push runs detached so
    /// a slow backend never stalls the loop; any charging redirect in the
    /// reply is posted back through the redirect channel.
    fn push_location(&mut self) {
        let vehicle = self.store.vehicle();
        if !vehicle.has_fix() {
            return;
        }
        let update = LocationUpdate {
            lat: vehicle.location.lat,
            lng: vehicle.location.lng,
            battery_level: vehicle.battery_pct,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let sink = Arc::clone(&self.sink);
        let tx = self.redirect_tx.clone();
        tokio::spawn(async move {
            match sink.push(&update).await {
                Ok(Some(redirect)) => {
                    let _ = tx.send(redirect);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "location report failed"),
            }
        });
    }
}
