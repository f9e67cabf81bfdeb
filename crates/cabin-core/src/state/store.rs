//! Observable state store with per-topic synchronous notification.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{LatLng, MediaInfo, MediaProgress, RouteGeometry, VehicleState};

/// Topics a subscriber can observe. One per field or field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// AC on/off.
    AcState,
    /// AC auto mode.
    AcMode,
    /// Fan speed.
    FanSpeed,
    /// Cabin temperature setpoint.
    CabinTemp,
    /// Battery percentage.
    Battery,
    /// Vehicle speed.
    Speed,
    /// Live position.
    Location,
    /// Current media metadata.
    Media,
    /// Media playback progress.
    MediaProgress,
    /// Start marker.
    StartMarker,
    /// Destination marker.
    DestMarker,
    /// Route geometry.
    Route,
    /// Map wiped by a clear request.
    MapCleared,
}

/// Committed value delivered to subscribers of a topic.
#[derive(Debug, Clone)]
pub enum StateEvent {
    /// AC turned on or off.
    AcState(bool),
    /// AC auto mode changed.
    AcMode(bool),
    /// Fan speed changed.
    FanSpeed(u8),
    /// Cabin temperature setpoint changed.
    CabinTemp(i32),
    /// Battery percentage changed.
    Battery(f64),
    /// Speed changed.
    Speed(f64),
    /// Live position changed.
    Location(LatLng),
    /// Current media changed.
    Media(MediaInfo),
    /// Playback progress changed.
    MediaProgress(MediaProgress),
    /// Start marker set or removed.
    StartMarker(Option<LatLng>),
    /// Destination marker set or removed.
    DestMarker(Option<LatLng>),
    /// Route geometry set or removed.
    Route(Option<Arc<RouteGeometry>>),
    /// Map wiped by a clear request.
    MapCleared,
}

impl StateEvent {
    /// Topic this event belongs to.
    pub fn topic(&self) -> Topic {
        match self {
            StateEvent::AcState(_) => Topic::AcState,
            StateEvent::AcMode(_) => Topic::AcMode,
            StateEvent::FanSpeed(_) => Topic::FanSpeed,
            StateEvent::CabinTemp(_) => Topic::CabinTemp,
            StateEvent::Battery(_) => Topic::Battery,
            StateEvent::Speed(_) => Topic::Speed,
            StateEvent::Location(_) => Topic::Location,
            StateEvent::Media(_) => Topic::Media,
            StateEvent::MediaProgress(_) => Topic::MediaProgress,
            StateEvent::StartMarker(_) => Topic::StartMarker,
            StateEvent::DestMarker(_) => Topic::DestMarker,
            StateEvent::Route(_) => Topic::Route,
            StateEvent::MapCleared => Topic::MapCleared,
        }
    }
}

/// Errors raised by a rejected state mutation.
///
/// Out-of-domain values are rejected, never clamped; a producer that already
/// guarantees an invariant should not have the store silently repair it.
#[derive(Error, Debug)]
pub enum StateError {
    /// Value outside the field's declared domain.
    #[error("{field:?} value {value} outside [{min}, {max}]")]
    OutOfRange {
        /// Field that rejected the write.
        field: Topic,
        /// Offending value.
        value: f64,
        /// Lower bound of the domain.
        min: f64,
        /// Upper bound of the domain.
        max: f64,
    },

    /// Value is NaN or infinite.
    #[error("{field:?} value is not finite")]
    NotFinite {
        /// Field that rejected the write.
        field: Topic,
    },
}

/// Handle returned by [`StateStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&StateEvent)>;

/// Single authoritative holder of shared vehicle/session attributes.
///
/// Not `Send`: the store lives on the interactive context and is only ever
/// mutated there. Subscriber handlers run synchronously inside `set_*` and
/// must not block; they receive the committed value in the event rather than
/// re-reading the store.
pub struct StateStore {
    state: VehicleState,
    subscribers: HashMap<Topic, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Create a store with startup defaults.
    pub fn new() -> Self {
        Self {
            state: VehicleState::default(),
            subscribers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Last committed values. Non-blocking.
    pub fn vehicle(&self) -> &VehicleState {
        &self.state
    }

    /// Register a handler for a topic. Handlers for the same topic are
    /// invoked in registration order.
    pub fn subscribe(&mut self, topic: Topic, handler: Handler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.entry(topic).or_default().push((id, handler));
        id
    }

    /// Remove a previously registered handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        for subs in self.subscribers.values_mut() {
            subs.retain(|(sid, _)| *sid != id);
        }
    }

    fn notify(&mut self, event: StateEvent) {
        if let Some(subs) = self.subscribers.get_mut(&event.topic()) {
            for (_, handler) in subs.iter_mut() {
                handler(&event);
            }
        }
    }

    fn check_finite(value: f64, field: Topic) -> Result<(), StateError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(StateError::NotFinite { field })
        }
    }

    fn check_range(value: f64, min: f64, max: f64, field: Topic) -> Result<(), StateError> {
        Self::check_finite(value, field)?;
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(StateError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    fn check_position(pos: LatLng, field: Topic) -> Result<(), StateError> {
        Self::check_finite(pos.lat, field)?;
        Self::check_finite(pos.lng, field)
    }

    /// Turn the AC on or off. Writer: climate panel.
    pub fn set_ac_on(&mut self, on: bool) {
        self.state.ac_on = on;
        self.notify(StateEvent::AcState(on));
    }

    /// Switch AC auto mode. Writer: climate panel.
    pub fn set_ac_auto(&mut self, auto: bool) {
        self.state.ac_auto = auto;
        self.notify(StateEvent::AcMode(auto));
    }

    /// Set fan speed, 0-100. Writer: climate panel.
    pub fn set_fan_speed(&mut self, speed: u8) -> Result<(), StateError> {
        Self::check_range(speed as f64, 0.0, 100.0, Topic::FanSpeed)?;
        self.state.fan_speed = speed;
        self.notify(StateEvent::FanSpeed(speed));
        Ok(())
    }

    /// Set cabin temperature setpoint, 16-32. Writer: climate panel.
    pub fn set_cabin_temp(&mut self, temp: i32) -> Result<(), StateError> {
        Self::check_range(temp as f64, 16.0, 32.0, Topic::CabinTemp)?;
        self.state.cabin_temp = temp;
        self.notify(StateEvent::CabinTemp(temp));
        Ok(())
    }

    /// Set battery percentage, 0-100. Writer: simulation / battery monitor.
    pub fn set_battery_pct(&mut self, pct: f64) -> Result<(), StateError> {
        Self::check_range(pct, 0.0, 100.0, Topic::Battery)?;
        self.state.battery_pct = pct;
        self.notify(StateEvent::Battery(pct));
        Ok(())
    }

    /// Set vehicle speed in km/h, non-negative. Writer: GPS bridge / simulation.
    pub fn set_speed_kmh(&mut self, speed: f64) -> Result<(), StateError> {
        Self::check_finite(speed, Topic::Speed)?;
        if speed < 0.0 {
            return Err(StateError::OutOfRange {
                field: Topic::Speed,
                value: speed,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        self.state.speed_kmh = speed;
        self.notify(StateEvent::Speed(speed));
        Ok(())
    }

    /// Set the live position. Writer: GPS bridge / simulation.
    pub fn set_location(&mut self, pos: LatLng) -> Result<(), StateError> {
        Self::check_position(pos, Topic::Location)?;
        self.state.location = pos;
        self.notify(StateEvent::Location(pos));
        Ok(())
    }

    /// Set current media metadata. Writer: media controller.
    pub fn set_current_media(&mut self, media: MediaInfo) {
        self.state.current_media = media.clone();
        self.notify(StateEvent::Media(media));
    }

    /// Set playback progress. Writer: media controller.
    pub fn set_media_progress(&mut self, progress: MediaProgress) {
        self.state.media_progress = progress;
        self.notify(StateEvent::MediaProgress(progress));
    }

    /// Set or remove the start marker. Writer: navigation controller.
    pub fn set_start_marker(&mut self, marker: Option<LatLng>) -> Result<(), StateError> {
        if let Some(pos) = marker {
            Self::check_position(pos, Topic::StartMarker)?;
        }
        self.state.start_marker = marker;
        self.notify(StateEvent::StartMarker(marker));
        Ok(())
    }

    /// Set or remove the destination marker. Writer: navigation controller.
    pub fn set_dest_marker(&mut self, marker: Option<LatLng>) -> Result<(), StateError> {
        if let Some(pos) = marker {
            Self::check_position(pos, Topic::DestMarker)?;
        }
        self.state.dest_marker = marker;
        self.notify(StateEvent::DestMarker(marker));
        Ok(())
    }

    /// Replace the route geometry. Writer: navigation controller.
    pub fn set_route(&mut self, route: Option<Arc<RouteGeometry>>) {
        self.state.route = route.clone();
        self.notify(StateEvent::Route(route));
    }

    /// Announce that the map was wiped. Writer: navigation controller.
    pub fn notify_map_cleared(&mut self) {
        self.notify(StateEvent::MapCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn battery_probe(store: &mut StateStore) -> Rc<RefCell<Vec<f64>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(
            Topic::Battery,
            Box::new(move |event| {
                if let StateEvent::Battery(pct) = event {
                    sink.borrow_mut().push(*pct);
                }
            }),
        );
        seen
    }

    #[test]
    fn test_set_commits_and_notifies_exactly_once() {
        let mut store = StateStore::new();
        let seen = battery_probe(&mut store);

        store.set_battery_pct(80.0).unwrap();
        assert_eq!(store.vehicle().battery_pct, 80.0);
        assert_eq!(*seen.borrow(), vec![80.0]);
    }

    #[test]
    fn test_out_of_range_battery_rejected_and_unchanged() {
        let mut store = StateStore::new();
        let seen = battery_probe(&mut store);

        assert!(store.set_battery_pct(120.0).is_err());
        assert!(store.set_battery_pct(-0.1).is_err());
        assert!(store.set_battery_pct(f64::NAN).is_err());
        assert_eq!(store.vehicle().battery_pct, 27.0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_cabin_temp_and_fan_speed_domains() {
        let mut store = StateStore::new();
        assert!(store.set_cabin_temp(15).is_err());
        assert!(store.set_cabin_temp(33).is_err());
        store.set_cabin_temp(16).unwrap();
        assert_eq!(store.vehicle().cabin_temp, 16);

        assert!(store.set_fan_speed(101).is_err());
        store.set_fan_speed(100).unwrap();
        assert_eq!(store.vehicle().fan_speed, 100);
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut store = StateStore::new();
        assert!(store.set_speed_kmh(-1.0).is_err());
        store.set_speed_kmh(0.0).unwrap();
        store.set_speed_kmh(45.0).unwrap();
        assert_eq!(store.vehicle().speed_kmh, 45.0);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let mut store = StateStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let sink = Rc::clone(&order);
            store.subscribe(Topic::Speed, Box::new(move |_| sink.borrow_mut().push(label)));
        }

        store.set_speed_kmh(10.0).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = StateStore::new();
        let seen = battery_probe(&mut store);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(Topic::Battery, Box::new(move |_| *sink.borrow_mut() += 1));

        store.set_battery_pct(50.0).unwrap();
        store.unsubscribe(id);
        store.set_battery_pct(49.0).unwrap();

        assert_eq!(*count.borrow(), 1);
        assert_eq!(*seen.borrow(), vec![50.0, 49.0]);
    }

    #[test]
    fn test_late_subscriber_sees_no_history() {
        let mut store = StateStore::new();
        for pct in [90.0, 80.0, 70.0, 60.0, 50.0] {
            store.set_battery_pct(pct).unwrap();
        }

        let seen = battery_probe(&mut store);
        assert!(seen.borrow().is_empty());
        // Current value is available by pull, not replayed as notifications.
        assert_eq!(store.vehicle().battery_pct, 50.0);
    }

    #[test]
    fn test_marker_and_route_events_carry_payload() {
        let mut store = StateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(
            Topic::StartMarker,
            Box::new(move |event| {
                if let StateEvent::StartMarker(m) = event {
                    sink.borrow_mut().push(*m);
                }
            }),
        );

        let pos = LatLng::new(28.5, 77.3);
        store.set_start_marker(Some(pos)).unwrap();
        store.set_start_marker(None).unwrap();
        assert_eq!(*seen.borrow(), vec![Some(pos), None]);

        let route = Arc::new(RouteGeometry::new(vec![pos]));
        store.set_route(Some(Arc::clone(&route)));
        assert_eq!(store.vehicle().route.as_ref().unwrap().len(), 1);
    }
}
