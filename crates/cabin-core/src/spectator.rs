//! Spectator: a read-only mirror of the map state on a second surface.

use std::rc::Rc;

use crate::state::{StateEvent, StateStore, SubscriptionId, Topic};
use crate::surface::MapSurface;

/// Read-only subscriber replaying state store events into an external
/// rendering surface.
///
/// On attach it pulls the current markers, route, and position and replays
/// each at most once, so state set before the spectator existed is not lost;
/// absent values are skipped. After that it mirrors live updates until
/// detached.
pub struct Spectator {
    subscriptions: Vec<SubscriptionId>,
}

impl Spectator {
    /// Attach to the store: replay current map state, then follow updates.
    pub fn attach(store: &mut StateStore, surface: Rc<dyn MapSurface>) -> Self {
        // Replay once from current values.
        let vehicle = store.vehicle();
        let start = vehicle.start_marker;
        let dest = vehicle.dest_marker;
        let route = vehicle.route.clone();
        let location = vehicle.has_fix().then_some(vehicle.location);

        if let Some(pos) = start {
            surface.set_start_marker(pos.lat, pos.lng);
        }
        if let Some(pos) = dest {
            surface.set_destination_marker(pos.lat, pos.lng);
        }
        if let Some(route) = route {
            surface.draw_route(&route.to_geojson());
        }
        if let Some(pos) = location {
            surface.update_user_position(pos.lat, pos.lng);
        }

        // Live mirroring from here on.
        let mut subscriptions = Vec::new();

        let s = Rc::clone(&surface);
        subscriptions.push(store.subscribe(
            Topic::Location,
            Box::new(move |event| {
                if let StateEvent::Location(pos) = event {
                    s.update_user_position(pos.lat, pos.lng);
                }
            }),
        ));

        let s = Rc::clone(&surface);
        subscriptions.push(store.subscribe(
            Topic::StartMarker,
            Box::new(move |event| {
                if let StateEvent::StartMarker(Some(pos)) = event {
                    s.set_start_marker(pos.lat, pos.lng);
                }
            }),
        ));

        let s = Rc::clone(&surface);
        subscriptions.push(store.subscribe(
            Topic::DestMarker,
            Box::new(move |event| {
                if let StateEvent::DestMarker(Some(pos)) = event {
                    s.set_destination_marker(pos.lat, pos.lng);
                }
            }),
        ));

        let s = Rc::clone(&surface);
        subscriptions.push(store.subscribe(
            Topic::Route,
            Box::new(move |event| {
                if let StateEvent::Route(Some(route)) = event {
                    s.draw_route(&route.to_geojson());
                }
            }),
        ));

        let s = Rc::clone(&surface);
        subscriptions.push(store.subscribe(
            Topic::MapCleared,
            Box::new(move |event| {
                if let StateEvent::MapCleared = event {
                    s.clear_map();
                }
            }),
        ));

        Self { subscriptions }
    }

    /// Detach from the store, removing all live subscriptions.
    pub fn detach(self, store: &mut StateStore) {
        for id in self.subscriptions {
            store.unsubscribe(id);
        }
    }
}
