//! # Cabin Core Library
//!
//! Core functionality for the Cabin in-vehicle dashboard client.
//!
//! This library provides:
//! - A centralized, observable state store for vehicle and session attributes
//! - Background worker tasks for slow provider I/O (geocoding, routing,
//!   playlist/stream resolution, weather)
//! - A navigation controller with deterministic route-playback simulation
//! - A media controller with playlist handling and progress polling
//! - Read-only spectator mirroring onto an external map rendering surface
//!
//! Rendering, audio playback, and the network providers themselves are
//! external collaborators reached through traits.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cabin_core::prelude::*;
//!
//! let (dashboard, commands) =
//!     Dashboard::new(providers, device, sink, surface, on_status, on_weather);
//! commands.send(UiCommand::Search { kind: SearchKind::Dest, query: "Connaught Place".into() })?;
//!
//! // The dashboard future owns the state store and is not Send;
//! // drive it on a current-thread runtime or LocalSet.
//! local.run_until(dashboard.run()).await;
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod media;
pub mod nav;
pub mod providers;
pub mod spectator;
pub mod state;
pub mod surface;
pub mod worker;

#[cfg(test)]
mod testutil;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{Dashboard, UiCommand};
    pub use crate::media::{MediaController, PlaybackDevice, Playlist, Song};
    pub use crate::nav::{NavState, NavigationController};
    pub use crate::providers::{
        Geocoder, LocationSink, MediaIndex, ProviderError, Router, WeatherProvider,
    };
    pub use crate::spectator::Spectator;
    pub use crate::state::{LatLng, RouteGeometry, StateError, StateStore, Topic, VehicleState};
    pub use crate::surface::{JsMapChannel, MapSurface, Status, StatusLevel};
    pub use crate::worker::{SearchKind, TaskOutcome, TaskTag, WorkerPool};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
