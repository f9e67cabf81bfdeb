//! Vehicle/session state: the single source of truth.
//!
//! All shared attributes live in one [`StateStore`] owned by the interactive
//! context. Views subscribe per topic; every committed `set` notifies the
//! topic's subscribers synchronously, in registration order, before the
//! setter returns. Worker contexts never touch the store directly; they post
//! completion messages that the interactive loop applies.

mod store;
mod types;

pub use store::{StateError, StateEvent, StateStore, SubscriptionId, Topic};
pub use types::{LatLng, MediaInfo, MediaProgress, RouteGeometry, VehicleState};
