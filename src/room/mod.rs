//! Room layer: the session, ordering and membership the battle core runs on

pub mod driver;
pub mod hub;
pub mod link;
pub mod observer;
pub mod registry;

pub use driver::drive;
pub use hub::{RoomError, RoomEvent, RoomHub, RoomSubscription};
pub use link::{ObserverLink, RoomLink};
pub use registry::{RoomHandle, RoomRegistry};
