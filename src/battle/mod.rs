//! Battle core: player modes, sling shot launch and the start handshake
//!
//! Everything here is engine and transport agnostic. The room side talks
//! through the traits in [`ports`]; [`client::BattleClient`] ties the pieces
//! together for one process (player or observer).

pub mod arena;
pub mod character;
pub mod client;
pub mod countdown;
pub mod error;
pub mod geometry;
pub mod line;
pub mod mode;
pub mod ports;
pub mod position;
pub mod session;
pub mod slingshot;

/// Room-assigned actor number, unique within a room
pub type ActorId = u32;

pub use arena::{BallState, HeadlessArena};
pub use client::BattleClient;
pub use countdown::{CountdownTick, HandshakePhase};
pub use error::BattleError;
pub use geometry::Vec2;
pub use mode::{ModeEffects, PlayMode};
pub use position::{PlayerPos, Team};
