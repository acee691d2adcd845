//! ALT-Zone battle synchronization
//!
//! The battle core ([`battle`]) replicates player modes, the sling shot
//! launch and the countdown handshake across room members. The [`room`]
//! layer provides ordered in-process rooms, and the server modules expose
//! them over HTTP and WebSocket.

pub mod app;
pub mod battle;
pub mod config;
pub mod http;
pub mod room;
pub mod util;
pub mod ws;
