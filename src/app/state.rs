//! Application state shared across routes

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::room::RoomRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Every room shares the same battle tuning
        let rooms = Arc::new(
            RoomRegistry::new(config.battle.clone())
                .with_idle_ttl(Duration::from_secs(config.room_idle_ttl_secs)),
        );

        Self { config, rooms }
    }
}
