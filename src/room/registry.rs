//! Registry of live rooms, each with a server side observer replica

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use crate::battle::{BattleClient, HeadlessArena};
use crate::config::BattleConfig;
use crate::ws::protocol::RoomSnapshot;

use super::driver::{drive, Wake};
use super::hub::{RoomError, RoomHub};
use super::link::ObserverLink;
use super::observer::{self, SnapshotThrottle};

/// Observer snapshots per second
pub const SNAPSHOT_RATE: u32 = 10;

/// How long a room may wait for its first member before it is closed
pub const ROOM_IDLE_TTL: Duration = Duration::from_secs(60);

/// Handle to a live room
#[derive(Clone)]
pub struct RoomHandle {
    pub hub: Arc<RoomHub>,
    snapshots: watch::Receiver<RoomSnapshot>,
}

impl RoomHandle {
    pub fn id(&self) -> Uuid {
        self.hub.id()
    }

    /// Latest observer snapshot
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshots.clone()
    }
}

/// Registry of all live rooms
pub struct RoomRegistry {
    rooms: Arc<DashMap<Uuid, RoomHandle>>,
    battle: BattleConfig,
    idle_ttl: Duration,
}

impl RoomRegistry {
    pub fn new(battle: BattleConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            battle,
            idle_ttl: ROOM_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Create a room and spawn its observer. Must be called inside a tokio
    /// runtime.
    pub fn create_room(&self, expected_players: usize) -> Result<RoomHandle, RoomError> {
        let hub = Arc::new(RoomHub::new(Uuid::new_v4(), expected_players)?);
        let room_id = hub.id();
        let subscription = hub.observe();
        let client = BattleClient::new(
            self.battle.clone(),
            Arc::new(ObserverLink::new(hub.clone())),
            HeadlessArena::new(),
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(observer::build(&hub, &client));
        let handle = RoomHandle {
            hub: hub.clone(),
            snapshots: snapshot_rx,
        };
        self.rooms.insert(room_id, handle.clone());

        let rooms = self.rooms.clone();
        let interval = self.battle.frame_rate / SNAPSHOT_RATE;
        let idle_ttl = self.idle_ttl;
        tokio::spawn(async move {
            info!(%room_id, expected_players, "Room observer started");
            let mut throttle = SnapshotThrottle::new(interval);
            let result = drive(client, subscription, |client, wake| {
                if wake == Wake::Event {
                    throttle.force_next();
                } else if hub.idle_for().is_some_and(|idle| idle >= idle_ttl) {
                    // The Closed event stops the driver on its next wake
                    hub.close("no member joined in time");
                }
                if throttle.should_send() {
                    snapshot_tx.send_replace(observer::build(&hub, client));
                }
            })
            .await;

            match result {
                Ok(client) => {
                    snapshot_tx.send_replace(observer::build(&hub, &client));
                }
                Err(e) => {
                    error!(%room_id, error = %e, "Room observer failed");
                    hub.close("observer failed");
                }
            }
            rooms.remove(&room_id);
            info!(%room_id, "Room removed");
        });

        Ok(handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<RoomHandle> {
        self.rooms.get(id).map(|r| r.value().clone())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_members(&self) -> usize {
        self.rooms.iter().map(|r| r.value().hub.member_count()).sum()
    }

    /// Close every room, used on shutdown
    pub fn close_all(&self, reason: &str) {
        for room in self.rooms.iter() {
            room.value().hub.close(reason);
        }
    }
}
