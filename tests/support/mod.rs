// Shared helpers for in-process battle sessions and a live test server.
#![allow(dead_code)]

use std::sync::Arc;

use altzone_battle::app::AppState;
use altzone_battle::battle::character::CharacterStats;
use altzone_battle::battle::ports::CharacterCatalog;
use altzone_battle::battle::{BattleClient, HandshakePhase, HeadlessArena};
use altzone_battle::config::{BattleConfig, Config};
use altzone_battle::http::build_router;
use altzone_battle::room::{RoomHub, RoomLink, RoomSubscription};

/// Character stats keyed by skill id, everything else moves at 5 with no attack
pub struct TableCatalog(pub Vec<(i32, CharacterStats)>);

impl CharacterCatalog for TableCatalog {
    fn stats(&self, skill: i32) -> CharacterStats {
        self.0
            .iter()
            .find(|(s, _)| *s == skill)
            .map(|(_, stats)| *stats)
            .unwrap_or(CharacterStats {
                speed: 5.0,
                attack: 0.0,
            })
    }
}

/// One in-process room member running its own battle replica
pub struct Player {
    pub client: BattleClient,
    pub link: Arc<RoomLink>,
    pub events: RoomSubscription,
}

impl Player {
    pub fn join(
        hub: &Arc<RoomHub>,
        config: &BattleConfig,
        position: i32,
        skill: i32,
        catalog: Arc<dyn CharacterCatalog>,
    ) -> Self {
        let (member, events) = hub
            .join(format!("player-{position}"), position, skill)
            .expect("join room");
        let link = Arc::new(RoomLink::new(hub.clone(), member.actor));
        let client = BattleClient::new(config.clone(), link.clone(), HeadlessArena::new())
            .with_catalog(catalog);
        Self {
            client,
            link,
            events,
        }
    }

    pub fn actor(&self) -> u32 {
        self.link.actor()
    }

    /// Apply every event already delivered; returns how many were applied
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.client.handle(event).expect("apply room event");
            applied += 1;
        }
        applied
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.client.phase(), HandshakePhase::Ready { .. })
    }
}

/// Deliver events until every player is caught up
pub fn settle(players: &mut [Player]) {
    loop {
        let applied: usize = players.iter_mut().map(Player::drain).sum();
        if applied == 0 {
            break;
        }
    }
}

/// Tick every in-session player by `dt` and settle
pub fn step(players: &mut [Player], dt: f32) {
    for player in players.iter_mut() {
        player.client.tick(dt).expect("tick");
    }
    settle(players);
}

/// Serve the router on an ephemeral port and return its base URL
pub async fn spawn_server(battle: BattleConfig) -> String {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "debug".to_string(),
        client_origin: "http://localhost:3000".to_string(),
        room_idle_ttl_secs: 60,
        battle,
    };
    let router = build_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    format!("http://{addr}")
}
