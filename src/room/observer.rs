//! Snapshot building for the server side replica

use chrono::Utc;

use crate::battle::ports::Transforms;
use crate::battle::position::Team;
use crate::battle::{BattleClient, HeadlessArena};
use crate::ws::protocol::{ParticipantView, RoomSnapshot, Scores};

use super::hub::RoomHub;

/// Decides which frames publish a snapshot
pub struct SnapshotThrottle {
    /// Frames since the last snapshot
    frames_since_snapshot: u32,
    /// Snapshot interval in frames
    snapshot_interval: u32,
}

impl SnapshotThrottle {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            frames_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to publish a snapshot
    pub fn should_send(&mut self) -> bool {
        self.frames_since_snapshot += 1;
        if self.frames_since_snapshot >= self.snapshot_interval {
            self.frames_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Publish on the next check (used for room events)
    pub fn force_next(&mut self) {
        self.frames_since_snapshot = self.snapshot_interval;
    }
}

/// Build the observer view of a room
pub fn build(hub: &RoomHub, client: &BattleClient<HeadlessArena>) -> RoomSnapshot {
    let arena = client.arena();
    let ctx = client.ctx();
    let participants = ctx
        .participants()
        .map(|p| ParticipantView {
            actor: p.actor,
            name: p.name.clone(),
            position: p.position,
            team: p.team(),
            mode: p.mode,
            location: arena.position(p.actor),
        })
        .collect();

    RoomSnapshot {
        room_id: hub.id(),
        expected_players: hub.expected_players(),
        master: hub.master(),
        handshake: client.phase(),
        countdown: arena.countdown(),
        participants,
        scores: Scores {
            blue: ctx.score(Team::Blue),
            red: ctx.score(Team::Red),
        },
        ball: arena.ball(),
        game_over: ctx.is_game_over(),
        updated_at: Utc::now(),
    }
}
