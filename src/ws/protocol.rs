//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::battle::countdown::HandshakePhase;
use crate::battle::geometry::Vec2;
use crate::battle::mode::PlayMode;
use crate::battle::ports::Member;
use crate::battle::position::{PlayerPos, Team};
use crate::battle::{ActorId, BallState, BattleError};
use crate::room::RoomEvent;

/// Battle messages relayed through the room to every member, sender included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleMsg {
    /// A player finished loading and is ready for the countdown
    ActorReady { actor: ActorId },

    /// A player moved; only the player itself may publish this
    Moved { actor: ActorId, position: Vec2 },

    /// Change a participant's mode
    SetMode { actor: ActorId, mode: PlayMode },

    /// Replicated countdown value, ends at -1
    Countdown { current: i32, max: i32 },

    /// Hide the ball while the sling shots are armed
    HideBall,

    /// Put the ball into play
    LaunchBall {
        team: Team,
        /// Sling shot anchor B
        position: Vec2,
        velocity: Vec2,
    },

    /// Hide and disarm every sling shot
    HideSlingShot,

    /// The ball hit a participant's head
    HeadCollision { actor: ActorId },
}

impl BattleMsg {
    /// Messages only the room master may publish
    pub fn is_authority_only(&self) -> bool {
        !matches!(self, Self::ActorReady { .. } | Self::Moved { .. })
    }

    /// Actor a player-originated message speaks for
    pub fn own_actor(&self) -> Option<ActorId> {
        match self {
            Self::ActorReady { actor } | Self::Moved { actor, .. } => Some(*actor),
            _ => None,
        }
    }

    /// Parse a battle message from wire text
    pub fn decode(text: &str) -> Result<Self, BattleError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Publish a battle message to the room
    Send { msg: BattleMsg },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the room
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after joining a room
    Welcome {
        room_id: Uuid,
        actor: ActorId,
        position: i32,
        is_master: bool,
        server_time: u64,
    },

    /// Member joined the room
    Joined { member: Member },

    /// Member left the room
    Left { actor: ActorId },

    /// A new master was elected
    MasterChanged { actor: Option<ActorId> },

    /// Battle message in room order
    Battle { from: ActorId, msg: BattleMsg },

    /// Room is gone
    Closed { reason: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },

    /// Error message
    Error { code: String, message: String },
}

impl From<RoomEvent> for ServerMsg {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::Joined { member } => Self::Joined { member },
            RoomEvent::Left { actor } => Self::Left { actor },
            RoomEvent::MasterChanged { actor } => Self::MasterChanged { actor },
            RoomEvent::Battle { from, msg } => Self::Battle { from, msg },
            RoomEvent::Closed { reason } => Self::Closed { reason },
        }
    }
}

/// Participant as seen by the room observer
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub actor: ActorId,
    pub name: String,
    pub position: PlayerPos,
    pub team: Team,
    pub mode: PlayMode,
    /// Last known location in the arena
    pub location: Option<Vec2>,
}

/// Team scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    pub blue: u32,
    pub red: u32,
}

/// Observer view of a room, served by `GET /rooms/:id`
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room_id: Uuid,
    pub expected_players: usize,
    pub master: Option<ActorId>,
    pub handshake: HandshakePhase,
    /// Last countdown value shown as (current, max)
    pub countdown: Option<(i32, i32)>,
    pub participants: Vec<ParticipantView>,
    pub scores: Scores,
    pub ball: BallState,
    pub game_over: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn battle_messages_are_tagged() {
        let msg = BattleMsg::SetMode {
            actor: 3,
            mode: PlayMode::Special,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({ "type": "set_mode", "actor": 3, "mode": 3 }));

        let launch = BattleMsg::decode(
            r#"{"type":"launch_ball","team":"red","position":{"x":1.0,"y":2.0},"velocity":{"x":0.0,"y":-3.0}}"#,
        )
        .unwrap();
        assert_eq!(
            launch,
            BattleMsg::LaunchBall {
                team: Team::Red,
                position: Vec2::new(1.0, 2.0),
                velocity: Vec2::new(0.0, -3.0),
            }
        );
    }

    #[test]
    fn unknown_mode_is_protocol_corruption() {
        let err = BattleMsg::decode(r#"{"type":"set_mode","actor":1,"mode":7}"#).unwrap_err();
        assert!(matches!(err, BattleError::Protocol(_)));
        assert!(BattleMsg::decode(r#"{"type":"teleport"}"#).is_err());
    }

    #[test]
    fn only_ready_and_moves_come_from_players() {
        assert!(!BattleMsg::ActorReady { actor: 1 }.is_authority_only());
        assert!(!BattleMsg::Moved {
            actor: 1,
            position: Vec2::ZERO
        }
        .is_authority_only());
        assert!(BattleMsg::HideBall.is_authority_only());
        assert!(BattleMsg::Countdown { current: 1, max: 3 }.is_authority_only());
        assert_eq!(BattleMsg::ActorReady { actor: 4 }.own_actor(), Some(4));
        assert_eq!(BattleMsg::HeadCollision { actor: 4 }.own_actor(), None);
    }

    #[test]
    fn client_frames_wrap_battle_messages() {
        let frame: ClientMsg =
            serde_json::from_str(r#"{"type":"send","msg":{"type":"actor_ready","actor":2}}"#)
                .unwrap();
        assert!(matches!(
            frame,
            ClientMsg::Send {
                msg: BattleMsg::ActorReady { actor: 2 }
            }
        ));
        let pong = serde_json::to_value(ServerMsg::Pong { t: 9 }).unwrap();
        assert_eq!(pong, json!({ "type": "pong", "t": 9 }));
    }
}
