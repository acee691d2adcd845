//! Boundary traits the battle core talks through
//!
//! Each role has exactly one production implementation: `room::RoomLink`
//! and `room::ObserverLink` for the room side, `HeadlessArena` for the
//! world side, `DefenceCatalog` for character stats and
//! `CenterLineConnector` for the team line.

use serde::{Deserialize, Serialize};

use super::character::CharacterStats;
use super::geometry::Vec2;
use super::mode::ModeEffects;
use super::position::Team;
use super::ActorId;
use crate::ws::protocol::BattleMsg;

/// A room member as reported by the room provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub actor: ActorId,
    pub name: String,
    /// Raw position value: 1..4 for players, 0 guest, 11 spectator
    pub position: i32,
    /// Main skill / character id
    pub skill: i32,
}

/// Session membership and authority, provided by the room.
pub trait RoomProvider: Send + Sync {
    /// Current room members in join order
    fn participants(&self) -> Vec<Member>;

    /// Actor of this process, `None` for observers
    fn local_actor(&self) -> Option<ActorId>;

    /// Current master actor
    fn master(&self) -> Option<ActorId>;

    /// Whether this process is the session authority
    fn is_authority(&self) -> bool {
        match (self.local_actor(), self.master()) {
            (Some(local), Some(master)) => local == master,
            _ => false,
        }
    }

    /// Whether this process is still connected to the session
    fn is_in_session(&self) -> bool;

    /// Number of real players the room was set up for
    fn expected_real_players(&self) -> usize;
}

/// Ordered, reliable delivery of battle messages to every room member,
/// including the sender.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, msg: BattleMsg);
}

/// Participant positions
pub trait Transforms {
    fn position(&self, actor: ActorId) -> Option<Vec2>;

    fn set_position(&mut self, actor: ActorId, position: Vec2);
}

/// Visual and collision toggles plus HUD elements
pub trait Presenter {
    fn show_player_mode(&mut self, actor: ActorId, effects: ModeEffects);

    fn show_countdown(&mut self, current: i32, max: i32);

    fn show_sling_shot(&mut self, team: Team, visible: bool);

    fn show_score(&mut self, team: Team, score: u32);
}

/// The possession object (ball)
pub trait BallControl {
    fn teleport_ball(&mut self, position: Vec2, team: Option<Team>);

    fn show_ball(&mut self);

    fn hide_ball(&mut self);

    fn move_ball(&mut self, velocity: Vec2);

    /// Put the ball back into play at a participant after a head hit
    fn restart_ball_for(&mut self, position: Vec2, team: Team);
}

/// Everything a client needs from the world it runs in.
pub trait Arena: Transforms + Presenter + BallControl + Send {}

impl<T: Transforms + Presenter + BallControl + Send> Arena for T {}

/// Character stat lookup by main skill id.
pub trait CharacterCatalog: Send + Sync {
    fn stats(&self, skill: i32) -> CharacterStats;
}

/// Roster entry handed to the team line connector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMember {
    pub actor: ActorId,
    pub team: Team,
    pub attack: f32,
}

/// Result of a nearest-participant query, used as the launch seed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPlayer {
    pub actor: ActorId,
    /// Distance from the centre line
    pub distance: f32,
    pub force: f32,
}

/// Answers "who is nearest to the centre" once the countdown ends.
pub trait TeamLineConnector: Send {
    fn connect(&mut self, local: Option<ActorId>, members: &[LineMember]);

    fn nearest(&self, transforms: &dyn Transforms) -> Option<NearestPlayer>;

    fn hide(&mut self);
}
