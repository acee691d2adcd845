//! In-memory arena: positions, presentation state and the ball

use serde::Serialize;
use std::collections::HashMap;

use super::geometry::Vec2;
use super::mode::ModeEffects;
use super::ports::{BallControl, Presenter, Transforms};
use super::position::Team;
use super::ActorId;

/// Possession object state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BallState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub visible: bool,
    /// Team whose side the ball was put into play on
    pub team: Option<Team>,
}

/// Headless world used by the server observer and by engine-less clients.
///
/// It records what a renderer would draw so the state can be inspected and
/// serialized.
#[derive(Debug, Clone, Default)]
pub struct HeadlessArena {
    positions: HashMap<ActorId, Vec2>,
    player_effects: HashMap<ActorId, ModeEffects>,
    countdown: Option<(i32, i32)>,
    sling_shots: [bool; 2],
    scores: [u32; 2],
    ball: BallState,
}

impl HeadlessArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ball(&self) -> BallState {
        self.ball
    }

    pub fn player_effects(&self, actor: ActorId) -> Option<ModeEffects> {
        self.player_effects.get(&actor).copied()
    }

    pub fn countdown(&self) -> Option<(i32, i32)> {
        self.countdown
    }

    pub fn sling_shot_visible(&self, team: Team) -> bool {
        self.sling_shots[team.index()]
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team.index()]
    }
}

impl Transforms for HeadlessArena {
    fn position(&self, actor: ActorId) -> Option<Vec2> {
        self.positions.get(&actor).copied()
    }

    fn set_position(&mut self, actor: ActorId, position: Vec2) {
        self.positions.insert(actor, position);
    }
}

impl Presenter for HeadlessArena {
    fn show_player_mode(&mut self, actor: ActorId, effects: ModeEffects) {
        self.player_effects.insert(actor, effects);
    }

    fn show_countdown(&mut self, current: i32, max: i32) {
        self.countdown = Some((current, max));
    }

    fn show_sling_shot(&mut self, team: Team, visible: bool) {
        self.sling_shots[team.index()] = visible;
    }

    fn show_score(&mut self, team: Team, score: u32) {
        self.scores[team.index()] = score;
    }
}

impl BallControl for HeadlessArena {
    fn teleport_ball(&mut self, position: Vec2, team: Option<Team>) {
        self.ball.position = position;
        self.ball.team = team;
    }

    fn show_ball(&mut self) {
        self.ball.visible = true;
    }

    fn hide_ball(&mut self) {
        self.ball.visible = false;
    }

    fn move_ball(&mut self, velocity: Vec2) {
        self.ball.velocity = velocity;
    }

    fn restart_ball_for(&mut self, position: Vec2, team: Team) {
        self.ball = BallState {
            position,
            velocity: Vec2::ZERO,
            visible: true,
            team: Some(team),
        };
    }
}
