//! Sling shot aiming and launch selection
//!
//! Each team aims the ball between its two members: anchor A follows the
//! first member (by slot), anchor B the second. When a team has a single
//! live member, B is pinned to the start position of the missing teammate.
//! The ball starts from B, heading along B - A.

use super::geometry::Vec2;
use super::ports::{CharacterCatalog, Transforms};
use super::position::{PlayerPos, Team};
use super::session::Participant;
use super::ActorId;

/// Current aim of one team
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchAim {
    pub team: Team,
    pub a: Vec2,
    pub b: Vec2,
    pub delta: Vec2,
    /// |B - A|² clamped into the configured distance window
    pub clamped_sqr_magnitude: f32,
    pub attack_force: f32,
}

impl LaunchAim {
    pub fn new(team: Team, a: Vec2, b: Vec2, attack_force: f32, distance: (f32, f32)) -> Self {
        let delta = b - a;
        let (min, max) = distance;
        Self {
            team,
            a,
            b,
            delta,
            clamped_sqr_magnitude: delta.length_squared().clamp(min * min, max * max),
            attack_force,
        }
    }

    /// How "ready" this throw is; the largest wins the launch
    pub fn readiness(&self) -> f32 {
        self.clamped_sqr_magnitude * self.attack_force
    }

    /// Uses the unclamped delta: normalize(B - A) * |B - A| * multiplier
    pub fn launch_velocity(&self, multiplier: f32) -> Vec2 {
        self.delta.normalized() * (self.delta.length() * multiplier)
    }
}

/// Where anchor B comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Follow(ActorId),
    Fixed(Vec2),
}

/// Per-team aiming state, armed once the roster is known
#[derive(Debug, Clone)]
pub struct SlingShot {
    team: Team,
    follow_a: ActorId,
    anchor_b: Anchor,
    attack_force: f32,
    distance: (f32, f32),
    aim: Option<LaunchAim>,
}

impl SlingShot {
    /// Arm a sling shot for `members` (ordered by slot). Returns `None` for a
    /// team without live members.
    pub fn arm(
        team: Team,
        members: &[&Participant],
        catalog: &dyn CharacterCatalog,
        distance: (f32, f32),
        start_position: impl Fn(PlayerPos) -> Vec2,
    ) -> Option<Self> {
        let first = members.first()?;
        let mut attack_force = catalog.stats(first.skill).attack;
        let anchor_b = match members.get(1) {
            Some(second) => {
                attack_force += catalog.stats(second.skill).attack;
                Anchor::Follow(second.actor)
            }
            None => Anchor::Fixed(start_position(first.teammate_position())),
        };
        Some(Self {
            team,
            follow_a: first.actor,
            anchor_b,
            attack_force,
            distance,
            aim: None,
        })
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn attack_force(&self) -> f32 {
        self.attack_force
    }

    pub fn aim(&self) -> Option<&LaunchAim> {
        self.aim.as_ref()
    }

    /// Recompute the aim from current positions. Keeps the previous aim if a
    /// followed participant has no known position.
    pub fn update(&mut self, transforms: &dyn Transforms) -> Option<&LaunchAim> {
        let a = transforms.position(self.follow_a);
        let b = match self.anchor_b {
            Anchor::Follow(actor) => transforms.position(actor),
            Anchor::Fixed(point) => Some(point),
        };
        if let (Some(a), Some(b)) = (a, b) {
            self.aim = Some(LaunchAim::new(self.team, a, b, self.attack_force, self.distance));
        }
        self.aim.as_ref()
    }
}

/// Pick the aim with the largest `clamped_sqr_magnitude * attack_force`.
///
/// Ties keep the first aim in enumeration order; an empty slice has no
/// candidate.
pub fn select_launch(aims: &[LaunchAim]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, aim) in aims.iter().enumerate() {
        let readiness = aim.readiness();
        match best {
            Some((_, best_readiness)) if readiness <= best_readiness => {}
            _ => best = Some((idx, readiness)),
        }
    }
    best.map(|(idx, _)| idx)
}
