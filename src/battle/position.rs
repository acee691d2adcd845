//! Player position slots and team assignment

use serde::{Deserialize, Serialize};

use super::error::BattleError;

/// Room member without a battle slot.
pub const POSITION_GUEST: i32 = 0;
/// Room member watching the battle.
pub const POSITION_SPECTATOR: i32 = 11;

/// A real player slot, always in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct PlayerPos(u8);

impl PlayerPos {
    pub fn new(raw: i32) -> Result<Self, BattleError> {
        match raw {
            1..=4 => Ok(Self(raw as u8)),
            _ => Err(BattleError::InvalidPosition(raw)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero based index for per-slot tables.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Slots 1 and 2 play for blue, 3 and 4 for red.
    pub fn team(self) -> Team {
        match self.0 {
            1 | 2 => Team::Blue,
            _ => Team::Red,
        }
    }

    pub fn teammate(self) -> PlayerPos {
        match self.0 {
            1 => PlayerPos(2),
            2 => PlayerPos(1),
            3 => PlayerPos(4),
            _ => PlayerPos(3),
        }
    }
}

impl TryFrom<i32> for PlayerPos {
    type Error = BattleError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PlayerPos> for i32 {
    fn from(pos: PlayerPos) -> Self {
        pos.0 as i32
    }
}

impl std::fmt::Display for PlayerPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a raw room position value means for the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Player(PlayerPos),
    Guest,
    Spectator,
}

impl Slot {
    /// Classify a raw position. Values that are neither a player slot, guest
    /// nor spectator indicate a broken lobby and are rejected.
    pub fn classify(raw: i32) -> Result<Self, BattleError> {
        match raw {
            POSITION_GUEST => Ok(Slot::Guest),
            POSITION_SPECTATOR => Ok(Slot::Spectator),
            _ => PlayerPos::new(raw).map(Slot::Player),
        }
    }

    pub fn player(self) -> Option<PlayerPos> {
        match self {
            Slot::Player(pos) => Some(pos),
            _ => None,
        }
    }
}

/// Whether a raw position belongs to a real player.
pub fn is_real_player(raw: i32) -> bool {
    PlayerPos::new(raw).is_ok()
}

/// Battle team. Blue is team A (slots 1-2), red is team B (slots 3-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// Enumeration order used wherever a deterministic team order matters.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    pub fn from_number(number: u8) -> Result<Self, BattleError> {
        match number {
            1 => Ok(Team::Blue),
            2 => Ok(Team::Red),
            _ => Err(BattleError::InvalidTeam(number)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Team::Blue => 1,
            Team::Red => 2,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Team::Blue => 0,
            Team::Red => 1,
        }
    }

    pub fn opposite(self) -> Team {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }
}
