//! Player play modes and their side effects

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::BattleError;

/// Replicated per-participant mode.
///
/// The wire form is the integer code; decoding any other value fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayMode {
    /// Collidable, movable, shown active
    Normal,
    /// Collidable, cannot move, shown frozen
    Frozen,
    /// Not collidable, movable, shown as a ghost
    Ghosted,
    /// Looks and behaves like `Ghosted` but cannot be frozen while the ball
    /// may still overlap the player
    Special,
}

impl PlayMode {
    pub fn code(self) -> u8 {
        match self {
            PlayMode::Normal => 0,
            PlayMode::Frozen => 1,
            PlayMode::Ghosted => 2,
            PlayMode::Special => 3,
        }
    }

    /// Mode that results from `requested` arriving while in `current`.
    ///
    /// `Special` -> `Frozen` is intercepted and stays `Special`; every other
    /// pair simply overwrites.
    pub fn resolve(current: PlayMode, requested: PlayMode) -> PlayMode {
        match (current, requested) {
            (PlayMode::Special, PlayMode::Frozen) => PlayMode::Special,
            (_, requested) => requested,
        }
    }

    pub fn effects(self) -> ModeEffects {
        match self {
            PlayMode::Normal => ModeEffects {
                collision: true,
                can_move: true,
                visual: PlayerVisual::Active,
            },
            PlayMode::Frozen => ModeEffects {
                collision: true,
                can_move: false,
                visual: PlayerVisual::Frozen,
            },
            PlayMode::Ghosted | PlayMode::Special => ModeEffects {
                collision: false,
                can_move: true,
                visual: PlayerVisual::Ghost,
            },
        }
    }
}

impl TryFrom<u8> for PlayMode {
    type Error = BattleError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PlayMode::Normal),
            1 => Ok(PlayMode::Frozen),
            2 => Ok(PlayMode::Ghosted),
            3 => Ok(PlayMode::Special),
            other => Err(BattleError::UnknownPlayMode(other)),
        }
    }
}

impl From<PlayMode> for u8 {
    fn from(mode: PlayMode) -> Self {
        mode.code()
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(PlayMode::Normal),
            "frozen" => Ok(PlayMode::Frozen),
            "ghosted" => Ok(PlayMode::Ghosted),
            "special" => Ok(PlayMode::Special),
            other => Err(format!("unknown play mode name: {other}")),
        }
    }
}

/// How a participant is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerVisual {
    Active,
    Frozen,
    Ghost,
}

/// Presentation side effects pushed on every mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeEffects {
    pub collision: bool,
    pub can_move: bool,
    pub visual: PlayerVisual,
}
