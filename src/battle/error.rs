//! Battle core errors

use super::ActorId;

/// Errors raised by the battle core.
///
/// Every variant is a precondition violation or protocol corruption. Runtime
/// races (disconnects, empty rosters) never surface here; they short-circuit
/// to a no-op instead.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("invalid player position: {0}")]
    InvalidPosition(i32),

    #[error("invalid team number: {0}")]
    InvalidTeam(u8),

    #[error("unknown play mode: {0}")]
    UnknownPlayMode(u8),

    #[error("player position {0} is already taken")]
    DuplicatePosition(u8),

    #[error("unknown participant: {0}")]
    UnknownParticipant(ActorId),

    #[error("teams have not been resolved yet")]
    TeamsNotResolved,

    #[error("malformed battle message: {0}")]
    Protocol(#[from] serde_json::Error),
}
