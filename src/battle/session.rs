//! Session context: participants, teams, scores, and the authority gate

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::BattleError;
use super::mode::PlayMode;
use super::ports::RoomProvider;
use super::position::{PlayerPos, Team};
use super::ActorId;

/// One networked player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub actor: ActorId,
    pub name: String,
    pub position: PlayerPos,
    pub skill: i32,
    pub is_local: bool,
    pub mode: PlayMode,
}

impl Participant {
    pub fn team(&self) -> Team {
        self.position.team()
    }

    pub fn teammate_position(&self) -> PlayerPos {
        self.position.teammate()
    }
}

/// Per-session registry owned by a single battle client.
///
/// Participants are kept ordered by position slot so every enumeration
/// (team members, launch candidates, mode broadcasts) is deterministic.
#[derive(Debug, Default)]
pub struct SessionContext {
    participants: BTreeMap<PlayerPos, Participant>,
    home_team: Option<Team>,
    local_team: Option<Team>,
    teams_resolved: bool,
    scores: [u32; 2],
    game_over: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant. Returns `Ok(false)` when the actor is already known.
    pub fn register(&mut self, participant: Participant) -> Result<bool, BattleError> {
        if self.get(participant.actor).is_some() {
            return Ok(false);
        }
        if self.participants.contains_key(&participant.position) {
            return Err(BattleError::DuplicatePosition(participant.position.get()));
        }
        debug!(
            actor = participant.actor,
            position = %participant.position,
            team = ?participant.team(),
            local = participant.is_local,
            "Participant registered"
        );
        self.participants.insert(participant.position, participant);
        Ok(true)
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<Participant> {
        let position = self.get(actor)?.position;
        self.participants.remove(&position)
    }

    pub fn get(&self, actor: ActorId) -> Option<&Participant> {
        self.participants.values().find(|p| p.actor == actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut Participant> {
        self.participants.values_mut().find(|p| p.actor == actor)
    }

    pub fn by_position(&self, position: PlayerPos) -> Option<&Participant> {
        self.participants.get(&position)
    }

    /// All participants ordered by position slot
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn local(&self) -> Option<&Participant> {
        self.participants.values().find(|p| p.is_local)
    }

    /// Members of a team ordered by position slot
    pub fn team_members(&self, team: Team) -> Vec<&Participant> {
        self.participants.values().filter(|p| p.team() == team).collect()
    }

    pub fn teammate(&self, actor: ActorId) -> Option<&Participant> {
        let me = self.get(actor)?;
        self.by_position(me.teammate_position())
    }

    /// Derive home and local team once every participant is known.
    ///
    /// The home team is the master's team; the local team is the team of the
    /// local participant (its teammate is on the same team by construction).
    pub fn resolve_teams(&mut self, master: Option<ActorId>) {
        self.home_team = master.and_then(|m| self.get(m)).map(Participant::team);
        self.local_team = self.local().map(Participant::team);
        self.teams_resolved = true;
        info!(
            home_team = ?self.home_team,
            local_team = ?self.local_team,
            participants = self.participants.len(),
            "Teams resolved"
        );
    }

    pub fn teams_resolved(&self) -> bool {
        self.teams_resolved
    }

    pub fn home_team(&self) -> Result<Option<Team>, BattleError> {
        if !self.teams_resolved {
            return Err(BattleError::TeamsNotResolved);
        }
        Ok(self.home_team)
    }

    pub fn local_team(&self) -> Result<Option<Team>, BattleError> {
        if !self.teams_resolved {
            return Err(BattleError::TeamsNotResolved);
        }
        Ok(self.local_team)
    }

    pub fn add_score(&mut self, team: Team) -> u32 {
        self.scores[team.index()] += 1;
        self.scores[team.index()]
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team.index()]
    }

    pub fn set_game_over(&mut self) {
        self.game_over = true;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

/// Decides whether this process may originate state changes.
#[derive(Clone)]
pub struct AuthorityGate {
    room: Arc<dyn RoomProvider>,
}

impl AuthorityGate {
    pub fn new(room: Arc<dyn RoomProvider>) -> Self {
        Self { room }
    }

    pub fn is_authority(&self) -> bool {
        self.room.is_authority()
    }

    /// True if the caller is the authority; otherwise logs and returns false
    /// so the command becomes a no-op.
    pub fn require(&self, op: &'static str) -> bool {
        if self.room.is_authority() {
            return true;
        }
        debug!(op, local = ?self.room.local_actor(), "Ignoring command from non-authority");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ports::Member;

    fn participant(actor: ActorId, pos: i32, is_local: bool) -> Participant {
        Participant {
            actor,
            name: format!("p{actor}"),
            position: PlayerPos::new(pos).unwrap(),
            skill: 2,
            is_local,
            mode: PlayMode::Normal,
        }
    }

    struct FixedRoom {
        local: Option<ActorId>,
        master: Option<ActorId>,
    }

    impl RoomProvider for FixedRoom {
        fn participants(&self) -> Vec<Member> {
            Vec::new()
        }

        fn local_actor(&self) -> Option<ActorId> {
            self.local
        }

        fn master(&self) -> Option<ActorId> {
            self.master
        }

        fn is_in_session(&self) -> bool {
            true
        }

        fn expected_real_players(&self) -> usize {
            4
        }
    }

    #[test]
    fn positions_are_unique() {
        let mut ctx = SessionContext::new();
        assert!(ctx.register(participant(1, 1, true)).unwrap());
        assert!(!ctx.register(participant(1, 1, true)).unwrap());
        assert!(matches!(
            ctx.register(participant(2, 1, false)),
            Err(BattleError::DuplicatePosition(1))
        ));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn teams_resolve_from_master_and_local() {
        let mut ctx = SessionContext::new();
        ctx.register(participant(7, 4, false)).unwrap();
        ctx.register(participant(3, 1, false)).unwrap();
        ctx.register(participant(5, 2, true)).unwrap();
        assert!(matches!(ctx.home_team(), Err(BattleError::TeamsNotResolved)));

        ctx.resolve_teams(Some(7));
        assert_eq!(ctx.home_team().unwrap(), Some(Team::Red));
        assert_eq!(ctx.local_team().unwrap(), Some(Team::Blue));
        assert_eq!(ctx.teammate(5).map(|p| p.actor), Some(3));
        assert!(ctx.teammate(7).is_none());

        let blue: Vec<_> = ctx.team_members(Team::Blue).iter().map(|p| p.actor).collect();
        assert_eq!(blue, vec![3, 5]);
    }

    #[test]
    fn remove_frees_the_slot() {
        let mut ctx = SessionContext::new();
        ctx.register(participant(1, 3, false)).unwrap();
        assert_eq!(ctx.remove(1).map(|p| p.actor), Some(1));
        assert!(ctx.remove(1).is_none());
        assert!(ctx.register(participant(2, 3, false)).unwrap());
    }

    #[test]
    fn scores_accumulate_per_team() {
        let mut ctx = SessionContext::new();
        assert_eq!(ctx.add_score(Team::Red), 1);
        assert_eq!(ctx.add_score(Team::Red), 2);
        assert_eq!(ctx.score(Team::Blue), 0);
    }

    #[test]
    fn gate_follows_master() {
        let master = AuthorityGate::new(Arc::new(FixedRoom {
            local: Some(1),
            master: Some(1),
        }));
        let other = AuthorityGate::new(Arc::new(FixedRoom {
            local: Some(2),
            master: Some(1),
        }));
        let observer = AuthorityGate::new(Arc::new(FixedRoom {
            local: None,
            master: Some(1),
        }));
        assert!(master.require("test"));
        assert!(!other.require("test"));
        assert!(!observer.is_authority());
    }
}
