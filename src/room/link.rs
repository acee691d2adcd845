//! Room side implementations of the battle ports

use std::sync::Arc;
use tracing::{debug, warn};

use crate::battle::ports::{Broadcaster, Member, RoomProvider};
use crate::battle::ActorId;
use crate::ws::protocol::BattleMsg;

use super::hub::RoomHub;

/// A member's connection to a room
pub struct RoomLink {
    hub: Arc<RoomHub>,
    actor: ActorId,
}

impl RoomLink {
    pub fn new(hub: Arc<RoomHub>, actor: ActorId) -> Self {
        Self { hub, actor }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Leave the room; the link is out of session afterwards
    pub fn leave(&self) {
        if let Err(e) = self.hub.leave(self.actor) {
            debug!(actor = self.actor, error = %e, "Leave ignored");
        }
    }
}

impl RoomProvider for RoomLink {
    fn participants(&self) -> Vec<Member> {
        self.hub.members()
    }

    fn local_actor(&self) -> Option<ActorId> {
        Some(self.actor)
    }

    fn master(&self) -> Option<ActorId> {
        self.hub.master()
    }

    fn is_in_session(&self) -> bool {
        !self.hub.is_closed() && self.hub.is_member(self.actor)
    }

    fn expected_real_players(&self) -> usize {
        self.hub.expected_players()
    }
}

impl Broadcaster for RoomLink {
    fn broadcast(&self, msg: BattleMsg) {
        if let Err(e) = self.hub.publish(self.actor, msg) {
            warn!(room_id = %self.hub.id(), actor = self.actor, error = %e, "Broadcast rejected");
        }
    }
}

/// Read-only view of a room for the server side replica
pub struct ObserverLink {
    hub: Arc<RoomHub>,
}

impl ObserverLink {
    pub fn new(hub: Arc<RoomHub>) -> Self {
        Self { hub }
    }
}

impl RoomProvider for ObserverLink {
    fn participants(&self) -> Vec<Member> {
        self.hub.members()
    }

    fn local_actor(&self) -> Option<ActorId> {
        None
    }

    fn master(&self) -> Option<ActorId> {
        self.hub.master()
    }

    fn is_in_session(&self) -> bool {
        !self.hub.is_closed()
    }

    fn expected_real_players(&self) -> usize {
        self.hub.expected_players()
    }
}

impl Broadcaster for ObserverLink {
    fn broadcast(&self, msg: BattleMsg) {
        debug!(room_id = %self.hub.id(), ?msg, "Observer cannot broadcast");
    }
}
