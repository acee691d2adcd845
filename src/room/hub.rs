//! In-process room: membership, master election and ordered broadcast

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::battle::ports::Member;
use crate::battle::position::{is_real_player, Slot};
use crate::battle::ActorId;
use crate::ws::protocol::BattleMsg;

/// Largest number of real players a room can be set up for
pub const MAX_PLAYERS: usize = 4;

/// Room event buffer per subscriber
const EVENT_CAPACITY: usize = 256;

/// Everything that happens in a room, in the single order all members see
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Joined { member: Member },
    Left { actor: ActorId },
    MasterChanged { actor: Option<ActorId> },
    Battle { from: ActorId, msg: BattleMsg },
    Closed { reason: String },
}

/// Room errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    #[error("room is full")]
    RoomFull,

    #[error("position {0} is already taken")]
    SlotTaken(u8),

    #[error("invalid position: {0}")]
    InvalidPosition(i32),

    #[error("expected players must be between 1 and 4, got {0}")]
    InvalidCapacity(usize),

    #[error("actor {0} is not the room master")]
    NotAuthority(ActorId),

    #[error("actor {from} cannot speak for actor {actor}")]
    NotOwnActor { from: ActorId, actor: ActorId },

    #[error("actor {0} is not a member of the room")]
    NotMember(ActorId),

    #[error("room is closed")]
    Closed,
}

impl RoomError {
    /// Stable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomFull => "room_full",
            RoomError::SlotTaken(_) => "slot_taken",
            RoomError::InvalidPosition(_) => "invalid_position",
            RoomError::InvalidCapacity(_) => "invalid_capacity",
            RoomError::NotAuthority(_) => "not_authority",
            RoomError::NotOwnActor { .. } => "not_own_actor",
            RoomError::NotMember(_) => "not_member",
            RoomError::Closed => "room_closed",
        }
    }
}

/// A member's view of the room stream: events that happened before it
/// subscribed and must be replayed, then the live channel.
pub struct RoomSubscription {
    backlog: VecDeque<RoomEvent>,
    rx: broadcast::Receiver<RoomEvent>,
}

impl RoomSubscription {
    /// Next event, replayed ones first
    pub async fn recv(&mut self) -> Result<RoomEvent, RecvError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(event);
        }
        self.rx.recv().await
    }

    /// Next event if one is already available
    pub fn try_recv(&mut self) -> Result<RoomEvent, TryRecvError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(event);
        }
        self.rx.try_recv()
    }
}

struct HubState {
    members: Vec<Member>,
    master: Option<ActorId>,
    next_actor: ActorId,
    /// `ActorReady` events, replayed to late joiners
    ready: Vec<RoomEvent>,
    /// Set while nobody has joined yet
    idle_since: Option<Instant>,
    closed: bool,
}

/// Room hub.
///
/// Every mutation happens under one lock and is sent on one broadcast
/// channel, so all subscribers observe a single total order.
pub struct RoomHub {
    id: Uuid,
    expected_players: usize,
    state: Mutex<HubState>,
    events: broadcast::Sender<RoomEvent>,
}

impl RoomHub {
    pub fn new(id: Uuid, expected_players: usize) -> Result<Self, RoomError> {
        if !(1..=MAX_PLAYERS).contains(&expected_players) {
            return Err(RoomError::InvalidCapacity(expected_players));
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            id,
            expected_players,
            state: Mutex::new(HubState {
                members: Vec::new(),
                master: None,
                next_actor: 1,
                ready: Vec::new(),
                idle_since: Some(Instant::now()),
                closed: false,
            }),
            events,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn expected_players(&self) -> usize {
        self.expected_players
    }

    /// Join with a raw position: 1..4 player slot, 0 guest, 11 spectator
    pub fn join(
        &self,
        name: impl Into<String>,
        position: i32,
        skill: i32,
    ) -> Result<(Member, RoomSubscription), RoomError> {
        let slot = Slot::classify(position).map_err(|_| RoomError::InvalidPosition(position))?;

        let mut state = self.state.lock();
        if state.closed {
            return Err(RoomError::Closed);
        }
        if let Slot::Player(pos) = slot {
            if state.members.iter().any(|m| m.position == position) {
                return Err(RoomError::SlotTaken(pos.get()));
            }
            let players = state
                .members
                .iter()
                .filter(|m| matches!(Slot::classify(m.position), Ok(Slot::Player(_))))
                .count();
            if players >= self.expected_players {
                return Err(RoomError::RoomFull);
            }
        }

        let member = Member {
            actor: state.next_actor,
            name: name.into(),
            position,
            skill,
        };
        state.next_actor += 1;

        let subscription = RoomSubscription {
            backlog: state.ready.iter().cloned().collect(),
            rx: self.events.subscribe(),
        };
        state.members.push(member.clone());
        state.idle_since = None;
        self.send(RoomEvent::Joined {
            member: member.clone(),
        });
        if state.master.is_none() {
            state.master = Some(member.actor);
            self.send(RoomEvent::MasterChanged {
                actor: state.master,
            });
        }
        info!(
            room_id = %self.id,
            actor = member.actor,
            position,
            members = state.members.len(),
            "Member joined"
        );
        Ok((member, subscription))
    }

    /// Subscribe without becoming a member
    pub fn observe(&self) -> RoomSubscription {
        let state = self.state.lock();
        RoomSubscription {
            backlog: state.ready.iter().cloned().collect(),
            rx: self.events.subscribe(),
        }
    }

    /// Remove a member; re-elects the lowest actor if the master left and
    /// closes the room once it is empty.
    pub fn leave(&self, actor: ActorId) -> Result<(), RoomError> {
        let mut state = self.state.lock();
        let Some(idx) = state.members.iter().position(|m| m.actor == actor) else {
            return Err(RoomError::NotMember(actor));
        };
        state.members.remove(idx);
        state.ready.retain(|event| {
            !matches!(event, RoomEvent::Battle { from, .. } if *from == actor)
        });
        self.send(RoomEvent::Left { actor });
        info!(room_id = %self.id, actor, members = state.members.len(), "Member left");

        if state.master == Some(actor) {
            state.master = state.members.iter().map(|m| m.actor).min();
            info!(room_id = %self.id, master = ?state.master, "Master re-elected");
            self.send(RoomEvent::MasterChanged {
                actor: state.master,
            });
        }
        if state.members.is_empty() {
            Self::close_locked(&mut state, &self.events, self.id, "room is empty");
        }
        Ok(())
    }

    /// Relay a battle message from `from` to every subscriber
    pub fn publish(&self, from: ActorId, msg: BattleMsg) -> Result<(), RoomError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RoomError::Closed);
        }
        let Some(sender) = state.members.iter().find(|m| m.actor == from) else {
            return Err(RoomError::NotMember(from));
        };
        if matches!(msg, BattleMsg::ActorReady { .. }) && !is_real_player(sender.position) {
            return Err(RoomError::InvalidPosition(sender.position));
        }
        if msg.is_authority_only() && state.master != Some(from) {
            warn!(room_id = %self.id, from, ?msg, "Dropping authority message from non-master");
            return Err(RoomError::NotAuthority(from));
        }
        if let Some(actor) = msg.own_actor() {
            if actor != from {
                warn!(room_id = %self.id, from, actor, "Dropping message for another actor");
                return Err(RoomError::NotOwnActor { from, actor });
            }
        }

        let event = RoomEvent::Battle { from, msg };
        if let RoomEvent::Battle {
            msg: BattleMsg::ActorReady { .. },
            ..
        } = &event
        {
            if state.ready.contains(&event) {
                debug!(room_id = %self.id, from, "Duplicate ready ignored");
                return Ok(());
            }
            state.ready.push(event.clone());
        }
        self.send(event);
        Ok(())
    }

    pub fn close(&self, reason: &str) {
        let mut state = self.state.lock();
        Self::close_locked(&mut state, &self.events, self.id, reason);
    }

    pub fn master(&self) -> Option<ActorId> {
        self.state.lock().master
    }

    pub fn members(&self) -> Vec<Member> {
        self.state.lock().members.clone()
    }

    pub fn is_member(&self, actor: ActorId) -> bool {
        self.state.lock().members.iter().any(|m| m.actor == actor)
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    /// How long an open room has been waiting for its first member
    pub fn idle_for(&self) -> Option<Duration> {
        let state = self.state.lock();
        if state.closed {
            return None;
        }
        state.idle_since.map(|since| since.elapsed())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn send(&self, event: RoomEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn close_locked(
        state: &mut HubState,
        events: &broadcast::Sender<RoomEvent>,
        id: Uuid,
        reason: &str,
    ) {
        if state.closed {
            return;
        }
        state.closed = true;
        info!(room_id = %id, reason, "Room closed");
        let _ = events.send(RoomEvent::Closed {
            reason: reason.to_string(),
        });
    }
}
