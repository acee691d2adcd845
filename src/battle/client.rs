//! Per-process battle runtime
//!
//! A `BattleClient` owns one replica of the session: it registers the
//! roster, counts ready reports, applies every broadcast in room order and,
//! when it is the authority, originates the countdown, mode changes and the
//! ball launch.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::arena::HeadlessArena;
use super::character::DefenceCatalog;
use super::countdown::{
    CountdownTick, CountdownTicker, HandshakeCoordinator, HandshakePhase, Reporter,
};
use super::error::BattleError;
use super::geometry::Vec2;
use super::line::CenterLineConnector;
use super::mode::PlayMode;
use super::ports::{
    Arena, Broadcaster, CharacterCatalog, LineMember, Member, RoomProvider, TeamLineConnector,
};
use super::position::{Slot, Team};
use super::session::{AuthorityGate, Participant, SessionContext};
use super::slingshot::{select_launch, LaunchAim, SlingShot};
use super::ActorId;
use crate::config::BattleConfig;
use crate::room::RoomEvent;
use crate::ws::protocol::BattleMsg;

/// One replica of a battle session
pub struct BattleClient<A: Arena = HeadlessArena> {
    config: BattleConfig,
    room: Arc<dyn RoomProvider>,
    outbox: Arc<dyn Broadcaster>,
    gate: AuthorityGate,
    ctx: SessionContext,
    handshake: HandshakeCoordinator,
    ticker: Option<CountdownTicker>,
    slingshots: Vec<SlingShot>,
    line: Option<Box<dyn TeamLineConnector>>,
    catalog: Arc<dyn CharacterCatalog>,
    arena: A,
    announced: bool,
}

impl<A: Arena> BattleClient<A> {
    /// Create a client on top of a room link that is both the room provider
    /// and the broadcast channel.
    pub fn new<L>(config: BattleConfig, link: Arc<L>, arena: A) -> Self
    where
        L: RoomProvider + Broadcaster + 'static,
    {
        let room: Arc<dyn RoomProvider> = link.clone();
        let outbox: Arc<dyn Broadcaster> = link;
        let handshake = HandshakeCoordinator::new(room.expected_real_players());
        Self {
            config,
            gate: AuthorityGate::new(room.clone()),
            room,
            outbox,
            ctx: SessionContext::new(),
            handshake,
            ticker: None,
            slingshots: Vec::new(),
            line: Some(Box::new(CenterLineConnector::new())),
            catalog: Arc::new(DefenceCatalog),
            arena,
            announced: false,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CharacterCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_line_connector(mut self, line: Box<dyn TeamLineConnector>) -> Self {
        self.line = Some(line);
        self
    }

    pub fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn phase(&self) -> HandshakePhase {
        self.handshake.phase()
    }

    pub fn arena(&self) -> &A {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut A {
        &mut self.arena
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn is_authority(&self) -> bool {
        self.gate.is_authority()
    }

    pub fn is_in_session(&self) -> bool {
        self.room.is_in_session()
    }

    /// Handle a room membership or broadcast event
    pub fn handle(&mut self, event: RoomEvent) -> Result<(), BattleError> {
        match event {
            RoomEvent::Joined { member } => {
                self.register_member(&member)?;
            }
            RoomEvent::Left { actor } => {
                if self.ctx.remove(actor).is_some() {
                    info!(actor, "Player left the battle");
                    self.end_game();
                }
            }
            RoomEvent::MasterChanged { actor } => {
                info!(master = ?actor, local = ?self.room.local_actor(), "Master changed");
                self.take_over_countdown();
            }
            RoomEvent::Battle { from, msg } => {
                debug!(from, ?msg, "Battle message");
                self.apply(msg)?;
            }
            RoomEvent::Closed { reason } => {
                info!(%reason, "Room closed");
                self.ticker = None;
                self.handshake.abandon();
            }
        }
        Ok(())
    }

    /// Apply one broadcast message to this replica
    pub fn apply(&mut self, msg: BattleMsg) -> Result<(), BattleError> {
        match msg {
            BattleMsg::ActorReady { actor } => {
                if self.handshake.report(Reporter::Player(actor)) {
                    self.on_counting_started()?;
                }
            }
            BattleMsg::Moved { actor, position } => {
                self.arena.set_position(actor, position);
            }
            BattleMsg::SetMode { actor, mode } => {
                let Some(participant) = self.ctx.get_mut(actor) else {
                    warn!(actor, ?mode, "Mode change for unknown participant");
                    return Ok(());
                };
                let resolved = PlayMode::resolve(participant.mode, mode);
                if resolved != mode {
                    debug!(actor, ?mode, ?resolved, "Mode change intercepted");
                }
                participant.mode = resolved;
                self.arena.show_player_mode(actor, resolved.effects());
            }
            BattleMsg::Countdown { current, max } => {
                self.arena.show_countdown(current, max);
                if self.handshake.observe_tick(CountdownTick { current, max }) {
                    self.on_countdown_finished();
                }
            }
            BattleMsg::HideBall => {
                self.arena.hide_ball();
            }
            BattleMsg::LaunchBall {
                team,
                position,
                velocity,
            } => {
                self.arena.teleport_ball(position, Some(team));
                self.arena.show_ball();
                self.arena.move_ball(velocity);
                info!(?team, ?position, ?velocity, "Ball launched");
            }
            BattleMsg::HideSlingShot => {
                self.hide_sling_shots();
            }
            BattleMsg::HeadCollision { actor } => {
                let Some(participant) = self.ctx.get(actor) else {
                    warn!(actor, "Head collision for unknown participant");
                    return Ok(());
                };
                let team = participant.team();
                let scoring = team.opposite();
                let restart_at = self
                    .arena
                    .position(actor)
                    .unwrap_or_else(|| self.config.start_position(participant.position));
                let score = self.ctx.add_score(scoring);
                self.arena.show_score(scoring, score);
                self.arena.restart_ball_for(restart_at, team);
                info!(actor, ?scoring, score, "Head collision");
            }
        }
        Ok(())
    }

    /// Advance the session by `dt` seconds of simulated time
    pub fn tick(&mut self, dt: f32) -> Result<(), BattleError> {
        if !self.room.is_in_session() {
            self.ticker = None;
            self.handshake.abandon();
            return Ok(());
        }

        let mut started_now = false;
        if self.handshake.is_waiting() {
            self.sync_roster()?;
            if !self.announced {
                self.announced = true;
                // Guests and spectators watch but never count as ready
                if let Some(actor) = self.ctx.local().map(|p| p.actor) {
                    self.outbox.broadcast(BattleMsg::ActorReady { actor });
                }
                if self.handshake.report(Reporter::Manager) {
                    self.on_counting_started()?;
                    started_now = true;
                }
            }
        }

        // A ticker created this frame has already sent its first value
        if let Some(ticker) = self.ticker.as_mut().filter(|_| !started_now) {
            if self.gate.is_authority() {
                let max = ticker.max();
                for current in ticker.advance(dt) {
                    self.outbox.broadcast(BattleMsg::Countdown { current, max });
                }
            } else {
                debug!("Lost authority, countdown ticker dropped");
                self.ticker = None;
            }
        }

        for shot in &mut self.slingshots {
            shot.update(&self.arena);
        }
        Ok(())
    }

    /// Authority command: change a participant's mode on every replica
    pub fn set_mode(&mut self, actor: ActorId, mode: PlayMode) -> Result<(), BattleError> {
        if !self.gate.require("set_mode") {
            return Ok(());
        }
        if self.ctx.get(actor).is_none() {
            return Err(BattleError::UnknownParticipant(actor));
        }
        self.outbox.broadcast(BattleMsg::SetMode { actor, mode });
        Ok(())
    }

    /// Authority command: the ball hit a participant's head
    pub fn head_collision(&mut self, actor: ActorId) -> Result<(), BattleError> {
        if !self.gate.require("head_collision") {
            return Ok(());
        }
        if self.ctx.get(actor).is_none() {
            return Err(BattleError::UnknownParticipant(actor));
        }
        self.outbox.broadcast(BattleMsg::HeadCollision { actor });
        Ok(())
    }

    /// Authority command: the ball moved to `team`'s side of the arena.
    ///
    /// That team's members freeze unless they are ghosted; everyone else
    /// plays normally.
    pub fn set_active_team(&mut self, team: Team) {
        if !self.gate.require("set_active_team") {
            return;
        }
        for participant in self.ctx.participants() {
            let mode = if participant.team() == team && participant.mode != PlayMode::Ghosted {
                PlayMode::Frozen
            } else {
                PlayMode::Normal
            };
            self.outbox.broadcast(BattleMsg::SetMode {
                actor: participant.actor,
                mode,
            });
        }
    }

    /// Authority command: launch the ball from the most ready sling shot
    pub fn start_the_ball(&mut self) {
        if !self.gate.require("start_the_ball") {
            return;
        }
        for shot in &mut self.slingshots {
            shot.update(&self.arena);
        }
        let aims: Vec<LaunchAim> = self
            .slingshots
            .iter()
            .filter_map(|shot| shot.aim().copied())
            .collect();
        let Some(selected) = select_launch(&aims) else {
            debug!("No sling shot can launch the ball");
            return;
        };
        let aim = aims[selected];

        for participant in self.ctx.participants() {
            let mode = if participant.team() == aim.team {
                PlayMode::Special
            } else {
                PlayMode::Normal
            };
            self.outbox.broadcast(BattleMsg::SetMode {
                actor: participant.actor,
                mode,
            });
        }
        self.outbox.broadcast(BattleMsg::LaunchBall {
            team: aim.team,
            position: aim.b,
            velocity: aim.launch_velocity(self.config.ball_speed_multiplier),
        });
        self.outbox.broadcast(BattleMsg::HideSlingShot);
        info!(
            team = ?aim.team,
            readiness = aim.readiness(),
            "Starting the ball"
        );
    }

    /// Move the local participant and publish its new position
    pub fn move_local(&mut self, direction: Vec2, dt: f32) -> Result<(), BattleError> {
        let Some(local) = self.ctx.local() else {
            return Ok(());
        };
        if !local.mode.effects().can_move {
            return Ok(());
        }
        let actor = local.actor;
        let speed = self.catalog.stats(local.skill).speed;
        let area = self.config.play_area(local.team());
        let current = self
            .arena
            .position(actor)
            .unwrap_or_else(|| self.config.start_position(local.position));
        let position = area.restrict(current + direction.normalized() * (speed * dt));
        if position == current {
            return Ok(());
        }
        self.arena.set_position(actor, position);
        self.outbox.broadcast(BattleMsg::Moved { actor, position });
        Ok(())
    }

    fn sync_roster(&mut self) -> Result<(), BattleError> {
        for member in self.room.participants() {
            self.register_member(&member)?;
        }
        Ok(())
    }

    fn register_member(&mut self, member: &Member) -> Result<(), BattleError> {
        let Slot::Player(position) = Slot::classify(member.position)? else {
            return Ok(());
        };
        let participant = Participant {
            actor: member.actor,
            name: member.name.clone(),
            position,
            skill: member.skill,
            is_local: self.room.local_actor() == Some(member.actor),
            mode: self.config.initial_mode,
        };
        if self.ctx.register(participant)? {
            self.arena
                .show_player_mode(member.actor, self.config.initial_mode.effects());
            if self.arena.position(member.actor).is_none() {
                let start = self.config.start_position(position);
                self.arena.set_position(member.actor, start);
            }
        }
        Ok(())
    }

    fn on_counting_started(&mut self) -> Result<(), BattleError> {
        self.sync_roster()?;
        self.ctx.resolve_teams(self.room.master());

        let members: Vec<LineMember> = self
            .ctx
            .participants()
            .map(|p| LineMember {
                actor: p.actor,
                team: p.team(),
                attack: self.catalog.stats(p.skill).attack,
            })
            .collect();
        if let Some(line) = self.line.as_mut() {
            line.connect(self.room.local_actor(), &members);
        }
        self.arm_sling_shots();

        if self.gate.is_authority() {
            self.outbox.broadcast(BattleMsg::HideBall);
            for participant in self.ctx.participants() {
                self.outbox.broadcast(BattleMsg::SetMode {
                    actor: participant.actor,
                    mode: self.config.initial_mode,
                });
            }
            let mut ticker =
                CountdownTicker::new(self.config.countdown_start, self.config.countdown_interval);
            let max = ticker.max();
            for current in ticker.advance(0.0) {
                self.outbox.broadcast(BattleMsg::Countdown { current, max });
            }
            self.ticker = Some(ticker);
        }
        Ok(())
    }

    fn on_countdown_finished(&mut self) {
        let seed = self.line.take().and_then(|mut line| {
            let seed = line.nearest(&self.arena);
            line.hide();
            seed
        });
        self.handshake.finish(seed);
        self.ticker = None;
        info!(seed = ?seed, "Countdown finished");

        if self.gate.is_authority() {
            self.start_the_ball();
        }
    }

    fn arm_sling_shots(&mut self) {
        self.slingshots.clear();
        for team in Team::ALL {
            let members = self.ctx.team_members(team);
            let config = &self.config;
            let Some(mut shot) = SlingShot::arm(
                team,
                &members,
                self.catalog.as_ref(),
                config.sling_distance(),
                |position| config.start_position(position),
            ) else {
                continue;
            };
            shot.update(&self.arena);
            self.arena.show_sling_shot(team, true);
            self.slingshots.push(shot);
        }
        debug!(armed = self.slingshots.len(), "Sling shots armed");
    }

    fn hide_sling_shots(&mut self) {
        for shot in self.slingshots.drain(..) {
            self.arena.show_sling_shot(shot.team(), false);
        }
    }

    /// A new authority picks up a countdown the previous one left running
    fn take_over_countdown(&mut self) {
        if self.ticker.is_some() || !self.gate.is_authority() {
            return;
        }
        let HandshakePhase::Counting { last } = self.handshake.phase() else {
            return;
        };
        let interval = self.config.countdown_interval;
        let ticker = match last {
            Some(tick) => CountdownTicker::resume(tick.current - 1, tick.max, interval),
            None => CountdownTicker::new(self.config.countdown_start, interval),
        };
        info!(last = ?last, "Taking over the countdown");
        self.ticker = Some(ticker);
    }

    fn end_game(&mut self) {
        self.ctx.set_game_over();
        self.hide_sling_shots();
        self.ticker = None;
        self.handshake.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::mode::PlayerVisual;
    use crate::battle::ports::Transforms;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Loopback {
        members: Vec<Member>,
        local: Option<ActorId>,
        master: Option<ActorId>,
        expected: usize,
        in_session: AtomicBool,
        sent: Mutex<Vec<BattleMsg>>,
    }

    impl Loopback {
        fn new(members: Vec<Member>, local: Option<ActorId>, master: Option<ActorId>) -> Arc<Self> {
            Arc::new(Self {
                expected: members.len(),
                members,
                local,
                master,
                in_session: AtomicBool::new(true),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn drain(&self) -> Vec<BattleMsg> {
            std::mem::take(&mut *self.sent.lock())
        }
    }

    impl RoomProvider for Loopback {
        fn participants(&self) -> Vec<Member> {
            self.members.clone()
        }

        fn local_actor(&self) -> Option<ActorId> {
            self.local
        }

        fn master(&self) -> Option<ActorId> {
            self.master
        }

        fn is_in_session(&self) -> bool {
            self.in_session.load(Ordering::SeqCst)
        }

        fn expected_real_players(&self) -> usize {
            self.expected
        }
    }

    impl Broadcaster for Loopback {
        fn broadcast(&self, msg: BattleMsg) {
            self.sent.lock().push(msg);
        }
    }

    fn member(actor: ActorId, position: i32) -> Member {
        Member {
            actor,
            name: format!("player-{actor}"),
            position,
            skill: 2,
        }
    }

    fn deliver(client: &mut BattleClient, link: &Loopback) {
        loop {
            let batch = link.drain();
            if batch.is_empty() {
                break;
            }
            for msg in batch {
                client.apply(msg).unwrap();
            }
        }
    }

    #[test]
    fn lone_authority_counts_down_and_launches() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());

        client.tick(0.0).unwrap();
        assert_eq!(link.drain(), vec![BattleMsg::ActorReady { actor: 1 }]);
        client.apply(BattleMsg::ActorReady { actor: 1 }).unwrap();
        assert_eq!(
            link.drain(),
            vec![
                BattleMsg::HideBall,
                BattleMsg::SetMode {
                    actor: 1,
                    mode: PlayMode::Normal
                },
                BattleMsg::Countdown { current: 3, max: 3 },
            ]
        );
        client.apply(BattleMsg::Countdown { current: 3, max: 3 }).unwrap();
        assert!(client.arena().sling_shot_visible(Team::Blue));
        assert!(!client.arena().sling_shot_visible(Team::Red));

        for _ in 0..20 {
            client.tick(0.25).unwrap();
            deliver(&mut client, &link);
        }

        match client.phase() {
            HandshakePhase::Ready { seed } => assert_eq!(seed.map(|s| s.actor), Some(1)),
            other => panic!("unexpected phase {other:?}"),
        }
        let ball = client.arena().ball();
        assert!(ball.visible);
        assert_eq!(ball.team, Some(Team::Blue));
        assert_eq!(ball.position, Vec2::new(2.5, -6.0));
        assert_eq!(ball.velocity, Vec2::new(5.0, 0.0));
        assert_eq!(client.ctx().get(1).map(|p| p.mode), Some(PlayMode::Special));
        assert!(!client.arena().sling_shot_visible(Team::Blue));
        assert_eq!(client.arena().countdown(), Some((-1, 3)));
    }

    #[test]
    fn countdown_started_on_a_frame_waits_a_full_interval() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.apply(BattleMsg::ActorReady { actor: 1 }).unwrap();
        assert!(link.drain().is_empty());

        // The manager report completes the handshake inside this frame
        client.tick(1.0).unwrap();
        let countdowns: Vec<BattleMsg> = link
            .drain()
            .into_iter()
            .filter(|msg| matches!(msg, BattleMsg::Countdown { .. }))
            .collect();
        assert_eq!(countdowns, vec![BattleMsg::Countdown { current: 3, max: 3 }]);

        client.tick(0.5).unwrap();
        assert!(link.drain().is_empty());
        client.tick(0.5).unwrap();
        assert_eq!(link.drain(), vec![BattleMsg::Countdown { current: 2, max: 3 }]);
    }

    #[test]
    fn configured_initial_mode_is_broadcast_before_the_launch() {
        let config = BattleConfig {
            initial_mode: PlayMode::Ghosted,
            ..BattleConfig::default()
        };
        let link = Loopback::new(
            vec![member(1, 1), member(2, 2), member(3, 3)],
            Some(1),
            Some(1),
        );
        let mut client = BattleClient::new(config, link.clone(), HeadlessArena::new());

        client.tick(0.0).unwrap();
        for actor in [1, 2, 3] {
            assert_eq!(client.ctx().get(actor).map(|p| p.mode), Some(PlayMode::Ghosted));
            let effects = client.arena().player_effects(actor).unwrap();
            assert!(!effects.collision);
            assert_eq!(effects.visual, PlayerVisual::Ghost);
        }
        assert_eq!(link.drain(), vec![BattleMsg::ActorReady { actor: 1 }]);

        for actor in [1, 2, 3] {
            client.apply(BattleMsg::ActorReady { actor }).unwrap();
        }
        let sent = link.drain();
        let initial: Vec<BattleMsg> = sent
            .iter()
            .filter(|msg| matches!(msg, BattleMsg::SetMode { .. }))
            .cloned()
            .collect();
        let expected: Vec<BattleMsg> = [1, 2, 3]
            .into_iter()
            .map(|actor| BattleMsg::SetMode {
                actor,
                mode: PlayMode::Ghosted,
            })
            .collect();
        assert_eq!(initial, expected);
        for msg in sent {
            client.apply(msg).unwrap();
        }

        for _ in 0..20 {
            client.tick(0.25).unwrap();
            deliver(&mut client, &link);
        }

        assert!(matches!(client.phase(), HandshakePhase::Ready { .. }));
        assert!(client.arena().ball().visible);
        // Blue has two members against red's one and wins the launch
        assert_eq!(client.arena().ball().team, Some(Team::Blue));
        assert_eq!(client.ctx().get(1).map(|p| p.mode), Some(PlayMode::Special));
        assert_eq!(client.ctx().get(2).map(|p| p.mode), Some(PlayMode::Special));
        assert_eq!(client.ctx().get(3).map(|p| p.mode), Some(PlayMode::Normal));
        let effects = client.arena().player_effects(3).unwrap();
        assert!(effects.collision);
        assert!(effects.can_move);
    }

    #[test]
    fn non_authority_commands_are_no_ops() {
        let link = Loopback::new(vec![member(1, 1), member(2, 3)], Some(2), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        link.drain();

        client.set_mode(1, PlayMode::Frozen).unwrap();
        client.head_collision(1).unwrap();
        client.set_active_team(Team::Blue);
        client.start_the_ball();
        assert!(link.drain().is_empty());
    }

    #[test]
    fn authority_rejects_unknown_participants() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        assert!(matches!(
            client.set_mode(9, PlayMode::Frozen),
            Err(BattleError::UnknownParticipant(9))
        ));
    }

    #[test]
    fn special_is_not_frozen() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link, HeadlessArena::new());
        client.tick(0.0).unwrap();

        client
            .apply(BattleMsg::SetMode {
                actor: 1,
                mode: PlayMode::Special,
            })
            .unwrap();
        client
            .apply(BattleMsg::SetMode {
                actor: 1,
                mode: PlayMode::Frozen,
            })
            .unwrap();
        assert_eq!(client.ctx().get(1).map(|p| p.mode), Some(PlayMode::Special));
        let effects = client.arena().player_effects(1).unwrap();
        assert_eq!(effects.visual, PlayerVisual::Ghost);
        assert!(!effects.collision);

        client
            .apply(BattleMsg::SetMode {
                actor: 1,
                mode: PlayMode::Normal,
            })
            .unwrap();
        assert_eq!(client.ctx().get(1).map(|p| p.mode), Some(PlayMode::Normal));
    }

    #[test]
    fn head_collision_scores_for_the_other_team() {
        let link = Loopback::new(vec![member(1, 1), member(3, 3)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link, HeadlessArena::new());
        client.tick(0.0).unwrap();

        client.apply(BattleMsg::HeadCollision { actor: 3 }).unwrap();
        assert_eq!(client.ctx().score(Team::Blue), 1);
        assert_eq!(client.arena().score(Team::Blue), 1);
        let ball = client.arena().ball();
        assert_eq!(ball.position, Vec2::new(-2.5, 6.0));
        assert_eq!(ball.team, Some(Team::Red));
    }

    #[test]
    fn active_team_freezes_its_members_unless_ghosted() {
        let link = Loopback::new(
            vec![member(1, 1), member(2, 2), member(3, 3)],
            Some(1),
            Some(1),
        );
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        link.drain();
        client
            .apply(BattleMsg::SetMode {
                actor: 2,
                mode: PlayMode::Ghosted,
            })
            .unwrap();

        client.set_active_team(Team::Blue);
        assert_eq!(
            link.drain(),
            vec![
                BattleMsg::SetMode {
                    actor: 1,
                    mode: PlayMode::Frozen
                },
                BattleMsg::SetMode {
                    actor: 2,
                    mode: PlayMode::Normal
                },
                BattleMsg::SetMode {
                    actor: 3,
                    mode: PlayMode::Normal
                },
            ]
        );
    }

    #[test]
    fn leaving_player_ends_the_game() {
        let link = Loopback::new(vec![member(1, 1), member(3, 3)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        client.apply(BattleMsg::ActorReady { actor: 1 }).unwrap();
        client.apply(BattleMsg::ActorReady { actor: 3 }).unwrap();
        assert!(client.arena().sling_shot_visible(Team::Red));

        client.handle(RoomEvent::Left { actor: 3 }).unwrap();
        assert!(client.ctx().is_game_over());
        assert_eq!(client.phase(), HandshakePhase::Abandoned);
        assert!(!client.arena().sling_shot_visible(Team::Blue));
        assert!(!client.arena().sling_shot_visible(Team::Red));
    }

    #[test]
    fn disconnect_abandons_without_broadcasting() {
        let link = Loopback::new(vec![member(1, 1), member(3, 3)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        client.apply(BattleMsg::ActorReady { actor: 1 }).unwrap();
        client.apply(BattleMsg::ActorReady { actor: 3 }).unwrap();
        link.drain();

        link.in_session.store(false, Ordering::SeqCst);
        client.tick(5.0).unwrap();
        assert_eq!(client.phase(), HandshakePhase::Abandoned);
        assert!(link.drain().is_empty());
    }

    #[test]
    fn frozen_players_cannot_move() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link.clone(), HeadlessArena::new());
        client.tick(0.0).unwrap();
        link.drain();

        client.move_local(Vec2::new(0.0, 1.0), 0.5).unwrap();
        let moved = link.drain();
        assert_eq!(moved.len(), 1);
        assert!(matches!(moved[0], BattleMsg::Moved { actor: 1, .. }));

        client
            .apply(BattleMsg::SetMode {
                actor: 1,
                mode: PlayMode::Frozen,
            })
            .unwrap();
        client.move_local(Vec2::new(0.0, 1.0), 0.5).unwrap();
        assert!(link.drain().is_empty());
    }

    #[test]
    fn movement_stays_on_the_own_half() {
        let link = Loopback::new(vec![member(1, 1)], Some(1), Some(1));
        let mut client = BattleClient::new(BattleConfig::default(), link, HeadlessArena::new());
        client.tick(0.0).unwrap();
        client.move_local(Vec2::new(0.0, 1.0), 100.0).unwrap();
        let position = client.arena().position(1).unwrap();
        assert_eq!(position.y, 0.0);
    }
}
