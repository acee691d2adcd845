//! Handshake before gameplay: actor reports, replicated countdown, launch seed

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use super::ports::NearestPlayer;
use super::ActorId;

/// Slack for accumulated frame deltas that land just short of an interval
const TICK_EPSILON: f32 = 1e-4;

/// Who reported an actor as ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reporter {
    /// The local battle manager; every process counts its own
    Manager,
    Player(ActorId),
}

/// A replicated countdown value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownTick {
    pub current: i32,
    pub max: i32,
}

/// Handshake phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum HandshakePhase {
    /// Waiting for `1 + real players` ready reports
    WaitingForParticipants,
    /// Countdown running; `last` is the latest tick seen
    Counting { last: Option<CountdownTick> },
    /// Terminal tick received, querying the team line connector
    Connecting,
    /// Countdown finished; gameplay may start
    Ready { seed: Option<NearestPlayer> },
    /// Session lost before the handshake finished
    Abandoned,
}

/// Counts ready reports and tracks the replicated countdown
#[derive(Debug)]
pub struct HandshakeCoordinator {
    required: usize,
    reported: HashSet<Reporter>,
    phase: HandshakePhase,
}

impl HandshakeCoordinator {
    /// `real_players` excludes the manager; one extra report is required for it.
    pub fn new(real_players: usize) -> Self {
        Self {
            required: 1 + real_players,
            reported: HashSet::new(),
            phase: HandshakePhase::WaitingForParticipants,
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn reported(&self) -> usize {
        self.reported.len()
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn is_waiting(&self) -> bool {
        self.phase == HandshakePhase::WaitingForParticipants
    }

    pub fn is_abandoned(&self) -> bool {
        self.phase == HandshakePhase::Abandoned
    }

    /// Record a ready report. Returns true exactly once: on the report that
    /// brings the distinct count to `required`, which starts counting.
    pub fn report(&mut self, reporter: Reporter) -> bool {
        if !self.reported.insert(reporter) {
            debug!(?reporter, "Duplicate ready report ignored");
            return false;
        }
        debug!(
            ?reporter,
            reported = self.reported.len(),
            required = self.required,
            "Ready report"
        );
        if self.is_waiting() && self.reported.len() == self.required {
            self.phase = HandshakePhase::Counting { last: None };
            info!(required = self.required, "All actors ready, counting down");
            return true;
        }
        false
    }

    /// Record a replicated countdown tick. Returns true when the terminal tick
    /// moves the handshake to `Connecting`.
    pub fn observe_tick(&mut self, tick: CountdownTick) -> bool {
        match self.phase {
            HandshakePhase::Ready { .. } | HandshakePhase::Abandoned | HandshakePhase::Connecting => {
                debug!(current = tick.current, phase = ?self.phase, "Countdown tick ignored");
                false
            }
            HandshakePhase::WaitingForParticipants | HandshakePhase::Counting { .. } => {
                if tick.current < 0 {
                    self.phase = HandshakePhase::Connecting;
                    true
                } else {
                    self.phase = HandshakePhase::Counting { last: Some(tick) };
                    false
                }
            }
        }
    }

    /// Latest countdown value seen while counting
    pub fn last_tick(&self) -> Option<CountdownTick> {
        match self.phase {
            HandshakePhase::Counting { last } => last,
            _ => None,
        }
    }

    pub fn finish(&mut self, seed: Option<NearestPlayer>) {
        if self.phase == HandshakePhase::Connecting {
            self.phase = HandshakePhase::Ready { seed };
        }
    }

    /// Stop for good; no continuation will run
    pub fn abandon(&mut self) {
        if !matches!(self.phase, HandshakePhase::Ready { .. } | HandshakePhase::Abandoned) {
            info!(phase = ?self.phase, "Handshake abandoned");
            self.phase = HandshakePhase::Abandoned;
        }
    }
}

/// Authority side countdown driver.
///
/// Emits the start value immediately, then one value per interval of
/// simulated time, ending with -1: `start + 2` values in total.
#[derive(Debug, Clone)]
pub struct CountdownTicker {
    max: i32,
    next: i32,
    interval: f32,
    elapsed: f32,
    started: bool,
}

impl CountdownTicker {
    pub fn new(start: i32, interval: f32) -> Self {
        Self {
            max: start,
            next: start,
            interval,
            elapsed: 0.0,
            started: false,
        }
    }

    /// Continue a countdown some other authority was running; `next` is due
    /// one interval from now.
    pub fn resume(next: i32, max: i32, interval: f32) -> Self {
        Self {
            max,
            next,
            interval,
            elapsed: 0.0,
            started: true,
        }
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_finished(&self) -> bool {
        self.next < -1
    }

    /// Advance simulated time and return the values now due, in order.
    pub fn advance(&mut self, dt: f32) -> Vec<i32> {
        let mut due = Vec::new();
        if self.is_finished() {
            return due;
        }
        if !self.started {
            self.started = true;
            due.push(self.next);
            self.next -= 1;
            return due;
        }
        self.elapsed += dt;
        while !self.is_finished() && self.elapsed + TICK_EPSILON >= self.interval {
            self.elapsed -= self.interval;
            due.push(self.next);
            self.next -= 1;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(current: i32) -> CountdownTick {
        CountdownTick { current, max: 3 }
    }

    #[test]
    fn counting_starts_on_exact_required_report() {
        let mut handshake = HandshakeCoordinator::new(2);
        assert_eq!(handshake.required(), 3);
        assert!(!handshake.report(Reporter::Manager));
        assert!(!handshake.report(Reporter::Player(1)));
        assert!(!handshake.report(Reporter::Player(1)));
        assert!(handshake.is_waiting());
        assert!(handshake.report(Reporter::Player(2)));
        assert_eq!(handshake.phase(), HandshakePhase::Counting { last: None });
    }

    #[test]
    fn late_and_duplicate_reports_do_not_retrigger() {
        let mut handshake = HandshakeCoordinator::new(1);
        handshake.report(Reporter::Manager);
        assert!(handshake.report(Reporter::Player(1)));
        assert!(!handshake.report(Reporter::Player(1)));
        assert!(!handshake.report(Reporter::Player(9)));
        assert!(!handshake.report(Reporter::Manager));
    }

    #[test]
    fn terminal_tick_moves_to_connecting_then_ready() {
        let mut handshake = HandshakeCoordinator::new(0);
        handshake.report(Reporter::Manager);
        assert!(!handshake.observe_tick(tick(3)));
        assert_eq!(handshake.last_tick(), Some(tick(3)));
        assert!(!handshake.observe_tick(tick(0)));
        assert!(handshake.observe_tick(tick(-1)));
        assert_eq!(handshake.phase(), HandshakePhase::Connecting);

        let seed = NearestPlayer {
            actor: 4,
            distance: 0.5,
            force: 12.0,
        };
        handshake.finish(Some(seed));
        assert_eq!(handshake.phase(), HandshakePhase::Ready { seed: Some(seed) });
        assert!(!handshake.observe_tick(tick(-1)));
    }

    #[test]
    fn abandon_is_terminal() {
        let mut handshake = HandshakeCoordinator::new(1);
        handshake.abandon();
        assert!(handshake.is_abandoned());
        assert!(!handshake.observe_tick(tick(-1)));
        handshake.finish(None);
        assert!(handshake.is_abandoned());
    }

    #[test]
    fn ticker_emits_start_plus_two_values_one_second_apart() {
        let mut ticker = CountdownTicker::new(3, 1.0);
        let mut emitted = Vec::new();
        let mut emitted_at = Vec::new();
        let mut time = 0.0f32;
        emitted.extend(ticker.advance(0.0));
        emitted_at.push(time);
        while !ticker.is_finished() {
            time += 0.25;
            let due = ticker.advance(0.25);
            assert!(due.len() <= 1);
            if !due.is_empty() {
                emitted_at.push(time);
            }
            emitted.extend(due);
        }
        assert_eq!(emitted, vec![3, 2, 1, 0, -1]);
        assert_eq!(emitted_at, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(ticker.advance(5.0).is_empty());
    }

    #[test]
    fn ticker_tolerates_frame_rounding() {
        let mut ticker = CountdownTicker::new(1, 1.0);
        assert_eq!(ticker.advance(1.0 / 60.0), vec![1]);
        let mut emitted = Vec::new();
        for _ in 0..60 {
            emitted.extend(ticker.advance(1.0 / 60.0));
        }
        assert_eq!(emitted, vec![0]);
    }

    #[test]
    fn resumed_ticker_continues_after_an_interval() {
        let mut ticker = CountdownTicker::resume(1, 3, 1.0);
        assert!(ticker.advance(0.5).is_empty());
        assert_eq!(ticker.advance(0.5), vec![1]);
        assert_eq!(ticker.advance(2.0), vec![0, -1]);
        assert!(ticker.is_finished());
        assert_eq!(ticker.max(), 3);
    }
}
