//! Team line connector: finds the participant nearest the centre line

use tracing::debug;

use super::ports::{LineMember, NearestPlayer, TeamLineConnector, Transforms};
use super::ActorId;

/// Connects the roster to the centre line (y = 0) during the countdown.
///
/// Both teams face the same centre line, so the whole roster is considered;
/// the force of the nearest participant is its character attack.
#[derive(Debug, Default)]
pub struct CenterLineConnector {
    local: Option<ActorId>,
    members: Vec<LineMember>,
    visible: bool,
}

impl CenterLineConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl TeamLineConnector for CenterLineConnector {
    fn connect(&mut self, local: Option<ActorId>, members: &[LineMember]) {
        self.local = local;
        self.members = members.to_vec();
        self.visible = local.is_some();
        debug!(local = ?local, members = members.len(), "Team line connected");
    }

    fn nearest(&self, transforms: &dyn Transforms) -> Option<NearestPlayer> {
        let mut nearest: Option<NearestPlayer> = None;
        for member in &self.members {
            let Some(position) = transforms.position(member.actor) else {
                continue;
            };
            let distance = position.y.abs();
            if nearest.map_or(true, |n| distance < n.distance) {
                nearest = Some(NearestPlayer {
                    actor: member.actor,
                    distance,
                    force: member.attack,
                });
            }
        }
        nearest
    }

    fn hide(&mut self) {
        self.visible = false;
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::arena::HeadlessArena;
    use crate::battle::geometry::Vec2;
    use crate::battle::position::Team;

    fn member(actor: ActorId, team: Team, attack: f32) -> LineMember {
        LineMember { actor, team, attack }
    }

    #[test]
    fn nearest_to_centre_wins_with_its_attack() {
        let mut arena = HeadlessArena::new();
        arena.set_position(1, Vec2::new(0.0, -4.0));
        arena.set_position(2, Vec2::new(1.0, -1.5));
        arena.set_position(3, Vec2::new(-1.0, 0.5));

        let mut line = CenterLineConnector::new();
        line.connect(
            Some(1),
            &[
                member(1, Team::Blue, 4.0),
                member(2, Team::Blue, 5.0),
                member(3, Team::Red, 12.0),
            ],
        );
        assert!(line.is_visible());

        let nearest = line.nearest(&arena).unwrap();
        assert_eq!(nearest.actor, 3);
        assert_eq!(nearest.force, 12.0);
        assert_eq!(nearest.distance, 0.5);
    }

    #[test]
    fn equal_distances_keep_the_first_member() {
        let mut arena = HeadlessArena::new();
        arena.set_position(1, Vec2::new(0.0, -2.0));
        arena.set_position(3, Vec2::new(0.0, 2.0));
        let mut line = CenterLineConnector::new();
        line.connect(None, &[member(1, Team::Blue, 1.0), member(3, Team::Red, 2.0)]);
        assert_eq!(line.nearest(&arena).map(|n| n.actor), Some(1));
    }

    #[test]
    fn hidden_connector_has_no_answer() {
        let arena = HeadlessArena::new();
        let mut line = CenterLineConnector::new();
        line.connect(Some(1), &[member(1, Team::Blue, 1.0)]);
        assert!(line.nearest(&arena).is_none());
        line.hide();
        assert!(!line.is_visible());
    }
}
