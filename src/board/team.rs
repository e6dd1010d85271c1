//! Players, fans and team rosters.

use serde::{Deserialize, Serialize};

use super::entity::{EntityId, FanKind, Role, TeamSide, LEFT_PLAYERS, RIGHT_PLAYERS};
use super::position::Position;

/// A single player on the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Player {
    pub id: EntityId,
    pub position: Position,
    /// Banned players are off the pitch until redeployed.
    pub is_fined: bool,
    /// Knocked out players stay on their cell but cannot act.
    pub knocked_out: bool,
}

impl Player {
    pub const fn new(id: EntityId, position: Position) -> Self {
        Player {
            id,
            position,
            is_fined: false,
            knocked_out: false,
        }
    }

    /// True if the player is on the pitch and able to act.
    pub const fn is_active(&self) -> bool {
        !self.is_fined && !self.knocked_out
    }

    /// True if the player occupies its cell (banned players do not).
    pub const fn is_on_pitch(&self) -> bool {
        !self.is_fined
    }

    pub fn role(&self) -> Role {
        // Team rosters only ever hold player ids.
        self.id.role().unwrap_or(Role::Chaser)
    }

    pub fn mirrored(&self) -> Player {
        Player {
            id: self.id.mirrored(),
            position: self.position.mirrored(),
            ..*self
        }
    }
}

/// One fan ability slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fan {
    pub kind: FanKind,
    pub banned: bool,
}

/// A full seven-player roster plus score and fans.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub side: TeamSide,
    pub seeker: Player,
    pub keeper: Player,
    pub beaters: [Player; 2],
    pub chasers: [Player; 3],
    pub score: u32,
    pub fans: Vec<Fan>,
}

impl Team {
    /// Builds a roster from positions in roster order: seeker, keeper,
    /// beaters, chasers.
    pub fn from_positions(side: TeamSide, positions: [Position; 7]) -> Self {
        let ids = match side {
            TeamSide::Left => LEFT_PLAYERS,
            TeamSide::Right => RIGHT_PLAYERS,
        };
        let p = |i: usize| Player::new(ids[i], positions[i]);
        Team {
            side,
            seeker: p(0),
            keeper: p(1),
            beaters: [p(2), p(3)],
            chasers: [p(4), p(5), p(6)],
            score: 0,
            fans: Vec::new(),
        }
    }

    /// Sets the fan block from per-kind counts.
    pub fn with_fans(mut self, counts: &[(FanKind, usize)]) -> Self {
        self.fans = counts
            .iter()
            .flat_map(|&(kind, n)| std::iter::repeat(Fan { kind, banned: false }).take(n))
            .collect();
        self
    }

    /// All seven players in roster order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        std::iter::once(&self.seeker)
            .chain(std::iter::once(&self.keeper))
            .chain(self.beaters.iter())
            .chain(self.chasers.iter())
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        std::iter::once(&mut self.seeker)
            .chain(std::iter::once(&mut self.keeper))
            .chain(self.beaters.iter_mut())
            .chain(self.chasers.iter_mut())
    }

    /// Keeper first, then the chasers.
    pub fn quaffle_handlers(&self) -> impl Iterator<Item = &Player> {
        std::iter::once(&self.keeper).chain(self.chasers.iter())
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players_mut().find(|p| p.id == id)
    }

    /// Number of currently banned members.
    pub fn banned_count(&self) -> u32 {
        self.players().filter(|p| p.is_fined).count() as u32
    }

    /// Number of usable fans of a kind.
    pub fn fan_count(&self, kind: FanKind) -> usize {
        self.fans
            .iter()
            .filter(|f| f.kind == kind && !f.banned)
            .count()
    }

    /// The same roster seen from the other side of the pitch.
    pub fn mirrored(&self) -> Team {
        Team {
            side: self.side.opponent(),
            seeker: self.seeker.mirrored(),
            keeper: self.keeper.mirrored(),
            beaters: [self.beaters[0].mirrored(), self.beaters[1].mirrored()],
            chasers: [
                self.chasers[0].mirrored(),
                self.chasers[1].mirrored(),
                self.chasers[2].mirrored(),
            ],
            score: self.score,
            fans: self.fans.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team::from_positions(
            TeamSide::Left,
            [
                Position::new(3, 8),
                Position::new(3, 6),
                Position::new(7, 4),
                Position::new(6, 6),
                Position::new(7, 8),
                Position::new(6, 5),
                Position::new(6, 7),
            ],
        )
    }

    #[test]
    fn roster_order() {
        let t = team();
        let ids: Vec<EntityId> = t.players().map(|p| p.id).collect();
        assert_eq!(ids, LEFT_PLAYERS.to_vec());
        assert_eq!(t.player(EntityId::LeftChaser2).unwrap().position, Position::new(6, 5));
        assert!(t.player(EntityId::RightSeeker).is_none());
    }

    #[test]
    fn banned_count_tracks_flags() {
        let mut t = team();
        assert_eq!(t.banned_count(), 0);
        t.player_mut(EntityId::LeftBeater1).unwrap().is_fined = true;
        t.chasers[2].is_fined = true;
        assert_eq!(t.banned_count(), 2);
        assert!(!t.chasers[2].is_active());
        assert!(!t.chasers[2].is_on_pitch());
    }

    #[test]
    fn knocked_out_stays_on_pitch() {
        let mut t = team();
        t.keeper.knocked_out = true;
        assert!(!t.keeper.is_active());
        assert!(t.keeper.is_on_pitch());
    }

    #[test]
    fn fan_counts() {
        let mut t = team().with_fans(&[(FanKind::Goblin, 1), (FanKind::Troll, 2)]);
        assert_eq!(t.fan_count(FanKind::Troll), 2);
        assert_eq!(t.fan_count(FanKind::Wombat), 0);
        t.fans[1].banned = true;
        assert_eq!(t.fan_count(FanKind::Troll), 1);
    }

    #[test]
    fn mirrored_flips_side_and_ids() {
        let m = team().mirrored();
        assert_eq!(m.side, TeamSide::Right);
        assert_eq!(m.seeker.id, EntityId::RightSeeker);
        assert_eq!(m.seeker.position, Position::new(13, 8));
    }
}
