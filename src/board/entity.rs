//! Entity identities, sides, roles and fan kinds.
//!
//! `EntityId` is the closed set of identifiers the server uses on the wire;
//! everything else about an entity (side, role, fan kind) is derived from it.

use serde::{Deserialize, Serialize};

/// One of the two opposing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamSide {
    Left,
    Right,
}

impl TeamSide {
    pub const fn opponent(self) -> TeamSide {
        match self {
            TeamSide::Left => TeamSide::Right,
            TeamSide::Right => TeamSide::Left,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            TeamSide::Left => 0,
            TeamSide::Right => 1,
        }
    }
}

/// Playing role of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Seeker,
    Keeper,
    Beater,
    Chaser,
}

impl Role {
    /// Keepers and chasers are the only roles allowed to hold the quaffle.
    pub const fn handles_quaffle(self) -> bool {
        matches!(self, Role::Keeper | Role::Chaser)
    }
}

/// Kind of fan ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanKind {
    /// Ranged shock on a single player.
    Goblin,
    /// Roar that makes every holder drop the quaffle.
    Troll,
    /// Teleports a player to a random cell.
    Elf,
    /// Snatches the snitch away.
    Niffler,
    /// Drops an obstacle cube on a cell.
    Wombat,
}

pub const ALL_FAN_KINDS: [FanKind; 5] = [
    FanKind::Goblin,
    FanKind::Troll,
    FanKind::Elf,
    FanKind::Niffler,
    FanKind::Wombat,
];

/// Identifier of every actor, ball and fan known to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityId {
    LeftSeeker,
    LeftKeeper,
    LeftBeater1,
    LeftBeater2,
    LeftChaser1,
    LeftChaser2,
    LeftChaser3,
    RightSeeker,
    RightKeeper,
    RightBeater1,
    RightBeater2,
    RightChaser1,
    RightChaser2,
    RightChaser3,
    Snitch,
    Bludger1,
    Bludger2,
    Quaffle,
    LeftGoblin,
    LeftTroll,
    LeftElf,
    LeftNiffler,
    LeftWombat,
    RightGoblin,
    RightTroll,
    RightElf,
    RightNiffler,
    RightWombat,
}

/// Player ids in roster order: seeker, keeper, beaters, chasers.
pub const LEFT_PLAYERS: [EntityId; 7] = [
    EntityId::LeftSeeker,
    EntityId::LeftKeeper,
    EntityId::LeftBeater1,
    EntityId::LeftBeater2,
    EntityId::LeftChaser1,
    EntityId::LeftChaser2,
    EntityId::LeftChaser3,
];

pub const RIGHT_PLAYERS: [EntityId; 7] = [
    EntityId::RightSeeker,
    EntityId::RightKeeper,
    EntityId::RightBeater1,
    EntityId::RightBeater2,
    EntityId::RightChaser1,
    EntityId::RightChaser2,
    EntityId::RightChaser3,
];

impl EntityId {
    /// The side an actor or fan belongs to. Balls have none.
    pub const fn side(self) -> Option<TeamSide> {
        use EntityId::*;
        match self {
            LeftSeeker | LeftKeeper | LeftBeater1 | LeftBeater2 | LeftChaser1 | LeftChaser2
            | LeftChaser3 | LeftGoblin | LeftTroll | LeftElf | LeftNiffler | LeftWombat => {
                Some(TeamSide::Left)
            }
            RightSeeker | RightKeeper | RightBeater1 | RightBeater2 | RightChaser1
            | RightChaser2 | RightChaser3 | RightGoblin | RightTroll | RightElf
            | RightNiffler | RightWombat => Some(TeamSide::Right),
            Snitch | Bludger1 | Bludger2 | Quaffle => None,
        }
    }

    pub const fn role(self) -> Option<Role> {
        use EntityId::*;
        match self {
            LeftSeeker | RightSeeker => Some(Role::Seeker),
            LeftKeeper | RightKeeper => Some(Role::Keeper),
            LeftBeater1 | LeftBeater2 | RightBeater1 | RightBeater2 => Some(Role::Beater),
            LeftChaser1 | LeftChaser2 | LeftChaser3 | RightChaser1 | RightChaser2
            | RightChaser3 => Some(Role::Chaser),
            _ => None,
        }
    }

    pub const fn fan_kind(self) -> Option<FanKind> {
        use EntityId::*;
        match self {
            LeftGoblin | RightGoblin => Some(FanKind::Goblin),
            LeftTroll | RightTroll => Some(FanKind::Troll),
            LeftElf | RightElf => Some(FanKind::Elf),
            LeftNiffler | RightNiffler => Some(FanKind::Niffler),
            LeftWombat | RightWombat => Some(FanKind::Wombat),
            _ => None,
        }
    }

    pub const fn is_ball(self) -> bool {
        matches!(
            self,
            EntityId::Snitch | EntityId::Bludger1 | EntityId::Bludger2 | EntityId::Quaffle
        )
    }

    /// The matching entity of the other side. Balls map to themselves.
    pub const fn mirrored(self) -> EntityId {
        use EntityId::*;
        match self {
            LeftSeeker => RightSeeker,
            LeftKeeper => RightKeeper,
            LeftBeater1 => RightBeater1,
            LeftBeater2 => RightBeater2,
            LeftChaser1 => RightChaser1,
            LeftChaser2 => RightChaser2,
            LeftChaser3 => RightChaser3,
            RightSeeker => LeftSeeker,
            RightKeeper => LeftKeeper,
            RightBeater1 => LeftBeater1,
            RightBeater2 => LeftBeater2,
            RightChaser1 => LeftChaser1,
            RightChaser2 => LeftChaser2,
            RightChaser3 => LeftChaser3,
            LeftGoblin => RightGoblin,
            LeftTroll => RightTroll,
            LeftElf => RightElf,
            LeftNiffler => RightNiffler,
            LeftWombat => RightWombat,
            RightGoblin => LeftGoblin,
            RightTroll => LeftTroll,
            RightElf => LeftElf,
            RightNiffler => LeftNiffler,
            RightWombat => LeftWombat,
            Snitch => Snitch,
            Bludger1 => Bludger1,
            Bludger2 => Bludger2,
            Quaffle => Quaffle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_and_roles() {
        assert_eq!(EntityId::LeftChaser2.side(), Some(TeamSide::Left));
        assert_eq!(EntityId::RightKeeper.role(), Some(Role::Keeper));
        assert_eq!(EntityId::Quaffle.side(), None);
        assert!(EntityId::Bludger1.is_ball());
        assert_eq!(EntityId::LeftNiffler.role(), None);
        assert_eq!(EntityId::RightWombat.fan_kind(), Some(FanKind::Wombat));
    }

    #[test]
    fn mirror_is_an_involution() {
        for id in LEFT_PLAYERS.iter().chain(RIGHT_PLAYERS.iter()) {
            assert_eq!(id.mirrored().mirrored(), *id);
            assert_eq!(id.mirrored().side(), id.side().map(TeamSide::opponent));
            assert_eq!(id.mirrored().role(), id.role());
        }
    }

    #[test]
    fn wire_names() {
        let json = serde_json::to_string(&EntityId::LeftBeater1).unwrap();
        assert_eq!(json, "\"LEFT_BEATER1\"");
        let id: EntityId = serde_json::from_str("\"RIGHT_NIFFLER\"").unwrap();
        assert_eq!(id, EntityId::RightNiffler);
    }
}
