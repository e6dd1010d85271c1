//! Game state representation.
//!
//! Holds the complete snapshot of a match at a given point in time: both
//! rosters, every ball, the wombat cubes, round, phase and overtime stage.
//! Search and evaluation only ever work on clones of this type.

use std::collections::VecDeque;

use thiserror::Error;

use super::entity::{EntityId, TeamSide};
use super::position::{Position, CENTER};
use super::team::{Player, Team};

/// The phase within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Ball,
    Player,
    Fan,
    Unban,
    Finished,
}

/// Escalation of the snitch's behaviour once a match runs long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Overtime {
    #[default]
    None,
    Stage1,
    Stage2,
    Stage3,
}

impl Overtime {
    /// The following stage. Stage3 is terminal.
    pub const fn next(self) -> Overtime {
        match self {
            Overtime::None => Overtime::Stage1,
            Overtime::Stage1 => Overtime::Stage2,
            Overtime::Stage2 | Overtime::Stage3 => Overtime::Stage3,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Overtime::None => 0,
            Overtime::Stage1 => 1,
            Overtime::Stage2 => 2,
            Overtime::Stage3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bludger {
    pub id: EntityId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snitch {
    pub exists: bool,
    pub position: Position,
}

impl Snitch {
    pub const fn absent() -> Self {
        Snitch {
            exists: false,
            position: CENTER,
        }
    }

    pub const fn at(position: Position) -> Self {
        Snitch {
            exists: true,
            position,
        }
    }
}

/// Errors raised when a snapshot breaks the occupancy rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("{first:?} and {second:?} both occupy ({}, {})", .position.x, .position.y)]
    SharedCell {
        first: EntityId,
        second: EntityId,
        position: Position,
    },
    #[error("{id:?} stands on a wombat cube at ({}, {})", .position.x, .position.y)]
    OnCube { id: EntityId, position: Position },
    #[error("{id:?} is off the pitch at ({}, {})", .position.x, .position.y)]
    OutOfBounds { id: EntityId, position: Position },
}

/// Complete match state at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub left: Team,
    pub right: Team,
    pub quaffle: Position,
    pub bludgers: Vec<Bludger>,
    pub snitch: Snitch,
    /// Oldest cube first.
    pub wombat_cubes: VecDeque<Position>,
    pub round: u32,
    pub phase: Phase,
    pub overtime: Overtime,
}

impl Environment {
    /// Creates a state with the balls in their kick-off cells.
    pub fn new(left: Team, right: Team) -> Self {
        Environment {
            left,
            right,
            quaffle: CENTER,
            bludgers: vec![
                Bludger {
                    id: EntityId::Bludger1,
                    position: Position::new(CENTER.x, CENTER.y - 2),
                },
                Bludger {
                    id: EntityId::Bludger2,
                    position: Position::new(CENTER.x, CENTER.y + 2),
                },
            ],
            snitch: Snitch::absent(),
            wombat_cubes: VecDeque::new(),
            round: 1,
            phase: Phase::Player,
            overtime: Overtime::None,
        }
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Left => &self.left,
            TeamSide::Right => &self.right,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut Team {
        match side {
            TeamSide::Left => &mut self.left,
            TeamSide::Right => &mut self.right,
        }
    }

    /// Every player of both teams, left roster first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.left.players().chain(self.right.players())
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.team(id.side()?).player(id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.team_mut(id.side()?).player_mut(id)
    }

    /// The player standing on a cell. Banned players are ignored.
    pub fn player_at(&self, pos: Position) -> Option<&Player> {
        self.players()
            .find(|p| p.is_on_pitch() && p.position == pos)
    }

    pub fn has_cube(&self, pos: Position) -> bool {
        self.wombat_cubes.contains(&pos)
    }

    pub fn bludger(&self, id: EntityId) -> Option<&Bludger> {
        self.bludgers.iter().find(|b| b.id == id)
    }

    pub fn bludger_mut(&mut self, id: EntityId) -> Option<&mut Bludger> {
        self.bludgers.iter_mut().find(|b| b.id == id)
    }

    pub fn bludger_at(&self, pos: Position) -> Option<&Bludger> {
        self.bludgers.iter().find(|b| b.position == pos)
    }

    /// True if nothing at all occupies the cell: no player, ball or cube.
    pub fn is_free(&self, pos: Position) -> bool {
        pos.is_in_bounds()
            && self.player_at(pos).is_none()
            && !self.has_cube(pos)
            && self.quaffle != pos
            && self.bludger_at(pos).is_none()
            && !(self.snitch.exists && self.snitch.position == pos)
    }

    /// The active keeper or chaser standing on the quaffle, if any.
    pub fn quaffle_holder(&self) -> Option<&Player> {
        self.left
            .quaffle_handlers()
            .chain(self.right.quaffle_handlers())
            .find(|p| p.is_active() && p.position == self.quaffle)
    }

    /// Checks the occupancy invariants: every player on the pitch stands on
    /// an in-bounds cell of its own, and never on a wombat cube.
    pub fn validate(&self) -> Result<(), StateError> {
        let on_pitch: Vec<&Player> = self.players().filter(|p| p.is_on_pitch()).collect();
        for (i, p) in on_pitch.iter().enumerate() {
            if !p.position.is_in_bounds() {
                return Err(StateError::OutOfBounds {
                    id: p.id,
                    position: p.position,
                });
            }
            if self.has_cube(p.position) {
                return Err(StateError::OnCube {
                    id: p.id,
                    position: p.position,
                });
            }
            if let Some(other) = on_pitch[i + 1..].iter().find(|q| q.position == p.position) {
                return Err(StateError::SharedCell {
                    first: p.id,
                    second: other.id,
                    position: p.position,
                });
            }
        }
        Ok(())
    }

    /// The same situation with the sides swapped and the pitch reflected.
    pub fn mirrored(&self) -> Environment {
        Environment {
            left: self.right.mirrored(),
            right: self.left.mirrored(),
            quaffle: self.quaffle.mirrored(),
            bludgers: self
                .bludgers
                .iter()
                .map(|b| Bludger {
                    id: b.id,
                    position: b.position.mirrored(),
                })
                .collect(),
            snitch: Snitch {
                exists: self.snitch.exists,
                position: self.snitch.position.mirrored(),
            },
            wombat_cubes: self.wombat_cubes.iter().map(|c| c.mirrored()).collect(),
            round: self.round,
            phase: self.phase,
            overtime: self.overtime,
        }
    }
}
