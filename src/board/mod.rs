//! Board representation and game-state types.
//!
//! Contains the pitch geometry, entity identities, rosters, the match state
//! and the action types that search produces.

pub mod action;
pub mod entity;
pub mod position;
pub mod state;
pub mod team;

pub use action::{Action, Answer, AnswerKind, Ball, Candidate, Outcome, TurnKind};
pub use entity::{EntityId, FanKind, Role, TeamSide, ALL_FAN_KINDS, LEFT_PLAYERS, RIGHT_PLAYERS};
pub use position::{
    cell_kind, crossed_cells, distance, goals_attacked_by, goals_defended_by, neighbours, Cell,
    GeometryError, Position, CENTER, FIELD_HEIGHT, FIELD_WIDTH, LEFT_GOALS, RIGHT_GOALS,
};
pub use state::{Bludger, Environment, Overtime, Phase, Snitch, StateError};
pub use team::{Fan, Player, Team};
