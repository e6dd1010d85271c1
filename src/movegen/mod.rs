//! Legal action generation and outcome simulation.
//!
//! The decision engine only talks to the rules through the [`Oracle`] trait.
//! [`StandardRules`] is the reference implementation: it enumerates legal
//! moves, throws, wrests and redeploy cells for the 17×13 pitch and expands
//! every action into its weighted outcome distribution.

pub mod movement;
pub mod redeploy;
pub mod shot;
pub mod snitch;

use serde::{Deserialize, Serialize};

use crate::board::{
    cell_kind, goals_defended_by, neighbours, Ball, Candidate, Cell, EntityId, Environment,
    Outcome, Overtime, Position, TeamSide,
};

/// Where a quaffle throw ends up relative to the goal rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOnGoal {
    /// Through a ring the thrower attacks.
    Goal,
    /// Through a ring the thrower defends.
    OwnGoal,
    Miss,
}

/// Rules and probability model consulted by search.
pub trait Oracle: Send + Sync {
    /// All moves of an active player, one candidate per target cell.
    fn legal_moves(&self, state: &Environment, actor: EntityId) -> Vec<Candidate>;

    /// Throws and bludger beatings whose success probability reaches `min_success`.
    fn legal_shots(&self, state: &Environment, actor: EntityId, min_success: f64)
        -> Vec<Candidate>;

    /// The wrest attempt, if the actor stands next to an opposing holder.
    fn legal_wrest(&self, state: &Environment, actor: EntityId) -> Option<Candidate>;

    /// Cells a banned player of `side` may re-enter on.
    fn legal_redeploy_cells(&self, state: &Environment, side: TeamSide) -> Vec<Position>;

    fn shot_success_probability(
        &self,
        state: &Environment,
        actor: EntityId,
        ball: Ball,
        target: Position,
    ) -> f64;

    fn is_shot_on_goal(&self, actor: EntityId, target: Position) -> ShotOnGoal;

    /// Neighbouring cells a player of `side` may step on.
    fn all_legal_cells_around(
        &self,
        state: &Environment,
        pos: Position,
        side: TeamSide,
    ) -> Vec<Position>;

    fn cell_kind(&self, pos: Position) -> Cell {
        cell_kind(pos)
    }

    /// Moves the snitch the way it would move on its own at `overtime`.
    fn advance_snitch(&self, state: &mut Environment, overtime: Overtime);

    fn is_legal_move(&self, state: &Environment, actor: EntityId, target: Position) -> bool {
        self.legal_moves(state, actor)
            .iter()
            .any(|c| c.action.target() == target)
    }
}

/// Probability and scoring parameters of the reference rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Per-cell success factor of a quaffle throw.
    pub throw_success: f64,
    /// Chance that an opposing handler on the flight line catches the quaffle.
    pub intercept_chance: f64,
    pub catch_snitch_chance: f64,
    pub knockout_chance: f64,
    pub foul_ban_chance: f64,
    pub wrest_chance: f64,
    pub throw_range: i32,
    pub bludger_range: i32,
    pub goal_points: u32,
    pub snitch_points: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            throw_success: 0.85,
            intercept_chance: 0.3,
            catch_snitch_chance: 0.35,
            knockout_chance: 0.5,
            foul_ban_chance: 0.5,
            wrest_chance: 0.5,
            throw_range: 6,
            bludger_range: 3,
            goal_points: 10,
            snitch_points: 30,
        }
    }
}

/// Reference implementation of the match rules.
#[derive(Debug, Clone, Default)]
pub struct StandardRules {
    pub config: RulesConfig,
}

impl StandardRules {
    pub fn new(config: RulesConfig) -> Self {
        StandardRules { config }
    }
}

impl Oracle for StandardRules {
    fn legal_moves(&self, state: &Environment, actor: EntityId) -> Vec<Candidate> {
        movement::legal_moves(&self.config, state, actor)
    }

    fn legal_shots(
        &self,
        state: &Environment,
        actor: EntityId,
        min_success: f64,
    ) -> Vec<Candidate> {
        shot::legal_shots(&self.config, state, actor, min_success)
    }

    fn legal_wrest(&self, state: &Environment, actor: EntityId) -> Option<Candidate> {
        shot::legal_wrest(&self.config, state, actor)
    }

    fn legal_redeploy_cells(&self, state: &Environment, side: TeamSide) -> Vec<Position> {
        redeploy::legal_redeploy_cells(state, side)
    }

    fn shot_success_probability(
        &self,
        state: &Environment,
        actor: EntityId,
        ball: Ball,
        target: Position,
    ) -> f64 {
        shot::success_probability(&self.config, state, actor, ball, target)
    }

    fn is_shot_on_goal(&self, actor: EntityId, target: Position) -> ShotOnGoal {
        shot::classify_target(actor, target)
    }

    fn all_legal_cells_around(
        &self,
        state: &Environment,
        pos: Position,
        side: TeamSide,
    ) -> Vec<Position> {
        legal_cells_around(state, pos, side)
    }

    fn advance_snitch(&self, state: &mut Environment, overtime: Overtime) {
        snitch::advance(state, overtime);
    }
}

/// Neighbouring cells not blocked by a player on the pitch or a cube, and not
/// one of `side`'s own goal rings. Balls never block.
pub fn legal_cells_around(state: &Environment, pos: Position, side: TeamSide) -> Vec<Position> {
    let own_goals = goals_defended_by(side);
    neighbours(pos)
        .into_iter()
        .filter(|&p| state.player_at(p).is_none() && !state.has_cube(p) && !own_goals.contains(&p))
        .collect()
}

/// Splits every outcome in two: with probability `p` the mutation applies,
/// otherwise the state is kept as is. Zero and one collapse to one branch.
pub(crate) fn branch<F>(outcomes: Vec<Outcome>, p: f64, mut apply: F) -> Vec<Outcome>
where
    F: FnMut(&mut Environment),
{
    if p <= 0.0 {
        return outcomes;
    }
    let mut out = Vec::with_capacity(outcomes.len() * 2);
    for outcome in outcomes {
        let mut hit = outcome.state.clone();
        apply(&mut hit);
        if p < 1.0 {
            out.push(Outcome {
                probability: outcome.probability * (1.0 - p),
                state: outcome.state,
            });
        }
        out.push(Outcome {
            probability: outcome.probability * p,
            state: hit,
        });
    }
    out
}

/// Bans a player. The quaffle stays where it lies.
pub(crate) fn ban(state: &mut Environment, id: EntityId) {
    if let Some(p) = state.player_mut(id) {
        p.is_fined = true;
    }
}
