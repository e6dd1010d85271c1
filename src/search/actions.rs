//! Move, action and redeploy selection.
//!
//! Each routine asks the oracle for the legal candidates of one kind, scores
//! them with the chooser against the evaluator, and only answers with an
//! action whose expected value beats leaving the state as it is.
//!
//! Moves are searched by iterative deepening: depth 1 values each outcome
//! statically, depth 2 lets the mover follow up with its best action in
//! every outcome. A depth only counts once it has been scanned completely.

use std::cell::Cell;

use thiserror::Error;
use tracing::debug;

use crate::board::{
    Answer, AnswerKind, Candidate, EntityId, Environment, GeometryError, Position, Role, TeamSide,
};
use crate::movegen::redeploy::redeploy;

use super::chooser::{choose_best_within, expected_value, ChooserError};
use super::DecisionContext;

/// Reasons a turn cannot be decided.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecisionError {
    #[error("{0:?} has no legal move")]
    NoLegalMoves(EntityId),
    #[error("{0:?} cannot perform the requested action")]
    ImpossibleAction(EntityId),
    #[error("{0:?} is not a player of either team")]
    UnknownEntity(EntityId),
    #[error(transparent)]
    Chooser(#[from] ChooserError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

fn side_of(actor: EntityId) -> Result<TeamSide, DecisionError> {
    actor.side().ok_or(DecisionError::UnknownEntity(actor))
}

/// Best of a fully or partially scanned depth.
#[derive(Debug, Clone, Copy)]
struct Pick {
    index: usize,
    value: f64,
    skip_value: f64,
    depth: u32,
}

/// Chooses a move for `actor`, or Skip if no move beats standing still.
pub fn compute_best_move(
    ctx: &DecisionContext,
    state: &Environment,
    actor: EntityId,
) -> Result<Answer, DecisionError> {
    let side = side_of(actor)?;
    if state.player(actor).is_none() {
        return Err(DecisionError::UnknownEntity(actor));
    }
    let moves = ctx.oracle.legal_moves(state, actor);
    if moves.is_empty() {
        return Err(DecisionError::NoLegalMoves(actor));
    }

    let max_depth = ctx.config.search.max_depth.clamp(1, 2);
    let mut pick: Option<Pick> = None;

    for depth in 1..=max_depth {
        if ctx.budget.expired() {
            break;
        }
        let truncated = Cell::new(false);
        let value_of = |s: &Environment| lookahead_value(ctx, s, actor, side, depth, &truncated);
        let skip_value = value_of(state);
        let scan = choose_best_within(&moves, value_of, ctx.budget)?;
        let Some(best) = scan.best else {
            break;
        };
        let finished = scan.complete && !truncated.get();
        if finished || pick.is_none() {
            pick = Some(Pick {
                index: best.index,
                value: best.expected_value,
                skip_value,
                depth,
            });
        }
        if !finished {
            break;
        }
    }

    let Some(pick) = pick else {
        debug!(?actor, "move search out of time before the first candidate");
        return Ok(Answer::skip(actor));
    };
    let chosen = &moves[pick.index];
    debug!(
        ?actor,
        target = ?chosen.action.target(),
        ev = pick.value,
        skip = pick.skip_value,
        depth = pick.depth,
        "best move"
    );
    if pick.value > pick.skip_value {
        Ok(Answer::from(chosen.action))
    } else {
        Ok(Answer::skip(actor))
    }
}

/// Value of a state after the mover's move. At depth 2 and beyond the mover
/// may still act, so the value is the better of standing pat and its best
/// follow-up action.
fn lookahead_value(
    ctx: &DecisionContext,
    state: &Environment,
    actor: EntityId,
    side: TeamSide,
    depth: u32,
    truncated: &Cell<bool>,
) -> f64 {
    let stand = ctx.static_value(state, side);
    if depth <= 1 {
        return stand;
    }
    if ctx.budget.expired() {
        truncated.set(true);
        return stand;
    }
    let (follow_ups, complete) = action_candidates(ctx, state, actor);
    if !complete {
        truncated.set(true);
    }
    let mut best = stand;
    for candidate in &follow_ups {
        if ctx.budget.expired() {
            truncated.set(true);
            break;
        }
        let ev = expected_value(candidate, |s| ctx.static_value(s, side));
        if ev > best {
            best = ev;
        }
    }
    best
}

/// Throws, beatings and wrests that clear the configured success thresholds.
///
/// The flag is false if the budget ran out before every kind was enumerated.
fn action_candidates(
    ctx: &DecisionContext,
    state: &Environment,
    actor: EntityId,
) -> (Vec<Candidate>, bool) {
    if ctx.budget.expired() {
        return (Vec::new(), false);
    }
    let mut candidates = ctx
        .oracle
        .legal_shots(state, actor, ctx.config.min_shot_success);
    if ctx.budget.expired() {
        return (candidates, false);
    }
    if let Some(wrest) = ctx.oracle.legal_wrest(state, actor) {
        if wrest.success >= ctx.config.min_wrest_success {
            candidates.push(wrest);
        }
    }
    (candidates, true)
}

/// True if the actor could throw, beat a bludger or wrest in this state.
fn can_act(ctx: &DecisionContext, state: &Environment, actor: EntityId) -> bool {
    let Some(player) = state.player(actor).filter(|p| p.is_active()) else {
        return false;
    };
    let holds_quaffle = state.quaffle_holder().map(|h| h.id) == Some(actor);
    let on_bludger = player.role() == Role::Beater && state.bludger_at(player.position).is_some();
    holds_quaffle || on_bludger || ctx.oracle.legal_wrest(state, actor).is_some()
}

/// Chooses a throw, bludger beating or wrest for `actor`.
///
/// Fails if the actor has nothing it could possibly do; answers Skip if no
/// candidate clears the thresholds or none beats doing nothing.
pub fn compute_best_action(
    ctx: &DecisionContext,
    state: &Environment,
    actor: EntityId,
) -> Result<Answer, DecisionError> {
    let side = side_of(actor)?;
    if !can_act(ctx, state, actor) {
        return Err(DecisionError::ImpossibleAction(actor));
    }
    let (candidates, _) = action_candidates(ctx, state, actor);
    if candidates.is_empty() {
        debug!(?actor, "no action clears the success thresholds");
        return Ok(Answer::skip(actor));
    }

    let skip_value = ctx.static_value(state, side);
    let scan = choose_best_within(&candidates, |s| ctx.static_value(s, side), ctx.budget)?;
    let Some(best) = scan.best else {
        return Ok(Answer::skip(actor));
    };
    let chosen = &candidates[best.index];
    debug!(
        ?actor,
        action = ?chosen.action,
        ev = best.expected_value,
        skip = skip_value,
        complete = scan.complete,
        "best action"
    );
    if best.expected_value > skip_value {
        Ok(Answer::from(chosen.action))
    } else {
        Ok(Answer::skip(actor))
    }
}

/// Chooses the re-entry cell of a banned player by trying every legal cell.
pub fn compute_best_redeploy(
    ctx: &DecisionContext,
    state: &Environment,
    actor: EntityId,
) -> Result<Answer, DecisionError> {
    let side = side_of(actor)?;
    let player = state
        .player(actor)
        .ok_or(DecisionError::UnknownEntity(actor))?;
    if !player.is_fined {
        return Err(DecisionError::ImpossibleAction(actor));
    }

    let mut best: Option<(Position, f64)> = None;
    for cell in ctx.oracle.legal_redeploy_cells(state, side) {
        if best.is_some() && ctx.budget.expired() {
            break;
        }
        let mut placed = state.clone();
        redeploy(&mut placed, actor, cell);
        let value = ctx.static_value(&placed, side);
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((cell, value));
        }
    }

    match best {
        Some((cell, value)) => {
            debug!(?actor, ?cell, value, "redeploy");
            Ok(Answer {
                kind: AnswerKind::Unban,
                active_entity: actor,
                passive_entity: None,
                target: Some(cell),
            })
        }
        None => Ok(Answer::skip(actor)),
    }
}
