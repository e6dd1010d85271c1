//! Fan ability decisions.
//!
//! Fans have no outcome model, so each kind fires on a yes/no predicate
//! over the current state instead of going through the chooser.

use tracing::debug;

use crate::board::{
    crossed_cells, distance, goals_attacked_by, neighbours, Answer, AnswerKind, EntityId,
    Environment, FanKind, Player, Position, TeamSide,
};

use super::actions::DecisionError;
use super::DecisionContext;

/// Decides whether `fan` uses its ability this turn, and on what.
pub fn compute_fan_action(
    ctx: &DecisionContext,
    state: &Environment,
    fan: EntityId,
) -> Result<Answer, DecisionError> {
    let (Some(side), Some(kind)) = (fan.side(), fan.fan_kind()) else {
        return Err(DecisionError::UnknownEntity(fan));
    };
    if state.team(side).fan_count(kind) == 0 {
        return Err(DecisionError::ImpossibleAction(fan));
    }
    let opponent = side.opponent();
    let fans = &ctx.config.fans;

    let answer = match kind {
        FanKind::Niffler => seeker_closing_in(ctx, state, opponent, fans.niffler_trigger_distance)
            .map(|_| fan_answer(fan, kind, Some(EntityId::Snitch), None)),
        FanKind::Elf => seeker_closing_in(ctx, state, opponent, fans.elf_trigger_distance)
            .map(|seeker| fan_answer(fan, kind, Some(seeker.id), Some(seeker.position))),
        FanKind::Goblin => opposing_holder(state, opponent)
            .map(|holder| fan_answer(fan, kind, Some(holder.id), Some(holder.position))),
        FanKind::Troll => opposing_holder(state, opponent).map(|_| fan_answer(fan, kind, None, None)),
        FanKind::Wombat => wombat_target(ctx, state, opponent, fans.wombat_trigger_distance)
            .map(|cell| fan_answer(fan, kind, None, Some(cell))),
    };

    match answer {
        Some(answer) => {
            debug!(?fan, kind = ?answer.kind, target = ?answer.target, "fan fires");
            Ok(answer)
        }
        None => Ok(Answer::skip(fan)),
    }
}

fn fan_answer(
    fan: EntityId,
    kind: FanKind,
    passive: Option<EntityId>,
    target: Option<Position>,
) -> Answer {
    Answer {
        kind: AnswerKind::for_fan(kind),
        active_entity: fan,
        passive_entity: passive,
        target,
    }
}

/// The opposing seeker, if it is active and within `trigger` of the snitch
/// after the snitch's next autonomous step.
fn seeker_closing_in<'s>(
    ctx: &DecisionContext,
    state: &'s Environment,
    opponent: TeamSide,
    trigger: i32,
) -> Option<&'s Player> {
    if !state.snitch.exists {
        return None;
    }
    let seeker = &state.team(opponent).seeker;
    if !seeker.is_active() {
        return None;
    }
    let mut next = state.clone();
    ctx.oracle.advance_snitch(&mut next, ctx.eval.overtime);
    if !next.snitch.exists {
        return None;
    }
    let d = distance(seeker.position, next.snitch.position).ok()?;
    (d <= trigger).then_some(seeker)
}

fn opposing_holder(state: &Environment, opponent: TeamSide) -> Option<&Player> {
    state
        .quaffle_holder()
        .filter(|h| h.id.side() == Some(opponent))
}

fn wombat_target(
    ctx: &DecisionContext,
    state: &Environment,
    opponent: TeamSide,
    trigger: i32,
) -> Option<Position> {
    let droppable = |c: Position| state.is_free(c) && !ctx.oracle.cell_kind(c).is_goal();
    if let Some(holder) = opposing_holder(state, opponent) {
        let goals = goals_attacked_by(opponent);
        let goal_distance = |p: Position| {
            goals
                .iter()
                .filter_map(|&g| distance(p, g).ok())
                .min()
                .unwrap_or(i32::MAX)
        };
        let mut best: Option<(Position, i32)> = None;
        for cell in neighbours(holder.position) {
            if !droppable(cell) {
                continue;
            }
            let d = goal_distance(cell);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((cell, d));
            }
        }
        return best.map(|(cell, _)| cell);
    }

    let seeker = &state.team(opponent).seeker;
    if !state.snitch.exists || !seeker.is_active() {
        return None;
    }
    let d = distance(seeker.position, state.snitch.position).ok()?;
    if d > trigger {
        return None;
    }
    crossed_cells(seeker.position, state.snitch.position)
        .ok()?
        .into_iter()
        .find(|&c| droppable(c))
}
