//! Move generation.
//!
//! Enumerates the one-cell moves of an active player and expands each into
//! its outcomes: carried balls follow the mover, fouls may ban it, a seeker
//! may catch the snitch and a bludger may knock the mover out.

use crate::board::{
    cell_kind, Action, Candidate, EntityId, Environment, Outcome, Phase, Position, Role,
};

use super::{ban, branch, legal_cells_around, RulesConfig};

/// Generates all legal moves of `actor`.
///
/// Returns an empty vec if the actor is not an active player.
pub fn legal_moves(config: &RulesConfig, state: &Environment, actor: EntityId) -> Vec<Candidate> {
    let (Some(player), Some(side)) = (state.player(actor), actor.side()) else {
        return Vec::new();
    };
    if !player.is_active() {
        return Vec::new();
    }
    legal_cells_around(state, player.position, side)
        .into_iter()
        .map(|target| Candidate {
            action: Action::Move { actor, target },
            success: 1.0,
            outcomes: move_outcomes(config, state, actor, target),
        })
        .collect()
}

/// Expands a move into its weighted outcomes.
pub fn move_outcomes(
    config: &RulesConfig,
    state: &Environment,
    actor: EntityId,
    target: Position,
) -> Vec<Outcome> {
    let (Some(player), Some(side), Some(role)) = (state.player(actor), actor.side(), actor.role())
    else {
        return vec![Outcome {
            probability: 1.0,
            state: state.clone(),
        }];
    };
    let from = player.position;
    let carries_quaffle = state.quaffle_holder().map(|h| h.id) == Some(actor);
    let carried_bludger = match role {
        Role::Beater => state.bludger_at(from).map(|b| b.id),
        _ => None,
    };

    let mut moved = state.clone();
    if let Some(p) = moved.player_mut(actor) {
        p.position = target;
    }
    if carries_quaffle {
        moved.quaffle = target;
    }
    if let Some(id) = carried_bludger {
        if let Some(b) = moved.bludger_mut(id) {
            b.position = target;
        }
    }

    let mut outcomes = vec![Outcome {
        probability: 1.0,
        state: moved,
    }];

    if is_zone_foul(state, actor, target) {
        outcomes = branch(outcomes, config.foul_ban_chance, |s| ban(s, actor));
    }

    if state.snitch.exists && state.snitch.position == target {
        if role == Role::Seeker {
            let points = config.snitch_points;
            outcomes = branch(outcomes, config.catch_snitch_chance, |s| {
                if s.player(actor).is_some_and(|p| !p.is_fined) {
                    s.team_mut(side).score += points;
                    s.snitch.exists = false;
                    s.phase = Phase::Finished;
                }
            });
        } else {
            outcomes = branch(outcomes, config.foul_ban_chance, |s| ban(s, actor));
        }
    }

    if role != Role::Beater && state.bludger_at(target).is_some() {
        outcomes = branch(outcomes, config.knockout_chance, |s| {
            if let Some(p) = s.player_mut(actor) {
                p.knocked_out = true;
            }
        });
    }

    outcomes
}

/// A second teammate entering the opposing keeper zone commits a foul.
fn is_zone_foul(state: &Environment, actor: EntityId, target: Position) -> bool {
    let Some(side) = actor.side() else {
        return false;
    };
    let opponent = side.opponent();
    if cell_kind(target).zone_owner() != Some(opponent) {
        return false;
    }
    state.team(side).players().any(|p| {
        p.id != actor
            && p.is_on_pitch()
            && cell_kind(p.position).zone_owner() == Some(opponent)
    })
}
