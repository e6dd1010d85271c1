//! Heuristic state evaluation.
//!
//! Scores a match state from one side's perspective as the difference of two
//! team totals (seeker, keeper, chasers) plus an area-control term for the
//! bludgers, the ban penalties and a tiered score-difference term.
//!
//! Every term is computed per side with the same code path, so a mirrored
//! state seen from the mirrored side yields the identical value.

use crate::board::{
    distance, Ball, Environment, Overtime, Phase, Player, Role, Team, TeamSide, CENTER,
    LEFT_GOALS, RIGHT_GOALS,
};
use crate::movegen::{Oracle, ShotOnGoal};
use crate::search::astar::player_path;

use super::weights::{EvalWeights, TierWeights};

/// Situational flags that are not part of the state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalContext {
    pub goal_scored_this_round: bool,
    pub overtime: Overtime,
}

/// Score-difference regime of one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    FarBehind,
    Even,
    FarAhead,
}

/// Static evaluator bound to an oracle and a weight table.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    pub oracle: &'a dyn Oracle,
    pub weights: &'a EvalWeights,
}

/// True iff an active keeper or chaser of `side` stands on the quaffle.
pub fn team_has_quaffle(state: &Environment, side: TeamSide) -> bool {
    state
        .quaffle_holder()
        .is_some_and(|h| h.id.side() == Some(side))
}

fn score_diff(state: &Environment, side: TeamSide) -> i64 {
    i64::from(state.team(side).score) - i64::from(state.team(side.opponent()).score)
}

impl<'a> Evaluator<'a> {
    pub fn new(oracle: &'a dyn Oracle, weights: &'a EvalWeights) -> Self {
        Evaluator { oracle, weights }
    }

    /// Utility of `state` for `side`. Positive is good for `side`.
    pub fn evaluate(&self, state: &Environment, side: TeamSide, ctx: EvalContext) -> f64 {
        let w = self.weights;
        let opponent = side.opponent();
        let diff = score_diff(state, side);

        if state.phase == Phase::Finished {
            let sign = match diff {
                d if d > 0 => 1.0,
                d if d < 0 => -1.0,
                _ => 0.0,
            };
            return sign * w.terminal_value + w.score_linear * diff as f64;
        }

        let mut value = self.team_value(state, side, ctx) - self.team_value(state, opponent, ctx);
        value += self.area_control(state, side) - self.area_control(state, opponent);
        value -= self.ban_penalty(state.team(side), ctx);
        value += self.ban_penalty(state.team(opponent), ctx);
        value += self.score_term(diff);
        value
    }

    fn tier(&self, diff: i64) -> Tier {
        let threshold = self.weights.win_threshold;
        if diff < -threshold {
            Tier::FarBehind
        } else if diff > threshold {
            Tier::FarAhead
        } else {
            Tier::Even
        }
    }

    fn tier_weight(tiers: &TierWeights, tier: Tier) -> f64 {
        match tier {
            Tier::FarBehind => tiers.far_behind,
            Tier::Even => tiers.even,
            Tier::FarAhead => tiers.far_ahead,
        }
    }

    /// Seeker, keeper and chasers of one side.
    fn team_value(&self, state: &Environment, side: TeamSide, ctx: EvalContext) -> f64 {
        let team = state.team(side);
        let tier = self.tier(score_diff(state, side));
        let mut total = self.seeker_value(state, &team.seeker, tier, ctx);
        for handler in team.quaffle_handlers() {
            total += self.handler_value(state, handler, tier);
        }
        total
    }

    fn seeker_value(
        &self,
        state: &Environment,
        seeker: &Player,
        tier: Tier,
        ctx: EvalContext,
    ) -> f64 {
        let w = self.weights;
        if !seeker.is_active() {
            return w.seeker_incapacitated;
        }
        let mut value = w.seeker_base;
        if state.snitch.exists {
            let raw = distance(seeker.position, state.snitch.position).unwrap_or(i32::MAX - 1);
            let steps = if raw <= w.snitch_path_range {
                match player_path(self.oracle, state, seeker.id, state.snitch.position) {
                    Ok(path) if !path.is_empty() => path.len() as i32 - 1,
                    _ => raw,
                }
            } else {
                raw
            };
            let scale = w.overtime_snitch_scale[ctx.overtime.index()];
            let closeness = w.snitch_proximity * scale / f64::from(steps + 1);
            if tier == Tier::FarBehind {
                value -= closeness * w.snitch_behind_penalty;
            } else {
                value += closeness;
            }
        } else if let Ok(d) = distance(seeker.position, CENTER) {
            value += w.seeker_center / f64::from(d + 1);
        }
        value
    }

    fn handler_value(&self, state: &Environment, player: &Player, tier: Tier) -> f64 {
        let w = self.weights;
        if !player.is_active() {
            return 0.0;
        }
        let holder = state.quaffle_holder();
        if holder.map(|h| h.id) == Some(player.id) {
            let rate = self.best_goal_rate(state, player);
            let tier_weight = Self::tier_weight(&w.holding_tiers, tier);
            return w.quaffle_possession + w.goal_chance * tier_weight * rate;
        }
        let mut value = match distance(player.position, state.quaffle) {
            Ok(d) if d > 0 => w.quaffle_proximity / f64::from(d),
            Ok(_) => w.quaffle_proximity,
            Err(_) => 0.0,
        };
        if let Some(holder) = holder.filter(|h| h.id.side() == player.id.side()) {
            let rate = self.best_goal_rate(state, holder);
            value += w.goal_potential * Self::tier_weight(&w.support_tiers, tier) * rate;
        }
        value
    }

    /// Highest chance of the holder scoring with a direct throw.
    fn best_goal_rate(&self, state: &Environment, holder: &Player) -> f64 {
        LEFT_GOALS
            .iter()
            .chain(RIGHT_GOALS.iter())
            .filter(|&&goal| self.oracle.is_shot_on_goal(holder.id, goal) == ShotOnGoal::Goal)
            .map(|&goal| {
                self.oracle
                    .shot_success_probability(state, holder.id, Ball::Quaffle, goal)
            })
            .fold(0.0, f64::max)
    }

    /// Bludger closeness: good near own beaters, bad near own other players.
    fn area_control(&self, state: &Environment, side: TeamSide) -> f64 {
        let w = self.weights;
        let mut total = 0.0;
        for bludger in &state.bludgers {
            for player in state.team(side).players().filter(|p| p.is_on_pitch()) {
                let Ok(d) = distance(bludger.position, player.position) else {
                    continue;
                };
                let closeness = 1.0 / f64::from(d + 1);
                if player.role() == Role::Beater {
                    total += w.bludger_beater * closeness;
                } else {
                    total -= w.bludger_danger * closeness;
                }
            }
        }
        total
    }

    fn ban_penalty(&self, team: &Team, ctx: EvalContext) -> f64 {
        let w = self.weights;
        let banned = team.banned_count();
        let mut penalty = f64::from(banned) * w.ban_unit;
        if banned > w.ban_threshold {
            penalty += w.ban_disqualification;
        }
        if ctx.goal_scored_this_round {
            penalty *= 1.0 - (w.goal_ban_rebate * f64::from(banned)).min(1.0);
        }
        penalty
    }

    fn score_term(&self, diff: i64) -> f64 {
        let w = self.weights;
        let d = diff as f64;
        match self.tier(diff) {
            Tier::FarBehind => w.score_far_behind * d,
            Tier::FarAhead => w.score_linear * d + w.far_ahead_bonus,
            Tier::Even => w.score_linear * d,
        }
    }
}
