//! Throws, bludger beatings and wrests.
//!
//! A quaffle throw can be intercepted by opposing handlers on the flight
//! line, then lands with a per-cell decaying chance and otherwise scatters
//! to a neighbouring cell. A bludger beating needs a clear line and may knock
//! out whoever stands on the target cell.

use crate::board::{
    cell_kind, crossed_cells, distance, goals_attacked_by, goals_defended_by, neighbours, Action,
    Ball, Candidate, EntityId, Environment, Outcome, Position, Role, CENTER,
};

use super::{branch, RulesConfig, ShotOnGoal};

/// Classifies a quaffle throw target from the thrower's point of view.
pub fn classify_target(actor: EntityId, target: Position) -> ShotOnGoal {
    let Some(side) = actor.side() else {
        return ShotOnGoal::Miss;
    };
    if goals_attacked_by(side).contains(&target) {
        ShotOnGoal::Goal
    } else if goals_defended_by(side).contains(&target) {
        ShotOnGoal::OwnGoal
    } else {
        ShotOnGoal::Miss
    }
}

/// Probability that `ball` thrown by `actor` arrives at `target` untouched.
///
/// Zero for anything the actor cannot legally throw there.
pub fn success_probability(
    config: &RulesConfig,
    state: &Environment,
    actor: EntityId,
    ball: Ball,
    target: Position,
) -> f64 {
    let Some(player) = state.player(actor).filter(|p| p.is_active()) else {
        return 0.0;
    };
    let from = player.position;
    let Ok(dist) = distance(from, target) else {
        return 0.0;
    };
    if dist == 0 || state.has_cube(target) {
        return 0.0;
    }
    match ball {
        Ball::Quaffle => {
            if dist > config.throw_range || !player.role().handles_quaffle() {
                return 0.0;
            }
            let mut reach = 1.0;
            for _ in interceptors(state, actor, from, target) {
                reach *= 1.0 - config.intercept_chance;
            }
            reach * config.throw_success.powi(dist)
        }
        Ball::Bludger(id) => {
            let holds = state.bludger(id).is_some_and(|b| b.position == from);
            if !holds || player.role() != Role::Beater || dist > config.bludger_range {
                return 0.0;
            }
            if flight_is_clear(state, from, target) {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Opposing active handlers standing on the flight line, nearest first.
fn interceptors(
    state: &Environment,
    actor: EntityId,
    from: Position,
    target: Position,
) -> Vec<Position> {
    let Some(side) = actor.side() else {
        return Vec::new();
    };
    let Ok(cells) = crossed_cells(from, target) else {
        return Vec::new();
    };
    cells
        .into_iter()
        .filter(|&c| {
            state.player_at(c).is_some_and(|p| {
                p.id.side() == Some(side.opponent()) && p.is_active() && p.role().handles_quaffle()
            })
        })
        .collect()
}

fn flight_is_clear(state: &Environment, from: Position, target: Position) -> bool {
    match crossed_cells(from, target) {
        Ok(cells) => cells
            .iter()
            .all(|&c| state.player_at(c).is_none() && !state.has_cube(c)),
        Err(_) => false,
    }
}

/// In-bounds cells within king distance `range` of `from`, row by row.
fn cells_within(from: Position, range: i32) -> impl Iterator<Item = Position> {
    (from.y - range..=from.y + range).flat_map(move |y| {
        (from.x - range..=from.x + range)
            .map(move |x| Position::new(x, y))
            .filter(move |&p| p != from && p.is_in_bounds())
    })
}

/// Throws of the held quaffle and beatings of a carried bludger.
pub fn legal_shots(
    config: &RulesConfig,
    state: &Environment,
    actor: EntityId,
    min_success: f64,
) -> Vec<Candidate> {
    let Some(player) = state.player(actor).filter(|p| p.is_active()) else {
        return Vec::new();
    };
    let from = player.position;
    let mut shots = Vec::new();

    if state.quaffle_holder().map(|h| h.id) == Some(actor) {
        for target in cells_within(from, config.throw_range) {
            let p = success_probability(config, state, actor, Ball::Quaffle, target);
            if p > 0.0 && p >= min_success {
                shots.push(Candidate {
                    action: Action::Throw {
                        actor,
                        ball: Ball::Quaffle,
                        target,
                    },
                    success: p,
                    outcomes: throw_outcomes(config, state, actor, target),
                });
            }
        }
    }

    if player.role() == Role::Beater {
        if let Some(bludger) = state.bludger_at(from).map(|b| b.id) {
            let ball = Ball::Bludger(bludger);
            for target in cells_within(from, config.bludger_range) {
                let p = success_probability(config, state, actor, ball, target);
                if p > 0.0 && p >= min_success {
                    shots.push(Candidate {
                        action: Action::Throw {
                            actor,
                            ball,
                            target,
                        },
                        success: p,
                        outcomes: beating_outcomes(config, state, bludger, target),
                    });
                }
            }
        }
    }

    shots
}

/// Outcomes of a quaffle throw: interceptions, a clean landing, or a scatter.
pub fn throw_outcomes(
    config: &RulesConfig,
    state: &Environment,
    actor: EntityId,
    target: Position,
) -> Vec<Outcome> {
    let Some(from) = state.player(actor).map(|p| p.position) else {
        return Vec::new();
    };
    let Ok(dist) = distance(from, target) else {
        return Vec::new();
    };
    let mut outcomes = Vec::new();
    let mut remaining = 1.0;

    for cell in interceptors(state, actor, from, target) {
        let caught = remaining * config.intercept_chance;
        let mut s = state.clone();
        s.quaffle = cell;
        outcomes.push(Outcome {
            probability: caught,
            state: s,
        });
        remaining -= caught;
    }

    let lands = config.throw_success.powi(dist);
    let scatter: Vec<Position> = neighbours(target)
        .into_iter()
        .filter(|&c| !state.has_cube(c) && !cell_kind(c).is_goal())
        .collect();

    let mut landed = state.clone();
    land_quaffle(config, &mut landed, actor, target);
    if scatter.is_empty() {
        outcomes.push(Outcome {
            probability: remaining,
            state: landed,
        });
        return outcomes;
    }
    outcomes.push(Outcome {
        probability: remaining * lands,
        state: landed,
    });
    let share = remaining * (1.0 - lands) / scatter.len() as f64;
    if share > 0.0 {
        for cell in scatter {
            let mut s = state.clone();
            s.quaffle = cell;
            outcomes.push(Outcome {
                probability: share,
                state: s,
            });
        }
    }
    outcomes
}

/// Puts the quaffle on `target`, scoring if the cell is a goal ring.
fn land_quaffle(config: &RulesConfig, state: &mut Environment, actor: EntityId, target: Position) {
    let Some(side) = actor.side() else {
        state.quaffle = target;
        return;
    };
    match classify_target(actor, target) {
        ShotOnGoal::Goal => {
            state.team_mut(side).score += config.goal_points;
            state.quaffle = CENTER;
        }
        ShotOnGoal::OwnGoal => {
            state.team_mut(side.opponent()).score += config.goal_points;
            state.quaffle = CENTER;
        }
        ShotOnGoal::Miss => state.quaffle = target,
    }
}

/// Outcomes of sending `bludger` to `target`.
pub fn beating_outcomes(
    config: &RulesConfig,
    state: &Environment,
    bludger: EntityId,
    target: Position,
) -> Vec<Outcome> {
    let mut moved = state.clone();
    if let Some(b) = moved.bludger_mut(bludger) {
        b.position = target;
    }
    let outcomes = vec![Outcome {
        probability: 1.0,
        state: moved,
    }];
    match state.player_at(target) {
        Some(victim) if victim.role() != Role::Beater => {
            let victim = victim.id;
            branch(outcomes, config.knockout_chance, |s| {
                if let Some(p) = s.player_mut(victim) {
                    p.knocked_out = true;
                }
            })
        }
        _ => outcomes,
    }
}

/// The wrest attempt of a handler standing next to an opposing holder.
pub fn legal_wrest(config: &RulesConfig, state: &Environment, actor: EntityId) -> Option<Candidate> {
    let player = state.player(actor).filter(|p| p.is_active())?;
    if !player.role().handles_quaffle() {
        return None;
    }
    let side = actor.side()?;
    let holder = state.quaffle_holder()?;
    if holder.id.side() != Some(side.opponent()) {
        return None;
    }
    if distance(player.position, holder.position).ok()? != 1 {
        return None;
    }
    let to = player.position;
    let outcomes = branch(
        vec![Outcome {
            probability: 1.0,
            state: state.clone(),
        }],
        config.wrest_chance,
        |s| s.quaffle = to,
    );
    Some(Candidate {
        action: Action::Wrest {
            actor,
            target: holder.position,
        },
        success: config.wrest_chance,
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Team, TeamSide, LEFT_GOALS, RIGHT_GOALS};

    fn env() -> Environment {
        let left = Team::from_positions(
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
        );
        let right = left.mirrored();
        Environment::new(left, right)
    }

    fn total(outcomes: &[Outcome]) -> f64 {
        outcomes.iter().map(|o| o.probability).sum()
    }

    #[test]
    fn goal_classification_depends_on_side() {
        assert_eq!(classify_target(EntityId::LeftChaser1, RIGHT_GOALS[1]), ShotOnGoal::Goal);
        assert_eq!(classify_target(EntityId::LeftChaser1, LEFT_GOALS[1]), ShotOnGoal::OwnGoal);
        assert_eq!(classify_target(EntityId::RightKeeper, LEFT_GOALS[0]), ShotOnGoal::Goal);
        assert_eq!(classify_target(EntityId::RightKeeper, CENTER), ShotOnGoal::Miss);
        assert_eq!(classify_target(EntityId::Quaffle, RIGHT_GOALS[0]), ShotOnGoal::Miss);
    }

    #[test]
    fn success_decays_with_distance() {
        let config = RulesConfig::default();
        let mut e = env();
        e.quaffle = Position::new(11, 2);
        e.left.chasers[0].position = Position::new(11, 2);
        let throw = |target| {
            success_probability(&config, &e, EntityId::LeftChaser1, Ball::Quaffle, target)
        };
        let near = throw(Position::new(12, 2));
        let far = throw(Position::new(14, 2));
        assert!((near - config.throw_success).abs() < 1e-12);
        assert!(far < near);
        assert_eq!(throw(Position::new(11, 9)), 0.0);
    }

    #[test]
    fn opposing_handler_on_the_line_intercepts() {
        let config = RulesConfig::default();
        let mut e = env();
        // Left chaser 1 at (7,8) throws across the right chaser at (9,8).
        e.quaffle = e.left.chasers[0].position;
        let target = Position::new(11, 8);
        let p = success_probability(&config, &e, EntityId::LeftChaser1, Ball::Quaffle, target);
        let expected = (1.0 - config.intercept_chance) * config.throw_success.powi(4);
        assert!((p - expected).abs() < 1e-12);

        let outcomes = throw_outcomes(&config, &e, EntityId::LeftChaser1, target);
        assert!((total(&outcomes) - 1.0).abs() < 1e-12);
        let intercepted = &outcomes[0];
        assert!((intercepted.probability - config.intercept_chance).abs() < 1e-12);
        assert_eq!(
            intercepted.state.quaffle_holder().map(|h| h.id),
            Some(EntityId::RightChaser1)
        );
    }

    #[test]
    fn throw_through_a_ring_scores() {
        let config = RulesConfig::default();
        let mut e = env();
        e.left.chasers[0].position = Position::new(12, 6);
        e.quaffle = Position::new(12, 6);
        // Right keeper stands at (13,6) and would intercept; move it aside.
        e.right.keeper.position = Position::new(15, 7);
        let outcomes = throw_outcomes(&config, &e, EntityId::LeftChaser1, RIGHT_GOALS[1]);
        assert!((total(&outcomes) - 1.0).abs() < 1e-12);
        let scored = outcomes
            .iter()
            .find(|o| o.state.left.score == config.goal_points)
            .unwrap();
        assert_eq!(scored.state.quaffle, CENTER);
        assert!((scored.probability - config.throw_success.powi(2)).abs() < 1e-12);
    }

    #[test]
    fn only_the_holder_may_throw() {
        let config = RulesConfig::default();
        let e = env();
        assert!(legal_shots(&config, &e, EntityId::LeftChaser1, 0.0).is_empty());
        let mut e = env();
        e.quaffle = e.left.chasers[0].position;
        let shots = legal_shots(&config, &e, EntityId::LeftChaser1, 0.5);
        assert!(!shots.is_empty());
        for s in &shots {
            assert!(s.success >= 0.5);
            assert!((total(&s.outcomes) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn beater_needs_a_clear_line() {
        let config = RulesConfig::default();
        let mut e = env();
        let beater = e.left.beaters[0].position;
        e.bludgers[0].position = beater;
        let ball = Ball::Bludger(EntityId::Bludger1);
        // (7,4) to (10,4) crosses the right beater at (9,4).
        assert_eq!(
            success_probability(&config, &e, EntityId::LeftBeater1, ball, Position::new(10, 4)),
            0.0
        );
        assert_eq!(
            success_probability(&config, &e, EntityId::LeftBeater1, ball, Position::new(9, 4)),
            1.0
        );
        let shots = legal_shots(&config, &e, EntityId::LeftBeater1, 0.5);
        assert!(shots
            .iter()
            .all(|c| matches!(c.action, Action::Throw { ball: Ball::Bludger(_), .. })));
    }

    #[test]
    fn beating_a_chaser_may_knock_it_out() {
        let config = RulesConfig::default();
        let e = env();
        let outcomes = beating_outcomes(&config, &e, EntityId::Bludger1, Position::new(9, 8));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|o| o.state.right.chasers[0].knocked_out));
    }

    #[test]
    fn wrest_requires_adjacent_opposing_holder() {
        let config = RulesConfig::default();
        let mut e = env();
        assert!(legal_wrest(&config, &e, EntityId::LeftChaser1).is_none());
        e.right.chasers[0].position = Position::new(8, 8);
        e.quaffle = Position::new(8, 8);
        e.bludgers[1].position = Position::new(8, 10);
        let wrest = legal_wrest(&config, &e, EntityId::LeftChaser1).unwrap();
        assert_eq!(wrest.action.target(), Position::new(8, 8));
        assert_eq!(wrest.outcomes.len(), 2);
        assert!(wrest
            .outcomes
            .iter()
            .any(|o| o.state.quaffle_holder().map(|h| h.id) == Some(EntityId::LeftChaser1)));
        assert!(legal_wrest(&config, &e, EntityId::LeftBeater1).is_none());
    }
}
