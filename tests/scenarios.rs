//! Decision scenarios on full match layouts.

mod common;

use broomstick::board::{
    cell_kind, AnswerKind, Environment, EntityId, Position, Snitch, TeamSide, LEFT_PLAYERS,
};
use broomstick::config::EngineConfig;
use broomstick::eval::{EvalContext, Evaluator};
use broomstick::movegen::{Oracle, StandardRules};
use broomstick::search::{
    choose_best, compute_best_move, compute_best_redeploy, expected_value, Budget,
    DecisionContext,
};

fn with_ctx<T>(config: &EngineConfig, f: impl FnOnce(&DecisionContext) -> T) -> T {
    let rules = StandardRules::new(config.rules.clone());
    let budget = Budget::unbounded();
    let ctx = DecisionContext::new(&rules, config, EvalContext::default(), &budget);
    f(&ctx)
}

#[test]
fn best_move_is_skip_or_a_listed_move() {
    let state = common::scattered();
    let config = common::shallow_config();
    let rules = StandardRules::default();
    for id in LEFT_PLAYERS {
        let answer = with_ctx(&config, |ctx| compute_best_move(ctx, &state, id)).unwrap();
        assert_eq!(answer.active_entity, id);
        match answer.kind {
            AnswerKind::Skip => {}
            AnswerKind::Move => {
                let target = answer.target.unwrap();
                assert!(rules.is_legal_move(&state, id, target), "{id:?} -> {target:?}");
            }
            other => panic!("unexpected answer kind {other:?}"),
        }
    }
}

#[test]
fn chosen_move_beats_standing_still() {
    let state = common::kickoff();
    let config = common::shallow_config();
    let rules = StandardRules::default();
    let evaluator = Evaluator::new(&rules, &config.weights);
    let value = |s: &Environment| evaluator.evaluate(s, TeamSide::Left, EvalContext::default());
    let skip_value = value(&state);

    for id in LEFT_PLAYERS {
        let answer = with_ctx(&config, |ctx| compute_best_move(ctx, &state, id)).unwrap();
        let moves = rules.legal_moves(&state, id);
        if answer.is_skip() {
            for candidate in &moves {
                assert!(expected_value(candidate, value) <= skip_value);
            }
        } else {
            let chosen = moves
                .iter()
                .find(|c| Some(c.action.target()) == answer.target)
                .unwrap();
            assert!(expected_value(chosen, value) > skip_value);
        }
    }
}

#[test]
fn mirrored_decisions_have_equal_value() {
    let mut state = common::kickoff();
    state.quaffle = Position::new(7, 7);
    state.snitch = Snitch::at(Position::new(4, 11));
    let mirrored = state.mirrored();
    let rules = StandardRules::default();
    let weights = common::shallow_config().weights;
    let evaluator = Evaluator::new(&rules, &weights);

    for (id, mirror_id) in [
        (EntityId::LeftChaser1, EntityId::RightChaser1),
        (EntityId::LeftSeeker, EntityId::RightSeeker),
        (EntityId::LeftBeater1, EntityId::RightBeater1),
    ] {
        let left = choose_best(&rules.legal_moves(&state, id), |s| {
            evaluator.evaluate(s, TeamSide::Left, EvalContext::default())
        })
        .unwrap();
        let right = choose_best(&rules.legal_moves(&mirrored, mirror_id), |s| {
            evaluator.evaluate(s, TeamSide::Right, EvalContext::default())
        })
        .unwrap();
        assert!((left.expected_value - right.expected_value).abs() < 1e-9);
    }
}

#[test]
fn symmetric_layout_is_balanced() {
    let state = common::symmetric();
    let rules = StandardRules::default();
    let weights = common::shallow_config().weights;
    let evaluator = Evaluator::new(&rules, &weights);
    assert_eq!(evaluator.evaluate(&state, TeamSide::Left, EvalContext::default()), 0.0);
    assert_eq!(evaluator.evaluate(&state, TeamSide::Right, EvalContext::default()), 0.0);
}

#[test]
fn redeploy_lands_on_a_legal_cell() {
    let mut state = common::scattered();
    state.left.chasers[1].is_fined = true;
    let config = common::shallow_config();
    let answer =
        with_ctx(&config, |ctx| compute_best_redeploy(ctx, &state, EntityId::LeftChaser2)).unwrap();
    assert_eq!(answer.kind, AnswerKind::Unban);
    let cell = answer.target.unwrap();
    assert!(state.is_free(cell));
    assert!(!cell_kind(cell).is_goal());
    assert!(cell_kind(cell).zone_owner().is_none());
    assert!(cell.x < 8);
}

#[test]
fn deeper_search_still_answers_legally() {
    let mut state = common::kickoff();
    state.quaffle = Position::new(8, 8);
    let config = EngineConfig::default();
    let rules = StandardRules::default();
    let answer =
        with_ctx(&config, |ctx| compute_best_move(ctx, &state, EntityId::LeftChaser1)).unwrap();
    if let Some(target) = answer.target {
        assert!(rules.is_legal_move(&state, EntityId::LeftChaser1, target));
    }
}

#[test]
fn deadline_in_the_past_skips() {
    let state = common::kickoff();
    let config = EngineConfig::default();
    let rules = StandardRules::default();
    let budget = Budget::from_timeout(std::time::Duration::ZERO);
    let ctx = DecisionContext::new(&rules, &config, EvalContext::default(), &budget);
    let answer = compute_best_move(&ctx, &state, EntityId::LeftChaser1).unwrap();
    assert!(answer.is_skip());
}
