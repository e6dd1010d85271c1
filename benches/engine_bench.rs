use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use broomstick::board::{EntityId, Environment, Position, Snitch, Team, TeamSide};
use broomstick::config::EngineConfig;
use broomstick::eval::{EvalContext, EvalWeights, Evaluator};
use broomstick::movegen::{Oracle, StandardRules};
use broomstick::search::{compute_best_move, player_path, Budget, DecisionContext};

fn midgame() -> Environment {
    let left = Team::from_positions(
        TeamSide::Left,
        [(5, 4), (12, 11), (1, 3), (3, 0), (2, 10), (8, 5), (10, 7)].map(Position::from),
    );
    let right = Team::from_positions(
        TeamSide::Right,
        [(11, 8), (13, 12), (0, 6), (4, 2), (6, 1), (9, 9), (7, 3)].map(Position::from),
    );
    let mut state = Environment::new(left, right);
    state.quaffle = Position::new(8, 5);
    state.snitch = Snitch::at(Position::new(12, 9));
    state
}

fn bench_evaluate(c: &mut Criterion) {
    let state = midgame();
    let rules = StandardRules::default();
    let weights = EvalWeights::default();
    let evaluator = Evaluator::new(&rules, &weights);
    c.bench_function("evaluate_midgame", |b| {
        b.iter(|| {
            evaluator.evaluate(
                black_box(&state),
                black_box(TeamSide::Left),
                EvalContext::default(),
            )
        })
    });
}

fn bench_find_path(c: &mut Criterion) {
    let state = midgame();
    let rules = StandardRules::default();
    c.bench_function("player_path_keeper_across", |b| {
        b.iter(|| {
            player_path(
                &rules,
                black_box(&state),
                EntityId::RightKeeper,
                black_box(Position::new(0, 4)),
            )
        })
    });
}

fn bench_legal_moves(c: &mut Criterion) {
    let state = midgame();
    let rules = StandardRules::default();
    c.bench_function("legal_moves_holder", |b| {
        b.iter(|| rules.legal_moves(black_box(&state), EntityId::LeftChaser2))
    });
}

fn bench_best_move(c: &mut Criterion) {
    let state = midgame();
    let rules = StandardRules::default();
    let mut group = c.benchmark_group("best_move");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));
    for depth in [1, 2] {
        let mut config = EngineConfig::default();
        config.search.max_depth = depth;
        group.bench_function(format!("chaser_depth_{depth}"), |b| {
            b.iter(|| {
                let budget = Budget::unbounded();
                let ctx = DecisionContext::new(&rules, &config, EvalContext::default(), &budget);
                compute_best_move(&ctx, black_box(&state), EntityId::LeftChaser2)
            })
        });
    }
    group.finish();
}

fn bench_state_clone(c: &mut Criterion) {
    let state = midgame();
    c.bench_function("environment_clone", |b| {
        b.iter(|| black_box(&state).clone())
    });
}

criterion_group!(
    benches,
    bench_evaluate,
    bench_find_path,
    bench_legal_moves,
    bench_best_move,
    bench_state_clone,
);
criterion_main!(benches);
