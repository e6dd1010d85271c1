//! Self-play match generation.
//!
//! Plays full matches with both teams driven by the decision engine on the
//! reference rules. Outcomes of every chosen action are sampled from their
//! distributions with a seeded `SmallRng`, so a seed reproduces a match.
//! Fans are not simulated.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::board::{
    Answer, AnswerKind, Candidate, EntityId, Environment, Phase, Position, Snitch, Team, TeamSide,
    TurnKind, LEFT_PLAYERS, RIGHT_PLAYERS,
};
use crate::config::EngineConfig;
use crate::engine::{decide, opening_formation, OvertimeTracker};
use crate::eval::EvalContext;
use crate::movegen::redeploy::{legal_redeploy_cells, redeploy};
use crate::movegen::{Oracle, StandardRules};
use crate::search::Budget;

#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to write records: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration for self-play generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub num_games: usize,
    /// Time budget per decision (milliseconds).
    pub movetime_ms: u64,
    /// Matches still running after this round end as they stand.
    pub max_rounds: u32,
    /// Round in which the snitch enters the pitch.
    pub snitch_round: u32,
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    pub engine: EngineConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            movetime_ms: 50,
            max_rounds: 60,
            snitch_round: 10,
            threads: 4,
            seed: 0,
            engine: EngineConfig::default(),
        }
    }
}

/// Summary of one finished match, written as one JSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub rounds: u32,
    pub left_score: u32,
    pub right_score: u32,
    pub winner: Option<TeamSide>,
    pub snitch_caught: bool,
    pub decisions: u32,
    pub skips: u32,
}

struct Match<'a> {
    rules: &'a StandardRules,
    config: &'a SelfPlayConfig,
    state: Environment,
    overtime: OvertimeTracker,
    goal_this_round: bool,
    decisions: u32,
    skips: u32,
}

impl Match<'_> {
    fn eval_context(&self) -> EvalContext {
        EvalContext {
            goal_scored_this_round: self.goal_this_round,
            overtime: self.overtime.stage,
        }
    }

    fn finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    fn ask(&mut self, id: EntityId, kind: TurnKind) -> Answer {
        let budget = Budget::from_timeout(Duration::from_millis(self.config.movetime_ms));
        let answer = decide(
            self.rules,
            &self.config.engine,
            &self.state,
            self.eval_context(),
            id,
            kind,
            &budget,
        );
        self.decisions += 1;
        if answer.is_skip() {
            self.skips += 1;
        }
        answer
    }

    /// Plays a chosen move, throw or wrest by sampling one of its outcomes.
    fn play(&mut self, answer: Answer, rng: &mut SmallRng) {
        let id = answer.active_entity;
        let candidates: Vec<Candidate> = match answer.kind {
            AnswerKind::Move => self.rules.legal_moves(&self.state, id),
            AnswerKind::QuaffleThrow | AnswerKind::BludgerBeating => {
                self.rules.legal_shots(&self.state, id, 0.0)
            }
            AnswerKind::WrestQuaffle => self.rules.legal_wrest(&self.state, id).into_iter().collect(),
            _ => return,
        };
        let Some(candidate) = candidates
            .into_iter()
            .find(|c| Answer::from(c.action) == answer)
        else {
            warn!(?answer, "answer does not match a legal candidate");
            return;
        };
        let scores = (self.state.left.score, self.state.right.score);
        if let Some(next) = sample(candidate, rng) {
            self.state = next;
        }
        if (self.state.left.score, self.state.right.score) != scores {
            self.goal_this_round = true;
        }
    }

    fn can_act(&self, id: EntityId) -> bool {
        !self.rules.legal_shots(&self.state, id, 0.0).is_empty()
            || self.rules.legal_wrest(&self.state, id).is_some()
    }

    fn ball_phase(&mut self, round: u32, rng: &mut SmallRng, snitch_caught: bool) {
        self.state.phase = Phase::Ball;
        if !self.state.snitch.exists && !snitch_caught && round >= self.config.snitch_round {
            let free: Vec<Position> = legal_redeploy_cells(&self.state, TeamSide::Left)
                .into_iter()
                .chain(legal_redeploy_cells(&self.state, TeamSide::Right))
                .collect();
            if !free.is_empty() {
                self.state.snitch = Snitch::at(free[rng.gen_range(0..free.len())]);
            }
        }
        self.rules.advance_snitch(&mut self.state, self.overtime.stage);
    }

    fn player_phase(&mut self, rng: &mut SmallRng) {
        self.state.phase = Phase::Player;
        for (left, right) in LEFT_PLAYERS.into_iter().zip(RIGHT_PLAYERS) {
            for id in [left, right] {
                if self.finished() {
                    return;
                }
                if !self.state.player(id).is_some_and(|p| p.is_active()) {
                    continue;
                }
                let answer = self.ask(id, TurnKind::Move);
                self.play(answer, rng);
                if self.finished() {
                    return;
                }
                if self.state.player(id).is_some_and(|p| p.is_active()) && self.can_act(id) {
                    let answer = self.ask(id, TurnKind::Action);
                    self.play(answer, rng);
                }
            }
        }
    }

    fn unban_phase(&mut self) {
        self.state.phase = Phase::Unban;
        let banned: Vec<EntityId> = self
            .state
            .players()
            .filter(|p| p.is_fined)
            .map(|p| p.id)
            .collect();
        for id in banned {
            let answer = self.ask(id, TurnKind::RemoveBan);
            if let (AnswerKind::Unban, Some(cell)) = (answer.kind, answer.target) {
                redeploy(&mut self.state, id, cell);
            }
        }
        // Knockouts last until the end of the round.
        for side in [TeamSide::Left, TeamSide::Right] {
            for player in self.state.team_mut(side).players_mut() {
                player.knocked_out = false;
            }
        }
    }
}

fn sample(candidate: Candidate, rng: &mut SmallRng) -> Option<Environment> {
    let roll = rng.gen::<f64>() * candidate.total_probability();
    let mut acc = 0.0;
    let mut outcomes = candidate.outcomes;
    let last = outcomes.pop()?;
    for outcome in outcomes {
        acc += outcome.probability;
        if roll < acc {
            return Some(outcome.state);
        }
    }
    Some(last.state)
}

/// Plays one match to the end or to `max_rounds`.
pub fn play_game(config: &SelfPlayConfig, game_id: usize, rng: &mut SmallRng) -> GameRecord {
    let rules = StandardRules::new(config.engine.rules.clone());
    let left = Team::from_positions(TeamSide::Left, opening_formation(TeamSide::Left));
    let right = Team::from_positions(TeamSide::Right, opening_formation(TeamSide::Right));
    let mut game = Match {
        rules: &rules,
        config,
        state: Environment::new(left, right),
        overtime: OvertimeTracker::default(),
        goal_this_round: false,
        decisions: 0,
        skips: 0,
    };

    let mut snitch_caught = false;
    let mut rounds = 0;
    for round in 1..=config.max_rounds {
        rounds = round;
        game.state.round = round;
        game.goal_this_round = false;
        game.overtime.advance(round, &config.engine.overtime);
        game.state.overtime = game.overtime.stage;

        game.ball_phase(round, rng, snitch_caught);
        game.player_phase(rng);
        if game.finished() {
            snitch_caught = true;
            break;
        }
        game.unban_phase();
    }

    let (left_score, right_score) = (game.state.left.score, game.state.right.score);
    let winner = match left_score.cmp(&right_score) {
        std::cmp::Ordering::Greater => Some(TeamSide::Left),
        std::cmp::Ordering::Less => Some(TeamSide::Right),
        std::cmp::Ordering::Equal => None,
    };
    GameRecord {
        game_id,
        rounds,
        left_score,
        right_score,
        winner,
        snitch_caught,
        decisions: game.decisions,
        skips: game.skips,
    }
}

fn rng_for(config: &SelfPlayConfig, game_id: usize) -> SmallRng {
    if config.seed != 0 {
        SmallRng::seed_from_u64(config.seed.wrapping_add(game_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

fn log_game(game: &GameRecord, total: usize, n: usize, started: Instant) {
    info!(
        game = n,
        of = total,
        left = game.left_score,
        right = game.right_score,
        rounds = game.rounds,
        secs = started.elapsed().as_secs_f64(),
        "game finished"
    );
}

/// Plays `config.num_games` matches and returns their records.
///
/// With more than one thread the matches run concurrently on a rayon pool,
/// and records arrive in completion order.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, SelfPlayError> {
    if config.threads <= 1 {
        let mut games = Vec::with_capacity(config.num_games);
        for i in 0..config.num_games {
            let started = Instant::now();
            let game = play_game(config, i, &mut rng_for(config, i));
            log_game(&game, config.num_games, i + 1, started);
            games.push(game);
        }
        return Ok(games);
    }

    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let completed = AtomicUsize::new(0);
    let games: Vec<GameRecord> = pool.install(|| {
        (0..config.num_games)
            .into_par_iter()
            .map(|i| {
                let started = Instant::now();
                let game = play_game(config, i, &mut rng_for(config, i));
                let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                log_game(&game, config.num_games, n, started);
                game
            })
            .collect()
    });
    Ok(games)
}

/// Writes one JSON object per record and line.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> Result<(), SelfPlayError> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
