//! Turn orchestration.
//!
//! Keeps the authoritative mirror of the match, applies snapshots as they
//! arrive and runs one decision worker per turn request. A worker decides on
//! a point-in-time clone of the mirror and never holds the mirror lock while
//! searching. Starting a new turn marks the previous one stale, stops its
//! worker and joins it; stale answers are never sent. A snapshot that lands
//! while the current turn is still unanswered restarts its decision on the
//! new state under the original deadline.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::board::{Answer, EntityId, Environment, Overtime, Position, TeamSide, TurnKind};
use crate::config::{EngineConfig, OvertimeConfig};
use crate::eval::EvalContext;
use crate::movegen::Oracle;
use crate::protocol::{DeltaRequest, Inbound, MatchStart, Next, Outbound, Snapshot, TeamFormation};
use crate::search::{
    compute_best_action, compute_best_move, compute_best_redeploy, compute_fan_action, Budget,
    DecisionContext,
};

/// Opening formation of the left team in roster order; the right team uses
/// the mirror image.
pub const LEFT_FORMATION: [Position; 7] = [
    Position::new(3, 8),
    Position::new(3, 6),
    Position::new(7, 4),
    Position::new(6, 6),
    Position::new(7, 8),
    Position::new(6, 5),
    Position::new(6, 7),
];

pub fn opening_formation(side: TeamSide) -> [Position; 7] {
    match side {
        TeamSide::Left => LEFT_FORMATION,
        TeamSide::Right => LEFT_FORMATION.map(Position::mirrored),
    }
}

/// Decides one turn. Contract violations are logged and answered with Skip.
pub fn decide(
    oracle: &dyn Oracle,
    config: &EngineConfig,
    state: &Environment,
    eval: EvalContext,
    entity: EntityId,
    kind: TurnKind,
    budget: &Budget,
) -> Answer {
    let ctx = DecisionContext::new(oracle, config, eval, budget);
    let result = match kind {
        TurnKind::Move => compute_best_move(&ctx, state, entity),
        TurnKind::Action => compute_best_action(&ctx, state, entity),
        TurnKind::Fan => compute_fan_action(&ctx, state, entity),
        TurnKind::RemoveBan => compute_best_redeploy(&ctx, state, entity),
    };
    match result {
        Ok(answer) => answer,
        Err(err) => {
            error!(?entity, ?kind, %err, "decision failed, skipping");
            Answer::skip(entity)
        }
    }
}

/// Round-based escalation of the overtime stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OvertimeTracker {
    pub stage: Overtime,
    /// Round in which the current stage began.
    pub entered_round: u32,
}

impl OvertimeTracker {
    /// Advances through every stage whose threshold `round` has reached.
    pub fn advance(&mut self, round: u32, config: &OvertimeConfig) {
        loop {
            let threshold = match self.stage {
                Overtime::None => config.start_round,
                Overtime::Stage1 => self.entered_round.saturating_add(config.stage2_dwell),
                Overtime::Stage2 => self.entered_round.saturating_add(config.stage3_dwell),
                Overtime::Stage3 => return,
            };
            if round < threshold {
                return;
            }
            self.stage = self.stage.next();
            self.entered_round = threshold;
        }
    }
}

/// Everything the agent knows about the running match.
#[derive(Debug, Clone, Default)]
pub struct GameMirror {
    pub side: Option<TeamSide>,
    pub state: Option<Environment>,
    pub round: u32,
    pub goal_scored_this_round: bool,
    pub overtime: OvertimeTracker,
    /// Entities seen acting this round, per side index.
    pub acted: [HashSet<EntityId>; 2],
}

impl GameMirror {
    /// True if a snapshot this round named `entity` as the last actor.
    pub fn has_acted(&self, entity: EntityId) -> bool {
        entity
            .side()
            .is_some_and(|side| self.acted[side.index()].contains(&entity))
    }

    fn eval_context(&self) -> EvalContext {
        EvalContext {
            goal_scored_this_round: self.goal_scored_this_round,
            overtime: self.overtime.stage,
        }
    }

    fn apply(&mut self, snapshot: &Snapshot, mut state: Environment, config: &OvertimeConfig) {
        if self.state.is_none() || snapshot.round != self.round {
            for set in &mut self.acted {
                set.clear();
            }
            self.round = snapshot.round;
            self.overtime.advance(snapshot.round, config);
        }
        self.goal_scored_this_round = snapshot.goal_was_thrown_this_round;
        if let Some(actor) = snapshot.last_actor {
            if let Some(side) = actor.side() {
                self.acted[side.index()].insert(actor);
            }
        }
        state.overtime = self.overtime.stage;
        self.state = Some(state);
    }
}

/// Externally visible state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No snapshot received yet.
    Uninitialized,
    Ready,
    /// A decision worker is running.
    Deciding,
}

/// Whether the input loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
}

struct Outbox {
    active_turn: u64,
    /// Whether the active turn has been answered.
    answered: bool,
    sender: Sender<Outbound>,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    /// The request being decided, kept for restarts on a newer state.
    request: Next,
    received: Instant,
}

/// Holds the match mirror and the decision worker between messages.
pub struct Engine {
    config: Arc<EngineConfig>,
    oracle: Arc<dyn Oracle>,
    mirror: Arc<Mutex<GameMirror>>,
    outbox: Arc<Mutex<Outbox>>,
    worker: Option<Worker>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Engine {
    pub fn new(config: EngineConfig, oracle: Arc<dyn Oracle>, sender: Sender<Outbound>) -> Self {
        Engine {
            config: Arc::new(config),
            oracle,
            mirror: Arc::new(Mutex::new(GameMirror::default())),
            outbox: Arc::new(Mutex::new(Outbox {
                active_turn: 0,
                answered: false,
                sender,
            })),
            worker: None,
        }
    }

    pub fn status(&self) -> Status {
        if lock(&self.mirror).state.is_none() {
            return Status::Uninitialized;
        }
        match &self.worker {
            Some(worker) if !worker.handle.is_finished() => Status::Deciding,
            _ => Status::Ready,
        }
    }

    /// Our side, once the match has started.
    pub fn side(&self) -> Option<TeamSide> {
        lock(&self.mirror).side
    }

    /// A copy of the current mirror.
    pub fn mirror(&self) -> GameMirror {
        lock(&self.mirror).clone()
    }

    /// Dispatches one server message.
    pub fn handle(&mut self, message: Inbound) -> Flow {
        match message {
            Inbound::MatchStart(start) => self.start_match(&start),
            Inbound::Snapshot(snapshot) => self.apply_snapshot(&snapshot),
            Inbound::Next(next) => self.start_turn(next, Instant::now()),
            Inbound::MatchFinish(finish) => {
                info!(
                    winner = %finish.winner_user_name,
                    reason = %finish.victory_reason,
                    left = finish.left_points,
                    right = finish.right_points,
                    "match finished"
                );
                self.cancel_worker();
                return Flow::Finished;
            }
        }
        Flow::Continue
    }

    /// Picks our side by team name and answers with the opening formation.
    pub fn start_match(&mut self, start: &MatchStart) {
        let side = if start.left_team_user_name == self.config.team_name {
            TeamSide::Left
        } else {
            TeamSide::Right
        };
        {
            let mut mirror = lock(&self.mirror);
            *mirror = GameMirror {
                side: Some(side),
                ..GameMirror::default()
            };
        }
        info!(?side, "match started");
        let formation = TeamFormation::from(opening_formation(side));
        self.send(Outbound::TeamFormation(formation));
    }

    /// Validates and installs a snapshot. Invalid snapshots are dropped and
    /// the previous mirror is kept.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let state = snapshot.to_environment();
        if let Err(err) = state.validate() {
            error!(round = snapshot.round, %err, "rejected snapshot");
            return;
        }
        {
            let mut mirror = lock(&self.mirror);
            mirror.apply(snapshot, state, &self.config.overtime);
            debug!(round = mirror.round, overtime = ?mirror.overtime.stage, "snapshot applied");
        }
        self.restart_unanswered();
    }

    /// Re-decides the active turn on the freshly applied state, unless it has
    /// already been answered.
    fn restart_unanswered(&mut self) {
        let Some((request, received)) = self.worker.as_ref().map(|w| (w.request, w.received))
        else {
            return;
        };
        let turn_id = {
            let mut outbox = lock(&self.outbox);
            if outbox.answered {
                return;
            }
            outbox.active_turn += 1;
            outbox.active_turn
        };
        debug!(entity = ?request.turn, "state changed mid-decision, restarting");
        self.cancel_worker();
        self.launch(request, received, turn_id);
    }

    /// Handles a turn request received at `received`. Requests we cannot
    /// answer are ignored.
    pub fn start_turn(&mut self, next: Next, received: Instant) {
        let turn_id = {
            let mut outbox = lock(&self.outbox);
            outbox.active_turn += 1;
            outbox.answered = false;
            outbox.active_turn
        };
        self.cancel_worker();
        self.launch(next, received, turn_id);
    }

    /// Spawns the decision worker for `next` as turn `turn_id`.
    fn launch(&mut self, next: Next, received: Instant, turn_id: u64) {
        let (state, eval, side, acted) = {
            let mirror = lock(&self.mirror);
            let (Some(state), Some(side)) = (mirror.state.clone(), mirror.side) else {
                warn!(entity = ?next.turn, "turn request before match state, ignoring");
                return;
            };
            (state, mirror.eval_context(), side, mirror.has_acted(next.turn))
        };
        if next.turn.is_ball() || next.turn.side() != Some(side) {
            debug!(entity = ?next.turn, "not our turn");
            return;
        }
        if acted && next.kind == TurnKind::Move {
            warn!(entity = ?next.turn, "move requested after acting this round");
        }

        let timeout_ms = if next.timeout == 0 {
            self.config.default_timeout_ms
        } else {
            next.timeout
        };
        let usable = Duration::from_millis(timeout_ms.saturating_sub(self.config.safety_margin_ms));
        let budget = Budget::new(received + usable, Arc::new(AtomicBool::new(false)));
        let stop = budget.stop_flag();

        let config = Arc::clone(&self.config);
        let oracle = Arc::clone(&self.oracle);
        let outbox = Arc::clone(&self.outbox);
        let handle = thread::spawn(move || {
            let answer = decide(
                oracle.as_ref(),
                &config,
                &state,
                eval,
                next.turn,
                next.kind,
                &budget,
            );
            let mut outbox = lock(&outbox);
            if outbox.active_turn != turn_id {
                debug!(entity = ?next.turn, "dropping stale answer");
                return;
            }
            debug!(
                entity = ?next.turn,
                kind = ?answer.kind,
                target = ?answer.target,
                left = ?budget.remaining(),
                "answer"
            );
            outbox.answered = true;
            if outbox
                .sender
                .send(Outbound::DeltaRequest(DeltaRequest::from(answer)))
                .is_err()
            {
                warn!("output channel closed");
            }
        });
        self.worker = Some(Worker {
            stop,
            handle,
            request: next,
            received,
        });
    }

    /// Waits for the running decision, if any, to finish and send.
    pub fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.handle.join().is_err() {
                error!("decision worker panicked");
            }
        }
    }

    /// Stops the running decision and waits for it.
    fn cancel_worker(&mut self) {
        if let Some(worker) = &self.worker {
            worker.stop.store(true, Ordering::Relaxed);
        }
        self.join_worker();
    }

    fn send(&self, message: Outbound) {
        if lock(&self.outbox).sender.send(message).is_err() {
            warn!("output channel closed");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{distance, AnswerKind, Ball, Candidate, Cell, Team};
    use crate::movegen::{ShotOnGoal, StandardRules};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::{self, Receiver};

    fn engine() -> (Engine, Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel();
        let config = EngineConfig {
            team_name: "us".to_string(),
            ..EngineConfig::default()
        };
        (Engine::new(config, Arc::new(StandardRules::default()), tx), rx)
    }

    fn snapshot(round: u32) -> Snapshot {
        let left = Team::from_positions(TeamSide::Left, LEFT_FORMATION);
        let right = left.mirrored();
        let mut state = Environment::new(left, right);
        state.round = round;
        Snapshot::from_environment(&state)
    }

    fn start(engine: &mut Engine, left: &str) {
        engine.start_match(&MatchStart {
            left_team_user_name: left.to_string(),
            right_team_user_name: "other".to_string(),
        });
    }

    fn next(turn: EntityId, kind: TurnKind) -> Next {
        Next {
            turn,
            kind,
            timeout: 500,
        }
    }

    #[test]
    fn formation_mirrors_for_the_right_side() {
        let right = opening_formation(TeamSide::Right);
        assert_eq!(right[0], Position::new(13, 8));
        assert_eq!(right[5], Position::new(10, 5));
    }

    #[test]
    fn match_start_picks_side_and_sends_formation() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        assert_eq!(engine.side(), Some(TeamSide::Left));
        let Ok(Outbound::TeamFormation(f)) = rx.try_recv() else {
            panic!("expected a formation");
        };
        assert_eq!((f.seeker_x, f.seeker_y), (3, 8));

        let (mut engine, _rx) = self::engine();
        start(&mut engine, "them");
        assert_eq!(engine.side(), Some(TeamSide::Right));
    }

    #[test]
    fn status_follows_snapshots() {
        let (mut engine, _rx) = engine();
        assert_eq!(engine.status(), Status::Uninitialized);
        start(&mut engine, "us");
        assert_eq!(engine.status(), Status::Uninitialized);
        engine.apply_snapshot(&snapshot(1));
        assert_eq!(engine.status(), Status::Ready);
    }

    #[test]
    fn invalid_snapshot_keeps_previous_state() {
        let (mut engine, _rx) = engine();
        start(&mut engine, "us");
        engine.apply_snapshot(&snapshot(1));
        let before = engine.mirror().state;

        let mut bad = snapshot(2);
        bad.left_team.chaser1 = bad.left_team.chaser2;
        engine.apply_snapshot(&bad);
        assert_eq!(engine.mirror().state, before);
        assert_eq!(engine.mirror().round, 1);
    }

    #[test]
    fn acted_sets_reset_on_round_change() {
        let (mut engine, _rx) = engine();
        start(&mut engine, "us");
        let mut s = snapshot(3);
        s.last_actor = Some(EntityId::RightKeeper);
        engine.apply_snapshot(&s);
        let mirror = engine.mirror();
        assert!(mirror.has_acted(EntityId::RightKeeper));
        assert!(!mirror.has_acted(EntityId::LeftKeeper));
        assert!(!mirror.has_acted(EntityId::Quaffle));

        engine.apply_snapshot(&snapshot(4));
        assert!(engine.mirror().acted.iter().all(HashSet::is_empty));
        assert!(!engine.mirror().has_acted(EntityId::RightKeeper));
    }

    #[test]
    fn overtime_escalates_by_round() {
        let config = OvertimeConfig {
            start_round: 10,
            stage2_dwell: 2,
            stage3_dwell: 3,
        };
        let mut tracker = OvertimeTracker::default();
        tracker.advance(9, &config);
        assert_eq!(tracker.stage, Overtime::None);
        tracker.advance(10, &config);
        assert_eq!(tracker.stage, Overtime::Stage1);
        tracker.advance(11, &config);
        assert_eq!(tracker.stage, Overtime::Stage1);
        tracker.advance(12, &config);
        assert_eq!(tracker.stage, Overtime::Stage2);
        tracker.advance(15, &config);
        assert_eq!(tracker.stage, Overtime::Stage3);

        let mut jump = OvertimeTracker::default();
        jump.advance(40, &config);
        assert_eq!(jump.stage, Overtime::Stage3);
    }

    #[test]
    fn own_turn_is_answered() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));
        engine.start_turn(next(EntityId::LeftChaser2, TurnKind::Move), Instant::now());
        engine.join_worker();
        let Ok(Outbound::DeltaRequest(delta)) = rx.try_recv() else {
            panic!("expected an answer");
        };
        assert_eq!(delta.active_entity, EntityId::LeftChaser2);
        assert!(matches!(delta.delta_type, AnswerKind::Move | AnswerKind::Skip));
        assert_eq!(engine.status(), Status::Ready);
    }

    #[test]
    fn foreign_and_ball_turns_are_ignored() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));
        engine.start_turn(next(EntityId::RightChaser2, TurnKind::Move), Instant::now());
        engine.start_turn(next(EntityId::Quaffle, TurnKind::Move), Instant::now());
        engine.join_worker();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn turn_without_state_is_ignored() {
        let (mut engine, rx) = engine();
        engine.start_turn(next(EntityId::LeftSeeker, TurnKind::Move), Instant::now());
        engine.join_worker();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn contract_violation_becomes_skip() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));
        engine.start_turn(next(EntityId::LeftBeater1, TurnKind::RemoveBan), Instant::now());
        engine.join_worker();
        let Ok(Outbound::DeltaRequest(delta)) = rx.try_recv() else {
            panic!("expected an answer");
        };
        assert_eq!(delta.delta_type, AnswerKind::Skip);
        assert_eq!(delta.active_entity, EntityId::LeftBeater1);
    }

    #[test]
    fn superseded_turn_sends_only_the_latest_answer() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));
        engine.start_turn(next(EntityId::LeftChaser1, TurnKind::Move), Instant::now());
        engine.start_turn(next(EntityId::LeftChaser2, TurnKind::Move), Instant::now());
        engine.join_worker();
        let answers: Vec<Outbound> = rx.try_iter().collect();
        let last = answers.last().cloned();
        assert!(matches!(
            last,
            Some(Outbound::DeltaRequest(d)) if d.active_entity == EntityId::LeftChaser2
        ));
        assert!(answers.len() <= 2);
    }

    /// Standard rules whose first move enumeration waits for `release`.
    struct GatedRules {
        inner: StandardRules,
        release: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl Oracle for GatedRules {
        fn legal_moves(&self, state: &Environment, actor: EntityId) -> Vec<Candidate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            while !self.release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            self.inner.legal_moves(state, actor)
        }

        fn legal_shots(
            &self,
            state: &Environment,
            actor: EntityId,
            min_success: f64,
        ) -> Vec<Candidate> {
            self.inner.legal_shots(state, actor, min_success)
        }

        fn legal_wrest(&self, state: &Environment, actor: EntityId) -> Option<Candidate> {
            self.inner.legal_wrest(state, actor)
        }

        fn legal_redeploy_cells(&self, state: &Environment, side: TeamSide) -> Vec<Position> {
            self.inner.legal_redeploy_cells(state, side)
        }

        fn shot_success_probability(
            &self,
            state: &Environment,
            actor: EntityId,
            ball: Ball,
            target: Position,
        ) -> f64 {
            self.inner.shot_success_probability(state, actor, ball, target)
        }

        fn is_shot_on_goal(&self, actor: EntityId, target: Position) -> ShotOnGoal {
            self.inner.is_shot_on_goal(actor, target)
        }

        fn all_legal_cells_around(
            &self,
            state: &Environment,
            pos: Position,
            side: TeamSide,
        ) -> Vec<Position> {
            self.inner.all_legal_cells_around(state, pos, side)
        }

        fn cell_kind(&self, pos: Position) -> Cell {
            self.inner.cell_kind(pos)
        }

        fn advance_snitch(&self, state: &mut Environment, overtime: Overtime) {
            self.inner.advance_snitch(state, overtime)
        }
    }

    #[test]
    fn snapshot_during_decision_restarts_it_on_the_new_state() {
        let (tx, rx) = mpsc::channel();
        let release = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let rules = GatedRules {
            inner: StandardRules::default(),
            release: Arc::clone(&release),
            calls: Arc::clone(&calls),
        };
        let config = EngineConfig {
            team_name: "us".to_string(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config, Arc::new(rules), tx);
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));

        let mut request = next(EntityId::LeftChaser1, TurnKind::Move);
        request.timeout = 10_000;
        engine.start_turn(request, Instant::now());
        while calls.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        // Same round, chaser moved from (7, 8) to (8, 10).
        let moved_to = Position::new(8, 10);
        let mut update = snapshot(1);
        update.left_team.chaser1.x_pos = moved_to.x;
        update.left_team.chaser1.y_pos = moved_to.y;
        let opener = Arc::clone(&release);
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            opener.store(true, Ordering::SeqCst);
        });
        engine.apply_snapshot(&update);
        engine.join_worker();
        releaser.join().unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 2);
        let answers: Vec<Outbound> = rx.try_iter().collect();
        assert_eq!(answers.len(), 1);
        let Outbound::DeltaRequest(delta) = &answers[0] else {
            panic!("expected a delta request");
        };
        assert_eq!(delta.active_entity, EntityId::LeftChaser1);
        if delta.delta_type == AnswerKind::Move {
            let target = Position::new(delta.x_pos_new.unwrap(), delta.y_pos_new.unwrap());
            assert_eq!(distance(moved_to, target), Ok(1));
        }
    }

    #[test]
    fn answered_turn_is_not_restarted_by_a_snapshot() {
        let (mut engine, rx) = engine();
        start(&mut engine, "us");
        let _formation = rx.try_recv();
        engine.apply_snapshot(&snapshot(1));
        engine.start_turn(next(EntityId::LeftChaser2, TurnKind::Move), Instant::now());
        let first = rx.recv_timeout(Duration::from_secs(10));
        assert!(matches!(first, Ok(Outbound::DeltaRequest(_))));
        engine.apply_snapshot(&snapshot(1));
        engine.join_worker();
        assert!(rx.try_recv().is_err());
    }
}
