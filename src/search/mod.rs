//! Search and decision making.
//!
//! Path finding, the expected-value chooser and the per-turn selection
//! routines that turn a state into an answer under a time budget.

pub mod actions;
pub mod astar;
pub mod budget;
pub mod chooser;
pub mod fan;

pub use actions::{compute_best_action, compute_best_move, compute_best_redeploy, DecisionError};
pub use astar::{astar, find_path, player_path};
pub use budget::Budget;
pub use chooser::{choose_best, choose_best_within, expected_value, Choice, ChooserError, Scan};
pub use fan::compute_fan_action;

use crate::board::{Environment, TeamSide};
use crate::config::EngineConfig;
use crate::eval::{EvalContext, Evaluator};
use crate::movegen::Oracle;

/// Everything a decision needs besides the state itself.
#[derive(Clone, Copy)]
pub struct DecisionContext<'a> {
    pub oracle: &'a dyn Oracle,
    pub config: &'a EngineConfig,
    pub eval: EvalContext,
    pub budget: &'a Budget,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        oracle: &'a dyn Oracle,
        config: &'a EngineConfig,
        eval: EvalContext,
        budget: &'a Budget,
    ) -> Self {
        DecisionContext {
            oracle,
            config,
            eval,
            budget,
        }
    }

    pub fn evaluator(&self) -> Evaluator<'a> {
        Evaluator::new(self.oracle, &self.config.weights)
    }

    /// Static value of `state` for `side` in this context.
    pub fn static_value(&self, state: &Environment, side: TeamSide) -> f64 {
        self.evaluator().evaluate(state, side, self.eval)
    }
}
