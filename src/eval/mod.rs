//! State evaluation.
//!
//! Scores a match state from a given side's perspective: per-role team
//! values, bludger area control, ban penalties and the score difference.

pub mod heuristic;
pub mod weights;

pub use heuristic::{team_has_quaffle, EvalContext, Evaluator};
pub use weights::{EvalWeights, TierWeights};
