//! Expected-value arg-max over candidate actions.

use thiserror::Error;

use crate::board::{Candidate, Environment};

use super::budget::Budget;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChooserError {
    #[error("no candidates to choose from")]
    Empty,
}

/// The winning candidate and its expected value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub index: usize,
    pub expected_value: f64,
}

/// Result of a budgeted scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scan {
    /// Best candidate among those scanned, `None` if none was reached.
    pub best: Option<Choice>,
    /// True if every candidate was scanned before the budget ran out.
    pub complete: bool,
}

/// Probability-weighted sum of `eval` over the candidate's outcomes.
pub fn expected_value<F>(candidate: &Candidate, mut eval: F) -> f64
where
    F: FnMut(&Environment) -> f64,
{
    candidate
        .outcomes
        .iter()
        .map(|o| o.probability * eval(&o.state))
        .sum()
}

/// Picks the candidate with the highest expected value. The first one seen
/// wins ties.
pub fn choose_best<F>(candidates: &[Candidate], mut eval: F) -> Result<Choice, ChooserError>
where
    F: FnMut(&Environment) -> f64,
{
    let mut best: Option<Choice> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let ev = expected_value(candidate, &mut eval);
        if best.map_or(true, |b| ev > b.expected_value) {
            best = Some(Choice {
                index,
                expected_value: ev,
            });
        }
    }
    best.ok_or(ChooserError::Empty)
}

/// Anytime variant of [`choose_best`]: stops between candidates once the
/// budget has expired and reports how far it got.
pub fn choose_best_within<F>(
    candidates: &[Candidate],
    mut eval: F,
    budget: &Budget,
) -> Result<Scan, ChooserError>
where
    F: FnMut(&Environment) -> f64,
{
    if candidates.is_empty() {
        return Err(ChooserError::Empty);
    }
    let mut best: Option<Choice> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if budget.expired() {
            return Ok(Scan {
                best,
                complete: false,
            });
        }
        let ev = expected_value(candidate, &mut eval);
        if best.map_or(true, |b| ev > b.expected_value) {
            best = Some(Choice {
                index,
                expected_value: ev,
            });
        }
    }
    Ok(Scan {
        best,
        complete: true,
    })
}
