//! Autonomous snitch movement.
//!
//! The snitch flees the seekers during regular play. Once a match runs
//! long it first drifts toward the nearest seeker, then toward the centre,
//! and finally lands on the nearest seeker.

use crate::board::{distance, neighbours, Environment, Overtime, Position, CENTER};

/// Moves the snitch one step according to `overtime`. No-op without a snitch.
pub fn advance(state: &mut Environment, overtime: Overtime) {
    if !state.snitch.exists {
        return;
    }
    let from = state.snitch.position;
    let seekers: Vec<Position> = [&state.left.seeker, &state.right.seeker]
        .into_iter()
        .filter(|s| s.is_active())
        .map(|s| s.position)
        .collect();
    let nearest = seekers
        .iter()
        .copied()
        .min_by_key(|&s| distance(from, s).unwrap_or(i32::MAX));

    let to = match overtime {
        Overtime::None => {
            if seekers.is_empty() {
                from
            } else {
                best_step(state, from, |p| {
                    -seekers
                        .iter()
                        .map(|&s| distance(p, s).unwrap_or(0))
                        .min()
                        .unwrap_or(0)
                })
            }
        }
        Overtime::Stage1 => match nearest {
            Some(seeker) => best_step(state, from, |p| distance(p, seeker).unwrap_or(i32::MAX)),
            None => from,
        },
        Overtime::Stage2 => best_step(state, from, |p| distance(p, CENTER).unwrap_or(i32::MAX)),
        Overtime::Stage3 => nearest.unwrap_or(from),
    };
    state.snitch.position = to;
}

/// The reachable cell (staying put included) with the lowest cost; the
/// current cell wins ties, then row-major order.
fn best_step<F>(state: &Environment, from: Position, cost: F) -> Position
where
    F: Fn(Position) -> i32,
{
    let mut best = from;
    let mut best_cost = cost(from);
    for p in neighbours(from) {
        if state.player_at(p).is_some() || state.has_cube(p) {
            continue;
        }
        let c = cost(p);
        if c < best_cost {
            best = p;
            best_cost = c;
        }
    }
    best
}
