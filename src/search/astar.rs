//! A* path search.
//!
//! Nodes live in an arena owned by one search call and point at their parent
//! by index. The frontier orders nodes by `f = g + h`, breaking ties by
//! insertion order, and a closed set keeps finalised states from being
//! expanded twice. Paths come back goal first, start last.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::hash::Hash;

use crate::board::{distance, EntityId, Environment, GeometryError, Position};
use crate::movegen::Oracle;

/// A search node: a state, its parent in the arena and the path cost so far.
#[derive(Debug, Clone, Copy)]
struct Node<S> {
    state: S,
    parent: Option<usize>,
    cost: i32,
}

/// Generic A* over any small copyable state.
///
/// Every step costs one. Returns the path from `goal` back to `start`
/// inclusive, or an empty vec when `start == goal` or the goal is unreachable.
pub fn astar<S, E, I, H>(start: S, goal: S, mut expand: E, heuristic: H) -> Vec<S>
where
    S: Copy + Eq + Hash,
    E: FnMut(S) -> I,
    I: IntoIterator<Item = S>,
    H: Fn(S) -> i32,
{
    if start == goal {
        return Vec::new();
    }

    let mut arena = vec![Node {
        state: start,
        parent: None,
        cost: 0,
    }];
    let mut frontier = BinaryHeap::new();
    let mut closed = HashSet::new();
    let mut seq: u64 = 0;
    frontier.push(Reverse((heuristic(start), seq, 0usize)));

    while let Some(Reverse((_, _, idx))) = frontier.pop() {
        let node = arena[idx];
        if !closed.insert(node.state) {
            continue;
        }
        if node.state == goal {
            return reconstruct(&arena, idx);
        }
        for next in expand(node.state) {
            if closed.contains(&next) {
                continue;
            }
            let cost = node.cost + 1;
            arena.push(Node {
                state: next,
                parent: Some(idx),
                cost,
            });
            seq += 1;
            frontier.push(Reverse((cost + heuristic(next), seq, arena.len() - 1)));
        }
    }

    Vec::new()
}

fn reconstruct<S: Copy>(arena: &[Node<S>], goal: usize) -> Vec<S> {
    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(idx) = cursor {
        path.push(arena[idx].state);
        cursor = arena[idx].parent;
    }
    path
}

/// Shortest path between two cells of the pitch.
///
/// `neighbours_of` yields the cells the mover may step on from a cell, so the
/// search never routes through anything it is not allowed to enter. Fails
/// if either endpoint is off the pitch.
pub fn find_path<E>(
    start: Position,
    goal: Position,
    neighbours_of: E,
) -> Result<Vec<Position>, GeometryError>
where
    E: FnMut(Position) -> Vec<Position>,
{
    distance(start, goal)?;
    Ok(astar(start, goal, neighbours_of, |p| {
        distance(p, goal).unwrap_or(0)
    }))
}

/// Shortest legal path of a player to `goal` under the rules of `oracle`.
///
/// Non-players have no legal steps and get an empty path.
pub fn player_path(
    oracle: &dyn Oracle,
    state: &Environment,
    mover: EntityId,
    goal: Position,
) -> Result<Vec<Position>, GeometryError> {
    let (Some(player), Some(side)) = (state.player(mover), mover.side()) else {
        return Ok(Vec::new());
    };
    find_path(player.position, goal, |p| {
        oracle.all_legal_cells_around(state, p, side)
    })
}
