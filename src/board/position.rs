//! Pitch geometry.
//!
//! The pitch is a 17×13 grid with clipped corners, symmetric around the
//! centre column. Distances use a king-move metric where diagonal steps cost
//! the same as straight ones; every heuristic in the engine depends on it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::TeamSide;

/// Number of columns on the pitch.
pub const FIELD_WIDTH: i32 = 17;

/// Number of rows on the pitch.
pub const FIELD_HEIGHT: i32 = 13;

/// The centre cell, where the quaffle is put back after a goal.
pub const CENTER: Position = Position::new(8, 6);

/// Goal rings defended by the left team.
pub const LEFT_GOALS: [Position; 3] = [
    Position::new(2, 4),
    Position::new(2, 6),
    Position::new(2, 8),
];

/// Goal rings defended by the right team.
pub const RIGHT_GOALS: [Position; 3] = [
    Position::new(14, 4),
    Position::new(14, 6),
    Position::new(14, 8),
];

/// Errors raised by geometry queries.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("position ({}, {}) is out of bounds", .0.x, .0.y)]
    OutOfBounds(Position),
}

/// A cell on the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Reflects the position across the centre column.
    pub const fn mirrored(self) -> Self {
        Position::new(FIELD_WIDTH - 1 - self.x, self.y)
    }

    pub fn is_in_bounds(self) -> bool {
        cell_kind(self) != Cell::OutOfBounds
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position::new(x, y)
    }
}

/// Classification of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Standard,
    OutOfBounds,
    GoalLeft,
    GoalRight,
    RestrictedLeft,
    RestrictedRight,
}

impl Cell {
    pub fn is_goal(self) -> bool {
        matches!(self, Cell::GoalLeft | Cell::GoalRight)
    }

    /// Returns the side whose keeper zone (rings included) contains this cell.
    pub fn zone_owner(self) -> Option<TeamSide> {
        match self {
            Cell::GoalLeft | Cell::RestrictedLeft => Some(TeamSide::Left),
            Cell::GoalRight | Cell::RestrictedRight => Some(TeamSide::Right),
            _ => None,
        }
    }
}

/// Returns the in-bounds column range of a row, or `None` for rows off the pitch.
const fn row_span(y: i32) -> Option<(i32, i32)> {
    match y {
        0 | 12 => Some((3, 13)),
        1 | 11 => Some((2, 14)),
        2 | 10 => Some((1, 15)),
        3..=9 => Some((0, 16)),
        _ => None,
    }
}

/// Classifies a cell of the pitch.
pub fn cell_kind(pos: Position) -> Cell {
    let Some((lo, hi)) = row_span(pos.y) else {
        return Cell::OutOfBounds;
    };
    if pos.x < lo || pos.x > hi {
        return Cell::OutOfBounds;
    }
    if LEFT_GOALS.contains(&pos) {
        return Cell::GoalLeft;
    }
    if RIGHT_GOALS.contains(&pos) {
        return Cell::GoalRight;
    }
    if (4..=8).contains(&pos.y) {
        if pos.x <= 3 {
            return Cell::RestrictedLeft;
        }
        if pos.x >= FIELD_WIDTH - 4 {
            return Cell::RestrictedRight;
        }
    }
    Cell::Standard
}

/// Goal rings a side shoots at.
pub fn goals_attacked_by(side: TeamSide) -> &'static [Position; 3] {
    match side {
        TeamSide::Left => &RIGHT_GOALS,
        TeamSide::Right => &LEFT_GOALS,
    }
}

/// Goal rings a side defends.
pub fn goals_defended_by(side: TeamSide) -> &'static [Position; 3] {
    match side {
        TeamSide::Left => &LEFT_GOALS,
        TeamSide::Right => &RIGHT_GOALS,
    }
}

fn check_bounds(pos: Position) -> Result<(), GeometryError> {
    if pos.is_in_bounds() {
        Ok(())
    } else {
        Err(GeometryError::OutOfBounds(pos))
    }
}

/// Grid distance between two cells.
///
/// Diagonal steps are free relative to Manhattan distance, so the result is
/// the number of king moves needed on an empty pitch. Fails if either cell is
/// off the pitch.
pub fn distance(a: Position, b: Position) -> Result<i32, GeometryError> {
    check_bounds(a)?;
    check_bounds(b)?;
    if a == b {
        return Ok(0);
    }
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let total = if dx >= dy { dy + (dx - dy) } else { dx + (dy - dx) };
    Ok(total)
}

/// The in-bounds cells surrounding `pos`, row by row from the top left.
pub fn neighbours(pos: Position) -> Vec<Position> {
    let mut out = Vec::with_capacity(8);
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let p = Position::new(pos.x + dx, pos.y + dy);
            if p.is_in_bounds() {
                out.push(p);
            }
        }
    }
    out
}

/// Cells strictly between `start` and `end` on the straight flight line.
///
/// Walks the normalised direction vector in half-cell steps and records every
/// new cell the rounded point enters. Neither endpoint is included.
pub fn crossed_cells(start: Position, end: Position) -> Result<Vec<Position>, GeometryError> {
    check_bounds(start)?;
    check_bounds(end)?;
    let mut cells = Vec::new();
    if start == end {
        return Ok(cells);
    }

    let dx = f64::from(end.x - start.x);
    let dy = f64::from(end.y - start.y);
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / len, dy / len);

    // Two samples per unit of length, plus slack for the last rounding step.
    let max_steps = (len * 2.0).ceil() as usize + 2;
    let mut last = start;
    for step in 1..=max_steps {
        let t = step as f64 * 0.5;
        let cell = Position::new(
            start.x + (ux * t).round() as i32,
            start.y + (uy * t).round() as i32,
        );
        if cell == end {
            break;
        }
        if cell != last {
            cells.push(cell);
            last = cell;
        }
    }
    Ok(cells)
}
