//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use broomstick::board::{Environment, Position, Team, TeamSide};
use broomstick::config::EngineConfig;

fn team(side: TeamSide, cells: [(i32, i32); 7]) -> Team {
    Team::from_positions(side, cells.map(Position::from))
}

/// Mid-game layout used by the path finding scenarios.
///
/// Roster order is seeker, keeper, beater1, beater2, chaser1, chaser2,
/// chaser3.
pub fn scattered() -> Environment {
    let left = team(
        TeamSide::Left,
        [(5, 4), (12, 11), (1, 3), (3, 0), (2, 10), (8, 5), (10, 7)],
    );
    let right = team(
        TeamSide::Right,
        [(11, 8), (13, 12), (0, 6), (4, 2), (6, 1), (9, 9), (7, 3)],
    );
    Environment::new(left, right)
}

/// Both teams lined up facing each other across the centre column.
pub fn symmetric() -> Environment {
    let left = team(
        TeamSide::Left,
        [(6, 6), (6, 7), (6, 4), (6, 5), (6, 0), (6, 1), (6, 2)],
    );
    let right = left.mirrored();
    Environment::new(left, right)
}

/// The opening formation.
pub fn kickoff() -> Environment {
    let left = team(
        TeamSide::Left,
        [(3, 8), (3, 6), (7, 4), (6, 6), (7, 8), (6, 5), (6, 7)],
    );
    let right = left.mirrored();
    Environment::new(left, right)
}

/// Default configuration with single-ply move search.
pub fn shallow_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.search.max_depth = 1;
    config
}
