//! Re-entry of banned players.

use crate::board::{
    cell_kind, Cell, EntityId, Environment, Position, TeamSide, FIELD_HEIGHT, FIELD_WIDTH,
};

/// Free standard cells in `side`'s own half, row by row from the top left.
pub fn legal_redeploy_cells(state: &Environment, side: TeamSide) -> Vec<Position> {
    let half = FIELD_WIDTH / 2;
    let columns = match side {
        TeamSide::Left => 0..half,
        TeamSide::Right => half + 1..FIELD_WIDTH,
    };
    let mut cells = Vec::new();
    for y in 0..FIELD_HEIGHT {
        for x in columns.clone() {
            let p = Position::new(x, y);
            if cell_kind(p) == Cell::Standard && state.is_free(p) {
                cells.push(p);
            }
        }
    }
    cells
}

/// Puts a banned player back on the pitch at `cell`.
pub fn redeploy(state: &mut Environment, id: EntityId, cell: Position) {
    if let Some(p) = state.player_mut(id) {
        p.position = cell;
        p.is_fined = false;
        p.knocked_out = false;
    }
}
