//! Maintenance of the derived `is_dead_end` flag.
//!
//! A dead end is a walkable cell with exactly one walkable axis neighbour,
//! excluding the maze start and end and any cell whose bonus was claimed.
//! Flipping one cell's `filled` flag can only change the flag on cells within
//! two axis steps of it, so play uses [`recompute_around`] and only generation
//! pays for [`recompute_all`].

use crate::grid::{Cell, Grid, Pos};

/// Offsets covered by a local recompute: the cell, its four neighbours and
/// the four cells two steps away along each axis.
const LOCAL_OFFSETS: [(isize, isize); 9] = [
    (0, 0),
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (0, -2),
    (0, 2),
    (-2, 0),
    (2, 0),
];

fn qualifies(grid: &Grid, pos: Pos) -> bool {
    let cell = &grid.cells[pos.y][pos.x];
    if !cell.is_walkable() || cell.bonus_claimed || grid.is_terminal(pos) {
        return false;
    }
    grid.neighbors4(pos, Cell::is_walkable).len() == 1
}

fn refresh(grid: &mut Grid, pos: Pos) {
    let flag = qualifies(grid, pos);
    grid.cells[pos.y][pos.x].is_dead_end = flag;
}

/// Recompute every cell's flag. Returns the number of path cells in the grid.
pub fn recompute_all(grid: &mut Grid) -> usize {
    let mut path_cells = 0;
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            if grid.cells[y][x].is_path() {
                path_cells += 1;
            }
            refresh(grid, Pos { x, y });
        }
    }
    path_cells
}

/// Recompute the flag for the cells whose status can depend on `changed`.
pub fn recompute_around(grid: &mut Grid, changed: Pos) {
    for (dx, dy) in LOCAL_OFFSETS {
        if let Some(pos) = changed.offset(dx, dy).filter(|p| grid.contains(*p)) {
            refresh(grid, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(grid: &Grid) -> Vec<Pos> {
        grid.dead_ends()
    }

    #[test]
    fn corridor_tips_are_dead_ends() {
        // S at (1,1), E at (5,3); the spur at (3,3) is a dead end.
        let mut grid = Grid::from_rows(&["#######", "#.....#", "###.#.#", "###.#.#", "#######"]);
        grid.end = Pos::new(5, 3);
        let paths = recompute_all(&mut grid);
        assert_eq!(paths, 9);
        assert_eq!(flagged(&grid), vec![Pos::new(3, 3)]);
    }

    #[test]
    fn start_and_end_are_never_flagged() {
        let mut grid = Grid::from_rows(&["#####", "#...#", "#####"]);
        grid.end = Pos::new(3, 1);
        recompute_all(&mut grid);
        assert!(flagged(&grid).is_empty());
    }

    #[test]
    fn filling_a_cell_exposes_new_dead_end() {
        let mut grid = Grid::from_rows(&["#######", "#.....#", "#######"]);
        grid.end = Pos::new(5, 1);
        recompute_all(&mut grid);
        assert!(flagged(&grid).is_empty());

        grid.cells[1][3].filled = true;
        recompute_around(&mut grid, Pos::new(3, 1));
        assert_eq!(flagged(&grid), vec![Pos::new(2, 1), Pos::new(4, 1)]);

        let mut full = grid.clone();
        recompute_all(&mut full);
        assert_eq!(full, grid);
    }

    #[test]
    fn filled_and_wall_cells_are_cleared() {
        let mut grid = Grid::from_rows(&["#####", "#...#", "#.###", "#####"]);
        grid.end = Pos::new(3, 1);
        recompute_all(&mut grid);
        assert_eq!(flagged(&grid), vec![Pos::new(1, 2)]);

        grid.cells[2][1].filled = true;
        recompute_around(&mut grid, Pos::new(1, 2));
        assert!(!grid.cells[2][1].is_dead_end);
    }

    #[test]
    fn claimed_cells_stay_unflagged() {
        let mut grid = Grid::from_rows(&["#####", "#...#", "#.###", "#####"]);
        grid.end = Pos::new(3, 1);
        grid.cells[2][1].bonus_claimed = true;
        recompute_all(&mut grid);
        assert!(flagged(&grid).is_empty());
    }

    #[test]
    fn local_recompute_near_edge_does_not_panic() {
        let mut grid = Grid::from_rows(&["..", ".."]);
        recompute_around(&mut grid, Pos::new(0, 0));
        recompute_around(&mut grid, Pos::new(1, 1));
    }
}
