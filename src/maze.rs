use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::difficulty::DifficultyProfile;
use crate::grid::{Cell, CellKind, Dir, Grid, Pos};

pub const MIN_DIMENSION: usize = 5;

/// Round a requested dimension up to the next odd value, at least `MIN_DIMENSION`.
pub fn odd_dimension(n: usize) -> usize {
    let n = n.max(MIN_DIMENSION);
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Largest odd dimension not above `max`, at least `MIN_DIMENSION`.
pub fn odd_cap(max: usize) -> usize {
    let max = max.max(MIN_DIMENSION);
    if max % 2 == 0 {
        max - 1
    } else {
        max
    }
}

/// Carve a perfect maze with an iterative randomized depth-first walk over the
/// odd-coordinate rooms, then open extra loops according to `profile`.
pub fn generate_maze(
    rng: &mut impl Rng,
    cols: usize,
    rows: usize,
    profile: &DifficultyProfile,
) -> Grid {
    let cols = odd_dimension(cols);
    let rows = odd_dimension(rows);
    let mut grid = Grid::filled_with_walls(cols, rows);
    let cells_w = (cols - 1) / 2;
    let cells_h = (rows - 1) / 2;
    let mut visited = vec![vec![false; cells_w]; cells_h];
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];

    visited[0][0] = true;
    carve_cell(&mut grid, 0, 0);

    while let Some(&(cx, cy)) = stack.last() {
        let mut dirs = Dir::ALL;
        dirs.shuffle(rng);
        let next = dirs.iter().find_map(|dir| {
            let (dx, dy) = dir.delta();
            let nx = cx.checked_add_signed(dx)?;
            let ny = cy.checked_add_signed(dy)?;
            if nx < cells_w && ny < cells_h && !visited[ny][nx] {
                Some((nx, ny))
            } else {
                None
            }
        });

        match next {
            Some((nx, ny)) => {
                visited[ny][nx] = true;
                carve_between(&mut grid, cx, cy, nx, ny);
                carve_cell(&mut grid, nx, ny);
                stack.push((nx, ny));
            }
            None => {
                stack.pop();
            }
        }
    }

    let opened = add_extra_connections(&mut grid, profile, rng);

    let (start, end) = (grid.start, grid.end);
    grid.cells[start.y][start.x] = Cell::PATH;
    grid.cells[end.y][end.x] = Cell::PATH;

    debug!(cols, rows, difficulty = profile.name, opened, "maze generated");
    grid
}

/// Draw `floor(cols * rows * density)` interior candidates and open each wall
/// candidate with probability `chance`. A candidate is only opened when it
/// touches an existing path cell, so no unreachable islands appear.
fn add_extra_connections(
    grid: &mut Grid,
    profile: &DifficultyProfile,
    rng: &mut impl Rng,
) -> usize {
    let candidates =
        (grid.cols as f64 * grid.rows as f64 * profile.extra_connection_density).floor() as usize;
    let mut opened = 0;
    for _ in 0..candidates {
        let pos = Pos::new(
            rng.gen_range(1..grid.cols - 1),
            rng.gen_range(1..grid.rows - 1),
        );
        if grid.cells[pos.y][pos.x].kind != CellKind::Wall {
            continue;
        }
        if !rng.gen_bool(profile.extra_connection_chance.clamp(0.0, 1.0)) {
            continue;
        }
        if grid.neighbors4(pos, Cell::is_path).is_empty() {
            continue;
        }
        grid.cells[pos.y][pos.x] = Cell::PATH;
        opened += 1;
    }
    opened
}

fn carve_cell(grid: &mut Grid, cx: usize, cy: usize) {
    let gx = cx * 2 + 1;
    let gy = cy * 2 + 1;
    grid.cells[gy][gx] = Cell::PATH;
}

fn carve_between(grid: &mut Grid, cx: usize, cy: usize, nx: usize, ny: usize) {
    let gx = cx * 2 + 1;
    let gy = cy * 2 + 1;
    let ngx = nx * 2 + 1;
    let ngy = ny * 2 + 1;
    let wall_x = (gx + ngx) / 2;
    let wall_y = (gy + ngy) / 2;
    grid.cells[wall_y][wall_x] = Cell::PATH;
}
