use std::collections::VecDeque;

use mazefill::dead_end::recompute_all;
use mazefill::difficulty::{CRUEL, EASY, HARD, NORMAL, PROFILES};
use mazefill::maze::generate_maze;
use mazefill::search::{astar, expansion_budget, find_nearest, find_path};
use mazefill::{Grid, MoveOutcome, Pos, Session, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reference shortest path length in cells, by plain BFS.
fn bfs_len(snap: &Snapshot, start: Pos, goal: Pos) -> Option<usize> {
    if !snap.is_walkable(start) || !snap.is_walkable(goal) {
        return None;
    }
    let mut dist = vec![usize::MAX; snap.cols * snap.rows];
    let mut q = VecDeque::new();
    dist[snap.index(start)] = 0;
    q.push_back(start);
    while let Some(pos) = q.pop_front() {
        if pos == goal {
            return Some(dist[snap.index(pos)] + 1);
        }
        let base = dist[snap.index(pos)];
        for next in snap.open_neighbors(pos) {
            if dist[snap.index(next)] == usize::MAX {
                dist[snap.index(next)] = base + 1;
                q.push_back(next);
            }
        }
    }
    None
}

fn walkable_cells(snap: &Snapshot) -> Vec<Pos> {
    let mut out = Vec::new();
    for y in 0..snap.rows {
        for x in 0..snap.cols {
            let pos = Pos::new(x, y);
            if snap.is_walkable(pos) {
                out.push(pos);
            }
        }
    }
    out
}

fn dead_end_flags(grid: &Grid) -> Vec<Pos> {
    grid.dead_ends()
}

const STEPS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

#[test]
fn generated_mazes_are_always_solvable() {
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let profile = PROFILES[seed as usize % PROFILES.len()];
        let cols = rng.gen_range(5..40);
        let rows = rng.gen_range(5..30);
        let grid = generate_maze(&mut rng, cols, rows, &profile);
        let path = find_path(&grid.path_snapshot(), grid.start, grid.end);
        assert!(path.is_some(), "seed {} ({}x{}) has no route", seed, cols, rows);
    }
}

#[test]
fn every_path_cell_is_reachable_from_start() {
    for seed in 0..10 {
        let grid = generate_maze(&mut StdRng::seed_from_u64(seed), 25, 19, &EASY);
        let snap = grid.path_snapshot();
        for cell in walkable_cells(&snap) {
            assert!(bfs_len(&snap, grid.start, cell).is_some(), "seed {} cell {:?}", seed, cell);
        }
    }
}

#[test]
fn astar_matches_bfs_shortest_length() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..15 {
        let grid = generate_maze(&mut rng, 21, 17, &EASY);
        let snap = grid.path_snapshot();
        let cells = walkable_cells(&snap);
        for _ in 0..20 {
            let a = cells[rng.gen_range(0..cells.len())];
            let b = cells[rng.gen_range(0..cells.len())];
            let path = find_path(&snap, a, b).expect("connected maze");
            assert_eq!(Some(path.len()), bfs_len(&snap, a, b), "round {} {:?}->{:?}", round, a, b);
            assert_eq!(path[0], a);
            assert_eq!(*path.last().unwrap(), b);
            for pair in path.windows(2) {
                assert_eq!(pair[0].manhattan(pair[1]), 1);
            }
        }
    }
}

#[test]
fn astar_is_optimal_on_open_rooms() {
    let grid = Grid::from_rows(&[
        "..........",
        "..####....",
        ".....#....",
        "..#..#.##.",
        "..#.......",
    ]);
    let snap = grid.snapshot();
    for a in walkable_cells(&snap) {
        for b in [Pos::new(9, 0), Pos::new(3, 2), Pos::new(0, 4)] {
            assert_eq!(find_path(&snap, a, b).map(|p| p.len()), bfs_len(&snap, a, b));
        }
    }
}

#[test]
fn incremental_dead_ends_match_full_recompute() {
    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let profile = [EASY, NORMAL, HARD, CRUEL][seed as usize % 4];
        let mut session = Session::new(&mut rng, 19, 15, profile);
        for step in 0..300 {
            if rng.gen_bool(0.25) {
                session.undo();
            } else {
                let (dx, dy) = STEPS[rng.gen_range(0..4)];
                session.attempt_move(dx, dy);
            }
            if step % 10 == 0 {
                session.set_reverse_mode(rng.gen_bool(0.2));
            }

            let mut full = session.grid().clone();
            recompute_all(&mut full);
            assert_eq!(
                dead_end_flags(session.grid()),
                dead_end_flags(&full),
                "seed {} step {}",
                seed,
                step
            );
        }
    }
}

#[test]
fn undo_is_the_inverse_of_a_move() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = Session::new(&mut rng, 17, 13, NORMAL);
        for _ in 0..200 {
            let (dx, dy) = STEPS[rng.gen_range(0..4)];
            let before_grid = session.grid().clone();
            let before_agent = session.agent();
            let before_score = session.score();

            match session.attempt_move(dx, dy) {
                MoveOutcome::Blocked => {
                    assert_eq!(session.grid(), &before_grid);
                    assert_eq!(session.agent(), before_agent);
                    continue;
                }
                MoveOutcome::Moved { bonus } => {
                    let dest = session.agent();
                    assert!(session.undo());
                    assert_eq!(session.agent(), before_agent);
                    assert!(session.score() >= before_score);

                    let mut expected = before_grid.clone();
                    if bonus > 0 {
                        // the claimed bonus survives undo
                        expected.cells[dest.y][dest.x].bonus_claimed = true;
                        expected.cells[dest.y][dest.x].is_dead_end = false;
                    }
                    assert_eq!(session.grid(), &expected, "seed {}", seed);

                    // keep exploring from the new cell
                    session.attempt_move(dx, dy);
                }
            }
        }
    }
}

#[test]
fn nearest_target_picks_closer_of_two() {
    let grid = Grid::from_rows(&[
        "#######",
        "#.....#",
        "#.#####",
        "#.....#",
        "#.#####",
        "#.....#",
        "#######",
    ]);
    let targets = [Pos::new(5, 1), Pos::new(1, 5)];

    // both targets are 4 hops away
    let either = find_nearest(&grid.snapshot(), Pos::new(1, 1), &targets).unwrap();
    assert_eq!(either.len(), 5);

    // a detour on the top row makes (5,1) 8 hops away
    let mut detour = grid.clone();
    detour.cells[1][3].kind = mazefill::CellKind::Wall;
    detour.cells[2][2].kind = mazefill::CellKind::Path;
    detour.cells[2][4].kind = mazefill::CellKind::Path;
    let path = find_nearest(&detour.snapshot(), Pos::new(1, 1), &targets).unwrap();
    assert_eq!(path.last(), Some(&Pos::new(1, 5)));
    assert_eq!(path.len(), 5);
}

#[test]
fn nearest_on_open_grid_uses_hop_count() {
    let line = ".......";
    let snap = Grid::from_rows(&[line; 7]).snapshot();
    let path = find_nearest(&snap, Pos::new(1, 1), &[Pos::new(5, 1), Pos::new(1, 4)]).unwrap();
    assert_eq!(path.last(), Some(&Pos::new(1, 4)));
    assert_eq!(path.len(), 4);
}

#[test]
fn unreachable_goal_stops_within_budget() {
    let mut rows: Vec<String> = (0..30).map(|_| ".".repeat(40)).collect();
    // seal off the bottom-right corner
    rows[27].replace_range(37..40, "###");
    for row in rows.iter_mut().skip(28) {
        row.replace_range(37..38, "#");
    }
    let lines: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
    let snap = Grid::from_rows(&lines).snapshot();

    let outcome = astar(&snap, Pos::new(0, 0), Pos::new(39, 29));
    assert_eq!(outcome.path, None);
    assert!(outcome.expansions <= expansion_budget(&snap));
    assert_eq!(expansion_budget(&snap), 10 * 40 * 30);
}

#[test]
fn even_request_becomes_odd_grid() {
    let grid = generate_maze(&mut StdRng::seed_from_u64(1), 20, 20, &NORMAL);
    assert_eq!((grid.cols, grid.rows), (21, 21));
    assert_eq!(grid.end, Pos::new(19, 19));
}
