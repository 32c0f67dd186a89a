use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::dead_end::{recompute_all, recompute_around};
use crate::difficulty::DifficultyProfile;
use crate::grid::{Dir, Grid, Pos};
use crate::maze::{generate_maze, odd_cap, odd_dimension};
use crate::search::SearchRequest;

pub const STEP_SCORE: u64 = 1;
/// Base dead-end bonus before the difficulty multiplier.
pub const DEAD_END_BONUS: f64 = 10.0;
/// Finish bonus at zero seconds; one point is lost per elapsed second.
pub const FINISH_BONUS: u64 = 100;
/// Cells added to each dimension after a completed maze.
pub const GROWTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    pub previous: Pos,
    /// The cell this move marked filled, if any.
    pub filled: Option<Pos>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Blocked,
    Moved { bonus: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub finish_bonus: u64,
    pub score: u64,
    pub new_high_score: Option<u64>,
    /// Size the next maze should be generated at.
    pub next_cols: usize,
    pub next_rows: usize,
}

/// One player's maze, position, history and score.
#[derive(Debug, Clone)]
pub struct Session {
    grid: Grid,
    agent: Pos,
    history: Vec<UndoRecord>,
    state: SessionState,
    profile: DifficultyProfile,
    score: u64,
    high_score: u64,
    moves: u64,
    level: u32,
    path_cells: usize,
    filled_cells: usize,
    reverse_mode: bool,
    started_at: Option<Instant>,
    max_cols: usize,
    max_rows: usize,
    generation: u64,
    revision: u64,
}

impl Session {
    pub fn new(rng: &mut impl Rng, cols: usize, rows: usize, profile: DifficultyProfile) -> Self {
        let grid = generate_maze(rng, cols, rows, &profile);
        Session::from_grid(grid, profile)
    }

    /// Start a session on an existing grid. Dead-end flags are recomputed.
    pub fn from_grid(mut grid: Grid, profile: DifficultyProfile) -> Self {
        let path_cells = recompute_all(&mut grid);
        let filled_cells = grid.filled_count();
        Session {
            agent: grid.start,
            grid,
            history: Vec::new(),
            state: SessionState::Idle,
            profile,
            score: 0,
            high_score: 0,
            moves: 0,
            level: 1,
            path_cells,
            filled_cells,
            reverse_mode: false,
            started_at: None,
            max_cols: usize::MAX,
            max_rows: usize::MAX,
            generation: 0,
            revision: 0,
        }
    }

    pub fn with_high_score(mut self, high_score: u64) -> Self {
        self.high_score = high_score;
        self
    }

    pub fn with_size_limit(mut self, max_cols: usize, max_rows: usize) -> Self {
        self.max_cols = max_cols;
        self.max_rows = max_rows;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent(&self) -> Pos {
        self.agent
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Bumped whenever the grid is replaced or reset; lets callers drop
    /// search answers computed for an older maze.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped on every move, undo and grid replacement. A search answer is
    /// only valid for the revision it was requested at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn reverse_mode(&self) -> bool {
        self.reverse_mode
    }

    pub fn set_reverse_mode(&mut self, on: bool) {
        self.reverse_mode = on;
    }

    /// Filled cells and total path cells, for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.filled_cells, self.path_cells)
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.started_at
            .map(|t| now.saturating_duration_since(t).as_secs())
            .unwrap_or(0)
    }

    fn dead_end_bonus(&self) -> u64 {
        (DEAD_END_BONUS * self.profile.bonus_multiplier).round() as u64
    }

    /// Step the agent by one cell. Anything other than a unit axis step onto
    /// a walkable cell is ignored.
    pub fn attempt_move(&mut self, dx: isize, dy: isize) -> MoveOutcome {
        if self.state == SessionState::Complete {
            return MoveOutcome::Blocked;
        }
        let Some(dir) = Dir::from_delta(dx, dy) else {
            return MoveOutcome::Blocked;
        };
        let Some(dest) = self
            .grid
            .step(self.agent, dir)
            .filter(|p| self.grid.is_walkable_at(*p))
        else {
            return MoveOutcome::Blocked;
        };

        let departed = self.agent;
        let fill = !self.reverse_mode;
        self.history.push(UndoRecord {
            previous: departed,
            filled: fill.then_some(departed),
        });
        self.agent = dest;

        if self.state == SessionState::Idle {
            self.state = SessionState::InProgress;
            self.started_at = Some(Instant::now());
        }
        self.moves += 1;
        self.revision += 1;
        self.score += STEP_SCORE;

        let mut bonus = 0;
        if self.grid.cells[dest.y][dest.x].is_dead_end {
            bonus = self.dead_end_bonus();
            let cell = &mut self.grid.cells[dest.y][dest.x];
            cell.is_dead_end = false;
            cell.bonus_claimed = true;
            self.score += bonus;
            debug!(x = dest.x, y = dest.y, bonus, "dead end reached");
        }

        if fill {
            self.grid.cells[departed.y][departed.x].filled = true;
            self.filled_cells += 1;
            recompute_around(&mut self.grid, departed);
        }

        MoveOutcome::Moved { bonus }
    }

    /// Revert the last move. Score and claimed bonuses are kept.
    pub fn undo(&mut self) -> bool {
        if self.state == SessionState::Complete {
            return false;
        }
        let Some(record) = self.history.pop() else {
            return false;
        };
        if let Some(pos) = record.filled {
            self.grid.cells[pos.y][pos.x].filled = false;
            self.filled_cells = self.filled_cells.saturating_sub(1);
            recompute_around(&mut self.grid, pos);
        }
        self.agent = record.previous;
        self.revision += 1;
        true
    }

    /// Finish the maze if the agent stands on the end cell.
    pub fn check_completion(&mut self, now: Instant) -> Option<Completion> {
        if self.state == SessionState::Complete || self.agent != self.grid.end {
            return None;
        }
        self.state = SessionState::Complete;

        let elapsed = self.elapsed_secs(now);
        let finish_bonus = FINISH_BONUS.saturating_sub(elapsed);
        self.score += finish_bonus;

        let new_high_score = if self.score > self.high_score {
            self.high_score = self.score;
            Some(self.score)
        } else {
            None
        };

        info!(
            level = self.level,
            elapsed,
            finish_bonus,
            score = self.score,
            "maze complete"
        );

        Some(Completion {
            finish_bonus,
            score: self.score,
            new_high_score,
            next_cols: odd_dimension(self.grid.cols + GROWTH).min(odd_cap(self.max_cols)),
            next_rows: odd_dimension(self.grid.rows + GROWTH).min(odd_cap(self.max_rows)),
        })
    }

    /// Replace the maze with a fresh one and advance a level. Score carries over.
    pub fn regenerate(&mut self, rng: &mut impl Rng, cols: usize, rows: usize) {
        let grid = generate_maze(rng, cols, rows, &self.profile);
        self.install(grid);
        self.level += 1;
        info!(level = self.level, cols = self.grid.cols, rows = self.grid.rows, "new maze");
    }

    /// Begin a new run: fresh maze, score and level back to the start.
    pub fn new_run(&mut self, rng: &mut impl Rng, cols: usize, rows: usize) {
        let grid = generate_maze(rng, cols, rows, &self.profile);
        self.install(grid);
        self.score = 0;
        self.level = 1;
    }

    pub fn set_profile(&mut self, profile: DifficultyProfile) {
        self.profile = profile;
    }

    /// Clear fills, claims and history on the current maze and zero the score.
    pub fn reset(&mut self) {
        let mut grid = self.grid.clone();
        for cell in grid.cells.iter_mut().flat_map(|row| row.iter_mut()) {
            cell.filled = false;
            cell.bonus_claimed = false;
        }
        self.install(grid);
        self.score = 0;
    }

    fn install(&mut self, mut grid: Grid) {
        self.path_cells = recompute_all(&mut grid);
        self.filled_cells = grid.filled_count();
        self.agent = grid.start;
        self.grid = grid;
        self.history.clear();
        self.state = SessionState::Idle;
        self.moves = 0;
        self.started_at = None;
        self.generation += 1;
        self.revision += 1;
    }

    /// Request for the shortest route from the agent to the end.
    pub fn path_hint_request(&self) -> SearchRequest {
        SearchRequest::path(&self.grid.snapshot(), self.agent, self.grid.end)
    }

    /// Request for the route to the nearest flagged dead end other than the
    /// agent's own cell, if any exist.
    pub fn dead_end_request(&self) -> Option<SearchRequest> {
        let mut targets = self.grid.dead_ends();
        targets.retain(|p| *p != self.agent);
        if targets.is_empty() {
            return None;
        }
        Some(SearchRequest::nearest(&self.grid.snapshot(), self.agent, targets))
    }
}
