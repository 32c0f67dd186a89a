use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub filled: bool,
    pub is_dead_end: bool,
    /// Set once a dead-end bonus has been paid out here; such a cell is never
    /// flagged as a dead end again.
    pub bonus_claimed: bool,
}

impl Cell {
    pub const WALL: Cell = Cell {
        kind: CellKind::Wall,
        filled: false,
        is_dead_end: false,
        bonus_claimed: false,
    };

    pub const PATH: Cell = Cell {
        kind: CellKind::Path,
        filled: false,
        is_dead_end: false,
        bonus_claimed: false,
    };

    pub fn is_path(&self) -> bool {
        self.kind == CellKind::Path
    }

    pub fn is_walkable(&self) -> bool {
        self.kind == CellKind::Path && !self.filled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    /// Shift by a signed offset, `None` if the result would be negative.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Pos> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Pos { x, y })
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    /// The direction for a unit step, if exactly one component is +-1.
    pub fn from_delta(dx: isize, dy: isize) -> Option<Dir> {
        match (dx, dy) {
            (0, -1) => Some(Dir::Up),
            (0, 1) => Some(Dir::Down),
            (-1, 0) => Some(Dir::Left),
            (1, 0) => Some(Dir::Right),
            _ => None,
        }
    }
}

/// Maze grid indexed as `cells[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<Vec<Cell>>,
    pub start: Pos,
    pub end: Pos,
}

impl Grid {
    /// A grid of solid wall with start and end at the standard corners.
    pub fn filled_with_walls(cols: usize, rows: usize) -> Self {
        Grid {
            cols,
            rows,
            cells: vec![vec![Cell::WALL; cols]; rows],
            start: Pos::new(1, 1),
            end: Pos::new(cols.saturating_sub(2), rows.saturating_sub(2)),
        }
    }

    /// Build a grid from text rows: `#` is wall, anything else is path.
    /// Start and end default to the standard corners.
    pub fn from_rows(lines: &[&str]) -> Self {
        let rows = lines.len();
        let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::filled_with_walls(cols, rows);
        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                if ch != '#' {
                    grid.cells[y][x] = Cell::PATH;
                }
            }
        }
        grid
    }

    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    pub fn is_walkable(&self, x: isize, y: isize) -> bool {
        self.in_bounds(x, y) && self.cells[y as usize][x as usize].is_walkable()
    }

    pub fn is_walkable_at(&self, pos: Pos) -> bool {
        self.get(pos).is_some_and(|c| c.is_walkable())
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.cells.get(pos.y).and_then(|row| row.get(pos.x))
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        self.cells.get_mut(pos.y).and_then(|row| row.get_mut(pos.x))
    }

    pub fn step(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        pos.offset(dx, dy).filter(|p| self.contains(*p))
    }

    /// In-bounds axis neighbours of `pos` accepted by `pred`.
    pub fn neighbors4<F>(&self, pos: Pos, pred: F) -> Vec<Pos>
    where
        F: Fn(&Cell) -> bool,
    {
        let mut out = Vec::with_capacity(4);
        for dir in Dir::ALL {
            if let Some(next) = self.step(pos, dir) {
                if pred(&self.cells[next.y][next.x]) {
                    out.push(next);
                }
            }
        }
        out
    }

    pub fn is_terminal(&self, pos: Pos) -> bool {
        pos == self.start || pos == self.end
    }

    pub fn path_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_path())
            .count()
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_path() && c.filled)
            .count()
    }

    pub fn dead_ends(&self) -> Vec<Pos> {
        let mut out = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.cells[y][x].is_dead_end {
                    out.push(Pos { x, y });
                }
            }
        }
        out
    }

    /// Copy of the current walkability, detached from the live grid.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_by(Cell::is_walkable)
    }

    /// Copy where every path cell counts as open regardless of fill.
    pub fn path_snapshot(&self) -> Snapshot {
        self.snapshot_by(Cell::is_path)
    }

    fn snapshot_by(&self, pred: fn(&Cell) -> bool) -> Snapshot {
        let mut walkable = Vec::with_capacity(self.cols * self.rows);
        for row in &self.cells {
            walkable.extend(row.iter().map(pred));
        }
        Snapshot {
            cols: self.cols,
            rows: self.rows,
            walkable,
        }
    }
}

/// Immutable walkability copy handed to the search services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cols: usize,
    pub rows: usize,
    walkable: Vec<bool>,
}

impl Snapshot {
    /// Build from a `{0,1}` matrix (1 = walkable). `None` when the matrix
    /// does not match the stated dimensions.
    pub fn from_matrix(matrix: &[Vec<u8>], cols: usize, rows: usize) -> Option<Self> {
        if cols == 0 || rows == 0 || matrix.len() != rows {
            return None;
        }
        let mut walkable = Vec::with_capacity(cols * rows);
        for row in matrix {
            if row.len() != cols {
                return None;
            }
            walkable.extend(row.iter().map(|&v| v == 1));
        }
        Some(Snapshot {
            cols,
            rows,
            walkable,
        })
    }

    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.walkable
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|&w| u8::from(w)).collect())
            .collect()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    pub fn index(&self, pos: Pos) -> usize {
        pos.y * self.cols + pos.x
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.contains(pos) && self.walkable[self.index(pos)]
    }

    /// Walkable axis neighbours of `pos`.
    pub fn open_neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Dir::ALL.into_iter().filter_map(move |dir| {
            let (dx, dy) = dir.delta();
            pos.offset(dx, dy).filter(|p| self.is_walkable(*p))
        })
    }
}
