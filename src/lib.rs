pub mod config;
pub mod dead_end;
pub mod difficulty;
pub mod error;
pub mod grid;
pub mod maze;
pub mod score;
pub mod search;
pub mod session;

pub use difficulty::DifficultyProfile;
pub use error::{Error, Result};
pub use grid::{Cell, CellKind, Dir, Grid, Pos, Snapshot};
pub use session::{Completion, MoveOutcome, Session, SessionState};
