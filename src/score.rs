//! High-score persistence. The store holds a single integer under a fixed key.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const HIGH_SCORE_KEY: &str = "mazefill.highscore";
const APP_DIR: &str = "mazefill";
const FILE_NAME: &str = "highscore.json";
pub const LOG_FILE: &str = "mazefill.log";

pub trait HighScoreStore {
    /// Stored value, 0 when nothing has been saved yet.
    fn load(&self) -> u64;
    fn save(&mut self, score: u64) -> Result<()>;
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScore {
    value: u64,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&self) -> u64 {
        self.value
    }

    fn save(&mut self, score: u64) -> Result<()> {
        self.value = score;
        Ok(())
    }
}

/// JSON file `{ "mazefill.highscore": N }`.
#[derive(Debug, Clone)]
pub struct FileHighScore {
    path: PathBuf,
}

impl FileHighScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHighScore { path: path.into() }
    }

    /// Store under the platform data directory.
    pub fn in_data_dir() -> Result<Self> {
        Ok(FileHighScore::new(data_dir()?.join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<u64> {
        let contents = fs::read_to_string(&self.path)?;
        let map: BTreeMap<String, u64> = serde_json::from_str(&contents)?;
        Ok(map.get(HIGH_SCORE_KEY).copied().unwrap_or(0))
    }
}

impl HighScoreStore for FileHighScore {
    fn load(&self) -> u64 {
        match self.read() {
            Ok(value) => value,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no high score file at {:?}", self.path);
                0
            }
            Err(e) => {
                warn!("Failed to read high score from {:?}: {}", self.path, e);
                0
            }
        }
    }

    fn save(&mut self, score: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut map = BTreeMap::new();
        map.insert(HIGH_SCORE_KEY.to_string(), score);
        let json = serde_json::to_string_pretty(&map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// `<platform data dir>/mazefill`, created if missing.
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir().ok_or(Error::NoDataDir)?.join(APP_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Truncate or create the log file inside `dir`.
pub fn create_log_file(dir: &Path) -> Result<File> {
    Ok(File::create(dir.join(LOG_FILE))?)
}
