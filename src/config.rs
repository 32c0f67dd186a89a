use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::difficulty::DifficultyProfile;
use crate::error::Result;

pub const CONFIG_FILE: &str = "mazefill.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MazeConfig {
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_max_cols")]
    pub max_cols: usize,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub reverse_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_cols() -> usize {
    21
}

fn default_rows() -> usize {
    15
}

fn default_max_cols() -> usize {
    61
}

fn default_max_rows() -> usize {
    31
}

fn default_difficulty() -> String {
    "normal".to_string()
}

fn default_fps() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            max_cols: default_max_cols(),
            max_rows: default_max_rows(),
            difficulty: default_difficulty(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load `mazefill.toml` from the working directory, or use defaults if it
    /// is missing or unparsable. Environment overrides are applied last.
    pub fn load() -> Self {
        let mut config = match Config::from_file(CONFIG_FILE) {
            Ok(config) => {
                info!("Loaded configuration from {}", CONFIG_FILE);
                config
            }
            Err(crate::Error::Io(_)) => {
                info!("No {} found, using default configuration", CONFIG_FILE);
                Config::default()
            }
            Err(e) => {
                warn!("Failed to parse {}: {}; using default configuration", CONFIG_FILE, e);
                Config::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `MAZEFILL_DIFFICULTY` and `MAZEFILL_FPS` take precedence over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("MAZEFILL_DIFFICULTY").filter(|v| !v.trim().is_empty()) {
            self.maze.difficulty = name;
        }
        if let Some(fps) = lookup("MAZEFILL_FPS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
        {
            self.display.fps = fps;
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile::from_name(&self.maze.difficulty)
    }
}
