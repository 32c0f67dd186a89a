use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not determine the platform data directory")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, Error>;
