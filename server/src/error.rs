use mineduel_core::GameError;
use thiserror::Error;

/// Why the registry refused an action. Nothing changes when one is returned.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game not found")]
    NotFound,
    #[error("Only the host can start the game")]
    NotHost,
    #[error(transparent)]
    Game(#[from] GameError),
}

pub type Result<T> = core::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
