use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Game not active")]
    NotActive,
    #[error("Player not in game")]
    UnknownPlayer,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Cell not clickable")]
    NotClickable,
    #[error("Cell already revealed")]
    AlreadyRevealed,
    #[error("Game already started")]
    AlreadyStarted,
    #[error("Need at least 2 players to start")]
    InsufficientPlayers,
    #[error("Game is full")]
    Full,
    #[error("Player already in game")]
    DuplicatePlayer,
    #[error("Player name must be 1 to 20 characters")]
    InvalidName,
}

pub type Result<T> = core::result::Result<T, GameError>;
