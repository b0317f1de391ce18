use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal or unparseable move '{0}'")]
    IllegalMove(String),

    #[error("no move to take back")]
    NothingToTakeBack,
}

pub type Result<T> = std::result::Result<T, EngineError>;
