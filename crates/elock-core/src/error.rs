use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Entry errors
    #[error("Invalid digit: {value} (must be 0-9)")]
    InvalidDigit { value: u8 },

    #[error("Invalid slot index: {index} (must be 0-{max})")]
    InvalidSlot { index: usize, max: usize },

    #[error("Entry buffer is full")]
    BufferFull,

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Display errors
    #[error("Invalid display line: {line} (max: {max})")]
    InvalidLine { line: usize, max: usize },

    #[error("Duration must be greater than zero")]
    InvalidDuration,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
