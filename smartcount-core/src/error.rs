use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Program editing errors
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Cannot delete the last section of the program")]
    LastSection,

    #[error("Section index {index} is out of range (program has {len} sections)")]
    SectionIndexOutOfRange { index: usize, len: usize },

    #[error("A program must contain at least one section")]
    EmptyProgram,

    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it to define your program and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
