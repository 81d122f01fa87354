// src/error.rs
use std::io;
use thiserror::Error;

// Re-export anyhow's Result type
pub use anyhow::Result;

/// Custom Error type for the tsk library
#[derive(Error, Debug)]
pub enum TskError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Rotation error: {0}")]
    Rotation(String),

    #[error("Other error: {0}")]
    Other(String),
}
