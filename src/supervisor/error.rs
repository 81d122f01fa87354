use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when starting a process
#[derive(Error, Debug)]
pub enum StartError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Invalid command line: {0}")]
    Parse(#[from] shell_words::ParseError),

    #[error("Failed to open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: io::Error },

    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors that can occur when stopping a process
#[derive(Error, Debug)]
pub enum StopError {
    #[error("Failed to wait for process exit: {0}")]
    Wait(#[source] io::Error),

    #[error("Process ignored termination for {0:?} and could not be killed: {1}")]
    Kill(Duration, #[source] io::Error),
}

/// Error from a toggle, carrying whichever operation ran
#[derive(Error, Debug)]
pub enum ToggleError {
    #[error(transparent)]
    Start(#[from] StartError),

    #[error(transparent)]
    Stop(#[from] StopError),
}
