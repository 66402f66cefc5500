// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExitdError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Failed to launch \"{command}\": {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),
}

impl ExitdError {
    pub fn launch(command: impl Into<String>, source: io::Error) -> Self {
        ExitdError::Launch {
            command: command.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExitdError>;
