//! Engine error types

use ckb_transport::{ProtocolError, TransportError};
use thiserror::Error;

/// Key lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A key event arrived before any keymap was received
    #[error("Cannot resolve ({x},{y}): keymap is empty")]
    EmptyKeymap { x: i32, y: i32 },
}

/// Errors that end a plugin run
#[derive(Error, Debug)]
pub enum EngineError {
    /// Structural protocol violation inside an open phase
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Key resolution against an unusable keymap
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Reading from or writing to the host failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
