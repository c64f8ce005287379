//! Transport and protocol error types

use thiserror::Error;

/// Violations of the ckb line protocol
///
/// Codec failures (`InvalidEscape`, `InvalidUtf8`) come from a single bad
/// line. The remaining variants describe structural violations detected by
/// the handshake engine while a keymap or params phase is open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid percent escape in token {token:?}")]
    InvalidEscape { token: String },

    #[error("Token is not valid UTF-8 after unescaping: {token:?}")]
    InvalidUtf8 { token: String },

    #[error("Keymap not preceded by keycount (got {found:?})")]
    KeymapWithoutKeycount { found: String },

    #[error("Invalid keycount: {0:?}")]
    InvalidKeycount(String),

    #[error("Invalid key coordinate: {0:?}")]
    InvalidCoordinate(String),

    #[error("Unexpected {found:?} inside {phase} phase, expected \"end {phase}\"")]
    UnterminatedPhase { phase: &'static str, found: String },

    #[error("Malformed line inside {phase} phase: {source}")]
    MalformedInPhase {
        phase: &'static str,
        #[source]
        source: Box<ProtocolError>,
    },

    #[error("Input closed inside {phase} phase")]
    EofInPhase { phase: &'static str },
}

/// Errors raised while moving lines over the wire
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
