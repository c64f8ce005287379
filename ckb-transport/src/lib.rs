//! Transport layer for ckb keyboard animation plugins
//!
//! The ckb host drives an animation plugin over its standard input and
//! output with a line-based protocol. This crate provides:
//!
//! - the wire codec (`codec`): percent-escaped, space separated tokens
//! - a line transport (`LineTransport`) over any reader/writer pair, with a
//!   stdio flavour for real plugins and in-memory buffers for tests

pub mod codec;
pub mod error;
pub mod line;

pub use codec::{decode, encode, Command};
pub use error::{ProtocolError, TransportError};
pub use line::{Incoming, LineTransport, StdioTransport};

/// The core transport trait
///
/// Reading is the only blocking operation in a plugin. Every write is
/// flushed before `send_command` returns.
pub trait Transport {
    /// Read and decode the next line from the host
    ///
    /// End of input is `Ok(Incoming::Eof)`, not an error. A line that fails
    /// to decode is returned as `Incoming::Malformed` so the caller decides
    /// whether the violation is fatal.
    fn read_command(&mut self) -> Result<Incoming, TransportError>;

    /// Encode `fields` as one line, write it, and flush
    fn send_command(&mut self, fields: &[&str]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_command(&mut self) -> Result<Incoming, TransportError> {
        (**self).read_command()
    }

    fn send_command(&mut self, fields: &[&str]) -> Result<(), TransportError> {
        (**self).send_command(fields)
    }
}
