//! Error types for the device path
//!
//! Nothing here is retried or swallowed: every failure reaches the caller,
//! which decides whether the frame loop keeps going.

use std::io;

use thiserror::Error;

use crate::device::Opcode;

/// Transport failure on a single channel operation
#[derive(Debug, Error)]
#[error("{opcode} failed: {source}")]
pub struct ChannelError {
    pub opcode: Opcode,
    #[source]
    pub source: io::Error,
}

impl ChannelError {
    pub fn new(opcode: Opcode, source: io::Error) -> Self {
        Self { opcode, source }
    }
}

/// Malformed payload coming back from (or going to) the device
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// Anything the adapter or the frame loop can report
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("{opcode}: {source}")]
    Protocol {
        opcode: Opcode,
        #[source]
        source: ProtocolError,
    },
}

impl Error {
    /// Opcode of the command that failed
    pub fn opcode(&self) -> Opcode {
        match self {
            Error::Channel(e) => e.opcode,
            Error::Protocol { opcode, .. } => *opcode,
        }
    }
}
