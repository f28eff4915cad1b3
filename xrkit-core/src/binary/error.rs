use std::fmt::{self, Display};

use thiserror::Error;

/// Everything that can go wrong inside the chunk protocol.
///
/// None of these are "not found" conditions. A missing chunk or the end of an enumeration is
/// reported as `None`, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("read or seek past the end of the view")]
    OutOfBounds,
    #[error("chunk closed while no chunk was open")]
    EmptyChunkStack,
    #[error("writer finished with chunks still open")]
    UnclosedChunk,
    #[error("seek outside the written range of the sink")]
    SeekOutOfRange,
    #[error("cursor moved between locating and consuming a chunk")]
    StrayRead,
    #[error("chunk does not fit in the destination buffer")]
    ChunkTooLarge,
    #[error("no string terminator within the allowed length")]
    StringTooLong,
    #[error("compressed chunk found but no codec is attached")]
    MissingCodec,
    #[error("codec failure")]
    Codec,
    #[error("I/O error")]
    Io,
}

impl ErrorKind {
    pub fn make(self, message: impl Into<String>) -> Error {
        Error {
            kind: self,
            context_stack: vec![message.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    context_stack: Vec<String>,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Context lines, innermost first.
    pub fn context_stack(&self) -> &[String] {
        &self.context_stack
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (i, context) in self.context_stack.iter().rev().enumerate() {
            write!(f, "\n{i:5}: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub trait ResultContextExt {
    fn context(self, text: &str) -> Self;
    fn with_context(self, text: impl FnOnce() -> String) -> Self;
}

impl<T> ResultContextExt for Result<T, Error> {
    fn context(self, text: &str) -> Self {
        self.with_context(|| text.to_string())
    }

    fn with_context(self, text: impl FnOnce() -> String) -> Self {
        self.map_err(|mut error| {
            error.context_stack.push(text());
            error
        })
    }
}

pub trait ResultMapToBinaryErrorExt<T> {
    fn map_err_to_binary_error(self, kind: ErrorKind) -> Result<T, Error>;
}

impl<T, E> ResultMapToBinaryErrorExt<T> for Result<T, E>
where
    E: Display,
{
    fn map_err_to_binary_error(self, kind: ErrorKind) -> Result<T, Error> {
        self.map_err(|error| kind.make(error.to_string()))
    }
}
