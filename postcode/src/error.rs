//! `postcode` error types.
use std::{backtrace::Backtrace, fmt};

use crate::{
    config::ParseError,
    cursor::UnexpectedEof,
    decode::{DecodeError, RowError},
    encode::{EncodeError, ParamError},
};

/// A specialized [`Result`] type for `postcode` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `postcode` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    /// Add context which is displayed before the error.
    pub fn context(mut self, context: impl Into<String>) -> Error {
        self.context = context.into();
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// All possible error kind from `postcode` library.
pub enum ErrorKind {
    Config(ParseError),
    Decode(DecodeError),
    Row(RowError),
    Encode(EncodeError),
    Param(ParamError),
    Eof(UnexpectedEof),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ParseError>e => ErrorKind::Config(e));
from!(<DecodeError>e => ErrorKind::Decode(e));
from!(<RowError>e => ErrorKind::Row(e));
from!(<EncodeError>e => ErrorKind::Encode(e));
from!(<ParamError>e => ErrorKind::Param(e));
from!(<UnexpectedEof>e => ErrorKind::Eof(e));

impl std::error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
            Self::Row(e) => e.fmt(f),
            Self::Encode(e) => e.fmt(f),
            Self::Param(e) => e.fmt(f),
            Self::Eof(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
