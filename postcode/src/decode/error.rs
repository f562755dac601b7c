use std::{borrow::Cow, fmt, str::Utf8Error, string::FromUtf8Error};

use crate::{common::ByteStr, postgres::Oid};

/// An error when decoding column value.
pub enum DecodeError {
    /// Column oid cannot be decoded into requested type.
    TypeMismatch {
        oid: Oid,
        target: &'static str,
    },
    /// Value does not match the wire layout of its oid.
    Malformed {
        oid: Oid,
        reason: Cow<'static,str>,
    },
    /// Array value is not one dimensional.
    Dimension {
        oid: Oid,
        ndim: i32,
    },
    /// Postgres return non utf8 string.
    Utf8(Utf8Error),
    /// Column requested not found.
    ColumnNotFound(Cow<'static,str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Value is NULL but requested type is not nullable.
    Null,
    /// Error returned by user defined [`Scan`][crate::Scan] implementation.
    Custom(Box<dyn std::error::Error + Send + Sync>),
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl DecodeError {
    pub(crate) fn mismatch<T: ?Sized>(oid: Oid) -> DecodeError {
        Self::TypeMismatch { oid, target: std::any::type_name::<T>() }
    }

    pub(crate) fn malformed(oid: Oid, reason: impl Into<Cow<'static,str>>) -> DecodeError {
        Self::Malformed { oid, reason: reason.into() }
    }

    /// Create error from user defined [`Scan`][crate::Scan] implementation.
    pub fn custom(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> DecodeError {
        Self::Custom(error.into())
    }

    /// Returns `true` if error is [`DecodeError::TypeMismatch`].
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Returns `true` if error is [`DecodeError::Malformed`].
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            Self::Custom(e) => Some(&**e),
            #[cfg(feature = "json")]
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::TypeMismatch { oid, target } => write!(f, "cannot decode OID {oid} into `{target}`"),
            Self::Malformed { oid, reason } => write!(f, "malformed value for OID {oid}: {reason}"),
            Self::Dimension { oid, ndim } => write!(f, "expected one dimensional array for OID {oid}, found {ndim} dimensions"),
            Self::Utf8(e) => write!(f, "{e}"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::Null => write!(f, "unexpected NULL value"),
            Self::Custom(e) => write!(f, "{e}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

from!(<Utf8Error>e => Self::Utf8(e));
from!(<FromUtf8Error>e => Self::Utf8(e.utf8_error()));
#[cfg(feature = "json")]
from!(<serde_json::Error>e => Self::Json(e));

/// A failed column in a row.
#[derive(Debug)]
pub struct ColumnError {
    pub(crate) index: usize,
    pub(crate) oid: Oid,
    pub(crate) type_name: Option<ByteStr>,
    pub(crate) source: DecodeError,
}

impl ColumnError {
    /// Returns the column index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the column declared oid.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the column type name if its known.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Returns the underlying error.
    pub fn error(&self) -> &DecodeError {
        &self.source
    }

    /// Consume self into the underlying error.
    pub fn into_error(self) -> DecodeError {
        self.source
    }
}

impl std::error::Error for ColumnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}", self.index)?;
        match &self.type_name {
            Some(name) => write!(f, " ({name}, OID {})", self.oid)?,
            None => write!(f, " (OID {})", self.oid)?,
        }
        write!(f, ": {}", self.source)
    }
}

/// An error when transcribing a row into destinations.
pub enum RowError {
    /// Destination count does not match row column count.
    ///
    /// This error is returned before any column is read.
    Arity {
        columns: usize,
        targets: usize,
    },
    /// One or more column failed, in column order.
    ///
    /// The row is still walked to its end.
    Columns(Vec<ColumnError>),
}

impl RowError {
    /// Returns the first column error, which is the row terminal error.
    pub fn first(&self) -> Option<&ColumnError> {
        match self {
            Self::Arity { .. } => None,
            Self::Columns(errors) => errors.first(),
        }
    }

    /// Returns all column errors.
    pub fn columns(&self) -> &[ColumnError] {
        match self {
            Self::Arity { .. } => &[],
            Self::Columns(errors) => errors,
        }
    }

    /// Returns `true` if error is [`RowError::Arity`].
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::Arity { .. })
    }
}

impl std::error::Error for RowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.first().map(|e| e as _)
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity { columns, targets } => {
                write!(f, "row has {columns} columns but {targets} destinations given")
            }
            Self::Columns(errors) => {
                let Some(first) = errors.first() else {
                    return f.write_str("row failed")
                };
                write!(f, "{first}")?;
                if errors.len() > 1 {
                    write!(f, " (and {} more)", errors.len() - 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
