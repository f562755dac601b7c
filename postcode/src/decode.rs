//! Column value decoding.
//!
//! - [`Decode`]
//! - [`DecodeError`]
//! - [`RowError`]
use crate::{postgres::PgType, row::Column};

mod error;

pub use error::{ColumnError, DecodeError, RowError};

/// A type that can be constructed from [`Column`].
///
/// Implementor can assume that the column oid is already [accepted][PgType::accepts], use
/// [`Column::decode`] instead of calling [`Decode::decode`] directly.
///
/// Every [`Decode`] type is also a [`Scan`][crate::Scan] destination.
pub trait Decode: PgType + Sized {
    /// Try decode self from column.
    fn decode(column: Column) -> Result<Self, DecodeError>;
}
