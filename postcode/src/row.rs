//! Postgres row operation.
//!
//! - [`Row`]
//! - [`ColumnDesc`]
//! - [`Column`]
//! - [`FromRow`]
//!
//! - [`Index`]
use bytes::{Buf, BufMut, Bytes};
use std::{borrow::Cow, fmt, sync::Arc};
use time::UtcOffset;

use crate::{
    Codec, Decode, DecodeError, RowError, Scan,
    common::ByteStr,
    cursor::{ByteCursor, Cursor},
    ext::{BufMutExt, BytesExt, FmtExt},
    postgres::{Oid, PgFormat},
};

// <https://www.postgresql.org/docs/current/protocol-message-formats.html#PROTOCOL-MESSAGE-FORMATS-ROWDESCRIPTION>
// table_oid
// attribute_len
// oid
// data_type_size
// type_modifier
// format_code
const SUFFIX: usize = size_of::<u32>()
    + size_of::<i16>()
    + size_of::<u32>()
    + size_of::<i16>()
    + size_of::<i32>()
    + size_of::<u16>();

/// Column description, one field of `RowDescription` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    name: ByteStr,
    table_oid: Oid,
    attribute: i16,
    oid: Oid,
    type_size: i16,
    type_modifier: i32,
    format: PgFormat,
}

impl ColumnDesc {
    /// Create description of a computed column.
    pub fn new(name: impl Into<ByteStr>, oid: Oid, format: PgFormat) -> ColumnDesc {
        Self {
            name: name.into(),
            table_oid: 0,
            attribute: 0,
            oid,
            type_size: -1,
            type_modifier: -1,
            format,
        }
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns column data type [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the format the column is transmitted in.
    pub const fn format(&self) -> PgFormat {
        self.format
    }

    /// If the field can be identified as a column of a specific table,
    /// returns the object ID of the table.
    pub const fn table_oid(&self) -> Option<Oid> {
        match self.table_oid {
            0 => None,
            oid => Some(oid),
        }
    }

    /// If the field can be identified as a column of a specific table,
    /// returns the attribute number of the column.
    pub const fn attribute(&self) -> Option<i16> {
        match self.attribute {
            0 => None,
            n => Some(n),
        }
    }

    /// The data type size (see `pg_type.typlen`), negative values denote variable-width types.
    pub const fn type_size(&self) -> i16 {
        self.type_size
    }

    /// The type modifier (see `pg_attribute.atttypmod`).
    pub const fn type_modifier(&self) -> i32 {
        self.type_modifier
    }

    /// Parse `RowDescription` message body.
    pub fn parse_description(mut body: Bytes) -> Result<Vec<ColumnDesc>, DecodeError> {
        let eof = || DecodeError::malformed(0, "truncated RowDescription");

        let len = body.try_get_u16().map_err(|_| eof())?;
        let mut columns = Vec::with_capacity(len as _);

        for _ in 0..len {
            let name = body.get_nul_bytestr().ok_or_else(eof)??;
            if body.remaining() < SUFFIX {
                return Err(eof());
            }
            let table_oid = body.get_u32();
            let attribute = body.get_i16();
            let oid = body.get_u32();
            let type_size = body.get_i16();
            let type_modifier = body.get_i32();
            let code = body.get_u16();
            let Some(format) = PgFormat::from_code(code) else {
                return Err(DecodeError::malformed(oid, format!("unknown format code {code}")))
            };
            columns.push(ColumnDesc { name, table_oid, attribute, oid, type_size, type_modifier, format });
        }

        Ok(columns)
    }

    /// Write `RowDescription` message body.
    pub fn put_description(columns: &[ColumnDesc], buf: &mut impl BufMut) {
        buf.put_u16(columns.len().try_into().expect("too many columns for protocol"));
        for col in columns {
            buf.put_nul_string(&col.name);
            buf.put_u32(col.table_oid);
            buf.put_i16(col.attribute);
            buf.put_u32(col.oid);
            buf.put_i16(col.type_size);
            buf.put_i32(col.type_modifier);
            buf.put_u16(col.format.format_code());
        }
    }
}

/// Postgres row, a `DataRow` message with its description.
pub struct Row {
    codec: Codec,
    columns: Arc<[ColumnDesc]>,
    /// `DataRow` body, including the leading column count
    data: Bytes,
}

impl Row {
    pub(crate) fn new(codec: Codec, columns: Arc<[ColumnDesc]>, data: Bytes) -> Result<Self, RowError> {
        let found = match (&data[..]).try_get_u16() {
            Ok(len) => len as usize,
            Err(_) => 0,
        };
        if found != columns.len() {
            return Err(RowError::Arity { columns: found, targets: columns.len() });
        }
        Ok(Self { codec, columns, data })
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the number of fields/column.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns the row description.
    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// Try get and decode column.
    pub fn try_get<I: Index, R: Decode>(&self, idx: I) -> Result<R, DecodeError> {
        let nth = idx.position(&self.columns)?;

        let mut cursor = ByteCursor::new(self.data.clone());
        let eof = |_| DecodeError::malformed(self.columns[nth].oid, "truncated DataRow");
        cursor.read_u16().map_err(eof)?;

        let mut i = 0;
        let value = loop {
            let len = cursor.read_i32().map_err(eof)?;
            let value = match len {
                -1 => None,
                _ => Some(cursor.read(len as _).map_err(eof)?),
            };
            if i == nth {
                break value;
            }
            i += 1;
        };

        Column::new(&self.columns[nth], self.codec.config().timezone, value).decode()
    }

    /// Decode every column into `targets`, see [`Codec::decode_row`].
    pub fn scan(&self, targets: &mut [&mut dyn Scan]) -> Result<(), RowError> {
        let mut cursor = ByteCursor::new(self.data.clone());
        self.codec.decode_row(&mut cursor, &self.columns, targets)
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D, DecodeError> {
        D::from_row(self)
    }
}

impl IntoIterator for Row {
    type Item = Result<Column, DecodeError>;

    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        let mut cursor = ByteCursor::new(self.data);
        let _ = cursor.read_u16();
        IntoIter {
            timezone: self.codec.config().timezone,
            columns: self.columns,
            cursor,
            iter_n: 0,
        }
    }
}

/// [`IntoIterator`] implementation from [`Row`].
#[derive(Debug)]
pub struct IntoIter {
    timezone: UtcOffset,
    columns: Arc<[ColumnDesc]>,
    cursor: ByteCursor,
    iter_n: usize,
}

impl IntoIter {
    /// Same as [`Iterator::next`] but returns [`Result`] instead.
    pub fn try_next(&mut self) -> Result<Column, DecodeError> {
        match self.next() {
            Some(ok) => ok,
            None => Err(DecodeError::IndexOutOfBounds(self.iter_n)),
        }
    }
}

impl Iterator for IntoIter {
    type Item = Result<Column, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let desc = self.columns.get(self.iter_n)?;
        let eof = |_| DecodeError::malformed(desc.oid, "truncated DataRow");

        let value = match self.cursor.read_i32().map_err(eof) {
            Ok(-1) => Ok(None),
            Ok(len) => self.cursor.read(len as _).map(Some).map_err(eof),
            Err(err) => Err(err),
        };
        let value = match value {
            Ok(ok) => ok,
            Err(err) => {
                self.iter_n = self.columns.len();
                return Some(Err(err))
            },
        };
        self.iter_n += 1;

        Some(Ok(Column::new(desc, self.timezone, value)))
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        let mut v = ByteCursor::new(self.data.clone());
        let _ = v.read_u16();
        for col in self.columns.iter() {
            let Ok(len) = v.read_i32() else { break };
            dbg.key(&col.name);
            match len {
                -1 => dbg.value(&format_args!("NULL")),
                len => match v.read(len as _) {
                    Ok(value) => dbg.value(&value.lossy()),
                    Err(_) => break,
                },
            };
        }
        dbg.finish()
    }
}

/// Postgres column value.
#[derive(Debug, Clone)]
pub struct Column {
    name: ByteStr,
    oid: Oid,
    format: PgFormat,
    timezone: UtcOffset,
    value: Option<Bytes>,
}

impl Column {
    pub(crate) fn new(desc: &ColumnDesc, timezone: UtcOffset, value: Option<Bytes>) -> Self {
        Self {
            name: desc.name.clone(),
            oid: desc.oid,
            format: desc.format,
            timezone,
            value,
        }
    }

    /// Column of an array element.
    pub(crate) fn element(&self, oid: Oid, format: PgFormat, value: Option<Bytes>) -> Self {
        Self {
            name: self.name.clone(),
            oid,
            format,
            timezone: self.timezone,
            value,
        }
    }

    /// Returns column [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the format the value is transmitted in.
    pub const fn format(&self) -> PgFormat {
        self.format
    }

    /// Returns the offset used for date and time value without time zone.
    pub const fn timezone(&self) -> UtcOffset {
        self.timezone
    }

    /// Return `true` if value is NULL.
    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Extract the inner bytes as slice.
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Clone the inner [`Bytes`].
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn value(&self) -> Option<Bytes> {
        self.value.as_ref().cloned()
    }

    /// Consume self into the inner [`Bytes`].
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn into_value(self) -> Option<Bytes> {
        self.value
    }

    /// Try consume self into the inner [`Bytes`].
    ///
    /// Return [`DecodeError::Null`] if value is `NULL`.
    pub fn try_into_value(self) -> Result<Bytes, DecodeError> {
        self.value.ok_or(DecodeError::Null)
    }

    /// Try decode type using [`Decode`] implementation.
    ///
    /// Returns [`DecodeError::TypeMismatch`] before reading any bytes if `D` does not accept
    /// the column oid.
    pub fn decode<D: Decode>(self) -> Result<D, DecodeError> {
        if !D::accepts(self.oid) {
            return Err(DecodeError::mismatch::<D>(self.oid));
        }
        D::decode(self)
    }

    /// Returns the value as exactly `N` bytes.
    pub(crate) fn fixed<const N: usize>(&self) -> Result<[u8; N], DecodeError> {
        let value = self.value.as_deref().ok_or(DecodeError::Null)?;
        value.try_into().map_err(|_| {
            self.malformed(format!("expected {N} bytes, found {}", value.len()))
        })
    }

    /// Returns the value as utf8 str.
    pub(crate) fn text(&self) -> Result<&str, DecodeError> {
        let value = self.value.as_deref().ok_or(DecodeError::Null)?;
        Ok(std::str::from_utf8(value)?)
    }

    pub(crate) fn malformed(&self, reason: impl Into<Cow<'static,str>>) -> DecodeError {
        DecodeError::malformed(self.oid, reason)
    }
}

// ===== Traits =====

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        Ok(row)
    }
}

impl FromRow for () {
    fn from_row(_: Row) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok((
                    $(row.try_get::<usize, $t>($i)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4, T5 5);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4, T5 5, T6 6);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4, T5 5, T6 6, T7 7);

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Returns the column position.
    fn position(self, columns: &[ColumnDesc]) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, columns: &[ColumnDesc]) -> Result<usize, DecodeError> {
        match self < columns.len() {
            true => Ok(self),
            false => Err(DecodeError::IndexOutOfBounds(self)),
        }
    }
}

impl Index for &str {
    fn position(self, columns: &[ColumnDesc]) -> Result<usize, DecodeError> {
        columns
            .iter()
            .position(|e| e.name() == self)
            .ok_or_else(|| DecodeError::ColumnNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}
