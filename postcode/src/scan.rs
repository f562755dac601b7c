//! The [`Scan`] trait, row destination.
//!
//! A [`Scan`] implementation reads its column directly from the shared [`Cursor`], through a
//! [`ValueReader`] bounded by the column declared length. Every [`Decode`] type is a [`Scan`]
//! destination, user defined types may implement [`Scan`] directly to read the raw value.
//!
//! Whatever the implementation reads, the cursor is moved to the end of the column after
//! [`Scan::scan`] returns, so a short read can never desynchronize the following columns.
//!
//! ```
//! use postcode::{DecodeError, Scan, ValueReader};
//!
//! /// Only keep the first byte of the value.
//! struct FirstByte(Option<u8>);
//!
//! impl Scan for FirstByte {
//!     fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
//!         self.0 = match reader.is_null() {
//!             true => None,
//!             false => Some(reader.read_u8()?),
//!         };
//!         Ok(())
//!     }
//! }
//! ```
use bytes::Bytes;
use time::UtcOffset;

use crate::{
    Decode, DecodeError,
    cursor::Cursor,
    postgres::{Oid, PgFormat},
    row::{Column, ColumnDesc},
};

/// A destination which can consume one column value.
pub trait Scan {
    /// Consume the column value from `reader`.
    ///
    /// On error, implementor should leave self untouched.
    fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError>;
}

impl<T: Decode> Scan for T {
    fn scan(&mut self, reader: &mut ValueReader<'_>) -> Result<(), DecodeError> {
        if !T::accepts(reader.oid()) {
            return Err(DecodeError::mismatch::<T>(reader.oid()));
        }
        *self = reader.column()?.decode()?;
        Ok(())
    }
}

/// Bounded view of one column value over the shared [`Cursor`].
pub struct ValueReader<'a> {
    cursor: &'a mut dyn Cursor,
    desc: &'a ColumnDesc,
    timezone: UtcOffset,
    len: Option<usize>,
    end: usize,
}

impl<'a> ValueReader<'a> {
    /// `cursor` must be at the start of the value, `len` is [`None`] for `NULL`.
    pub(crate) fn new(
        cursor: &'a mut dyn Cursor,
        desc: &'a ColumnDesc,
        timezone: UtcOffset,
        len: Option<usize>,
    ) -> Self {
        let end = cursor.position() + len.unwrap_or(0);
        Self { cursor, desc, timezone, len, end }
    }

    /// Returns the column declared [`Oid`].
    pub fn oid(&self) -> Oid {
        self.desc.oid()
    }

    /// Returns the column format.
    pub fn format(&self) -> PgFormat {
        self.desc.format()
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        self.desc.name()
    }

    /// Returns the offset used for date and time value without time zone.
    pub fn timezone(&self) -> UtcOffset {
        self.timezone
    }

    /// Returns `true` if value is `NULL`.
    pub fn is_null(&self) -> bool {
        self.len.is_none()
    }

    /// Returns the declared length of the value, [`None`] if value is `NULL`.
    pub fn len(&self) -> Option<usize> {
        self.len
    }

    /// Returns the number of unread bytes of the value.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.cursor.position())
    }

    /// Returns the next byte of the value without advancing.
    pub fn peek_u8(&self) -> Option<u8> {
        match self.remaining() {
            0 => None,
            _ => self.cursor.peek_u8(),
        }
    }

    /// Read one byte of the value.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read(1)?[0])
    }

    /// Read exactly `n` bytes of the value.
    ///
    /// Reading past the value declared length is an error.
    pub fn read(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        if self.is_null() {
            return Err(DecodeError::Null);
        }
        if n > self.remaining() {
            return Err(DecodeError::malformed(
                self.oid(),
                format!("read {n} bytes past the value, {} remaining", self.remaining()),
            ));
        }
        self.cursor
            .read(n)
            .map_err(|_| DecodeError::malformed(self.oid(), "truncated value"))
    }

    /// Read the rest of the value, [`None`] if value is `NULL`.
    pub fn read_all(&mut self) -> Result<Option<Bytes>, DecodeError> {
        match self.is_null() {
            true => Ok(None),
            false => self.read(self.remaining()).map(Some),
        }
    }

    /// Read the rest of the value as owned [`Column`].
    pub fn column(&mut self) -> Result<Column, DecodeError> {
        let value = self.read_all()?;
        Ok(Column::new(self.desc, self.timezone, value))
    }
}

impl std::fmt::Debug for ValueReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueReader")
            .field("name", &self.name())
            .field("oid", &self.oid())
            .field("format", &self.format())
            .field("len", &self.len)
            .field("remaining", &self.remaining())
            .finish()
    }
}
