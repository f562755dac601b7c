//! The [`Cursor`] trait.
use bytes::Bytes;

use crate::common::unit_error;

/// A read cursor over protocol bytes, shared by every column of a row.
///
/// The transcoding engine is the only reader while a row is processed. It reads forward and only
/// moves backward to restore column alignment.
pub trait Cursor {
    /// Returns the absolute read position.
    fn position(&self) -> usize;

    /// Returns the number of bytes left after current position.
    fn remaining(&self) -> usize;

    /// Returns the next byte without advancing.
    fn peek_u8(&self) -> Option<u8>;

    /// Read exactly `n` bytes and advance.
    fn read(&mut self, n: usize) -> Result<Bytes, UnexpectedEof>;

    /// Move the read position to absolute `position`.
    fn advance_to(&mut self, position: usize) -> Result<(), UnexpectedEof>;

    /// Read network order `i32`.
    fn read_i32(&mut self) -> Result<i32, UnexpectedEof> {
        let mut be = [0u8; 4];
        be.copy_from_slice(&self.read(4)?);
        Ok(i32::from_be_bytes(be))
    }

    /// Read network order `u16`.
    fn read_u16(&mut self) -> Result<u16, UnexpectedEof> {
        let mut be = [0u8; 2];
        be.copy_from_slice(&self.read(2)?);
        Ok(u16::from_be_bytes(be))
    }
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn position(&self) -> usize {
        C::position(self)
    }

    fn remaining(&self) -> usize {
        C::remaining(self)
    }

    fn peek_u8(&self) -> Option<u8> {
        C::peek_u8(self)
    }

    fn read(&mut self, n: usize) -> Result<Bytes, UnexpectedEof> {
        C::read(self, n)
    }

    fn advance_to(&mut self, position: usize) -> Result<(), UnexpectedEof> {
        C::advance_to(self, position)
    }
}

/// [`Cursor`] over in memory [`Bytes`], typically a message body.
#[derive(Debug, Clone, Default)]
pub struct ByteCursor {
    buf: Bytes,
    pos: usize,
}

impl ByteCursor {
    /// Create cursor at the start of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> ByteCursor {
        Self { buf: buf.into(), pos: 0 }
    }

    /// Returns the total length of the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the unread bytes.
    pub fn rest(&self) -> Bytes {
        self.buf.slice(self.pos..)
    }

    /// Consume self into the underlying buffer.
    pub fn into_inner(self) -> Bytes {
        self.buf
    }
}

impl Cursor for ByteCursor {
    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn read(&mut self, n: usize) -> Result<Bytes, UnexpectedEof> {
        if n > self.remaining() {
            return Err(UnexpectedEof);
        }
        let bytes = self.buf.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    fn advance_to(&mut self, position: usize) -> Result<(), UnexpectedEof> {
        if position > self.buf.len() {
            return Err(UnexpectedEof);
        }
        self.pos = position;
        Ok(())
    }
}

unit_error! {
    /// An error when cursor reach the end of buffer.
    pub struct UnexpectedEof("unexpected end of buffer");
}
