use bytes::{Buf, BufMut, Bytes};

use crate::common::ByteStr;

/// Integer signess in postgres docs is awful.
pub trait UsizeExt {
    /// Length is `usize` in rust, while postgres want `i32` for value length,
    /// returns [`None`] when overflow instead of wrapping.
    fn to_i32(self) -> Option<i32>;
}

/// Nul string operation in [`BufMut`]
pub trait BufMutExt {
    /// Write string and nul termination.
    fn put_nul_string(&mut self, string: &str);
}

/// Nul string operation in [`Bytes`]
pub trait BytesExt {
    /// Try to read nul terminated string.
    ///
    /// Returns [`None`] if there is no nul termination.
    ///
    /// Using [`ByteStr`] avoid allocating [`Vec`] as it required for [`String::from_utf8`]
    fn get_nul_bytestr(&mut self) -> Option<Result<ByteStr, std::str::Utf8Error>>;
}

/// Helper trait for efficient operation on `Bind` message parameters.
pub trait BindParams: Buf {
    /// The length of the parameter value, in bytes (this count does not include itself).
    ///
    /// Can be zero. As a special case, -1 indicates a NULL parameter value.
    /// No value bytes follow in the NULL case.
    fn size(&self) -> i32;
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

impl UsizeExt for usize {
    fn to_i32(self) -> Option<i32> {
        self.try_into().ok()
    }
}

impl<B: BufMut> BufMutExt for B {
    fn put_nul_string(&mut self, string: &str) {
        self.put(string.as_bytes());
        self.put_u8(b'\0');
    }
}

impl BytesExt for Bytes {
    fn get_nul_bytestr(&mut self) -> Option<Result<ByteStr, std::str::Utf8Error>> {
        let end = self.iter().position(|e| matches!(e, b'\0'))?;
        let me = self.split_to(end);
        Buf::advance(self, 1); // nul
        Some(ByteStr::from_utf8(me))
    }
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nul_string() {
        let mut buf = bytes::BytesMut::new();
        buf.put_nul_string("id");
        buf.put_u8(7);
        let mut bytes = buf.freeze();
        assert_eq!(bytes.get_nul_bytestr().unwrap().unwrap(), "id");
        assert_eq!(&bytes[..], &[7]);
        assert!(bytes.get_nul_bytestr().is_none());
    }

    #[test]
    fn lossy_display() {
        assert_eq!(b"ab\x01"[..].lossy().to_string(), "ab\\x1");
    }
}
