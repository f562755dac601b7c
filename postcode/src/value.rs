use bytes::{Buf, Bytes};

const INLINE_LEN: usize = 15;

/// Encoded value buffer, avoid allocation for small and borrowed value.
pub(crate) enum ValueRef<'a> {
    Slice(&'a [u8]),
    Inline {
        offset: usize,
        value: [u8;INLINE_LEN],
    },
    Bytes(Bytes)
}

impl ValueRef<'_> {
    pub fn inline(slice: &[u8]) -> ValueRef<'static> {
        let len = slice.len();
        assert!(len < INLINE_LEN, "inline slice is too large");
        let mut value = [0u8;INLINE_LEN];
        value[INLINE_LEN - len..].copy_from_slice(slice);
        ValueRef::Inline { offset: INLINE_LEN - len, value }
    }

    /// Inline small slice, otherwise copy into [`Bytes`].
    pub fn copy(slice: &[u8]) -> ValueRef<'static> {
        match slice.len() < INLINE_LEN {
            true => ValueRef::inline(slice),
            false => ValueRef::Bytes(Bytes::copy_from_slice(slice)),
        }
    }

    pub fn empty() -> ValueRef<'static> {
        ValueRef::Slice(&[])
    }
}

impl<'a> From<&'a [u8]> for ValueRef<'a> {
    fn from(value: &'a [u8]) -> Self {
        ValueRef::Slice(value)
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(value: &'a str) -> Self {
        ValueRef::Slice(value.as_bytes())
    }
}

impl From<Bytes> for ValueRef<'static> {
    fn from(value: Bytes) -> Self {
        ValueRef::Bytes(value)
    }
}

impl From<Vec<u8>> for ValueRef<'static> {
    fn from(value: Vec<u8>) -> Self {
        ValueRef::Bytes(value.into())
    }
}

impl From<String> for ValueRef<'static> {
    fn from(value: String) -> Self {
        ValueRef::Bytes(value.into_bytes().into())
    }
}

impl Buf for ValueRef<'_> {
    fn remaining(&self) -> usize {
        match self {
            ValueRef::Slice(items) => Buf::remaining(items),
            ValueRef::Inline { offset, .. } => INLINE_LEN - offset,
            ValueRef::Bytes(bytes) => Buf::remaining(bytes),
        }
    }

    fn chunk(&self) -> &[u8] {
        match self {
            ValueRef::Slice(items) => Buf::chunk(items),
            ValueRef::Inline { offset, value } => &value[*offset..],
            ValueRef::Bytes(bytes) => Buf::chunk(bytes),
        }
    }

    fn advance(&mut self, cnt: usize) {
        match self {
            ValueRef::Slice(items) => Buf::advance(items, cnt),
            ValueRef::Inline { offset, .. } => *offset += cnt,
            ValueRef::Bytes(bytes) => Buf::advance(bytes, cnt),
        }
    }
}

impl std::fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use crate::ext::FmtExt;
        std::fmt::Debug::fmt(&self.chunk().lossy(), f)
    }
}
