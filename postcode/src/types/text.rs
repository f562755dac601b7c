use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    Decode, DecodeError, Encode,
    common::ByteStr,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{Oid, PgFormat, PgType, oid},
    row::Column,
    value::ValueRef,
};

/// Returns `true` for types which transmitted as plain utf8 in both format.
const fn is_text(oid: Oid) -> bool {
    matches!(oid, oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::UNKNOWN)
}

macro_rules! text {
    ($($ty:ty),*) => {$(
        impl PgType for $ty {
            /// `text` variable-length string, no limit specified
            const OID: Oid = oid::TEXT;

            fn accepts(oid: Oid) -> bool {
                is_text(oid)
            }
        }
    )*};
}

text!(String, str, ByteStr);

impl Decode for String {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Ok(String::from_utf8(col.try_into_value()?.into())?)
    }
}

impl Decode for ByteStr {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Ok(ByteStr::from_utf8(col.try_into_value()?)?)
    }
}

macro_rules! encode_text {
    (<$lf:tt>$ty:ty) => {
        impl<$lf> Encode<$lf> for &$lf $ty {
            fn encode(self, ty: &ParamType) -> Result<Encoded<$lf>, EncodeError> {
                ty.accept::<$ty>()?;
                Ok(Encoded::new(ValueRef::from(self.as_bytes()), ty))
            }
        }
    };
    ($ty:ty) => {
        impl Encode<'static> for $ty {
            fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
                ty.accept::<Self>()?;
                Ok(Encoded::new(ValueRef::from(Bytes::from(self)), ty))
            }
        }
    };
}

encode_text!(<'a> str);
encode_text!(<'a> String);
encode_text!(String);

impl Encode<'static> for ByteStr {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        Ok(Encoded::new(ValueRef::from(self.into_bytes()), ty))
    }
}

// ===== bytea =====

macro_rules! bytea {
    ($($ty:ty),*) => {$(
        impl PgType for $ty {
            /// `bytea` variable-length string, binary values escaped
            const OID: Oid = oid::BYTEA;
        }
    )*};
}

bytea!(Bytes, Vec<u8>, [u8]);

impl Decode for Bytes {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        match col.format() {
            PgFormat::Binary => col.try_into_value(),
            PgFormat::Text => {
                let text = col.text()?;
                let hex = text
                    .strip_prefix("\\x")
                    .ok_or_else(|| col.malformed("bytea is not in hex format"))?;
                unhex(hex.as_bytes()).ok_or_else(|| col.malformed("invalid bytea hex"))
            }
        }
    }
}

impl Decode for Vec<u8> {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Bytes::decode(col).map(Into::into)
    }
}

fn unhex(hex: &[u8]) -> Option<Bytes> {
    fn nibble(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    if hex.len() % 2 != 0 {
        return None;
    }
    let mut buf = BytesMut::with_capacity(hex.len() / 2);
    for pair in hex.chunks_exact(2) {
        buf.put_u8(nibble(pair[0])? << 4 | nibble(pair[1])?);
    }
    Some(buf.freeze())
}

fn hex(bytes: &[u8]) -> Bytes {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut buf = BytesMut::with_capacity(2 + bytes.len() * 2);
    buf.put_slice(b"\\x");
    for b in bytes {
        buf.put_u8(HEX[(b >> 4) as usize]);
        buf.put_u8(HEX[(b & 0xf) as usize]);
    }
    buf.freeze()
}

impl<'q> Encode<'q> for &'q [u8] {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        ty.accept::<[u8]>()?;
        let value = match ty.format() {
            PgFormat::Binary => ValueRef::from(self),
            PgFormat::Text => ValueRef::from(hex(self)),
        };
        Ok(Encoded::new(value, ty))
    }
}

impl<'q> Encode<'q> for &'q Vec<u8> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        self.as_slice().encode(ty)
    }
}

impl Encode<'static> for Bytes {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        let value = match ty.format() {
            PgFormat::Binary => ValueRef::from(self),
            PgFormat::Text => ValueRef::from(hex(&self)),
        };
        Ok(Encoded::new(value, ty))
    }
}

impl Encode<'static> for Vec<u8> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        Bytes::from(self).encode(ty)
    }
}
