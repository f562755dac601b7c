//! One dimensional array.
//!
//! Binary layout:
//!
//! ```text
//! i32 ndim
//! i32 has_null
//! u32 element oid
//! (i32 len, i32 lower bound) for each dimension
//! (i32 len, value) for each element, len -1 is NULL
//! ```
//!
//! Text layout is `{a,"b c",NULL}` with optional `[lower:upper]=` bounds prefix.
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    ext::UsizeExt,
    postgres::{self, Oid, PgFormat, PgType, oid},
    row::Column,
    value::ValueRef,
};

impl<T: PgType> PgType for Vec<T> {
    const OID: Oid = match postgres::array_of(T::OID) {
        Some(oid) => oid,
        None => oid::UNSPECIFIED,
    };

    fn accepts(oid: Oid) -> bool {
        postgres::element_of(oid).is_some_and(T::accepts)
    }
}

impl<T: PgType> PgType for [T] {
    const OID: Oid = Vec::<T>::OID;

    fn accepts(oid: Oid) -> bool {
        Vec::<T>::accepts(oid)
    }
}

// ===== Decode =====

impl<T: Decode> Decode for Vec<T> {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        match col.format() {
            PgFormat::Binary => decode_binary(&col),
            PgFormat::Text => decode_text(&col),
        }
    }
}

fn decode_binary<T: Decode>(col: &Column) -> Result<Vec<T>, DecodeError> {
    let mut value = col.value().ok_or(DecodeError::Null)?;
    let eof = |_| col.malformed("truncated array");

    let ndim = value.try_get_i32().map_err(eof)?;
    match ndim {
        0 => return Ok(vec![]),
        1 => {}
        ndim if ndim < 0 => return Err(col.malformed(format!("negative dimension {ndim}"))),
        ndim => return Err(DecodeError::Dimension { oid: col.oid(), ndim }),
    }

    let _has_null = value.try_get_i32().map_err(eof)?;
    let element = value.try_get_u32().map_err(eof)?;
    if !T::accepts(element) {
        return Err(DecodeError::mismatch::<T>(element));
    }
    if postgres::element_of(col.oid()) != Some(element) {
        return Err(col.malformed(format!("array of OID {element} sent as OID {}", col.oid())));
    }

    let len = value.try_get_i32().map_err(eof)?;
    let _lower = value.try_get_i32().map_err(eof)?;
    let len = usize::try_from(len).map_err(|_| col.malformed(format!("negative length {len}")))?;

    // every element has at least the length prefix
    let mut items = Vec::with_capacity(len.min(value.remaining() / 4));
    for _ in 0..len {
        let item = match value.try_get_i32().map_err(eof)? {
            -1 => None,
            n if n >= 0 && n as usize <= value.remaining() => Some(value.split_to(n as usize)),
            _ => return Err(col.malformed("truncated array")),
        };
        items.push(col.element(element, PgFormat::Binary, item).decode()?);
    }

    if value.has_remaining() {
        return Err(col.malformed(format!("{} trailing bytes after array", value.remaining())));
    }

    Ok(items)
}

fn decode_text<T: Decode>(col: &Column) -> Result<Vec<T>, DecodeError> {
    let Some(element) = postgres::element_of(col.oid()) else {
        return Err(DecodeError::mismatch::<T>(col.oid()));
    };

    let items = parse_text(col.oid(), col.text()?)?;
    items
        .into_iter()
        .map(|item| col.element(element, PgFormat::Text, item).decode())
        .collect()
}

/// Parse `{a,"b c",NULL}` into its raw elements.
fn parse_text(oid: Oid, text: &str) -> Result<Vec<Option<Bytes>>, DecodeError> {
    let malformed = |reason: &'static str| DecodeError::malformed(oid, reason);

    let body = match text.strip_prefix('[') {
        Some(_) => {
            let (bounds, body) = text.split_once('=').ok_or_else(|| malformed("missing `=` after bounds"))?;
            let ndim = bounds.matches('[').count();
            if ndim != 1 {
                return Err(DecodeError::Dimension { oid, ndim: ndim as i32 });
            }
            body
        }
        None => text,
    };

    let inner = body
        .strip_prefix('{')
        .and_then(|e| e.strip_suffix('}'))
        .ok_or_else(|| malformed("array is not enclosed in braces"))?;

    let mut items = vec![];
    if inner.is_empty() {
        return Ok(items);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_ascii_whitespace()).is_some() { }

        let mut item = String::new();
        let quoted = chars.next_if_eq(&'"').is_some();

        if quoted {
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => item.push(chars.next().ok_or_else(|| malformed("unterminated escape"))?),
                    Some(c) => item.push(c),
                    None => return Err(malformed("unterminated quoted element")),
                }
            }
            while chars.next_if(|c| c.is_ascii_whitespace()).is_some() { }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                match c {
                    '{' => return Err(DecodeError::Dimension { oid, ndim: 2 }),
                    '"' | '}' => return Err(malformed("unexpected character in array element")),
                    '\\' => item.push(chars.next().ok_or_else(|| malformed("unterminated escape"))?),
                    c => item.push(c),
                }
            }
            item.truncate(item.trim_end().len());
        }

        match (quoted, item.as_str()) {
            (false, "") => return Err(malformed("empty array element")),
            (false, null) if null.eq_ignore_ascii_case("NULL") => items.push(None),
            _ => items.push(Some(Bytes::from(item))),
        }

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(malformed("expected `,` after array element")),
        }
    }

    Ok(items)
}

// ===== Encode =====

impl<'q, T: Encode<'q> + PgType> Encode<'q> for Vec<T> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        encode_array::<T>(self.len(), self.into_iter(), ty)
    }
}

impl<'q, T: Encode<'q> + PgType + Clone> Encode<'q> for &'q [T] {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        encode_array::<T>(self.len(), self.iter().cloned(), ty)
    }
}

impl<'q, T: Encode<'q> + PgType + Clone> Encode<'q> for &'q Vec<T> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        self.as_slice().encode(ty)
    }
}

fn encode_array<'q, T>(
    len: usize,
    items: impl Iterator<Item = T>,
    ty: &ParamType,
) -> Result<Encoded<'static>, EncodeError>
where
    T: Encode<'q> + PgType,
{
    let element = ty.element_type::<Vec<T>>()?;
    if !T::accepts(element.oid()) {
        return Err(EncodeError::mismatch::<Vec<T>>(ty.oid()));
    }
    let len = len
        .to_i32()
        .ok_or_else(|| EncodeError::malformed(ty.oid(), "too many array elements"))?;

    let mut buf = BytesMut::new();

    match ty.format() {
        PgFormat::Binary => {
            buf.put_i32(if len == 0 { 0 } else { 1 });
            buf.put_i32(0);
            buf.put_u32(element.oid());
            if len != 0 {
                buf.put_i32(len);
                buf.put_i32(1);
            }
            let mut has_null = false;
            for item in items {
                let item = item.encode(&element)?;
                has_null |= item.is_null();
                item.put(&mut buf);
            }
            if has_null {
                buf[4..8].copy_from_slice(&1i32.to_be_bytes());
            }
        }
        PgFormat::Text => {
            buf.put_u8(b'{');
            for (i, item) in items.enumerate() {
                if i != 0 {
                    buf.put_u8(b',');
                }
                match item.encode(&element)?.as_slice() {
                    Some(value) => put_text_element(&mut buf, value),
                    None => buf.put_slice(b"NULL"),
                }
            }
            buf.put_u8(b'}');
        }
    }

    Ok(Encoded::new(ValueRef::from(buf.freeze()), ty))
}

fn put_text_element(buf: &mut BytesMut, value: &[u8]) {
    let quote = value.is_empty()
        || value.eq_ignore_ascii_case(b"NULL")
        || value
            .iter()
            .any(|b| matches!(b, b'{' | b'}' | b',' | b'"' | b'\\') || b.is_ascii_whitespace());

    if !quote {
        buf.put_slice(value);
        return;
    }

    buf.put_u8(b'"');
    for &b in value {
        if matches!(b, b'"' | b'\\') {
            buf.put_u8(b'\\');
        }
        buf.put_u8(b);
    }
    buf.put_u8(b'"');
}

#[cfg(test)]
mod test {
    use time::{OffsetDateTime, UtcOffset};

    use super::*;
    use crate::{Nullable, row::ColumnDesc};

    fn column(oid: Oid, format: PgFormat, value: impl Into<Bytes>) -> Column {
        let desc = ColumnDesc::new("c", oid, format);
        Column::new(&desc, UtcOffset::UTC, Some(value.into()))
    }

    fn encode<'q>(value: impl Encode<'q>, oid: Oid, format: PgFormat) -> Bytes {
        let encoded = value.encode(&ParamType::new(oid, format)).unwrap();
        Bytes::copy_from_slice(encoded.as_slice().unwrap())
    }

    fn roundtrip<T>(value: Vec<T>, oid: Oid)
    where
        T: Decode + Encode<'static> + Clone + PartialEq + std::fmt::Debug,
    {
        for format in [PgFormat::Binary, PgFormat::Text] {
            let bytes = encode(value.clone(), oid, format);
            let decoded = column(oid, format, bytes).decode::<Vec<T>>().unwrap();
            assert_eq!(decoded, value, "{format}");
        }
    }

    #[test]
    fn lengths() {
        roundtrip(Vec::<i32>::new(), oid::INT4_ARRAY);
        roundtrip(vec![1i32], oid::INT4_ARRAY);
        roundtrip(vec![1i16, 2, 3], oid::INT2_ARRAY);
        roundtrip(vec![i64::MIN, 0, i64::MAX], oid::INT8_ARRAY);
        roundtrip(vec![true, false], oid::BOOL_ARRAY);
        roundtrip(vec![1.5f64, -0.25], oid::FLOAT8_ARRAY);
        roundtrip(
            vec![String::new(), "NULL".into(), "a \"b\" \\c".into(), "{x,y}".into()],
            oid::TEXT_ARRAY,
        );
        roundtrip(vec![Some(1i32), None, Some(3)], oid::INT4_ARRAY);
        roundtrip(vec![Nullable::new(7i64), Nullable::null()], oid::INT8_ARRAY);
        roundtrip(vec![Bytes::from_static(b"\x00\x01")], oid::BYTEA_ARRAY);

        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        roundtrip(vec![now, now], oid::TIMESTAMPTZ_ARRAY);
    }

    #[test]
    fn binary_layout() {
        let bytes = encode(vec![Some(7i16), None], oid::INT2_ARRAY, PgFormat::Binary);
        let mut expected = BytesMut::new();
        for n in [1, 1, oid::INT2 as i32, 2, 1, 2] {
            expected.put_i32(n);
        }
        expected.put_i16(7);
        expected.put_i32(-1);
        assert_eq!(&bytes[..], &expected[..]);

        let empty = encode(Vec::<i16>::new(), oid::INT2_ARRAY, PgFormat::Binary);
        assert_eq!(&empty[..], b"\0\0\0\0\0\0\0\0\0\0\0\x15");
    }

    #[test]
    fn empty_without_reading() {
        // ndim 0 and nothing else
        let col = column(oid::TEXT_ARRAY, PgFormat::Binary, &b"\0\0\0\0"[..]);
        assert_eq!(col.decode::<Vec<String>>().unwrap(), Vec::<String>::new());
        let col = column(oid::TEXT_ARRAY, PgFormat::Text, &b"{}"[..]);
        assert_eq!(col.decode::<Vec<String>>().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn text_layout() {
        let col = column(oid::TEXT_ARRAY, PgFormat::Text, &br#"{a,"b c",NULL,"NULL", d ,"e\"f"}"#[..]);
        let value = col.decode::<Vec<Option<String>>>().unwrap();
        let expected = [Some("a"), Some("b c"), None, Some("NULL"), Some("d"), Some("e\"f")];
        assert_eq!(value, expected.map(|e| e.map(String::from)));

        let col = column(oid::INT4_ARRAY, PgFormat::Text, &b"[0:2]={1,2,3}"[..]);
        assert_eq!(col.decode::<Vec<i32>>().unwrap(), [1, 2, 3]);

        let text = encode(vec![Some("a b"), None, Some("")], oid::TEXT_ARRAY, PgFormat::Text);
        assert_eq!(&text[..], br#"{"a b",NULL,""}"#);
    }

    #[test]
    fn dimension() {
        let mut buf = BytesMut::new();
        for n in [2, 0, oid::INT4 as i32, 1, 1, 1, 1, 4, 1] {
            buf.put_i32(n);
        }
        let col = column(oid::INT4_ARRAY, PgFormat::Binary, buf.freeze());
        assert!(matches!(col.decode::<Vec<i32>>(), Err(DecodeError::Dimension { ndim: 2, .. })));

        let col = column(oid::INT4_ARRAY, PgFormat::Text, &b"{{1,2},{3,4}}"[..]);
        assert!(matches!(col.decode::<Vec<i32>>(), Err(DecodeError::Dimension { .. })));

        let col = column(oid::INT4_ARRAY, PgFormat::Text, &b"[1:2][1:2]={{1,2},{3,4}}"[..]);
        assert!(matches!(col.decode::<Vec<i32>>(), Err(DecodeError::Dimension { ndim: 2, .. })));
    }

    #[test]
    fn element_mismatch() {
        let col = column(oid::INT4_ARRAY, PgFormat::Binary, &b"\0\0\0\0"[..]);
        assert!(col.decode::<Vec<i64>>().unwrap_err().is_type_mismatch());

        let err = vec![1i64].encode(&ParamType::new(oid::INT4_ARRAY, PgFormat::Binary)).unwrap_err();
        assert!(err.is_type_mismatch());
        let err = vec![1i32].encode(&ParamType::new(oid::INT4, PgFormat::Binary)).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn truncated() {
        let bytes = encode(vec![1i32, 2], oid::INT4_ARRAY, PgFormat::Binary);
        let col = column(oid::INT4_ARRAY, PgFormat::Binary, bytes.slice(..bytes.len() - 1));
        assert!(col.decode::<Vec<i32>>().unwrap_err().is_malformed());

        let col = column(oid::INT4_ARRAY, PgFormat::Text, &b"{1,2"[..]);
        assert!(col.decode::<Vec<i32>>().unwrap_err().is_malformed());
    }
}
