use bytes::Bytes;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{self, Kind, Oid, PgType, oid},
    row::Column,
    types::Inet,
};

/// Any builtin value, decoded according to the column oid.
///
/// ```
/// use postcode::{Value, postgres::oid};
///
/// let value = Value::from(vec![Value::from(1i32), Value::Null]);
/// assert_eq!(value.oid(), oid::INT4_ARRAY);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytea(Bytes),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    TimestampTz(OffsetDateTime),
    /// `inet` or `cidr`
    Inet(Inet),
    /// `json` or `jsonb`
    #[cfg(feature = "json")]
    Json(serde_json::Value),
    /// One dimensional array.
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` if value is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the oid the value is encoded as by default.
    ///
    /// Array oid is resolved from its first non `NULL` element, `NULL` and array of `NULL`
    /// have unspecified oid.
    pub fn oid(&self) -> Oid {
        match self {
            Self::Null => oid::UNSPECIFIED,
            Self::Bool(_) => oid::BOOL,
            Self::Int2(_) => oid::INT2,
            Self::Int4(_) => oid::INT4,
            Self::Int8(_) => oid::INT8,
            Self::Float4(_) => oid::FLOAT4,
            Self::Float8(_) => oid::FLOAT8,
            Self::Text(_) => oid::TEXT,
            Self::Bytea(_) => oid::BYTEA,
            Self::Date(_) => oid::DATE,
            Self::Timestamp(_) => oid::TIMESTAMP,
            Self::TimestampTz(_) => oid::TIMESTAMPTZ,
            Self::Inet(_) => oid::INET,
            #[cfg(feature = "json")]
            Self::Json(_) => oid::JSONB,
            Self::Array(items) => items
                .iter()
                .map(Value::oid)
                .find(|oid| *oid != oid::UNSPECIFIED)
                .and_then(postgres::array_of)
                .unwrap_or(oid::UNSPECIFIED),
        }
    }
}

impl PgType for Value {
    const OID: Oid = oid::UNSPECIFIED;

    fn accepts(oid: Oid) -> bool {
        match Kind::of(oid) {
            #[cfg(not(feature = "json"))]
            Some(Kind::Json | Kind::Jsonb) => false,
            Some(Kind::Array(element)) => Value::accepts(element),
            Some(_) => true,
            None => false,
        }
    }
}

impl Decode for Value {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.is_null() {
            return Ok(Value::Null);
        }
        let value = match Kind::of(col.oid()) {
            Some(Kind::Bool) => Self::Bool(col.decode()?),
            Some(Kind::Int2) => Self::Int2(col.decode()?),
            Some(Kind::Int4) => Self::Int4(col.decode()?),
            Some(Kind::Int8) => Self::Int8(col.decode()?),
            Some(Kind::Float4) => Self::Float4(col.decode()?),
            Some(Kind::Float8) => Self::Float8(col.decode()?),
            Some(Kind::Text) => Self::Text(col.decode()?),
            Some(Kind::Bytea) => Self::Bytea(col.decode()?),
            Some(Kind::Date) => Self::Date(col.decode()?),
            Some(Kind::Timestamp) => Self::Timestamp(col.decode()?),
            Some(Kind::TimestampTz) => Self::TimestampTz(col.decode()?),
            Some(Kind::Inet | Kind::Cidr) => Self::Inet(col.decode()?),
            #[cfg(feature = "json")]
            Some(Kind::Json | Kind::Jsonb) => Self::Json(col.decode::<super::Json<_>>()?.0),
            Some(Kind::Array(_)) => Self::Array(col.decode()?),
            #[allow(unreachable_patterns)]
            _ => return Err(DecodeError::mismatch::<Self>(col.oid())),
        };
        Ok(value)
    }
}

impl Encode<'static> for Value {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        match self {
            Self::Null => Ok(Encoded::null(ty)),
            Self::Bool(v) => v.encode(ty),
            Self::Int2(v) => v.encode(ty),
            Self::Int4(v) => v.encode(ty),
            Self::Int8(v) => v.encode(ty),
            Self::Float4(v) => v.encode(ty),
            Self::Float8(v) => v.encode(ty),
            Self::Text(v) => v.encode(ty),
            Self::Bytea(v) => v.encode(ty),
            Self::Date(v) => v.encode(ty),
            Self::Timestamp(v) => v.encode(ty),
            Self::TimestampTz(v) => v.encode(ty),
            Self::Inet(v) => v.encode(ty),
            #[cfg(feature = "json")]
            Self::Json(v) => super::Json(v).encode(ty),
            Self::Array(v) => v.encode(ty),
        }
    }
}

macro_rules! from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        }
    )*};
}

from! {
    bool => Bool,
    i16 => Int2,
    i32 => Int4,
    i64 => Int8,
    f32 => Float4,
    f64 => Float8,
    String => Text,
    &str => Text,
    Bytes => Bytea,
    Vec<u8> => Bytea,
    Date => Date,
    PrimitiveDateTime => Timestamp,
    OffsetDateTime => TimestampTz,
    Inet => Inet,
    Vec<Value> => Array,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod test {
    use time::UtcOffset;

    use super::*;
    use crate::{postgres::PgFormat, row::ColumnDesc};

    fn roundtrip(value: Value, oid: Oid, format: PgFormat) -> Value {
        let encoded = value.encode(&ParamType::new(oid, format)).unwrap();
        let value = encoded.as_slice().map(Bytes::copy_from_slice);
        let desc = ColumnDesc::new("c", oid, format);
        Column::new(&desc, UtcOffset::UTC, value).decode().unwrap()
    }

    #[test]
    fn dispatch_by_oid() {
        let date = Date::from_calendar_date(2020, time::Month::March, 1).unwrap();
        let inet: Inet = "10.0.0.0/8".parse().unwrap();
        let values = [
            Value::Null,
            Value::from(true),
            Value::from(-2i16),
            Value::from(3i32),
            Value::from(4i64),
            Value::from(0.5f32),
            Value::from(0.25f64),
            Value::from("foo"),
            Value::from(vec![0u8, 1]),
            Value::from(date),
            Value::from(date.midnight()),
            Value::from(date.midnight().assume_utc()),
            Value::from(inet),
            Value::from(vec![Value::from(1i64), Value::Null]),
        ];
        for value in values {
            let oid = match value.oid() {
                oid::UNSPECIFIED => oid::TEXT,
                oid => oid,
            };
            for format in [PgFormat::Binary, PgFormat::Text] {
                assert_eq!(roundtrip(value.clone(), oid, format), value, "{value:?} {format}");
            }
        }
    }

    #[test]
    fn kind_mismatch() {
        let err = Value::from(1i32).encode(&ParamType::new(oid::TEXT, PgFormat::Binary)).unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(!Value::accepts(oid::OID));
        assert!(!Value::accepts(99_999));
        assert!(Value::accepts(oid::CIDR_ARRAY));
    }
}
