use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{Oid, PgType},
    row::Column,
};

/// A value which may be `NULL`.
///
/// An invalid [`Nullable`] always holds `T::default()`, so comparing two `NULL` is well
/// defined. For most code [`Option`] is more convenient, both transcode the same way.
///
/// ```
/// use postcode::Nullable;
///
/// let some = Nullable::new(7i32);
/// let null = Nullable::<i32>::null();
///
/// assert_eq!(some.get(), Some(&7));
/// assert!(!null.is_valid());
/// assert_eq!(null, Nullable::<i32>::from(None));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nullable<T> {
    value: T,
    valid: bool,
}

impl<T> Nullable<T> {
    /// Create valid value.
    pub const fn new(value: T) -> Nullable<T> {
        Self { value, valid: true }
    }

    /// Returns `true` if value is not `NULL`.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns reference to the value, [`None`] if value is `NULL`.
    pub const fn get(&self) -> Option<&T> {
        match self.valid {
            true => Some(&self.value),
            false => None,
        }
    }

    /// Consume self into [`Option`].
    pub fn into_option(self) -> Option<T> {
        match self.valid {
            true => Some(self.value),
            false => None,
        }
    }
}

impl<T: Default> Nullable<T> {
    /// Create `NULL` value.
    pub fn null() -> Nullable<T> {
        Self { value: T::default(), valid: false }
    }
}

impl<T: Default> Default for Nullable<T> {
    /// `NULL`
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::new(value),
            None => Self::null(),
        }
    }
}

impl<T> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.into_option()
    }
}

impl<T: PgType> PgType for Nullable<T> {
    const OID: Oid = T::OID;

    fn accepts(oid: Oid) -> bool {
        T::accepts(oid)
    }
}

impl<T: Decode + Default> Decode for Nullable<T> {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.is_null() {
            true => Ok(Self::null()),
            false => column.decode().map(Self::new),
        }
    }
}

impl<'q, T: Encode<'q>> Encode<'q> for Nullable<T> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        match self.valid {
            true => self.value.encode(ty),
            false => Ok(Encoded::null(ty)),
        }
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use time::UtcOffset;

    use super::*;
    use crate::{
        postgres::{PgFormat, oid},
        row::ColumnDesc,
    };

    fn roundtrip<T>(value: Nullable<T>, oid: Oid, format: PgFormat) -> Nullable<T>
    where
        T: Decode + Default + Encode<'static>,
    {
        let encoded = value.encode(&ParamType::new(oid, format)).unwrap();
        let value = encoded.as_slice().map(Bytes::copy_from_slice);
        let desc = ColumnDesc::new("c", oid, format);
        Column::new(&desc, UtcOffset::UTC, value).decode().unwrap()
    }

    #[test]
    fn null_roundtrip() {
        for format in [PgFormat::Binary, PgFormat::Text] {
            assert_eq!(roundtrip(Nullable::<String>::null(), oid::TEXT, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<i16>::null(), oid::INT2, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<i32>::null(), oid::INT4, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<i64>::null(), oid::INT8, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<f32>::null(), oid::FLOAT4, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<f64>::null(), oid::FLOAT8, format), Nullable::null());
            assert_eq!(roundtrip(Nullable::<bool>::null(), oid::BOOL, format), Nullable::null());
        }
    }

    #[test]
    fn valid_roundtrip() {
        for format in [PgFormat::Binary, PgFormat::Text] {
            let s = Nullable::new(String::from("foo"));
            assert_eq!(roundtrip(s.clone(), oid::TEXT, format), s);
            assert_eq!(roundtrip(Nullable::new(1i16), oid::INT2, format), Nullable::new(1));
            assert_eq!(roundtrip(Nullable::new(1i32), oid::INT4, format), Nullable::new(1));
            assert_eq!(roundtrip(Nullable::new(1i64), oid::INT8, format), Nullable::new(1));
            assert_eq!(roundtrip(Nullable::new(1.23f32), oid::FLOAT4, format), Nullable::new(1.23));
            assert_eq!(roundtrip(Nullable::new(1.23f64), oid::FLOAT8, format), Nullable::new(1.23));
            assert_eq!(roundtrip(Nullable::new(true), oid::BOOL, format), Nullable::new(true));
        }
    }

    #[test]
    fn mismatch_surface_scalar_error() {
        let err = Nullable::new(1i16).encode(&ParamType::new(oid::DATE, PgFormat::Binary)).unwrap_err();
        assert_eq!(err.to_string(), "cannot encode `i16` into OID 1082");

        let desc = ColumnDesc::new("c", oid::DATE, PgFormat::Binary);
        let col = Column::new(&desc, UtcOffset::UTC, Some(Bytes::from_static(b"\0\0\0\0")));
        assert!(col.decode::<Nullable<i32>>().unwrap_err().is_type_mismatch());
    }

    #[test]
    fn invalid_holds_default() {
        assert_eq!(Nullable::<i32>::null().get(), None);
        assert_eq!(Nullable::<String>::from(None).into_option(), None);
        assert_eq!(Nullable::from(Some(3u32)).into_option(), Some(3));
    }
}
