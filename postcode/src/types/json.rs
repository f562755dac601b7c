use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{Oid, PgFormat, PgType, oid},
    row::Column,
    value::ValueRef,
};

const JSONB_VERSION: u8 = 1;

/// Decode and Encode postgres `json` and `jsonb` value.
///
/// Both types are optional, the server must have them in its
/// [`TypeRegistry`][crate::TypeRegistry] to bind a [`Json`] parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> PgType for Json<T> {
    /// `jsonb` Binary JSON
    const OID: Oid = oid::JSONB;

    fn accepts(oid: Oid) -> bool {
        matches!(oid, oid::JSON | oid::JSONB)
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        let value = col.as_slice().ok_or(DecodeError::Null)?;
        let value = match (col.format(), col.oid()) {
            (PgFormat::Binary, oid::JSONB) => match value.split_first() {
                Some((&JSONB_VERSION, json)) => json,
                Some((version, _)) => return Err(col.malformed(format!("unsupported jsonb version {version}"))),
                None => return Err(col.malformed("empty jsonb")),
            },
            _ => value,
        };
        Ok(Json(serde_json::from_slice(value)?))
    }
}

impl<T: Serialize> Encode<'static> for Json<T> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        let mut buf = BytesMut::new();
        if let (PgFormat::Binary, oid::JSONB) = (ty.format(), ty.oid()) {
            buf.put_u8(JSONB_VERSION);
        }
        serde_json::to_writer((&mut buf).writer(), &self.0)?;
        Ok(Encoded::new(ValueRef::from(buf.freeze()), ty))
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use std::collections::HashMap;
    use time::UtcOffset;

    use super::*;
    use crate::row::ColumnDesc;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct User {
        name: String,
        age: u8,
    }

    fn roundtrip<T: Serialize + DeserializeOwned>(value: T, oid: Oid, format: PgFormat) -> T {
        let encoded = Json(value).encode(&ParamType::new(oid, format)).unwrap();
        let value = Bytes::copy_from_slice(encoded.as_slice().unwrap());
        let desc = ColumnDesc::new("c", oid, format);
        Column::new(&desc, UtcOffset::UTC, Some(value)).decode::<Json<T>>().unwrap().0
    }

    #[test]
    fn json_and_jsonb() {
        for oid in [oid::JSON, oid::JSONB] {
            for format in [PgFormat::Binary, PgFormat::Text] {
                let user = User { name: "John".into(), age: 42 };
                assert_eq!(roundtrip(user, oid, format), User { name: "John".into(), age: 42 });

                let map = HashMap::from([(String::from("a"), 1)]);
                assert_eq!(roundtrip(map.clone(), oid, format), map);
            }
        }
    }

    #[test]
    fn jsonb_version() {
        let ty = ParamType::new(oid::JSONB, PgFormat::Binary);
        let encoded = Json(1).encode(&ty).unwrap();
        assert_eq!(encoded.as_slice(), Some(&b"\x011"[..]));

        let desc = ColumnDesc::new("c", oid::JSONB, PgFormat::Binary);
        let col = Column::new(&desc, UtcOffset::UTC, Some(Bytes::from_static(b"\x021")));
        assert!(col.decode::<Json<i32>>().unwrap_err().is_malformed());
    }
}
