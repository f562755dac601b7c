use crate::{
    Decode, DecodeError, Encode,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{PgFormat, PgType},
    row::Column,
    value::ValueRef,
};

impl Decode for bool {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        match col.format() {
            PgFormat::Binary => match col.fixed()? {
                [0] => Ok(false),
                [1] => Ok(true),
                [b] => Err(col.malformed(format!("invalid bool byte {b}"))),
            },
            PgFormat::Text => match col.text()? {
                "t" | "true" => Ok(true),
                "f" | "false" => Ok(false),
                text => Err(col.malformed(format!("invalid bool {text:?}"))),
            },
        }
    }
}

impl Encode<'static> for bool {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        let value = match (ty.format(), self) {
            (PgFormat::Binary, _) => ValueRef::inline(&[self as u8]),
            (PgFormat::Text, true) => ValueRef::from("t"),
            (PgFormat::Text, false) => ValueRef::from("f"),
        };
        Ok(Encoded::new(value, ty))
    }
}

macro_rules! integer {
    ($ty:ty) => {
        impl Decode for $ty {
            fn decode(col: Column) -> Result<Self, DecodeError> {
                match col.format() {
                    PgFormat::Binary => Ok(<$ty>::from_be_bytes(col.fixed()?)),
                    PgFormat::Text => col
                        .text()?
                        .parse()
                        .map_err(|e| col.malformed(format!("{e}"))),
                }
            }
        }

        impl Encode<'static> for $ty {
            fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
                ty.accept::<Self>()?;
                let value = match ty.format() {
                    PgFormat::Binary => ValueRef::inline(&self.to_be_bytes()),
                    PgFormat::Text => ValueRef::copy(itoa::Buffer::new().format(self).as_bytes()),
                };
                Ok(Encoded::new(value, ty))
            }
        }
    };
}

integer!(i16);
integer!(i32);
integer!(i64);
integer!(u32);

macro_rules! float {
    ($ty:ty) => {
        impl Decode for $ty {
            fn decode(col: Column) -> Result<Self, DecodeError> {
                match col.format() {
                    PgFormat::Binary => Ok(<$ty>::from_be_bytes(col.fixed()?)),
                    PgFormat::Text => match col.text()? {
                        "NaN" => Ok(<$ty>::NAN),
                        "Infinity" => Ok(<$ty>::INFINITY),
                        "-Infinity" => Ok(<$ty>::NEG_INFINITY),
                        text => text.parse().map_err(|e| col.malformed(format!("{e}"))),
                    },
                }
            }
        }

        impl Encode<'static> for $ty {
            fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
                ty.accept::<Self>()?;
                let value = match ty.format() {
                    PgFormat::Binary => ValueRef::inline(&self.to_be_bytes()),
                    PgFormat::Text if self.is_nan() => ValueRef::from("NaN"),
                    PgFormat::Text if self == <$ty>::INFINITY => ValueRef::from("Infinity"),
                    PgFormat::Text if self == <$ty>::NEG_INFINITY => ValueRef::from("-Infinity"),
                    PgFormat::Text => ValueRef::from(self.to_string()),
                };
                Ok(Encoded::new(value, ty))
            }
        }
    };
}

float!(f32);
float!(f64);

impl<T: PgType> PgType for Option<T> {
    const OID: crate::postgres::Oid = T::OID;

    fn accepts(oid: crate::postgres::Oid) -> bool {
        T::accepts(oid)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.is_null() {
            true => Ok(None),
            false => column.decode().map(Some),
        }
    }
}

impl<'q, T: Encode<'q>> Encode<'q> for Option<T> {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError> {
        match self {
            Some(value) => value.encode(ty),
            None => Ok(Encoded::null(ty)),
        }
    }
}
