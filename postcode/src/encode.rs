//! Parameter value encoding.
//!
//! - [`Encode`]
//! - [`Encoded`]
//! - [`ParamType`]
//! - [`Params`]
use bytes::{Buf, BufMut, Bytes};
use std::{borrow::Cow, fmt};
use time::UtcOffset;

use crate::{
    Codec,
    ext::{BindParams, UsizeExt},
    postgres::{self, Oid, PgFormat, PgType},
    value::ValueRef,
};

/// Value that can be encoded to be bound to sql parameter.
///
/// Implementor should check the declared type with [`ParamType::accept`] before producing any
/// bytes.
pub trait Encode<'q> {
    /// Encode self as the declared parameter type.
    fn encode(self, ty: &ParamType) -> Result<Encoded<'q>, EncodeError>;
}

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    oid: Oid,
    format: PgFormat,
    timezone: UtcOffset,
    element: Option<Oid>,
}

impl ParamType {
    /// Create parameter type, builtin array element is resolved statically.
    pub const fn new(oid: Oid, format: PgFormat) -> ParamType {
        Self { oid, format, timezone: UtcOffset::UTC, element: postgres::element_of(oid) }
    }

    /// Set the offset used for date and time value without time zone.
    pub const fn with_timezone(mut self, timezone: UtcOffset) -> ParamType {
        self.timezone = timezone;
        self
    }

    /// Set the array element oid.
    pub const fn with_element(mut self, element: Option<Oid>) -> ParamType {
        self.element = element;
        self
    }

    /// Returns the declared [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the format the value should be encoded in.
    pub const fn format(&self) -> PgFormat {
        self.format
    }

    /// Returns the offset used for date and time value without time zone.
    pub const fn timezone(&self) -> UtcOffset {
        self.timezone
    }

    /// Returns the element oid if declared type is an array.
    pub const fn element(&self) -> Option<Oid> {
        self.element
    }

    /// Returns [`EncodeError::TypeMismatch`] if `T` cannot be encoded into declared type.
    pub fn accept<T: PgType + ?Sized>(&self) -> Result<(), EncodeError> {
        match T::accepts(self.oid) {
            true => Ok(()),
            false => Err(EncodeError::mismatch::<T>(self.oid)),
        }
    }

    /// Parameter type of the array element.
    pub(crate) fn element_type<T: ?Sized>(&self) -> Result<ParamType, EncodeError> {
        match self.element {
            Some(element) => Ok(ParamType::new(element, self.format).with_timezone(self.timezone)),
            None => Err(EncodeError::mismatch::<T>(self.oid)),
        }
    }
}

/// Postgres encoded value.
#[derive(Debug)]
pub struct Encoded<'q> {
    value: ValueRef<'q>,
    is_null: bool,
    oid: Oid,
    format: PgFormat,
}

impl<'q> Encoded<'q> {
    pub(crate) fn new(value: ValueRef<'q>, ty: &ParamType) -> Self {
        Self { value, is_null: false, oid: ty.oid, format: ty.format }
    }

    /// Encoded `NULL` value.
    pub fn null(ty: &ParamType) -> Encoded<'static> {
        Encoded { value: ValueRef::empty(), is_null: true, oid: ty.oid, format: ty.format }
    }

    /// Encoded value from owned bytes, for user defined [`Encode`] implementation.
    pub fn owned(value: impl Into<Bytes>, ty: &ParamType) -> Encoded<'static> {
        Encoded::new(ValueRef::Bytes(value.into()), ty)
    }

    /// Encoded value from borrowed bytes, for user defined [`Encode`] implementation.
    pub fn borrowed(value: &'q [u8], ty: &ParamType) -> Encoded<'q> {
        Encoded::new(ValueRef::Slice(value), ty)
    }

    /// Returns the declared [`Oid`].
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the format of the value.
    pub fn format(&self) -> PgFormat {
        self.format
    }

    /// Returns `true` if value is `NULL`.
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Returns the value bytes, [`None`] if value is `NULL`.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self.is_null {
            true => None,
            false => Some(self.value.chunk()),
        }
    }

    /// Write the value length, or `-1` for `NULL`, followed by the value bytes.
    ///
    /// This is the parameter layout in `Bind` message and element layout in array.
    pub fn put(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.size());
        if !self.is_null {
            buf.put_slice(self.value.chunk());
        }
    }
}

impl Buf for Encoded<'_> {
    fn remaining(&self) -> usize {
        self.value.remaining()
    }

    fn chunk(&self) -> &[u8] {
        self.value.chunk()
    }

    fn advance(&mut self, cnt: usize) {
        self.value.advance(cnt);
    }
}

impl BindParams for Encoded<'_> {
    fn size(&self) -> i32 {
        match self.is_null {
            true => -1,
            // length is checked when encoding
            false => self.remaining().to_i32().unwrap_or(i32::MAX),
        }
    }
}

/// Builder for an ordered parameter list.
///
/// Binding stops at the first error, which is returned by [`Params::finish`].
///
/// ```
/// use postcode::{Codec, postgres::oid};
///
/// let codec = Codec::default();
/// let params = codec
///     .params()
///     .bind(oid::INT4, 420)
///     .bind(oid::TEXT, "foo")
///     .bind(oid::INT8, None::<i64>)
///     .finish()
///     .unwrap();
///
/// assert_eq!(params.len(), 3);
/// assert!(params[2].is_null());
/// ```
#[derive(Debug)]
pub struct Params<'c, 'q> {
    codec: &'c Codec,
    params: Vec<Encoded<'q>>,
    error: Option<ParamError>,
}

impl<'c, 'q> Params<'c, 'q> {
    pub(crate) fn new(codec: &'c Codec) -> Self {
        Self { codec, params: vec![], error: None }
    }

    /// Bind value as `oid` in the configured parameter format.
    pub fn bind<E: Encode<'q>>(self, oid: Oid, value: E) -> Self {
        let format = self.codec.config().param_format;
        self.bind_with(oid, format, value)
    }

    /// Bind value as `oid` in given `format`.
    pub fn bind_with<E: Encode<'q>>(mut self, oid: Oid, format: PgFormat, value: E) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.codec.encode_param(self.params.len(), oid, format, value) {
            Ok(ok) => self.params.push(ok),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Bind value as its own [`PgType::OID`].
    pub fn push<E: Encode<'q> + PgType>(self, value: E) -> Self {
        self.bind(E::OID, value)
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no parameter is bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the encoded parameters, or the first error.
    pub fn finish(self) -> Result<Vec<Encoded<'q>>, ParamError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.params),
        }
    }
}

// ===== Error =====

/// An error when encoding parameter value.
pub enum EncodeError {
    /// Value cannot be encoded into declared oid.
    TypeMismatch {
        oid: Oid,
        source: &'static str,
    },
    /// Value cannot be represented in the declared type.
    Malformed {
        oid: Oid,
        reason: Cow<'static,str>,
    },
    /// Declared type does not exist on the server.
    Unsupported(Oid),
    /// Failed to serialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl EncodeError {
    pub(crate) fn mismatch<T: ?Sized>(oid: Oid) -> EncodeError {
        Self::TypeMismatch { oid, source: std::any::type_name::<T>() }
    }

    pub(crate) fn malformed(oid: Oid, reason: impl Into<Cow<'static,str>>) -> EncodeError {
        Self::Malformed { oid, reason: reason.into() }
    }

    /// Returns `true` if error is [`EncodeError::TypeMismatch`].
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

impl std::error::Error for EncodeError { }

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { oid, source } => write!(f, "cannot encode `{source}` into OID {oid}"),
            Self::Malformed { oid, reason } => write!(f, "cannot encode value into OID {oid}: {reason}"),
            Self::Unsupported(oid) => write!(f, "OID {oid} is not supported by the server"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for EncodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// An error when encoding the nth parameter.
pub struct ParamError {
    pub(crate) index: usize,
    pub(crate) oid: Oid,
    pub(crate) source: EncodeError,
}

impl ParamError {
    /// Returns the parameter index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the parameter declared oid.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the underlying error.
    pub fn error(&self) -> &EncodeError {
        &self.source
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter {}: {}", self.index, self.source)
    }
}

impl fmt::Debug for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;

    use super::*;
    use crate::postgres::oid;

    #[test]
    fn null_is_not_empty() {
        let ty = ParamType::new(oid::TEXT, PgFormat::Binary);
        let null = Encoded::null(&ty);
        let empty = Encoded::borrowed(b"", &ty);

        assert_eq!(null.size(), -1);
        assert_eq!(empty.size(), 0);
        assert_eq!(null.as_slice(), None);
        assert_eq!(empty.as_slice(), Some(&b""[..]));

        let mut buf = BytesMut::new();
        null.put(&mut buf);
        empty.put(&mut buf);
        assert_eq!(&buf[..], b"\xff\xff\xff\xff\x00\x00\x00\x00");
    }

    #[test]
    fn element_type() {
        let ty = ParamType::new(oid::INT4_ARRAY, PgFormat::Text);
        let el = ty.element_type::<Vec<i32>>().unwrap();
        assert_eq!((el.oid(), el.format()), (oid::INT4, PgFormat::Text));

        let ty = ParamType::new(oid::INT4, PgFormat::Text);
        assert!(ty.element_type::<Vec<i32>>().unwrap_err().is_type_mismatch());
    }

    #[test]
    fn params_stop_at_first_error() {
        let codec = Codec::default();
        let err = codec
            .params()
            .bind(oid::INT4, 1)
            .bind(oid::DATE, 2i16)
            .bind(oid::TEXT, "never encoded")
            .finish()
            .unwrap_err();

        assert_eq!((err.index(), err.oid()), (1, oid::DATE));
        assert!(err.error().is_type_mismatch());
        assert_eq!(err.to_string(), "parameter 1: cannot encode `i16` into OID 1082");
    }
}
